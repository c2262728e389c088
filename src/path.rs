// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path information for files that get reported on, and
//! for configuration files that mkcatalog reads on startup.

use std::path::{Component, Path, PathBuf};

/// Determine default absolute path to configuration file.
///
/// Uses XDG Base Directory path `$XDG_CONFIG_HOME/mkcatalog/config.toml` as
/// the default location. Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoConfigDir`] if configuration directory cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("mkcatalog").join("config.toml"))
        .ok_or(NoConfigDir)
}

/// Resolve path against a base directory.
///
/// Relative paths are joined onto `base`. The result is lexically normalized,
/// so `.` and `..` components are folded away without touching the file
/// system. Paths that do not exist stay valid input.
pub fn absolutize(path: impl AsRef<Path>, base: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.as_ref().join(path))
    }
}

/// Express absolute path relative to a base directory for display.
///
/// Walks up out of `base` with `..` components when `path` does not live
/// beneath it. Falls back to `path` itself when the two share no common root,
/// e.g., different drive prefixes.
pub fn relative_to(path: impl AsRef<Path>, base: impl AsRef<Path>) -> PathBuf {
    let path = normalize(path.as_ref());
    let base = normalize(base.as_ref());

    let path_parts = path.components().collect::<Vec<_>>();
    let base_parts = base.components().collect::<Vec<_>>();
    let shared = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(lhs, rhs)| lhs == rhs)
        .count();

    if shared == 0 {
        return path;
    }

    let mut relative = PathBuf::new();
    for _ in shared..base_parts.len() {
        relative.push("..");
    }
    for part in &path_parts[shared..] {
        relative.push(part.as_os_str());
    }

    if relative.as_os_str().is_empty() {
        relative.push(".");
    }

    relative
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => continue,
            Component::ParentDir => {
                // INVARIANT: Never pop past the root.
                if !matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir | Component::Prefix(_) | Component::ParentDir)
                ) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }

    out
}

/// No way to determine user's configuration directory.
///
/// # See Also
///
/// - [`dirs::config_dir`](https://docs.rs/dirs/latest/dirs/fn.config_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's configuration directory")]
pub struct NoConfigDir;

/// Friendly result alias :3
pub type Result<T, E = NoConfigDir> = std::result::Result<T, E>;
