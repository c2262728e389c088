// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Input guards.
//!
//! Makefiles that wrap external tooling usually want to fail fast when a
//! required variable is unset, or when the tool they shell out to is not
//! installed. The `assert-%` prerequisite convention covers the first case
//! inside make itself. These guards expose the same checks as a standalone
//! command, and back the executable check performed before mkcatalog runs
//! make on its own.

use std::{ffi::OsStr, path::PathBuf};
use tracing::{debug, instrument};

/// Require every named environment variable to be set and non-empty.
///
/// Variable lookup is delegated to `lookup` so callers can check against
/// something other than the process environment.
///
/// # Errors
///
/// - Return [`GuardError::UnsetVariables`] listing every missing variable in
///   input order.
pub fn require_vars<L>(names: impl IntoIterator<Item = impl Into<String>>, lookup: L) -> Result<()>
where
    L: Fn(&str) -> Option<String>,
{
    let missing = names
        .into_iter()
        .map(Into::<String>::into)
        .filter(|name| lookup(name.as_str()).is_none_or(|value| value.is_empty()))
        .collect::<Vec<_>>();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(GuardError::UnsetVariables { names: missing })
    }
}

/// Require every named environment variable to be set in process environment.
///
/// # Errors
///
/// - Return [`GuardError::UnsetVariables`] listing every missing variable.
pub fn require_env_vars(names: impl IntoIterator<Item = impl Into<String>>) -> Result<()> {
    require_vars(names, |name| std::env::var(name).ok())
}

/// Require every named executable to be resolvable through `PATH`.
///
/// Returns resolved paths in input order.
///
/// # Errors
///
/// - Return [`GuardError::MissingExecutables`] listing every executable that
///   could not be found.
#[instrument(skip(names), level = "debug")]
pub fn require_executables(
    names: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut missing = Vec::new();
    for name in names {
        let name = name.as_ref();
        match which::which(name) {
            Ok(path) => {
                debug!("resolved {name:?} to {:?}", path.display());
                found.push(path);
            }
            Err(_) => missing.push(name.to_string_lossy().into_owned()),
        }
    }

    if missing.is_empty() {
        Ok(found)
    } else {
        Err(GuardError::MissingExecutables { names: missing })
    }
}

/// Guard error types.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    /// Required environment variables are unset or empty.
    #[error("required variable(s) not set: {}", names.join(", "))]
    UnsetVariables { names: Vec<String> },

    /// Required executables are not on `PATH`.
    #[error("required executable(s) not found in PATH: {}", names.join(", "))]
    MissingExecutables { names: Vec<String> },
}

/// Friendly result alias :3
pub type Result<T, E = GuardError> = std::result::Result<T, E>;
