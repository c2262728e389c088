// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the configuration file that mkcatalog uses to tune
//! how the catalog gets built and rendered. All process-wide knobs live here
//! so that the reporter receives them explicitly at construction instead of
//! reading ambient state.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Prerequisite prefix marking a required environment variable.
///
/// Makefiles following the assertion convention declare `assert-%` as a
/// pattern rule that fails when the variable named by the stem is unset. Thus,
/// a target listing `assert-HOST` as a prerequisite requires `HOST`.
pub const ASSERT_PREFIX: &str = "assert-";

/// Reporter configuration layout.
///
/// # General Layout
///
/// The configuration is split into three sections: filtering rules for
/// candidate target names, parsing rules for the internal database dump, and
/// output settings for the rendered report. Every section is optional, and
/// every field falls back to a sensible default.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReporterConfig {
    /// Candidate name filtering rules.
    pub filter: FilterSettings,

    /// Internal database dump parsing rules.
    pub database: DatabaseSettings,

    /// Report output settings.
    pub output: OutputSettings,
}

impl ReporterConfig {
    /// Load configuration from file.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::ReadFile`] if file cannot be read.
    /// - Return [`ConfigError::Deserialize`] if file content is not valid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = read_to_string(path).map_err(|err| ConfigError::ReadFile {
            source: err,
            config_path: path.to_path_buf(),
        })?;

        content.parse()
    }

    /// Load configuration from file if it exists, or use defaults.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Deserialize`] if file exists but its content is
    ///   not valid.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        if path.as_ref().is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

impl FromStr for ReporterConfig {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        toml::de::from_str(data).map_err(ConfigError::Deserialize)
    }
}

impl Display for ReporterConfig {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Candidate name filtering rules.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Exact names that are never user targets.
    pub stoplist: Vec<String>,

    /// Name prefixes that are never user targets.
    pub excluded_prefixes: Vec<String>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            stoplist: [
                "if", "ifdef", "ifndef", "ifeq", "ifneq", "else", "endif", "define", "endef",
                "export", "unexport", "override", "include", "-include", "sinclude", "vpath",
                "private", "undefine", "-", "--", "=", ":", ";", "@",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
            excluded_prefixes: vec![ASSERT_PREFIX.into(), "range(".into()],
        }
    }
}

/// Internal database dump parsing rules.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Number of lines after a rule header to search for its metadata.
    pub context_lines: usize,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self { context_lines: 5 }
    }
}

/// Report output settings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    /// When to emit ANSI color escapes.
    pub color: ColorMode,
}

/// When to emit ANSI color escapes.
#[derive(Default, Debug, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color only when standard output is a terminal, and `NO_COLOR` is unset.
    #[default]
    Auto,

    /// Always color.
    Always,

    /// Never color.
    Never,
}

impl ColorMode {
    /// Decide whether to color given terminal state and `NO_COLOR` presence.
    pub fn enabled(self, is_terminal: bool, no_color: bool) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => is_terminal && !no_color,
        }
    }
}

/// Expand shell variables and tilde in user supplied configuration path.
///
/// # Errors
///
/// - Return [`ConfigError::ShellExpansion`] if a referenced variable is unset.
pub fn expand_config_path(path: impl AsRef<str>) -> Result<PathBuf> {
    Ok(PathBuf::from(
        shellexpand::full(path.as_ref())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned(),
    ))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file cannot be read.
    #[error("failed to read configuration file at {:?}", config_path.display())]
    ReadFile {
        #[source]
        source: std::io::Error,
        config_path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration path.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use simple_test_case::test_case;

    #[test]
    fn deserialize_reporter_config() -> anyhow::Result<()> {
        let result: ReporterConfig = r#"
            [filter]
            stoplist = ["endif", "else"]
            excluded_prefixes = ["assert-", "_"]

            [database]
            context_lines = 8

            [output]
            color = "never"
        "#
        .parse()?;

        let expect = ReporterConfig {
            filter: FilterSettings {
                stoplist: vec!["endif".into(), "else".into()],
                excluded_prefixes: vec!["assert-".into(), "_".into()],
            },
            database: DatabaseSettings { context_lines: 8 },
            output: OutputSettings {
                color: ColorMode::Never,
            },
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn deserialize_partial_config_keeps_defaults() -> anyhow::Result<()> {
        let result: ReporterConfig = r#"
            [output]
            color = "always"
        "#
        .parse()?;

        assert_eq!(result.filter, FilterSettings::default());
        assert_eq!(result.database.context_lines, 5);
        assert_eq!(result.output.color, ColorMode::Always);

        Ok(())
    }

    #[test]
    fn deserialize_rejects_unknown_color_mode() {
        let result = "[output]\ncolor = \"sometimes\"\n".parse::<ReporterConfig>();
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }

    #[test]
    fn serialize_reporter_config() -> anyhow::Result<()> {
        let config = ReporterConfig {
            filter: FilterSettings {
                stoplist: vec!["endif".into()],
                excluded_prefixes: vec!["assert-".into()],
            },
            database: DatabaseSettings { context_lines: 5 },
            output: OutputSettings {
                color: ColorMode::Auto,
            },
        };
        let result = config.to_string();

        assert!(result.contains("[database]\ncontext_lines = 5\n"));
        assert!(result.contains("[output]\ncolor = \"auto\"\n"));
        assert_eq!(result.parse::<ReporterConfig>()?, config);

        Ok(())
    }

    #[test_case(ColorMode::Auto, true, false, true; "auto on terminal")]
    #[test_case(ColorMode::Auto, false, false, false; "auto off terminal")]
    #[test_case(ColorMode::Auto, true, true, false; "auto respects no color")]
    #[test_case(ColorMode::Always, false, true, true; "always wins")]
    #[test_case(ColorMode::Never, true, false, false; "never wins")]
    #[test]
    fn color_mode_enabled(mode: ColorMode, is_terminal: bool, no_color: bool, expect: bool) {
        pretty_assertions::assert_eq!(mode.enabled(is_terminal, no_color), expect);
    }

    #[sealed_test(env = [("MKCATALOG_HOME", "/home/blah/.mkcatalog")])]
    fn expand_config_path_with_variable() -> anyhow::Result<()> {
        let result = expand_config_path("$MKCATALOG_HOME/config.toml")?;
        assert_eq!(result, PathBuf::from("/home/blah/.mkcatalog/config.toml"));

        Ok(())
    }

    #[sealed_test]
    fn load_or_default_without_file() -> anyhow::Result<()> {
        let result = ReporterConfig::load_or_default("missing.toml")?;
        assert_eq!(result, ReporterConfig::default());

        Ok(())
    }
}
