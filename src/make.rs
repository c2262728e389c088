// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Make invocation.
//!
//! Instead of being fed a database dump, mkcatalog can ask make for one
//! itself. Make is run in question mode with built-in rules and variables
//! disabled, against the no-op `:` goal, so nothing gets built:
//!
//! ```text
//! make -pRrq [-C <dir> --no-print-directory] [-f <makefile>] :
//! ```
//!
//! Question mode exits with status 1 whenever something is out of date, and
//! make complains that it has no rule for `:` with status 2. Neither matters
//! as long as the database got printed, so the exit status only counts when
//! the database header is missing from the output.

use crate::guard::{require_executables, GuardError};

use std::{
    ffi::OsString,
    path::PathBuf,
    process::{Command, Output},
};
use tracing::{debug, info, instrument};

/// Options for dumping make's internal database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakeInvocation {
    /// Make binary to run.
    pub program: OsString,

    /// Directory to change into before reading makefiles.
    pub directory: Option<PathBuf>,

    /// Makefile to read instead of make's default lookup.
    pub makefile: Option<PathBuf>,
}

impl Default for MakeInvocation {
    fn default() -> Self {
        Self {
            program: "make".into(),
            directory: None,
            makefile: None,
        }
    }
}

impl MakeInvocation {
    /// Arguments passed to make.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-pRrq".into()];
        if let Some(directory) = &self.directory {
            args.push("-C".into());
            args.push(directory.into());
            args.push("--no-print-directory".into());
        }
        if let Some(makefile) = &self.makefile {
            args.push("-f".into());
            args.push(makefile.into());
        }
        args.push(":".into());

        args
    }

    /// Run make and capture its internal database dump.
    ///
    /// # Errors
    ///
    /// - Return [`MakeError::MissingExecutable`] if make is not on `PATH`.
    /// - Return [`MakeError::Spawn`] if make cannot be started.
    /// - Return [`MakeError::Failed`] if make exits with an error without
    ///   printing its database.
    #[instrument(skip(self), level = "debug")]
    pub fn dump_database(&self) -> Result<String> {
        let program = require_executables([&self.program])?
            .into_iter()
            .next()
            .unwrap_or_else(|| PathBuf::from(&self.program));

        let args = self.args();
        debug!("run {:?} with {args:?}", program.display());
        let output = Command::new(&program)
            .args(&args)
            .env("LC_ALL", "C")
            .output()
            .map_err(|err| MakeError::Spawn {
                source: err,
                program: program.clone(),
            })?;

        let dump = accept_output(output)?;
        info!("read {} lines of make database", dump.lines().count());
        Ok(dump)
    }
}

/// Header make prints at the start of its database dump.
pub const DATABASE_HEADER: &str = "# Make data base";

fn accept_output(output: Output) -> Result<String> {
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let code = output.status.code();
    if stdout.contains(DATABASE_HEADER) {
        debug!("make exited with {code:?} after printing database");
        return Ok(stdout);
    }

    match code {
        Some(0 | 1) => Ok(stdout),
        code => Err(MakeError::Failed {
            code,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        }),
    }
}

/// Make invocation error types.
#[derive(Debug, thiserror::Error)]
pub enum MakeError {
    /// Make is not installed.
    #[error(transparent)]
    MissingExecutable(#[from] GuardError),

    /// Make could not be started.
    #[error("failed to run {:?}", program.display())]
    Spawn {
        #[source]
        source: std::io::Error,
        program: PathBuf,
    },

    /// Make exited with an error.
    #[error("make exited with {}: {stderr}", code.map_or("a signal".to_owned(), |code| format!("status {code}")))]
    Failed { code: Option<i32>, stderr: String },
}

/// Friendly result alias :3
pub type Result<T, E = MakeError> = std::result::Result<T, E>;
