// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Report input streams.
//!
//! The catalog needs two streams: the candidate target listing, and the
//! internal database dump. Each can come from a file or from standard input,
//! but only one of them can claim standard input.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::read_to_string,
    io::{self, Read},
    path::PathBuf,
    str::FromStr,
};

/// Where to read a stream from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSource {
    /// Standard input, spelled `-`.
    Stdin,

    /// File on disk.
    File(PathBuf),
}

impl FromStr for StreamSource {
    type Err = std::convert::Infallible;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        Ok(match data {
            "-" => Self::Stdin,
            path => Self::File(PathBuf::from(path)),
        })
    }
}

impl Display for StreamSource {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Stdin => fmt.write_str("<stdin>"),
            Self::File(path) => write!(fmt, "{}", path.display()),
        }
    }
}

/// Named input streams of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Targets,
    Database,
}

impl Display for Stream {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Targets => fmt.write_str("target listing"),
            Self::Database => fmt.write_str("database dump"),
        }
    }
}

/// Read both input streams fully into memory.
///
/// # Errors
///
/// - Return [`InputError::MissingStream`] if either source is absent.
/// - Return [`InputError::SharedStdin`] if both sources are standard input.
/// - Return [`InputError::Read`] if a source cannot be read.
pub fn read_streams(
    targets: Option<&StreamSource>,
    database: Option<&StreamSource>,
    stdin: impl Read,
) -> Result<(String, String)> {
    let targets = targets.ok_or(InputError::MissingStream(Stream::Targets))?;
    let database = database.ok_or(InputError::MissingStream(Stream::Database))?;
    if *targets == StreamSource::Stdin && *database == StreamSource::Stdin {
        return Err(InputError::SharedStdin);
    }

    // INVARIANT: At most one stream consumes stdin, so it is handed over once.
    let mut stdin = Some(stdin);
    let targets = read_stream(Stream::Targets, targets, &mut stdin)?;
    let database = read_stream(Stream::Database, database, &mut stdin)?;

    Ok((targets, database))
}

fn read_stream(
    stream: Stream,
    source: &StreamSource,
    stdin: &mut Option<impl Read>,
) -> Result<String> {
    let read_error = |err| InputError::Read {
        source: err,
        stream,
        origin: source.to_string(),
    };

    match source {
        StreamSource::File(path) => read_to_string(path).map_err(read_error),
        StreamSource::Stdin => {
            let mut content = String::new();
            if let Some(mut reader) = stdin.take() {
                reader.read_to_string(&mut content).map_err(read_error)?;
            }
            Ok(content)
        }
    }
}

/// Input stream error types.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// A required stream was not given.
    #[error("missing {0}: both a target listing and a database dump are required")]
    MissingStream(Stream),

    /// Both streams asked for standard input.
    #[error("only one of target listing and database dump can be read from stdin")]
    SharedStdin,

    /// A stream cannot be read.
    #[error("failed to read {stream} from {origin}")]
    Read {
        #[source]
        source: io::Error,
        stream: Stream,
        origin: String,
    },
}

/// Friendly result alias :3
pub type Result<T, E = InputError> = std::result::Result<T, E>;
