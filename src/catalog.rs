// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Target catalog.
//!
//! The __catalog__ is the in-memory collection of every user target make
//! knows about, along with where each one was defined, which variables it
//! requires, which other targets it depends on, and whatever documentation
//! its author left in the makefile.
//!
//! # Building the Catalog
//!
//! The catalog is rebuilt from scratch on every invocation from two inputs:
//! a listing of candidate target names, and make's internal database dump.
//! Candidates are filtered down to real user targets (see [`candidate`]).
//! The dump is scanned once for rule blocks of those candidates (see
//! [`dump`]). Each block becomes a [`TargetRecord`] whose prerequisites are
//! split by the assertion convention (see [`classify`]), and whose
//! documentation is pulled from its source file (see [`docs`]).
//!
//! Nothing here is fatal. Missing metadata leaves fields empty, and a
//! candidate without any rule block still gets a bare record.

pub mod candidate;
pub mod docs;
pub mod dump;

use crate::{
    catalog::{
        candidate::CandidateSet,
        docs::{DocExtractor, SourceReader},
        dump::RuleBlock,
    },
    config::ASSERT_PREFIX,
    path::{absolutize, relative_to},
};

use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
};
use tracing::{debug, instrument};

/// Name of a declared build rule.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetName(String);

impl TargetName {
    /// Construct new target name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Treat target name as string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for TargetName {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.as_str())
    }
}

/// Prerequisite name sorted by the assertion convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    /// Variable that must be set, with [`ASSERT_PREFIX`] stripped.
    RequiredVariable(String),

    /// Any other prerequisite target.
    Prerequisite(String),
}

/// Classify prerequisite name by the assertion convention.
///
/// Prerequisites starting with [`ASSERT_PREFIX`] denote required variables.
/// Everything else is a plain prerequisite.
pub fn classify(name: &str) -> Classified {
    match name.strip_prefix(ASSERT_PREFIX) {
        Some(variable) => Classified::RequiredVariable(variable.to_owned()),
        None => Classified::Prerequisite(name.to_owned()),
    }
}

/// Where a target's recipe was defined.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Location {
    /// Source path relative to the display root.
    pub file: PathBuf,

    /// Absolute source path used to read documentation.
    pub abs_path: PathBuf,

    /// Line of the recipe within the source file.
    pub line: usize,
}

impl Display for Location {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "{}:{}", self.file.display(), self.line)
    }
}

/// Everything known about one target.
///
/// # Invariant
///
/// - `declared_args` and `prerequisites` partition the raw prerequisite list
///   of the rule header without overlap or loss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRecord {
    pub name: TargetName,
    pub location: Option<Location>,
    pub declared_args: Vec<String>,
    pub prerequisites: Vec<String>,
    pub doc_lines: Vec<String>,
}

impl TargetRecord {
    /// Construct record with no metadata.
    pub fn bare(name: TargetName) -> Self {
        Self {
            name,
            location: None,
            declared_args: Vec::new(),
            prerequisites: Vec::new(),
            doc_lines: Vec::new(),
        }
    }

    /// Sort raw prerequisite tokens into declared args and prerequisites.
    pub fn with_args(mut self, raw_args: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        for arg in raw_args {
            match classify(arg.as_ref()) {
                Classified::RequiredVariable(name) => self.declared_args.push(name),
                Classified::Prerequisite(name) => self.prerequisites.push(name),
            }
        }

        self
    }
}

/// How to treat targets defined more than once.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Keep only the last rule block seen for a target.
    #[default]
    LastSeen,

    /// Keep one record per distinct definition location.
    AllDefinitions,
}

/// Directories used to resolve and display source paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roots {
    /// Directory relative source paths in the dump are resolved against.
    pub source: PathBuf,

    /// Directory source paths are displayed relative to.
    pub display: PathBuf,
}

impl Roots {
    /// Resolve and display relative to the same directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            source: dir.clone(),
            display: dir,
        }
    }
}

/// Collection of target records, ordered by target name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Catalog {
    records: BTreeMap<TargetName, Vec<TargetRecord>>,
}

impl Catalog {
    /// Build catalog from candidates and their rule blocks.
    ///
    /// Candidates without any rule block still get a bare record.
    #[instrument(skip_all, level = "debug")]
    pub fn build<R>(
        candidates: &CandidateSet,
        blocks: impl IntoIterator<Item = RuleBlock>,
        docs: &mut DocExtractor<R>,
        roots: &Roots,
        policy: DuplicatePolicy,
    ) -> Self
    where
        R: SourceReader,
    {
        let mut catalog = Self::default();
        for block in blocks {
            let record = Self::record_from_block(block, docs, roots);
            catalog.insert(record, policy);
        }

        for name in candidates.iter() {
            if !catalog.records.contains_key(name) {
                debug!("no rule block for candidate {name:?}");
                catalog
                    .records
                    .insert(name.clone(), vec![TargetRecord::bare(name.clone())]);
            }
        }

        catalog
    }

    fn record_from_block<R>(
        block: RuleBlock,
        docs: &mut DocExtractor<R>,
        roots: &Roots,
    ) -> TargetRecord
    where
        R: SourceReader,
    {
        let mut record = TargetRecord::bare(TargetName::new(block.target)).with_args(block.raw_args);
        if let Some(origin) = block.origin {
            let abs_path = absolutize(&origin.file, &roots.source);
            record.doc_lines = docs.doc_lines(&abs_path, record.name.as_str());
            record.location = Some(Location {
                file: relative_to(&abs_path, &roots.display),
                abs_path,
                line: origin.line,
            });
        }

        record
    }

    /// Insert record according to duplicate policy.
    pub fn insert(&mut self, record: TargetRecord, policy: DuplicatePolicy) {
        match policy {
            DuplicatePolicy::LastSeen => {
                self.records.insert(record.name.clone(), vec![record]);
            }
            DuplicatePolicy::AllDefinitions => {
                let entry = self.records.entry(record.name.clone()).or_default();
                if let Some(same) = entry
                    .iter_mut()
                    .find(|existing| existing.location == record.location)
                {
                    *same = record;
                } else if record.location.is_some() || entry.is_empty() {
                    entry.push(record);
                }

                // INVARIANT: Located definitions supersede bare ones.
                if entry.iter().any(|existing| existing.location.is_some()) {
                    entry.retain(|existing| existing.location.is_some());
                }
                entry.sort_by(|lhs, rhs| lhs.location.cmp(&rhs.location));
            }
        }
    }

    /// Iterate through every record, ordered by target name.
    pub fn targets(&self) -> impl Iterator<Item = &TargetRecord> {
        self.records.values().flatten()
    }

    /// Group records with a known location by source file.
    ///
    /// Groups are keyed by display path and ordered by its plain string
    /// value, so `mk.d/x.mk` sorts before `mk/y.mk`. Records within a group
    /// are ordered by target name.
    pub fn by_source(&self) -> BTreeMap<String, Vec<&TargetRecord>> {
        let mut groups: BTreeMap<String, Vec<&TargetRecord>> = BTreeMap::new();
        for record in self.targets() {
            if let Some(location) = &record.location {
                groups
                    .entry(location.file.display().to_string())
                    .or_default()
                    .push(record);
            }
        }

        groups
    }

    /// Look up all records of a target.
    pub fn get(&self, name: &str) -> Option<&[TargetRecord]> {
        self.records
            .get(&TargetName::new(name))
            .map(Vec::as_slice)
    }

    /// Number of distinct targets.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if catalog holds no targets.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
