// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Self-documenting target catalog for makefile-driven projects.
//!
//! Makefiles that wrap external tooling tend to grow a pile of small targets,
//! each checking a few required variables before forwarding them to some
//! command. Mkcatalog turns make's own internal database into a readable
//! catalog of those targets: where each one lives, which variables it
//! requires, what it depends on, and how its author documented it.
//!
//! # See Also
//!
//! 1. [`catalog`] for how the catalog is assembled.
//! 2. [`report`] for how it is rendered.

pub mod catalog;
pub mod config;
pub mod guard;
pub mod input;
pub mod make;
pub mod path;
pub mod report;

use crate::{
    catalog::{
        candidate::CandidateSet,
        docs::{DocExtractor, FsReader, SourceReader},
        dump, Catalog, DuplicatePolicy, Roots,
    },
    config::ReporterConfig,
    make::DATABASE_HEADER,
    report::{render, OutputFormat, Palette},
};

use std::io::{self, Write};
use tracing::{debug, info, instrument};

/// Build and render target catalogs.
///
/// All settings are handed over at construction. Nothing is read from the
/// process environment, so the same inputs always produce the same report.
#[derive(Debug)]
pub struct Reporter<R = FsReader>
where
    R: SourceReader,
{
    config: ReporterConfig,
    palette: Palette,
    roots: Roots,
    policy: DuplicatePolicy,
    docs: DocExtractor<R>,
}

impl Reporter<FsReader> {
    /// Construct new reporter reading makefile sources from the file system.
    pub fn new(config: ReporterConfig, palette: Palette, roots: Roots) -> Self {
        Self::with_reader(config, palette, roots, FsReader)
    }
}

impl<R> Reporter<R>
where
    R: SourceReader,
{
    /// Construct new reporter reading makefile sources through `reader`.
    pub fn with_reader(config: ReporterConfig, palette: Palette, roots: Roots, reader: R) -> Self {
        Self {
            config,
            palette,
            roots,
            policy: DuplicatePolicy::default(),
            docs: DocExtractor::new(reader),
        }
    }

    /// Set how targets defined more than once are treated.
    pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build catalog from a candidate listing and a database dump.
    ///
    /// A listing that is itself a database dump, e.g., the same file passed
    /// as both streams, is filtered through the lexical declaration rule
    /// instead of being taken line by line.
    #[instrument(skip_all, level = "debug")]
    pub fn catalog(&mut self, listing: &str, dump: &str) -> Catalog {
        let candidates = if listing.contains(DATABASE_HEADER) {
            debug!("target listing is a database dump, derive candidates from declarations");
            CandidateSet::from_dump(listing, &self.config.filter)
        } else {
            CandidateSet::parse(listing, &self.config.filter)
        };
        self.catalog_from(&candidates, dump)
    }

    /// Build catalog from a database dump alone.
    ///
    /// Candidates are derived from the dump itself.
    #[instrument(skip_all, level = "debug")]
    pub fn catalog_from_dump(&mut self, dump: &str) -> Catalog {
        let candidates = CandidateSet::from_dump(dump, &self.config.filter);
        self.catalog_from(&candidates, dump)
    }

    fn catalog_from(&mut self, candidates: &CandidateSet, dump: &str) -> Catalog {
        let blocks = dump::scan(dump, candidates, self.config.database.context_lines);
        let catalog = Catalog::build(candidates, blocks, &mut self.docs, &self.roots, self.policy);
        info!(
            "cataloged {} of {} candidate targets",
            catalog.len(),
            candidates.len()
        );

        catalog
    }

    /// Render catalog to `out`.
    ///
    /// # Errors
    ///
    /// - Return [`io::Error`] if writing to `out` fails.
    pub fn write(
        &self,
        catalog: &Catalog,
        format: OutputFormat,
        out: &mut impl Write,
    ) -> io::Result<()> {
        render(catalog, format, &self.palette, out)
    }
}
