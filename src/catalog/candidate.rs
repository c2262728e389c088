// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Candidate target names.
//!
//! The catalog only reports on targets a user would actually invoke. Make
//! knows about far more than that: special targets like `.PHONY`, pattern
//! rules, internal sentinels, and stray tokens from conditional directives
//! that leak into its printed database. Candidate parsing whittles the raw
//! listing down to real user targets.
//!
//! # Lexical Rule
//!
//! A line of the database declares a target when it starts with an
//! identifier character, runs up to a colon without touching any of
//! `$ # / \t =`, and the colon is not the start of a `:=` assignment. Names
//! that survive the lexical rule are then dropped if they contain `[`, end in
//! a double underscore, appear in the stoplist, or start with an excluded
//! prefix.

use crate::{catalog::TargetName, config::FilterSettings};

use regex::Regex;
use std::{collections::HashSet, sync::LazyLock};
use tracing::trace;

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_][^$#/\t=:]*)::?(?:[^=]|$)").expect("declaration regex is valid")
});

/// Marker make prints above database entries that are not targets.
pub const NOT_A_TARGET: &str = "# Not a target:";

/// Ordered set of candidate target names.
///
/// # Invariant
///
/// - No duplicate names.
/// - Insertion order is preserved.
/// - No name is noise according to the [`FilterSettings`] it was built with.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CandidateSet {
    names: Vec<TargetName>,
    index: HashSet<String>,
}

impl CandidateSet {
    /// Parse newline-delimited listing of candidate names.
    ///
    /// Only the first whitespace-delimited token of each line counts, so
    /// trailing annotations are ignored. A trailing colon on that token is
    /// dropped.
    pub fn parse(listing: &str, filter: &FilterSettings) -> Self {
        let mut set = Self::default();
        for line in listing.lines() {
            let Some(token) = line.split_whitespace().next() else {
                continue;
            };
            set.insert_filtered(token.trim_end_matches(':'), filter);
        }

        set
    }

    /// Derive candidate names straight from an internal database dump.
    ///
    /// Applies the lexical rule to every line of the dump, so one dump can
    /// serve as both inputs of the catalog. Entries make flags as not being
    /// targets, e.g., the makefiles themselves, are skipped.
    pub fn from_dump(dump: &str, filter: &FilterSettings) -> Self {
        let mut set = Self::default();
        let mut previous = "";
        for line in dump.lines() {
            let not_a_target = previous.trim() == NOT_A_TARGET;
            previous = line;
            if not_a_target || line.contains('[') {
                continue;
            }

            let Some(captures) = DECLARATION.captures(line) else {
                continue;
            };

            // INVARIANT: Multi-target headers declare every listed name.
            for name in captures[1].split_whitespace() {
                set.insert_filtered(name, filter);
            }
        }

        set
    }

    /// Check if name is a candidate.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains(name)
    }

    /// Iterate through candidates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TargetName> {
        self.names.iter()
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if there are no candidates.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn insert_filtered(&mut self, name: &str, filter: &FilterSettings) {
        if is_noise(name, filter) {
            trace!("drop noise candidate {name:?}");
            return;
        }

        if self.index.insert(name.to_owned()) {
            self.names.push(TargetName::new(name));
        }
    }
}

/// Check if name is not a user target.
pub fn is_noise(name: &str, filter: &FilterSettings) -> bool {
    name.is_empty()
        || name.contains('[')
        || name.ends_with("__")
        || filter.stoplist.iter().any(|stop| stop == name)
        || filter
            .excluded_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
        || !is_lexically_valid(name)
}

fn is_lexically_valid(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    (first.is_ascii_alphanumeric() || first == '_')
        && chars.all(|ch| !matches!(ch, '$' | '#' | '/' | '=' | ':') && !ch.is_whitespace())
}
