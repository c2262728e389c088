// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Internal database dump scanning.
//!
//! Make prints its entire internal state when given `-p`: variables, implicit
//! rules, and every file or target it knows about along with the makefile and
//! line that defined its recipe. This module is the only place that knows the
//! shape of that dump. Everything else consumes [`RuleBlock`]s.
//!
//! # Block Shape
//!
//! The scanner relies on exactly two things:
//!
//! 1. A line whose trimmed text starts with `TARGET:` introduces a rule. The
//!    remaining text of that line lists its prerequisites.
//! 2. Within the next few lines, a line containing `recipe to execute (from `
//!    is immediately followed by `FILE, line N)`.
//!
//! For example:
//!
//! ```text
//! build: assert-HOST run-tests
//! #  Phony target (prerequisite of .PHONY).
//! #  Implicit rule search has not been done.
//! #  File does not exist.
//! #  File has not been updated.
//! #  recipe to execute (from 'Makefile', line 10):
//!     @ansible-playbook site.yml
//! ```
//!
//! Any deviation from this shape yields a block without an [`Origin`], never a
//! failure.

use crate::catalog::candidate::CandidateSet;

use tracing::{debug, instrument};

/// Marker preceding the defining file and line of a rule's recipe.
pub const RECIPE_MARKER: &str = "recipe to execute (from ";

/// Metadata block captured for one rule header in the dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleBlock {
    /// Name of the target the block belongs to.
    pub target: String,

    /// Whitespace separated prerequisite tokens of the rule header.
    ///
    /// The order-only separator `|` is not a prerequisite, and is skipped.
    pub raw_args: Vec<String>,

    /// Where the recipe of the rule was defined, if known.
    pub origin: Option<Origin>,
}

/// File and line a recipe was defined at, verbatim from the dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub file: String,
    pub line: usize,
}

/// Scan dump for rule blocks of candidate targets.
///
/// Runs in a single pass over the dump. Blocks are returned in the order their
/// headers appear. Each block spans the header plus up to `context_lines`
/// following lines, cut short at the first blank line since make separates
/// entries with one.
#[instrument(skip(dump, candidates), level = "debug")]
pub fn scan(dump: &str, candidates: &CandidateSet, context_lines: usize) -> Vec<RuleBlock> {
    let lines = dump.lines().collect::<Vec<_>>();
    let mut blocks = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let Some((target, rest)) = split_header(line, candidates) else {
            continue;
        };

        let origin = lines
            .iter()
            .skip(idx + 1)
            .take(context_lines)
            .take_while(|line| !line.trim().is_empty())
            .find_map(|line| parse_origin(line));
        if origin.is_none() {
            debug!("no recipe origin for {target:?} near dump line {}", idx + 1);
        }

        blocks.push(RuleBlock {
            target: target.to_owned(),
            raw_args: rest
                .split_whitespace()
                .filter(|arg| *arg != "|")
                .map(str::to_owned)
                .collect(),
            origin,
        });
    }

    debug!("captured {} rule blocks", blocks.len());
    blocks
}

fn split_header<'a>(line: &'a str, candidates: &CandidateSet) -> Option<(&'a str, &'a str)> {
    let (target, rest) = line.trim().split_once(':')?;

    // INVARIANT: Ignore `:=` and `::=` assignments to a variable sharing a
    // target's name.
    let rest = rest.strip_prefix(':').unwrap_or(rest);
    if rest.starts_with('=') || !candidates.contains(target) {
        return None;
    }

    Some((target, rest))
}

/// Extract recipe origin from one dump line.
///
/// Accepts any quoting style make has used around the file name over the
/// years: none, `'file'`, or `` `file' ``.
pub fn parse_origin(line: &str) -> Option<Origin> {
    let (_, tail) = line.split_once(RECIPE_MARKER)?;
    let (file, tail) = tail.rsplit_once(", line ")?;
    let digits = tail
        .chars()
        .take_while(char::is_ascii_digit)
        .collect::<String>();
    let line = digits.parse().ok()?;
    if !tail[digits.len()..].starts_with(')') {
        return None;
    }

    let file = file.trim_matches(|ch| matches!(ch, '\'' | '`' | '"'));
    if file.is_empty() {
        return None;
    }

    Some(Origin {
        file: file.to_owned(),
        line,
    })
}
