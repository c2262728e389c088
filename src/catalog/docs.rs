// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Target documentation extraction.
//!
//! Targets document themselves through comments in the makefile that defines
//! them. The preferred spot is right below the rule header, ahead of the
//! recipe body:
//!
//! ```text
//! provision: assert-PLAYBOOK assert-INVENTORY
//! 	# Run playbook against inventory.
//! 	#
//! 	# Pass extra flags through ANSIBLE_ARGS.
//! 	@ansible-playbook -i $(INVENTORY) $(PLAYBOOK) $(ANSIBLE_ARGS)
//! ```
//!
//! When nothing sits below the header, a contiguous block of comments
//! starting at the first column directly above the header is used instead.
//! Such a block never counts as documentation of the rule before it.
//! Comment markers and indentation are stripped either way.
//!
//! Documentation is best effort. A source file that cannot be read simply
//! produces no documentation.

use std::{
    collections::HashMap,
    fs::read_to_string,
    io,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Read makefile sources.
pub trait SourceReader {
    /// Read entire content of source file at `path`.
    fn read_source(&self, path: &Path) -> io::Result<String>;
}

/// Read makefile sources from the file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsReader;

impl SourceReader for FsReader {
    fn read_source(&self, path: &Path) -> io::Result<String> {
        read_to_string(path)
    }
}

/// Extract documentation lines of targets from their source files.
///
/// Every source file is read and indexed at most once, no matter how many
/// targets it defines.
#[derive(Debug, Default)]
pub struct DocExtractor<R = FsReader>
where
    R: SourceReader,
{
    reader: R,
    sources: HashMap<PathBuf, Option<SourceIndex>>,
}

impl<R> DocExtractor<R>
where
    R: SourceReader,
{
    /// Construct new documentation extractor.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            sources: HashMap::new(),
        }
    }

    /// Documentation lines for target defined in source file at `path`.
    ///
    /// Returns nothing if the file cannot be read, or holds no rule header
    /// for the target.
    pub fn doc_lines(&mut self, path: &Path, target: &str) -> Vec<String> {
        let index = self
            .sources
            .entry(path.to_path_buf())
            .or_insert_with(|| match self.reader.read_source(path) {
                Ok(content) => Some(SourceIndex::new(&content)),
                Err(error) => {
                    debug!("no documentation from {:?}: {error}", path.display());
                    None
                }
            });

        index
            .as_ref()
            .map(|index| index.doc_lines(target))
            .unwrap_or_default()
    }
}

/// Source file split into lines with a lookup table of rule headers.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceIndex {
    lines: Vec<String>,
    headers: HashMap<String, usize>,
}

impl SourceIndex {
    fn new(content: &str) -> Self {
        let lines = content.lines().map(str::to_owned).collect::<Vec<_>>();
        let mut headers = HashMap::new();
        for (idx, line) in lines.iter().enumerate() {
            for name in header_names(line) {
                // INVARIANT: First occurrence of a header wins.
                headers.entry(name.to_owned()).or_insert(idx);
            }
        }

        Self { lines, headers }
    }

    fn doc_lines(&self, target: &str) -> Vec<String> {
        let Some(&header) = self.headers.get(target) else {
            return Vec::new();
        };

        let mut end = header + 1;
        while self.lines.get(end).is_some_and(|line| is_blank_or_comment(line)) {
            end += 1;
        }

        // INVARIANT: Column 0 comments right above the next header belong to
        // that header, never to this one.
        if self.lines.get(end).is_some_and(|line| !header_names(line).is_empty()) {
            while end > header + 1 && self.lines[end - 1].starts_with('#') {
                end -= 1;
            }
        }

        let below = self.lines[header + 1..end]
            .iter()
            .map(|line| strip_comment(line))
            .collect::<Vec<_>>();
        let below = trim_blank_edges(below);
        if !below.is_empty() {
            return below;
        }

        // Indented comments above a header are recipe lines of the previous
        // rule.
        let mut above = self.lines[..header]
            .iter()
            .rev()
            .take_while(|line| line.starts_with('#'))
            .map(|line| strip_comment(line))
            .collect::<Vec<_>>();
        above.reverse();
        trim_blank_edges(above)
    }
}

/// Names declared by a rule header line.
///
/// A rule header starts at the first column, and is not a `:=` or `::=`
/// assignment. Recipe lines start with a tab and are never headers.
fn header_names(line: &str) -> Vec<&str> {
    if line.starts_with(|ch: char| ch.is_whitespace() || ch == '#') {
        return Vec::new();
    }

    let Some((names, rest)) = line.split_once(':') else {
        return Vec::new();
    };
    let rest = rest.strip_prefix(':').unwrap_or(rest);
    if rest.starts_with('=') || names.contains('=') {
        return Vec::new();
    }

    names.split_whitespace().collect()
}

fn is_blank_or_comment(line: &str) -> bool {
    let line = line.trim_start();
    line.is_empty() || line.starts_with('#')
}

fn strip_comment(line: &str) -> String {
    line.trim_start().trim_start_matches('#').trim().to_owned()
}

fn trim_blank_edges(mut lines: Vec<String>) -> Vec<String> {
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    let leading = lines.iter().take_while(|line| line.is_empty()).count();
    lines.drain(..leading);
    lines
}
