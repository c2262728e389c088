// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Catalog report rendering.
//!
//! The text report has two sections. __TARGETS BY SOURCE__ lists each source
//! file with the targets it defines. __ALL TARGETS__ lists every target with
//! its declared args, prerequisites, and documentation. Both sections are
//! fully ordered, so identical input always renders identical output.

use crate::catalog::{Catalog, TargetRecord};

use std::io::{self, Write};

/// Bold cyan.
pub const HEADER_COLOR: &str = "\x1b[1;36m";

/// Yellow.
pub const FILE_COLOR: &str = "\x1b[33m";

/// Bold green.
pub const TARGET_COLOR: &str = "\x1b[1;32m";

/// Bright black.
pub const DOC_COLOR: &str = "\x1b[90m";

/// Back to terminal defaults.
pub const RESET: &str = "\x1b[0m";

/// Placeholder for targets whose definition site is unknown.
pub const UNKNOWN_LOCATION: &str = "unknown";

/// ANSI escapes wrapped around report elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub header: &'static str,
    pub file: &'static str,
    pub target: &'static str,
    pub doc: &'static str,
    pub reset: &'static str,
}

impl Palette {
    /// Palette using the color constants of this module.
    pub const fn ansi() -> Self {
        Self {
            header: HEADER_COLOR,
            file: FILE_COLOR,
            target: TARGET_COLOR,
            doc: DOC_COLOR,
            reset: RESET,
        }
    }

    /// Palette emitting no escapes at all.
    pub const fn plain() -> Self {
        Self {
            header: "",
            file: "",
            target: "",
            doc: "",
            reset: "",
        }
    }

    /// Pick colored or plain palette.
    pub const fn new(colored: bool) -> Self {
        if colored {
            Self::ansi()
        } else {
            Self::plain()
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::plain()
    }
}

/// Shape of rendered output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Two section catalog report.
    #[default]
    Text,

    /// Target names only, one per line.
    Names,
}

/// Render catalog in given format.
///
/// # Errors
///
/// - Return [`io::Error`] if writing to `out` fails.
pub fn render(
    catalog: &Catalog,
    format: OutputFormat,
    palette: &Palette,
    out: &mut impl Write,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => render_text(catalog, palette, out),
        OutputFormat::Names => render_names(catalog, out),
    }
}

/// Render two section catalog report.
///
/// # Errors
///
/// - Return [`io::Error`] if writing to `out` fails.
pub fn render_text(catalog: &Catalog, palette: &Palette, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}TARGETS BY SOURCE{}", palette.header, palette.reset)?;
    for (file, records) in catalog.by_source() {
        writeln!(
            out,
            "  {}{}{} ({})",
            palette.file,
            file,
            palette.reset,
            records.len()
        )?;
        for record in records {
            write!(out, "    ")?;
            write_entry(record, palette, out)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "{}ALL TARGETS{}", palette.header, palette.reset)?;
    for record in catalog.targets() {
        write!(out, "  ")?;
        write_entry(record, palette, out)?;
        if !record.declared_args.is_empty() {
            writeln!(out, "      args: [{}]", record.declared_args.join(", "))?;
        }
        if !record.prerequisites.is_empty() {
            writeln!(out, "      prereqs: [{}]", record.prerequisites.join(", "))?;
        }
        for line in &record.doc_lines {
            if line.is_empty() {
                writeln!(out)?;
            } else {
                writeln!(out, "      {}{line}{}", palette.doc, palette.reset)?;
            }
        }
    }

    Ok(())
}

/// Render sorted target names, one per line.
///
/// # Errors
///
/// - Return [`io::Error`] if writing to `out` fails.
pub fn render_names(catalog: &Catalog, out: &mut impl Write) -> io::Result<()> {
    let mut last = None;
    for record in catalog.targets() {
        // INVARIANT: Targets with several definitions are named once.
        if last == Some(&record.name) {
            continue;
        }
        writeln!(out, "{}", record.name)?;
        last = Some(&record.name);
    }

    Ok(())
}

fn write_entry(record: &TargetRecord, palette: &Palette, out: &mut impl Write) -> io::Result<()> {
    let location = record
        .location
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| UNKNOWN_LOCATION.into());
    writeln!(
        out,
        "[{}{}{}] ({location})",
        palette.target, record.name, palette.reset
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DuplicatePolicy, Location, TargetName};
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn record(name: &str, location: Option<(&str, usize)>) -> TargetRecord {
        let mut record = TargetRecord::bare(TargetName::new(name));
        record.location = location.map(|(file, line)| Location {
            file: file.into(),
            abs_path: format!("/proj/{file}").into(),
            line,
        });
        record
    }

    fn sample_catalog() -> Catalog {
        let mut catalog = Catalog::default();

        let mut provision = record("provision", Some(("ansible.mk", 20)))
            .with_args(["assert-PLAYBOOK", "assert-INVENTORY", "galaxy"]);
        provision.doc_lines = vec![
            "Run playbook against inventory.".into(),
            String::new(),
            "Pass extra flags through ANSIBLE_ARGS.".into(),
        ];
        catalog.insert(provision, DuplicatePolicy::LastSeen);
        catalog.insert(
            record("encrypt", Some(("vault.mk", 4))).with_args(["assert-FILE"]),
            DuplicatePolicy::LastSeen,
        );
        catalog.insert(record("help", Some(("base.mk", 9))), DuplicatePolicy::LastSeen);
        catalog.insert(record("galaxy", None), DuplicatePolicy::LastSeen);

        catalog
    }

    fn render_to_string(catalog: &Catalog, format: OutputFormat, palette: &Palette) -> String {
        let mut out = Vec::new();
        render(catalog, format, palette, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn render_plain_text_report() {
        let result = render_to_string(&sample_catalog(), OutputFormat::Text, &Palette::plain());
        let expect = indoc! {"
            TARGETS BY SOURCE
              ansible.mk (1)
                [provision] (ansible.mk:20)
              base.mk (1)
                [help] (base.mk:9)
              vault.mk (1)
                [encrypt] (vault.mk:4)

            ALL TARGETS
              [encrypt] (vault.mk:4)
                  args: [FILE]
              [galaxy] (unknown)
              [help] (base.mk:9)
              [provision] (ansible.mk:20)
                  args: [PLAYBOOK, INVENTORY]
                  prereqs: [galaxy]
                  Run playbook against inventory.

                  Pass extra flags through ANSIBLE_ARGS.
        "};
        assert_eq!(result, expect);
    }

    #[test]
    fn render_colored_wraps_elements() {
        let result = render_to_string(&sample_catalog(), OutputFormat::Text, &Palette::ansi());

        assert!(result.starts_with("\x1b[1;36mTARGETS BY SOURCE\x1b[0m\n"));
        assert!(result.contains("  \x1b[33mbase.mk\x1b[0m (1)\n"));
        assert!(result.contains("[\x1b[1;32mhelp\x1b[0m] (base.mk:9)\n"));
        assert!(result.contains("      \x1b[90mRun playbook against inventory.\x1b[0m\n"));
    }

    #[test]
    fn render_names_once_each() {
        let mut catalog = sample_catalog();
        catalog.insert(record("help", Some(("other.mk", 1))), DuplicatePolicy::AllDefinitions);

        let result = render_to_string(&catalog, OutputFormat::Names, &Palette::plain());
        assert_eq!(result, "encrypt\ngalaxy\nhelp\nprovision\n");
    }

    #[test]
    fn render_empty_catalog() {
        let result = render_to_string(&Catalog::default(), OutputFormat::Text, &Palette::plain());
        assert_eq!(result, "TARGETS BY SOURCE\n\nALL TARGETS\n");
    }
}
