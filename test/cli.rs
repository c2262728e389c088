// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{stderr_of, stdout_of, ProjectFixture};

use anyhow::Result;
use indoc::indoc;
use pretty_assertions::assert_eq;

const DUMP: &str = indoc! {"
    # Make data base, printed on Sun Oct 18 09:00:00 2026

    # Files

    build: assert-HOST run-tests
    #  Phony target (prerequisite of .PHONY).
    #  Implicit rule search has not been done.
    #  File does not exist.
    #  File has not been updated.
    #  recipe to execute (from 'file.mk', line 10):
    \t@echo building $(HOST)

    run-tests:
    #  Phony target (prerequisite of .PHONY).
    #  Implicit rule search has not been done.
    #  File does not exist.
    #  File has not been updated.
    #  recipe to execute (from 'mk/test.mk', line 3):
    \t@echo testing

    build__internal:
    #  recipe to execute (from 'file.mk', line 20):
    \t@true
"};

const FILE_MK: &str = indoc! {"
    # Builds the project
    build: assert-HOST run-tests
    \t@echo building $(HOST)
"};

fn fixture() -> Result<ProjectFixture> {
    let fixture = ProjectFixture::new()?;
    fixture.write("file.mk", FILE_MK)?;
    fixture.write("dump.txt", DUMP)?;
    fixture.write("targets.txt", "build\nbuild__internal\n[pattern]: x\nrun-tests\n")?;

    Ok(fixture)
}

#[test]
fn report_from_files() -> Result<()> {
    let fixture = fixture()?;
    let output = fixture.mkcatalog([
        "--color",
        "never",
        "report",
        "--targets",
        "targets.txt",
        "--database",
        "dump.txt",
    ])?;

    assert!(output.status.success(), "{}", stderr_of(&output));
    let expect = indoc! {"
        TARGETS BY SOURCE
          file.mk (1)
            [build] (file.mk:10)
          mk/test.mk (1)
            [run-tests] (mk/test.mk:3)

        ALL TARGETS
          [build] (file.mk:10)
              args: [HOST]
              prereqs: [run-tests]
              Builds the project
          [run-tests] (mk/test.mk:3)
    "};
    assert_eq!(stdout_of(&output), expect);

    Ok(())
}

#[test]
fn report_reads_database_from_stdin() -> Result<()> {
    use std::{io::Write, process::Stdio};

    let fixture = fixture()?;
    let mut child = std::process::Command::new(env!("CARGO_BIN_EXE_mkcatalog"))
        .current_dir(fixture.path())
        .env("XDG_CONFIG_HOME", fixture.path().join(".config"))
        .args(["report", "--format", "names", "-t", "targets.txt", "-d", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(DUMP.as_bytes())?;
    }
    let output = child.wait_with_output()?;

    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(stdout_of(&output), "build\nrun-tests\n");

    Ok(())
}

#[test]
fn report_is_identical_across_runs() -> Result<()> {
    let fixture = fixture()?;
    let args = ["report", "-t", "targets.txt", "-d", "dump.txt"];

    let first = fixture.mkcatalog(args)?;
    let second = fixture.mkcatalog(args)?;
    assert_eq!(first.stdout, second.stdout);

    Ok(())
}

#[test]
fn missing_stream_fails() -> Result<()> {
    let fixture = fixture()?;
    let output = fixture.mkcatalog(["report", "--targets", "targets.txt"])?;

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("missing database dump"));
    assert!(output.stdout.is_empty());

    Ok(())
}

#[test]
fn unreadable_source_still_reports() -> Result<()> {
    let fixture = fixture()?;
    fixture.write(
        "dump.txt",
        DUMP.replace("'file.mk'", "'gone/missing.mk'"),
    )?;
    let output = fixture.mkcatalog(["report", "-t", "targets.txt", "-d", "dump.txt"])?;

    assert!(output.status.success(), "{}", stderr_of(&output));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("  [build] (gone/missing.mk:10)\n      args: [HOST]\n"));
    assert!(!stdout.contains("Builds the project"));

    Ok(())
}

#[test]
fn config_file_enables_color() -> Result<()> {
    let fixture = fixture()?;
    fixture.write("mkcatalog.toml", "[output]\ncolor = \"always\"\n")?;
    let output = fixture.mkcatalog([
        "--config",
        "mkcatalog.toml",
        "report",
        "-t",
        "targets.txt",
        "-d",
        "dump.txt",
    ])?;

    assert!(output.status.success(), "{}", stderr_of(&output));
    assert!(stdout_of(&output).starts_with("\x1b[1;36mTARGETS BY SOURCE\x1b[0m\n"));

    Ok(())
}

#[test]
fn invalid_config_file_fails() -> Result<()> {
    let fixture = fixture()?;
    fixture.write("mkcatalog.toml", "[output]\ncolor = 3\n")?;
    let output = fixture.mkcatalog([
        "--config",
        "mkcatalog.toml",
        "report",
        "-t",
        "targets.txt",
        "-d",
        "dump.txt",
    ])?;

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("cannot load configuration"));

    Ok(())
}

#[test]
fn guard_checks_variables() -> Result<()> {
    let fixture = ProjectFixture::new()?;

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_mkcatalog"))
        .current_dir(fixture.path())
        .env("XDG_CONFIG_HOME", fixture.path().join(".config"))
        .env("PLAYBOOK", "site.yml")
        .env_remove("INVENTORY")
        .args(["guard", "--var", "PLAYBOOK", "--var", "INVENTORY"])
        .output()?;
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("required variable(s) not set: INVENTORY"));

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_mkcatalog"))
        .current_dir(fixture.path())
        .env("XDG_CONFIG_HOME", fixture.path().join(".config"))
        .env("PLAYBOOK", "site.yml")
        .args(["guard", "--var", "PLAYBOOK"])
        .output()?;
    assert!(output.status.success(), "{}", stderr_of(&output));

    Ok(())
}

#[test]
fn scan_runs_make() -> Result<()> {
    if which::which("make").is_err() {
        return Ok(());
    }

    let fixture = ProjectFixture::new()?;
    fixture.write(
        "Makefile",
        indoc! {"
            include mk/vault.mk

            .PHONY: provision

            assert-%:
            \t@test -n \"$($*)\" || (echo \"$* is not set\" && exit 1)

            # Run the site playbook.
            provision: assert-PLAYBOOK assert-INVENTORY galaxy
            \t@ansible-playbook -i $(INVENTORY) $(PLAYBOOK)

            galaxy:
            \t## Install role dependencies.
            \t@ansible-galaxy install -r requirements.yml
        "},
    )?;
    fixture.write(
        "mk/vault.mk",
        indoc! {"
            encrypt: assert-FILE
            \t## Encrypt FILE in place.
            \t@ansible-vault encrypt $(FILE)
        "},
    )?;

    let output = fixture.mkcatalog(["scan"])?;
    assert!(output.status.success(), "{}", stderr_of(&output));

    let stdout = stdout_of(&output);
    let expect = indoc! {"
        TARGETS BY SOURCE
          Makefile (2)
            [galaxy] (Makefile:13)
            [provision] (Makefile:10)
          mk/vault.mk (1)
            [encrypt] (mk/vault.mk:2)

        ALL TARGETS
          [encrypt] (mk/vault.mk:2)
              args: [FILE]
              Encrypt FILE in place.
          [galaxy] (Makefile:13)
              Install role dependencies.
          [provision] (Makefile:10)
              args: [PLAYBOOK, INVENTORY]
              prereqs: [galaxy]
              Run the site playbook.
    "};
    assert_eq!(stdout, expect);

    Ok(())
}

#[test]
fn help_recipe_from_readme() -> Result<()> {
    if which::which("make").is_err() {
        return Ok(());
    }

    let fixture = ProjectFixture::new()?;
    fixture.write(
        "Makefile",
        indoc! {"
            .PHONY: help encrypt

            help:
            \t@$(MAKE) -pRrq -f $(firstword $(MAKEFILE_LIST)) : 2>/dev/null > .make-db || true
            \t@mkcatalog --color never report --targets .make-db --database .make-db

            # Encrypt a file in place.
            encrypt: assert-FILE
            \t@ansible-vault encrypt $(FILE)

            assert-%:
            \t@test -n \"$($*)\" || (echo \"$* is not set\" && exit 1)
        "},
    )?;

    let bin_dir = std::path::Path::new(env!("CARGO_BIN_EXE_mkcatalog"))
        .parent()
        .map(std::path::Path::to_path_buf)
        .unwrap_or_default();
    let mut paths = vec![bin_dir];
    paths.extend(std::env::split_paths(&std::env::var_os("PATH").unwrap_or_default()));

    let output = std::process::Command::new("make")
        .current_dir(fixture.path())
        .env("PATH", std::env::join_paths(paths)?)
        .env("XDG_CONFIG_HOME", fixture.path().join(".config"))
        .env_remove("MAKEFLAGS")
        .env_remove("MAKELEVEL")
        .env_remove("RUST_LOG")
        .args(["--no-print-directory", "help"])
        .output()?;
    assert!(output.status.success(), "{}", stderr_of(&output));

    let expect = indoc! {"
        TARGETS BY SOURCE
          Makefile (2)
            [encrypt] (Makefile:9)
            [help] (Makefile:4)

        ALL TARGETS
          [encrypt] (Makefile:9)
              args: [FILE]
              Encrypt a file in place.
          [help] (Makefile:4)
    "};
    assert_eq!(stdout_of(&output), expect);

    Ok(())
}
