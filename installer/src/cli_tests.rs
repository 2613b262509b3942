//! Tests for installer CLI parsing and default behaviours.

use super::*;
use clap::error::ErrorKind;
use rstest::rstest;

#[test]
fn cli_parses_defaults() {
    let cli = Cli::parse_from(["coqui-installer"]);
    assert!(!cli.install_php);
    assert!(!cli.install_composer);
    assert!(!cli.install_coqui);
    assert!(!cli.non_interactive);
    assert_eq!(cli.verbosity, 0);
    assert!(!cli.quiet);
    assert_eq!(cli.mode(), InstallMode::Full);
}

#[rstest]
#[case::short(&["coqui-installer", "-y"])]
#[case::long(&["coqui-installer", "--non-interactive"])]
#[case::alias(&["coqui-installer", "--yes"])]
fn cli_parses_non_interactive(#[case] args: &[&str]) {
    let cli = Cli::parse_from(args);
    assert!(cli.non_interactive);
}

#[test]
fn selective_flags_combine() {
    let cli = Cli::parse_from(["coqui-installer", "--install-coqui", "--install-php"]);
    assert_eq!(
        cli.mode(),
        InstallMode::Selective(Selection {
            php: true,
            composer: false,
            coqui: true,
        })
    );
}

#[test]
fn cli_counts_verbosity() {
    let cli = Cli::parse_from(["coqui-installer", "-vv"]);
    assert_eq!(cli.verbosity, 2);
}

#[test]
fn verbose_conflicts_with_quiet() {
    let err = Cli::try_parse_from(["coqui-installer", "-v", "-q"]).expect_err("conflict");
    assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
}

#[test]
fn unknown_flags_are_rejected() {
    let err = Cli::try_parse_from(["coqui-installer", "--install-everything"])
        .expect_err("unknown flag");
    assert_eq!(err.kind(), ErrorKind::UnknownArgument);
}

#[test]
fn help_is_reported_as_display_help() {
    let err = Cli::try_parse_from(["coqui-installer", "--help"]).expect_err("help exits");
    assert_eq!(err.kind(), ErrorKind::DisplayHelp);
}

#[test]
fn cli_definition_is_consistent() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}
