//! Tests for tree, remote-tree, whoami and completions.

use super::parse;
use crate::cli::{CliCommand, RepoTypeArg};
use clap_complete::Shell;
use std::path::Path;

#[test]
fn cli_parse_tree() {
    match parse(&["storageface", "tree", "/srv/data"]) {
        CliCommand::Tree { folder } => assert_eq!(folder, Path::new("/srv/data")),
        _ => panic!("expected Tree"),
    }
}

#[test]
fn cli_parse_remote_tree() {
    match parse(&[
        "storageface",
        "remote-tree",
        "--repo",
        "alice/photos",
        "--repo-type",
        "space",
    ]) {
        CliCommand::RemoteTree {
            repo,
            repo_type,
            token,
        } => {
            assert_eq!(repo, "alice/photos");
            assert_eq!(repo_type, Some(RepoTypeArg::Space));
            assert!(token.is_none());
        }
        _ => panic!("expected RemoteTree"),
    }
}

#[test]
fn cli_parse_whoami() {
    match parse(&["storageface", "whoami", "--token", "hf_abc"]) {
        CliCommand::Whoami { token } => assert_eq!(token.as_deref(), Some("hf_abc")),
        _ => panic!("expected Whoami"),
    }
    match parse(&["storageface", "whoami"]) {
        CliCommand::Whoami { token } => assert!(token.is_none()),
        _ => panic!("expected Whoami without token"),
    }
}

#[test]
fn cli_parse_completions() {
    match parse(&["storageface", "completions", "zsh"]) {
        CliCommand::Completions { shell } => assert_eq!(shell, Shell::Zsh),
        _ => panic!("expected Completions"),
    }
}

#[test]
fn cli_definition_is_consistent() {
    use clap::CommandFactory;
    crate::cli::Cli::command().debug_assert();
}
