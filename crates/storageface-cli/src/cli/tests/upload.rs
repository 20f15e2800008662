//! Tests for the upload subcommand.

use super::parse;
use crate::cli::{Cli, CliCommand, RepoTypeArg};
use clap::Parser;
use std::path::Path;

#[test]
fn cli_parse_upload_defaults() {
    match parse(&["storageface", "upload", "./photos", "--repo", "alice/photos"]) {
        CliCommand::Upload(args) => {
            assert_eq!(args.folder, Path::new("./photos"));
            assert_eq!(args.repo, "alice/photos");
            assert!(args.token.is_none());
            assert!(args.threads.is_none());
            assert!(args.repo_type.is_none());
            assert!(!args.private);
            assert!(args.path_in_repo.is_none());
            assert!(args.ignore.is_empty());
            assert!(args.presets.is_empty());
            assert!(!args.per_folder);
        }
        _ => panic!("expected Upload"),
    }
}

#[test]
fn cli_parse_upload_all_flags() {
    match parse(&[
        "storageface",
        "upload",
        "/data",
        "--repo",
        "org/set",
        "--token",
        "hf_x",
        "--threads",
        "8",
        "--repo-type",
        "model",
        "--private",
        "--path-in-repo",
        "raw/2024",
        "--ignore",
        "*.tmp",
        "--ignore",
        "cache/**",
        "--preset",
        "git",
        "--per-folder",
    ]) {
        CliCommand::Upload(args) => {
            assert_eq!(args.token.as_deref(), Some("hf_x"));
            assert_eq!(args.threads, Some(8));
            assert_eq!(args.repo_type, Some(RepoTypeArg::Model));
            assert!(args.private);
            assert_eq!(args.path_in_repo.as_deref(), Some("raw/2024"));
            assert_eq!(args.ignore, vec!["*.tmp", "cache/**"]);
            assert_eq!(args.presets, vec!["git"]);
            assert!(args.per_folder);
        }
        _ => panic!("expected Upload with flags"),
    }
}

#[test]
fn cli_parse_upload_requires_repo() {
    assert!(Cli::try_parse_from(["storageface", "upload", "./photos"]).is_err());
}

#[test]
fn cli_parse_upload_rejects_unknown_repo_type() {
    let res = Cli::try_parse_from([
        "storageface",
        "upload",
        ".",
        "--repo",
        "a/b",
        "--repo-type",
        "bucket",
    ]);
    assert!(res.is_err());
}
