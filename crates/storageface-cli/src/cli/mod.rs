//! CLI for StorageFace: upload local folders to a hub repository.

mod commands;
mod progress_bar;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;
use storageface_core::config;
use storageface_core::job::RepoType;

use commands::{run_completions, run_remote_tree, run_tree, run_upload, run_whoami};

/// Top-level CLI for StorageFace.
#[derive(Debug, Parser)]
#[command(name = "storageface")]
#[command(about = "StorageFace: parallel folder uploads to a Hugging Face style hub", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Upload every file of a local folder to a repository.
    ///
    /// Files are committed inline, one request per file, so each worker holds
    /// a whole file in memory. Files above `max_file_size_mb` in config.toml
    /// (default 100) fail individually without being read.
    Upload(UploadArgs),

    /// Print the folder as a tree.
    Tree {
        /// Local folder.
        folder: PathBuf,
    },

    /// Print the files of a repository as a tree.
    RemoteTree {
        /// Repository id (`owner/name`).
        #[arg(long)]
        repo: String,
        #[arg(long, value_enum)]
        repo_type: Option<RepoTypeArg>,
        /// Access token (falls back to HF_TOKEN; omit for public repositories).
        #[arg(long)]
        token: Option<String>,
    },

    /// Check an access token and print the account it belongs to.
    Whoami {
        /// Access token (falls back to HF_TOKEN).
        #[arg(long)]
        token: Option<String>,
    },

    /// Print a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Local folder to upload.
    pub folder: PathBuf,

    /// Destination repository id (`owner/name`).
    #[arg(long)]
    pub repo: String,

    /// Access token with write permission (falls back to HF_TOKEN).
    #[arg(long)]
    pub token: Option<String>,

    /// Parallel upload workers (default from config).
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Repository kind (default from config).
    #[arg(long, value_enum)]
    pub repo_type: Option<RepoTypeArg>,

    /// Create the repository as private if it does not exist yet.
    #[arg(long)]
    pub private: bool,

    /// Destination folder inside the repository.
    #[arg(long, value_name = "PATH")]
    pub path_in_repo: Option<String>,

    /// Glob pattern of files to skip, relative to FOLDER. Repeatable.
    #[arg(long = "ignore", value_name = "PATTERN")]
    pub ignore: Vec<String>,

    /// Named ignore preset (pycache, git, venv, pyc, log, tmp, ds-store). Repeatable.
    #[arg(long = "preset", value_name = "NAME")]
    pub presets: Vec<String>,

    /// Upload each first-level sub-folder as its own job, into a folder of the same name.
    #[arg(long)]
    pub per_folder: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RepoTypeArg {
    Model,
    Dataset,
    Space,
}

impl From<RepoTypeArg> for RepoType {
    fn from(arg: RepoTypeArg) -> Self {
        match arg {
            RepoTypeArg::Model => RepoType::Model,
            RepoTypeArg::Dataset => RepoType::Dataset,
            RepoTypeArg::Space => RepoType::Space,
        }
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        if let CliCommand::Completions { shell } = cli.command {
            return run_completions(shell);
        }
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Upload(args) => run_upload(&cfg, args).await?,
            CliCommand::Tree { folder } => run_tree(&folder)?,
            CliCommand::RemoteTree {
                repo,
                repo_type,
                token,
            } => {
                let repo_type = repo_type.map(RepoType::from).unwrap_or(cfg.repo_type);
                run_remote_tree(&cfg, &repo, repo_type, token).await?;
            }
            CliCommand::Whoami { token } => run_whoami(&cfg, token).await?,
            CliCommand::Completions { shell } => run_completions(shell)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
