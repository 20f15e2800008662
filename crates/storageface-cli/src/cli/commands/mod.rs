//! CLI command handlers, one file per command.

mod completions;
mod remote_tree;
mod tree;
mod upload;
mod whoami;

pub use completions::run_completions;
pub use remote_tree::run_remote_tree;
pub use tree::run_tree;
pub use upload::run_upload;
pub use whoami::run_whoami;

/// Environment variable consulted when `--token` is not given.
pub const TOKEN_ENV: &str = "HF_TOKEN";

/// `--token` if given, else `HF_TOKEN`, else empty.
pub(crate) fn resolve_token(flag: Option<String>) -> String {
    flag.or_else(|| std::env::var(TOKEN_ENV).ok())
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}
