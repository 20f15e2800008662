//! `storageface tree` – print a local folder as a tree.

use anyhow::Result;
use std::path::Path;
use storageface_core::tree::local_tree;

pub fn run_tree(folder: &Path) -> Result<()> {
    print!("{}", local_tree(folder)?);
    Ok(())
}
