//! JSON tree files and JSONL record logs.
//!
//! Tree files are rewritten whole on every persist; logs are append-only,
//! one JSON object per line. Output files are auto-created empty on first
//! access; input files that must already exist fail loudly when missing.

use crate::error::{Error, Result};
use crate::tree::ModuleTree;
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Load a tree that must already exist.
pub async fn load_tree(path: &Path) -> Result<ModuleTree> {
    if !path.exists() {
        return Err(Error::MissingTree(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

/// Load a tree, creating an empty one on disk if the file is missing.
pub async fn load_or_create_tree(path: &Path) -> Result<ModuleTree> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let tree = ModuleTree::new();
        save_tree(&tree, path).await?;
        warn!("Create tree file at: {}", path.display());
        return Ok(tree);
    }
    load_tree(path).await
}

/// Rewrite the whole tree file.
pub async fn save_tree(tree: &ModuleTree, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(tree)?;
    fs::write(path, content).await?;
    Ok(())
}

/// Read every record of a JSONL log, creating an empty file if missing.
pub async fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, "").await?;
        info!("Create jsonl file at: {}", path.display());
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path).await?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| Ok(serde_json::from_str(line)?))
        .collect()
}

/// Append one record as a single JSONL line.
pub async fn append_jsonl<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let mut line = serde_json::to_string(record)?;
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    Ok(())
}
