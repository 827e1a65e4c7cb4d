use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use finsight_core::TransactionStore;

pub fn finsight_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".finsight"))
}

pub fn ensure_finsight_home() -> Result<PathBuf> {
    let dir = finsight_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// The persisted store blob lives under one fixed name.
pub fn transactions_path() -> Result<PathBuf> {
    Ok(ensure_finsight_home()?.join("transactions.json"))
}

/// Read the store once at startup; a missing blob yields the seed data.
pub fn load_store() -> Result<TransactionStore> {
    TransactionStore::load(&transactions_path()?)
}

/// Persist the whole list. Called after every store mutation.
pub fn save_store(store: &TransactionStore) -> Result<()> {
    store.save(&transactions_path()?)
}
