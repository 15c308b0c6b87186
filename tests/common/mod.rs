// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use cassa::application::LedgerService;
use cassa::storage::{MemoryStore, SqliteStore};
use tempfile::TempDir;

/// Helper to create a service over a fresh in-memory store
pub fn memory_service() -> LedgerService<MemoryStore> {
    LedgerService::in_memory()
}

/// Helper to create a service with a temporary SQLite database
pub async fn sqlite_service() -> Result<(LedgerService<SqliteStore>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}
