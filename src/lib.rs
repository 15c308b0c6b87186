pub mod application;
pub mod cli;
pub mod domain;
pub mod io;
pub mod storage;

pub use application::{LedgerError, LedgerService};
pub use domain::*;
pub use storage::{AccountStore, MemoryStore, SqliteStore};
