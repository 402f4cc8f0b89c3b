//! gridlock-store: persistent game results
//!
//! [`TursoResultStore`] implements the core [`ResultStore`](gridlock_core::ResultStore)
//! trait on top of libSQL. It can use:
//! - a remote Turso database
//! - a local embedded SQLite file
//! - an in-memory database (tests, throwaway servers)

mod error;
mod turso;

pub use error::{Error, Result};
pub use turso::TursoResultStore;
