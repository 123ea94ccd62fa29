//! Database collaborator seam.
//!
//! The driver talks to the database only through [`Database`]. The agent
//! ships an in-memory backend and an instrumenting wrapper that records
//! per-call client views.

pub mod instrumented;
pub mod memory;
pub mod schema;

use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;

use spanstats_core::error::Result;

use crate::config::DatabaseId;

pub use instrumented::{register_client_views, ClientMeasures, InstrumentedDatabase};
pub use memory::MemoryDatabase;
pub use schema::{players_table, ColumnDef, Mutation, Row, TableSchema};

#[async_trait]
pub trait Database: Send + Sync {
    /// Create a database with these tables. Completes when the schema is live.
    async fn create_database(&self, id: &DatabaseId, tables: &[TableSchema]) -> Result<()>;

    /// Read one row by primary key, projected onto `columns`.
    async fn read_row(
        &self,
        id: &DatabaseId,
        table: &str,
        key: &str,
        columns: &[&str],
    ) -> Result<Option<Row>>;

    /// Apply a batch of inserts atomically.
    async fn write(&self, id: &DatabaseId, mutations: Vec<Mutation>) -> Result<()>;

    /// Release client resources. Later calls fail.
    fn close(&self);
}

/// Owns a client and closes it exactly once: on `release()` or on drop.
pub struct ClientGuard {
    db: Arc<dyn Database>,
    released: bool,
}

impl ClientGuard {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db, released: false }
    }

    pub fn release(mut self) {
        self.close_once();
    }

    fn close_once(&mut self) {
        if !self.released {
            self.released = true;
            self.db.close();
            tracing::debug!("database client closed");
        }
    }
}

impl Deref for ClientGuard {
    type Target = dyn Database;

    fn deref(&self) -> &Self::Target {
        self.db.as_ref()
    }
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        self.close_once();
    }
}
