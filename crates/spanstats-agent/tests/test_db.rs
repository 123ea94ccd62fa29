//! Database doubles shared by driver and agent tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use spanstats_agent::config::DatabaseId;
use spanstats_agent::db::{Database, MemoryDatabase, Mutation, Row, TableSchema};
use spanstats_core::error::{DbErrorKind, Result, StatsError};

pub fn db_id() -> DatabaseId {
    DatabaseId {
        project: "test-project".into(),
        instance: "test-instance".into(),
        database: "test-db".into(),
    }
}

/// Memory backend that fails the n-th write (1-based) and counts closes.
pub struct FlakyDatabase {
    pub inner: MemoryDatabase,
    pub fail_write_at: Option<u32>,
    writes: AtomicU32,
    closes: AtomicU64,
}

impl FlakyDatabase {
    pub fn new(fail_write_at: Option<u32>) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryDatabase::new(),
            fail_write_at,
            writes: AtomicU32::new(0),
            closes: AtomicU64::new(0),
        })
    }

    pub fn closes(&self) -> u64 {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Database for FlakyDatabase {
    async fn create_database(&self, id: &DatabaseId, tables: &[TableSchema]) -> Result<()> {
        self.inner.create_database(id, tables).await
    }

    async fn read_row(
        &self,
        id: &DatabaseId,
        table: &str,
        key: &str,
        columns: &[&str],
    ) -> Result<Option<Row>> {
        self.inner.read_row(id, table, key, columns).await
    }

    async fn write(&self, id: &DatabaseId, mutations: Vec<Mutation>) -> Result<()> {
        let n = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_write_at == Some(n) {
            return Err(StatsError::db(DbErrorKind::Unavailable, "injected write failure"));
        }
        self.inner.write(id, mutations).await
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close();
    }
}

/// Create never completes.
pub struct HangingDatabase;

#[async_trait]
impl Database for HangingDatabase {
    async fn create_database(&self, _id: &DatabaseId, _tables: &[TableSchema]) -> Result<()> {
        std::future::pending::<()>().await;
        Ok(())
    }

    async fn read_row(&self, _: &DatabaseId, _: &str, _: &str, _: &[&str]) -> Result<Option<Row>> {
        Ok(None)
    }

    async fn write(&self, _: &DatabaseId, _: Vec<Mutation>) -> Result<()> {
        Ok(())
    }

    fn close(&self) {}
}
