//! In-memory database backend.
//!
//! Insert batches are validated in full before any row is applied, so a
//! failing batch leaves the table untouched.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use spanstats_core::error::{DbErrorKind, Result, StatsError};

use super::schema::{Mutation, Row, TableSchema};
use super::Database;
use crate::config::DatabaseId;

struct Table {
    schema: TableSchema,
    rows: BTreeMap<String, Row>,
}

struct DbState {
    tables: HashMap<String, Table>,
}

#[derive(Default)]
pub struct MemoryDatabase {
    databases: DashMap<String, DbState>,
    latency: Duration,
    closed: AtomicBool,
    close_calls: AtomicU64,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps this long before touching state.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn close_calls(&self) -> u64 {
        self.close_calls.load(Ordering::Relaxed)
    }

    pub fn row_count(&self, id: &DatabaseId, table: &str) -> usize {
        self.databases
            .get(&id.to_string())
            .and_then(|db| db.tables.get(table).map(|t| t.rows.len()))
            .unwrap_or(0)
    }

    async fn enter(&self) -> Result<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.closed.load(Ordering::Acquire) {
            return Err(StatsError::db(DbErrorKind::Unavailable, "client is closed"));
        }
        Ok(())
    }
}

fn not_found(what: &str) -> StatsError {
    StatsError::db(DbErrorKind::NotFound, what.to_string())
}

fn validate_batch(db: &DbState, mutations: &[Mutation]) -> Result<()> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    for m in mutations {
        let table = db
            .tables
            .get(&m.table)
            .ok_or_else(|| not_found(&format!("table not found: {}", m.table)))?;

        for (col, val) in &m.values {
            let def = table.schema.column(col).ok_or_else(|| {
                StatsError::db(
                    DbErrorKind::InvalidArgument,
                    format!("unknown column {}.{}", m.table, col),
                )
            })?;
            if val.chars().count() > def.max_len {
                return Err(StatsError::db(
                    DbErrorKind::InvalidArgument,
                    format!("value for {}.{} exceeds STRING({})", m.table, col, def.max_len),
                ));
            }
        }

        let key = m.get(&table.schema.primary_key).ok_or_else(|| {
            StatsError::db(
                DbErrorKind::InvalidArgument,
                format!("insert into {} is missing key column {}", m.table, table.schema.primary_key),
            )
        })?;
        if table.rows.contains_key(key) || !seen.insert((m.table.as_str(), key)) {
            return Err(StatsError::db(
                DbErrorKind::AlreadyExists,
                format!("row {key} already exists in {}", m.table),
            ));
        }
    }
    Ok(())
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn create_database(&self, id: &DatabaseId, tables: &[TableSchema]) -> Result<()> {
        self.enter().await?;
        match self.databases.entry(id.to_string()) {
            Entry::Occupied(_) => Err(StatsError::db(
                DbErrorKind::AlreadyExists,
                format!("database already exists: {id}"),
            )),
            Entry::Vacant(v) => {
                let tables = tables
                    .iter()
                    .map(|s| {
                        (
                            s.name.clone(),
                            Table {
                                schema: s.clone(),
                                rows: BTreeMap::new(),
                            },
                        )
                    })
                    .collect();
                v.insert(DbState { tables });
                Ok(())
            }
        }
    }

    async fn read_row(
        &self,
        id: &DatabaseId,
        table: &str,
        key: &str,
        columns: &[&str],
    ) -> Result<Option<Row>> {
        self.enter().await?;
        let db = self
            .databases
            .get(&id.to_string())
            .ok_or_else(|| not_found(&format!("database not found: {id}")))?;
        let t = db
            .tables
            .get(table)
            .ok_or_else(|| not_found(&format!("table not found: {table}")))?;

        if let Some(bad) = columns.iter().find(|c| t.schema.column(c).is_none()) {
            return Err(StatsError::db(
                DbErrorKind::InvalidArgument,
                format!("unknown column {table}.{bad}"),
            ));
        }

        Ok(t.rows.get(key).map(|row| {
            row.iter()
                .filter(|(c, _)| columns.contains(&c.as_str()))
                .map(|(c, v)| (c.clone(), v.clone()))
                .collect()
        }))
    }

    async fn write(&self, id: &DatabaseId, mutations: Vec<Mutation>) -> Result<()> {
        self.enter().await?;
        let mut db = self
            .databases
            .get_mut(&id.to_string())
            .ok_or_else(|| not_found(&format!("database not found: {id}")))?;

        validate_batch(&db, &mutations)?;

        for m in mutations {
            if let Some(table) = db.tables.get_mut(&m.table) {
                let key = m.get(&table.schema.primary_key).unwrap_or_default().to_string();
                table.rows.insert(key, m.values.into_iter().collect());
            }
        }
        Ok(())
    }

    fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::Relaxed);
        self.closed.store(true, Ordering::Release);
    }
}
