//! Table schemas, mutations and rows.

use std::collections::BTreeMap;

/// A `STRING(max_len)` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub max_len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub primary_key: String,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// CREATE TABLE statement for this schema.
    pub fn ddl(&self) -> String {
        let cols = self
            .columns
            .iter()
            .map(|c| format!("  {} STRING({})", c.name, c.max_len))
            .collect::<Vec<_>>()
            .join(",\n");
        format!(
            "CREATE TABLE {} (\n{}\n) PRIMARY KEY ({})",
            self.name, cols, self.primary_key
        )
    }
}

/// `Players(first_name, last_name, email, uuid)` keyed by email.
pub fn players_table() -> TableSchema {
    let col = |name: &str| ColumnDef {
        name: name.to_string(),
        max_len: 1024,
    };
    TableSchema {
        name: "Players".into(),
        columns: vec![col("first_name"), col("last_name"), col("email"), col("uuid")],
        primary_key: "email".into(),
    }
}

/// A row, column name to value.
pub type Row = BTreeMap<String, String>;

/// A single insert into one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub table: String,
    pub values: Vec<(String, String)>,
}

impl Mutation {
    pub fn insert(table: &str) -> Self {
        Self {
            table: table.to_string(),
            values: Vec::new(),
        }
    }

    pub fn set(mut self, column: &str, value: impl Into<String>) -> Self {
        self.values.push((column.to_string(), value.into()));
        self
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }
}
