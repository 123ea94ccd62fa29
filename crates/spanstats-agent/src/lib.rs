//! spanstats agent library entry.
//!
//! Wires config, view registration, exporters, the database collaborator and
//! the operation driver. Consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod agent;
pub mod app_state;
pub mod config;
pub mod db;
pub mod driver;
pub mod export;
pub mod obs;
pub mod ops;
pub mod router;
pub mod shutdown;
