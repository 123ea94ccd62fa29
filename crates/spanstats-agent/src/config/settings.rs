//! Environment resolution on top of the file config.

use std::fmt;

use spanstats_core::error::{Result, StatsError};

use super::schema::AgentConfig;

pub const INSTANCE_ID_ENV: &str = "INSTANCE_ID";
pub const DATABASE_ID_ENV: &str = "DATABASE_ID";

/// Checked in order; first non-empty value wins.
pub const PROJECT_ENV_VARS: [&str; 3] = ["GOOGLE_CLOUD_PROJECT", "GCLOUD_PROJECT", "GCP_PROJECT"];

/// Fully-qualified database identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatabaseId {
    pub project: String,
    pub instance: String,
    pub database: String,
}

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/instances/{}/databases/{}",
            self.project, self.instance, self.database
        )
    }
}

/// Everything the agent needs at startup.
#[derive(Debug)]
pub struct Settings {
    pub database: DatabaseId,
    pub config: AgentConfig,
}

impl Settings {
    /// Resolve against the process environment.
    pub fn from_env(config: AgentConfig) -> Result<Self> {
        Self::resolve(config, |k| std::env::var(k).ok())
    }

    /// Resolve with an explicit lookup (tests inject their own).
    pub fn resolve<F>(config: AgentConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());

        let instance = non_empty(INSTANCE_ID_ENV)
            .ok_or_else(|| StatsError::MissingConfig(format!("{INSTANCE_ID_ENV} is not set")))?;
        let database = non_empty(DATABASE_ID_ENV)
            .ok_or_else(|| StatsError::MissingConfig(format!("{DATABASE_ID_ENV} is not set")))?;

        let project = PROJECT_ENV_VARS
            .iter()
            .find_map(|k| non_empty(k))
            .or_else(|| config.project_id.clone())
            .ok_or_else(|| {
                StatsError::MissingConfig(format!(
                    "no project id: set one of {} or project_id in config",
                    PROJECT_ENV_VARS.join(", ")
                ))
            })?;

        Ok(Self {
            database: DatabaseId {
                project,
                instance,
                database,
            },
            config,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.database.project
    }
}
