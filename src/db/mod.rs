pub mod duplicates;

pub use duplicates::DuplicateChecker;

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::{ConnectOptions, Row};

use crate::config::Records;

/// Read-only view of prior applicants.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Whether any applicant's `personal_info.email` equals `email` after
    /// trimming and lowercasing both sides.
    async fn email_exists(&self, email: &str) -> Result<bool, anyhow::Error>;
}

#[derive(Clone)]
pub struct Database {
    pub pool: PgPool,
    query: String,
}

impl Database {
    /// The pool connects on first use, so an unreachable database surfaces as
    /// a failed duplicate check instead of a start-up failure.
    pub fn connect_lazy(url: &str, records: &Records) -> Result<Self, anyhow::Error> {
        let opts: PgConnectOptions = url.parse()?;
        let opts = opts.log_statements(log::LevelFilter::Debug);

        let pool = PgPoolOptions::new()
            .max_connections(records.max_connections)
            .acquire_timeout(Duration::from_secs(records.timeout_secs))
            .connect_lazy_with(opts);

        Ok(Self {
            pool,
            query: email_exists_query(&records.table),
        })
    }

    /// `None` when no database URL is configured.
    pub fn from_config(records: &Records) -> Result<Option<Self>, anyhow::Error> {
        match records.url.as_deref() {
            Some(url) if !url.trim().is_empty() => Self::connect_lazy(url, records).map(Some),
            _ => Ok(None),
        }
    }
}

/// `table` is checked against a plain identifier pattern when the config is built.
/// The trimmed set matches `char::is_ascii_whitespace`, which the submitted side uses.
fn email_exists_query(table: &str) -> String {
    format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE lower(btrim(personal_info->>'email', E' \\t\\n\\f\\r')) = $1)",
        table
    )
}

#[async_trait::async_trait]
impl RecordStore for Database {
    async fn email_exists(&self, email: &str) -> Result<bool, anyhow::Error> {
        let row = sqlx::query(&self.query)
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        let exists: bool = row.try_get(0)?;
        Ok(exists)
    }
}
