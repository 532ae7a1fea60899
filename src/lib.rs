pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod handlers;
pub mod server;
pub mod submission;
pub mod templates;

use std::sync::Arc;

use config::{Config, Mode};
use db::{Database, DuplicateChecker, RecordStore};
use email::{Mailer, ResendClient};
use error::{ApplyError, Subsystem};
use templates::EmailTemplates;

/// Process-wide handles. Built once at start-up and never mutated; the
/// submission handler only sees them through the `Mailer` and `RecordStore`
/// traits.
#[derive(Clone)]
pub struct AppState {
    pub mode: Mode,
    pub config: Config,
    pub mailer: Option<Arc<dyn Mailer>>,
    pub duplicates: Option<DuplicateChecker>,
    pub templates: EmailTemplates,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Arc<Self>, anyhow::Error> {
        let mailer = ResendClient::from_config(&config.mail)?
            .map(|client| {
                tracing::info!("Sending confirmations as {}", client.sender());
                Arc::new(client) as Arc<dyn Mailer>
            });

        let records = Database::from_config(&config.records)?
            .map(|db| Arc::new(db) as Arc<dyn RecordStore>);

        if mailer.is_none() {
            tracing::warn!("RESEND_API_KEY is not configured, submissions will be rejected");
        }
        if records.is_none() {
            tracing::warn!("DATABASE_URL is not configured, submissions will be rejected");
        }

        Self::with_services(config, mailer, records)
    }

    pub fn with_services(
        config: Config,
        mailer: Option<Arc<dyn Mailer>>,
        records: Option<Arc<dyn RecordStore>>,
    ) -> Result<Arc<Self>, anyhow::Error> {
        let templates = EmailTemplates::new(config.program.clone())?;

        let duplicates = records.map(|store| DuplicateChecker::new(store, &config.duplicate_check));

        let mode = config.general.mode;
        tracing::info!("Running in {} mode", mode.as_str());

        Ok(Arc::new(Self {
            mode,
            config,
            mailer,
            duplicates,
            templates,
        }))
    }

    pub fn development_mode(&self) -> bool {
        self.mode == Mode::Development
    }

    /// Fails when a collaborator's credentials were never configured.
    pub fn services(&self) -> Result<(&dyn Mailer, &DuplicateChecker), ApplyError> {
        let mailer = self
            .mailer
            .as_deref()
            .ok_or(ApplyError::NotConfigured(Subsystem::Mail))?;

        let duplicates = self
            .duplicates
            .as_ref()
            .ok_or(ApplyError::NotConfigured(Subsystem::Records))?;

        Ok((mailer, duplicates))
    }
}

use clap::{Parser, Subcommand};

#[derive(Parser)]
pub struct Args {
    #[arg(short, long, default_value = "config.toml")]
    pub config: std::path::PathBuf,
    #[arg(short, long)]
    pub port: Option<u16>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a sample configuration file
    GenerateConfig {
        #[arg(default_value = "config.toml")]
        path: std::path::PathBuf,
    },
    /// Render the confirmation email to stdout
    Preview {
        #[arg(long)]
        name: String,
        #[arg(long)]
        fullname: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "en")]
        language: String,
        /// Print the plain-text alternative instead of the HTML
        #[arg(long)]
        text: bool,
    },
    /// Check whether an email has already applied
    CheckEmail {
        email: String,
    },
}

impl Args {
    pub fn build() -> Self {
        Args::parse()
    }
}
