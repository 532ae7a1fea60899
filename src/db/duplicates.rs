use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::config::DuplicateCheck;
use crate::submission::normalize_email;
use super::RecordStore;

/// Asks the record store whether an email has applied before, retrying
/// failed queries with a fixed delay.
#[derive(Clone)]
pub struct DuplicateChecker {
    store: Arc<dyn RecordStore>,
    attempts: u32,
    delay: Duration,
}

impl DuplicateChecker {
    pub fn new(store: Arc<dyn RecordStore>, policy: &DuplicateCheck) -> Self {
        Self {
            store,
            attempts: policy.attempts.max(1),
            delay: policy.delay(),
        }
    }

    /// The first successful answer wins, "not found" included. The last
    /// error is returned once every attempt has failed.
    pub async fn is_duplicate(&self, email: &str) -> Result<bool, anyhow::Error> {
        let email = normalize_email(email);
        let mut attempt = 1;

        loop {
            match self.store.email_exists(&email).await {
                Ok(exists) => return Ok(exists),
                Err(e) if attempt < self.attempts => {
                    tracing::warn!(
                        attempt,
                        attempts = self.attempts,
                        "Duplicate check failed, retrying in {:?}: {:#}",
                        self.delay,
                        e
                    );
                    sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(attempts = self.attempts, "Duplicate check failed: {:#}", e);
                    return Err(e.context(format!(
                        "record store query failed after {} attempts",
                        self.attempts
                    )));
                }
            }
        }
    }
}
