pub mod resend;

pub use resend::ResendClient;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailError {
    /// The provider answered and refused the message. `message` is the
    /// provider's own text.
    #[error("{message}")]
    Rejected {
        status: u16,
        name: Option<String>,
        message: String,
    },
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
}

impl OutgoingEmail {
    /// Builds the message along with a plain-text alternative of the HTML.
    pub fn new(to: &str, subject: &str, html: String) -> Self {
        let text = match html2text::from_read(html.as_bytes(), 80) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!("Could not derive plain-text body: {}", e);
                None
            }
        };

        Self {
            to: to.to_string(),
            subject: subject.to_string(),
            html,
            text,
        }
    }
}

/// Hands a rendered message to a transactional email provider. Sends are not
/// retried: a second attempt could deliver twice.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Returns the provider-assigned message id, when the provider reports one.
    async fn send(&self, email: &OutgoingEmail) -> Result<Option<String>, MailError>;
}
