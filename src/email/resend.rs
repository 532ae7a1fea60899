use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Mail;
use super::{MailError, Mailer, OutgoingEmail};

#[derive(Serialize)]
struct EmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

#[derive(Deserialize, Debug)]
pub struct ResendResponse {
    pub id: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ResendErrorBody {
    #[serde(rename = "statusCode")]
    pub status_code: Option<u16>,
    pub name: Option<String>,
    pub message: Option<String>,
}

/// Resend REST client. One instance, and one connection pool, per process.
#[derive(Debug, Clone)]
pub struct ResendClient {
    client: Client,
    api_key: String,
    endpoint: String,
    from: String,
}

impl ResendClient {
    pub fn new(api_key: &str, mail: &Mail) -> Result<Self, MailError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(mail.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            endpoint: mail.endpoint.trim_end_matches('/').to_string(),
            from: mail.from.clone(),
        })
    }

    /// `None` when no API key is configured.
    pub fn from_config(mail: &Mail) -> Result<Option<Self>, MailError> {
        match mail.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Self::new(key, mail).map(Some),
            _ => Ok(None),
        }
    }

    pub fn sender(&self) -> &str {
        &self.from
    }
}

#[async_trait]
impl Mailer for ResendClient {
    async fn send(&self, email: &OutgoingEmail) -> Result<Option<String>, MailError> {
        let request = EmailRequest {
            from: &self.from,
            to: [email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
            text: email.text.as_deref(),
        };

        let response = self
            .client
            .post(format!("{}/emails", self.endpoint))
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), body = %body, "Resend rejected message");

            let (name, message) = match serde_json::from_str::<ResendErrorBody>(&body) {
                Ok(err) => (err.name, err.message),
                Err(_) => (None, None),
            };

            let message = message
                .filter(|m| !m.is_empty())
                .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
                .unwrap_or_else(|| format!("Resend API error {}", status));

            return Err(MailError::Rejected {
                status: status.as_u16(),
                name,
                message,
            });
        }

        let result = response.json::<ResendResponse>().await?;
        tracing::info!(to = %email.to, id = ?result.id, "Email accepted by Resend");

        Ok(result.id)
    }
}
