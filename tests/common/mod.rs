#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, Response},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use gtp_apply::AppState;
use gtp_apply::config::{ConfigBuilder, DuplicateCheck, Mode};
use gtp_apply::db::RecordStore;
use gtp_apply::email::{MailError, Mailer, OutgoingEmail};
use gtp_apply::server::Server;

/// Record store backed by a fixed list of addresses. The first `failures`
/// queries fail.
pub struct FakeRecordStore {
    emails: Vec<String>,
    failures: u32,
    pub calls: AtomicU32,
}

impl FakeRecordStore {
    pub fn with_emails(emails: &[&str]) -> Self {
        Self {
            emails: emails.iter().map(|e| e.to_string()).collect(),
            failures: 0,
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing(failures: u32) -> Self {
        Self {
            failures,
            ..Self::with_emails(&[])
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for FakeRecordStore {
    async fn email_exists(&self, email: &str) -> Result<bool, anyhow::Error> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            return Err(anyhow::anyhow!("record store unavailable"));
        }
        Ok(self
            .emails
            .iter()
            .any(|stored| stored.trim().to_lowercase() == email))
    }
}

/// Captures sent messages. Replies with `id` or rejects with `reject`.
#[derive(Default)]
pub struct FakeMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    id: Option<String>,
    reject: Option<String>,
}

impl FakeMailer {
    pub fn accepting(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            ..Self::default()
        }
    }

    pub fn rejecting(message: &str) -> Self {
        Self {
            reject: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<Option<String>, MailError> {
        if let Some(message) = &self.reject {
            return Err(MailError::Rejected {
                status: 403,
                name: Some("validation_error".to_string()),
                message: message.clone(),
            });
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(self.id.clone())
    }
}

pub struct TestApp {
    pub router: Router,
    pub mailer: Arc<FakeMailer>,
    pub records: Arc<FakeRecordStore>,
}

impl TestApp {
    pub fn new(mailer: FakeMailer, records: FakeRecordStore) -> Self {
        Self::build(Mode::Production, Some(mailer), Some(records))
    }

    pub fn build(mode: Mode, mailer: Option<FakeMailer>, records: Option<FakeRecordStore>) -> Self {
        let config = ConfigBuilder::new()
            .with_mode(mode)
            .with_duplicate_check(DuplicateCheck { attempts: 3, delay_ms: 0 })
            .build()
            .unwrap();

        let mailer = mailer.map(Arc::new);
        let records = records.map(Arc::new);

        let state = AppState::with_services(
            config,
            mailer.clone().map(|m| m as Arc<dyn Mailer>),
            records.clone().map(|r| r as Arc<dyn RecordStore>),
        )
        .unwrap();

        Self {
            router: Server::new(state).router(),
            mailer: mailer.unwrap_or_default(),
            records: records.unwrap_or_else(|| Arc::new(FakeRecordStore::with_emails(&[]))),
        }
    }

    pub async fn request(&self, method: Method, body: &str) -> (Response<Body>, Value) {
        let request = Request::builder()
            .method(method)
            .uri("/api/send-email")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (Response::from_parts(parts, Body::empty()), json)
    }

    pub async fn post(&self, body: &str) -> (Response<Body>, Value) {
        self.request(Method::POST, body).await
    }
}

pub fn submission(name: &str, fullname: &str, email: &str, language: &str) -> String {
    serde_json::json!({
        "name": name,
        "fullname": fullname,
        "email": email,
        "language": language,
    })
    .to_string()
}
