use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::templates::Locale;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

pub const MISSING_FIELDS: &str = "Missing required fields: name, email, language, fullname are required";
pub const INVALID_EMAIL: &str = "Invalid email format";
pub const INVALID_BODY: &str = "Request body must be a JSON object with string fields: name, email, language, fullname";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required fields: name, email, language, fullname are required")]
    MissingFields(Vec<&'static str>),
    #[error("Invalid email format")]
    InvalidEmail,
    #[error("Request body must be a JSON object with string fields: name, email, language, fullname")]
    MalformedBody(String),
}

/// Raw request body. Every field is optional so that a missing field is
/// reported by validation rather than by deserialization.
#[derive(Debug, Default, Deserialize)]
pub struct ApplicationRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub language: Option<String>,
    pub fullname: Option<String>,
}

impl ApplicationRequest {
    pub fn from_body(body: &[u8]) -> Result<Self, ValidationError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        serde_json::from_slice(body).map_err(|e| ValidationError::MalformedBody(e.to_string()))
    }

    /// Only `email` is trimmed. The other fields are taken as sent, so
    /// `" vi "` is not Vietnamese.
    pub fn validate(self) -> Result<Submission, ValidationError> {
        let name = present(self.name);
        let email = present(self.email);
        let language = present(self.language);
        let fullname = present(self.fullname);

        let missing: Vec<&'static str> = [
            ("name", name.is_none()),
            ("email", email.is_none()),
            ("language", language.is_none()),
            ("fullname", fullname.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, absent)| absent.then_some(field))
        .collect();

        let (Some(name), Some(email), Some(language), Some(fullname)) = (name, email, language, fullname) else {
            return Err(ValidationError::MissingFields(missing));
        };

        let email = trim_email(&email).to_string();
        if !EMAIL_REGEX.is_match(&email) {
            return Err(ValidationError::InvalidEmail);
        }

        let lookup_email = email.to_lowercase();
        let locale = Locale::from_language(&language);

        Ok(Submission {
            name,
            fullname,
            email,
            lookup_email,
            locale,
        })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// ASCII whitespace only, the same set Postgres `btrim` is given in the
/// duplicate lookup.
fn trim_email(email: &str) -> &str {
    email.trim_matches(|c: char| c.is_ascii_whitespace())
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub name: String,
    pub fullname: String,
    /// Trimmed, original case. Used as the recipient and in the email body.
    pub email: String,
    /// Trimmed and lowercased. Used for the duplicate lookup.
    pub lookup_email: String,
    pub locale: Locale,
}

pub fn normalize_email(email: &str) -> String {
    trim_email(email).to_lowercase()
}
