use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use http::{
    HeaderValue,
    header::{
        ACCESS_CONTROL_ALLOW_HEADERS,
        ACCESS_CONTROL_ALLOW_METHODS,
        ACCESS_CONTROL_ALLOW_ORIGIN,
    },
};

use crate::config::Config;

const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";

#[derive(Debug, Clone)]
pub struct CorsHeaders {
    origin: HeaderValue,
}

impl CorsHeaders {
    pub fn new(config: &Config) -> Self {
        let origin = match HeaderValue::from_str(config.server.allow_origin.trim()) {
            Ok(origin) if !origin.is_empty() => origin,
            _ => {
                tracing::warn!(
                    "Invalid allow_origin {:?}, falling back to *",
                    config.server.allow_origin
                );
                HeaderValue::from_static("*")
            }
        };

        Self { origin }
    }
}

/// Sets the cross-origin headers on every response, errors included.
pub async fn cors_headers(
    State(cors): State<CorsHeaders>,
    req: Request,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;

    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, cors.origin.clone());
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));

    response
}
