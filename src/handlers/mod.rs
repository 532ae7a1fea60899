pub mod apply;

pub use apply::{method_not_allowed, preflight, send_email};
