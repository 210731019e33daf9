//! Utility functions and helpers.

pub mod http;
pub mod url;

pub use self::url::{handle_from_url, normalise_host, parse_username};
