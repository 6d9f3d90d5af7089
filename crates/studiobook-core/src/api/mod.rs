//! HTTP client module for the booking sheet's script endpoint.
//!
//! The endpoint is a spreadsheet-backed web app answering GET requests
//! selected by an `action` query parameter. `ApiClient` wraps the three
//! read actions this tool uses and implements the `EventSource` port the
//! sync controller fetches through.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
