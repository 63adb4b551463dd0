//! HTTP transport used by the scenario runner
//!
//! The runner only talks to the `Transport` trait, so tests can swap the
//! reqwest-backed client for a scripted one.

pub mod client;
pub mod transport;

pub use client::HttpClient;
pub use transport::{HttpRequest, HttpResponse, Method, Transport};
