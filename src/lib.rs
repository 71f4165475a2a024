//! Task Tracker API Library
//!
//! Owner-scoped task storage behind a session-checked HTTP API, the route
//! gate for the web front end, and a client data layer for talking to the
//! API.

pub mod api;
pub mod client;
pub mod domain;
pub mod infrastructure;
