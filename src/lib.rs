//! Session-scoped todo lists served over HTTP.
//!
//! [`store`] holds the list and todo operations; everything else wires them
//! to sessions, storage backends, configuration and the web.

pub mod cli;
pub mod config;
pub mod models;
pub mod storage;
pub mod store;
pub mod web;
