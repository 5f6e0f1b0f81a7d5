//! Doações admin library.
//!
//! Server-rendered pages and the JSON API for registering donors,
//! recipients, donated items and donations. Built as a library so the
//! binary, the CLI and the tests share one router and one set of
//! repositories.
//!
//! # Security
//!
//! Every route except login, token issuance and the health checks requires
//! an authenticated ADMIN or GERENTE account; account management is ADMIN
//! only.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
