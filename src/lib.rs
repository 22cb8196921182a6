//! linkpulse - short-link resolution and click analytics
//!
//! Resolves short codes to destination URLs behind expiry and password gates,
//! records clicks with an atomic counter plus an append-only event log,
//! attaches per-user tags to links and validates API keys.
//!
//! # Features
//! - **cli**: operator command line (default)
//! - **geoip**: MaxMind GeoLite2 lookups for click metadata (default)
//!
//! # Architecture
//! - `storage`: `LinkGateway` trait and the SeaORM backend
//! - `services`: resolver, click recorder, tag associator, API key validator, link management
//! - `cache`: moka resolution cache
//! - `analytics`: click metadata (User-Agent parsing, GeoIP)
//! - `config`: TOML + env configuration
//! - `system`: logging

pub mod analytics;
pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod errors;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
