//! Ghost CRO Core - domain types and checkout-conversion calculations.
//!
//! This crate provides the pieces shared by every Ghost CRO component:
//! - `server` - HTTP API proxying Shopify, GA4 and Claude
//! - `cli` - Migrations and offline calculations
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Everything here can be called from a request
//! handler, a CLI command or a test without setup.
//!
//! # Modules
//!
//! - [`types`] - Test results, persona mixes, metric bags, shop domains
//! - [`calculations`] - Revenue opportunity, revenue leak, percentile, Ghost Score
//! - [`benchmarks`] - Category conversion benchmarks
//! - [`checkout`] - Abandoned checkout and shipping shock analysis
//! - [`sandbox`] - Theme code injection

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod benchmarks;
pub mod calculations;
pub mod checkout;
pub mod sandbox;
pub mod types;

pub use types::*;
