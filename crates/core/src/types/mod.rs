//! Core types for Ghost CRO.
//!
//! This module provides the report view-models and validated wrappers shared
//! by the server and CLI.

pub mod metrics;
pub mod persona;
pub mod shop;
pub mod test_result;

pub use metrics::{Ga4Metrics, StoreMetrics};
pub use persona::{Device, Persona, PersonaMix, UnknownPersonaMix};
pub use shop::{ShopDomain, ShopDomainError};
pub use test_result::{
    FrictionPoint, FrictionPoints, FunnelCounts, FunnelRates, IssueCounts, PersonaResult,
    Severity, TestResult, TestStatus, Verdict,
};
