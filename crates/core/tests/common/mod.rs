//! Common test utilities and helpers for E2E tests.
//!
//! This module provides shared functionality across all E2E tests including:
//! - Test fixtures (sample configs, projects, engines)
//! - Custom assertions over the event feed
//! - Scripted gateways for the failure scenarios

#[allow(dead_code)]
pub mod assertions;
#[allow(dead_code)]
pub mod fixtures;
#[allow(dead_code)]
pub mod mock_gateways;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use mock_gateways::*;
