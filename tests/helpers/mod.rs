//! Test helpers module
//!
//! This module provides utilities and helpers for testing Eventus.
//! It includes mock servers for the REST backend and the identity provider,
//! token builders, fixture data and a test context wiring them together.

#![allow(dead_code)]

pub mod backend_mock;
pub mod fixtures;
pub mod identity_mock;
pub mod test_context;
pub mod tokens;

pub use backend_mock::*;
pub use fixtures::*;
pub use identity_mock::*;
pub use test_context::*;
pub use tokens::*;
