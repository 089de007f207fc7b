//! Domain layer containing the decision engine's business logic.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine)
//! - `signal` - Signal extraction from raw input
//! - `safety` - Safety plan precondition and the crisis gate
//! - `user` - Versioned personalization context
//! - `tree` - Versioned decision trees and traversal
//! - `personalization` - Coaching templates and presentation resolver
//! - `session` - Session state machine, audit records and replay

pub mod foundation;
pub mod personalization;
pub mod safety;
pub mod session;
pub mod signal;
pub mod tree;
pub mod user;
