//! Tide - Safety-Gated DBT Decision Engine
//!
//! Routes a user in distress through a versioned decision tree to one
//! DBT coping skill. A crisis gate runs before every step and escalates
//! to crisis resources instead of coaching when it fires. Every transition
//! is mirrored to an audit recorder before it commits, and any committed
//! session can be replayed against its tree version.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
