//! Declarative filter compiler for Cypher.
//!
//! [`filter`] compiles where/order/skip/limit/fields descriptions into
//! parameterized Cypher fragments; [`statement`] assembles them into the
//! read queries a connector runs.

pub mod app;
pub mod core;
pub mod filter;
pub mod statement;
pub mod utils;
