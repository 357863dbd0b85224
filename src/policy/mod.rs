//! Validation policy.

pub mod decision;
