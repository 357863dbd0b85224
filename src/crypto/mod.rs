//! Cryptographic primitives.

pub mod digest;
