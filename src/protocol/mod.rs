//! Licensing service protocol.

pub mod models;
