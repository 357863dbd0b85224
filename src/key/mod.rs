//! License key handling.

pub mod format;
