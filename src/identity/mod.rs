//! Machine identity.

pub mod machine;
