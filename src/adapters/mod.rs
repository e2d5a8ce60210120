//! Infrastructure adapters implementing the outbound ports.

pub mod persistence;
