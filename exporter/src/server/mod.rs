//! Network-facing servers

pub mod http;
