//! Domain types

pub mod page;
pub mod roster;
