pub mod probe;
pub mod snapshot;
