//! Core types for Colonnade

mod cluster;
mod health;
mod node;
mod query;
mod status;

pub use cluster::*;
pub use health::*;
pub use node::*;
pub use query::*;
pub use status::*;
