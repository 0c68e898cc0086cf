//! fxdash Common Types
//!
//! Shared types used across the fxdash workspace: currency codes and
//! pairs, monetary amounts, record identifiers and timestamps.

pub mod error;
pub mod identifiers;
pub mod monetary;
pub mod time;

pub use error::*;
pub use identifiers::*;
pub use monetary::*;
pub use time::*;
