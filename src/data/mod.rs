//! Dataset loading and caching
//!
//! - `bundle`: compact JSON bundle format
//! - `store`: snapshot cache with TTL refresh

mod bundle;
mod store;

pub use bundle::*;
pub use store::*;
