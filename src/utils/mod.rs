//! Utility modules

pub mod decode;
pub mod memory_store;
pub mod time;
pub mod validation;

pub use decode::*;
pub use memory_store::*;
pub use time::*;
pub use validation::*;
