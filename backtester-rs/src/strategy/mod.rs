//! Strategy engine module
//!
//! Provides crossover signal evaluation, the trade-mode position policy,
//! parameter schemas and the strategy registry.

pub mod base;
pub mod implementations;
pub mod params;
pub mod policy;
pub mod registry;
pub mod signal;

pub use base::*;
pub use implementations::*;
pub use params::*;
pub use policy::*;
pub use registry::*;
pub use signal::*;
