//! Strategy implementations

pub mod ema_crossover;

pub use ema_crossover::*;
