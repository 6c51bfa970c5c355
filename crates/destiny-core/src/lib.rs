//! Destiny Core — shared domain abstractions.
//!
//! This crate defines the seams every bounded context depends on: time,
//! randomness and the cross-context error type. It contains no
//! infrastructure code.

pub mod clock;
pub mod error;
pub mod rng;
