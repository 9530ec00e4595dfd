//! Encoders for the `druid.*` property bag

pub mod codec;

pub use codec::*;
