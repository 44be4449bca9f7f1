//! Core types and utilities

pub mod geo;
pub mod vec2;

pub use geo::{CoordKind, EARTH_RADIUS};
pub use vec2::{Mat2, Vec2};
