//! Fundamental coordinate types.

mod point;

pub use point::{Cell, WorldPoint};
