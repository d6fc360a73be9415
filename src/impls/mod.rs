//! `GraphType` implementations for standard and common third-party types.

mod array;
mod map;
mod primitive;
mod shared;

pub use map::Dictionary;
