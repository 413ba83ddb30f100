#![allow(clippy::excessive_precision)]

pub use chrono;
pub use serde;

pub mod constants;
pub mod hurdat;
pub mod maths;
pub mod structs;
