//! Domain types shared by the selector pipeline.

pub mod errors;
pub mod model;
