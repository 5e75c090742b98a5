//! Application layer: the selector pipeline and the services built on it.

pub mod extract;
pub mod locate;
pub mod render;
pub mod resolve;
pub mod scan;
pub mod selector;
pub mod tag;
