pub mod app;
pub mod cli;
pub mod domain;
pub mod infra;

pub use app::resolve::resolve;
pub use app::selector::parse;
pub use domain::errors::SelectorError;
pub use domain::model::{IncludeExampleTag, LineRef, ParsedSelector, Selection};

/// Install the stderr subscriber; `verbosity` is the number of `-v` flags given.
pub fn init(verbosity: u8) {
    infra::logging::init(verbosity);
}
