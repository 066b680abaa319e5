pub mod dataset;
pub mod loader;
pub mod synthetic;

pub use dataset::Dataset;
pub use loader::*;
