pub mod settings;
pub mod loader;

pub use settings::*;
