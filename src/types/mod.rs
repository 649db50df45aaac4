pub mod bar;
pub mod table;

pub use bar::*;
pub use table::*;
