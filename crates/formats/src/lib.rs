pub mod dataset;
pub mod layout;

pub use dataset::*;
pub use layout::*;
