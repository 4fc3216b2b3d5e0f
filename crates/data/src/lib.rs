pub mod layout;
pub mod network;
pub mod palette;
pub mod record;
pub mod set;
pub mod store;
pub mod time;

pub use layout::*;
pub use palette::*;
pub use record::*;
pub use set::*;
pub use store::*;
pub use time::*;
