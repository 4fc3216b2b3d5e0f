pub mod material;
pub mod overlay;
pub mod shape;
pub mod transform;
pub mod visibility;

pub use material::*;
pub use overlay::*;
pub use shape::*;
pub use transform::*;
pub use visibility::*;
