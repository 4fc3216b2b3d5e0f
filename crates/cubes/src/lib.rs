pub mod filter;
pub mod geo;
pub mod net;
pub mod points;
pub mod set;
pub mod slices;
pub mod stage;
pub mod view;

pub use filter::*;
pub use geo::GeoCube;
pub use net::{DEFAULT_LINKS_PER_NODE, Edge, LinkKind, NetCube, SizeEncoding};
pub use points::*;
pub use set::{SetCube, SetLayout};
pub use slices::*;
pub use stage::*;
pub use view::*;
