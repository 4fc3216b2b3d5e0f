pub mod command;
pub mod config;
pub mod controller;
pub mod report;

pub use command::*;
pub use config::*;
pub use controller::*;
pub use report::*;

pub use cubes::{CubeKind, Layout, RecordFilter, SetLayout, SizeEncoding, TimeMode};
