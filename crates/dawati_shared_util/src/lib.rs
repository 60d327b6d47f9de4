pub mod monitor;
pub mod wrappers;

pub use monitor::*;
pub use wrappers::*;
