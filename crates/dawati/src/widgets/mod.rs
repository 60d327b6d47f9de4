pub mod input_grab;
pub mod surfaces;
pub mod timeout;
pub mod toolbar;
pub mod trigger;
pub mod window;
