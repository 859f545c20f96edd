mod controller;
mod render;
mod state;

pub use controller::*;
