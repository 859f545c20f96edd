mod document;
mod editor;
mod error;
mod json;
mod state;

pub use document::*;
pub use editor::*;
pub use error::*;
pub use state::*;
