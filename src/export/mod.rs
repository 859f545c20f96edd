mod shell;
mod sink;

pub use shell::*;
pub use sink::*;
