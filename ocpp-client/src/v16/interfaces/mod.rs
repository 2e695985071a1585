mod interface;
mod observer;

pub use interface::*;
pub use observer::*;
