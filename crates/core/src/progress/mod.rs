mod tracker;
mod types;

pub use tracker::*;
pub use types::*;
