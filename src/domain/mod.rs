//! Domain models for ProdVision

mod entry;
mod status;

pub use entry::*;
pub use status::*;
