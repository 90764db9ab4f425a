//! Database module - SQLite with sqlx

mod entries;
mod errors;
mod pool;
mod settings;

pub use entries::*;
pub use errors::*;
pub use pool::*;
pub use settings::*;
