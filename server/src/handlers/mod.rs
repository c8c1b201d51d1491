//! Request handlers for quote and sync operations.

mod quotes;
mod sync;
mod transfer;

pub use quotes::*;
pub use sync::*;
pub use transfer::*;
