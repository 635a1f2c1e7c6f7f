pub mod escrow;
pub mod execution;

pub use escrow::*;
pub use execution::*;
