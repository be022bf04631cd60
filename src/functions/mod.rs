pub mod indicators;
pub mod traits;
