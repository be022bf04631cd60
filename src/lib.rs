pub mod config;
pub mod data;
pub mod engines;
pub mod error;
pub mod functions;
pub mod gondola;
pub mod types;
