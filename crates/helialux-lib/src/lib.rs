//! HeliaLux — state synchronization for Juwel HeliaLux SmartControl aquarium lights.

pub mod color;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod light;
pub mod protocol;
pub mod resolver;
pub mod sim;
pub mod state;
pub mod status;

pub use error::HelialuxError;
