pub mod api;
pub mod config;
pub mod console;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod model;
pub mod store;

pub use error::{CoinwatchError, DeliveryError, Result};
