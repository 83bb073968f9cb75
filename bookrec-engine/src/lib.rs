pub mod catalog;
pub mod config;
pub mod distance;
pub mod error;
pub mod filter;
pub mod neighbors;
pub mod protocol;
pub mod recommender;
pub mod resolver;
pub mod server;
pub mod snapshot;
pub mod transport;
pub mod types;
