use std::path::PathBuf;

use clap::Parser;

use crate::recommender::RecommenderConfig;
use crate::resolver::DEFAULT_NEIGHBOR_COUNT;

#[derive(Parser, Debug)]
#[command(name = "bookrec-engine", about = "Book recommendation engine over JSON-RPC 2.0 / NDJSON stdio")]
pub struct CliArgs {
	/// Snapshot bundle to load at startup (gzipped or plain JSON).
	/// Without it, the client must call catalog/load.
	#[arg(long, env = "BOOKREC_SNAPSHOT")]
	pub snapshot: Option<PathBuf>,

	/// Neighbors requested per recommendation, the selected book included
	#[arg(long, default_value_t = DEFAULT_NEIGHBOR_COUNT, env = "BOOKREC_NEIGHBORS")]
	pub neighbors: usize,

	/// Log level (trace, debug, info, warn, error)
	#[arg(long, default_value = "info", env = "BOOKREC_LOG_LEVEL")]
	pub log_level: String,
}

impl CliArgs {
	pub fn recommender_config(&self) -> RecommenderConfig {
		RecommenderConfig {
			neighbor_count: self.neighbors,
		}
	}
}
