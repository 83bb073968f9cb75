use std::sync::Arc;

use clap::Parser;
use bookrec_engine::config::CliArgs;
use bookrec_engine::recommender::Recommender;
use bookrec_engine::server::BookServer;
use bookrec_engine::transport::NdjsonTransport;

fn main() {
	let args = CliArgs::parse();

	// stdout carries the protocol; logs go to stderr
	tracing_subscriber::fmt()
		.with_writer(std::io::stderr)
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
		)
		.init();

	let config = args.recommender_config();
	let transport = NdjsonTransport::new();

	let mut server = match &args.snapshot {
		Some(path) => match Recommender::load(path, config.clone()) {
			Ok(recommender) => BookServer::with_recommender(transport, config, Arc::new(recommender)),
			Err(e) => {
				tracing::error!(path = %path.display(), "Failed to load snapshot: {}", e);
				std::process::exit(1);
			}
		},
		None => BookServer::new(transport, config),
	};

	tracing::info!("bookrec-engine ready");

	if let Err(e) = server.run() {
		tracing::error!("Server error: {}", e);
		std::process::exit(1);
	}
}
