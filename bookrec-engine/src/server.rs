// ---------------------------------------------------------------------------
// BookServer - JSON-RPC dispatcher
// ---------------------------------------------------------------------------
//
// Routes incoming JSON-RPC 2.0 requests (NDJSON over stdin) to the
// `Recommender`. One request is handled at a time; the catalog is either
// loaded at startup or by `catalog/load`, and is read-only afterwards.
// ---------------------------------------------------------------------------

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crate::error::BookrecError;
use crate::protocol::*;
use crate::recommender::{Recommender, RecommenderConfig};
use crate::transport::NdjsonTransport;

/// JSON-RPC server that dispatches requests to a [`Recommender`].
pub struct BookServer<W: Write = io::Stdout> {
	transport: NdjsonTransport<W>,
	recommender: Option<Arc<Recommender>>,
	config: RecommenderConfig,
}

impl<W: Write> BookServer<W> {
	pub fn new(transport: NdjsonTransport<W>, config: RecommenderConfig) -> Self {
		Self {
			transport,
			recommender: None,
			config,
		}
	}

	/// Serve from an already-loaded recommender.
	pub fn with_recommender(
		transport: NdjsonTransport<W>,
		config: RecommenderConfig,
		recommender: Arc<Recommender>,
	) -> Self {
		Self {
			transport,
			recommender: Some(recommender),
			config,
		}
	}

	pub fn into_transport(self) -> NdjsonTransport<W> {
		self.transport
	}

	/// Main loop: read JSON-RPC messages from stdin, dispatch to handlers.
	pub fn run(&mut self) -> Result<(), BookrecError> {
		let stdin = io::stdin();
		self.serve(stdin.lock())
	}

	pub fn serve<R: BufRead>(&mut self, reader: R) -> Result<(), BookrecError> {
		for line_result in reader.lines() {
			let line = line_result?;
			if line.trim().is_empty() {
				continue;
			}

			let request: JsonRpcRequest = match serde_json::from_str(&line) {
				Ok(r) => r,
				Err(e) => {
					tracing::error!("Failed to parse request: {}", e);
					continue;
				}
			};

			self.dispatch(request);
		}

		Ok(())
	}

	// ── Dispatch ──────────────────────────────────────────────────────────

	fn dispatch(&mut self, req: JsonRpcRequest) {
		let id = req.id;
		tracing::debug!(id, method = %req.method, "Dispatching request");

		let result = match req.method.as_str() {
			// -- Catalog -------------------------------------------------
			"catalog/load" => self.handle_load(req.params),
			"catalog/titles" => self.require_recommender(|r| {
				Ok(serde_json::json!({ "titles": r.titles() }))
			}),
			"catalog/stats" => self.require_recommender(|r| {
				to_value(r.stats())
			}),

			// -- Books ---------------------------------------------------
			"books/recommend" => self.require_recommender(|r| handle_recommend(r, req.params)),
			"books/searchByAuthor" => {
				self.require_recommender(|r| handle_search_by_author(r, req.params))
			}
			"books/searchByRating" => {
				self.require_recommender(|r| handle_search_by_rating(r, req.params))
			}

			// -- Unknown -------------------------------------------------
			_ => {
				self.transport.write_error(
					id,
					METHOD_NOT_FOUND,
					format!("Unknown method: {}", req.method),
					None,
				);
				return;
			}
		};

		match result {
			Ok(value) => self.transport.write_response(id, value),
			Err(e) => {
				tracing::debug!(id, code = e.code(), "Request failed: {}", e);
				let code = match &e {
					BookrecError::Serialization(_) => INVALID_PARAMS,
					_ => BOOKREC_ERROR,
				};
				self.transport
					.write_error(id, code, e.to_string(), Some(e.to_json_rpc_error()))
			}
		}
	}

	// ── Recommender accessor ─────────────────────────────────────────────

	fn require_recommender<F>(&self, f: F) -> Result<serde_json::Value, BookrecError>
	where
		F: FnOnce(&Recommender) -> Result<serde_json::Value, BookrecError>,
	{
		match &self.recommender {
			Some(r) => f(r),
			None => Err(BookrecError::NotLoaded),
		}
	}

	// ── Load ──────────────────────────────────────────────────────────────

	fn handle_load(&mut self, params: serde_json::Value) -> Result<serde_json::Value, BookrecError> {
		let p: LoadParams = parse_params(params)?;
		let config = RecommenderConfig {
			neighbor_count: p.neighbor_count.unwrap_or(self.config.neighbor_count),
		};
		let recommender = Recommender::load(&p.snapshot_path, config)?;
		let stats = recommender.stats();
		self.recommender = Some(Arc::new(recommender));
		Ok(serde_json::json!({ "books": stats.books, "records": stats.records }))
	}
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_params<T: serde::de::DeserializeOwned>(
	params: serde_json::Value,
) -> Result<T, BookrecError> {
	serde_json::from_value(params)
		.map_err(|e| BookrecError::Serialization(format!("Invalid params: {}", e)))
}

fn to_value(value: impl serde::Serialize) -> Result<serde_json::Value, BookrecError> {
	serde_json::to_value(value).map_err(|e| BookrecError::Serialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// Free-standing handler functions
// ---------------------------------------------------------------------------

fn handle_recommend(
	recommender: &Recommender,
	params: serde_json::Value,
) -> Result<serde_json::Value, BookrecError> {
	let p: RecommendParams = parse_params(params)?;
	let resolution = recommender.resolve(&p.title)?;
	Ok(serde_json::json!({
		"books": resolution.records,
		"distances": resolution.distances,
		"skipped": resolution.missing,
	}))
}

fn handle_search_by_author(
	recommender: &Recommender,
	params: serde_json::Value,
) -> Result<serde_json::Value, BookrecError> {
	let p: AuthorSearchParams = parse_params(params)?;
	let books = recommender.search_by_author(&p.author);
	Ok(serde_json::json!({ "books": books }))
}

fn handle_search_by_rating(
	recommender: &Recommender,
	params: serde_json::Value,
) -> Result<serde_json::Value, BookrecError> {
	let p: RatingSearchParams = parse_params(params)?;
	let books = recommender.search_by_rating(p.min, p.max)?;
	Ok(serde_json::json!({ "books": books }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;
	use crate::snapshot::Snapshot;
	use crate::types::{MetadataRecord, Metric};
	use serde_json::{json, Value};

	fn snapshot() -> Snapshot {
		let record = |title: &str, author: &str, rating: f64| MetadataRecord {
			title: title.to_string(),
			author: author.to_string(),
			rating,
			image_url: format!("http://img/{}.jpg", title),
		};
		Snapshot {
			metric: Metric::Euclidean,
			rows: vec![
				("A".to_string(), vec![0.0]),
				("B".to_string(), vec![1.0]),
				("C".to_string(), vec![3.0]),
			],
			metadata: vec![
				record("A", "J.R.R. Tolkien", 9.0),
				record("B", "Jane Austen", 6.0),
				record("C", "Jane Austen", 8.0),
			],
			titles: None,
		}
	}

	fn run(server: BookServer<Vec<u8>>, requests: &[Value]) -> Vec<Value> {
		let mut server = server;
		let input: String = requests.iter().map(|r| format!("{}\n", r)).collect();
		server.serve(input.as_bytes()).unwrap();
		String::from_utf8(server.into_transport().into_inner())
			.unwrap()
			.lines()
			.map(|l| serde_json::from_str(l).unwrap())
			.collect()
	}

	fn loaded() -> BookServer<Vec<u8>> {
		let config = RecommenderConfig { neighbor_count: 3 };
		let recommender = Recommender::from_snapshot(snapshot(), config.clone()).unwrap();
		BookServer::with_recommender(
			NdjsonTransport::with_writer(Vec::new()),
			config,
			Arc::new(recommender),
		)
	}

	#[test]
	fn recommend_returns_books_and_distances() {
		let out = run(
			loaded(),
			&[json!({ "id": 1, "method": "books/recommend", "params": { "title": "A" } })],
		);
		let books = out[0]["result"]["books"].as_array().unwrap();
		assert_eq!(books.len(), 2);
		assert_eq!(books[0]["title"], "B");
		assert_eq!(books[0]["imageUrl"], "http://img/B.jpg");
		assert_eq!(out[0]["result"]["distances"], json!([1.0, 3.0]));
		assert_eq!(out[0]["result"]["skipped"], json!([]));
	}

	#[test]
	fn unknown_title_maps_to_book_not_found() {
		let out = run(
			loaded(),
			&[json!({ "id": 2, "method": "books/recommend", "params": { "title": "Z" } })],
		);
		assert_eq!(out[0]["error"]["code"], BOOKREC_ERROR);
		assert_eq!(out[0]["error"]["data"]["bookrecCode"], "BOOK_NOT_FOUND");
	}

	#[test]
	fn search_methods() {
		let out = run(
			loaded(),
			&[
				json!({ "id": 1, "method": "books/searchByAuthor", "params": { "author": "austen" } }),
				json!({ "id": 2, "method": "books/searchByRating", "params": { "min": 8.0, "max": 10.0 } }),
				json!({ "id": 3, "method": "books/searchByRating", "params": { "min": 9.0, "max": 1.0 } }),
			],
		);
		assert_eq!(out[0]["result"]["books"].as_array().unwrap().len(), 2);
		let by_rating: Vec<&str> = out[1]["result"]["books"]
			.as_array()
			.unwrap()
			.iter()
			.map(|b| b["title"].as_str().unwrap())
			.collect();
		assert_eq!(by_rating, vec!["A", "C"]);
		assert_eq!(out[2]["error"]["data"]["bookrecCode"], "INVALID_ARGUMENT");
	}

	#[test]
	fn catalog_info_methods() {
		let out = run(
			loaded(),
			&[
				json!({ "id": 1, "method": "catalog/titles" }),
				json!({ "id": 2, "method": "catalog/stats" }),
			],
		);
		assert_eq!(out[0]["result"]["titles"], json!(["A", "B", "C"]));
		assert_eq!(out[1]["result"]["books"], 3);
		assert_eq!(out[1]["result"]["metric"], "euclidean");
		assert_eq!(out[1]["result"]["neighborCount"], 3);
	}

	#[test]
	fn calls_before_load_fail() {
		let server = BookServer::new(
			NdjsonTransport::with_writer(Vec::new()),
			RecommenderConfig::default(),
		);
		let out = run(
			server,
			&[json!({ "id": 1, "method": "books/searchByAuthor", "params": { "author": "" } })],
		);
		assert_eq!(out[0]["error"]["data"]["bookrecCode"], "CATALOG_NOT_LOADED");
	}

	#[test]
	fn load_then_query() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("books.gz");
		crate::snapshot::save_to_path(&path, &snapshot()).unwrap();

		let server = BookServer::new(
			NdjsonTransport::with_writer(Vec::new()),
			RecommenderConfig::default(),
		);
		let out = run(
			server,
			&[
				json!({ "id": 1, "method": "catalog/load", "params": { "snapshotPath": path, "neighborCount": 2 } }),
				json!({ "id": 2, "method": "books/recommend", "params": { "title": "C" } }),
			],
		);
		assert_eq!(out[0]["result"]["books"], 3);
		let books = out[1]["result"]["books"].as_array().unwrap();
		assert_eq!(books.len(), 1);
		assert_eq!(books[0]["title"], "B");
	}

	#[test]
	fn load_rejects_neighbor_count_above_catalog_size() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("books.gz");
		crate::snapshot::save_to_path(&path, &snapshot()).unwrap();

		let server = BookServer::new(
			NdjsonTransport::with_writer(Vec::new()),
			RecommenderConfig::default(),
		);
		let out = run(
			server,
			&[
				json!({ "id": 1, "method": "catalog/load", "params": { "snapshotPath": path } }),
				json!({ "id": 2, "method": "catalog/titles" }),
			],
		);
		assert_eq!(out[0]["error"]["data"]["bookrecCode"], "INVALID_ARGUMENT");
		assert_eq!(out[1]["error"]["data"]["bookrecCode"], "CATALOG_NOT_LOADED");
	}

	#[test]
	fn unknown_method_and_bad_params() {
		let out = run(
			loaded(),
			&[
				json!({ "id": 1, "method": "books/delete" }),
				json!({ "id": 2, "method": "books/recommend", "params": {} }),
			],
		);
		assert_eq!(out[0]["error"]["code"], METHOD_NOT_FOUND);
		assert_eq!(out[1]["error"]["code"], INVALID_PARAMS);
	}

	#[test]
	fn malformed_lines_are_skipped() {
		let mut server = loaded();
		let input = "not json\n\n{\"id\":5,\"method\":\"catalog/titles\"}\n";
		server.serve(input.as_bytes()).unwrap();
		let text = String::from_utf8(server.into_transport().into_inner()).unwrap();
		assert_eq!(text.lines().count(), 1);
		assert!(text.contains("\"id\":5"));
	}
}
