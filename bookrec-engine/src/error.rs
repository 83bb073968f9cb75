use thiserror::Error;

use crate::snapshot::SnapshotError;

#[derive(Debug, Error)]
pub enum BookrecError {
	#[error("Catalog not loaded: call catalog/load first")]
	NotLoaded,
	#[error("Title not in catalog: {0}")]
	NotFound(String),
	#[error("Book not found: {0}")]
	BookNotFound(String),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Serialization error: {0}")]
	Serialization(String),
	#[error("Snapshot corruption: {0}")]
	Corruption(String),
}

impl BookrecError {
	pub fn code(&self) -> &str {
		match self {
			Self::NotLoaded => "CATALOG_NOT_LOADED",
			Self::NotFound(_) | Self::BookNotFound(_) => "BOOK_NOT_FOUND",
			Self::InvalidArgument(_) => "INVALID_ARGUMENT",
			Self::Io(_) => "BOOKREC_IO",
			Self::Serialization(_) => "BOOKREC_SERIALIZATION",
			Self::Corruption(_) => "BOOKREC_CORRUPT",
		}
	}

	pub fn to_json_rpc_error(&self) -> serde_json::Value {
		serde_json::json!({
			"bookrecCode": self.code(),
			"message": self.to_string(),
		})
	}
}

impl From<SnapshotError> for BookrecError {
	fn from(e: SnapshotError) -> Self {
		match e {
			SnapshotError::Io(io) => Self::Io(io),
			SnapshotError::Corruption(msg) => Self::Corruption(msg),
			SnapshotError::Serialization(msg) => Self::Serialization(msg),
		}
	}
}
