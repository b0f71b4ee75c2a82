use thiserror::Error;

use super::types::LayerType;

/// Everything that can go wrong while editing, laying out or loading a map.
///
/// Band, sector and schema errors reject the operation that raised them.
/// Reference and overflow errors are advisory: they are collected next to a
/// best-effort result instead of aborting it.
#[derive(Error, Debug)]
pub enum MapError {
	/// A layer band is empty or does not join its neighbours.
	#[error("invalid band for layer {layer}: [{inner}, {outer}]")]
	InvalidBand {
		/// Offending layer.
		layer: LayerType,
		/// Inner radius as configured.
		inner: f64,
		/// Outer radius as configured.
		outer: f64,
	},
	/// A group sector is malformed or overlaps another group.
	#[error("invalid sector for group {group:?}: [{start}, {end})")]
	InvalidSector {
		/// Group id, empty for a sector that is not stored yet.
		group: String,
		/// Start angle in radians.
		start: f64,
		/// End angle in radians.
		end: f64,
	},
	/// The document cannot be matched to any known schema revision.
	#[error("unsupported schema: {0}")]
	UnsupportedSchema(String),
	/// The text is not JSON, or a field has the wrong type.
	#[error("malformed document: {0}")]
	Malformed(#[from] serde_json::Error),
	/// A relationship end points at a bubble that does not exist.
	#[error("relationship {relationship:?} references missing bubble {bubble:?}")]
	DanglingReference {
		/// Relationship id.
		relationship: String,
		/// The bubble id that failed to resolve.
		bubble: String,
	},
	/// A relationship connects a bubble to itself.
	#[error("relationship {relationship:?} connects a bubble to itself")]
	SelfReference {
		/// Relationship id.
		relationship: String,
	},
	/// Layout ran out of slots in a region.
	#[error("{count} bubble(s) overflow layer {layer} in group {group:?}")]
	Overflow {
		/// Layer of the crowded region.
		layer: LayerType,
		/// Group id of the crowded region, empty for ungrouped bubbles.
		group: String,
		/// Number of bubbles that were stacked.
		count: usize,
	},
	/// No bubble with this id.
	#[error("unknown bubble {0:?}")]
	UnknownBubble(String),
	/// No group with this id.
	#[error("unknown group {0:?}")]
	UnknownGroup(String),
	/// No relationship with this id.
	#[error("unknown relationship {0:?}")]
	UnknownRelationship(String),
}

/// A failed load. The original document text is kept untouched so the
/// caller can report it or retry after a manual fix.
#[derive(Error, Debug)]
#[error("failed to load results map: {error}")]
pub struct MigrationError {
	/// Why the document was rejected.
	#[source]
	pub error: MapError,
	/// The text exactly as it was handed to `deserialize`.
	pub original: String,
}

/// Result alias for map operations.
pub type Result<T, E = MapError> = std::result::Result<T, E>;
