//! Data model and constraint engine of a results map.
//!
//! Nothing in here touches the DOM or does I/O: callers hand in documents or
//! edits and get back typed data, positions and edge geometry.

pub mod defaults;
mod edit;
mod error;
pub mod export;
pub mod geometry;
pub mod layout;
pub mod relations;
pub mod schema;
mod types;

pub use error::{MapError, MigrationError, Result};
pub use export::{ExportFormat, export_json, suggested_file_name};
pub use geometry::{Band, Ellipse, Point, Region, Sector, clamp_to_region, region_for, sector_of};
pub use layout::{BubbleLayout, Layout, LayoutParameters, Placement, layout};
pub use relations::{EdgeGeometry, Validation, edge_endpoints, edge_geometry, validate};
pub use schema::{SchemaVersion, deserialize, normalize, serialize};
pub use types::{
	Bubble, Extra, Group, GroupLevel, LabelPosition, LayerBand, LayerColors, LayerSizes, LayerType, LegendBubble,
	LegendLine, Legends, MapConfig, RelationType, Relationship, ResultsMapData,
};
