//! What the export collaborators need to know about output formats.

use super::error::Result;
use super::schema::serialize;
use super::types::ResultsMapData;

/// Formats a map can be exported to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExportFormat {
	Png,
	Pdf,
	Json,
}

impl ExportFormat {
	pub const ALL: [Self; 3] = [Self::Png, Self::Pdf, Self::Json];

	pub fn extension(self) -> &'static str {
		match self {
			Self::Png => "png",
			Self::Pdf => "pdf",
			Self::Json => "json",
		}
	}

	pub fn mime_type(self) -> &'static str {
		match self {
			Self::Png => "image/png",
			Self::Pdf => "application/pdf",
			Self::Json => "application/json",
		}
	}

	/// Label shown in a save dialog's file type list.
	pub fn description(self) -> &'static str {
		match self {
			Self::Png => "PNG image",
			Self::Pdf => "PDF document",
			Self::Json => "Results map (JSON)",
		}
	}
}

/// File name derived from the map title: runs of anything that is not a
/// letter or digit become a single `-`.
pub fn suggested_file_name(title: &str, format: ExportFormat) -> String {
	let mut stem = String::with_capacity(title.len());
	for c in title.trim().chars() {
		if c.is_alphanumeric() {
			stem.extend(c.to_lowercase());
		} else if !stem.ends_with('-') {
			stem.push('-');
		}
	}
	let stem = stem.trim_matches('-');
	let stem = if stem.is_empty() { "results-map" } else { stem };
	format!("{stem}.{}", format.extension())
}

/// JSON export; identical to the saved document.
pub fn export_json(data: &ResultsMapData) -> Result<String> {
	serialize(data)
}
