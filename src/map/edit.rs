//! Editing operations on a map.
//!
//! Every operation either applies completely or returns an error and leaves
//! the map untouched.

use std::collections::HashSet;

use log::debug;

use super::error::{MapError, Result};
use super::geometry::{Point, Region, clamp_to_region, region_for, validate_sectors};
use super::relations::validate;
use super::types::{
	Bubble, Group, GroupLevel, LayerType, MapConfig, RelationType, Relationship, ResultsMapData,
};

/// Next free decimal id, the scheme documents have always used: one past
/// the largest, or the smallest unused number once the largest is `u64::MAX`.
fn next_id<'a>(ids: impl Iterator<Item = &'a str>) -> String {
	let taken: HashSet<u64> = ids.filter_map(|id| id.parse().ok()).collect();
	let max = taken.iter().copied().max().unwrap_or(0);
	let next = match max.checked_add(1) {
		Some(next) => next,
		// a finite set always leaves a gap below u64::MAX
		None => (1..u64::MAX).find(|n| !taken.contains(n)).unwrap_or_default(),
	};
	next.to_string()
}

impl ResultsMapData {
	/// Throws the current map away and starts from the default template.
	pub fn reset(&mut self) {
		*self = Self::default();
	}

	/// Swaps in a whole map, e.g. one just loaded from a file. Bands and
	/// sectors are checked first.
	pub fn replace(&mut self, other: ResultsMapData) -> Result<()> {
		other.map_config.validate()?;
		validate_sectors(&other.groups)?;
		*self = other;
		Ok(())
	}

	/// Region a bubble with this layer and group id must stay in. Unknown
	/// group ids float in the band.
	pub fn region_for(&self, layer: LayerType, group_id: &str) -> Result<Region> {
		region_for(&self.map_config, layer, self.group(group_id))
	}

	fn existing_group(&self, group_id: &str) -> Result<()> {
		if group_id.is_empty() || self.group(group_id).is_some() {
			Ok(())
		} else {
			Err(MapError::UnknownGroup(group_id.to_string()))
		}
	}

	fn bubble_entry(&mut self, id: &str) -> Result<&mut Bubble> {
		self.bubble_mut(id).ok_or_else(|| MapError::UnknownBubble(id.to_string()))
	}

	fn group_entry(&mut self, id: &str) -> Result<&mut Group> {
		self.group_mut(id).ok_or_else(|| MapError::UnknownGroup(id.to_string()))
	}

	pub fn add_bubble(&mut self, text: impl Into<String>, layer: LayerType, group_id: &str) -> Result<String> {
		self.existing_group(group_id)?;
		let id = next_id(self.bubbles.iter().map(|b| b.id.as_str()));
		self.bubbles.push(Bubble::new(id.clone(), text, layer).in_group(group_id));
		debug!("added bubble {id} to {layer}");
		Ok(id)
	}

	pub fn rename_bubble(&mut self, id: &str, text: impl Into<String>) -> Result<()> {
		self.bubble_entry(id)?.text = text.into();
		Ok(())
	}

	/// Stores `to` as the bubble's position and returns where it ended up.
	/// Unlocked bubbles are clamped into their region; locked ones go
	/// exactly where they are put.
	pub fn move_bubble(&mut self, id: &str, to: Point) -> Result<Point> {
		let bubble = self.bubble(id).ok_or_else(|| MapError::UnknownBubble(id.to_string()))?;
		let target = if bubble.locked {
			to
		} else {
			clamp_to_region(to, &self.region_for(bubble.layer, &bubble.group_id)?)
		};
		self.bubble_entry(id)?.set_position(target);
		Ok(target)
	}

	/// Moves a bubble to another layer and/or group. A stored position of an
	/// unlocked bubble is clamped into the new region.
	pub fn reassign_bubble(&mut self, id: &str, layer: LayerType, group_id: &str) -> Result<()> {
		self.existing_group(group_id)?;
		let region = self.region_for(layer, group_id)?;
		let bubble = self.bubble_entry(id)?;
		bubble.layer = layer;
		bubble.group_id = group_id.to_string();
		if let (false, Some(at)) = (bubble.locked, bubble.position()) {
			bubble.set_position(clamp_to_region(at, &region));
		}
		Ok(())
	}

	pub fn set_bubble_locked(&mut self, id: &str, locked: bool) -> Result<()> {
		self.bubble_entry(id)?.locked = locked;
		Ok(())
	}

	pub fn set_bubble_visible(&mut self, id: &str, visible: bool) -> Result<()> {
		self.bubble_entry(id)?.visible = visible;
		Ok(())
	}

	/// Removes a bubble together with its relationships, which are returned.
	pub fn delete_bubble(&mut self, id: &str) -> Result<Vec<Relationship>> {
		let index = self
			.bubbles
			.iter()
			.position(|b| b.id == id)
			.ok_or_else(|| MapError::UnknownBubble(id.to_string()))?;
		self.bubbles.remove(index);
		let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.relationships)
			.into_iter()
			.partition(|r| r.source == id || r.target == id);
		self.relationships = kept;
		debug!("deleted bubble {id} and {} relationship(s)", removed.len());
		Ok(removed)
	}

	fn ensure_sector_fits(&self, candidate: &Group) -> Result<()> {
		let sector = candidate.sector();
		let clash = self
			.groups
			.iter()
			.filter(|g| g.id != candidate.id)
			.any(|g| g.sector().overlaps(sector));
		if !sector.is_valid() || clash {
			return Err(MapError::InvalidSector {
				group: candidate.id.clone(),
				start: candidate.start_angle,
				end: candidate.end_angle,
			});
		}
		Ok(())
	}

	pub fn add_group(&mut self, name: impl Into<String>, start_angle: f64, end_angle: f64) -> Result<String> {
		let id = next_id(self.groups.iter().map(|g| g.id.as_str()));
		let group = Group::new(id.clone(), name, start_angle, end_angle);
		self.ensure_sector_fits(&group)?;
		self.groups.push(group);
		debug!("added group {id} [{start_angle}, {end_angle})");
		Ok(id)
	}

	pub fn rename_group(&mut self, id: &str, name: impl Into<String>) -> Result<()> {
		self.group_entry(id)?.name = name.into();
		Ok(())
	}

	/// Changes a group's sector; rejected when it would overlap another.
	pub fn resize_group(&mut self, id: &str, start_angle: f64, end_angle: f64) -> Result<()> {
		let mut candidate = self.group(id).ok_or_else(|| MapError::UnknownGroup(id.to_string()))?.clone();
		candidate.start_angle = start_angle;
		candidate.end_angle = end_angle;
		self.ensure_sector_fits(&candidate)?;
		let group = self.group_entry(id)?;
		group.start_angle = start_angle;
		group.end_angle = end_angle;
		Ok(())
	}

	pub fn set_group_locked(&mut self, id: &str, locked: bool) -> Result<()> {
		self.group_entry(id)?.locked = locked;
		Ok(())
	}

	pub fn set_group_visible(&mut self, id: &str, visible: bool) -> Result<()> {
		self.group_entry(id)?.visible = visible;
		Ok(())
	}

	/// Removes a group; its bubbles stay, ungrouped.
	pub fn delete_group(&mut self, id: &str) -> Result<Group> {
		let index = self
			.groups
			.iter()
			.position(|g| g.id == id)
			.ok_or_else(|| MapError::UnknownGroup(id.to_string()))?;
		for bubble in self.bubbles.iter_mut().filter(|b| b.group_id == id) {
			bubble.group_id.clear();
		}
		Ok(self.groups.remove(index))
	}

	/// Adds an edge; self and dangling references are refused.
	pub fn add_relationship(&mut self, source: &str, target: &str, kind: RelationType) -> Result<String> {
		let id = next_id(self.relationships.iter().map(|r| r.id.as_str()));
		let candidate = Relationship::new(id.clone(), source, target, kind);
		if let Some(rejected) = validate(std::slice::from_ref(&candidate), &self.bubbles).invalid.into_iter().next() {
			return Err(rejected.reason);
		}
		self.relationships.push(candidate);
		Ok(id)
	}

	pub fn set_relationship_type(&mut self, id: &str, kind: RelationType) -> Result<()> {
		let rel = self
			.relationships
			.iter_mut()
			.find(|r| r.id == id)
			.ok_or_else(|| MapError::UnknownRelationship(id.to_string()))?;
		rel.kind = kind;
		Ok(())
	}

	pub fn delete_relationship(&mut self, id: &str) -> Result<Relationship> {
		let index = self
			.relationships
			.iter()
			.position(|r| r.id == id)
			.ok_or_else(|| MapError::UnknownRelationship(id.to_string()))?;
		Ok(self.relationships.remove(index))
	}

	/// Drops every relationship the validator rejects and returns them.
	pub fn remove_invalid_relationships(&mut self) -> Vec<Relationship> {
		let invalid: Vec<String> = validate(&self.relationships, &self.bubbles)
			.invalid
			.iter()
			.map(|i| i.relationship.id.clone())
			.collect();
		let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.relationships)
			.into_iter()
			.partition(|r| invalid.contains(&r.id));
		self.relationships = kept;
		removed
	}

	/// Replaces the map configuration; malformed bands are refused.
	pub fn reconfigure(&mut self, config: MapConfig) -> Result<()> {
		config.validate()?;
		self.map_config = config;
		Ok(())
	}

	pub fn set_group_level(&mut self, level: GroupLevel) {
		self.group_level = level;
	}

	/// Shows or hides the legend line of `kind`. Returns false when the
	/// legend has no such line.
	pub fn set_legend_line_visible(&mut self, kind: RelationType, visible: bool) -> bool {
		let mut found = false;
		for line in self
			.legends
			.legend_lines
			.iter_mut()
			.filter(|l| l.relation_type() == Some(kind))
		{
			line.visible = visible;
			found = true;
		}
		found
	}
}
