//! Data model for the stowage service.
//!
//! Defines the two authoritative records, `Item` and `Container`, plus the
//! transient values the engines produce: `Placement`, `RetrievalStep` and the
//! return plan shapes. Authoritative placement state lives on each item
//! (`container_id` + `position`); a container's item list is derived.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::{BoundingBox, Coords, Dimensional};

/// Validation failure for incoming item or container records.
///
/// Raised before any record reaches the engines; the offending field is named
/// so callers can correct their input.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be positive and finite, got: {value}")]
    InvalidDimension { field: &'static str, value: f64 },
    #[error("priority must be in 1..=100, got: {0}")]
    InvalidPriority(i64),
    #[error("mass must be positive and finite, got: {0}")]
    InvalidMass(f64),
    #[error("usage limit must be positive, got: {0}")]
    InvalidUsageLimit(i64),
}

fn validate_dimension(value: f64, field: &'static str) -> Result<(), ValidationError> {
    if value <= 0.0 || !value.is_finite() {
        return Err(ValidationError::InvalidDimension { field, value });
    }
    Ok(())
}

fn default_mass() -> f64 {
    1.0
}

fn default_usage_limit() -> u32 {
    100
}

/// Lifecycle status of an item relative to a reference instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Active,
    Expired,
    Depleted,
}

/// A discrete cargo item.
///
/// Created unplaced; `container_id` and `position` are set when the
/// placement engine commits a position and cleared when the item is removed
/// or its container undocks. An expired or depleted item keeps its placement
/// until explicitly returned.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Stable opaque identifier; external ingestion normalizes formatting.
    pub item_id: String,
    pub name: String,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    /// Base priority in 1..=100.
    pub priority: u8,
    pub preferred_zone: String,
    #[serde(default = "default_mass")]
    pub mass: f64,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "2026-10-01T00:00:00Z")]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default = "default_usage_limit")]
    pub usage_limit: u32,
    #[serde(default)]
    pub current_uses: u32,
    #[serde(default)]
    pub container_id: Option<String>,
    #[serde(default)]
    pub position: Option<BoundingBox>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub placement_timestamp: Option<DateTime<Utc>>,
}

impl Item {
    /// Re-checks the input invariants the transport layer should have
    /// enforced. The engines call this before any geometry operation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_dimension(self.width, "width")?;
        validate_dimension(self.depth, "depth")?;
        validate_dimension(self.height, "height")?;
        if self.priority < 1 || self.priority > 100 {
            return Err(ValidationError::InvalidPriority(self.priority as i64));
        }
        if self.mass <= 0.0 || !self.mass.is_finite() {
            return Err(ValidationError::InvalidMass(self.mass));
        }
        if self.usage_limit == 0 {
            return Err(ValidationError::InvalidUsageLimit(self.usage_limit as i64));
        }
        Ok(())
    }

    #[inline]
    pub fn dims(&self) -> Coords {
        Coords::new(self.width, self.depth, self.height)
    }

    #[inline]
    pub fn volume(&self) -> f64 {
        self.width * self.depth * self.height
    }

    /// True once the item has a committed container and position.
    #[inline]
    pub fn is_placed(&self) -> bool {
        self.container_id.is_some() && self.position.is_some()
    }

    /// Strict comparison: an item expires the instant `now` passes its
    /// expiry date, never on the date itself.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry_date {
            Some(expiry) => now > expiry,
            None => false,
        }
    }

    #[inline]
    pub fn is_depleted(&self) -> bool {
        self.current_uses >= self.usage_limit
    }

    #[inline]
    pub fn remaining_uses(&self) -> u32 {
        self.usage_limit.saturating_sub(self.current_uses)
    }

    /// Expiry takes precedence over depletion when both hold.
    pub fn status(&self, now: DateTime<Utc>) -> ItemStatus {
        if self.is_expired(now) {
            ItemStatus::Expired
        } else if self.is_depleted() {
            ItemStatus::Depleted
        } else {
            ItemStatus::Active
        }
    }
}

impl Dimensional for Item {
    fn dimensions(&self) -> Coords {
        self.dims()
    }
}

/// A fixed storage container assigned to exactly one zone.
///
/// Width and height span the open face; depth extends away from the opening.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub container_id: String,
    pub zone: String,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl Container {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_dimension(self.width, "container width")?;
        validate_dimension(self.depth, "container depth")?;
        validate_dimension(self.height, "container height")?;
        Ok(())
    }

    #[inline]
    pub fn dims(&self) -> Coords {
        Coords::new(self.width, self.depth, self.height)
    }

    #[inline]
    pub fn volume(&self) -> f64 {
        self.width * self.depth * self.height
    }

    /// Volume occupied by the given items' placed boxes in this container.
    pub fn used_volume<'a>(&self, items: impl IntoIterator<Item = &'a Item>) -> f64 {
        items
            .into_iter()
            .filter(|item| item.container_id.as_deref() == Some(self.container_id.as_str()))
            .filter_map(|item| item.position.as_ref())
            .map(|position| position.volume())
            .sum()
    }

    pub fn available_volume<'a>(&self, items: impl IntoIterator<Item = &'a Item>) -> f64 {
        self.volume() - self.used_volume(items)
    }

    pub fn utilization_percent<'a>(&self, items: impl IntoIterator<Item = &'a Item>) -> f64 {
        let total = self.volume();
        if total <= 0.0 {
            return 0.0;
        }
        (self.used_volume(items) / total) * 100.0
    }
}

impl Dimensional for Container {
    fn dimensions(&self) -> Coords {
        self.dims()
    }
}

/// Committed placement of one item, as returned by the placement engine.
///
/// Transient value: the store persists it back onto the item record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub item_id: String,
    pub container_id: String,
    #[serde(flatten)]
    pub position: BoundingBox,
}

/// One atomic action in a retrieval plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum RetrievalAction {
    Remove,
    Retrieve,
    PlaceBack,
}

/// A single numbered step of a retrieval plan. Generated per query, never
/// persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalStep {
    pub step: usize,
    pub action: RetrievalAction,
    pub item_id: String,
    pub item_name: String,
}

/// One move of a return plan: waste item from its container into the
/// undocking container.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnPlanStep {
    pub step: usize,
    pub item_id: String,
    pub item_name: String,
    pub from_container: String,
    pub to_container: String,
}

/// Item entry in the return manifest.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnItem {
    pub item_id: String,
    pub name: String,
    pub reason: String,
}

/// Aggregate totals for a planned return.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnManifest {
    pub undocking_container_id: String,
    #[schema(value_type = String)]
    pub undocking_date: DateTime<Utc>,
    pub return_items: Vec<ReturnItem>,
    pub total_volume: f64,
    pub total_weight: f64,
}
