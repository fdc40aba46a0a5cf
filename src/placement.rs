//! Batch placement engine.
//!
//! Places unstowed items into containers, most urgent first. Container choice
//! is a ranked heuristic (zone affinity, volume fit, utilization balance);
//! within the chosen container the engine searches orientation and position
//! and commits the highest-scoring candidate. Items that cannot be placed are
//! reported with a reason, never treated as a fatal error.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::freespace::{ContainerSpace, SpaceTuning};
use crate::model::{Container, Item, Placement};
use crate::rotation::{orientations, RotationMode};
use crate::score::{composite_score, must_force_preferred_zone};
use crate::types::{BoundingBox, Coords};
use crate::zone::{zone_match_score, zones_equal};

/// Configuration of the placement heuristic.
///
/// Holds the candidate-scoring weights and the spatial search tunables.
#[derive(Clone, Copy, Debug)]
pub struct PlacementConfig {
    /// Weight of the fuzzy zone match in the candidate score.
    pub zone_weight: f64,
    /// Weight of the item's base priority in the candidate score.
    pub priority_weight: f64,
    /// Weight of open-face proximity in the candidate score.
    pub accessibility_weight: f64,
    /// Weight of the orientation's footprint stability in the candidate score.
    pub stability_weight: f64,
    pub rotation_mode: RotationMode,
    pub tuning: SpaceTuning,
}

impl PlacementConfig {
    pub const DEFAULT_ZONE_WEIGHT: f64 = 50.0;
    pub const DEFAULT_PRIORITY_WEIGHT: f64 = 0.3;
    pub const DEFAULT_ACCESSIBILITY_WEIGHT: f64 = 15.0;
    pub const DEFAULT_STABILITY_WEIGHT: f64 = 5.0;

    pub fn builder() -> PlacementConfigBuilder {
        PlacementConfigBuilder::default()
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            zone_weight: Self::DEFAULT_ZONE_WEIGHT,
            priority_weight: Self::DEFAULT_PRIORITY_WEIGHT,
            accessibility_weight: Self::DEFAULT_ACCESSIBILITY_WEIGHT,
            stability_weight: Self::DEFAULT_STABILITY_WEIGHT,
            rotation_mode: RotationMode::default(),
            tuning: SpaceTuning::default(),
        }
    }
}

/// Builder for custom placement configurations.
#[derive(Clone, Debug, Default)]
pub struct PlacementConfigBuilder {
    config: PlacementConfig,
}

impl PlacementConfigBuilder {
    pub fn zone_weight(mut self, weight: f64) -> Self {
        self.config.zone_weight = weight;
        self
    }

    pub fn priority_weight(mut self, weight: f64) -> Self {
        self.config.priority_weight = weight;
        self
    }

    pub fn accessibility_weight(mut self, weight: f64) -> Self {
        self.config.accessibility_weight = weight;
        self
    }

    pub fn stability_weight(mut self, weight: f64) -> Self {
        self.config.stability_weight = weight;
        self
    }

    pub fn rotation_mode(mut self, mode: RotationMode) -> Self {
        self.config.rotation_mode = mode;
        self
    }

    pub fn tuning(mut self, tuning: SpaceTuning) -> Self {
        self.config.tuning = tuning;
        self
    }

    pub fn build(self) -> PlacementConfig {
        self.config
    }
}

/// Result of one batch placement run.
#[derive(Clone, Debug)]
pub struct PlacementOutcome {
    pub placements: Vec<Placement>,
    pub unplaced: Vec<UnplacedItem>,
}

impl PlacementOutcome {
    pub fn is_complete(&self) -> bool {
        self.unplaced.is_empty()
    }

    pub fn placed_count(&self) -> usize {
        self.placements.len()
    }

    pub fn unplaced_count(&self) -> usize {
        self.unplaced.len()
    }
}

/// An item the engine could not place, with the reason.
#[derive(Clone, Debug)]
pub struct UnplacedItem {
    pub item_id: String,
    pub reason: UnplacedReason,
}

/// Why an item could not be placed.
#[derive(Clone, Debug)]
pub enum UnplacedReason {
    /// The item fails validation before any geometry is attempted.
    InvalidRecord { detail: String },
    /// No container is large enough in any orientation.
    DimensionsExceedContainers,
    /// Containers are large enough but no collision-free position was found.
    NoSpaceAvailable,
}

impl UnplacedReason {
    pub fn code(&self) -> &'static str {
        match self {
            UnplacedReason::InvalidRecord { .. } => "invalid_record",
            UnplacedReason::DimensionsExceedContainers => "dimensions_exceed_containers",
            UnplacedReason::NoSpaceAvailable => "no_space_available",
        }
    }
}

impl std::fmt::Display for UnplacedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnplacedReason::InvalidRecord { detail } => {
                write!(f, "item record is invalid: {detail}")
            }
            UnplacedReason::DimensionsExceedContainers => {
                write!(f, "item does not fit any container in any orientation")
            }
            UnplacedReason::NoSpaceAvailable => {
                write!(f, "no collision-free position available in any container")
            }
        }
    }
}

/// Progress events emitted during a placement run, suitable for SSE.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PlaceEvent {
    Started {
        total_items: usize,
    },
    ItemPlaced {
        item_id: String,
        container_id: String,
        position: BoundingBox,
        score: f64,
    },
    ItemRejected {
        item_id: String,
        reason_code: String,
        reason_text: String,
    },
    Finished {
        placed: usize,
        unplaced: usize,
    },
}

/// One feasible candidate inside a single container.
#[derive(Clone, Copy)]
struct Candidate {
    origin: Coords,
    size: Coords,
    score: f64,
}

/// The placement engine. Owns the per-container spatial trackers for the
/// duration of one run; construct a fresh engine per batch.
pub struct PlacementEngine {
    config: PlacementConfig,
    spaces: HashMap<String, ContainerSpace>,
}

impl PlacementEngine {
    pub fn new(config: PlacementConfig) -> Self {
        Self {
            config,
            spaces: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(PlacementConfig::default())
    }

    /// Places every unstowed item in `items`, most urgent first.
    ///
    /// Items that already carry a position are treated as fixed obstacles.
    pub fn place_all(
        &mut self,
        items: &[Item],
        containers: &[Container],
        now: DateTime<Utc>,
    ) -> PlacementOutcome {
        self.place_all_with_progress(items, containers, now, |_| {})
    }

    /// Like [`place_all`](Self::place_all) but invokes a callback per
    /// significant step, suitable for streaming over SSE.
    pub fn place_all_with_progress(
        &mut self,
        items: &[Item],
        containers: &[Container],
        now: DateTime<Utc>,
        mut on_event: impl FnMut(&PlaceEvent),
    ) -> PlacementOutcome {
        self.seed_spaces(items, containers);

        let mut pending: Vec<&Item> = items.iter().filter(|item| !item.is_placed()).collect();
        // Urgency first; among equals, bulky items before small ones so the
        // hard placements happen while space is still contiguous.
        pending.sort_by(|a, b| {
            composite_score(b, now)
                .partial_cmp(&composite_score(a, now))
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    b.volume()
                        .partial_cmp(&a.volume())
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| a.item_id.cmp(&b.item_id))
        });

        on_event(&PlaceEvent::Started {
            total_items: pending.len(),
        });

        let mut placements: Vec<Placement> = Vec::new();
        let mut unplaced: Vec<UnplacedItem> = Vec::new();

        for item in pending {
            if let Err(err) = item.validate() {
                let reason = UnplacedReason::InvalidRecord {
                    detail: err.to_string(),
                };
                tracing::debug!(item_id = %item.item_id, %err, "rejecting invalid item");
                on_event(&PlaceEvent::ItemRejected {
                    item_id: item.item_id.clone(),
                    reason_code: reason.code().to_string(),
                    reason_text: reason.to_string(),
                });
                unplaced.push(UnplacedItem {
                    item_id: item.item_id.clone(),
                    reason,
                });
                continue;
            }

            match self.place_one(item, containers, now) {
                Some(placement) => {
                    on_event(&PlaceEvent::ItemPlaced {
                        item_id: placement.placement.item_id.clone(),
                        container_id: placement.placement.container_id.clone(),
                        position: placement.placement.position,
                        score: placement.score,
                    });
                    placements.push(placement.placement);
                }
                None => {
                    let reason = self.unfit_reason(item, containers);
                    tracing::debug!(item_id = %item.item_id, code = reason.code(), "item not placed");
                    on_event(&PlaceEvent::ItemRejected {
                        item_id: item.item_id.clone(),
                        reason_code: reason.code().to_string(),
                        reason_text: reason.to_string(),
                    });
                    unplaced.push(UnplacedItem {
                        item_id: item.item_id.clone(),
                        reason,
                    });
                }
            }
        }

        on_event(&PlaceEvent::Finished {
            placed: placements.len(),
            unplaced: unplaced.len(),
        });
        PlacementOutcome {
            placements,
            unplaced,
        }
    }

    /// Registers every container and carves out the extents of already-placed
    /// items so a batch run never collides with standing cargo.
    fn seed_spaces(&mut self, items: &[Item], containers: &[Container]) {
        for container in containers {
            self.spaces
                .entry(container.container_id.clone())
                .or_insert_with(|| {
                    ContainerSpace::new(
                        container.container_id.clone(),
                        container.dims(),
                        self.config.tuning,
                    )
                });
        }

        for item in items {
            let (Some(container_id), Some(position)) = (&item.container_id, &item.position) else {
                continue;
            };
            if let Some(space) = self.spaces.get_mut(container_id) {
                if !space
                    .placed()
                    .iter()
                    .any(|extent| extent.item_id == item.item_id)
                {
                    // Inconsistent pre-state degrades packing quality only;
                    // the collision check inside `place` keeps geometry sound.
                    space.place(item.item_id.clone(), position.start, position.extents());
                }
            }
        }
    }

    fn place_one(
        &mut self,
        item: &Item,
        containers: &[Container],
        now: DateTime<Utc>,
    ) -> Option<ScoredPlacement> {
        let ranked = self.rank_containers(item, containers);

        if must_force_preferred_zone(item, now) {
            let (same_zone, other): (Vec<&Container>, Vec<&Container>) = ranked
                .into_iter()
                .partition(|c| zones_equal(&c.zone, &item.preferred_zone));

            // Preferred zone is exhausted before any cross-zone container is
            // even considered.
            if let Some(placed) = self.commit_global_best(item, &same_zone) {
                return Some(placed);
            }
            return self.commit_global_best(item, &other);
        }

        self.commit_global_best(item, &ranked)
    }

    /// Containers ordered by descending rank; ties break on container id.
    fn rank_containers<'a>(&self, item: &Item, containers: &'a [Container]) -> Vec<&'a Container> {
        let mut ranked: Vec<(&Container, f64)> = containers
            .iter()
            .map(|container| (container, self.container_rank(item, container)))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.container_id.cmp(&b.0.container_id))
        });
        ranked.into_iter().map(|(container, _)| container).collect()
    }

    /// Container desirability for one item. Zone affinity dominates; the
    /// remaining terms prefer containers the item does not dwarf, balanced
    /// utilization, and a guaranteed structural fit in the largest free box.
    fn container_rank(&self, item: &Item, container: &Container) -> f64 {
        let zone = zone_match_score(&item.preferred_zone, &container.zone);
        let container_volume = container.volume();
        let volume_ratio = if container_volume > 0.0 {
            (item.volume() / container_volume).min(1.0)
        } else {
            1.0
        };

        let mut rank = zone * 100.0 + (1.0 - volume_ratio) * 20.0;

        if let Some(space) = self.spaces.get(&container.container_id) {
            let utilization = space.utilization_percent() / 100.0;
            rank += (1.0 - (0.5 - utilization).abs()) * 20.0;

            let fits_largest = space.largest_free_space().is_some_and(|largest| {
                orientations(item.dims(), self.config.rotation_mode)
                    .iter()
                    .any(|o| largest.can_fit(*o))
            });
            if fits_largest {
                rank += 60.0;
            }
        }
        rank
    }

    /// Searches orientation and position in every container of the tier and
    /// commits the highest-scoring candidate overall. A higher-ranked
    /// container with only a deep slot loses to a lower-ranked one offering a
    /// front slot; rank order breaks exact score ties.
    fn commit_global_best(
        &mut self,
        item: &Item,
        ranked: &[&Container],
    ) -> Option<ScoredPlacement> {
        let mut best: Option<(&Container, Candidate)> = None;
        for &container in ranked {
            let Some(candidate) = self.best_candidate(item, container) else {
                continue;
            };
            if best.is_none_or(|(_, current)| candidate.score > current.score) {
                best = Some((container, candidate));
            }
        }

        let (container, candidate) = best?;
        let space = self.spaces.get_mut(&container.container_id)?;
        if !space.place(item.item_id.clone(), candidate.origin, candidate.size) {
            return None;
        }
        Some(ScoredPlacement {
            placement: Placement {
                item_id: item.item_id.clone(),
                container_id: container.container_id.clone(),
                position: BoundingBox::from_origin_and_size(candidate.origin, candidate.size),
            },
            score: candidate.score,
        })
    }

    fn best_candidate(&self, item: &Item, container: &Container) -> Option<Candidate> {
        let space = self.spaces.get(&container.container_id)?;
        let orients = orientations(item.dims(), self.config.rotation_mode);

        let mut best: Option<Candidate> = None;
        for size in orients {
            let Some(origin) = space.find_position(size) else {
                continue;
            };
            let score = self.placement_score(item, container, origin, size);
            if best.is_none_or(|current| score > current.score) {
                best = Some(Candidate {
                    origin,
                    size,
                    score,
                });
            }
        }
        best
    }

    /// Candidate score: zone affinity, base priority, proximity to the open
    /// face, and how low the chosen orientation keeps the item.
    fn placement_score(
        &self,
        item: &Item,
        container: &Container,
        origin: Coords,
        size: Coords,
    ) -> f64 {
        let zone = zone_match_score(&item.preferred_zone, &container.zone);
        let accessibility = if container.depth > 0.0 {
            1.0 - (origin.depth / container.depth).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let stability = if container.height > 0.0 {
            1.0 - (size.height / container.height).clamp(0.0, 1.0)
        } else {
            0.0
        };

        zone * self.config.zone_weight
            + item.priority as f64 * self.config.priority_weight
            + accessibility * self.config.accessibility_weight
            + stability * self.config.stability_weight
    }

    /// Distinguishes "nothing is big enough" from "everything is full".
    fn unfit_reason(&self, item: &Item, containers: &[Container]) -> UnplacedReason {
        let fits_somewhere = containers.iter().any(|container| {
            orientations(item.dims(), self.config.rotation_mode)
                .iter()
                .any(|o| o.fits_within(&container.dims(), crate::types::EPSILON))
        });
        if fits_somewhere {
            UnplacedReason::NoSpaceAvailable
        } else {
            UnplacedReason::DimensionsExceedContainers
        }
    }
}

struct ScoredPlacement {
    placement: Placement,
    score: f64,
}
