//! Waste identification and return planning.
//!
//! An item becomes waste once it is expired or out of uses; it stays placed
//! and keeps occupying volume until a return plan moves it into an undocking
//! container. Undocking detaches everything inside the departing container in
//! one step.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::model::{Container, Item, RetrievalStep, ReturnItem, ReturnManifest, ReturnPlanStep};
use crate::retrieval::{plan_retrieval, step_count};
use crate::types::BoundingBox;

/// Why an item counts as waste. Expiry takes precedence when both apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum WasteReason {
    Expired,
    OutOfUses,
}

impl std::fmt::Display for WasteReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WasteReason::Expired => write!(f, "Expired"),
            WasteReason::OutOfUses => write!(f, "Out of Uses"),
        }
    }
}

/// One identified waste item, still occupying its stowed position.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WasteItem {
    pub item_id: String,
    pub name: String,
    pub reason: WasteReason,
    pub container_id: String,
    pub position: BoundingBox,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WasteError {
    #[error("undocking container not found: {0}")]
    UnknownContainer(String),
}

/// Scans placed items and reports every expired or depleted one.
///
/// Unplaced items are skipped even when expired; there is nothing to return
/// until they occupy container volume.
pub fn identify_waste(items: &[Item], now: DateTime<Utc>) -> Vec<WasteItem> {
    items
        .iter()
        .filter_map(|item| {
            let (container_id, position) =
                (item.container_id.as_ref()?, item.position.as_ref()?);
            let reason = if item.is_expired(now) {
                WasteReason::Expired
            } else if item.is_depleted() {
                WasteReason::OutOfUses
            } else {
                return None;
            };
            Some(WasteItem {
                item_id: item.item_id.clone(),
                name: item.name.clone(),
                reason,
                container_id: container_id.clone(),
                position: *position,
            })
        })
        .collect()
}

/// Aggregate waste figures for reporting.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WasteStats {
    pub total_items: usize,
    pub expired: usize,
    pub out_of_uses: usize,
    pub total_mass: f64,
    pub total_volume: f64,
}

pub fn waste_stats(items: &[Item], now: DateTime<Utc>) -> WasteStats {
    let waste = identify_waste(items, now);
    let mut stats = WasteStats {
        total_items: waste.len(),
        expired: 0,
        out_of_uses: 0,
        total_mass: 0.0,
        total_volume: 0.0,
    };
    for entry in &waste {
        match entry.reason {
            WasteReason::Expired => stats.expired += 1,
            WasteReason::OutOfUses => stats.out_of_uses += 1,
        }
        if let Some(item) = items.iter().find(|item| item.item_id == entry.item_id) {
            stats.total_mass += item.mass;
            stats.total_volume += item.volume();
        }
    }
    stats
}

/// A complete return plan: the moves, the consolidated retrieval steps to
/// free each selected item, and the manifest.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnPlan {
    pub return_plan: Vec<ReturnPlanStep>,
    pub retrieval_steps: Vec<RetrievalStep>,
    pub return_manifest: ReturnManifest,
}

/// Plans moving waste into an undocking container under a weight budget.
///
/// Candidates are ordered cheapest-first: fewest retrieval moves, with a
/// discount for low-priority cargo. Selection is greedy; an item that would
/// blow the weight budget or the destination's remaining volume is skipped
/// and later, smaller candidates are still considered.
pub fn plan_return(
    items: &[Item],
    containers: &[Container],
    undocking_container_id: &str,
    undocking_date: DateTime<Utc>,
    max_weight: f64,
    now: DateTime<Utc>,
) -> Result<ReturnPlan, WasteError> {
    let undock = containers
        .iter()
        .find(|container| container.container_id == undocking_container_id)
        .ok_or_else(|| WasteError::UnknownContainer(undocking_container_id.to_string()))?;
    let mut available_volume = undock.available_volume(items.iter());

    let mut candidates: Vec<(&Item, WasteReason, usize)> = identify_waste(items, now)
        .into_iter()
        .filter(|waste| waste.container_id != undocking_container_id)
        .filter_map(|waste| {
            let item = items.iter().find(|item| item.item_id == waste.item_id)?;
            Some((item, waste.reason, step_count(item, items)))
        })
        .collect();

    candidates.sort_by(|a, b| {
        rank(a.0, a.2)
            .partial_cmp(&rank(b.0, b.2))
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.item_id.cmp(&b.0.item_id))
    });

    let mut return_plan: Vec<ReturnPlanStep> = Vec::new();
    let mut retrieval_steps: Vec<RetrievalStep> = Vec::new();
    let mut return_items: Vec<ReturnItem> = Vec::new();
    let mut total_weight = 0.0;
    let mut total_volume = 0.0;

    for (item, reason, _) in candidates {
        if total_weight + item.mass > max_weight {
            continue;
        }
        if item.volume() > available_volume {
            continue;
        }

        // plan_retrieval only fails for unknown or unplaced items, and waste
        // identification already guarantees both.
        let Ok(steps) = plan_retrieval(&item.item_id, items) else {
            continue;
        };
        for mut step in steps {
            step.step = retrieval_steps.len() + 1;
            retrieval_steps.push(step);
        }

        return_plan.push(ReturnPlanStep {
            step: return_plan.len() + 1,
            item_id: item.item_id.clone(),
            item_name: item.name.clone(),
            from_container: item.container_id.clone().unwrap_or_default(),
            to_container: undocking_container_id.to_string(),
        });
        return_items.push(ReturnItem {
            item_id: item.item_id.clone(),
            name: item.name.clone(),
            reason: reason.to_string(),
        });

        total_weight += item.mass;
        total_volume += item.volume();
        available_volume -= item.volume();
    }

    Ok(ReturnPlan {
        return_plan,
        retrieval_steps,
        return_manifest: ReturnManifest {
            undocking_container_id: undocking_container_id.to_string(),
            undocking_date,
            return_items,
            total_volume,
            total_weight,
        },
    })
}

/// Lower is better: fewer aside-moves, discounted by priority so valuable
/// cargo is returned last.
fn rank(item: &Item, steps: usize) -> f64 {
    steps as f64 - item.priority as f64 * 0.1
}

/// Detaches every item stowed in the departing container and returns how
/// many were detached. Deleting the container record itself is the caller's
/// responsibility.
pub fn undock(items: &mut [Item], container_id: &str) -> usize {
    let mut detached = 0;
    for item in items.iter_mut() {
        if item.container_id.as_deref() == Some(container_id) {
            item.container_id = None;
            item.position = None;
            item.placement_timestamp = None;
            detached += 1;
        }
    }
    detached
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Coords;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn placed(id: &str, container: &str, depth: f64) -> Item {
        let mut item = crate::model::tests::sample_item(id);
        item.container_id = Some(container.to_string());
        item.position = Some(BoundingBox::from_origin_and_size(
            Coords::new(0.0, depth, 0.0),
            item.dims(),
        ));
        item
    }

    fn undock_container(id: &str, side: f64) -> Container {
        Container {
            container_id: id.to_string(),
            zone: "Airlock".to_string(),
            width: side,
            depth: side,
            height: side,
        }
    }

    #[test]
    fn waste_requires_placement_and_a_reason() {
        let mut expired = placed("000001", "contA", 0.0);
        expired.expiry_date = Some(now() - chrono::Duration::days(1));

        let mut depleted = placed("000002", "contA", 20.0);
        depleted.current_uses = depleted.usage_limit;

        let mut unplaced_expired = crate::model::tests::sample_item("000003");
        unplaced_expired.expiry_date = Some(now() - chrono::Duration::days(1));

        let healthy = placed("000004", "contA", 40.0);

        let items = vec![expired, depleted, unplaced_expired, healthy];
        let waste = identify_waste(&items, now());
        assert_eq!(waste.len(), 2);
        assert_eq!(waste[0].item_id, "000001");
        assert_eq!(waste[0].reason, WasteReason::Expired);
        assert_eq!(waste[1].reason, WasteReason::OutOfUses);
    }

    #[test]
    fn expiry_takes_precedence_over_depletion() {
        let mut both = placed("000001", "contA", 0.0);
        both.expiry_date = Some(now() - chrono::Duration::days(1));
        both.current_uses = both.usage_limit;

        let waste = identify_waste(&[both], now());
        assert_eq!(waste[0].reason, WasteReason::Expired);
    }

    #[test]
    fn return_plan_skips_over_budget_and_keeps_going() {
        let mut heavy = placed("000001", "contA", 0.0);
        heavy.mass = 50.0;
        heavy.current_uses = heavy.usage_limit;

        let mut light = placed("000002", "contB", 0.0);
        light.mass = 5.0;
        light.current_uses = light.usage_limit;

        let items = vec![heavy, light];
        let containers = vec![undock_container("undock", 100.0)];

        let plan = plan_return(&items, &containers, "undock", now(), 20.0, now()).unwrap();
        let ids: Vec<&str> = plan
            .return_plan
            .iter()
            .map(|s| s.item_id.as_str())
            .collect();
        assert_eq!(ids, vec!["000002"]);
        assert!((plan.return_manifest.total_weight - 5.0).abs() < 1e-9);
    }

    #[test]
    fn return_plan_respects_destination_volume() {
        let mut waste_item = placed("000001", "contA", 0.0);
        waste_item.current_uses = waste_item.usage_limit;

        let items = vec![waste_item];
        // Item volume is 2000; a 10-cube destination cannot take it.
        let containers = vec![undock_container("undock", 10.0)];

        let plan = plan_return(&items, &containers, "undock", now(), 1000.0, now()).unwrap();
        assert!(plan.return_plan.is_empty());
        assert_eq!(plan.return_manifest.total_volume, 0.0);
    }

    #[test]
    fn cheaper_retrievals_are_planned_first() {
        // Deep item is blocked by a healthy one, shallow item is free.
        let mut deep = placed("000001", "contA", 40.0);
        deep.current_uses = deep.usage_limit;
        let wall = placed("000002", "contA", 0.0);
        let mut shallow = placed("000003", "contB", 0.0);
        shallow.current_uses = shallow.usage_limit;

        let items = vec![deep, wall, shallow];
        let containers = vec![undock_container("undock", 100.0)];

        let plan = plan_return(&items, &containers, "undock", now(), 1000.0, now()).unwrap();
        let ids: Vec<&str> = plan
            .return_plan
            .iter()
            .map(|s| s.item_id.as_str())
            .collect();
        assert_eq!(ids, vec!["000003", "000001"]);

        // Consolidated retrieval steps are renumbered continuously.
        let numbers: Vec<usize> = plan.retrieval_steps.iter().map(|s| s.step).collect();
        assert_eq!(numbers, (1..=numbers.len()).collect::<Vec<_>>());
    }

    #[test]
    fn unknown_undocking_container_errors() {
        let err = plan_return(&[], &[], "ghost", now(), 10.0, now()).unwrap_err();
        assert_eq!(err, WasteError::UnknownContainer("ghost".to_string()));
    }

    #[test]
    fn undock_detaches_only_that_container() {
        let mut items = vec![
            placed("000001", "contA", 0.0),
            placed("000002", "contA", 20.0),
            placed("000003", "contB", 0.0),
        ];

        let detached = undock(&mut items, "contA");
        assert_eq!(detached, 2);
        assert!(!items[0].is_placed());
        assert!(!items[1].is_placed());
        assert!(items[2].is_placed());
    }

    #[test]
    fn stats_aggregate_mass_and_volume() {
        let mut expired = placed("000001", "contA", 0.0);
        expired.expiry_date = Some(now() - chrono::Duration::days(1));
        expired.mass = 3.0;

        let mut depleted = placed("000002", "contA", 20.0);
        depleted.current_uses = depleted.usage_limit;
        depleted.mass = 7.0;

        let stats = waste_stats(&[expired, depleted], now());
        assert_eq!(stats.total_items, 2);
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.out_of_uses, 1);
        assert!((stats.total_mass - 10.0).abs() < 1e-9);
        assert!((stats.total_volume - 4000.0).abs() < 1e-9);
    }
}
