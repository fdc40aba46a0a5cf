//! Retrieval planning.
//!
//! A placed item is reachable through its container's open face; anything
//! stowed strictly in front of it whose open-face projection intersects the
//! target's must be moved aside first. Plans are advisory and generated per
//! query; only a confirmed retrieval mutates item state, and that mutation is
//! the store's job.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::model::{Item, RetrievalAction, RetrievalStep};
use crate::score::retrieval_priority;
use crate::types::EPSILON;

/// Why a retrieval cannot proceed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RetrievalError {
    #[error("item not found: {0}")]
    NotFound(String),
    #[error("item is not placed in any container: {0}")]
    NotPlaced(String),
    #[error("item is expired and must be returned, not used: {0}")]
    Expired(String),
    #[error("item has no uses remaining: {0}")]
    Depleted(String),
}

/// Items that must be moved aside before `target` can be pulled out.
///
/// A blocker is placed in the same container, starts strictly closer to the
/// open face, and overlaps the target's open-face projection. Items at the
/// same depth never block each other.
pub fn blockers<'a>(target: &Item, items: &'a [Item]) -> Vec<&'a Item> {
    let (Some(container_id), Some(target_position)) = (&target.container_id, &target.position)
    else {
        return Vec::new();
    };

    let mut blocking: Vec<&Item> = items
        .iter()
        .filter(|other| other.item_id != target.item_id)
        .filter(|other| other.container_id.as_ref() == Some(container_id))
        .filter_map(|other| other.position.as_ref().map(|position| (other, position)))
        .filter(|(_, position)| {
            position.start.depth < target_position.start.depth - EPSILON
                && position.overlaps_open_face(target_position)
        })
        .map(|(other, _)| other)
        .collect();

    // Closest to the open face first; that is also safe removal order.
    blocking.sort_by(|a, b| {
        let depth_a = a.position.as_ref().map(|p| p.start.depth).unwrap_or(0.0);
        let depth_b = b.position.as_ref().map(|p| p.start.depth).unwrap_or(0.0);
        depth_a
            .total_cmp(&depth_b)
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    blocking
}

/// Number of aside-moves needed to reach the item. Zero means directly
/// accessible.
pub fn step_count(target: &Item, items: &[Item]) -> usize {
    blockers(target, items).len()
}

/// Full numbered retrieval plan for one item.
///
/// Structure: remove each blocker front to back, retrieve the target, then
/// place the blockers back in reverse order. Step numbers are continuous
/// across the three phases.
pub fn plan_retrieval(target_id: &str, items: &[Item]) -> Result<Vec<RetrievalStep>, RetrievalError> {
    let target = items
        .iter()
        .find(|item| item.item_id == target_id)
        .ok_or_else(|| RetrievalError::NotFound(target_id.to_string()))?;
    if !target.is_placed() {
        return Err(RetrievalError::NotPlaced(target_id.to_string()));
    }

    let blocking = blockers(target, items);
    let mut steps = Vec::with_capacity(blocking.len() * 2 + 1);
    let mut step = 0usize;

    for blocker in &blocking {
        step += 1;
        steps.push(RetrievalStep {
            step,
            action: RetrievalAction::Remove,
            item_id: blocker.item_id.clone(),
            item_name: blocker.name.clone(),
        });
    }

    step += 1;
    steps.push(RetrievalStep {
        step,
        action: RetrievalAction::Retrieve,
        item_id: target.item_id.clone(),
        item_name: target.name.clone(),
    });

    for blocker in blocking.iter().rev() {
        step += 1;
        steps.push(RetrievalStep {
            step,
            action: RetrievalAction::PlaceBack,
            item_id: blocker.item_id.clone(),
            item_name: blocker.name.clone(),
        });
    }

    Ok(steps)
}

/// Gate check before a retrieval is confirmed: the item must be placed,
/// unexpired and have uses left.
pub fn check_retrievable(item: &Item, now: DateTime<Utc>) -> Result<(), RetrievalError> {
    if !item.is_placed() {
        return Err(RetrievalError::NotPlaced(item.item_id.clone()));
    }
    if item.is_expired(now) {
        return Err(RetrievalError::Expired(item.item_id.clone()));
    }
    if item.is_depleted() {
        return Err(RetrievalError::Depleted(item.item_id.clone()));
    }
    Ok(())
}

/// One entry of the retrieval recommendation list.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub item_id: String,
    pub name: String,
    pub container_id: String,
    pub retrieval_steps: usize,
    pub priority_score: f64,
}

/// Ranks retrievable placed items by urgency discounted by retrieval
/// difficulty, best candidates first.
pub fn recommend(items: &[Item], now: DateTime<Utc>, limit: usize) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = items
        .iter()
        .filter(|item| item.is_placed())
        .filter(|item| check_retrievable(item, now).is_ok())
        .map(|item| {
            let steps = step_count(item, items);
            Recommendation {
                item_id: item.item_id.clone(),
                name: item.name.clone(),
                container_id: item.container_id.clone().unwrap_or_default(),
                retrieval_steps: steps,
                priority_score: retrieval_priority(item, steps, now),
            }
        })
        .collect();

    recommendations.sort_by(|a, b| {
        b.priority_score
            .total_cmp(&a.priority_score)
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    recommendations.truncate(limit);
    recommendations
}
