//! In-memory stowage state.
//!
//! One coarse lock over the whole inventory. Engine calls operate on cloned
//! snapshots, so the lock is held only while copying state in or out, never
//! across a placement or planning run.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{Container, Item, Placement, ValidationError};
use crate::retrieval::{check_retrievable, RetrievalError};
use crate::rotation;
use crate::types::BoundingBox;
use crate::waste;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("item not found: {0}")]
    ItemNotFound(String),
    #[error("container not found: {0}")]
    ContainerNotFound(String),
    #[error("placement rejected: {0}")]
    InvalidPlacement(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

#[derive(Debug, Default)]
struct StoreInner {
    items: HashMap<String, Item>,
    containers: HashMap<String, Container>,
}

/// Shared inventory of items and containers.
#[derive(Debug, Default)]
pub struct StowageStore {
    inner: RwLock<StoreInner>,
}

impl StowageStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Poisoned guards are recovered: every mutation is a whole-record insert,
    // update or remove, so a panicked writer cannot leave the maps in a
    // half-updated state.
    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validates and upserts a batch of items; the whole batch is rejected on
    /// the first invalid record.
    pub fn upsert_items(&self, items: Vec<Item>) -> Result<usize, StoreError> {
        for item in &items {
            item.validate()?;
        }
        let mut inner = self.write();
        let count = items.len();
        for item in items {
            inner.items.insert(item.item_id.clone(), item);
        }
        Ok(count)
    }

    pub fn upsert_containers(&self, containers: Vec<Container>) -> Result<usize, StoreError> {
        for container in &containers {
            container.validate()?;
        }
        let mut inner = self.write();
        let count = containers.len();
        for container in containers {
            inner
                .containers
                .insert(container.container_id.clone(), container);
        }
        Ok(count)
    }

    /// Snapshot of all items, ordered by id for stable output.
    pub fn items(&self) -> Vec<Item> {
        let inner = self.read();
        let mut items: Vec<Item> = inner.items.values().cloned().collect();
        items.sort_by(|a, b| a.item_id.cmp(&b.item_id));
        items
    }

    pub fn containers(&self) -> Vec<Container> {
        let inner = self.read();
        let mut containers: Vec<Container> = inner.containers.values().cloned().collect();
        containers.sort_by(|a, b| a.container_id.cmp(&b.container_id));
        containers
    }

    pub fn item(&self, item_id: &str) -> Option<Item> {
        self.read().items.get(item_id).cloned()
    }

    pub fn container(&self, container_id: &str) -> Option<Container> {
        self.read().containers.get(container_id).cloned()
    }

    /// Case-insensitive search by exact id or name substring.
    pub fn search_items(&self, query: &str) -> Vec<Item> {
        let needle = query.to_lowercase();
        let mut found: Vec<Item> = self
            .read()
            .items
            .values()
            .filter(|item| {
                item.item_id.to_lowercase() == needle
                    || item.name.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.item_id.cmp(&b.item_id));
        found
    }

    /// Persists engine placements back onto the item records. Placements for
    /// unknown items are ignored; returns how many were applied.
    pub fn apply_placements(&self, placements: &[Placement], now: DateTime<Utc>) -> usize {
        let mut inner = self.write();
        let mut applied = 0;
        for placement in placements {
            if let Some(item) = inner.items.get_mut(&placement.item_id) {
                item.container_id = Some(placement.container_id.clone());
                item.position = Some(placement.position);
                item.placement_timestamp = Some(now);
                applied += 1;
            }
        }
        applied
    }

    /// Confirms a retrieval: gate-checks the item, then spends one use.
    ///
    /// The item keeps its stowed position; physically it is expected to go
    /// back to the same slot after use.
    pub fn confirm_retrieval(&self, item_id: &str, now: DateTime<Utc>) -> Result<Item, StoreError> {
        let mut inner = self.write();
        let item = inner
            .items
            .get_mut(item_id)
            .ok_or_else(|| StoreError::ItemNotFound(item_id.to_string()))?;
        check_retrievable(item, now)?;
        item.current_uses += 1;
        Ok(item.clone())
    }

    /// Manually re-stows an item at an explicit position, e.g. after the crew
    /// placed it somewhere other than the planned slot.
    ///
    /// The position must lie inside the container, keep extents that are a
    /// rotation of the item's dimensions, and not collide with any other
    /// placed item in that container.
    pub fn update_placement(
        &self,
        item_id: &str,
        container_id: &str,
        position: BoundingBox,
        now: DateTime<Utc>,
    ) -> Result<Item, StoreError> {
        let mut inner = self.write();
        let container_dims = inner
            .containers
            .get(container_id)
            .ok_or_else(|| StoreError::ContainerNotFound(container_id.to_string()))?
            .dims();
        let item_dims = inner
            .items
            .get(item_id)
            .ok_or_else(|| StoreError::ItemNotFound(item_id.to_string()))?
            .dims();

        if !position.fits_inside(&container_dims) {
            return Err(StoreError::InvalidPlacement(format!(
                "position extends outside container {container_id}"
            )));
        }
        if !rotation::is_valid_rotation(item_dims, position.extents()) {
            return Err(StoreError::InvalidPlacement(format!(
                "position extents do not match the dimensions of item {item_id}"
            )));
        }
        if let Some(occupant) = inner.items.values().find(|other| {
            other.item_id != item_id
                && other.container_id.as_deref() == Some(container_id)
                && other
                    .position
                    .is_some_and(|placed| placed.overlaps(&position))
        }) {
            return Err(StoreError::InvalidPlacement(format!(
                "position overlaps item {}",
                occupant.item_id
            )));
        }

        let item = inner
            .items
            .get_mut(item_id)
            .ok_or_else(|| StoreError::ItemNotFound(item_id.to_string()))?;
        item.container_id = Some(container_id.to_string());
        item.position = Some(position);
        item.placement_timestamp = Some(now);
        Ok(item.clone())
    }

    /// Executes an undocking: detaches every item stowed in the container and
    /// deletes the container record. Returns the number of detached items.
    pub fn undock_container(&self, container_id: &str) -> Result<usize, StoreError> {
        let mut inner = self.write();
        if inner.containers.remove(container_id).is_none() {
            return Err(StoreError::ContainerNotFound(container_id.to_string()));
        }
        let mut items: Vec<Item> = inner.items.values().cloned().collect();
        let detached = waste::undock(&mut items, container_id);
        for item in items {
            inner.items.insert(item.item_id.clone(), item);
        }
        Ok(detached)
    }

    /// Placed, still-active items whose expiry falls within the horizon.
    pub fn expiring_within(&self, days: i64, now: DateTime<Utc>) -> Vec<Item> {
        let horizon = now + chrono::Duration::days(days);
        let mut expiring: Vec<Item> = self
            .read()
            .items
            .values()
            .filter(|item| item.is_placed() && !item.is_expired(now))
            .filter(|item| {
                item.expiry_date
                    .is_some_and(|expiry| expiry <= horizon)
            })
            .cloned()
            .collect();
        expiring.sort_by(|a, b| a.expiry_date.cmp(&b.expiry_date));
        expiring
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, Coords};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn store_with_container() -> StowageStore {
        let store = StowageStore::new();
        store
            .upsert_containers(vec![Container {
                container_id: "contA".to_string(),
                zone: "Storage_Bay".to_string(),
                width: 100.0,
                depth: 100.0,
                height: 100.0,
            }])
            .unwrap();
        store
    }

    #[test]
    fn upsert_rejects_invalid_batch_atomically() {
        let store = StowageStore::new();
        let good = crate::model::tests::sample_item("000001");
        let mut bad = crate::model::tests::sample_item("000002");
        bad.priority = 0;

        assert!(store.upsert_items(vec![good, bad]).is_err());
        assert!(store.items().is_empty());
    }

    #[test]
    fn placements_are_persisted_onto_items() {
        let store = store_with_container();
        store
            .upsert_items(vec![crate::model::tests::sample_item("000001")])
            .unwrap();

        let placement = Placement {
            item_id: "000001".to_string(),
            container_id: "contA".to_string(),
            position: BoundingBox::from_origin_and_size(
                Coords::zero(),
                Coords::new(10.0, 10.0, 20.0),
            ),
        };
        assert_eq!(store.apply_placements(&[placement], now()), 1);

        let item = store.item("000001").unwrap();
        assert!(item.is_placed());
        assert_eq!(item.placement_timestamp, Some(now()));
    }

    #[test]
    fn confirm_retrieval_spends_one_use() {
        let store = store_with_container();
        let mut item = crate::model::tests::sample_item("000001");
        item.container_id = Some("contA".to_string());
        item.position = Some(BoundingBox::from_origin_and_size(
            Coords::zero(),
            item.dims(),
        ));
        store.upsert_items(vec![item]).unwrap();

        let updated = store.confirm_retrieval("000001", now()).unwrap();
        assert_eq!(updated.current_uses, 1);

        let err = store.confirm_retrieval("missing", now()).unwrap_err();
        assert_eq!(err, StoreError::ItemNotFound("missing".to_string()));
    }

    #[test]
    fn confirm_retrieval_refuses_expired_items() {
        let store = store_with_container();
        let mut item = crate::model::tests::sample_item("000001");
        item.container_id = Some("contA".to_string());
        item.position = Some(BoundingBox::from_origin_and_size(
            Coords::zero(),
            item.dims(),
        ));
        item.expiry_date = Some(now() - chrono::Duration::days(1));
        store.upsert_items(vec![item]).unwrap();

        assert!(matches!(
            store.confirm_retrieval("000001", now()),
            Err(StoreError::Retrieval(RetrievalError::Expired(_)))
        ));
        assert_eq!(store.item("000001").unwrap().current_uses, 0);
    }

    #[test]
    fn undock_deletes_container_and_detaches_items() {
        let store = store_with_container();
        let mut stowed = crate::model::tests::sample_item("000001");
        stowed.container_id = Some("contA".to_string());
        stowed.position = Some(BoundingBox::from_origin_and_size(
            Coords::zero(),
            stowed.dims(),
        ));
        store.upsert_items(vec![stowed]).unwrap();

        assert_eq!(store.undock_container("contA").unwrap(), 1);
        assert!(store.container("contA").is_none());
        assert!(!store.item("000001").unwrap().is_placed());

        assert_eq!(
            store.undock_container("contA").unwrap_err(),
            StoreError::ContainerNotFound("contA".to_string())
        );
    }

    #[test]
    fn manual_placement_rejects_out_of_bounds() {
        let store = store_with_container();
        store
            .upsert_items(vec![crate::model::tests::sample_item("000001")])
            .unwrap();

        // 10x10x20 extents starting at width 95 poke out of the 100-cube.
        let err = store
            .update_placement(
                "000001",
                "contA",
                BoundingBox::from_origin_and_size(
                    Coords::new(95.0, 0.0, 0.0),
                    Coords::new(10.0, 10.0, 20.0),
                ),
                now(),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPlacement(_)));
        assert!(!store.item("000001").unwrap().is_placed());
    }

    #[test]
    fn manual_placement_rejects_collisions_and_bad_extents() {
        let store = store_with_container();
        let mut occupant = crate::model::tests::sample_item("000001");
        occupant.container_id = Some("contA".to_string());
        occupant.position = Some(BoundingBox::from_origin_and_size(
            Coords::zero(),
            occupant.dims(),
        ));
        let newcomer = crate::model::tests::sample_item("000002");
        store.upsert_items(vec![occupant, newcomer]).unwrap();

        let overlapping = BoundingBox::from_origin_and_size(
            Coords::new(5.0, 5.0, 0.0),
            Coords::new(10.0, 10.0, 20.0),
        );
        assert!(matches!(
            store.update_placement("000002", "contA", overlapping, now()),
            Err(StoreError::InvalidPlacement(_))
        ));

        let wrong_extents = BoundingBox::from_origin_and_size(
            Coords::new(50.0, 0.0, 0.0),
            Coords::new(10.0, 10.0, 10.0),
        );
        assert!(matches!(
            store.update_placement("000002", "contA", wrong_extents, now()),
            Err(StoreError::InvalidPlacement(_))
        ));

        // A rotated, collision-free slot is accepted.
        let rotated = BoundingBox::from_origin_and_size(
            Coords::new(50.0, 0.0, 0.0),
            Coords::new(20.0, 10.0, 10.0),
        );
        let updated = store
            .update_placement("000002", "contA", rotated, now())
            .unwrap();
        assert!(updated.is_placed());
    }

    #[test]
    fn store_recovers_from_a_poisoned_lock() {
        let store = std::sync::Arc::new(StowageStore::new());
        store
            .upsert_items(vec![crate::model::tests::sample_item("000001")])
            .unwrap();

        let poisoner = std::sync::Arc::clone(&store);
        let crashed = std::thread::spawn(move || {
            let _guard = poisoner.write();
            panic!("simulated crash while holding the write lock");
        })
        .join();
        assert!(crashed.is_err());

        assert_eq!(store.items().len(), 1);
        store
            .upsert_items(vec![crate::model::tests::sample_item("000002")])
            .unwrap();
        assert_eq!(store.items().len(), 2);
    }

    #[test]
    fn search_matches_id_exactly_and_name_loosely() {
        let store = StowageStore::new();
        let mut filter = crate::model::tests::sample_item("000001");
        filter.name = "Water Filter".to_string();
        let mut pump = crate::model::tests::sample_item("000002");
        pump.name = "Water Pump".to_string();
        store.upsert_items(vec![filter, pump]).unwrap();

        assert_eq!(store.search_items("water").len(), 2);
        assert_eq!(store.search_items("filter").len(), 1);
        assert_eq!(store.search_items("000002").len(), 1);
        assert!(store.search_items("oxygen").is_empty());
    }

    #[test]
    fn expiring_report_excludes_already_expired() {
        let store = store_with_container();
        let mut soon = crate::model::tests::sample_item("000001");
        soon.container_id = Some("contA".to_string());
        soon.position = Some(BoundingBox::from_origin_and_size(Coords::zero(), soon.dims()));
        soon.expiry_date = Some(now() + chrono::Duration::days(3));

        let mut gone = crate::model::tests::sample_item("000002");
        gone.container_id = Some("contA".to_string());
        gone.position = Some(BoundingBox::from_origin_and_size(
            Coords::new(20.0, 0.0, 0.0),
            gone.dims(),
        ));
        gone.expiry_date = Some(now() - chrono::Duration::days(1));

        let mut far = crate::model::tests::sample_item("000003");
        far.container_id = Some("contA".to_string());
        far.position = Some(BoundingBox::from_origin_and_size(
            Coords::new(40.0, 0.0, 0.0),
            far.dims(),
        ));
        far.expiry_date = Some(now() + chrono::Duration::days(60));

        store.upsert_items(vec![soon, gone, far]).unwrap();
        let report = store.expiring_within(7, now());
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].item_id, "000001");
    }
}
