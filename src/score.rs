//! Composite priority scoring.
//!
//! Collapses an item's urgency signals into one score in `[0, 100]` used to
//! order batch placement and to rank retrieval recommendations. The
//! breakpoints are fixed policy, not tunables: they encode how the crew
//! triages cargo and changing them silently would reorder every plan.

use chrono::{DateTime, Utc};

use crate::model::Item;

/// Weight ceilings of the four score components.
const BASE_PRIORITY_WEIGHT: f64 = 40.0;
const EXPIRY_WEIGHT: f64 = 30.0;
const USAGE_WEIGHT: f64 = 20.0;
const ZONE_WEIGHT: f64 = 10.0;

/// Composite urgency score in `[0, 100]`, higher is more critical.
///
/// Base priority contributes up to 40 points, expiry proximity up to 30,
/// usage depletion up to 20 and preferred-zone criticality up to 10.
pub fn composite_score(item: &Item, now: DateTime<Utc>) -> f64 {
    let base = (item.priority as f64 / 100.0) * BASE_PRIORITY_WEIGHT;
    let total = base + expiry_score(item, now) + usage_score(item) + zone_criticality(item);
    total.min(100.0)
}

fn expiry_score(item: &Item, now: DateTime<Utc>) -> f64 {
    let Some(expiry) = item.expiry_date else {
        return 0.0;
    };

    let days_to_expiry = (expiry - now).num_days();
    if days_to_expiry <= 0 {
        EXPIRY_WEIGHT
    } else if days_to_expiry <= 7 {
        25.0
    } else if days_to_expiry <= 30 {
        15.0
    } else if days_to_expiry <= 90 {
        5.0
    } else {
        0.0
    }
}

fn usage_score(item: &Item) -> f64 {
    let remaining = item.remaining_uses();
    if remaining == 0 {
        return USAGE_WEIGHT;
    }
    let ratio = remaining as f64 / item.usage_limit as f64;
    if ratio <= 0.1 {
        15.0
    } else if ratio <= 0.25 {
        10.0
    } else if ratio <= 0.5 {
        5.0
    } else {
        0.0
    }
}

fn zone_criticality(item: &Item) -> f64 {
    if item.priority >= 80 {
        ZONE_WEIGHT
    } else if item.priority >= 60 {
        5.0
    } else {
        0.0
    }
}

/// True when an item must not leave its preferred zone: base priority >= 85,
/// expiry within 14 days, or two or fewer uses remaining.
///
/// Such items fall back to other zones only when no same-zone container can
/// fit them in any orientation.
pub fn must_force_preferred_zone(item: &Item, now: DateTime<Utc>) -> bool {
    if item.priority >= 85 {
        return true;
    }
    if let Some(expiry) = item.expiry_date {
        if (expiry - now).num_days() <= 14 {
            return true;
        }
    }
    item.remaining_uses() <= 2
}

/// Retrieval priority: composite urgency minus a difficulty penalty of five
/// points per blocking move. High-priority items pay a reduced penalty so
/// deep-stowed critical cargo still surfaces near the top.
pub fn retrieval_priority(item: &Item, retrieval_steps: usize, now: DateTime<Utc>) -> f64 {
    let mut penalty = retrieval_steps as f64 * 5.0;
    if item.priority >= 90 {
        penalty *= 0.5;
    } else if item.priority >= 70 {
        penalty *= 0.7;
    }
    (composite_score(item, now) - penalty).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn item_with_priority(priority: u8) -> Item {
        let mut item = crate::model::tests::sample_item("000001");
        item.priority = priority;
        item.usage_limit = 100;
        item
    }

    #[test]
    fn score_stays_within_bounds() {
        let mut item = item_with_priority(100);
        item.expiry_date = Some(now() - chrono::Duration::days(1));
        item.current_uses = 100;
        let score = composite_score(&item, now());
        assert!(score <= 100.0);
        // 40 base + 30 expired + 20 depleted + 10 zone, capped.
        assert_eq!(score, 100.0);
    }

    #[test]
    fn expiry_breakpoints() {
        let mut item = item_with_priority(50);
        let cases = [
            (-1, 30.0),
            (3, 25.0),
            (20, 15.0),
            (60, 5.0),
            (200, 0.0),
        ];
        for (days, expected) in cases {
            item.expiry_date = Some(now() + chrono::Duration::days(days));
            assert_eq!(expiry_score(&item, now()), expected, "days={days}");
        }
        item.expiry_date = None;
        assert_eq!(expiry_score(&item, now()), 0.0);
    }

    #[test]
    fn usage_breakpoints() {
        let mut item = item_with_priority(50);
        item.usage_limit = 100;

        item.current_uses = 100;
        assert_eq!(usage_score(&item), 20.0);
        item.current_uses = 95;
        assert_eq!(usage_score(&item), 15.0);
        item.current_uses = 80;
        assert_eq!(usage_score(&item), 10.0);
        item.current_uses = 55;
        assert_eq!(usage_score(&item), 5.0);
        item.current_uses = 10;
        assert_eq!(usage_score(&item), 0.0);
    }

    #[test]
    fn zone_criticality_tracks_base_priority() {
        assert_eq!(zone_criticality(&item_with_priority(85)), 10.0);
        assert_eq!(zone_criticality(&item_with_priority(65)), 5.0);
        assert_eq!(zone_criticality(&item_with_priority(40)), 0.0);
    }

    #[test]
    fn forced_zone_triggers() {
        assert!(must_force_preferred_zone(&item_with_priority(85), now()));
        assert!(!must_force_preferred_zone(&item_with_priority(50), now()));

        let mut expiring = item_with_priority(50);
        expiring.expiry_date = Some(now() + chrono::Duration::days(10));
        assert!(must_force_preferred_zone(&expiring, now()));

        let mut nearly_used_up = item_with_priority(50);
        nearly_used_up.usage_limit = 10;
        nearly_used_up.current_uses = 8;
        assert!(must_force_preferred_zone(&nearly_used_up, now()));
    }

    #[test]
    fn retrieval_priority_discounts_difficulty() {
        let item = item_with_priority(95);
        let shallow = retrieval_priority(&item, 0, now());
        let deep = retrieval_priority(&item, 4, now());
        assert!(shallow > deep);
        // Priority >= 90 halves the per-step penalty.
        assert_eq!(shallow - deep, 4.0 * 5.0 * 0.5);
    }

    #[test]
    fn retrieval_priority_never_negative() {
        let item = item_with_priority(1);
        assert_eq!(retrieval_priority(&item, 50, now()), 0.0);
    }
}
