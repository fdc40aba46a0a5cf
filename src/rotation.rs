//! Orientation generation for rotatable items.
//!
//! Items are rigid axis-aligned boxes, so a rotation is an axis permutation
//! of the item's dimensions. Orientations are ranked by a stability and
//! packing-efficiency heuristic before the placement engine tries them.

use crate::types::{Coords, EPSILON};

/// How many rotations the engine may consider for an item.
///
/// `WidthDepthSwap` exists for downstream validation that only accepts the
/// original orientation and a 90° turn about the vertical axis; it is an
/// explicit mode, not a degraded code path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RotationMode {
    /// All axis permutations (up to six distinct orientations).
    #[default]
    Full,
    /// Original orientation plus width/depth swap; height stays fixed.
    WidthDepthSwap,
}

/// Enumerates the orientations of `dims` for the given mode, best first.
///
/// Duplicates arising from equal dimensions are removed. Ordering is by
/// descending preference score; ties keep the enumeration order, so the
/// result is deterministic for identical inputs.
pub fn orientations(dims: Coords, mode: RotationMode) -> Vec<Coords> {
    let (w, d, h) = (dims.width, dims.depth, dims.height);

    let candidates: Vec<Coords> = match mode {
        RotationMode::WidthDepthSwap => {
            vec![Coords::new(w, d, h), Coords::new(d, w, h)]
        }
        RotationMode::Full => vec![
            Coords::new(w, d, h),
            Coords::new(w, h, d),
            Coords::new(d, w, h),
            Coords::new(d, h, w),
            Coords::new(h, w, d),
            Coords::new(h, d, w),
        ],
    };

    let mut unique: Vec<Coords> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !unique.iter().any(|seen| coords_equal(seen, &candidate)) {
            unique.push(candidate);
        }
    }

    // Stable sort keeps enumeration order for equal scores.
    unique.sort_by(|a, b| {
        preference_score(b)
            .partial_cmp(&preference_score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    unique
}

/// Preference score for one orientation; higher is better.
///
/// Rewards flat, low-center-of-mass orientations with near-square footprints
/// and penalizes long thin slivers that fragment free space.
fn preference_score(o: &Coords) -> f64 {
    stability_score(o) + packing_score(o)
}

fn stability_score(o: &Coords) -> f64 {
    let base_area = o.width * o.depth;
    let stability = base_area / (o.height + 1.0);

    let shorter = o.width.min(o.depth);
    let longer = o.width.max(o.depth);
    let square_bonus = if shorter > 0.0 { shorter / longer } else { 0.0 };

    stability * (1.0 + square_bonus)
}

fn packing_score(o: &Coords) -> f64 {
    let smallest = o.width.min(o.depth).min(o.height);
    let largest = o.width.max(o.depth).max(o.height);
    if largest <= 0.0 {
        return 0.0;
    }
    (smallest / largest) * 100.0
}

/// Checks that `placed` extents are a valid rotation of `original`: the
/// sorted dimension triples must match.
pub fn is_valid_rotation(original: Coords, placed: Coords) -> bool {
    let mut a = [original.width, original.depth, original.height];
    let mut b = [placed.width, placed.depth, placed.height];
    a.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));
    b.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < EPSILON)
}

fn coords_equal(a: &Coords, b: &Coords) -> bool {
    (a.width - b.width).abs() < EPSILON
        && (a.depth - b.depth).abs() < EPSILON
        && (a.height - b.height).abs() < EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_mode_yields_six_for_distinct_dims() {
        let all = orientations(Coords::new(1.0, 2.0, 3.0), RotationMode::Full);
        assert_eq!(all.len(), 6);
        for o in &all {
            assert!(is_valid_rotation(Coords::new(1.0, 2.0, 3.0), *o));
        }
    }

    #[test]
    fn cube_collapses_to_single_orientation() {
        let all = orientations(Coords::new(5.0, 5.0, 5.0), RotationMode::Full);
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn two_equal_dims_deduplicate() {
        let all = orientations(Coords::new(5.0, 5.0, 10.0), RotationMode::Full);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn flat_orientation_ranks_first() {
        // A 10x10 footprint at height 2 beats a 2x10 sliver standing tall.
        let all = orientations(Coords::new(10.0, 2.0, 10.0), RotationMode::Full);
        let best = all[0];
        assert_eq!(best.height, 2.0);
        assert_eq!(best.width, 10.0);
        assert_eq!(best.depth, 10.0);
    }

    #[test]
    fn swap_mode_keeps_height_fixed() {
        let all = orientations(Coords::new(4.0, 7.0, 9.0), RotationMode::WidthDepthSwap);
        assert_eq!(all.len(), 2);
        for o in &all {
            assert_eq!(o.height, 9.0);
        }
        assert!(all.contains(&Coords::new(4.0, 7.0, 9.0)));
        assert!(all.contains(&Coords::new(7.0, 4.0, 9.0)));
    }

    #[test]
    fn swap_mode_is_stable_for_square_footprint() {
        let all = orientations(Coords::new(6.0, 6.0, 3.0), RotationMode::WidthDepthSwap);
        assert_eq!(all, vec![Coords::new(6.0, 6.0, 3.0)]);
    }

    #[test]
    fn rotation_validity_matches_sorted_extents() {
        let original = Coords::new(10.0, 20.0, 30.0);
        assert!(is_valid_rotation(original, Coords::new(30.0, 10.0, 20.0)));
        assert!(!is_valid_rotation(original, Coords::new(30.0, 10.0, 21.0)));
    }

    #[test]
    fn orientation_order_is_deterministic() {
        let a = orientations(Coords::new(3.0, 8.0, 5.0), RotationMode::Full);
        let b = orientations(Coords::new(3.0, 8.0, 5.0), RotationMode::Full);
        assert_eq!(a, b);
    }
}
