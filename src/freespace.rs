//! Per-container free-space tracking.
//!
//! Each container gets one `ContainerSpace` holding the placed extents and a
//! set of free boxes covering the unoccupied volume. The free set is an
//! over-approximation, not an exact partition: correctness comes from
//! `can_place` re-checking bounds and collisions against the placed extents,
//! so sloppy free-space bookkeeping can only cost packing quality, never
//! produce an overlap.

use crate::types::{BoundingBox, Coords};

/// How residual free space is carved out of a free box after a placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SplitStrategy {
    /// Two residuals, left and right of the placement along the open face.
    /// Fast and coarse; the default.
    #[default]
    LeadingEdge,
    /// Up to six residuals (left/right/front/back/below/above). Higher
    /// fidelity, more fragmentation.
    SixWay,
}

/// Tunables of the position search and free-space bookkeeping.
///
/// The corner set, probe cap and free-box cap are deliberate
/// optimality/latency trade-offs; they bound every search by construction.
#[derive(Clone, Copy, Debug)]
pub struct SpaceTuning {
    /// Lower bound of the coarse grid step; the actual step is the larger of
    /// this and the item's in-plane dimensions.
    pub grid_step_floor: f64,
    /// Maximum grid positions probed in the fallback scan.
    pub grid_probe_cap: usize,
    /// Maximum retained free boxes per container; smallest are discarded.
    pub free_box_cap: usize,
    /// Residual free boxes below this volume are dropped outright.
    pub min_residual_volume: f64,
    pub split_strategy: SplitStrategy,
}

impl SpaceTuning {
    pub const DEFAULT_GRID_STEP_FLOOR: f64 = 10.0;
    pub const DEFAULT_GRID_PROBE_CAP: usize = 100;
    pub const DEFAULT_FREE_BOX_CAP: usize = 50;
    pub const DEFAULT_MIN_RESIDUAL_VOLUME: f64 = 10.0;
}

impl Default for SpaceTuning {
    fn default() -> Self {
        Self {
            grid_step_floor: Self::DEFAULT_GRID_STEP_FLOOR,
            grid_probe_cap: Self::DEFAULT_GRID_PROBE_CAP,
            free_box_cap: Self::DEFAULT_FREE_BOX_CAP,
            min_residual_volume: Self::DEFAULT_MIN_RESIDUAL_VOLUME,
            split_strategy: SplitStrategy::default(),
        }
    }
}

/// An unoccupied rectangular sub-volume of one container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FreeSpace {
    pub origin: Coords,
    pub size: Coords,
}

impl FreeSpace {
    #[inline]
    pub fn new(origin: Coords, size: Coords) -> Self {
        Self { origin, size }
    }

    #[inline]
    pub fn volume(&self) -> f64 {
        self.size.volume()
    }

    /// Structural fit: the extent fits without rotation.
    #[inline]
    pub fn can_fit(&self, size: Coords) -> bool {
        size.width <= self.size.width
            && size.depth <= self.size.depth
            && size.height <= self.size.height
    }

    #[inline]
    pub fn as_box(&self) -> BoundingBox {
        BoundingBox::from_origin_and_size(self.origin, self.size)
    }
}

/// One committed extent inside a container.
#[derive(Clone, Debug)]
pub struct PlacedExtent {
    pub item_id: String,
    pub bounds: BoundingBox,
}

/// Spatial state of a single container during a placement run.
///
/// Exclusively owned by one placement engine instance; concurrent passes
/// over the same container require external serialization.
#[derive(Clone, Debug)]
pub struct ContainerSpace {
    container_id: String,
    dims: Coords,
    placed: Vec<PlacedExtent>,
    free: Vec<FreeSpace>,
    used_volume: f64,
    tuning: SpaceTuning,
}

impl ContainerSpace {
    /// Creates the tracker with one free box spanning the whole container.
    pub fn new(container_id: impl Into<String>, dims: Coords, tuning: SpaceTuning) -> Self {
        Self {
            container_id: container_id.into(),
            dims,
            placed: Vec::new(),
            free: vec![FreeSpace::new(Coords::zero(), dims)],
            used_volume: 0.0,
            tuning,
        }
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn dims(&self) -> Coords {
        self.dims
    }

    pub fn placed(&self) -> &[PlacedExtent] {
        &self.placed
    }

    pub fn utilization_percent(&self) -> f64 {
        let total = self.dims.volume();
        if total <= 0.0 {
            return 0.0;
        }
        (self.used_volume / total) * 100.0
    }

    pub fn largest_free_space(&self) -> Option<&FreeSpace> {
        self.free
            .iter()
            .max_by(|a, b| a.volume().total_cmp(&b.volume()))
    }

    /// Bounds-contained and collision-free against every placed extent.
    pub fn can_place(&self, bounds: &BoundingBox) -> bool {
        bounds.fits_inside(&self.dims)
            && !self.placed.iter().any(|p| p.bounds.overlaps(bounds))
    }

    /// Finds an origin for an extent of the given size, or `None`.
    ///
    /// Search order is deterministic and accessibility-biased: the four
    /// floor corners first, then free boxes in insertion order, then a
    /// coarse bounded grid scan.
    pub fn find_position(&self, size: Coords) -> Option<Coords> {
        if !size.fits_within(&self.dims, crate::types::EPSILON) {
            return None;
        }

        for corner in self.floor_corners(size) {
            let candidate = BoundingBox::from_origin_and_size(corner, size);
            if self.can_place(&candidate) {
                return Some(corner);
            }
        }

        for space in &self.free {
            if space.can_fit(size) {
                let candidate = BoundingBox::from_origin_and_size(space.origin, size);
                if self.can_place(&candidate) {
                    return Some(space.origin);
                }
            }
        }

        self.grid_scan(size)
    }

    /// The four floor-corner origins, most accessible first.
    fn floor_corners(&self, size: Coords) -> [Coords; 4] {
        let far_width = (self.dims.width - size.width).max(0.0);
        let far_depth = (self.dims.depth - size.depth).max(0.0);
        [
            Coords::zero(),
            Coords::new(far_width, 0.0, 0.0),
            Coords::new(0.0, far_depth, 0.0),
            Coords::new(far_width, far_depth, 0.0),
        ]
    }

    /// Coarse grid fallback, bounded by the probe cap. Trades packing
    /// optimality for guaranteed termination on large catalogs.
    fn grid_scan(&self, size: Coords) -> Option<Coords> {
        let step = self
            .tuning
            .grid_step_floor
            .max(size.width)
            .max(size.depth);
        let max_width = (self.dims.width - size.width).max(0.0);
        let max_depth = (self.dims.depth - size.depth).max(0.0);
        let max_height = (self.dims.height - size.height).max(0.0);

        let height_planes: Vec<f64> = if max_height > 0.0 {
            vec![0.0, max_height * 0.5, max_height]
        } else {
            vec![0.0]
        };

        let mut probes = 0usize;
        for &height in &height_planes {
            let mut depth = 0.0;
            while depth <= max_depth {
                let mut width = 0.0;
                while width <= max_width {
                    if probes >= self.tuning.grid_probe_cap {
                        return None;
                    }
                    probes += 1;

                    let origin = Coords::new(width, depth, height);
                    let candidate = BoundingBox::from_origin_and_size(origin, size);
                    if self.can_place(&candidate) {
                        return Some(origin);
                    }
                    width += step;
                }
                depth += step;
            }
        }
        None
    }

    /// Commits an extent at `origin` and regenerates the free-space set.
    ///
    /// Returns `false` without mutating anything when `can_place` fails.
    pub fn place(&mut self, item_id: impl Into<String>, origin: Coords, size: Coords) -> bool {
        let bounds = BoundingBox::from_origin_and_size(origin, size);
        if !self.can_place(&bounds) {
            return false;
        }

        self.used_volume += bounds.volume();
        self.placed.push(PlacedExtent {
            item_id: item_id.into(),
            bounds,
        });
        self.carve_free_spaces(&bounds);
        true
    }

    fn carve_free_spaces(&mut self, placed: &BoundingBox) {
        let mut next: Vec<FreeSpace> = Vec::with_capacity(self.free.len() + 4);

        for space in &self.free {
            if !space.as_box().overlaps(placed) {
                next.push(*space);
                continue;
            }

            let residuals = match self.tuning.split_strategy {
                SplitStrategy::LeadingEdge => split_leading_edge(space, placed),
                SplitStrategy::SixWay => split_six_way(space, placed),
            };
            next.extend(
                residuals
                    .into_iter()
                    .filter(|r| r.volume() > self.tuning.min_residual_volume),
            );
        }

        // Fragmentation bound: keep only the largest boxes.
        if next.len() > self.tuning.free_box_cap {
            next.sort_by(|a, b| b.volume().total_cmp(&a.volume()));
            next.truncate(self.tuning.free_box_cap);
        }
        self.free = next;
    }
}

/// Two residuals left/right of the placement along the width axis.
fn split_leading_edge(space: &FreeSpace, placed: &BoundingBox) -> Vec<FreeSpace> {
    let mut residuals = Vec::with_capacity(2);
    let space_end_width = space.origin.width + space.size.width;

    if placed.start.width > space.origin.width {
        residuals.push(FreeSpace::new(
            space.origin,
            Coords::new(
                placed.start.width - space.origin.width,
                space.size.depth,
                space.size.height,
            ),
        ));
    }
    if space_end_width > placed.end.width {
        residuals.push(FreeSpace::new(
            Coords::new(placed.end.width, space.origin.depth, space.origin.height),
            Coords::new(
                space_end_width - placed.end.width,
                space.size.depth,
                space.size.height,
            ),
        ));
    }
    residuals
}

/// Up to six residuals surrounding the placement.
fn split_six_way(space: &FreeSpace, placed: &BoundingBox) -> Vec<FreeSpace> {
    let mut residuals = Vec::with_capacity(6);
    let end = space.origin.offset(space.size);

    // Left / right along the width axis.
    if placed.start.width > space.origin.width {
        residuals.push(FreeSpace::new(
            space.origin,
            Coords::new(
                placed.start.width - space.origin.width,
                space.size.depth,
                space.size.height,
            ),
        ));
    }
    if end.width > placed.end.width {
        residuals.push(FreeSpace::new(
            Coords::new(placed.end.width, space.origin.depth, space.origin.height),
            Coords::new(end.width - placed.end.width, space.size.depth, space.size.height),
        ));
    }

    // Front / back along the depth axis.
    if placed.start.depth > space.origin.depth {
        residuals.push(FreeSpace::new(
            space.origin,
            Coords::new(
                space.size.width,
                placed.start.depth - space.origin.depth,
                space.size.height,
            ),
        ));
    }
    if end.depth > placed.end.depth {
        residuals.push(FreeSpace::new(
            Coords::new(space.origin.width, placed.end.depth, space.origin.height),
            Coords::new(space.size.width, end.depth - placed.end.depth, space.size.height),
        ));
    }

    // Below / above along the height axis.
    if placed.start.height > space.origin.height {
        residuals.push(FreeSpace::new(
            space.origin,
            Coords::new(
                space.size.width,
                space.size.depth,
                placed.start.height - space.origin.height,
            ),
        ));
    }
    if end.height > placed.end.height {
        residuals.push(FreeSpace::new(
            Coords::new(space.origin.width, space.origin.depth, placed.end.height),
            Coords::new(space.size.width, space.size.depth, end.height - placed.end.height),
        ));
    }

    residuals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_container(side: f64) -> ContainerSpace {
        ContainerSpace::new("contA", Coords::new(side, side, side), SpaceTuning::default())
    }

    #[test]
    fn empty_container_places_at_origin() {
        let space = cube_container(100.0);
        let pos = space.find_position(Coords::new(10.0, 10.0, 20.0));
        assert_eq!(pos, Some(Coords::zero()));
    }

    #[test]
    fn second_item_takes_next_floor_corner() {
        let mut space = cube_container(100.0);
        let size = Coords::new(10.0, 10.0, 10.0);
        assert!(space.place("000001", Coords::zero(), size));

        let pos = space.find_position(size).expect("second position");
        assert_eq!(pos, Coords::new(90.0, 0.0, 0.0));
    }

    #[test]
    fn oversized_item_finds_no_position() {
        let space = cube_container(50.0);
        assert!(space.find_position(Coords::new(60.0, 10.0, 10.0)).is_none());
    }

    #[test]
    fn two_sixty_cubes_exhaust_a_hundred_cube() {
        let mut space = cube_container(100.0);
        let size = Coords::new(60.0, 60.0, 60.0);

        let first = space.find_position(size).expect("first cube fits");
        assert!(space.place("000001", first, size));
        assert!(space.find_position(size).is_none());
    }

    #[test]
    fn place_rejects_collisions_without_mutation() {
        let mut space = cube_container(100.0);
        let size = Coords::new(60.0, 60.0, 60.0);
        assert!(space.place("000001", Coords::zero(), size));

        let placed_before = space.placed().len();
        assert!(!space.place("000002", Coords::new(30.0, 30.0, 0.0), size));
        assert_eq!(space.placed().len(), placed_before);
    }

    #[test]
    fn place_rejects_out_of_bounds() {
        let mut space = cube_container(50.0);
        assert!(!space.place(
            "000001",
            Coords::new(45.0, 0.0, 0.0),
            Coords::new(10.0, 10.0, 10.0)
        ));
    }

    #[test]
    fn used_volume_tracks_placements() {
        let mut space = cube_container(100.0);
        space.place("000001", Coords::zero(), Coords::new(10.0, 10.0, 10.0));
        assert!((space.utilization_percent() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn six_way_split_keeps_residuals_on_all_axes() {
        let tuning = SpaceTuning {
            split_strategy: SplitStrategy::SixWay,
            ..SpaceTuning::default()
        };
        let mut space = ContainerSpace::new("contA", Coords::new(100.0, 100.0, 100.0), tuning);
        assert!(space.place("000001", Coords::zero(), Coords::new(40.0, 40.0, 40.0)));

        // Placement at the origin leaves right, back and above residuals.
        assert_eq!(space.free.len(), 3);
        let total_free: f64 = space.free.iter().map(|f| f.volume()).sum();
        assert!(total_free > 0.0);
        for free in &space.free {
            assert!(!free.as_box().overlaps(&BoundingBox::from_origin_and_size(
                Coords::zero(),
                Coords::new(40.0, 40.0, 40.0)
            )));
        }
    }

    #[test]
    fn free_box_cap_discards_smallest() {
        let tuning = SpaceTuning {
            free_box_cap: 4,
            split_strategy: SplitStrategy::SixWay,
            min_residual_volume: 0.0,
            ..SpaceTuning::default()
        };
        let mut space = ContainerSpace::new("contA", Coords::new(100.0, 100.0, 100.0), tuning);
        for i in 0..6 {
            let origin = Coords::new((i % 2) as f64 * 50.0, (i / 2) as f64 * 30.0, 0.0);
            space.place(format!("{i:06}"), origin, Coords::new(10.0, 10.0, 10.0));
        }
        assert!(space.free.len() <= 4);
    }

    #[test]
    fn no_placed_pair_overlaps_after_many_placements() {
        let mut space = cube_container(100.0);
        let size = Coords::new(25.0, 25.0, 25.0);
        let mut id = 0;
        while let Some(pos) = space.find_position(size) {
            assert!(space.place(format!("{id:06}"), pos, size));
            id += 1;
            if id > 64 {
                break;
            }
        }
        assert!(id >= 4, "expected at least the four floor corners, got {id}");

        for (i, a) in space.placed().iter().enumerate() {
            for b in space.placed().iter().skip(i + 1) {
                assert!(
                    !a.bounds.overlaps(&b.bounds),
                    "{} overlaps {}",
                    a.item_id,
                    b.item_id
                );
            }
        }
    }
}
