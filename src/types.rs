//! Common spatial types for the stowage core.
//!
//! All geometry uses the container coordinate convention: `width` and
//! `height` span the open face, `depth` extends away from the opening, so
//! `depth = 0` is the most accessible plane of a container.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Numerical tolerance for geometric comparisons.
///
/// Overlap and containment tests accept deviations up to this value so that
/// placements produced by floating-point arithmetic never self-report as
/// colliding.
pub const EPSILON: f64 = 1e-5;

/// A point or extent in container space.
///
/// # Examples
/// ```
/// use stowkeeper::types::Coords;
///
/// let start = Coords::new(0.0, 0.0, 0.0);
/// let size = Coords::new(10.0, 10.0, 20.0);
/// assert_eq!(size.volume(), 2000.0);
/// assert_eq!(start.offset(size).depth, 10.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coords {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl Coords {
    #[inline]
    pub const fn new(width: f64, depth: f64, height: f64) -> Self {
        Self {
            width,
            depth,
            height,
        }
    }

    /// The origin of a container's coordinate frame.
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Product of all three components; meaningful for extent vectors.
    #[inline]
    pub fn volume(&self) -> f64 {
        self.width * self.depth * self.height
    }

    /// Component-wise sum, used to derive an end corner from start + size.
    #[inline]
    pub fn offset(&self, size: Coords) -> Self {
        Self::new(
            self.width + size.width,
            self.depth + size.depth,
            self.height + size.height,
        )
    }

    /// Checks that all components are positive and finite.
    #[inline]
    pub fn is_valid_dimension(&self) -> bool {
        self.width > 0.0
            && self.depth > 0.0
            && self.height > 0.0
            && self.width.is_finite()
            && self.depth.is_finite()
            && self.height.is_finite()
    }

    /// Component-wise fit test with tolerance (self <= outer on every axis).
    #[inline]
    pub fn fits_within(&self, outer: &Self, tolerance: f64) -> bool {
        self.width <= outer.width + tolerance
            && self.depth <= outer.depth + tolerance
            && self.height <= outer.height + tolerance
    }
}

impl From<(f64, f64, f64)> for Coords {
    #[inline]
    fn from(t: (f64, f64, f64)) -> Self {
        Self::new(t.0, t.1, t.2)
    }
}

/// Axis-aligned bounding box expressed as start/end corners.
///
/// `end` is strictly greater than `start` on every axis for any box that
/// represents a placed item.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BoundingBox {
    #[serde(rename = "startCoordinates")]
    pub start: Coords,
    #[serde(rename = "endCoordinates")]
    pub end: Coords,
}

impl BoundingBox {
    #[inline]
    pub const fn new(start: Coords, end: Coords) -> Self {
        Self { start, end }
    }

    /// Builds a box from its start corner and extent.
    #[inline]
    pub fn from_origin_and_size(origin: Coords, size: Coords) -> Self {
        Self {
            start: origin,
            end: origin.offset(size),
        }
    }

    /// Extent of the box on each axis.
    #[inline]
    pub fn extents(&self) -> Coords {
        Coords::new(
            self.end.width - self.start.width,
            self.end.depth - self.start.depth,
            self.end.height - self.start.height,
        )
    }

    #[inline]
    pub fn volume(&self) -> f64 {
        self.extents().volume()
    }

    /// Epsilon-tolerant overlap test via three-axis separation.
    ///
    /// Symmetric; boxes that only share a face do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        !(self.end.width <= other.start.width + EPSILON
            || self.start.width >= other.end.width - EPSILON
            || self.end.depth <= other.start.depth + EPSILON
            || self.start.depth >= other.end.depth - EPSILON
            || self.end.height <= other.start.height + EPSILON
            || self.start.height >= other.end.height - EPSILON)
    }

    /// Checks the box lies fully inside a container of the given dimensions.
    #[inline]
    pub fn fits_inside(&self, container: &Coords) -> bool {
        self.start.width >= -EPSILON
            && self.end.width <= container.width + EPSILON
            && self.start.depth >= -EPSILON
            && self.end.depth <= container.depth + EPSILON
            && self.start.height >= -EPSILON
            && self.end.height <= container.height + EPSILON
    }

    /// Overlap test restricted to the open-face (width/height) plane.
    ///
    /// Used by the retrieval engine: an item in front of another only blocks
    /// it when their open-face projections intersect.
    #[inline]
    pub fn overlaps_open_face(&self, other: &Self) -> bool {
        let width_overlap = !(self.end.width <= other.start.width + EPSILON
            || self.start.width >= other.end.width - EPSILON);
        let height_overlap = !(self.end.height <= other.start.height + EPSILON
            || self.start.height >= other.end.height - EPSILON);
        width_overlap && height_overlap
    }
}

/// Trait for objects with three spatial dimensions.
pub trait Dimensional {
    /// Returns the dimensions of the object.
    fn dimensions(&self) -> Coords;

    /// Calculates the volume.
    fn volume(&self) -> f64 {
        self.dimensions().volume()
    }

    /// Checks whether this object fits in the given outer dimensions in its
    /// current orientation.
    fn fits_in(&self, outer: &Coords) -> bool {
        self.dimensions().fits_within(outer, EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(start: (f64, f64, f64), size: (f64, f64, f64)) -> BoundingBox {
        BoundingBox::from_origin_and_size(start.into(), size.into())
    }

    #[test]
    fn overlap_is_symmetric() {
        let a = boxed((0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let b = boxed((5.0, 5.0, 5.0), (10.0, 10.0, 10.0));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn face_touching_boxes_do_not_overlap() {
        let a = boxed((0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let b = boxed((10.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn disjoint_boxes_do_not_overlap() {
        let a = boxed((0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let b = boxed((20.0, 20.0, 20.0), (5.0, 5.0, 5.0));
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn containment_respects_all_axes() {
        let container = Coords::new(100.0, 85.0, 200.0);
        let inside = boxed((0.0, 0.0, 0.0), (10.0, 10.0, 20.0));
        let poking_out = boxed((95.0, 0.0, 0.0), (10.0, 10.0, 20.0));
        assert!(inside.fits_inside(&container));
        assert!(!poking_out.fits_inside(&container));
    }

    #[test]
    fn open_face_projection_ignores_depth() {
        let front = boxed((0.0, 0.0, 0.0), (10.0, 5.0, 10.0));
        let behind = boxed((0.0, 40.0, 0.0), (10.0, 5.0, 10.0));
        let beside = boxed((20.0, 40.0, 0.0), (10.0, 5.0, 10.0));
        assert!(front.overlaps_open_face(&behind));
        assert!(!front.overlaps_open_face(&beside));
    }

    #[test]
    fn open_face_slivers_within_tolerance_do_not_overlap() {
        let front = boxed((0.0, 0.0, 0.0), (10.0, 5.0, 10.0));
        // Projection overlap of 1e-9 on the width axis is numerical noise,
        // not a blocking relationship.
        let sliver = boxed((10.0 - 1e-9, 40.0, 0.0), (10.0, 5.0, 10.0));
        assert!(!front.overlaps_open_face(&sliver));
    }

    #[test]
    fn extents_recover_size() {
        let b = boxed((3.0, 4.0, 5.0), (10.0, 20.0, 30.0));
        assert_eq!(b.extents(), Coords::new(10.0, 20.0, 30.0));
        assert!((b.volume() - 6000.0).abs() < EPSILON);
    }

    #[test]
    fn dimension_validity() {
        assert!(Coords::new(1.0, 2.0, 3.0).is_valid_dimension());
        assert!(!Coords::new(0.0, 2.0, 3.0).is_valid_dimension());
        assert!(!Coords::new(1.0, -2.0, 3.0).is_valid_dimension());
        assert!(!Coords::new(1.0, f64::NAN, 3.0).is_valid_dimension());
    }
}
