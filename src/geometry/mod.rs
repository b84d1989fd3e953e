//! Geometric primitives for positioned spans and glyph samples.
//!
//! Bounding boxes follow the document-pipeline convention of storing the four
//! edges (`left`, `top`, `right`, `bottom`) together with the coordinate origin
//! they were measured in. With a top-left origin `bottom >= top`; with a
//! bottom-left origin the vertical axis is flipped and `top >= bottom`.
//!
//! All area computations clamp negative extents to zero, so disjoint or
//! inverted boxes never produce negative areas.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Vertical origin of a page coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordOrigin {
    /// y grows downwards from the top edge of the page (image convention)
    #[default]
    TopLeft,
    /// y grows upwards from the bottom edge of the page (PDF user space)
    BottomLeft,
}

/// An axis-aligned bounding box in a declared coordinate origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    /// Left edge x-coordinate
    pub left: f32,
    /// Top edge y-coordinate
    pub top: f32,
    /// Right edge x-coordinate
    pub right: f32,
    /// Bottom edge y-coordinate
    pub bottom: f32,
    /// Origin the vertical coordinates are measured from
    #[serde(default)]
    pub origin: CoordOrigin,
}

impl BBox {
    /// Create a top-left-origin box from its edges.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_spacefix::geometry::BBox;
    ///
    /// let bbox = BBox::new(10.0, 20.0, 110.0, 70.0);
    /// assert_eq!(bbox.width(), 100.0);
    /// assert_eq!(bbox.height(), 50.0);
    /// ```
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
            origin: CoordOrigin::TopLeft,
        }
    }

    /// Create a box in an explicit coordinate origin.
    pub fn with_origin(left: f32, top: f32, right: f32, bottom: f32, origin: CoordOrigin) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
            origin,
        }
    }

    /// Horizontal extent, zero for inverted boxes.
    pub fn width(&self) -> f32 {
        (self.right - self.left).max(0.0)
    }

    /// Vertical extent, zero for inverted boxes.
    pub fn height(&self) -> f32 {
        let (lo, hi) = self.vertical_span();
        (hi - lo).max(0.0)
    }

    /// Vertical interval as `(min_y, max_y)` regardless of origin.
    pub fn vertical_span(&self) -> (f32, f32) {
        match self.origin {
            CoordOrigin::TopLeft => (self.top, self.bottom),
            CoordOrigin::BottomLeft => (self.bottom, self.top),
        }
    }

    /// Vertical center in the box's own origin.
    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    /// Whether all four edges are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.right.is_finite()
            && self.bottom.is_finite()
    }

    /// Check that the edges are finite and not inverted for the box's origin.
    ///
    /// Zero-width or zero-height boxes are valid; zero-advance glyphs report
    /// them.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidGeometry` for non-finite or inverted edges.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_spacefix::geometry::{BBox, CoordOrigin};
    ///
    /// assert!(BBox::new(0.0, 10.0, 5.0, 20.0).validate().is_ok());
    /// assert!(BBox::new(5.0, 10.0, 0.0, 20.0).validate().is_err());
    /// assert!(BBox::with_origin(0.0, 20.0, 5.0, 10.0, CoordOrigin::BottomLeft).validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if !self.is_finite() {
            return Err(Error::InvalidGeometry(format!("non-finite edges in {:?}", self)));
        }
        let (lo, hi) = self.vertical_span();
        if self.right < self.left || hi < lo {
            return Err(Error::InvalidGeometry(format!("inverted edges in {:?}", self)));
        }
        Ok(())
    }

    /// Grow the box by `pad` on every side.
    pub fn padded(&self, pad: f32) -> BBox {
        match self.origin {
            CoordOrigin::TopLeft => BBox {
                left: self.left - pad,
                top: self.top - pad,
                right: self.right + pad,
                bottom: self.bottom + pad,
                origin: self.origin,
            },
            CoordOrigin::BottomLeft => BBox {
                left: self.left - pad,
                top: self.top + pad,
                right: self.right + pad,
                bottom: self.bottom - pad,
                origin: self.origin,
            },
        }
    }

    /// Intersect with `bounds` (same origin), returning `None` when the
    /// result has no area.
    pub fn clamp_to(&self, bounds: &BBox) -> Option<BBox> {
        let (lo, hi) = self.vertical_span();
        let (b_lo, b_hi) = bounds.vertical_span();
        let left = self.left.max(bounds.left);
        let right = self.right.min(bounds.right);
        let y0 = lo.max(b_lo);
        let y1 = hi.min(b_hi);
        if right <= left || y1 <= y0 {
            return None;
        }
        let (top, bottom) = match self.origin {
            CoordOrigin::TopLeft => (y0, y1),
            CoordOrigin::BottomLeft => (y1, y0),
        };
        Some(BBox {
            left,
            top,
            right,
            bottom,
            origin: self.origin,
        })
    }

    /// Smallest box containing both boxes (same origin).
    pub fn union(&self, other: &BBox) -> BBox {
        let (lo, hi) = self.vertical_span();
        let (o_lo, o_hi) = other.vertical_span();
        let y0 = lo.min(o_lo);
        let y1 = hi.max(o_hi);
        let (top, bottom) = match self.origin {
            CoordOrigin::TopLeft => (y0, y1),
            CoordOrigin::BottomLeft => (y1, y0),
        };
        BBox {
            left: self.left.min(other.left),
            top,
            right: self.right.max(other.right),
            bottom,
            origin: self.origin,
        }
    }

    /// Convert to a top-left origin by reflecting the vertical axis.
    ///
    /// No-op when the box already uses a top-left origin.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_spacefix::geometry::{BBox, CoordOrigin};
    ///
    /// let pdf_box = BBox::with_origin(10.0, 700.0, 50.0, 680.0, CoordOrigin::BottomLeft);
    /// let image_box = pdf_box.to_top_left(792.0);
    /// assert_eq!(image_box.top, 92.0);
    /// assert_eq!(image_box.bottom, 112.0);
    /// assert_eq!(image_box.origin, CoordOrigin::TopLeft);
    /// ```
    pub fn to_top_left(&self, page_height: f32) -> BBox {
        match self.origin {
            CoordOrigin::TopLeft => *self,
            CoordOrigin::BottomLeft => BBox {
                left: self.left,
                top: page_height - self.top,
                right: self.right,
                bottom: page_height - self.bottom,
                origin: CoordOrigin::TopLeft,
            },
        }
    }

    /// Convert to a bottom-left origin; inverse of [`BBox::to_top_left`].
    pub fn to_bottom_left(&self, page_height: f32) -> BBox {
        match self.origin {
            CoordOrigin::BottomLeft => *self,
            CoordOrigin::TopLeft => BBox {
                left: self.left,
                top: page_height - self.top,
                right: self.right,
                bottom: page_height - self.bottom,
                origin: CoordOrigin::BottomLeft,
            },
        }
    }

    /// Convert into `origin`, a no-op when already there.
    pub fn to_origin(&self, origin: CoordOrigin, page_height: f32) -> BBox {
        match origin {
            CoordOrigin::TopLeft => self.to_top_left(page_height),
            CoordOrigin::BottomLeft => self.to_bottom_left(page_height),
        }
    }
}

/// Area of a box; zero for degenerate boxes.
pub fn area(bbox: &BBox) -> f32 {
    bbox.width() * bbox.height()
}

/// Area shared by two boxes measured in the same origin; zero when disjoint.
///
/// # Examples
///
/// ```
/// use pdf_spacefix::geometry::{intersection_area, BBox};
///
/// let a = BBox::new(0.0, 0.0, 10.0, 10.0);
/// let b = BBox::new(5.0, 5.0, 15.0, 15.0);
/// let c = BBox::new(20.0, 20.0, 30.0, 30.0);
/// assert_eq!(intersection_area(&a, &b), 25.0);
/// assert_eq!(intersection_area(&a, &c), 0.0);
/// ```
pub fn intersection_area(a: &BBox, b: &BBox) -> f32 {
    let (a_lo, a_hi) = a.vertical_span();
    let (b_lo, b_hi) = b.vertical_span();
    let width = (a.right.min(b.right) - a.left.max(b.left)).max(0.0);
    let height = (a_hi.min(b_hi) - a_lo.max(b_lo)).max(0.0);
    width * height
}

/// Fraction of `a` covered by `b`; zero when `a` has no area.
pub fn overlap_ratio(a: &BBox, b: &BBox) -> f32 {
    let area_a = area(a);
    if area_a <= 0.0 {
        return 0.0;
    }
    intersection_area(a, b) / area_a
}

/// Median of a sample, or `default` when the sample is empty.
pub fn median(values: &[f32], default: f32) -> f32 {
    if values.is_empty() {
        return default;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| crate::utils::safe_float_cmp(*a, *b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_creation() {
        let b = BBox::new(5.0, 10.0, 105.0, 60.0);
        assert_eq!(b.left, 5.0);
        assert_eq!(b.top, 10.0);
        assert_eq!(b.width(), 100.0);
        assert_eq!(b.height(), 50.0);
        assert_eq!(b.origin, CoordOrigin::TopLeft);
    }

    #[test]
    fn test_bottom_left_height() {
        let b = BBox::with_origin(0.0, 100.0, 10.0, 80.0, CoordOrigin::BottomLeft);
        assert_eq!(b.height(), 20.0);
        assert_eq!(b.vertical_span(), (80.0, 100.0));
    }

    #[test]
    fn test_inverted_box_has_zero_area() {
        let b = BBox::new(10.0, 10.0, 0.0, 0.0);
        assert_eq!(area(&b), 0.0);
    }

    #[test]
    fn test_overlap_ratio() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(0.0, 0.0, 5.0, 10.0);
        assert_eq!(overlap_ratio(&a, &b), 0.5);
        assert_eq!(overlap_ratio(&b, &a), 1.0);
    }

    #[test]
    fn test_overlap_ratio_zero_area() {
        let a = BBox::new(0.0, 0.0, 0.0, 10.0);
        let b = BBox::new(0.0, 0.0, 5.0, 10.0);
        assert_eq!(overlap_ratio(&a, &b), 0.0);
    }

    #[test]
    fn test_intersection_mixed_vertical_layouts() {
        let a = BBox::with_origin(0.0, 20.0, 10.0, 0.0, CoordOrigin::BottomLeft);
        let b = BBox::with_origin(5.0, 30.0, 15.0, 10.0, CoordOrigin::BottomLeft);
        assert_eq!(intersection_area(&a, &b), 50.0);
    }

    #[test]
    fn test_origin_round_trip() {
        let b = BBox::new(10.0, 100.0, 40.0, 120.0);
        let flipped = b.to_bottom_left(800.0);
        assert_eq!(flipped.top, 700.0);
        assert_eq!(flipped.bottom, 680.0);
        assert_eq!(flipped.to_top_left(800.0), b);
        // Already in target origin
        assert_eq!(b.to_top_left(800.0), b);
    }

    #[test]
    fn test_padded_and_clamped() {
        let page = BBox::new(0.0, 0.0, 100.0, 100.0);
        let b = BBox::new(0.5, 10.0, 20.0, 20.0).padded(1.0);
        let clipped = b.clamp_to(&page).unwrap();
        assert_eq!(clipped.left, 0.0);
        assert_eq!(clipped.top, 9.0);
        assert_eq!(clipped.right, 21.0);
    }

    #[test]
    fn test_clamp_outside_page_is_none() {
        let page = BBox::new(0.0, 0.0, 100.0, 100.0);
        let b = BBox::new(150.0, 10.0, 170.0, 20.0);
        assert!(b.clamp_to(&page).is_none());
    }

    #[test]
    fn test_validate_rejects_inverted_and_non_finite() {
        assert!(BBox::new(0.0, 0.0, 0.0, 8.0).validate().is_ok());
        assert!(matches!(
            BBox::new(0.0, 20.0, 10.0, 10.0).validate(),
            Err(Error::InvalidGeometry(_))
        ));
        assert!(BBox::with_origin(0.0, 10.0, 10.0, 20.0, CoordOrigin::BottomLeft)
            .validate()
            .is_err());
        assert!(BBox::new(f32::NAN, 0.0, 10.0, 10.0).validate().is_err());
        assert!(BBox::new(0.0, 0.0, f32::INFINITY, 10.0).validate().is_err());
    }

    #[test]
    fn test_union() {
        let a = BBox::new(0.0, 0.0, 50.0, 50.0);
        let b = BBox::new(25.0, 25.0, 75.0, 75.0);
        let u = a.union(&b);
        assert_eq!(u, BBox::new(0.0, 0.0, 75.0, 75.0));
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[], 1.0), 1.0);
        assert_eq!(median(&[3.0, 1.0, 2.0], 0.0), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0], 0.0), 2.5);
    }
}
