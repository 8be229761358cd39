//!
//! # Geometric Primitives
//!
//! Integer [GdsPoint]s, affine [GdsTransform]s, and axis-aligned [GdsBBox]es.
//!

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local Imports
use crate::error::{GdsError, GdsResult};

/// # Gds Spatial Point
/// Coordinate in (x,y) layout-space.
/// Denoted in each [crate::GdsLibrary]'s [crate::GdsUnits].
#[derive(Default, Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct GdsPoint {
    pub x: i32,
    pub y: i32,
}
impl GdsPoint {
    /// Create a new [GdsPoint]
    pub fn new(x: i32, y: i32) -> Self {
        GdsPoint { x, y }
    }
    /// Create a vector of [GdsPoint] from an array of tuples
    pub fn vec(pts: &[(i32, i32)]) -> Vec<Self> {
        pts.iter().map(|pt| Self::new(pt.0, pt.1)).collect()
    }
    /// Create a [GdsPoint] from wide coordinates, if both fit in `i32`
    pub(crate) fn checked(x: i64, y: i64) -> Option<Self> {
        Some(Self::new(i32::try_from(x).ok()?, i32::try_from(y).ok()?))
    }
    /// Convert an n-element slice of `i32` into an n/2-element vector of [GdsPoint]s.
    pub(crate) fn parse_vec(from: &[i32]) -> GdsResult<Vec<GdsPoint>> {
        if from.len() % 2 != 0 {
            return Err(GdsError::Str(
                "GdsPoint coordinate vector: Invalid number of elements".into(),
            ));
        }
        Ok(from
            .chunks_exact(2)
            .map(|c| GdsPoint::new(c[0], c[1]))
            .collect())
    }
    /// Convert a slice of [GdsPoint]s to a flat, x-then-y `i32` vector.
    pub(crate) fn flatten_vec(src: &[GdsPoint]) -> Vec<i32> {
        src.iter().flat_map(|pt| [pt.x, pt.y]).collect()
    }
}

/// # Affine Transform
///
/// 2x2 transformation-matrix `a` and two-entry translation vector `b`,
/// mapping each point `p` to `a·p + b`.
/// Equivalent to a homogeneous 3x3 matrix with its constant last row elided.
///
/// The matrix is represented in row-major order, such that
/// `x' = a[0][0]·x + a[0][1]·y + b[0]` and `y' = a[1][0]·x + a[1][1]·y + b[1]`.
///
/// Each of [GdsTransform::scale], [GdsTransform::rotate], and [GdsTransform::translate]
/// composes *after* the transform built so far, so that a chain of calls
/// applies to points in the order written.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GdsTransform {
    /// Transformation Matrix, row-major
    pub a: [[f64; 2]; 2],
    /// X-Y Translation
    pub b: [f64; 2],
}
impl GdsTransform {
    /// The identity transform, leaving any transformed object unmodified
    pub fn identity() -> Self {
        Self {
            a: [[1., 0.], [0., 1.]],
            b: [0., 0.],
        }
    }
    /// Scale by `sx` in x and `sy` in y.
    /// `scale(1., -1.)` reflects about the x-axis.
    pub fn scale(self, sx: f64, sy: f64) -> Self {
        self.then(&[[sx, 0.], [0., sy]], [0., 0.])
    }
    /// Rotate counter-clockwise by `angle` degrees
    pub fn rotate(self, angle: f64) -> Self {
        let (sin, cos) = angle.to_radians().sin_cos();
        self.then(&[[cos, -sin], [sin, cos]], [0., 0.])
    }
    /// Translate by (x,y)
    pub fn translate(self, x: f64, y: f64) -> Self {
        self.then(&[[1., 0.], [0., 1.]], [x, y])
    }
    /// Compose the affine map `(m, t)` after ourselves
    fn then(self, m: &[[f64; 2]; 2], t: [f64; 2]) -> Self {
        let a = &self.a;
        let b = &self.b;
        Self {
            a: [
                [
                    m[0][0] * a[0][0] + m[0][1] * a[1][0],
                    m[0][0] * a[0][1] + m[0][1] * a[1][1],
                ],
                [
                    m[1][0] * a[0][0] + m[1][1] * a[1][0],
                    m[1][0] * a[0][1] + m[1][1] * a[1][1],
                ],
            ],
            b: [
                m[0][0] * b[0] + m[0][1] * b[1] + t[0],
                m[1][0] * b[0] + m[1][1] * b[1] + t[1],
            ],
        }
    }
    /// Map [GdsPoint] `pt` through the full transform, translation included.
    /// Arithmetic is performed in floating-point, and rounded to the nearest integer.
    pub fn map(&self, pt: &GdsPoint) -> GdsPoint {
        let xf = pt.x as f64;
        let yf = pt.y as f64;
        let x = self.a[0][0] * xf + self.a[0][1] * yf + self.b[0];
        let y = self.a[1][0] * xf + self.a[1][1] * yf + self.b[1];
        GdsPoint::new(x.round() as i32, y.round() as i32)
    }
    /// Map [GdsPoint] `pt` as in [GdsTransform::map],
    /// returning `None` if the result falls outside the `i32` coordinate range.
    pub fn try_map(&self, pt: &GdsPoint) -> Option<GdsPoint> {
        let xf = pt.x as f64;
        let yf = pt.y as f64;
        let x = (self.a[0][0] * xf + self.a[0][1] * yf + self.b[0]).round();
        let y = (self.a[1][0] * xf + self.a[1][1] * yf + self.b[1]).round();
        let range = i32::MIN as f64..=i32::MAX as f64;
        if !range.contains(&x) || !range.contains(&y) {
            return None;
        }
        Some(GdsPoint::new(x as i32, y as i32))
    }
}
impl Default for GdsTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// # Rectangular Bounding Box
///
/// Points `p0` and `p1` represent opposite corners of a bounding rectangle.
/// `p0` is always closest to negative-infinity, in both x and y,
/// and `p1` is always closest to positive-infinity.
///
/// Boxes are never empty; the absence of a box is represented as `Option::None`.
///
#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct GdsBBox {
    pub p0: GdsPoint,
    pub p1: GdsPoint,
}
impl GdsBBox {
    /// Create a new [GdsBBox] from a single [GdsPoint], having zero area
    pub fn from_point(pt: &GdsPoint) -> Self {
        Self { p0: *pt, p1: *pt }
    }
    /// Create the smallest [GdsBBox] enclosing all `pts`.
    /// Returns `None` if `pts` is empty.
    pub fn from_points<'a>(pts: impl IntoIterator<Item = &'a GdsPoint>) -> Option<Self> {
        let mut pts = pts.into_iter();
        let first = Self::from_point(pts.next()?);
        Some(pts.fold(first, |bbox, pt| bbox.union(&Self::from_point(pt))))
    }
    /// Union with [GdsBBox] `other`
    pub fn union(&self, other: &GdsBBox) -> GdsBBox {
        GdsBBox {
            p0: GdsPoint::new(self.p0.x.min(other.p0.x), self.p0.y.min(other.p0.y)),
            p1: GdsPoint::new(self.p1.x.max(other.p1.x), self.p1.y.max(other.p1.y)),
        }
    }
    /// Boolean indication of whether [GdsPoint] `pt` lies inside our box, inclusive of its edges
    pub fn contains(&self, pt: &GdsPoint) -> bool {
        self.p0.x <= pt.x && self.p1.x >= pt.x && self.p0.y <= pt.y && self.p1.y >= pt.y
    }
    /// Our four corners, counter-clockwise from `p0`
    pub fn corners(&self) -> [GdsPoint; 4] {
        [
            self.p0,
            GdsPoint::new(self.p1.x, self.p0.y),
            self.p1,
            GdsPoint::new(self.p0.x, self.p1.y),
        ]
    }
    /// Lower-left x-coordinate
    pub fn x(&self) -> i32 {
        self.p0.x
    }
    /// Lower-left y-coordinate
    pub fn y(&self) -> i32 {
        self.p0.y
    }
    /// Extent in x. Spans the full `i32` range without overflow.
    pub fn width(&self) -> u32 {
        (i64::from(self.p1.x) - i64::from(self.p0.x)) as u32
    }
    /// Extent in y
    pub fn height(&self) -> u32 {
        (i64::from(self.p1.y) - i64::from(self.p0.y)) as u32
    }
}
