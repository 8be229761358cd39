//!
//! # Hierarchical Bounding Boxes
//!
//! Bounding-box queries for elements, structs, and libraries.
//! Struct references are resolved by name, through the [GdsLibrary] passed in at query time.
//!

// Crates.io
use tracing::warn;

// Local Imports
use crate::data::{
    GdsArrayRef, GdsBoundary, GdsElement, GdsLibrary, GdsPath, GdsStrans, GdsStruct, GdsStructRef,
};
use crate::geom::{GdsBBox, GdsPoint, GdsTransform};

///
/// # Bounding Box Trait
///
/// Implemented by each element type, [GdsStruct], and [GdsLibrary].
///
/// Queries are pure and never fail. Anything which cannot be resolved, e.g.
/// a reference to a missing struct, a reference cycle, or a degenerate path,
/// produces `None`.
///
pub trait HasBBox {
    /// Compute our bounding box, resolving struct references through `lib`
    fn bbox(&self, lib: &GdsLibrary) -> Option<GdsBBox> {
        self.bbox_in(&mut GdsResolver::new(lib))
    }
    /// Compute our bounding box within an in-progress resolution
    fn bbox_in(&self, res: &mut GdsResolver) -> Option<GdsBBox>;
}

///
/// # Struct-Reference Resolver
///
/// Looks up struct definitions by name, and tracks the stack of structs under evaluation
/// so that reference cycles terminate.
///
#[derive(Debug)]
pub struct GdsResolver<'lib> {
    lib: &'lib GdsLibrary,
    stack: Vec<String>,
}
impl<'lib> GdsResolver<'lib> {
    pub fn new(lib: &'lib GdsLibrary) -> Self {
        Self {
            lib,
            stack: Vec::new(),
        }
    }
    /// Get the bounding box of the struct named `name`
    pub fn resolve(&mut self, name: &str) -> Option<GdsBBox> {
        if self.stack.iter().any(|s| s == name) {
            warn!("Cyclic reference to struct {}", name);
            return None;
        }
        let lib = self.lib;
        match lib.get(name) {
            Some(strukt) => strukt.bbox_in(self),
            None => {
                warn!("Reference to undefined struct {}", name);
                None
            }
        }
    }
}

impl HasBBox for GdsLibrary {
    /// Union of all struct bounding boxes
    fn bbox_in(&self, res: &mut GdsResolver) -> Option<GdsBBox> {
        union_all(self.structs.iter().map(|s| s.bbox_in(res)))
    }
}
impl HasBBox for GdsStruct {
    /// Union of all element bounding boxes.
    /// Note structs loaded from a [crate::GdsStore] have no elements until cached.
    fn bbox_in(&self, res: &mut GdsResolver) -> Option<GdsBBox> {
        res.stack.push(self.name.clone());
        let rv = union_all(self.elems.iter().map(|e| e.bbox_in(res)));
        res.stack.pop();
        rv
    }
}
impl HasBBox for GdsElement {
    fn bbox_in(&self, res: &mut GdsResolver) -> Option<GdsBBox> {
        use GdsElement::*;
        match self {
            GdsBoundary(e) => e.bbox_in(res),
            GdsPath(e) => e.bbox_in(res),
            GdsStructRef(e) => e.bbox_in(res),
            GdsArrayRef(e) => e.bbox_in(res),
        }
    }
}
impl HasBBox for GdsBoundary {
    fn bbox_in(&self, _res: &mut GdsResolver) -> Option<GdsBBox> {
        GdsBBox::from_points(&self.xy)
    }
}
impl HasBBox for GdsPath {
    /// Paths are treated as Manhattan: each segment is widened perpendicular
    /// to its axis, around its end-point, by half the path width.
    /// Paths whose widened extent leaves the `i32` range have no box.
    fn bbox_in(&self, _res: &mut GdsResolver) -> Option<GdsBBox> {
        let width = self.width.unwrap_or(0);
        if width == 0 || self.xy.len() < 2 {
            return None;
        }
        let half = i64::from(width.unsigned_abs() / 2);
        let mut bbox = GdsBBox::from_points(&self.xy)?;
        for seg in self.xy.windows(2) {
            let (p, q) = (&seg[0], &seg[1]);
            let (qx, qy) = (i64::from(q.x), i64::from(q.y));
            let ext = if p.x == q.x {
                // Vertical
                GdsBBox {
                    p0: GdsPoint::checked(qx - half, qy)?,
                    p1: GdsPoint::checked(qx + half, qy)?,
                }
            } else {
                GdsBBox {
                    p0: GdsPoint::checked(qx, qy - half)?,
                    p1: GdsPoint::checked(qx, qy + half)?,
                }
            };
            bbox = bbox.union(&ext);
        }
        if self.path_type.unwrap_or(0) > 0 {
            let n = self.xy.len();
            let start = extend_end(&self.xy[0], &self.xy[1], half)?;
            let end = extend_end(&self.xy[n - 1], &self.xy[n - 2], half)?;
            bbox = bbox
                .union(&GdsBBox::from_point(&start))
                .union(&GdsBBox::from_point(&end));
        }
        Some(bbox)
    }
}
impl HasBBox for GdsStructRef {
    fn bbox_in(&self, res: &mut GdsResolver) -> Option<GdsBBox> {
        let inner = res.resolve(&self.name)?;
        let trans = placement(&self.strans).translate(self.xy.x as f64, self.xy.y as f64);
        transform_bbox(&inner, &trans)
    }
}
impl HasBBox for GdsArrayRef {
    /// Union of the four corner-most placements of the array
    fn bbox_in(&self, res: &mut GdsResolver) -> Option<GdsBBox> {
        if self.cols <= 0 || self.rows <= 0 {
            return None;
        }
        let inner = res.resolve(&self.name)?;
        // Pitches and placements are computed wide, and only narrowed when mapped
        let (cols, rows) = (i64::from(self.cols), i64::from(self.rows));
        let [origin, colpt, rowpt] = self.xy.map(|p| (i64::from(p.x), i64::from(p.y)));
        let colpitch = ((colpt.0 - origin.0) / cols, (colpt.1 - origin.1) / cols);
        let rowpitch = ((rowpt.0 - origin.0) / rows, (rowpt.1 - origin.1) / rows);
        let base = placement(&self.strans);
        let mut boxes = Vec::with_capacity(4);
        for row in [0, rows - 1] {
            for col in [0, cols - 1] {
                let x = origin.0 + col * colpitch.0 + row * rowpitch.0;
                let y = origin.1 + col * colpitch.1 + row * rowpitch.1;
                // Any placement outside the coordinate range leaves the array without a box
                let placed = transform_bbox(&inner, &base.translate(x as f64, y as f64))?;
                boxes.push(Some(placed));
            }
        }
        union_all(boxes)
    }
}

/// Create the reflection, magnification, and rotation portion of a reference's placement
fn placement(strans: &Option<GdsStrans>) -> GdsTransform {
    let mut trans = GdsTransform::identity();
    if let Some(strans) = strans {
        if strans.reflected {
            trans = trans.scale(1., -1.);
        }
        let mag = strans.mag.unwrap_or(1.);
        trans = trans.scale(mag, mag).rotate(strans.angle.unwrap_or(0.));
    }
    trans
}
/// Map the corners of `bbox` through `trans`, and enclose the results.
/// Returns `None` if any corner lands outside the coordinate range.
fn transform_bbox(bbox: &GdsBBox, trans: &GdsTransform) -> Option<GdsBBox> {
    let corners = bbox
        .corners()
        .iter()
        .map(|c| trans.try_map(c))
        .collect::<Option<Vec<_>>>()?;
    GdsBBox::from_points(&corners)
}
/// Extend path end-point `end` by `half`, away from its neighbor `next`.
/// Coincident points extend toward positive x or y.
fn extend_end(end: &GdsPoint, next: &GdsPoint, half: i64) -> Option<GdsPoint> {
    let (x, y) = (i64::from(end.x), i64::from(end.y));
    if end.x == next.x {
        let dir = if next.y > end.y { -1 } else { 1 };
        GdsPoint::checked(x, y + dir * half)
    } else {
        let dir = if next.x > end.x { -1 } else { 1 };
        GdsPoint::checked(x + dir * half, y)
    }
}
/// Union of all present boxes, or `None` if there are none
fn union_all(boxes: impl IntoIterator<Item = Option<GdsBBox>>) -> Option<GdsBBox> {
    boxes
        .into_iter()
        .flatten()
        .reduce(|acc, b| acc.union(&b))
}
