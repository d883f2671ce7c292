//! Straight and polyline path primitives.
//!
//! Both path kinds share the same outer contract (first/last point,
//! translate, horizontal flip, interpolation) so layout elements can hold
//! either. Segment intersection goes through one reusable parametric
//! solve, with bounded (segment-segment) and unbounded (infinite line)
//! modes.

use glam::DVec2;

use crate::geom::{GEOMETRY_EPSILON, Vec2};
use crate::scalar::Scalar;

/// Determinant threshold below which two segments are treated as parallel
/// or degenerate.
pub const INTERSECTION_EPSILON: f64 = 1e-12;

/// Half-length of the synthetic probe segment used by `snap_to_line`.
const PROBE_EXTENT: f64 = 1.0e6;

/// How a segment intersection is validated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntersectMode {
    /// Both interpolation parameters must land in `[0, 1]`.
    Segments,
    /// The segments are treated as infinite lines.
    InfiniteLines,
}

/// Direction of the synthetic probe for `snap_to_line`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Probe {
    /// Perpendicular to the target path.
    Perpendicular,
    Horizontal,
    Vertical,
}

/// A straight path between two points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StraightPath {
    pub start: Vec2,
    pub end: Vec2,
}

/// Solve `a.start + u*da = b.start + v*db` for `(u, v)`.
///
/// A near-zero determinant (parallel or degenerate segments) yields `None`.
fn solve_parameters(a: &StraightPath, b: &StraightPath) -> Option<(f64, f64)> {
    let da = a.delta().to_dvec2();
    let db = b.delta().to_dvec2();
    let det = da.perp_dot(db);
    if det.abs() < INTERSECTION_EPSILON {
        return None;
    }
    let s = b.start.to_dvec2() - a.start.to_dvec2();
    Some((s.perp_dot(db) / det, s.perp_dot(da) / det))
}

impl StraightPath {
    pub fn new(start: Vec2, end: Vec2) -> StraightPath {
        StraightPath { start, end }
    }

    pub fn delta(&self) -> Vec2 {
        self.end - self.start
    }

    pub fn length(&self) -> Scalar {
        self.delta().length()
    }

    /// Unit direction from start to end, `None` for a zero-length path.
    pub fn direction(&self) -> Option<DVec2> {
        let d = self.delta().to_dvec2();
        let len = d.length();
        if len < GEOMETRY_EPSILON {
            None
        } else {
            Some(d / len)
        }
    }

    /// Axis-aligned extent of the path.
    pub fn size(&self) -> Vec2 {
        let d = self.delta();
        Vec2::new(d.x.abs(), d.y.abs())
    }

    pub fn first_point(&self) -> Vec2 {
        self.start
    }

    pub fn last_point(&self) -> Vec2 {
        self.end
    }

    /// Point at parameter `t` along the path: 0 is the start, 1 the end.
    /// Values outside `[0, 1]` extrapolate along the carrier line.
    pub fn lerp(&self, t: Scalar) -> Vec2 {
        self.start.lerp(self.end, t)
    }

    /// A new path grown by `amount` at both ends along the direction.
    /// A degenerate path is returned unchanged.
    pub fn extend(&self, amount: Scalar) -> StraightPath {
        match self.direction() {
            Some(dir) => {
                let grow = Vec2::from_dvec2(dir * amount.to_f64());
                StraightPath {
                    start: self.start - grow,
                    end: self.end + grow,
                }
            }
            None => *self,
        }
    }

    pub fn translate(&mut self, by: Vec2) {
        self.start = self.start + by;
        self.end = self.end + by;
    }

    pub fn flip_horizontal(&mut self) {
        self.start = self.start.flip_horizontal();
        self.end = self.end.flip_horizontal();
    }

    /// Intersection with another path via the parametric solve.
    pub fn intersect(&self, other: &StraightPath, mode: IntersectMode) -> Option<Vec2> {
        let (u, v) = solve_parameters(self, other)?;
        if mode == IntersectMode::Segments {
            let valid = -GEOMETRY_EPSILON..=1.0 + GEOMETRY_EPSILON;
            if !valid.contains(&u) || !valid.contains(&v) {
                return None;
            }
        }
        Some(self.lerp(Scalar::approx(u)))
    }

    /// Project `point` onto this path's carrier line, either perpendicular
    /// to the path or along a fixed horizontal/vertical probe. Implemented
    /// by intersecting with a far-extended synthetic probe segment.
    pub fn snap_to_line(&self, point: Vec2, probe: Probe) -> Option<Vec2> {
        let dir = match probe {
            Probe::Perpendicular => self.direction()?.perp(),
            Probe::Horizontal => DVec2::X,
            Probe::Vertical => DVec2::Y,
        };
        let p = point.to_dvec2();
        let probe_path = StraightPath::new(
            Vec2::from_dvec2(p - dir * PROBE_EXTENT),
            Vec2::from_dvec2(p + dir * PROBE_EXTENT),
        );
        self.intersect(&probe_path, IntersectMode::InfiniteLines)
    }
}

/// An ordered chain of points.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct PolylinePath {
    pub points: Vec<Vec2>,
}

impl PolylinePath {
    pub fn new(points: Vec<Vec2>) -> PolylinePath {
        PolylinePath { points }
    }

    pub fn first_point(&self) -> Option<Vec2> {
        self.points.first().copied()
    }

    pub fn last_point(&self) -> Option<Vec2> {
        self.points.last().copied()
    }

    pub fn length(&self) -> Scalar {
        let mut total = Scalar::ZERO;
        for pair in self.points.windows(2) {
            total += (pair[1] - pair[0]).length();
        }
        total
    }

    /// Point at normalized arc-length parameter `t`, clamped to `[0, 1]`.
    pub fn lerp(&self, t: Scalar) -> Option<Vec2> {
        let first = self.first_point()?;
        if self.points.len() < 2 {
            return Some(first);
        }
        let total = self.length().to_f64();
        if total < GEOMETRY_EPSILON {
            return Some(first);
        }
        let mut remaining = t.to_f64().clamp(0.0, 1.0) * total;
        for pair in self.points.windows(2) {
            let seg = StraightPath::new(pair[0], pair[1]);
            let len = seg.length().to_f64();
            if remaining <= len || len < GEOMETRY_EPSILON {
                if len < GEOMETRY_EPSILON {
                    continue;
                }
                return Some(seg.lerp(Scalar::approx(remaining / len)));
            }
            remaining -= len;
        }
        self.last_point()
    }

    pub fn translate(&mut self, by: Vec2) {
        for p in &mut self.points {
            *p = *p + by;
        }
    }

    pub fn flip_horizontal(&mut self) {
        for p in &mut self.points {
            *p = p.flip_horizontal();
        }
    }

    /// First bounded intersection of any chain segment with `other`.
    pub fn intersect(&self, other: &StraightPath) -> Option<Vec2> {
        self.points.windows(2).find_map(|pair| {
            StraightPath::new(pair[0], pair[1]).intersect(other, IntersectMode::Segments)
        })
    }

    /// A new polyline grown by `amount` along the outermost segment
    /// directions. `None` when the chain is too short or an end segment is
    /// degenerate — callers must treat that as a normal outcome, not an
    /// error.
    pub fn extend(&self, amount: Scalar) -> Option<PolylinePath> {
        if self.points.len() < 2 {
            return None;
        }
        let head = StraightPath::new(self.points[0], self.points[1]).direction()?;
        let tail = StraightPath::new(
            self.points[self.points.len() - 2],
            self.points[self.points.len() - 1],
        )
        .direction()?;
        let grow = amount.to_f64();
        let mut points = self.points.clone();
        points[0] = Vec2::from_dvec2(points[0].to_dvec2() - head * grow);
        let last = points.len() - 1;
        points[last] = Vec2::from_dvec2(points[last].to_dvec2() + tail * grow);
        Some(PolylinePath { points })
    }
}

/// The rendered shape of a fret: a plain segment or a kinked chain.
#[derive(Clone, Debug, PartialEq)]
pub enum FretShape {
    Straight(StraightPath),
    Polyline(PolylinePath),
}

impl FretShape {
    pub fn is_straight(&self) -> bool {
        matches!(self, FretShape::Straight(_))
    }

    pub fn first_point(&self) -> Option<Vec2> {
        match self {
            FretShape::Straight(p) => Some(p.first_point()),
            FretShape::Polyline(p) => p.first_point(),
        }
    }

    pub fn last_point(&self) -> Option<Vec2> {
        match self {
            FretShape::Straight(p) => Some(p.last_point()),
            FretShape::Polyline(p) => p.last_point(),
        }
    }

    pub fn translate(&mut self, by: Vec2) {
        match self {
            FretShape::Straight(p) => p.translate(by),
            FretShape::Polyline(p) => p.translate(by),
        }
    }

    pub fn flip_horizontal(&mut self) {
        match self {
            FretShape::Straight(p) => p.flip_horizontal(),
            FretShape::Polyline(p) => p.flip_horizontal(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    fn diagonal() -> StraightPath {
        StraightPath::new(Vec2::approx(0.0, 0.0), Vec2::approx(3.0, 4.0))
    }

    // ==================== StraightPath ====================

    #[test]
    fn length_direction_size() {
        let p = diagonal();
        assert_close(p.length().to_f64(), 5.0);
        let dir = p.direction().unwrap();
        assert_close(dir.x, 0.6);
        assert_close(dir.y, 0.8);
        assert_close(p.size().x.to_f64(), 3.0);
        assert_close(p.size().y.to_f64(), 4.0);
    }

    #[test]
    fn degenerate_path_has_no_direction() {
        let p = StraightPath::new(Vec2::ZERO, Vec2::ZERO);
        assert!(p.direction().is_none());
        assert_eq!(p.extend(Scalar::ONE), p);
    }

    #[test]
    fn extend_grows_both_ends() {
        let p = StraightPath::new(Vec2::approx(0.0, 0.0), Vec2::approx(0.0, 10.0));
        let grown = p.extend(Scalar::from(2));
        assert_close(grown.start.y.to_f64(), -2.0);
        assert_close(grown.end.y.to_f64(), 12.0);
        assert_close(grown.length().to_f64(), 14.0);
    }

    #[test]
    fn lerp_interpolates_and_extrapolates() {
        let p = StraightPath::new(Vec2::approx(0.0, 10.0), Vec2::approx(0.0, -10.0));
        assert_close(p.lerp(Scalar::new(5, 1)).y.to_f64(), 0.0);
        assert_close(p.lerp(Scalar::approx(-0.1)).y.to_f64(), 12.0);
    }

    #[test]
    fn bounded_intersection_requires_overlap() {
        let a = StraightPath::new(Vec2::approx(0.0, 0.0), Vec2::approx(2.0, 0.0));
        let b = StraightPath::new(Vec2::approx(1.0, -1.0), Vec2::approx(1.0, 1.0));
        let hit = a.intersect(&b, IntersectMode::Segments).unwrap();
        assert_close(hit.x.to_f64(), 1.0);

        // same carrier lines, but b no longer reaches a
        let far = StraightPath::new(Vec2::approx(1.0, 5.0), Vec2::approx(1.0, 9.0));
        assert_eq!(a.intersect(&far, IntersectMode::Segments), None);
        let unbounded = a.intersect(&far, IntersectMode::InfiniteLines).unwrap();
        assert_close(unbounded.x.to_f64(), 1.0);
        assert_close(unbounded.y.to_f64(), 0.0);
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        let a = StraightPath::new(Vec2::approx(0.0, 0.0), Vec2::approx(2.0, 0.0));
        let b = StraightPath::new(Vec2::approx(0.0, 1.0), Vec2::approx(2.0, 1.0));
        assert_eq!(a.intersect(&b, IntersectMode::InfiniteLines), None);
    }

    #[test]
    fn snap_to_line_modes() {
        let p = StraightPath::new(Vec2::approx(0.0, 0.0), Vec2::approx(10.0, 0.0));
        let off = Vec2::approx(3.0, 4.0);

        let perp = p.snap_to_line(off, Probe::Perpendicular).unwrap();
        assert_close(perp.x.to_f64(), 3.0);
        assert_close(perp.y.to_f64(), 0.0);

        let vertical = p.snap_to_line(off, Probe::Vertical).unwrap();
        assert_close(vertical.x.to_f64(), 3.0);

        // horizontal probe is parallel to the path: no projection
        assert_eq!(p.snap_to_line(off, Probe::Horizontal), None);
    }

    // ==================== PolylinePath ====================

    fn elbow() -> PolylinePath {
        PolylinePath::new(vec![
            Vec2::approx(0.0, 0.0),
            Vec2::approx(4.0, 0.0),
            Vec2::approx(4.0, 4.0),
        ])
    }

    #[test]
    fn polyline_endpoints_and_length() {
        let p = elbow();
        assert_eq!(p.first_point().unwrap(), Vec2::approx(0.0, 0.0));
        assert_eq!(p.last_point().unwrap(), Vec2::approx(4.0, 4.0));
        assert_close(p.length().to_f64(), 8.0);
    }

    #[test]
    fn polyline_lerp_walks_the_chain() {
        let p = elbow();
        let mid = p.lerp(Scalar::new(5, 1)).unwrap();
        assert_close(mid.x.to_f64(), 4.0);
        assert_close(mid.y.to_f64(), 0.0);
        let three_quarters = p.lerp(Scalar::new(75, 2)).unwrap();
        assert_close(three_quarters.y.to_f64(), 2.0);
    }

    #[test]
    fn polyline_flip_is_involutive() {
        let mut p = elbow();
        let original = p.clone();
        p.flip_horizontal();
        assert_close(p.points[1].x.to_f64(), -4.0);
        p.flip_horizontal();
        assert_eq!(p, original);
    }

    #[test]
    fn polyline_extend_grows_end_segments() {
        let p = elbow();
        let grown = p.extend(Scalar::ONE).unwrap();
        assert_close(grown.points[0].x.to_f64(), -1.0);
        assert_close(grown.points[2].y.to_f64(), 5.0);
    }

    #[test]
    fn polyline_extend_can_legitimately_fail() {
        assert!(
            PolylinePath::new(vec![Vec2::approx(1.0, 1.0)])
                .extend(Scalar::ONE)
                .is_none()
        );
        let degenerate = PolylinePath::new(vec![Vec2::approx(1.0, 1.0), Vec2::approx(1.0, 1.0)]);
        assert!(degenerate.extend(Scalar::ONE).is_none());
    }

    #[test]
    fn polyline_intersection() {
        let p = elbow();
        let cutter = StraightPath::new(Vec2::approx(2.0, -1.0), Vec2::approx(2.0, 1.0));
        let hit = p.intersect(&cutter).unwrap();
        assert_close(hit.x.to_f64(), 2.0);
        assert_close(hit.y.to_f64(), 0.0);

        let miss = StraightPath::new(Vec2::approx(-2.0, -1.0), Vec2::approx(-2.0, 1.0));
        assert_eq!(p.intersect(&miss), None);
    }
}
