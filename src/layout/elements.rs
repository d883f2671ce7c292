//! Layout elements: the closed set of geometry the build produces.
//!
//! New element kinds are known at compile time, so this is a sum type with
//! a dispatched capability trait rather than an open hierarchy.

use enum_dispatch::enum_dispatch;

use crate::config::Side;
use crate::geom::{Bounds, Vec2};
use crate::path::{FretShape, StraightPath};

/// Reserved fret index of the synthetic bridge row. Kept out of every
/// playable fret range.
pub const BRIDGE_FRET_INDEX: i32 = i32::MAX;

/// Capabilities shared by every layout element.
#[enum_dispatch]
pub trait Element {
    /// Axis-aligned bounds of this element's own geometry.
    fn bounds(&self) -> Bounds;

    /// Move the element by an offset.
    fn translate(&mut self, by: Vec2);

    /// Mirror the element across the vertical center axis (left-handed
    /// layouts).
    fn flip_horizontal(&mut self);
}

/// One physical string from nut to bridge.
#[derive(Clone, Debug, PartialEq)]
pub struct StringElement {
    /// Physical string index, bass first. Equals the group index until
    /// courses are expanded.
    pub string: usize,
    /// Course this string belongs to.
    pub group: usize,
    /// Logical nut point; relocated down the neck for a nonzero starting
    /// fret.
    pub nut: Vec2,
    pub bridge: Vec2,
    /// Where the string path originally started, before any nut
    /// relocation.
    pub start: Vec2,
    pub path: StraightPath,
}

impl StringElement {
    pub fn new(string: usize, group: usize, nut: Vec2, bridge: Vec2) -> StringElement {
        StringElement {
            string,
            group,
            nut,
            bridge,
            start: nut,
            path: StraightPath::new(nut, bridge),
        }
    }

    /// Rebuild the path from the current nut and bridge points, restoring
    /// the endpoint invariant after a nut relocation.
    pub fn regenerate_path(&mut self) {
        self.path = StraightPath::new(self.nut, self.bridge);
    }
}

impl Element for StringElement {
    fn bounds(&self) -> Bounds {
        let mut b = Bounds::new();
        b.expand_point(self.path.start);
        b.expand_point(self.path.end);
        b.expand_point(self.nut);
        b.expand_point(self.bridge);
        b
    }

    fn translate(&mut self, by: Vec2) {
        self.nut = self.nut + by;
        self.bridge = self.bridge + by;
        self.start = self.start + by;
        self.path.translate(by);
    }

    fn flip_horizontal(&mut self) {
        self.nut = self.nut.flip_horizontal();
        self.bridge = self.bridge.flip_horizontal();
        self.start = self.start.flip_horizontal();
        self.path.flip_horizontal();
    }
}

/// The line exactly midway between two adjacent strings, used as an
/// internal fret-segment boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct StringMedianElement {
    /// Lower (bass-side) neighbor group index.
    pub lower: usize,
    /// Upper (treble-side) neighbor group index.
    pub upper: usize,
    /// Midline path, nut end first.
    pub path: StraightPath,
}

impl Element for StringMedianElement {
    fn bounds(&self) -> Bounds {
        let mut b = Bounds::new();
        b.expand_point(self.path.start);
        b.expand_point(self.path.end);
        b
    }

    fn translate(&mut self, by: Vec2) {
        self.path.translate(by);
    }

    fn flip_horizontal(&mut self) {
        self.path.flip_horizontal();
    }
}

/// One of the two fingerboard boundary lines.
#[derive(Clone, Debug, PartialEq)]
pub struct FingerboardSideElement {
    pub side: Side,
    /// Edge path, nut end first.
    pub path: StraightPath,
}

impl FingerboardSideElement {
    pub fn nut_point(&self) -> Vec2 {
        self.path.start
    }

    pub fn bridge_point(&self) -> Vec2 {
        self.path.end
    }
}

impl Element for FingerboardSideElement {
    fn bounds(&self) -> Bounds {
        let mut b = Bounds::new();
        b.expand_point(self.path.start);
        b.expand_point(self.path.end);
        b
    }

    fn translate(&mut self, by: Vec2) {
        self.path.translate(by);
    }

    fn flip_horizontal(&mut self) {
        self.path.flip_horizontal();
    }
}

/// One computed fret position on one string.
#[derive(Clone, Debug, PartialEq)]
pub struct FretPoint {
    /// Logical string (course) index.
    pub string: usize,
    pub fret: i32,
    pub position: Vec2,
    /// 12-TET frequency ratio relative to the open string
    /// (`2^(fret/12)`; infinite for the synthetic bridge row).
    pub interval: f64,
    /// Outside the string's playable range; carried only for
    /// interpolation continuity and excluded from rendered shapes.
    pub is_reference: bool,
    /// This point is the string's (possibly relocated) nut.
    pub is_nut: bool,
    /// Synthetic bridge point.
    pub is_bridge: bool,
}

impl FretPoint {
    /// A copy of this point flagged as reference, used to seed a
    /// neighboring segment for continuity.
    pub fn as_continuity_seed(&self) -> FretPoint {
        FretPoint {
            is_reference: true,
            ..self.clone()
        }
    }
}

/// The rendered fret for one fret index across a contiguous span of
/// strings.
#[derive(Clone, Debug, PartialEq)]
pub struct FretSegmentElement {
    pub fret: i32,
    /// Ordered points, bass first. May contain reference points; the
    /// shape is built from the real ones only.
    pub points: Vec<FretPoint>,
    pub shape: FretShape,
}

impl FretSegmentElement {
    pub fn real_points(&self) -> impl Iterator<Item = &FretPoint> {
        self.points.iter().filter(|p| !p.is_reference)
    }

    /// Inclusive string-index span of the real points.
    pub fn string_span(&self) -> Option<(usize, usize)> {
        let mut reals = self.real_points();
        let first = reals.next()?.string;
        Some((first, reals.last().map_or(first, |p| p.string)))
    }

    /// Whether every real point is a nut point.
    pub fn is_nut_segment(&self) -> bool {
        let mut reals = self.real_points().peekable();
        reals.peek().is_some() && self.real_points().all(|p| p.is_nut)
    }

    pub fn is_bridge_segment(&self) -> bool {
        self.fret == BRIDGE_FRET_INDEX
    }
}

impl Element for FretSegmentElement {
    fn bounds(&self) -> Bounds {
        let mut b = Bounds::new();
        match &self.shape {
            FretShape::Straight(p) => {
                b.expand_point(p.start);
                b.expand_point(p.end);
            }
            FretShape::Polyline(p) => {
                for point in &p.points {
                    b.expand_point(*point);
                }
            }
        }
        b
    }

    fn translate(&mut self, by: Vec2) {
        self.shape.translate(by);
        for p in &mut self.points {
            p.position = p.position + by;
        }
    }

    fn flip_horizontal(&mut self) {
        self.shape.flip_horizontal();
        for p in &mut self.points {
            p.position = p.position.flip_horizontal();
        }
    }
}

/// Every element kind a layout can hold.
#[enum_dispatch(Element)]
#[derive(Clone, Debug, PartialEq)]
pub enum LayoutElement {
    StringElement(StringElement),
    StringMedianElement(StringMedianElement),
    FingerboardSideElement(FingerboardSideElement),
    FretSegmentElement(FretSegmentElement),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::Scalar;

    fn string_at(x: f64) -> StringElement {
        StringElement::new(
            0,
            0,
            Vec2::approx(x, 300.0),
            Vec2::approx(x, -300.0),
        )
    }

    #[test]
    fn string_endpoints_match_path_after_transforms() {
        let mut s = string_at(-20.0);
        s.translate(Vec2::new(Scalar::from(5), Scalar::ZERO));
        assert_eq!(s.path.start, s.nut);
        assert_eq!(s.path.end, s.bridge);

        s.flip_horizontal();
        assert_eq!(s.path.start, s.nut);
        assert_eq!(s.path.end, s.bridge);
        assert!((s.nut.x.to_f64() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn segment_span_skips_reference_points() {
        let point = |string: usize, reference: bool| FretPoint {
            string,
            fret: 5,
            position: Vec2::approx(string as f64 * 10.0, 100.0),
            interval: 2f64.powf(5.0 / 12.0),
            is_reference: reference,
            is_nut: false,
            is_bridge: false,
        };
        let segment = FretSegmentElement {
            fret: 5,
            points: vec![point(0, true), point(1, false), point(2, false), point(3, true)],
            shape: FretShape::Straight(StraightPath::new(
                Vec2::approx(10.0, 100.0),
                Vec2::approx(20.0, 100.0),
            )),
        };
        assert_eq!(segment.string_span(), Some((1, 2)));
        assert!(!segment.is_nut_segment());
    }

    #[test]
    fn layout_element_dispatch() {
        let mut element = LayoutElement::from(string_at(0.0));
        let before = element.bounds();
        element.translate(Vec2::new(Scalar::ZERO, Scalar::from(10)));
        let after = element.bounds();
        assert!((after.max.y - before.max.y - 10.0).abs() < 1e-9);
    }
}
