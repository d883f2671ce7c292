//! Layout building.
//!
//! This module is organized into submodules:
//! - `elements`: the closed set of layout element kinds
//! - `strings`: string-path construction
//! - `edges`: fingerboard-edge construction
//! - `frets`: fret point generation, clustering and shape construction
//!
//! [`build`] runs the three builders in strict order against one shared
//! layout aggregate and message list. A stage that reports an error stops
//! the pipeline; a panic inside a stage is contained at the stage boundary
//! and reported as a single unexpected-error message. Either way no
//! partial layout is ever returned as successful.

pub mod elements;

mod edges;
mod frets;
mod strings;

pub use elements::*;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::config::{LayoutConfiguration, Side};
use crate::geom::{Bounds, Vec2};
use crate::log::debug;
use crate::messages::{BuildAborted, MessageArg, MessageKey, Messages, ValidationMessage};
use crate::scalar::Scalar;

/// The build output: an ordered, heterogeneous collection of layout
/// elements. Created empty per build, populated strictly through the
/// pipeline, then handed to the caller; never mutated afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layout {
    elements: Vec<LayoutElement>,
}

impl Layout {
    pub fn new() -> Layout {
        Layout::default()
    }

    pub fn elements(&self) -> &[LayoutElement] {
        &self.elements
    }

    pub(crate) fn elements_mut(&mut self) -> &mut [LayoutElement] {
        &mut self.elements
    }

    /// Insert an element; the returned index is its permanent handle.
    pub(crate) fn push(&mut self, element: impl Into<LayoutElement>) -> usize {
        self.elements.push(element.into());
        self.elements.len() - 1
    }

    pub fn strings(&self) -> impl Iterator<Item = &StringElement> {
        self.elements.iter().filter_map(|e| match e {
            LayoutElement::StringElement(s) => Some(s),
            _ => None,
        })
    }

    /// The string with the given physical index.
    pub fn string(&self, index: usize) -> Option<&StringElement> {
        self.strings().find(|s| s.string == index)
    }

    pub(crate) fn string_mut(&mut self, index: usize) -> Option<&mut StringElement> {
        self.elements.iter_mut().find_map(|e| match e {
            LayoutElement::StringElement(s) if s.string == index => Some(s),
            _ => None,
        })
    }

    pub fn medians(&self) -> impl Iterator<Item = &StringMedianElement> {
        self.elements.iter().filter_map(|e| match e {
            LayoutElement::StringMedianElement(m) => Some(m),
            _ => None,
        })
    }

    /// The median between the given group and its upper neighbor.
    pub fn median_between(&self, lower: usize) -> Option<&StringMedianElement> {
        self.medians().find(|m| m.lower == lower)
    }

    pub(crate) fn median_between_mut(&mut self, lower: usize) -> Option<&mut StringMedianElement> {
        self.elements.iter_mut().find_map(|e| match e {
            LayoutElement::StringMedianElement(m) if m.lower == lower => Some(m),
            _ => None,
        })
    }

    /// The fingerboard edge of one side.
    pub fn side(&self, side: Side) -> Option<&FingerboardSideElement> {
        self.elements.iter().find_map(|e| match e {
            LayoutElement::FingerboardSideElement(s) if s.side == side => Some(s),
            _ => None,
        })
    }

    pub(crate) fn side_mut(&mut self, side: Side) -> Option<&mut FingerboardSideElement> {
        self.elements.iter_mut().find_map(|e| match e {
            LayoutElement::FingerboardSideElement(s) if s.side == side => Some(s),
            _ => None,
        })
    }

    pub fn fret_segments(&self) -> impl Iterator<Item = &FretSegmentElement> {
        self.elements.iter().filter_map(|e| match e {
            LayoutElement::FretSegmentElement(s) => Some(s),
            _ => None,
        })
    }

    pub fn fret_segments_for(&self, fret: i32) -> impl Iterator<Item = &FretSegmentElement> {
        self.fret_segments().filter(move |s| s.fret == fret)
    }

    /// Recalculate the layout bounds as the union of every element's own
    /// bounds.
    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::new();
        for element in &self.elements {
            bounds.union(&element.bounds());
        }
        bounds
    }

    /// Mirror the whole layout across the vertical center axis. Applying
    /// it twice restores every element exactly.
    pub fn flip_horizontal(&mut self) {
        for element in &mut self.elements {
            element.flip_horizontal();
        }
    }
}

/// Result of one build: a success flag, the accumulated validation
/// messages, and the layout when every stage succeeded.
#[derive(Debug)]
pub struct BuildOutcome {
    pub success: bool,
    pub messages: Vec<ValidationMessage>,
    pub layout: Option<Layout>,
}

impl BuildOutcome {
    fn failure(messages: Messages) -> BuildOutcome {
        BuildOutcome {
            success: false,
            messages: messages.into_vec(),
            layout: None,
        }
    }
}

type Stage = fn(&LayoutConfiguration, &mut Layout, &mut Messages) -> Result<(), BuildAborted>;

const STAGES: [Stage; 3] = [strings::build, edges::build, frets::build];

/// Build a layout from a configuration.
///
/// Pure: reads nothing but the configuration and allocates its own output,
/// so independent builds may run concurrently without coordination.
pub fn build(config: &LayoutConfiguration) -> BuildOutcome {
    let mut messages = Messages::new();
    let mut layout = Layout::new();

    for stage in STAGES {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            stage(config, &mut layout, &mut messages)
        }));
        match outcome {
            Ok(Ok(())) if !messages.has_errors() => {}
            Ok(_) => return BuildOutcome::failure(messages),
            Err(payload) => {
                messages.error(
                    MessageKey::UnexpectedError,
                    vec![MessageArg::Text(panic_text(payload))],
                );
                return BuildOutcome::failure(messages);
            }
        }
    }

    expand_courses(config, &mut layout);
    if config.left_handed {
        layout.flip_horizontal();
    }
    debug!(elements = layout.elements().len(), "layout complete");

    BuildOutcome {
        success: true,
        messages: messages.into_vec(),
        layout: Some(layout),
    }
}

/// Total physical width of one course: its gauges plus the free gaps
/// between members. Unknown gauges count as zero width.
pub(crate) fn course_width(config: &LayoutConfiguration, group: usize) -> Scalar {
    let Some(string) = config.strings.get(group) else {
        return Scalar::ZERO;
    };
    let spacing = if config.course_spacing.is_empty() {
        Scalar::ZERO
    } else {
        config.course_spacing
    };
    let mut width = Scalar::ZERO;
    for gauge in &string.gauges {
        if !gauge.is_empty() {
            width += *gauge;
        }
    }
    if string.gauges.len() > 1 {
        width += spacing * Scalar::from((string.gauges.len() - 1) as i64);
    }
    width
}

fn panic_text(payload: Box<dyn Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown internal error".to_string()
    }
}

/// Expand courses into their physical strings: each member is the course
/// path shifted horizontally, members laid out symmetrically about it with
/// the configured free space between their edges. Physical string indices
/// are reassigned sequentially, bass first.
fn expand_courses(config: &LayoutConfiguration, layout: &mut Layout) {
    if config.strings.iter().all(|s| s.course_size() == 1) {
        return;
    }
    let spacing = if config.course_spacing.is_empty() {
        Scalar::ZERO
    } else {
        config.course_spacing
    };
    let gauge = |group: usize, member: usize| -> Scalar {
        config.strings[group]
            .gauges
            .get(member)
            .copied()
            .filter(|g| !g.is_empty())
            .unwrap_or(Scalar::ZERO)
    };

    let mut next_index = 0usize;
    let mut expanded: Vec<LayoutElement> = Vec::with_capacity(layout.elements.len());
    for element in layout.elements.drain(..) {
        let LayoutElement::StringElement(course) = element else {
            expanded.push(element);
            continue;
        };
        let members = config.strings[course.group].course_size();
        if members == 1 {
            let mut single = course;
            single.string = next_index;
            next_index += 1;
            expanded.push(single.into());
            continue;
        }

        // member centers relative to the first member
        let mut centers = vec![Scalar::ZERO; members];
        for j in 1..members {
            let step = spacing
                + (gauge(course.group, j - 1) + gauge(course.group, j)) / Scalar::TWO;
            centers[j] = centers[j - 1] + step;
        }
        let half_spread = centers[members - 1] / Scalar::TWO;
        for center in centers {
            let mut member = course.clone();
            member.string = next_index;
            next_index += 1;
            member.translate(Vec2::new(center - half_spread, Scalar::ZERO));
            expanded.push(member.into());
        }
    }
    layout.elements = expanded;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EndSpacing, ScaleConfig, StringConfig};

    fn config(strings: Vec<StringConfig>) -> LayoutConfiguration {
        LayoutConfiguration {
            strings,
            scale: ScaleConfig::single(Scalar::from(650)),
            nut: EndSpacing::uniform(Scalar::from(8)),
            bridge: EndSpacing::uniform(Scalar::from(11)),
            ..LayoutConfiguration::default()
        }
    }

    #[test]
    fn pipeline_stops_on_configuration_error() {
        let mut bad = config(vec![StringConfig::plain(Scalar::ONE); 4]);
        bad.nut.distances = vec![Scalar::from(8), Scalar::from(8)]; // needs 1 or 3
        let outcome = build(&bad);
        assert!(!outcome.success);
        assert!(outcome.layout.is_none());
        assert!(
            outcome
                .messages
                .iter()
                .any(|m| m.key == MessageKey::InvalidDistanceCount)
        );
    }

    #[test]
    fn internal_panics_become_a_single_error_message() {
        // an empty spacing distance poisons the arithmetic mid-stage
        let mut bad = config(vec![StringConfig::plain(Scalar::ONE); 4]);
        bad.nut.distances = vec![Scalar::EMPTY];
        let outcome = build(&bad);
        assert!(!outcome.success);
        assert!(outcome.layout.is_none());
        let unexpected: Vec<_> = outcome
            .messages
            .iter()
            .filter(|m| m.key == MessageKey::UnexpectedError)
            .collect();
        assert_eq!(unexpected.len(), 1);
    }

    #[test]
    fn successful_build_contains_every_element_kind() {
        let outcome = build(&config(vec![StringConfig::plain(Scalar::ONE); 6]));
        assert!(outcome.success, "{:?}", outcome.messages);
        let layout = outcome.layout.unwrap();
        assert_eq!(layout.strings().count(), 6);
        assert_eq!(layout.medians().count(), 5);
        assert!(layout.side(Side::Bass).is_some());
        assert!(layout.side(Side::Treble).is_some());
        assert!(layout.fret_segments().count() > 0);
        assert!(!layout.bounds().is_empty());
    }

    #[test]
    fn course_expansion_duplicates_member_strings() {
        let course = StringConfig {
            gauges: vec![Scalar::new(12, 1), Scalar::new(4, 1)],
            ..StringConfig::default()
        };
        let mut cfg = config(vec![
            course.clone(),
            course,
            StringConfig::plain(Scalar::ONE),
        ]);
        cfg.course_spacing = Scalar::new(25, 1);
        let outcome = build(&cfg);
        assert!(outcome.success, "{:?}", outcome.messages);
        let layout = outcome.layout.unwrap();

        // 2 + 2 + 1 physical strings, re-indexed sequentially
        let indices: Vec<usize> = layout.strings().map(|s| s.string).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        let groups: Vec<usize> = layout.strings().map(|s| s.group).collect();
        assert_eq!(groups, vec![0, 0, 1, 1, 2]);

        // pair members straddle the course center symmetrically:
        // step = 2.5 + (1.2 + 0.4) / 2 = 3.3
        let first = layout.string(0).unwrap();
        let second = layout.string(1).unwrap();
        let gap = (second.nut.x - first.nut.x).to_f64();
        assert!((gap - 3.3).abs() < 1e-9);
    }

    #[test]
    fn left_handed_layouts_are_mirrored() {
        let mut cfg = config(vec![StringConfig::plain(Scalar::ONE); 6]);
        cfg.bridge = EndSpacing::uniform(Scalar::from(11));
        let right = build(&cfg).layout.unwrap();
        cfg.left_handed = true;
        let left = build(&cfg).layout.unwrap();
        for (r, l) in right.strings().zip(left.strings()) {
            assert!((r.nut.x.to_f64() + l.nut.x.to_f64()).abs() < 1e-9);
            assert!((r.nut.y.to_f64() - l.nut.y.to_f64()).abs() < 1e-9);
        }
    }
}
