//! Fret generation: 12-TET points, segment clustering, shape construction.
//!
//! A bag of per-string fret points becomes a minimal set of straight or
//! kinked fret shapes in four passes: cluster points sharing a fret index
//! under the angle thresholds, trim and re-split across reference points,
//! split staggered nuts, then snap each run to its boundary lines. The
//! nut and bridge rows finally feed back into the fingerboard edges and
//! the string medians.

use std::collections::BTreeMap;

use crate::config::{LayoutConfiguration, Side};
use crate::geom::{LineEquation, Vec2};
use crate::log::debug;
use crate::messages::{BuildAborted, Messages};
use crate::path::{FretShape, PolylinePath, StraightPath};
use crate::scalar::Scalar;

use super::Layout;
use super::elements::{BRIDGE_FRET_INDEX, FretPoint, FretSegmentElement, LayoutElement};

pub(crate) fn build(
    config: &LayoutConfiguration,
    layout: &mut Layout,
    _messages: &mut Messages,
) -> Result<(), BuildAborted> {
    let n = config.string_count();
    // playable range per string: (starting fret, last fret)
    let ranges: Vec<(i32, i32)> = config
        .strings
        .iter()
        .map(|s| {
            (
                s.start_fret,
                s.fret_count.unwrap_or(config.fret_count) as i32,
            )
        })
        .collect();
    let min_start = ranges.iter().map(|r| r.0).min().unwrap_or(0);
    let max_fret = ranges.iter().map(|r| r.1).max().unwrap_or(0);

    let by_fret = generate_points(config, layout, &ranges, min_start, max_fret);
    let clustered = cluster(config, layout, by_fret);
    let runs = resplit_references(clustered);
    let runs = split_partial_nuts(runs);
    build_shapes(config, layout, n, runs);
    back_adjust(layout, n);

    if ranges.iter().any(|r| r.0 != 0) {
        // nut points moved; restore the endpoint invariant of every path
        for element in layout.elements_mut() {
            if let LayoutElement::StringElement(s) = element {
                s.regenerate_path();
            }
        }
    }
    Ok(())
}

/// Stage 1: per-string fret points at 12-TET ratios, bridge-relative, plus
/// one synthetic bridge point per string. Nonzero starting frets relocate
/// the string's logical nut to its starting-fret position.
fn generate_points(
    config: &LayoutConfiguration,
    layout: &mut Layout,
    ranges: &[(i32, i32)],
    min_start: i32,
    max_fret: i32,
) -> BTreeMap<i32, Vec<FretPoint>> {
    let mut by_fret: BTreeMap<i32, Vec<FretPoint>> = BTreeMap::new();
    for string in 0..config.string_count() {
        let (start, last) = ranges[string];
        let path = layout
            .string(string)
            .expect("strings are built before frets")
            .path;
        for fret in min_start..=max_fret {
            let interval = 2f64.powf(fret as f64 / 12.0);
            // the fret sits at ratio 1/interval of the scale, measured
            // from the bridge
            let position = path.lerp(Scalar::approx(1.0 - interval.recip()));
            let is_nut = fret == start;
            if is_nut && start != 0 {
                if let Some(s) = layout.string_mut(string) {
                    s.nut = position;
                }
            }
            by_fret.entry(fret).or_default().push(FretPoint {
                string,
                fret,
                position,
                interval,
                is_reference: fret < start || fret > last,
                is_nut,
                is_bridge: false,
            });
        }
        by_fret
            .entry(BRIDGE_FRET_INDEX)
            .or_default()
            .push(FretPoint {
                string,
                fret: BRIDGE_FRET_INDEX,
                position: path.end,
                interval: f64::INFINITY,
                is_reference: false,
                is_nut: false,
                is_bridge: true,
            });
    }
    by_fret
}

/// Stage 2: walk each fret row bass to treble, growing a segment while the
/// string indices stay contiguous, the fret stays steep enough against the
/// crossed string, and no kink exceeds the break threshold. Rows of
/// nothing but reference points are dropped.
fn cluster(
    config: &LayoutConfiguration,
    layout: &Layout,
    by_fret: BTreeMap<i32, Vec<FretPoint>>,
) -> Vec<Vec<FretPoint>> {
    let min_string_angle = config.constants.min_string_angle_deg;
    let max_kink_angle = config.constants.max_kink_angle_deg;
    let string_lines: Vec<LineEquation> = (0..config.string_count())
        .map(|i| {
            let path = layout
                .string(i)
                .expect("strings are built before frets")
                .path;
            LineEquation::through(path.start, path.end)
        })
        .collect();

    let mut segments: Vec<Vec<FretPoint>> = Vec::new();
    for (_, points) in by_fret {
        let mut current: Vec<FretPoint> = Vec::new();
        for point in points {
            if let Some(last) = current.last() {
                let gap = point.string - last.string > 1;
                let edge = LineEquation::through(last.position, point.position);
                let too_slanted =
                    string_lines[point.string].angle_to(&edge).abs() < min_string_angle;
                let kinked = current.len() >= 2 && {
                    let previous_edge = LineEquation::through(
                        current[current.len() - 2].position,
                        current[current.len() - 1].position,
                    );
                    previous_edge.angle_to(&edge).abs() > max_kink_angle
                };
                if gap || too_slanted || kinked {
                    debug!(
                        fret = point.fret,
                        string = point.string,
                        gap,
                        too_slanted,
                        kinked,
                        "segment split"
                    );
                    segments.push(std::mem::take(&mut current));
                }
            }
            current.push(point);
        }
        if !current.is_empty() {
            segments.push(current);
        }
    }
    segments.retain(|s| s.iter().any(|p| !p.is_reference));
    segments
}

/// Stage 3: trim leading/trailing reference points, drop the interior
/// ones, and re-split wherever that leaves two consecutive real points
/// that are not string neighbors. A new run starts with the previous
/// run's last point as a continuity seed.
fn resplit_references(segments: Vec<Vec<FretPoint>>) -> Vec<Vec<FretPoint>> {
    let mut runs: Vec<Vec<FretPoint>> = Vec::new();
    for segment in segments {
        let Some(first) = segment.iter().position(|p| !p.is_reference) else {
            continue;
        };
        let last = segment
            .iter()
            .rposition(|p| !p.is_reference)
            .expect("a real point exists");

        let mut run: Vec<FretPoint> = Vec::new();
        for point in &segment[first..=last] {
            if point.is_reference {
                continue;
            }
            if let Some(previous) = run.iter().rev().find(|p| !p.is_reference) {
                if point.string - previous.string > 1 {
                    let seed = previous.as_continuity_seed();
                    runs.push(std::mem::take(&mut run));
                    run.push(seed);
                }
            }
            run.push(point.clone());
        }
        if run.iter().any(|p| !p.is_reference) {
            runs.push(run);
        }
    }
    runs
}

/// Stage 4: a run mixing nut and non-nut real points (staggered starting
/// frets) is split at every nut boundary; both sides keep one continuity
/// seed from the boundary.
fn split_partial_nuts(runs: Vec<Vec<FretPoint>>) -> Vec<Vec<FretPoint>> {
    let mut result: Vec<Vec<FretPoint>> = Vec::new();
    for run in runs {
        let mut reals = run.iter().filter(|p| !p.is_reference);
        let mixed = match reals.next() {
            Some(first) => reals.any(|p| p.is_nut != first.is_nut),
            None => false,
        };
        if !mixed {
            result.push(run);
            continue;
        }

        let mut piece: Vec<FretPoint> = Vec::new();
        let mut last_real: Option<FretPoint> = None;
        for point in run {
            if point.is_reference {
                piece.push(point);
                continue;
            }
            if let Some(previous) = &last_real {
                if previous.is_nut != point.is_nut {
                    piece.push(point.as_continuity_seed());
                    let carried = previous.as_continuity_seed();
                    result.push(std::mem::take(&mut piece));
                    piece.push(carried);
                }
            }
            last_real = Some(point.clone());
            piece.push(point);
        }
        if piece.iter().any(|p| !p.is_reference) {
            result.push(piece);
        }
    }
    result
}

/// Stage 5: turn each run into its rendered shape, snapped to the
/// fingerboard edge (for runs reaching an outer string) or the
/// inter-string median on each side.
fn build_shapes(
    config: &LayoutConfiguration,
    layout: &mut Layout,
    n: usize,
    runs: Vec<Vec<FretPoint>>,
) {
    let tolerance = config.constants.fret_straighten_tolerance;
    let boundary_line = |outer: bool, side: Side, median_lower: usize| -> LineEquation {
        let path = if outer {
            layout
                .side(side)
                .expect("edges are built before frets")
                .path
        } else {
            layout
                .median_between(median_lower)
                .expect("medians cover every string gap")
                .path
        };
        LineEquation::through(path.start, path.end)
    };

    let mut built: Vec<FretSegmentElement> = Vec::new();
    for run in runs {
        let reals: Vec<FretPoint> = run.iter().filter(|p| !p.is_reference).cloned().collect();
        let Some(first) = reals.first() else { continue };
        let low = first.string;
        let high = reals.last().map_or(low, |p| p.string);
        let left = boundary_line(low == 0, Side::Bass, low.saturating_sub(1));
        let right = boundary_line(high == n - 1, Side::Treble, high);
        let shape = run_shape(&reals, &left, &right, tolerance);
        built.push(FretSegmentElement {
            fret: first.fret,
            points: run,
            shape,
        });
    }
    for segment in built {
        layout.push(segment);
    }
}

/// Shape of one run: a single point projects perpendicularly onto both
/// boundaries; two or more points extend their first and last edge lines
/// to the boundaries, then the polyline collapses into its chord when no
/// point deviates beyond the straighten tolerance.
fn run_shape(
    reals: &[FretPoint],
    left: &LineEquation,
    right: &LineEquation,
    tolerance: f64,
) -> FretShape {
    if reals.len() == 1 {
        let p = reals[0].position;
        return FretShape::Straight(StraightPath::new(
            project_onto(left, p),
            project_onto(right, p),
        ));
    }

    let first_line = LineEquation::through(reals[0].position, reals[1].position);
    let last_line = LineEquation::through(
        reals[reals.len() - 2].position,
        reals[reals.len() - 1].position,
    );
    let left_end = first_line
        .intersect(left)
        .unwrap_or_else(|| project_onto(left, reals[0].position));
    let right_end = last_line
        .intersect(right)
        .unwrap_or_else(|| project_onto(right, reals[reals.len() - 1].position));

    let mut points = Vec::with_capacity(reals.len() + 2);
    points.push(left_end);
    points.extend(reals.iter().map(|p| p.position));
    points.push(right_end);

    let chord = StraightPath::new(left_end, right_end);
    if max_chord_deviation(&points, &chord) <= tolerance {
        FretShape::Straight(chord)
    } else {
        FretShape::Polyline(PolylinePath::new(points))
    }
}

/// Foot of the perpendicular from `p` onto `line`.
fn project_onto(line: &LineEquation, p: Vec2) -> Vec2 {
    line.intersect(&line.perpendicular_through(p)).unwrap_or(p)
}

fn max_chord_deviation(points: &[Vec2], chord: &StraightPath) -> f64 {
    let Some(direction) = chord.direction() else {
        return 0.0;
    };
    let start = chord.start.to_dvec2();
    points
        .iter()
        .map(|p| direction.perp_dot(p.to_dvec2() - start).abs())
        .fold(0.0, f64::max)
}

/// Stage 6: copy the nut/bridge fret shape endpoints onto the fingerboard
/// edges and recompute each median's nut endpoint from the (possibly
/// relocated) string nuts.
fn back_adjust(layout: &mut Layout, n: usize) {
    let boundary_point = |nut: bool, string: usize, bass_end: bool| -> Option<Vec2> {
        layout
            .fret_segments()
            .filter(|s| {
                if nut {
                    s.is_nut_segment()
                } else {
                    s.is_bridge_segment()
                }
            })
            .find(|s| {
                s.string_span()
                    .is_some_and(|(lo, hi)| lo <= string && string <= hi)
            })
            .and_then(|s| {
                if bass_end {
                    s.shape.first_point()
                } else {
                    s.shape.last_point()
                }
            })
    };
    let bass_nut = boundary_point(true, 0, true);
    let treble_nut = boundary_point(true, n - 1, false);
    let bass_bridge = boundary_point(false, 0, true);
    let treble_bridge = boundary_point(false, n - 1, false);

    for (side, nut, bridge) in [
        (Side::Bass, bass_nut, bass_bridge),
        (Side::Treble, treble_nut, treble_bridge),
    ] {
        if let Some(element) = layout.side_mut(side) {
            if let Some(p) = nut {
                element.path.start = p;
            }
            if let Some(p) = bridge {
                element.path.end = p;
            }
        }
    }

    let midpoints: Vec<(usize, Vec2)> = layout
        .medians()
        .filter_map(|m| {
            let lower = layout.string(m.lower)?.nut;
            let upper = layout.string(m.upper)?.nut;
            Some((m.lower, lower.midpoint(upper)))
        })
        .collect();
    for (lower, midpoint) in midpoints {
        if let Some(median) = layout.median_between_mut(lower) {
            median.path.start = midpoint;
        }
    }
}
