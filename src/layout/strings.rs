//! String-path construction: nut/bridge anchors and per-string paths.
//!
//! Works in two frames. The 1D frame computes per-end horizontal string
//! positions from the spacing configuration; the 2D frame turns those
//! positions plus resolved scale lengths into straight paths, then applies
//! multiscale alignment, skew and symmetric re-centering.

use crate::config::{
    CenterAlignment, End, EndSpacing, LayoutConfiguration, ScaleCalculationMethod, ScaleLengthMode,
    Side, SpacingMode,
};
use crate::geom::{GEOMETRY_EPSILON, LineEquation, Vec2};
use crate::log::debug;
use crate::messages::{BuildAborted, MessageArg, MessageKey, Messages};
use crate::path::{Probe, StraightPath};
use crate::scalar::Scalar;

use super::Layout;
use super::edges::outward_perpendicular;
use super::elements::{StringElement, StringMedianElement};

pub(crate) fn build(
    config: &LayoutConfiguration,
    layout: &mut Layout,
    messages: &mut Messages,
) -> Result<(), BuildAborted> {
    let n = config.string_count();
    if n == 0 {
        messages.error(MessageKey::NoStrings, vec![]);
        return Err(BuildAborted);
    }
    if config.nut.alignment == CenterAlignment::Manual
        && config.bridge.alignment == CenterAlignment::Manual
    {
        messages.error(MessageKey::ConflictingManualAlignment, vec![]);
        return Err(BuildAborted);
    }

    let widths = course_widths(config, messages);

    // 1D positions per end, then centered per policy; a Manual end is
    // aligned against the other end's already-centered spread.
    let mut nut_positions = end_positions(&config.nut, &widths, n, messages)?;
    let mut bridge_positions = end_positions(&config.bridge, &widths, n, messages)?;
    apply_initial_center(&mut nut_positions, config, End::Nut, &widths);
    apply_initial_center(&mut bridge_positions, config, End::Bridge, &widths);
    if config.nut.alignment == CenterAlignment::Manual {
        apply_manual_alignment(&mut nut_positions, &bridge_positions, &config.nut);
    }
    if config.bridge.alignment == CenterAlignment::Manual {
        apply_manual_alignment(&mut bridge_positions, &nut_positions, &config.bridge);
    }

    // 2D anchor points
    let mut nuts = vec![Vec2::EMPTY; n];
    let mut bridges = vec![Vec2::EMPTY; n];
    let adjust = taper_applies(config);

    match config.scale.mode {
        ScaleLengthMode::PerString => {
            for i in 0..n {
                let nominal = match config.strings[i].scale_length.filter(|s| !s.is_empty()) {
                    Some(s) => s,
                    None => {
                        messages
                            .error(MessageKey::MissingScaleLength, vec![MessageArg::Index(i)]);
                        return Err(BuildAborted);
                    }
                };
                place_string(
                    i,
                    nominal,
                    adjust,
                    &nut_positions,
                    &bridge_positions,
                    &mut nuts,
                    &mut bridges,
                    messages,
                )?;
            }
        }
        ScaleLengthMode::Single | ScaleLengthMode::Multiscale => {
            let (bass_scale, treble_scale) = resolve_outer_scales(config, n, messages)?;
            place_string(
                0,
                bass_scale,
                adjust,
                &nut_positions,
                &bridge_positions,
                &mut nuts,
                &mut bridges,
                messages,
            )?;
            if n > 1 {
                place_string(
                    n - 1,
                    treble_scale,
                    adjust,
                    &nut_positions,
                    &bridge_positions,
                    &mut nuts,
                    &mut bridges,
                    messages,
                )?;
            }
            // Inner strings snap onto the straight nut/bridge lines of the
            // outer pair, preserving the perspective taper.
            if n > 2 {
                let nut_line = StraightPath::new(nuts[0], nuts[n - 1]);
                let bridge_line = StraightPath::new(bridges[0], bridges[n - 1]);
                for i in 1..n - 1 {
                    nuts[i] = snap_position(&nut_line, nut_positions[i], nuts[0]);
                    bridges[i] = snap_position(&bridge_line, bridge_positions[i], bridges[0]);
                }
            }
        }
    }

    if config.scale.mode != ScaleLengthMode::Single && n > 1 {
        align_string_centers(config, &mut nuts, &mut bridges);
    }
    apply_skew(config, &mut nuts, &mut bridges);
    recenter_symmetric_ends(config, &widths, &mut nuts, &mut bridges);

    for i in 0..n {
        debug!(string = i, nut = ?nuts[i], bridge = ?bridges[i], "string path");
        layout.push(StringElement::new(i, i, nuts[i], bridges[i]));
    }
    for i in 0..n.saturating_sub(1) {
        layout.push(StringMedianElement {
            lower: i,
            upper: i + 1,
            path: StraightPath::new(
                nuts[i].midpoint(nuts[i + 1]),
                bridges[i].midpoint(bridges[i + 1]),
            ),
        });
    }
    Ok(())
}

/// Total physical width of each course. Missing gauge data counts as zero
/// width; warn when spacing actually depends on it.
fn course_widths(config: &LayoutConfiguration, messages: &mut Messages) -> Vec<Scalar> {
    let widths_used = config.nut.mode == SpacingMode::Proportional
        || config.bridge.mode == SpacingMode::Proportional
        || config.margins.compensate_for_gauge;
    config
        .strings
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let missing = s.gauges.is_empty() || s.gauges.iter().any(|g| g.is_empty());
            if missing && widths_used {
                messages.warning(MessageKey::MissingGaugeWidth, vec![MessageArg::Index(i)]);
            }
            super::course_width(config, i)
        })
        .collect()
}

/// Horizontal string positions at one end, starting at zero (uncentered).
fn end_positions(
    spacing: &EndSpacing,
    widths: &[Scalar],
    n: usize,
    messages: &mut Messages,
) -> Result<Vec<Scalar>, BuildAborted> {
    let gaps = n - 1;
    if spacing.distances.len() != 1 && spacing.distances.len() != gaps {
        messages.error(
            MessageKey::InvalidDistanceCount,
            vec![
                MessageArg::Count(spacing.distances.len()),
                MessageArg::Count(gaps),
            ],
        );
        return Err(BuildAborted);
    }
    if n == 1 {
        return Ok(vec![Scalar::ZERO]);
    }

    let distances: Vec<Scalar> = if spacing.distances.len() == 1 {
        vec![spacing.distances[0]; gaps]
    } else {
        spacing.distances.clone()
    };

    let distances = match spacing.mode {
        SpacingMode::CenterToCenter => distances,
        SpacingMode::Proportional => {
            // Keep the free space between string edges equal: subtract the
            // gauge contribution of every gap from the total spread and
            // share the rest. Decimal division keeps the shares exact, so
            // no rounding remainder is left to redistribute.
            let gauge_gaps: Vec<Scalar> = (0..gaps)
                .map(|i| (widths[i] + widths[i + 1]) / Scalar::TWO)
                .collect();
            let mut total = Scalar::ZERO;
            for d in &distances {
                total += *d;
            }
            let mut occupied = Scalar::ZERO;
            for g in &gauge_gaps {
                occupied += *g;
            }
            let equal_gap = (total - occupied) / Scalar::from(gaps as i64);
            gauge_gaps.iter().map(|g| equal_gap + *g).collect()
        }
    };

    let mut positions = Vec::with_capacity(n);
    positions.push(Scalar::ZERO);
    for d in distances {
        let last = *positions.last().unwrap_or(&Scalar::ZERO);
        positions.push(last + d);
    }
    Ok(positions)
}

/// Subtract the configured center from every position at one end.
/// Manual alignment is resolved separately against the other end.
fn apply_initial_center(
    positions: &mut [Scalar],
    config: &LayoutConfiguration,
    end: End,
    widths: &[Scalar],
) {
    let n = positions.len();
    let center = match alignment_of(config, end) {
        CenterAlignment::OuterStrings => (positions[0] + positions[n - 1]) / Scalar::TWO,
        CenterAlignment::MiddleStrings => {
            if n % 2 == 1 {
                positions[n / 2]
            } else {
                (positions[n / 2 - 1] + positions[n / 2]) / Scalar::TWO
            }
        }
        CenterAlignment::Fingerboard => {
            let mut bass_edge = positions[0] - config.margins.at(end, Side::Bass);
            let mut treble_edge = positions[n - 1] + config.margins.at(end, Side::Treble);
            if config.margins.compensate_for_gauge {
                bass_edge -= widths[0] / Scalar::TWO;
                treble_edge += widths[n - 1] / Scalar::TWO;
            }
            (bass_edge + treble_edge) / Scalar::TWO
        }
        CenterAlignment::Manual => return,
    };
    for p in positions {
        *p -= center;
    }
}

fn alignment_of(config: &LayoutConfiguration, end: End) -> CenterAlignment {
    match end {
        End::Nut => config.nut.alignment,
        End::Bridge => config.bridge.alignment,
    }
}

/// Line this end up with the other one: the point at the configured
/// fraction of this end's spread coincides with the same fraction of the
/// other end's spread.
fn apply_manual_alignment(positions: &mut [Scalar], other: &[Scalar], spacing: &EndSpacing) {
    let n = positions.len();
    let ratio = spacing
        .manual_ratio
        .filter(|r| !r.is_empty())
        .unwrap_or(Scalar::new(5, 1));
    let anchor = positions[0] + ratio * (positions[n - 1] - positions[0]);
    let other_anchor = other[0] + ratio * (other[n - 1] - other[0]);
    let offset = anchor - other_anchor;
    for p in positions {
        *p -= offset;
    }
}

/// Whether the configured scale length is the straight string length and
/// must be shortened into a fingerboard span before anchoring endpoints.
fn taper_applies(config: &LayoutConfiguration) -> bool {
    let scale = &config.scale;
    let method = match scale.method {
        ScaleCalculationMethod::Auto => {
            if scale.mode == ScaleLengthMode::Single {
                ScaleCalculationMethod::AlongFingerboard
            } else {
                ScaleCalculationMethod::AlongString
            }
        }
        other => other,
    };
    match scale.mode {
        ScaleLengthMode::Single => method == ScaleCalculationMethod::AlongFingerboard,
        ScaleLengthMode::Multiscale | ScaleLengthMode::PerString => {
            method == ScaleCalculationMethod::AlongString
        }
    }
}

fn resolve_outer_scales(
    config: &LayoutConfiguration,
    n: usize,
    messages: &mut Messages,
) -> Result<(Scalar, Scalar), BuildAborted> {
    let scale = &config.scale;
    let present = |v: Option<Scalar>| v.filter(|s| !s.is_empty());
    match scale.mode {
        ScaleLengthMode::Single => match present(scale.single) {
            Some(s) => Ok((s, s)),
            None => {
                messages.error(
                    MessageKey::MissingScaleLength,
                    vec![MessageArg::Text("the instrument".into())],
                );
                Err(BuildAborted)
            }
        },
        ScaleLengthMode::Multiscale => {
            if n == 1 {
                messages.warning(MessageKey::UnsupportedScaleMode, vec![]);
                return match present(scale.bass)
                    .or(present(scale.treble))
                    .or(present(scale.single))
                {
                    Some(s) => Ok((s, s)),
                    None => {
                        messages.error(
                            MessageKey::MissingScaleLength,
                            vec![MessageArg::Text("the instrument".into())],
                        );
                        Err(BuildAborted)
                    }
                };
            }
            let bass = present(scale.bass);
            let treble = present(scale.treble);
            if bass.is_none() {
                messages.error(
                    MessageKey::MissingScaleLength,
                    vec![MessageArg::Side(Side::Bass)],
                );
            }
            if treble.is_none() {
                messages.error(
                    MessageKey::MissingScaleLength,
                    vec![MessageArg::Side(Side::Treble)],
                );
            }
            match (bass, treble) {
                (Some(b), Some(t)) => Ok((b, t)),
                _ => Err(BuildAborted),
            }
        }
        ScaleLengthMode::PerString => unreachable!("per-string scales are resolved per string"),
    }
}

/// Anchor one string's endpoints from its 1D positions and scale length.
#[allow(clippy::too_many_arguments)]
fn place_string(
    i: usize,
    nominal: Scalar,
    adjust: bool,
    nut_positions: &[Scalar],
    bridge_positions: &[Scalar],
    nuts: &mut [Vec2],
    bridges: &mut [Vec2],
    messages: &mut Messages,
) -> Result<(), BuildAborted> {
    let dx = nut_positions[i] - bridge_positions[i];
    let effective = if adjust && dx.to_f64().abs() > GEOMETRY_EPSILON {
        // The configured value is the straight string length; the
        // fingerboard span is the vertical leg of the triangle it spans:
        // adjusted = nominal * cos(asin(|dx| / nominal)).
        let offset = dx.to_f64().abs();
        let length = nominal.to_f64();
        if length <= 0.0 || offset >= length {
            messages.error(MessageKey::ScaleLengthTooShort, vec![MessageArg::Index(i)]);
            return Err(BuildAborted);
        }
        nominal * (dx.abs() / nominal).asin().cos()
    } else {
        nominal
    };
    let half = effective / Scalar::TWO;
    nuts[i] = Vec2::new(nut_positions[i], half);
    bridges[i] = Vec2::new(bridge_positions[i], -half);
    Ok(())
}

/// Snap an inner string onto the outer pair's anchor line with a vertical
/// probe. Falls back to the bass anchor's height when the line is itself
/// vertical (zero spread).
fn snap_position(line: &StraightPath, x: Scalar, fallback: Vec2) -> Vec2 {
    line.snap_to_line(Vec2::new(x, Scalar::ZERO), Probe::Vertical)
        .unwrap_or(Vec2::new(x, fallback.y))
}

/// Shift every string vertically so the points at the configured fraction
/// of each string line up, mapping each string's length deficit against
/// the longest string.
fn align_string_centers(config: &LayoutConfiguration, nuts: &mut [Vec2], bridges: &mut [Vec2]) {
    let n = nuts.len();
    let ratio = if config.scale.alignment_ratio.is_empty() {
        0.5
    } else {
        config.scale.alignment_ratio.to_f64()
    };
    let lengths: Vec<f64> = (0..n)
        .map(|i| (nuts[i] - bridges[i]).length().to_f64())
        .collect();
    let longest = lengths.iter().cloned().fold(0.0, f64::max);
    for i in 0..n {
        let deficit = longest - lengths[i];
        if deficit.abs() < GEOMETRY_EPSILON {
            continue;
        }
        let shift = Scalar::approx(deficit * (0.5 - ratio));
        nuts[i].y += shift;
        bridges[i].y += shift;
    }
}

/// Additional vertical shear, linear in the horizontal position: the outer
/// treble string moves by the full skew, the outer bass string by its
/// negative, the center not at all.
fn apply_skew(config: &LayoutConfiguration, nuts: &mut [Vec2], bridges: &mut [Vec2]) {
    let n = nuts.len();
    let skew = config.bass_treble_skew;
    if n < 2 || skew.is_empty() || skew.is_zero() {
        return;
    }
    let amount = skew.to_f64();
    for points in [nuts, bridges] {
        let bass_x = points[0].x.to_f64();
        let treble_x = points[n - 1].x.to_f64();
        let center = (bass_x + treble_x) / 2.0;
        let half_spread = (treble_x - bass_x) / 2.0;
        if half_spread.abs() < GEOMETRY_EPSILON {
            continue;
        }
        for p in points.iter_mut() {
            let dy = amount * (p.x.to_f64() - center) / half_spread;
            p.y += Scalar::approx(dy);
        }
    }
}

/// Iteratively re-center the ends configured with a symmetric policy.
///
/// A fixed number of passes; for the fingerboard policy the centering edge
/// is the margin-offset line parallel to the outer string, cut at that
/// end's extremal Y, so each pass feeds back into the next through the
/// string directions.
fn recenter_symmetric_ends(
    config: &LayoutConfiguration,
    widths: &[Scalar],
    nuts: &mut [Vec2],
    bridges: &mut [Vec2],
) {
    let n = nuts.len();
    if n < 2 {
        return;
    }
    let symmetric = |alignment: CenterAlignment| {
        matches!(
            alignment,
            CenterAlignment::OuterStrings | CenterAlignment::Fingerboard
        )
    };
    let nut_symmetric = symmetric(config.nut.alignment);
    let bridge_symmetric = symmetric(config.bridge.alignment);
    if !nut_symmetric && !bridge_symmetric {
        return;
    }

    for _ in 0..config.constants.symmetric_alignment_passes {
        if nut_symmetric {
            recenter_end(config, End::Nut, widths, nuts, bridges);
        }
        if bridge_symmetric {
            recenter_end(config, End::Bridge, widths, nuts, bridges);
        }
    }
}

fn recenter_end(
    config: &LayoutConfiguration,
    end: End,
    widths: &[Scalar],
    nuts: &mut [Vec2],
    bridges: &mut [Vec2],
) {
    let n = nuts.len();
    let center = match alignment_of(config, end) {
        CenterAlignment::OuterStrings => {
            let points: &[Vec2] = match end {
                End::Nut => nuts,
                End::Bridge => bridges,
            };
            Some((points[0].x + points[n - 1].x) / Scalar::TWO)
        }
        CenterAlignment::Fingerboard => fingerboard_center(config, end, widths, nuts, bridges),
        _ => None,
    };
    let Some(center) = center else { return };
    if center.to_f64().abs() < GEOMETRY_EPSILON {
        return;
    }
    let points: &mut [Vec2] = match end {
        End::Nut => nuts,
        End::Bridge => bridges,
    };
    for p in points {
        p.x -= center;
    }
}

/// Horizontal center of the two fingerboard edges at one end: each edge is
/// the outer string offset outward by its margin (plus half the string
/// width when compensating), intersected with the horizontal line at the
/// end's extremal Y.
fn fingerboard_center(
    config: &LayoutConfiguration,
    end: End,
    widths: &[Scalar],
    nuts: &[Vec2],
    bridges: &[Vec2],
) -> Option<Scalar> {
    let n = nuts.len();
    let end_points = match end {
        End::Nut => nuts,
        End::Bridge => bridges,
    };
    let ys = end_points.iter().map(|p| p.y.to_f64());
    let extremal = match end {
        End::Nut => ys.fold(f64::MIN, f64::max),
        End::Bridge => ys.fold(f64::MAX, f64::min),
    };
    let horizontal = LineEquation::sloped(Scalar::ZERO, Scalar::approx(extremal));

    let edge_x = |side: Side| -> Option<Scalar> {
        let i = match side {
            Side::Bass => 0,
            Side::Treble => n - 1,
        };
        let path = StraightPath::new(nuts[i], bridges[i]);
        let outward = outward_perpendicular(path.direction()?, side);
        let mut distance = config.margins.at(end, side).to_f64();
        if config.margins.compensate_for_gauge {
            distance += widths[i].to_f64() / 2.0;
        }
        let offset = Vec2::from_dvec2(outward * distance);
        let edge = LineEquation::through(nuts[i] + offset, bridges[i] + offset);
        Some(edge.intersect(&horizontal)?.x)
    };

    let bass_x = edge_x(Side::Bass)?;
    let treble_x = edge_x(Side::Treble)?;
    Some((bass_x + treble_x) / Scalar::TWO)
}
