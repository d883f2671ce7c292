//! End-to-end layout scenarios.
//!
//! The angle thresholds and the symmetric-alignment pass count asserted
//! here are calibration values carried over from the original design, not
//! physical constants.

use pretty_assertions::assert_eq;

use fretlay::config::{
    CenterAlignment, EndSpacing, LayoutConfiguration, Margins, ScaleConfig, Side, SpacingMode,
    StringConfig,
};
use fretlay::layout::BRIDGE_FRET_INDEX;
use fretlay::scalar::Scalar;
use fretlay::{Layout, Severity, build};

fn assert_close(a: f64, b: f64, tolerance: f64) {
    assert!((a - b).abs() <= tolerance, "{a} != {b} (±{tolerance})");
}

fn built(config: &LayoutConfiguration) -> Layout {
    let outcome = build(config);
    assert!(outcome.success, "build failed: {:?}", outcome.messages);
    outcome.layout.expect("successful builds carry a layout")
}

/// Standard acoustic gauge set in millimetres, bass first.
fn standard_gauges() -> Vec<Scalar> {
    vec![
        Scalar::new(117, 2),
        Scalar::new(91, 2),
        Scalar::new(66, 2),
        Scalar::new(43, 2),
        Scalar::new(33, 2),
        Scalar::new(25, 2),
    ]
}

fn six_string(nut: EndSpacing, bridge: EndSpacing) -> LayoutConfiguration {
    LayoutConfiguration {
        strings: standard_gauges()
            .into_iter()
            .map(StringConfig::plain)
            .collect(),
        scale: ScaleConfig::single(Scalar::new(6477, 1)),
        nut,
        bridge,
        margins: Margins::zero(),
        fret_count: 24,
        ..LayoutConfiguration::default()
    }
}

// ==================== 12-TET placement ====================

#[test]
fn fret_positions_follow_equal_temperament() {
    let scale = 648.0;
    let config = LayoutConfiguration {
        strings: vec![StringConfig::plain(Scalar::ONE)],
        scale: ScaleConfig::single(Scalar::from(648)),
        nut: EndSpacing::uniform(Scalar::from(10)),
        bridge: EndSpacing::uniform(Scalar::from(10)),
        fret_count: 24,
        ..LayoutConfiguration::default()
    };
    let layout = built(&config);
    let bridge_y = layout.string(0).unwrap().bridge.y.to_f64();

    for fret in 1..=24 {
        let segment = layout
            .fret_segments_for(fret)
            .next()
            .unwrap_or_else(|| panic!("missing fret {fret}"));
        let point = segment.real_points().next().expect("a real point");
        let from_bridge = point.position.y.to_f64() - bridge_y;
        let expected = scale / 2f64.powf(fret as f64 / 12.0);
        assert_close(from_bridge, expected, 1e-9 * expected);
    }

    // the twelfth fret halves the string exactly
    let twelfth = layout.fret_segments_for(12).next().unwrap();
    let point = twelfth.real_points().next().unwrap();
    let from_bridge = point.position.y.to_f64() - bridge_y;
    assert_close(from_bridge, scale / 2.0, 1e-9 * scale);
}

// ==================== taper compensation ====================

#[test]
fn default_calculation_method_preserves_straight_string_length() {
    // multiscale fan: the configured values are straight string lengths
    let mut config = six_string(
        EndSpacing::uniform(Scalar::new(73, 1)),
        EndSpacing::uniform(Scalar::new(105, 1)),
    );
    config.scale = ScaleConfig::multiscale(Scalar::from(686), Scalar::from(635));
    let layout = built(&config);

    let bass = layout.string(0).unwrap();
    assert_close((bass.nut - bass.bridge).length().to_f64(), 686.0, 1e-9);
    let treble = layout.string(5).unwrap();
    assert_close((treble.nut - treble.bridge).length().to_f64(), 635.0, 1e-9);
}

#[test]
fn single_scale_taper_preserves_straight_string_length() {
    let config = six_string(
        EndSpacing::uniform(Scalar::new(73, 1)),
        EndSpacing::uniform(Scalar::new(105, 1)),
    );
    let layout = built(&config);
    for index in [0usize, 5] {
        let s = layout.string(index).unwrap();
        assert_close((s.nut - s.bridge).length().to_f64(), 647.7, 1e-9);
    }
}

// ==================== spacing cardinality ====================

#[test]
fn wrong_distance_count_fails_without_a_layout() {
    let mut config = six_string(
        EndSpacing::uniform(Scalar::from(7)),
        EndSpacing::uniform(Scalar::from(10)),
    );
    config.bridge.distances = vec![Scalar::from(10); 3]; // needs 1 or 5
    let outcome = build(&config);
    assert!(!outcome.success);
    assert!(outcome.layout.is_none());
    assert!(
        outcome
            .messages
            .iter()
            .any(|m| m.severity == Severity::Error)
    );
}

// ==================== segment coverage ====================

#[test]
fn fret_segments_partition_the_fretted_strings() {
    let mut config = six_string(
        EndSpacing::uniform(Scalar::new(73, 1)),
        EndSpacing::uniform(Scalar::new(105, 1)),
    );
    config.strings[0].start_fret = 2;
    config.strings[1].start_fret = 1;
    config.strings[5].fret_count = Some(20);
    let layout = built(&config);

    for fret in 0..=24 {
        let mut covered: Vec<usize> = Vec::new();
        for segment in layout.fret_segments_for(fret) {
            for point in segment.real_points() {
                assert!(
                    !covered.contains(&point.string),
                    "fret {fret}: string {} covered twice",
                    point.string
                );
                covered.push(point.string);
            }
        }
        covered.sort_unstable();
        let expected: Vec<usize> = (0..6)
            .filter(|&s| {
                let start = config.strings[s].start_fret;
                let last = config.strings[s].fret_count.unwrap_or(config.fret_count) as i32;
                fret >= start && fret <= last
            })
            .collect();
        assert_eq!(covered, expected, "fret {fret}");
    }
}

#[test]
fn no_segment_consists_of_reference_points_only() {
    let mut config = six_string(
        EndSpacing::uniform(Scalar::new(73, 1)),
        EndSpacing::uniform(Scalar::new(105, 1)),
    );
    config.strings[2].start_fret = 5;
    config.strings[3].fret_count = Some(12);
    let layout = built(&config);
    for segment in layout.fret_segments() {
        assert!(
            segment.real_points().next().is_some(),
            "fret {}: all-reference segment",
            segment.fret
        );
    }
}

// ==================== symmetric alignment ====================

#[test]
fn symmetric_fingerboard_alignment_converges_to_center() {
    let mut config = six_string(
        EndSpacing::uniform(Scalar::new(73, 1)),
        EndSpacing::uniform(Scalar::new(105, 1)),
    );
    config.nut.alignment = CenterAlignment::Fingerboard;
    config.bridge.alignment = CenterAlignment::Fingerboard;
    config.margins = Margins {
        nut_bass: Scalar::from(3),
        nut_treble: Scalar::from(3),
        bridge_bass: Scalar::from(5),
        bridge_treble: Scalar::from(5),
        compensate_for_gauge: false,
    };
    let layout = built(&config);

    let nut_mid =
        (layout.string(0).unwrap().nut.x.to_f64() + layout.string(5).unwrap().nut.x.to_f64()) / 2.0;
    let bridge_mid = (layout.string(0).unwrap().bridge.x.to_f64()
        + layout.string(5).unwrap().bridge.x.to_f64())
        / 2.0;
    assert_close(nut_mid, 0.0, 1e-6);
    assert_close(bridge_mid, 0.0, 1e-6);
}

// ==================== mirroring ====================

#[test]
fn horizontal_flip_is_an_involution() {
    let mut config = six_string(
        EndSpacing::uniform(Scalar::new(73, 1)),
        EndSpacing::uniform(Scalar::new(105, 1)),
    );
    config.scale = ScaleConfig::multiscale(Scalar::from(686), Scalar::from(635));
    config.strings[0].start_fret = 1;
    let original = built(&config);

    let mut flipped = original.clone();
    flipped.flip_horizontal();
    flipped.flip_horizontal();
    assert_eq!(original, flipped);
}

#[test]
fn left_handed_flip_mirrors_the_sides() {
    let mut config = six_string(
        EndSpacing::uniform(Scalar::new(73, 1)),
        EndSpacing::uniform(Scalar::new(105, 1)),
    );
    let right = built(&config);
    config.left_handed = true;
    let left = built(&config);

    let r = right.side(Side::Bass).unwrap().nut_point();
    let l = left.side(Side::Bass).unwrap().nut_point();
    assert_close(r.x.to_f64(), -l.x.to_f64(), 1e-9);
    assert_close(r.y.to_f64(), l.y.to_f64(), 1e-9);
}

// ==================== the reference scenario ====================

/// 6-string, 25.5" (647.7 mm) single scale, proportional 7.3 mm nut
/// spacing, center-to-center 10.5 mm bridge spacing, 24 frets, zero
/// margins.
#[test]
fn reference_six_string_scenario() {
    let nut = EndSpacing {
        mode: SpacingMode::Proportional,
        alignment: CenterAlignment::OuterStrings,
        distances: vec![Scalar::new(73, 1)],
        manual_ratio: None,
    };
    let bridge = EndSpacing {
        mode: SpacingMode::CenterToCenter,
        alignment: CenterAlignment::OuterStrings,
        distances: vec![Scalar::new(105, 1)],
        manual_ratio: None,
    };
    let config = six_string(nut, bridge);
    let layout = built(&config);

    let nut_xs: Vec<f64> = (0..6)
        .map(|i| layout.string(i).unwrap().nut.x.to_f64())
        .collect();

    // outer strings symmetric about zero
    assert_close(nut_xs[0], -nut_xs[5], 1e-9);
    assert_close(nut_xs[0] + nut_xs[5], 0.0, 1e-9);

    // every free-space gap equals 7.3 mm minus the shared gauge
    // compensation
    let gauges: Vec<f64> = standard_gauges().iter().map(|g| g.to_f64()).collect();
    let compensation: f64 = (0..5).map(|i| (gauges[i] + gauges[i + 1]) / 2.0).sum::<f64>() / 5.0;
    let expected_gap = 7.3 - compensation;
    for i in 0..5 {
        let free = nut_xs[i + 1] - nut_xs[i] - (gauges[i] + gauges[i + 1]) / 2.0;
        assert_close(free, expected_gap, 1e-9);
    }

    // the twelfth fret is one straight segment lying on the y = 0 axis
    let segments: Vec<_> = layout.fret_segments_for(12).collect();
    assert_eq!(segments.len(), 1);
    let shape = &segments[0].shape;
    assert!(shape.is_straight(), "fret 12 should be straight");
    let first = shape.first_point().unwrap();
    let last = shape.last_point().unwrap();
    let midpoint = first.midpoint(last);
    assert_close(midpoint.y.to_f64(), 0.0, 1e-6);
    assert_close(midpoint.x.to_f64(), 0.0, 1e-6);

    // bridge spacing is plain center-to-center
    let bridge_xs: Vec<f64> = (0..6)
        .map(|i| layout.string(i).unwrap().bridge.x.to_f64())
        .collect();
    for i in 0..5 {
        assert_close(bridge_xs[i + 1] - bridge_xs[i], 10.5, 1e-9);
    }
}

// ==================== extended fingerboards ====================

/// Negative starting frets (board extended above the nut) run through the
/// same relocation and splitting paths as positive ones; this probes them
/// directly instead of assuming symmetry.
#[test]
fn negative_start_fret_extends_above_the_nut() {
    let mut config = six_string(
        EndSpacing::uniform(Scalar::new(73, 1)),
        EndSpacing::uniform(Scalar::new(105, 1)),
    );
    config.strings[0].start_fret = -2;
    let layout = built(&config);

    // the extended string's nut moved above its original start
    let extended = layout.string(0).unwrap();
    assert!(extended.nut.y.to_f64() > extended.start.y.to_f64());
    assert_eq!(extended.path.start, extended.nut);

    // rows exist above fret zero and cover only the extended string
    for fret in [-2, -1] {
        let mut covered: Vec<usize> = Vec::new();
        for segment in layout.fret_segments_for(fret) {
            covered.extend(segment.real_points().map(|p| p.string));
        }
        assert_eq!(covered, vec![0], "fret {fret}");
    }

    // its nut row sits at fret -2 and is flagged as a nut
    let nut_segment = layout
        .fret_segments_for(-2)
        .find(|s| s.is_nut_segment())
        .expect("extended nut row");
    assert!(nut_segment.real_points().all(|p| p.is_nut));

    // the other strings still open at fret zero
    let zero_cover: Vec<usize> = layout
        .fret_segments_for(0)
        .flat_map(|s| s.real_points().map(|p| p.string))
        .collect();
    assert_eq!(zero_cover, vec![0, 1, 2, 3, 4, 5]);
}

// ==================== bounds & bridge row ====================

#[test]
fn bounds_cover_edges_and_bridge_row() {
    let config = six_string(
        EndSpacing::uniform(Scalar::new(73, 1)),
        EndSpacing::uniform(Scalar::new(105, 1)),
    );
    let layout = built(&config);
    let bounds = layout.bounds();
    assert!(!bounds.is_empty());

    // the bridge row exists and spans all strings
    let bridge_cover: Vec<usize> = layout
        .fret_segments_for(BRIDGE_FRET_INDEX)
        .flat_map(|s| s.real_points().map(|p| p.string))
        .collect();
    assert_eq!(bridge_cover, vec![0, 1, 2, 3, 4, 5]);

    // bounds reach at least as wide as the fingerboard edges
    let bass = layout.side(Side::Bass).unwrap();
    assert!(bounds.min.x <= bass.nut_point().x.to_f64() + 1e-9);
}
