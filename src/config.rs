//! Layout configuration: the immutable input of a build.
//!
//! The configuration is plain data. Values arrive already resolved into
//! one consistent length unit and already looked up (string gauges come
//! from whatever material catalog the caller uses); the core performs no
//! lookups and no unit conversion.

use crate::scalar::Scalar;

/// One of the two fingerboard ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum End {
    Nut,
    Bridge,
}

/// One of the two fingerboard sides. Bass is string 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Bass,
    Treble,
}

/// How scale lengths are configured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ScaleLengthMode {
    /// One scale length for the whole instrument.
    #[default]
    Single,
    /// Distinct bass and treble scale lengths (fanned frets).
    Multiscale,
    /// Every string carries its own scale length.
    PerString,
}

/// What the configured scale length measures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ScaleCalculationMethod {
    /// AlongFingerboard for Single, AlongString otherwise.
    #[default]
    Auto,
    AlongFingerboard,
    AlongString,
}

/// How explicit spacing distances are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SpacingMode {
    /// Distances are center-to-center as given.
    #[default]
    CenterToCenter,
    /// Gaps are adjusted so the free space between string edges stays
    /// equal, compensating for string widths.
    Proportional,
}

/// Which horizontal center the string block is aligned on at one end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CenterAlignment {
    /// Midpoint of the two outer strings (symmetric-strings policy).
    #[default]
    OuterStrings,
    /// Midpoint of the middle string pair.
    MiddleStrings,
    /// Midpoint of the margin-offset fingerboard edges
    /// (symmetric-fingerboard policy).
    Fingerboard,
    /// Align a chosen fraction of this end's spread with the same
    /// fraction of the other end's spread.
    Manual,
}

/// Spacing configuration for one end (nut or bridge).
#[derive(Clone, Debug, PartialEq)]
pub struct EndSpacing {
    pub mode: SpacingMode,
    pub alignment: CenterAlignment,
    /// Center-to-center distances between adjacent strings. Either one
    /// value replicated across all gaps, or exactly `string count - 1`
    /// values.
    pub distances: Vec<Scalar>,
    /// Fraction used by [`CenterAlignment::Manual`]; 0 aligns the bass
    /// edges of both ends, 1 the treble edges, 0.5 the centers.
    pub manual_ratio: Option<Scalar>,
}

impl EndSpacing {
    /// Uniform spacing with the default alignment.
    pub fn uniform(distance: Scalar) -> EndSpacing {
        EndSpacing {
            mode: SpacingMode::default(),
            alignment: CenterAlignment::default(),
            distances: vec![distance],
            manual_ratio: None,
        }
    }
}

impl Default for EndSpacing {
    fn default() -> EndSpacing {
        EndSpacing::uniform(Scalar::from(10))
    }
}

/// Per-string configuration. A string with more than one gauge is a course
/// (for example a twelve-string pair) and is expanded into its physical
/// strings after the build.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct StringConfig {
    /// Gauge per course member; empty means "unknown", which spacing
    /// treats as zero width (with a warning).
    pub gauges: Vec<Scalar>,
    /// Scale length override, required in [`ScaleLengthMode::PerString`].
    pub scale_length: Option<Scalar>,
    /// First fret of the playable range. Zero is the regular nut;
    /// positive values stagger the nut down the neck, negative values
    /// extend the board above it.
    pub start_fret: i32,
    /// Last fret of the playable range; falls back to the global count.
    pub fret_count: Option<u32>,
}

impl StringConfig {
    /// A plain single string with a known gauge.
    pub fn plain(gauge: Scalar) -> StringConfig {
        StringConfig {
            gauges: vec![gauge],
            ..StringConfig::default()
        }
    }

    /// Physical string count of this entry (1 for a plain string).
    pub fn course_size(&self) -> usize {
        self.gauges.len().max(1)
    }
}

/// Scale length configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct ScaleConfig {
    pub mode: ScaleLengthMode,
    pub method: ScaleCalculationMethod,
    /// Required in [`ScaleLengthMode::Single`].
    pub single: Option<Scalar>,
    /// Required in [`ScaleLengthMode::Multiscale`].
    pub bass: Option<Scalar>,
    /// Required in [`ScaleLengthMode::Multiscale`].
    pub treble: Option<Scalar>,
    /// Where strings of different lengths line up along the neck: 0
    /// aligns the nut ends, 1 the bridge ends, 0.5 the centers.
    pub alignment_ratio: Scalar,
}

impl ScaleConfig {
    pub fn single(length: Scalar) -> ScaleConfig {
        ScaleConfig {
            single: Some(length),
            ..ScaleConfig::default()
        }
    }

    pub fn multiscale(bass: Scalar, treble: Scalar) -> ScaleConfig {
        ScaleConfig {
            mode: ScaleLengthMode::Multiscale,
            bass: Some(bass),
            treble: Some(treble),
            ..ScaleConfig::default()
        }
    }
}

impl Default for ScaleConfig {
    fn default() -> ScaleConfig {
        ScaleConfig {
            mode: ScaleLengthMode::default(),
            method: ScaleCalculationMethod::default(),
            single: None,
            bass: None,
            treble: None,
            alignment_ratio: Scalar::new(5, 1),
        }
    }
}

/// Fingerboard margins per end and side, outside the outer strings.
#[derive(Clone, Debug, PartialEq)]
pub struct Margins {
    pub nut_bass: Scalar,
    pub nut_treble: Scalar,
    pub bridge_bass: Scalar,
    pub bridge_treble: Scalar,
    /// Add half the outer string's total width on top of the margin so
    /// the margin is measured from the string's edge rather than its
    /// center.
    pub compensate_for_gauge: bool,
}

impl Margins {
    pub fn zero() -> Margins {
        Margins {
            nut_bass: Scalar::ZERO,
            nut_treble: Scalar::ZERO,
            bridge_bass: Scalar::ZERO,
            bridge_treble: Scalar::ZERO,
            compensate_for_gauge: false,
        }
    }

    pub fn at(&self, end: End, side: Side) -> Scalar {
        match (end, side) {
            (End::Nut, Side::Bass) => self.nut_bass,
            (End::Nut, Side::Treble) => self.nut_treble,
            (End::Bridge, Side::Bass) => self.bridge_bass,
            (End::Bridge, Side::Treble) => self.bridge_treble,
        }
    }
}

impl Default for Margins {
    fn default() -> Margins {
        Margins::zero()
    }
}

/// Default number of passes of the symmetric re-centering loop.
/// An empirically sufficient fixed point, not a derived value.
pub const SYMMETRIC_ALIGNMENT_PASSES: usize = 5;

/// Default minimum angle (degrees) between a fret edge and the string it
/// crosses; below it the fret is too slanted and the segment splits.
pub const MIN_STRING_ANGLE_DEG: f64 = 30.0;

/// Default maximum angle (degrees) between consecutive fret edges before a
/// kink forces a new segment.
pub const MAX_KINK_ANGLE_DEG: f64 = 10.0;

/// Default maximum perpendicular deviation (internal units) under which a
/// kinked fret collapses into a single straight segment.
pub const FRET_STRAIGHTEN_TOLERANCE: f64 = 5.0;

/// Calibration constants of the build. All four are empirical values
/// carried over unchanged; override them only to recalibrate, not because
/// a "correct" value is known.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildConstants {
    pub symmetric_alignment_passes: usize,
    pub min_string_angle_deg: f64,
    pub max_kink_angle_deg: f64,
    pub fret_straighten_tolerance: f64,
}

impl Default for BuildConstants {
    fn default() -> BuildConstants {
        BuildConstants {
            symmetric_alignment_passes: SYMMETRIC_ALIGNMENT_PASSES,
            min_string_angle_deg: MIN_STRING_ANGLE_DEG,
            max_kink_angle_deg: MAX_KINK_ANGLE_DEG,
            fret_straighten_tolerance: FRET_STRAIGHTEN_TOLERANCE,
        }
    }
}

/// Complete input of one layout build.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfiguration {
    /// One entry per logical string (course), bass first.
    pub strings: Vec<StringConfig>,
    pub scale: ScaleConfig,
    pub nut: EndSpacing,
    pub bridge: EndSpacing,
    pub margins: Margins,
    /// Global fret count, overridable per string.
    pub fret_count: u32,
    /// Additional vertical shear: the outer treble string shifts by this
    /// amount toward the bridge, the outer bass string by the same amount
    /// toward the nut, fading linearly to zero at the center.
    pub bass_treble_skew: Scalar,
    /// Free space between the edges of adjacent strings within a course.
    pub course_spacing: Scalar,
    pub left_handed: bool,
    pub constants: BuildConstants,
}

impl LayoutConfiguration {
    /// Number of logical strings (courses count once).
    pub fn string_count(&self) -> usize {
        self.strings.len()
    }
}

impl Default for LayoutConfiguration {
    fn default() -> LayoutConfiguration {
        LayoutConfiguration {
            strings: Vec::new(),
            scale: ScaleConfig::default(),
            nut: EndSpacing::default(),
            bridge: EndSpacing::default(),
            margins: Margins::default(),
            fret_count: 22,
            bass_treble_skew: Scalar::ZERO,
            course_spacing: Scalar::new(25, 1),
            left_handed: false,
            constants: BuildConstants::default(),
        }
    }
}
