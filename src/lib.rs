//! fretlay computes the 2D geometry of a stringed instrument's
//! fingerboard: string paths from nut to bridge, the two fingerboard
//! edges, and the fret lines crossing the strings — straight or kinked —
//! for any string count, single/multiscale/per-string scale lengths,
//! asymmetric spacing and partial or extended fret ranges.
//!
//! The crate is a pure function from a [`config::LayoutConfiguration`] to
//! a [`layout::BuildOutcome`]: no I/O, no rendering, no persistence.
//! Rendering, presets and persistence live in the applications consuming
//! the layout.
//!
//! ```
//! use fretlay::config::{EndSpacing, LayoutConfiguration, ScaleConfig, StringConfig};
//! use fretlay::scalar::Scalar;
//!
//! // a 6-string, 25.5" scale (647.7 mm), 24 frets
//! let config = LayoutConfiguration {
//!     strings: (0..6).map(|_| StringConfig::plain(Scalar::new(3, 1))).collect(),
//!     scale: ScaleConfig::single(Scalar::new(6477, 1)),
//!     nut: EndSpacing::uniform(Scalar::new(73, 1)),
//!     bridge: EndSpacing::uniform(Scalar::new(105, 1)),
//!     fret_count: 24,
//!     ..LayoutConfiguration::default()
//! };
//!
//! let outcome = fretlay::build(&config);
//! assert!(outcome.success);
//! let layout = outcome.layout.expect("successful builds carry a layout");
//! assert_eq!(layout.strings().count(), 6);
//! assert!(!layout.bounds().is_empty());
//! ```
//!
//! All lengths share one caller-chosen unit (millimetres by convention).
//! Coordinates put X across the strings (bass negative after centering)
//! and Y along the neck, nut up, bridge down.

pub mod config;
pub mod geom;
pub mod layout;
pub mod log;
pub mod messages;
pub mod path;
pub mod scalar;

pub use config::LayoutConfiguration;
pub use layout::{BuildOutcome, Layout, build};
pub use messages::{Severity, ValidationMessage};
pub use scalar::Scalar;
