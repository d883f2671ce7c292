//! Fingerboard-edge construction.
//!
//! Each side's boundary is the outer string path pushed outward,
//! perpendicular to the string, by the configured nut/bridge margins.
//! When margin compensation is on, half the outer string's total width is
//! added so the margin is measured from the string's edge. The fret
//! builder later snaps the edge endpoints onto the nut and bridge fret
//! shapes.

use glam::DVec2;

use crate::config::{End, LayoutConfiguration, Side};
use crate::geom::Vec2;
use crate::messages::{BuildAborted, MessageArg, MessageKey, Messages};
use crate::path::StraightPath;

use super::elements::FingerboardSideElement;
use super::{Layout, course_width};

/// Perpendicular of a string direction pointing away from the fingerboard
/// center: negative X for the bass side, positive X for the treble side.
pub(crate) fn outward_perpendicular(direction: DVec2, side: Side) -> DVec2 {
    let perp = direction.perp();
    match side {
        Side::Bass if perp.x > 0.0 => -perp,
        Side::Treble if perp.x < 0.0 => -perp,
        _ => perp,
    }
}

pub(crate) fn build(
    config: &LayoutConfiguration,
    layout: &mut Layout,
    messages: &mut Messages,
) -> Result<(), BuildAborted> {
    let n = config.string_count();
    for side in [Side::Bass, Side::Treble] {
        let index = match side {
            Side::Bass => 0,
            Side::Treble => n - 1,
        };
        let string = layout
            .string(index)
            .expect("strings are built before edges");
        let Some(direction) = string.path.direction() else {
            messages.error(
                MessageKey::UnexpectedError,
                vec![MessageArg::Text(format!(
                    "string {} has a degenerate path",
                    index + 1
                ))],
            );
            return Err(BuildAborted);
        };
        let outward = outward_perpendicular(direction, side);

        let compensation = if config.margins.compensate_for_gauge {
            course_width(config, index).to_f64() / 2.0
        } else {
            0.0
        };
        let offset_at = |end: End| {
            Vec2::from_dvec2(outward * (config.margins.at(end, side).to_f64() + compensation))
        };

        let nut_point = string.nut + offset_at(End::Nut);
        let bridge_point = string.bridge + offset_at(End::Bridge);
        layout.push(FingerboardSideElement {
            side,
            path: StraightPath::new(nut_point, bridge_point),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outward_perpendicular_points_away_from_center() {
        // a string running from nut (top) to bridge (bottom)
        let down = DVec2::new(0.0, -1.0);
        assert!(outward_perpendicular(down, Side::Bass).x < 0.0);
        assert!(outward_perpendicular(down, Side::Treble).x > 0.0);

        // flipped direction must not flip the outward side
        let up = DVec2::new(0.0, 1.0);
        assert!(outward_perpendicular(up, Side::Bass).x < 0.0);
        assert!(outward_perpendicular(up, Side::Treble).x > 0.0);
    }
}
