//! SVG path strings for parent-child links.

use std::f64::consts::PI;

use crate::tree::Polar;

/// Compact number formatting for path data: at most two decimals, no
/// trailing zeros, never `-0`.
fn num(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0 + 0.0;
    format!("{rounded}")
}

/// Orthogonal elbow: vertical from the parent, then horizontal to the child.
pub fn elbow_path(parent: (f64, f64), child: (f64, f64)) -> String {
    format!(
        "M {},{} V {} H {}",
        num(parent.0),
        num(parent.1),
        num(child.1),
        num(child.0)
    )
}

/// Arc along the parent's ring to the child's angle, then a radial line out
/// to the child. Falls back to a straight line when the angular delta is
/// under `epsilon` or the parent sits at the centre.
pub fn radial_path(center: (f64, f64), parent: Polar, child: Polar, epsilon: f64) -> String {
    let point = |polar: Polar| {
        let (dx, dy) = polar.to_cartesian();
        (center.0 + dx, center.1 + dy)
    };
    let end = point(child);
    let delta = child.angle - parent.angle;

    if delta.abs() < epsilon || parent.radius.abs() < 1e-9 {
        let start = point(parent);
        return format!("M {},{} L {},{}", num(start.0), num(start.1), num(end.0), num(end.1));
    }

    let start = point(parent);
    let corner = point(Polar {
        angle: child.angle,
        radius: parent.radius,
    });
    let large_arc = u8::from(delta.abs() > PI);
    let sweep = u8::from(delta > 0.0);
    let r = num(parent.radius);
    format!(
        "M {},{} A {r},{r} 0 {large_arc},{sweep} {},{} L {},{}",
        num(start.0),
        num(start.1),
        num(corner.0),
        num(corner.1),
        num(end.0),
        num(end.1)
    )
}
