//! Exact 2D segment predicates
//!
//! Segments are checked half-open along a trail: a -> b -> c never collides
//! at b, while a -> b followed by b -> a does.

use glam::Vec2;

/// Inclusive overlap of the bounding boxes of a1->a2 and b1->b2
#[inline]
pub fn box_overlap(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> bool {
    let (a_min, a_max) = (a1.min(a2), a1.max(a2));
    let (b_min, b_max) = (b1.min(b2), b1.max(b2));
    a_min.x <= b_max.x && a_max.x >= b_min.x && a_min.y <= b_max.y && a_max.y >= b_min.y
}

/// Check whether the stored segment a1->a2 is struck by the new segment b1->b2
///
/// Rules, in order:
/// - Parallel and connected (`a2 == b1`): only doubling back collides.
/// - Parallel, not connected: head-on ends (`a2 == b2`) collide; otherwise
///   segments on one line collide when their boxes overlap. Parallel
///   segments on distinct lines never meet.
/// - Connected but not parallel: never (a trail may turn off its own tail).
/// - Otherwise the crossing point must lie on both segments and be interior
///   to at least one of them. Two segments sharing only an endpoint do not
///   collide.
///
/// Only `a2 == b1` counts as connected; the other endpoint pairs do not.
pub fn intersects(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> bool {
    let s1 = a2 - a1;
    let s2 = b2 - b1;

    let connected = a2 == b1;
    let denom = s1.perp_dot(s2);

    if denom == 0.0 {
        if connected {
            // Pointing away from each other?
            return s1.x * s2.x < 0.0 || s1.y * s2.y < 0.0;
        }

        // Head-on connected
        if a2 == b2 {
            return true;
        }

        if s1.perp_dot(b1 - a1) != 0.0 || s2.perp_dot(a1 - b1) != 0.0 {
            return false;
        }

        // No single crossing point; any overlap counts
        return box_overlap(a1, a2, b1, b2);
    }

    if connected {
        return false;
    }

    // a1 + s*s1 == b1 + t*s2, scaled by denom and flipped to a positive denom
    let d = b1 - a1;
    let (mut s_numer, mut t_numer, mut denom) = (d.perp_dot(s2), d.perp_dot(s1), denom);
    if denom < 0.0 {
        s_numer = -s_numer;
        t_numer = -t_numer;
        denom = -denom;
    }

    if s_numer < 0.0 || s_numer > denom || t_numer < 0.0 || t_numer > denom {
        return false;
    }

    let s_interior = s_numer > 0.0 && s_numer < denom;
    let t_interior = t_numer > 0.0 && t_numer < denom;
    s_interior || t_interior
}

/// Clip a1->a2 to the closed rectangle `min..=max` (Liang-Barsky)
///
/// Returns `None` when no part of the segment lies inside.
pub fn clip(a1: Vec2, a2: Vec2, min: Vec2, max: Vec2) -> Option<(Vec2, Vec2)> {
    let d = a2 - a1;
    let (mut t0, mut t1) = (0.0_f32, 1.0_f32);

    for (p, q) in [
        (-d.x, a1.x - min.x),
        (d.x, max.x - a1.x),
        (-d.y, a1.y - min.y),
        (d.y, max.y - a1.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    let start = if t0 > 0.0 { a1 + d * t0 } else { a1 };
    let end = if t1 < 1.0 { a1 + d * t1 } else { a2 };
    Some((start, end))
}
