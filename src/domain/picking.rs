//! Ray against capsule picking.
//!
//! Each branch is hit-tested as a capsule: the segment between its endpoints,
//! inflated by the larger endpoint radius. Among all capsules the ray passes
//! through, the one reached first along the ray wins.

use glam::DVec3;
use tracing::trace;

use crate::domain::branch::Branch;

/// Minimum capsule radius, so hair-thin branches stay clickable.
pub const DEFAULT_MIN_PICK_RADIUS: f64 = 0.005;
/// Relative threshold below which ray and segment count as parallel.
pub const PARALLEL_EPSILON: f64 = 1e-12;
/// Direction used when a ray is built from a zero vector.
pub const FALLBACK_RAY_DIRECTION: DVec3 = DVec3::Z;

/// Half-line `origin + t * direction`, `t >= 0`, with unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    pub direction: DVec3,
}

impl Ray {
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        let direction = direction.try_normalize().unwrap_or(FALLBACK_RAY_DIRECTION);
        Self { origin, direction }
    }

    #[inline]
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.direction * t
    }
}

/// Segment with a single hit radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capsule {
    pub start: DVec3,
    pub end: DVec3,
    pub radius: f64,
}

impl Capsule {
    /// Closest approach when the ray passes within `radius`.
    pub fn intersect(&self, ray: &Ray) -> Option<Approach> {
        let approach = closest_approach(ray.origin, ray.direction, self.start, self.end);
        (approach.distance < self.radius).then_some(approach)
    }
}

/// Closest approach between a ray and a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Approach {
    /// Distance between the two closest points.
    pub distance: f64,
    /// Ray parameter of the closest point on the ray, `>= 0`.
    pub ray_t: f64,
}

/// Closest point on segment `[a, b]` to `p`, as the segment parameter in `[0, 1]`.
pub fn closest_on_segment(p: DVec3, a: DVec3, b: DVec3) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return 0.0;
    }
    ((p - a).dot(ab) / len2).clamp(0.0, 1.0)
}

/// Minimum distance between the ray `origin + t * direction` and the segment `[start, end]`.
///
/// `direction` need not be normalized; `ray_t` is measured in units of the
/// normalized direction. Solves the unconstrained skew-line problem, then
/// clamps the segment parameter to `[0, 1]` and the ray parameter to `>= 0`
/// independently and measures the distance between the clamped points. Near a
/// segment end this overestimates the true distance slightly.
pub fn closest_approach(origin: DVec3, direction: DVec3, start: DVec3, end: DVec3) -> Approach {
    let d = direction.normalize_or_zero();
    let ab = end - start;
    let ao = origin - start;

    let dd = d.length_squared();
    let abab = ab.length_squared();
    let dab = d.dot(ab);
    let denom = dd * abab - dab * dab;

    if denom <= PARALLEL_EPSILON * dd * abab || dd == 0.0 || abab == 0.0 {
        return parallel_approach(origin, d, start, end);
    }

    let ao_d = ao.dot(d);
    let ao_ab = ao.dot(ab);
    let s = ((dd * ao_ab - dab * ao_d) / denom).clamp(0.0, 1.0);
    let t = ((dab * ao_ab - abab * ao_d) / denom).max(0.0);

    Approach {
        distance: (origin + d * t).distance(start + ab * s),
        ray_t: t,
    }
}

/// Ray and segment (anti)parallel, or either degenerate.
///
/// The segment endpoint reached first along the ray fixes `t`; with the ray
/// pointing away from the whole segment this reduces to projecting the origin.
/// Reporting `t = 0` here would be simpler, but a ray looking straight down a
/// vessel must report where it meets that vessel so the nearest-`t` rule picks
/// the front branch.
fn parallel_approach(origin: DVec3, d: DVec3, start: DVec3, end: DVec3) -> Approach {
    let t = if d == DVec3::ZERO {
        0.0
    } else {
        (start - origin).dot(d).min((end - origin).dot(d)).max(0.0)
    };
    let on_ray = origin + d * t;
    let s = closest_on_segment(on_ray, start, end);
    let ab = end - start;

    Approach {
        distance: on_ray.distance(start + ab * s),
        ray_t: t,
    }
}

/// A picked branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub branch: usize,
    pub distance: f64,
    pub ray_t: f64,
}

/// Nearest-hit-wins branch picker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Picker {
    pub min_radius: f64,
}

impl Default for Picker {
    fn default() -> Self {
        Self {
            min_radius: DEFAULT_MIN_PICK_RADIUS,
        }
    }
}

impl Picker {
    pub fn new(min_radius: f64) -> Self {
        Self { min_radius }
    }

    /// Branch whose capsule the ray enters closest to its origin.
    ///
    /// Ties keep the branch that comes first in `branches`.
    pub fn pick(&self, branches: &[Branch], ray: &Ray) -> Option<Hit> {
        let mut best: Option<Hit> = None;
        for branch in branches {
            let Some(approach) = branch.capsule(self.min_radius).intersect(ray) else {
                continue;
            };
            trace!(branch = branch.id, t = approach.ray_t, d = approach.distance, "candidate");
            if best.map_or(true, |b| approach.ray_t < b.ray_t) {
                best = Some(Hit {
                    branch: branch.id,
                    distance: approach.distance,
                    ray_t: approach.ray_t,
                });
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn given_perpendicular_ray_when_crossing_segment_then_zero_distance() {
        let a = closest_approach(
            DVec3::new(0.5, 0.0, 3.0),
            DVec3::new(0.0, 0.0, -2.0),
            DVec3::ZERO,
            DVec3::X,
        );

        assert!(a.distance < EPS);
        assert!((a.ray_t - 3.0).abs() < EPS);
    }

    #[test]
    fn given_ray_passing_beyond_segment_end_when_measuring_then_distance_to_endpoint() {
        let a = closest_approach(
            DVec3::new(2.0, 0.0, 5.0),
            DVec3::NEG_Z,
            DVec3::ZERO,
            DVec3::X,
        );

        assert!((a.distance - 1.0).abs() < EPS);
        assert!((a.ray_t - 5.0).abs() < EPS);
    }

    #[test]
    fn given_segment_behind_origin_when_measuring_then_t_clamped_to_zero() {
        let a = closest_approach(
            DVec3::new(0.0, 0.0, 5.0),
            DVec3::Z,
            DVec3::new(-1.0, 0.0, 0.0),
            DVec3::X,
        );

        assert_eq!(a.ray_t, 0.0);
        assert!((a.distance - 5.0).abs() < EPS);
    }

    #[test]
    fn given_parallel_offset_ray_when_measuring_then_reports_gap() {
        let a = closest_approach(
            DVec3::new(0.3, 0.0, 5.0),
            DVec3::NEG_Z,
            DVec3::ZERO,
            DVec3::Z,
        );

        assert!((a.distance - 0.3).abs() < EPS);
        assert!((a.ray_t - 4.0).abs() < EPS);
    }

    #[test]
    fn given_skew_ray_past_segment_end_when_measuring_then_parameters_clamped_independently() {
        // Arrange: unconstrained segment parameter is 4, past the end
        let origin = DVec3::new(0.0, -4.0, 1.0);
        let direction = DVec3::new(1.0, 1.0, 0.0);

        // Act
        let a = closest_approach(origin, direction, DVec3::ZERO, DVec3::X);
        let capsule = Capsule {
            start: DVec3::ZERO,
            end: DVec3::X,
            radius: 2.5,
        };

        // Assert: ray point (4, 0, 1) against segment end (1, 0, 0)
        assert!((a.ray_t - 4.0 * 2f64.sqrt()).abs() < EPS);
        assert!((a.distance - 10f64.sqrt()).abs() < EPS);
        assert!(capsule.intersect(&Ray::new(origin, direction)).is_none());
    }

    #[test]
    fn given_zero_direction_when_building_ray_then_falls_back() {
        let ray = Ray::new(DVec3::ONE, DVec3::ZERO);

        assert_eq!(ray.direction, FALLBACK_RAY_DIRECTION);
    }

    #[test]
    fn given_degenerate_segment_when_measuring_then_point_distance() {
        let p = DVec3::new(1.0, 1.0, 0.0);
        let a = closest_approach(DVec3::new(0.0, 1.0, 0.0), DVec3::X, p, p);

        assert!(a.distance < EPS);
        assert!((a.ray_t - 1.0).abs() < EPS);
    }
}
