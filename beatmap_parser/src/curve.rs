//! Arc-length positioning on slider paths.
//!
//! Only `linear` and `pass-through` have closed forms; Bézier and Catmull-Rom
//! paths are approximated by fixed-step sampling.

use beatmap_schema::CurveType;
use glam::DVec2;
use thiserror::Error;

const BEZIER_BASE_STEP: f64 = 0.0025;
const MAX_BEZIER_SAMPLES: usize = 4096;
const MAX_BEZIER_ORDER: usize = 256;
const CATMULL_STEP: f64 = 0.025;
const COLLINEAR_EPSILON: f64 = 1e-9;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum CurveError {
    #[error("{curve:?} curve needs at least {needed} points, got {got}")]
    TooFewPoints {
        curve: CurveType,
        needed: usize,
        got: usize,
    },

    #[error("curve has zero length")]
    ZeroLength,

    #[error("pass-through points are collinear")]
    Collinear,

    #[error("bezier segment has {got} control points, limit is {limit}")]
    TooManyPoints { limit: usize, got: usize },

    #[error("curve evaluated to a non-finite point")]
    NonFinite,

    #[error("{0:?} curves cannot be positioned by arc length")]
    Unsupported(CurveType),
}

/// How `catmull` sliders are positioned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CatmullPolicy {
    /// Report [`CurveError::Unsupported`]; callers fall back to the last
    /// control point. Matches older reference outputs.
    #[default]
    Unsupported,
    /// Walk the sampled Catmull-Rom path.
    Sampled,
}

/// Point at arc length `distance` from the first control point.
pub fn endpoint(curve_type: CurveType, distance: f64, points: &[DVec2]) -> Result<DVec2, CurveError> {
    endpoint_with(curve_type, distance, points, CatmullPolicy::default())
}

pub fn endpoint_with(
    curve_type: CurveType,
    distance: f64,
    points: &[DVec2],
    catmull: CatmullPolicy,
) -> Result<DVec2, CurveError> {
    let point = match curve_type {
        CurveType::Linear => linear_point(distance, points),
        CurveType::Bezier => bezier_point(distance, points),
        CurveType::PassThrough => pass_through_point(distance, points),
        CurveType::Catmull => match catmull {
            CatmullPolicy::Unsupported => Err(CurveError::Unsupported(CurveType::Catmull)),
            CatmullPolicy::Sampled => {
                require(CurveType::Catmull, points, 2)?;
                let path = SampledPath::new(catmull_path(points));
                Ok(path.locate(distance).unwrap_or_else(|| path.end()))
            }
        },
        CurveType::Unknown => Err(CurveError::Unsupported(CurveType::Unknown)),
    }?;
    if !point.is_finite() {
        return Err(CurveError::NonFinite);
    }
    Ok(point)
}

fn require(curve: CurveType, points: &[DVec2], needed: usize) -> Result<(), CurveError> {
    if points.len() < needed {
        return Err(CurveError::TooFewPoints {
            curve,
            needed,
            got: points.len(),
        });
    }
    Ok(())
}

/// Straight legs. Past the last point the final leg is extended.
fn linear_point(distance: f64, points: &[DVec2]) -> Result<DVec2, CurveError> {
    require(CurveType::Linear, points, 2)?;

    let mut remaining = distance;
    let mut last_leg = None;
    for pair in points.windows(2) {
        let leg = pair[1] - pair[0];
        let len = leg.length();
        if len == 0.0 {
            continue;
        }
        if remaining <= len {
            return Ok(pair[0] + leg * (remaining / len));
        }
        remaining -= len;
        last_leg = Some((pair[1], leg / len));
    }

    match last_leg {
        Some((end, dir)) => Ok(end + dir * remaining),
        None => Err(CurveError::ZeroLength),
    }
}

fn bezier_point(distance: f64, points: &[DVec2]) -> Result<DVec2, CurveError> {
    require(CurveType::Bezier, points, 2)?;
    if points.len() == 2 {
        return linear_point(distance, points);
    }

    let segments = bezier_segments(points);
    if let Some(too_long) = segments.iter().find(|s| s.len() > MAX_BEZIER_ORDER) {
        return Err(CurveError::TooManyPoints {
            limit: MAX_BEZIER_ORDER,
            got: too_long.len(),
        });
    }

    let mut remaining = distance;
    let mut end = None;
    for segment in segments {
        if segment.len() < 2 {
            continue;
        }
        let path = SampledPath::new(sample_bezier(segment));
        if let Some(p) = path.locate(remaining) {
            return Ok(p);
        }
        remaining -= path.length();
        end = Some(path.end());
    }
    end.ok_or(CurveError::ZeroLength)
}

/// A repeated control point starts a new Bézier segment.
fn bezier_segments(points: &[DVec2]) -> Vec<&[DVec2]> {
    let mut segments = Vec::new();
    let mut start = 0;
    for i in 1..points.len() {
        if points[i] == points[i - 1] {
            segments.push(&points[start..i]);
            start = i;
        }
    }
    segments.push(&points[start..]);
    segments
}

fn sample_bezier(control: &[DVec2]) -> Vec<DVec2> {
    let order = control.len();
    let steps = ((order as f64 / BEZIER_BASE_STEP).ceil() as usize).clamp(1, MAX_BEZIER_SAMPLES);
    let mut scratch = Vec::with_capacity(order);
    (0..=steps)
        .map(|s| de_casteljau(control, s as f64 / steps as f64, &mut scratch))
        .collect()
}

/// Repeated linear interpolation; every intermediate point is a convex
/// combination of the control points.
fn de_casteljau(control: &[DVec2], t: f64, scratch: &mut Vec<DVec2>) -> DVec2 {
    scratch.clear();
    scratch.extend_from_slice(control);
    for n in (1..scratch.len()).rev() {
        for i in 0..n {
            scratch[i] = scratch[i].lerp(scratch[i + 1], t);
        }
    }
    scratch.first().copied().unwrap_or(DVec2::ZERO)
}

/// Uniform Catmull-Rom through `points`. The missing neighbour of each end
/// segment is the adjacent real point mirrored through the endpoint.
pub fn catmull_path(points: &[DVec2]) -> Vec<DVec2> {
    if points.len() < 2 {
        return points.to_vec();
    }

    let steps = (1.0 / CATMULL_STEP).round() as usize;
    let mut out = Vec::with_capacity((points.len() - 1) * (steps + 1));
    for x in 0..points.len() - 1 {
        let v2 = points[x];
        let v3 = points[x + 1];
        let v1 = if x >= 1 { points[x - 1] } else { v2 * 2.0 - v3 };
        let v4 = points.get(x + 2).copied().unwrap_or(v3 * 2.0 - v2);

        for s in 0..=steps {
            let t = s as f64 / steps as f64;
            let (t2, t3) = (t * t, t * t * t);
            out.push(
                0.5 * ((-v1 + 3.0 * v2 - 3.0 * v3 + v4) * t3
                    + (2.0 * v1 - 5.0 * v2 + 4.0 * v3 - v4) * t2
                    + (-v1 + v3) * t
                    + 2.0 * v2),
            );
        }
    }
    out
}

fn pass_through_point(distance: f64, points: &[DVec2]) -> Result<DVec2, CurveError> {
    match points.len() {
        0 | 1 => Err(CurveError::TooFewPoints {
            curve: CurveType::PassThrough,
            needed: 3,
            got: points.len(),
        }),
        2 => linear_point(distance, points),
        3 => {
            let (a, b, c) = (points[0], points[1], points[2]);
            let (center, radius) = circumcircle(a, b, c)?;
            let mut angle = distance / radius;
            if (b - a).perp_dot(c - a) < 0.0 {
                angle = -angle;
            }
            Ok(center + DVec2::from_angle(angle).rotate(a - center))
        }
        _ => bezier_point(distance, points),
    }
}

/// Centre and radius of the circle through three points.
fn circumcircle(a: DVec2, b: DVec2, c: DVec2) -> Result<(DVec2, f64), CurveError> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < COLLINEAR_EPSILON {
        return Err(CurveError::Collinear);
    }

    let (a2, b2, c2) = (a.length_squared(), b.length_squared(), c.length_squared());
    let center = DVec2::new(
        (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d,
        (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d,
    );
    let radius = (a - center).length();
    if !radius.is_finite() || radius == 0.0 {
        return Err(CurveError::Collinear);
    }
    Ok((center, radius))
}

/// Polyline with cumulative arc lengths.
struct SampledPath {
    points: Vec<DVec2>,
    cumulative: Vec<f64>,
}

impl SampledPath {
    fn new(points: Vec<DVec2>) -> Self {
        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (i, p) in points.iter().enumerate() {
            if i > 0 {
                total += p.distance(points[i - 1]);
            }
            cumulative.push(total);
        }
        Self { points, cumulative }
    }

    fn length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    fn end(&self) -> DVec2 {
        self.points.last().copied().unwrap_or(DVec2::ZERO)
    }

    /// `None` once `distance` reaches the end of the path.
    fn locate(&self, distance: f64) -> Option<DVec2> {
        let first = *self.points.first()?;
        if distance <= 0.0 {
            return Some(first);
        }
        if self.length() <= distance {
            return None;
        }

        let idx = self.cumulative.partition_point(|&c| c < distance);
        let (from, to) = (self.cumulative[idx - 1], self.cumulative[idx]);
        let t = (distance - from) / (to - from);
        Some(self.points[idx - 1].lerp(self.points[idx], t))
    }
}
