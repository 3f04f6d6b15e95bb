use beatmap_schema::{
    CurveType, HitObject, HitObjectKind, Milliseconds, Point, Position, Slider, SliderEdge,
};
use glam::DVec2;

use crate::curve::{self, CatmullPolicy};
use crate::fields;
use crate::hitsounds::{parse_additions, parse_sound_types};
use crate::router::RawLine;
use crate::timing::TimingTable;

const TYPE_CIRCLE: i64 = 1;
const TYPE_SLIDER: i64 = 1 << 1;
const TYPE_NEW_COMBO: i64 = 1 << 2;
const TYPE_SPINNER: i64 = 1 << 3;

/// Repeat counts above this are treated as unreadable; the edge list holds
/// `repeat_count + 1` entries.
const MAX_REPEAT_COUNT: i32 = 10_000;

/// Beatmap-wide values sliders need.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SliderContext {
    pub(crate) multiplier: f64,
    pub(crate) catmull: CatmullPolicy,
}

/// Object lines in file order; the table must already be sorted.
pub(crate) fn build_hit_objects(
    lines: &[RawLine],
    timing: &TimingTable,
    ctx: SliderContext,
) -> Vec<HitObject> {
    lines
        .iter()
        .filter_map(|raw| {
            let obj = parse_hit_object(raw, timing, ctx);
            if obj.is_none() {
                tracing::debug!(line = raw.line, content = %raw.text, "skipped malformed hit object");
            }
            obj
        })
        .collect()
}

fn parse_hit_object(raw: &RawLine, timing: &TimingTable, ctx: SliderContext) -> Option<HitObject> {
    let f: Vec<&str> = raw.text.split(',').collect();
    if f.len() < 5 {
        return None;
    }

    let position = Position::new(fields::int32(f[0])?, fields::int32(f[1])?);
    let start_time = fields::int(f[2])?;
    let object_type = fields::int(f[3])?;
    let new_combo = object_type & TYPE_NEW_COMBO == TYPE_NEW_COMBO;
    let sound_types = parse_sound_types(Some(f[4]));

    // Shape bits are exclusive in valid files; the checks below fix the
    // precedence when several are set.
    let (kind, additions) = if object_type & TYPE_CIRCLE == TYPE_CIRCLE {
        (HitObjectKind::Circle, parse_additions(fields::nth(&f, 5)))
    } else if object_type & TYPE_SPINNER == TYPE_SPINNER {
        let end_time = fields::nth(&f, 5).and_then(fields::int).unwrap_or(start_time);
        (
            HitObjectKind::Spinner { end_time },
            parse_additions(fields::nth(&f, 6)),
        )
    } else if object_type & TYPE_SLIDER == TYPE_SLIDER {
        let slider = parse_slider(&f, raw.line, position, start_time, timing, ctx);
        (
            HitObjectKind::Slider(slider),
            parse_additions(fields::nth(&f, 10)),
        )
    } else {
        (HitObjectKind::Unknown, Default::default())
    };

    Some(HitObject {
        position,
        start_time,
        new_combo,
        sound_types,
        additions,
        kind,
    })
}

fn parse_slider(
    f: &[&str],
    line: usize,
    position: Position,
    start_time: Milliseconds,
    timing: &TimingTable,
    ctx: SliderContext,
) -> Slider {
    let repeat_count = match fields::nth(f, 6).and_then(fields::int32) {
        Some(n) if n <= MAX_REPEAT_COUNT => n,
        Some(n) => {
            tracing::debug!(line, repeat_count = n, "slider repeat count out of range, using 1");
            1
        }
        None => 1,
    };
    let pixel_length = fields::nth(f, 7).and_then(fields::int32).unwrap_or(0);
    let (curve_type, points) = parse_curve(f.get(5).copied().unwrap_or(""), position);

    let edge_sounds: Vec<&str> = fields::nth(f, 8).map(|s| s.split('|').collect()).unwrap_or_default();
    let edge_additions: Vec<&str> =
        fields::nth(f, 9).map(|s| s.split('|').collect()).unwrap_or_default();
    let edges = (0..repeat_count.saturating_add(1).max(0) as usize)
        .map(|i| SliderEdge {
            sound_types: parse_sound_types(fields::nth(&edge_sounds, i)),
            additions: parse_additions(fields::nth(&edge_additions, i)),
        })
        .collect();

    let duration = slider_duration(start_time, pixel_length, repeat_count, timing, ctx.multiplier);
    let end_position = slider_end_position(curve_type, pixel_length, &points, ctx.catmull, line);

    Slider {
        repeat_count,
        pixel_length,
        curve_type,
        points,
        edges,
        duration,
        end_time: duration.and_then(|d| start_time.checked_add(d)),
        end_position,
    }
}

/// `Letter|x:y|x:y|...`, prefixed with the object's own position.
fn parse_curve(spec: &str, head: Position) -> (CurveType, Vec<Position>) {
    let mut parts = spec.split('|');
    let curve_type = CurveType::from_letter(parts.next().unwrap_or(""));
    let mut points = vec![head];
    for part in parts {
        let parsed = part
            .split_once(':')
            .and_then(|(x, y)| Some(Position::new(fields::int32(x)?, fields::int32(y)?)));
        if let Some(p) = parsed {
            points.push(p);
        }
    }
    (curve_type, points)
}

fn slider_duration(
    start_time: Milliseconds,
    pixel_length: i32,
    repeat_count: i32,
    timing: &TimingTable,
    multiplier: f64,
) -> Option<Milliseconds> {
    let point = timing.point_at(start_time)?;
    let px_per_beat = multiplier * 100.0 * point.velocity;
    if !(px_per_beat > 0.0) || !(point.beat_length > 0.0) {
        return None;
    }

    let beats = (pixel_length as f64 * repeat_count as f64) / px_per_beat;
    let duration = (beats * point.beat_length).ceil();
    if !duration.is_finite() || duration < 0.0 {
        return None;
    }
    Some(duration as Milliseconds)
}

fn slider_end_position(
    curve_type: CurveType,
    pixel_length: i32,
    points: &[Position],
    catmull: CatmullPolicy,
    line: usize,
) -> Point {
    let path: Vec<DVec2> = points
        .iter()
        .map(|p| DVec2::new(p.x as f64, p.y as f64))
        .collect();

    match curve::endpoint_with(curve_type, pixel_length as f64, &path, catmull) {
        Ok(end) => Point { x: end.x, y: end.y },
        Err(err) => {
            tracing::debug!(line, error = %err, "slider end falls back to last control point");
            points.last().copied().map(Point::from).unwrap_or_default()
        }
    }
}
