use beatmap_schema::{Milliseconds, TimingPoint};

use crate::fields;
use crate::router::RawLine;

#[derive(Debug, Clone, Default)]
pub(crate) struct TimingTable {
    pub(crate) points: Vec<TimingPoint>,
    pub(crate) bpm_min: Option<f64>,
    pub(crate) bpm_max: Option<f64>,
}

impl TimingTable {
    /// The point governing `time`: greatest offset <= time, or the first point
    /// when `time` precedes the whole table.
    pub(crate) fn point_at(&self, time: Milliseconds) -> Option<&TimingPoint> {
        active_point_at(&self.points, time)
    }
}

pub(crate) fn build_timing_table(lines: &[RawLine]) -> TimingTable {
    let mut table = TimingTable::default();

    for raw in lines {
        let Some(point) = parse_timing_point(&raw.text) else {
            tracing::debug!(line = raw.line, content = %raw.text, "skipped malformed timing point");
            continue;
        };
        if let Some(bpm) = point.bpm {
            table.bpm_min = Some(table.bpm_min.map_or(bpm, |m| m.min(bpm)));
            table.bpm_max = Some(table.bpm_max.map_or(bpm, |m| m.max(bpm)));
        }
        table.points.push(point);
    }

    sort_timing_points(&mut table.points);
    backfill_bpm(&mut table.points);
    table
}

/// `offset,beatLength,signature,sampleSet,customSamples,volume,timingChange,kiai`.
/// Only the first two fields are required.
pub(crate) fn parse_timing_point(text: &str) -> Option<TimingPoint> {
    let f: Vec<&str> = text.split(',').collect();
    if f.len() < 2 {
        return None;
    }
    let offset = fields::int(f[0])?;
    let beat_length = fields::float(f[1]).filter(|v| v.is_finite())?;

    let mut bpm = None;
    let mut velocity = 1.0;
    let mut inherited = false;
    if beat_length > 0.0 {
        bpm = Some((60000.0 / beat_length).round()).filter(|b| b.is_finite());
    } else if beat_length < 0.0 {
        inherited = true;
        let v = (100.0 / beat_length).abs();
        if v.is_finite() {
            velocity = v;
        }
    }

    let flag = |idx: usize| fields::nth(&f, idx).and_then(fields::int) == Some(1);

    Some(TimingPoint {
        offset,
        beat_length,
        inherited,
        bpm,
        velocity,
        timing_signature: fields::nth(&f, 2).and_then(fields::int32),
        sample_set_id: fields::nth(&f, 3).and_then(fields::int32),
        use_custom_samples: flag(4),
        sample_volume: fields::nth(&f, 5).and_then(fields::int32),
        timing_change: flag(6),
        kiai_time_active: flag(7),
    })
}

/// Stable: points sharing an offset keep their file order.
pub(crate) fn sort_timing_points(points: &mut [TimingPoint]) {
    points.sort_by_key(|p| p.offset);
}

/// Copies bpm and beat length forward onto points that lack a bpm. Running it
/// again is a no-op.
pub(crate) fn backfill_bpm(points: &mut [TimingPoint]) {
    for i in 1..points.len() {
        if points[i].bpm.is_some() {
            continue;
        }
        let (bpm, beat_length) = (points[i - 1].bpm, points[i - 1].beat_length);
        if bpm.is_some() {
            points[i].bpm = bpm;
            points[i].beat_length = beat_length;
        }
    }
}

pub(crate) fn active_point_at(points: &[TimingPoint], time: Milliseconds) -> Option<&TimingPoint> {
    match points.partition_point(|p| p.offset <= time) {
        0 => points.first(),
        n => points.get(n - 1),
    }
}
