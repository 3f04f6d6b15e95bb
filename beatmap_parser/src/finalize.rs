use std::collections::HashMap;

use beatmap_schema::{Beatmap, BreakInterval, HitObject, HitObjectKind, Milliseconds, Slider, TimingPoint};

use crate::router::RawLine;
use crate::timing::{backfill_bpm, sort_timing_points, TimingTable};

/// Everything the build phases produced, ready to be frozen into a [`Beatmap`].
#[derive(Debug)]
pub(crate) struct Assembled {
    pub(crate) file_format: Option<String>,
    pub(crate) metadata: HashMap<String, String>,
    pub(crate) timing: TimingTable,
    pub(crate) hit_objects: Vec<HitObject>,
    pub(crate) event_lines: Vec<RawLine>,
    pub(crate) slider_multiplier: f64,
    pub(crate) slider_tick_rate: f64,
}

pub(crate) fn finalize_beatmap(parts: Assembled) -> Beatmap {
    let Assembled {
        file_format,
        metadata,
        timing,
        mut hit_objects,
        event_lines,
        slider_multiplier,
        slider_tick_rate,
    } = parts;

    let tags = metadata
        .get("Tags")
        .map(|t| t.split(' ').filter(|s| !s.is_empty()).map(str::to_string).collect())
        .unwrap_or_default();

    let (bg_filename, mut breaks) = parse_events(&event_lines);

    breaks.sort_by_key(|b| b.start_time);
    let mut timing_points = timing.points;
    sort_timing_points(&mut timing_points);
    hit_objects.sort_by_key(|o| o.start_time);
    backfill_bpm(&mut timing_points);

    let max_combo = max_combo(&timing_points, &hit_objects, slider_multiplier, slider_tick_rate);
    let (total_time, draining_time) = play_times(&hit_objects, &breaks);

    let count = |pred: fn(&HitObjectKind) -> bool| hit_objects.iter().filter(|o| pred(&o.kind)).count() as u32;
    let nb_circles = count(|k| matches!(k, HitObjectKind::Circle));
    let nb_sliders = count(|k| matches!(k, HitObjectKind::Slider(_)));
    let nb_spinners = count(|k| matches!(k, HitObjectKind::Spinner { .. }));

    tracing::info!(
        circles = nb_circles,
        sliders = nb_sliders,
        spinners = nb_spinners,
        timing_points = timing_points.len(),
        breaks = breaks.len(),
        max_combo = ?max_combo,
        total_time,
        draining_time,
        "beatmap finalized"
    );

    Beatmap {
        file_format,
        metadata,
        tags,
        nb_circles,
        nb_sliders,
        nb_spinners,
        bpm_min: timing.bpm_min,
        bpm_max: timing.bpm_max,
        bg_filename,
        timing_points,
        breaks,
        hit_objects,
        total_time,
        draining_time,
        max_combo,
    }
}

/// Background (`0,0,"file"`) and break (`2,start,end`) events. Storyboard
/// lines are ignored.
pub(crate) fn parse_events(lines: &[RawLine]) -> (Option<String>, Vec<BreakInterval>) {
    let mut background = None;
    let mut breaks = Vec::new();

    for raw in lines {
        let f: Vec<&str> = raw.text.split(',').map(str::trim).collect();
        match f.as_slice() {
            ["0", "0", file, ..] => match unquote(file) {
                Some(file) if !file.is_empty() => background = Some(file.to_string()),
                _ => tracing::debug!(line = raw.line, content = %raw.text, "skipped malformed background"),
            },
            ["2" | "Break", start, end, ..] => match (non_negative(start), non_negative(end)) {
                (Some(start_time), Some(end_time)) => breaks.push(BreakInterval { start_time, end_time }),
                _ => tracing::debug!(line = raw.line, content = %raw.text, "skipped malformed break"),
            },
            _ => {}
        }
    }
    (background, breaks)
}

/// `"name"` or a bare `name`. A stray quote means the name held a comma and
/// was split.
fn unquote(s: &str) -> Option<&str> {
    match s.strip_prefix('"') {
        Some(rest) => rest.strip_suffix('"').filter(|inner| !inner.contains('"')),
        None if s.contains('"') => None,
        None => Some(s),
    }
}

fn non_negative(s: &str) -> Option<Milliseconds> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Walks timing points and time-sorted objects in lock-step. `None` without
/// timing points.
pub(crate) fn max_combo(
    points: &[TimingPoint],
    objects: &[HitObject],
    slider_multiplier: f64,
    slider_tick_rate: f64,
) -> Option<u32> {
    if points.is_empty() {
        return None;
    }

    let mut active = 0;
    let mut combo: u64 = 0;
    for obj in objects {
        while active + 1 < points.len() && points[active + 1].offset <= obj.start_time {
            active += 1;
        }
        let gained = match &obj.kind {
            HitObjectKind::Circle | HitObjectKind::Spinner { .. } => 1,
            HitObjectKind::Slider(slider) => slider_combo(
                slider,
                points[active].velocity,
                slider_multiplier,
                slider_tick_rate,
            ),
            HitObjectKind::Unknown => 0,
        };
        combo = combo.saturating_add(gained);
    }
    Some(u32::try_from(combo).unwrap_or(u32::MAX))
}

/// Head, one tick group plus an edge per repeat.
fn slider_combo(slider: &Slider, velocity: f64, slider_multiplier: f64, slider_tick_rate: f64) -> u64 {
    let tick_length = slider_multiplier * 100.0 * velocity / slider_tick_rate;
    let ticks = if tick_length.is_finite() && tick_length > 0.0 {
        let ratio = (slider.pixel_length as f64 / tick_length * 100.0).floor() / 100.0;
        (ratio - 1.0).ceil().max(0.0) as u64
    } else {
        0
    };
    let edges = slider.edges.len() as u64;
    edges
        .saturating_sub(1)
        .saturating_mul(ticks.saturating_add(1))
        .saturating_add(1)
}

/// `(total_time, draining_time)` in whole seconds.
pub(crate) fn play_times(objects: &[HitObject], breaks: &[BreakInterval]) -> (u64, u64) {
    let (Some(first), Some(last)) = (objects.first(), objects.last()) else {
        return (0, 0);
    };

    let total = (last.start_time.max(0) / 1000) as u64;
    let break_time = breaks
        .iter()
        .fold(0i64, |acc, b| acc.saturating_add(b.duration().max(0)));
    let draining_ms = last
        .start_time
        .saturating_sub(first.start_time)
        .saturating_sub(break_time);
    let draining = (draining_ms.max(0) / 1000) as u64;
    (total, draining.min(total))
}
