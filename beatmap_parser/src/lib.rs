//! Two-phase parser for osu! `.osu` beatmaps.
//!
//! Lines are first routed into per-section buffers; timing points, hit objects
//! and events are only built once the whole input has been read, because
//! slider durations and the max combo need the complete, time-sorted timing
//! table and files are not guaranteed to be sorted.
//!
//! ```
//! let beatmap = beatmap_parser::parse_str(
//!     "osu file format v14\n[TimingPoints]\n0,500,4,2,0,50,1,0\n[HitObjects]\n100,100,1000,1,0,0:0:0:0:\n",
//! );
//! assert_eq!(beatmap.nb_circles, 1);
//! assert_eq!(beatmap.max_combo, Some(1));
//! ```

use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use beatmap_schema::Beatmap;

pub mod curve;
mod error;
mod fields;
mod finalize;
mod hit_objects;
mod hitsounds;
mod router;
mod timing;

pub use curve::{CatmullPolicy, CurveError};
pub use error::ParseError;

use finalize::{finalize_beatmap, Assembled};
use hit_objects::{build_hit_objects, SliderContext};
use router::{RoutedSections, SectionRouter};
use timing::build_timing_table;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParseOptions {
    /// Used when `SliderMultiplier` is missing, unreadable or not positive.
    pub default_slider_multiplier: f64,
    /// Used when `SliderTickRate` is missing, unreadable or not positive.
    pub default_slider_tick_rate: f64,
    pub catmull: CatmullPolicy,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            default_slider_multiplier: 1.4,
            default_slider_tick_rate: 1.0,
            catmull: CatmullPolicy::Unsupported,
        }
    }
}

pub fn parse_file(path: impl AsRef<Path>) -> Result<Beatmap, ParseError> {
    parse_file_with_options(path, ParseOptions::default())
}

pub fn parse_file_with_options(path: impl AsRef<Path>, options: ParseOptions) -> Result<Beatmap, ParseError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ParseError::open_failed(e).with_file(path.display().to_string()))?;
    parse_reader_with_options(BufReader::new(file), options)
        .map_err(|e| e.with_file(path.display().to_string()))
}

pub fn parse_reader<R: BufRead>(reader: R) -> Result<Beatmap, ParseError> {
    parse_reader_with_options(reader, ParseOptions::default())
}

/// Reads until end of input. A read error aborts the parse; invalid UTF-8 is
/// replaced rather than rejected.
pub fn parse_reader_with_options<R: BufRead>(mut reader: R, options: ParseOptions) -> Result<Beatmap, ParseError> {
    let mut router = SectionRouter::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| ParseError::read_failed(e, router.lines_seen()))?;
        if n == 0 {
            break;
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        router.feed(&String::from_utf8_lossy(&buf));
    }
    Ok(build(router.finish(), &options))
}

pub fn parse_str(src: &str) -> Beatmap {
    parse_str_with_options(src, ParseOptions::default())
}

pub fn parse_str_with_options(src: &str, options: ParseOptions) -> Beatmap {
    parse_lines_with_options(src.lines().flat_map(|l| l.split('\r')), options)
}

pub fn parse_lines<I, S>(lines: I) -> Beatmap
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parse_lines_with_options(lines, ParseOptions::default())
}

pub fn parse_lines_with_options<I, S>(lines: I, options: ParseOptions) -> Beatmap
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut router = SectionRouter::new();
    for line in lines {
        router.feed(line.as_ref());
    }
    build(router.finish(), &options)
}

/// Timing table, then hit objects, then finalize. The order is fixed.
fn build(routed: RoutedSections, options: &ParseOptions) -> Beatmap {
    let RoutedSections {
        file_format,
        metadata,
        timing_lines,
        object_lines,
        event_lines,
    } = routed;

    let slider_multiplier = positive_setting(&metadata, "SliderMultiplier", options.default_slider_multiplier);
    let slider_tick_rate = positive_setting(&metadata, "SliderTickRate", options.default_slider_tick_rate);

    let timing = build_timing_table(&timing_lines);
    let hit_objects = build_hit_objects(
        &object_lines,
        &timing,
        SliderContext {
            multiplier: slider_multiplier,
            catmull: options.catmull,
        },
    );

    finalize_beatmap(Assembled {
        file_format,
        metadata,
        timing,
        hit_objects,
        event_lines,
        slider_multiplier,
        slider_tick_rate,
    })
}

fn positive_setting(metadata: &HashMap<String, String>, key: &str, default: f64) -> f64 {
    metadata
        .get(key)
        .and_then(|v| fields::float(v))
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests;
