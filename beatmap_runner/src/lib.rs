use std::{fs, path::Path};

use anyhow::Context;
use beatmap_schema::Beatmap;

pub fn load_beatmap_json_from_path(path: impl AsRef<Path>) -> anyhow::Result<Beatmap> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("failed to read beatmap json: {}", path.display()))?;
    let beatmap: Beatmap = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse beatmap json: {}", path.display()))?;
    Ok(beatmap)
}

pub fn load_beatmap_json_from_str(json: &str) -> anyhow::Result<Beatmap> {
    let beatmap: Beatmap = serde_json::from_str(json).context("failed to parse beatmap json")?;
    Ok(beatmap)
}

pub fn parse_osu_file(path: impl AsRef<Path>) -> anyhow::Result<Beatmap> {
    let path = path.as_ref();
    beatmap_parser::parse_file(path).with_context(|| format!("parse failed: {}", path.display()))
}

/// `.json` files are loaded as already-parsed beatmaps, anything else is
/// parsed as `.osu` text.
pub fn load_any(path: impl AsRef<Path>) -> anyhow::Result<Beatmap> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => load_beatmap_json_from_path(path),
        _ => parse_osu_file(path),
    }
}

pub fn to_json_pretty(beatmap: &Beatmap) -> anyhow::Result<String> {
    serde_json::to_string_pretty(beatmap).context("failed to serialize beatmap")
}
