use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type Milliseconds = i64;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Beatmap {
    pub file_format: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub nb_circles: u32,
    pub nb_sliders: u32,
    pub nb_spinners: u32,
    pub bpm_min: Option<f64>,
    pub bpm_max: Option<f64>,
    pub bg_filename: Option<String>,
    pub timing_points: Vec<TimingPoint>,
    pub breaks: Vec<BreakInterval>,
    pub hit_objects: Vec<HitObject>,
    pub total_time: u64,
    pub draining_time: u64,
    pub max_combo: Option<u32>,
}

impl Beatmap {
    /// Raw metadata value, e.g. `beatmap.meta("Title")`.
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingPoint {
    pub offset: Milliseconds,
    /// Milliseconds per beat. Inherited points carry their predecessor's
    /// value once the table has been backfilled.
    pub beat_length: f64,
    pub inherited: bool,
    pub bpm: Option<f64>,
    pub velocity: f64,
    pub timing_signature: Option<i32>,
    pub sample_set_id: Option<i32>,
    pub use_custom_samples: bool,
    pub sample_volume: Option<i32>,
    pub timing_change: bool,
    pub kiai_time_active: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BreakInterval {
    pub start_time: Milliseconds,
    pub end_time: Milliseconds,
}

impl BreakInterval {
    pub fn duration(&self) -> Milliseconds {
        self.end_time - self.start_time
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl From<Position> for Point {
    fn from(p: Position) -> Self {
        Self {
            x: p.x as f64,
            y: p.y as f64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HitObject {
    pub position: Position,
    pub start_time: Milliseconds,
    pub new_combo: bool,
    pub sound_types: Vec<SoundType>,
    #[serde(default)]
    pub additions: Additions,
    #[serde(flatten)]
    pub kind: HitObjectKind,
}

impl HitObject {
    pub fn is_circle(&self) -> bool {
        matches!(self.kind, HitObjectKind::Circle)
    }

    pub fn as_slider(&self) -> Option<&Slider> {
        match &self.kind {
            HitObjectKind::Slider(slider) => Some(slider),
            _ => None,
        }
    }

    pub fn end_time(&self) -> Option<Milliseconds> {
        match &self.kind {
            HitObjectKind::Circle | HitObjectKind::Unknown => None,
            HitObjectKind::Spinner { end_time } => Some(*end_time),
            HitObjectKind::Slider(slider) => slider.end_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "object_name")]
pub enum HitObjectKind {
    #[serde(rename = "circle")]
    Circle,

    #[serde(rename = "slider")]
    Slider(Slider),

    #[serde(rename = "spinner")]
    Spinner { end_time: Milliseconds },

    #[serde(rename = "unknown")]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slider {
    pub repeat_count: i32,
    pub pixel_length: i32,
    pub curve_type: CurveType,
    pub points: Vec<Position>,
    pub edges: Vec<SliderEdge>,
    pub duration: Option<Milliseconds>,
    pub end_time: Option<Milliseconds>,
    pub end_position: Point,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SliderEdge {
    pub sound_types: Vec<SoundType>,
    #[serde(default)]
    pub additions: Additions,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CurveType {
    #[serde(rename = "linear")]
    Linear,
    #[serde(rename = "bezier")]
    Bezier,
    #[serde(rename = "catmull")]
    Catmull,
    #[serde(rename = "pass-through")]
    PassThrough,
    #[serde(rename = "unknown")]
    Unknown,
}

impl CurveType {
    pub fn from_letter(letter: &str) -> Self {
        match letter {
            "C" => Self::Catmull,
            "B" => Self::Bezier,
            "L" => Self::Linear,
            "P" => Self::PassThrough,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SoundType {
    Normal,
    Whistle,
    Finish,
    Clap,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SampleSet {
    Normal,
    Soft,
    Drum,
}

impl SampleSet {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "1" => Some(Self::Normal),
            "2" => Some(Self::Soft),
            "3" => Some(Self::Drum),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Additions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample: Option<SampleSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_sample: Option<SampleSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_sample_index: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hitsound_volume: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hitsound: Option<String>,
}

impl Additions {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
