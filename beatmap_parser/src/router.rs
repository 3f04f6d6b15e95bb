use std::collections::HashMap;

const FORMAT_PREFIX: &str = "osu file format ";
const BOM: char = '\u{feff}';

/// A line held back until the whole input has been read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawLine {
    pub(crate) line: usize,
    pub(crate) text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    TimingPoints,
    HitObjects,
    Events,
    /// Any other section: its lines are `key: value` pairs.
    KeyValue,
}

impl Section {
    fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "timingpoints" => Self::TimingPoints,
            "hitobjects" => Self::HitObjects,
            "events" => Self::Events,
            _ => Self::KeyValue,
        }
    }
}

/// Everything the router collected, handed to the build phases.
#[derive(Debug, Clone, Default)]
pub(crate) struct RoutedSections {
    pub(crate) file_format: Option<String>,
    pub(crate) metadata: HashMap<String, String>,
    pub(crate) timing_lines: Vec<RawLine>,
    pub(crate) object_lines: Vec<RawLine>,
    pub(crate) event_lines: Vec<RawLine>,
}

/// Single-pass classifier. One instance per parse; it never fails.
#[derive(Debug, Default)]
pub(crate) struct SectionRouter {
    section: Option<Section>,
    line_no: usize,
    routed: RoutedSections,
}

impl SectionRouter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lines_seen(&self) -> usize {
        self.line_no
    }

    pub(crate) fn feed(&mut self, raw_line: &str) {
        self.line_no += 1;
        let line = raw_line.trim_start_matches(BOM).trim();
        if line.is_empty() || line.starts_with("//") {
            return;
        }

        if let Some(name) = section_header(line) {
            self.section = Some(Section::from_name(name));
            return;
        }

        let buffer = match self.section {
            Some(Section::TimingPoints) => &mut self.routed.timing_lines,
            Some(Section::HitObjects) => &mut self.routed.object_lines,
            Some(Section::Events) => &mut self.routed.event_lines,
            Some(Section::KeyValue) | None => {
                self.route_key_value(line);
                return;
            }
        };
        buffer.push(RawLine {
            line: self.line_no,
            text: line.to_string(),
        });
    }

    fn route_key_value(&mut self, line: &str) {
        if self.section.is_none() {
            if let Some(version) = line.strip_prefix(FORMAT_PREFIX) {
                if is_format_version(version) {
                    self.routed.file_format = Some(version.to_string());
                    return;
                }
            }
        }

        match split_key_value(line) {
            Some((key, value)) => {
                self.routed.metadata.insert(key.to_string(), value.to_string());
            }
            None => tracing::trace!(line = self.line_no, content = line, "ignored line"),
        }
    }

    pub(crate) fn finish(self) -> RoutedSections {
        self.routed
    }
}

fn section_header(line: &str) -> Option<&str> {
    let name = line.strip_prefix('[')?.strip_suffix(']')?;
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(name)
    } else {
        None
    }
}

fn is_format_version(s: &str) -> bool {
    match s.strip_prefix('v') {
        Some(digits) => !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

/// `Key: value`, `Key:value` or `Key : value`. Keys are alphanumeric, values
/// must not be empty.
pub(crate) fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim_end_matches(' ');
    let value = value.trim_start_matches(' ');
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric()) || value.is_empty() {
        return None;
    }
    Some((key, value))
}
