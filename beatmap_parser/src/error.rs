use thiserror::Error;

/// Terminal failure of a line source. Malformed beatmap content never
/// produces one of these; it is skipped or defaulted line by line.
#[derive(Debug, Error, Clone)]
#[error("{code}: {message} (line {line})")]
pub struct ParseError {
    pub code: &'static str,
    pub message: String,
    /// Last line successfully handed to the router, 0 if none.
    pub line: usize,
    pub file: Option<String>,
}

impl ParseError {
    pub(crate) fn new(code: &'static str, message: impl Into<String>, line: usize) -> Self {
        Self {
            code,
            message: message.into(),
            line,
            file: None,
        }
    }

    pub(crate) fn open_failed(err: std::io::Error) -> Self {
        Self::new("E2001", format!("failed to open input .osu: {err}"), 0)
    }

    pub(crate) fn read_failed(err: std::io::Error, line: usize) -> Self {
        Self::new("E2002", format!("failed to read line: {err}"), line)
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn is_open_failure(&self) -> bool {
        self.code == "E2001"
    }
}
