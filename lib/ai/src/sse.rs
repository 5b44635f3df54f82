//! Incremental parser for server-sent-event bodies.
//!
//! Chat-completion streams arrive as `data:` lines separated by blank
//! lines. Network chunks split events arbitrarily, so the parser
//! buffers partial input and emits only complete events.

/// Incremental SSE parser.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
}

impl SseParser {
    /// Creates a new parser.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of body text and returns the data payloads of any
    /// events completed by it.
    ///
    /// Events are delimited by a blank line. Comment lines (leading
    /// `:`) and fields other than `data:` are ignored; multiple `data:`
    /// lines within one event are joined with newlines per the SSE
    /// specification.
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);
        let mut payloads = Vec::new();

        while let Some(pos) = self.buffer.find("\n\n") {
            let event: String = self.buffer.drain(..pos + 2).collect();
            let data_lines: Vec<&str> = event
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(str::trim_start)
                .collect();
            if !data_lines.is_empty() {
                payloads.push(data_lines.join("\n"));
            }
        }

        payloads
    }

    /// Returns true if a partial event is buffered.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.buffer.is_empty()
    }
}
