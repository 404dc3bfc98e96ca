//! Incremental parser for `text/event-stream` bodies

/// One dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEvent {
    pub event: String,
    pub data: String,
}

/// Accumulates raw body chunks and yields complete events
///
/// Chunks may split lines (and UTF-8 sequences) anywhere; only complete lines
/// are interpreted.
#[derive(Debug, Default)]
pub struct EventStreamParser {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl EventStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every event completed by it
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ServerEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<ServerEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<ServerEvent> {
        let event = self.event.take();
        if self.data.is_empty() && event.is_none() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(ServerEvent {
            event: event.unwrap_or_else(|| "message".to_string()),
            data,
        })
    }
}
