//! Server-Sent Events Decoder
//!
//! Incremental parser for `text/event-stream` bodies. Bytes can be fed in
//! chunks of any size; events come out once their terminating blank line has
//! been seen.

/// One dispatched event
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseEvent {
    /// Event type from the `event:` field, `None` for the default type
    pub event: Option<String>,
    /// `data:` lines joined with `\n`
    pub data: String,
}

impl SseEvent {
    /// Whether a browser would deliver this event to `onmessage`
    pub fn is_message(&self) -> bool {
        matches!(self.event.as_deref(), None | Some("") | Some("message"))
    }
}

const BOM: &[u8] = "\u{FEFF}".as_bytes();

/// Incremental `text/event-stream` decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    after_cr: bool,
    seen_line: bool,
    data: Vec<String>,
    event: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect the events it completes
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut events = Vec::new();

        for &byte in chunk {
            if self.after_cr {
                self.after_cr = false;
                if byte == b'\n' {
                    continue;
                }
            }

            match byte {
                b'\r' | b'\n' => {
                    self.after_cr = byte == b'\r';
                    let line = std::mem::take(&mut self.line);
                    if let Some(event) = self.process_line(&line) {
                        events.push(event);
                    }
                }
                _ => self.line.push(byte),
            }
        }

        events
    }

    fn process_line(&mut self, line: &[u8]) -> Option<SseEvent> {
        // One byte order mark may open the stream
        let line = if self.seen_line {
            line
        } else {
            line.strip_prefix(BOM).unwrap_or(line)
        };
        self.seen_line = true;

        if line.is_empty() {
            return self.dispatch();
        }

        // Line terminators are ASCII, so a complete line is never a split
        // UTF-8 sequence.
        let line = String::from_utf8_lossy(line);
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line.as_ref(), ""),
        };

        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            // `id` and `retry` only drive reconnection
            _ => {}
        }

        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        let data = std::mem::take(&mut self.data).join("\n");
        if data.is_empty() {
            return None;
        }

        Some(SseEvent { event, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_event() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: {\"status\":\"processing\"}\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, r#"{"status":"processing"}"#);
        assert!(events[0].is_message());
    }

    #[test]
    fn test_chunk_boundaries() {
        let body = "data: {\"message\":\"开始截图日线图...\"}\n\ndata: second\n\n".as_bytes();

        let mut whole = SseDecoder::new();
        let expected = whole.feed(body);
        assert_eq!(expected.len(), 2);

        for split in 0..body.len() {
            let mut decoder = SseDecoder::new();
            let mut events = decoder.feed(&body[..split]);
            events.extend(decoder.feed(&body[split..]));
            assert_eq!(events, expected, "split at {}", split);
        }
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        let mut events = decoder.feed(b"data: a\r");
        events.extend(decoder.feed(b"\n\r"));
        events.extend(decoder.feed(b"\n"));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "a");
    }

    #[test]
    fn test_multiline_data_and_fields() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b": keepalive\nid: 7\nevent: update\nretry: 1000\ndata: one\ndata:two\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "one\ntwo");
        assert_eq!(events[0].event.as_deref(), Some("update"));
        assert!(!events[0].is_message());
    }

    #[test]
    fn test_blank_lines_without_data() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"\n\nevent: ping\n\n").is_empty());

        // The event type does not leak into the next event
        let events = decoder.feed(b"data: x\n\n");
        assert_eq!(events[0].event, None);
    }

    #[test]
    fn test_leading_bom_is_stripped() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed("\u{FEFF}data: {\"status\":\"processing\"}\n\n".as_bytes());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, r#"{"status":"processing"}"#);

        // Only at the very start of the stream
        let events = decoder.feed("\u{FEFF}data: x\n\ndata: y\n\n".as_bytes());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "y");
    }

    #[test]
    fn test_bom_split_across_chunks() {
        let body = "\u{FEFF}data: a\n\n".as_bytes();
        let mut decoder = SseDecoder::new();
        let mut events = decoder.feed(&body[..2]);
        events.extend(decoder.feed(&body[2..]));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "a");
    }

    #[test]
    fn test_empty_data_is_not_dispatched() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data:\n\n").is_empty());
        assert!(decoder.feed(b"event: update\ndata\n\n").is_empty());

        // Two empty lines join to a newline, which is dispatched
        let events = decoder.feed(b"data:\ndata:\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "\n");
        assert_eq!(events[0].event, None);
    }

    #[test]
    fn test_incomplete_event_is_held() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: partial\n").is_empty());
        assert_eq!(decoder.feed(b"\n").len(), 1);
    }
}
