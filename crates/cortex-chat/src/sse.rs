//! Incremental decoding of `text/event-stream` bodies.
//!
//! The decoder is fed raw byte chunks exactly as they come off the wire. Chunk
//! boundaries carry no meaning: an event, a line, or a multi-byte character may
//! be split across any number of chunks.

use bytes::Bytes;
use futures::{Stream, StreamExt};

/// A dispatched server-sent event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
    pub id: Option<String>,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect every event it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if let Some(event) = self.process_line(&String::from_utf8_lossy(&line)) {
                events.push(event);
            }
        }
        events
    }

    /// Flush whatever is left once the body has ended.
    pub fn finish(mut self) -> Option<SseEvent> {
        if !self.buffer.is_empty() {
            let mut line = std::mem::take(&mut self.buffer);
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if let Some(event) = self.process_line(&String::from_utf8_lossy(&line)) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
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
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event,
            data,
            id: self.id.clone(),
        })
    }
}

/// Turn a body byte stream into a stream of events. Transport errors are passed through
/// and end the stream.
pub fn event_stream<S, E>(body: S) -> impl Stream<Item = Result<SseEvent, E>>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    async_stream::stream! {
        futures::pin_mut!(body);
        let mut decoder = SseDecoder::new();
        let mut failed = false;
        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => {
                    for event in decoder.push(&bytes) {
                        yield Ok(event);
                    }
                }
                Err(e) => {
                    failed = true;
                    yield Err(e);
                    break;
                }
            }
        }
        if !failed {
            if let Some(event) = decoder.finish() {
                yield Ok(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn data_event(data: &str) -> SseEvent {
        SseEvent {
            data: data.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_event() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: {\"a\":1}\n\n");
        assert_eq!(events, vec![data_event("{\"a\":1}")]);
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: mess").is_empty());
        assert!(decoder.push(b"age.delta\nda").is_empty());
        assert!(decoder.push(b"ta: hel").is_empty());
        let events = decoder.push(b"lo\n\ndata: second\n\n");
        assert_eq!(
            events,
            vec![
                SseEvent {
                    event: Some("message.delta".to_string()),
                    data: "hello".to_string(),
                    id: None,
                },
                data_event("second"),
            ]
        );
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        let bytes = "data: Q1 • West\n\n".as_bytes();
        let split = bytes.iter().position(|&b| b == 0xE2).unwrap() + 1;

        let mut decoder = SseDecoder::new();
        assert!(decoder.push(&bytes[..split]).is_empty());
        assert_eq!(decoder.push(&bytes[split..]), vec![data_event("Q1 • West")]);
    }

    #[test]
    fn test_crlf_comments_and_multiline_data() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b": keep-alive\r\nid: 7\r\ndata: line one\r\ndata:line two\r\nretry: 100\r\n\r\n");
        assert_eq!(
            events,
            vec![SseEvent {
                event: None,
                data: "line one\nline two".to_string(),
                id: Some("7".to_string()),
            }]
        );
    }

    #[test]
    fn test_event_without_data_is_not_dispatched() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: ping\n\n").is_empty());
        // The name does not leak into the next event
        assert_eq!(decoder.push(b"data: x\n\n"), vec![data_event("x")]);
    }

    #[test]
    fn test_finish_flushes_unterminated_event() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(decoder.finish(), Some(data_event("tail")));
    }

    #[tokio::test]
    async fn test_event_stream_over_chunks() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"data: one\n")),
            Ok(Bytes::from_static(b"\ndata: two\n\n")),
        ];
        let events: Vec<_> = event_stream(stream::iter(chunks))
            .map(|e| e.unwrap())
            .collect()
            .await;
        assert_eq!(events, vec![data_event("one"), data_event("two")]);
    }

    #[tokio::test]
    async fn test_event_stream_stops_on_error() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"data: one\n\n")),
            Err(std::io::Error::new(std::io::ErrorKind::Other, "reset")),
            Ok(Bytes::from_static(b"data: two\n\n")),
        ];
        let results: Vec<_> = event_stream(stream::iter(chunks)).collect().await;
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}
