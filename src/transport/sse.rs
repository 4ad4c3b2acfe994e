//! Streaming decoders (Bytes -> JSON Value).

use bytes::Bytes;
use futures::{stream, StreamExt};
use serde_json::Value;

use crate::{BoxStream, Error};

const DONE_SIGNAL: &str = "[DONE]";

/// Decode a Server-Sent Events body into one JSON value per `data:` frame.
///
/// Frames are split on blank lines; comment frames and non-JSON payloads are
/// skipped, and `data: [DONE]` ends the stream.
pub fn decode_sse(input: BoxStream<'static, Bytes>) -> BoxStream<'static, Value> {
    decode_frames(input, b"\n\n", parse_sse_frame)
}

/// Decode a newline-delimited JSON body into one value per line.
///
/// Blank lines are skipped; a line that is not JSON ends up as a
/// serialization error in the stream.
pub fn decode_ndjson(input: BoxStream<'static, Bytes>) -> BoxStream<'static, Value> {
    decode_frames(input, b"\n", |raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Frame::Skip;
        }
        match serde_json::from_str(trimmed) {
            Ok(v) => Frame::Value(v),
            Err(e) => Frame::Invalid(e),
        }
    })
}

enum Frame {
    Value(Value),
    Invalid(serde_json::Error),
    Skip,
    Done,
}

fn parse_sse_frame(raw: &str) -> Frame {
    let mut payload = String::new();
    for line in raw.lines() {
        let line = line.trim_end_matches('\r');
        if line.starts_with(':') {
            continue;
        }
        if let Some(data) = line.strip_prefix("data:") {
            if !payload.is_empty() {
                payload.push('\n');
            }
            payload.push_str(data.trim_start());
        }
    }
    let payload = payload.trim();
    if payload.is_empty() {
        return Frame::Skip;
    }
    if payload == DONE_SIGNAL {
        return Frame::Done;
    }
    serde_json::from_str(payload)
        .map(Frame::Value)
        .unwrap_or(Frame::Skip)
}

fn find_delimiter(buf: &[u8], delimiter: &[u8]) -> Option<usize> {
    buf.windows(delimiter.len()).position(|w| w == delimiter)
}

fn decode_frames(
    input: BoxStream<'static, Bytes>,
    delimiter: &'static [u8],
    parse: fn(&str) -> Frame,
) -> BoxStream<'static, Value> {
    // Bytes are buffered raw and only complete frames are decoded, so a
    // multi-byte character split across reads stays intact.
    let stream = stream::unfold(
        (input, Vec::<u8>::new(), false),
        move |(mut input, mut buf, done)| async move {
            if done {
                return None;
            }
            loop {
                if let Some(idx) = find_delimiter(&buf, delimiter) {
                    let frame: Vec<u8> = buf.drain(..idx + delimiter.len()).take(idx).collect();
                    match parse(&String::from_utf8_lossy(&frame)) {
                        Frame::Value(v) => return Some((Ok(v), (input, buf, false))),
                        Frame::Invalid(e) => {
                            return Some((Err(Error::Serialization(e)), (input, buf, false)))
                        }
                        Frame::Done => return None,
                        Frame::Skip => continue,
                    }
                }

                // Need more data.
                match input.next().await {
                    Some(Ok(bytes)) => buf.extend_from_slice(&bytes),
                    Some(Err(e)) => return Some((Err(e), (input, buf, true))),
                    None => {
                        // EOF: try the unterminated tail once
                        let tail = String::from_utf8_lossy(&buf).to_string();
                        return match parse(&tail) {
                            Frame::Value(v) => Some((Ok(v), (input, Vec::new(), true))),
                            Frame::Invalid(e) => {
                                Some((Err(Error::Serialization(e)), (input, Vec::new(), true)))
                            }
                            Frame::Done | Frame::Skip => None,
                        };
                    }
                }
            }
        },
    );
    Box::pin(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(chunks: Vec<&'static str>) -> BoxStream<'static, Bytes> {
        Box::pin(stream::iter(chunks).map(|s| Ok::<_, Error>(Bytes::from(s))))
    }

    #[tokio::test]
    async fn test_sse_frames_split_across_chunks() {
        let input = body(vec![
            ": keep-alive\n\ndata: {\"a\":",
            "1}\n\ndata: {\"a\":2}\n\n",
            "data: [DONE]\n\ndata: {\"a\":3}\n\n",
        ]);
        let values: Vec<Value> = decode_sse(input)
            .map(|v| v.unwrap())
            .collect()
            .await;
        assert_eq!(values, vec![serde_json::json!({"a":1}), serde_json::json!({"a":2})]);
    }

    #[tokio::test]
    async fn test_sse_tail_without_delimiter() {
        let input = body(vec!["data: {\"a\":1}"]);
        let values: Vec<Value> = decode_sse(input).map(|v| v.unwrap()).collect().await;
        assert_eq!(values.len(), 1);
    }

    #[tokio::test]
    async fn test_ndjson_lines() {
        let input = body(vec!["{\"t\":\"x\"}\n{\"t\"", ":\"y\"}\n\n{\"t\":\"z\"}"]);
        let values: Vec<Value> = decode_ndjson(input).map(|v| v.unwrap()).collect().await;
        assert_eq!(values.len(), 3);
        assert_eq!(values[2]["t"], "z");
    }

    #[tokio::test]
    async fn test_multibyte_char_split_across_chunks() {
        let frame = "data: {\"t\":\"h\u{e9}llo\"}\n\n".as_bytes();
        // cut between the two bytes of 'é' (0xC3 0xA9)
        let cut = frame.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let input: BoxStream<'static, Bytes> = Box::pin(stream::iter(vec![
            Ok::<_, Error>(Bytes::copy_from_slice(&frame[..cut])),
            Ok(Bytes::copy_from_slice(&frame[cut..])),
        ]));
        let values: Vec<Value> = decode_sse(input).map(|v| v.unwrap()).collect().await;
        assert_eq!(values.len(), 1);
        assert_eq!(values[0]["t"], "h\u{e9}llo");
    }

    #[tokio::test]
    async fn test_ndjson_split_multibyte_line() {
        let line = "{\"text\":\"\u{65e5}\u{672c}\"}\n".as_bytes();
        let input: BoxStream<'static, Bytes> = Box::pin(stream::iter(vec![
            Ok::<_, Error>(Bytes::copy_from_slice(&line[..10])),
            Ok(Bytes::copy_from_slice(&line[10..])),
        ]));
        let values: Vec<Value> = decode_ndjson(input).map(|v| v.unwrap()).collect().await;
        assert_eq!(values[0]["text"], "\u{65e5}\u{672c}");
    }

    #[tokio::test]
    async fn test_ndjson_malformed_line_is_an_error() {
        let input = body(vec!["{\"t\":\"x\"}\n{\"t\": oops\n{\"t\":\"y\"}\n"]);
        let items: Vec<_> = decode_ndjson(input).collect().await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap()["t"], "x");
        assert!(matches!(items[1], Err(Error::Serialization(_))));
        assert_eq!(items[2].as_ref().unwrap()["t"], "y");
    }
}
