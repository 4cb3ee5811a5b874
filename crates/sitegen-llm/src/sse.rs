//! Incremental server-sent-event decoding into text deltas.
//!
//! Bytes arrive in arbitrary slices from the HTTP body. The decoder buffers
//! partial lines, assembles `data:` fields into events at each blank line,
//! and maps provider events to text. Only complete lines are decoded as
//! UTF-8, so a multi-byte character split across slices is never torn.

use crate::error::ModelError;
use serde_json::Value;

/// Which provider's event vocabulary to expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseFlavor {
    /// `content_block_delta` events, terminated by `message_stop`.
    Anthropic,
    /// `choices[0].delta.content` chunks, terminated by `[DONE]`.
    OpenAI,
}

#[derive(Debug)]
pub struct SseDecoder {
    flavor: SseFlavor,
    line: Vec<u8>,
    data: Vec<String>,
    done: bool,
}

impl SseDecoder {
    pub fn new(flavor: SseFlavor) -> Self {
        Self {
            flavor,
            line: Vec::new(),
            data: Vec::new(),
            done: false,
        }
    }

    /// True once the provider's terminal event has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed raw body bytes and return the text deltas they complete.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, ModelError> {
        let mut out = Vec::new();
        for &b in bytes {
            if self.done {
                break;
            }
            if b == b'\n' {
                let line = std::mem::take(&mut self.line);
                self.handle_line(&line, &mut out)?;
            } else {
                self.line.push(b);
            }
        }
        Ok(out)
    }

    /// Flush a trailing event that was not followed by a blank line.
    pub fn finish(&mut self) -> Result<Vec<String>, ModelError> {
        let mut out = Vec::new();
        if !self.line.is_empty() {
            let line = std::mem::take(&mut self.line);
            self.handle_line(&line, &mut out)?;
        }
        self.dispatch(&mut out)?;
        Ok(out)
    }

    fn handle_line(&mut self, raw: &[u8], out: &mut Vec<String>) -> Result<(), ModelError> {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        if raw.is_empty() {
            return self.dispatch(out);
        }
        let line = std::str::from_utf8(raw)
            .map_err(|e| ModelError::Parse(format!("invalid UTF-8 in event stream: {}", e)))?;
        // Comments, `event:`, `id:` and `retry:` lines carry nothing we need.
        if let Some(value) = line.strip_prefix("data:") {
            self.data
                .push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
        Ok(())
    }

    fn dispatch(&mut self, out: &mut Vec<String>) -> Result<(), ModelError> {
        if self.data.is_empty() || self.done {
            self.data.clear();
            return Ok(());
        }
        let payload = self.data.join("\n");
        self.data.clear();
        if let Some(text) = self.decode_event(&payload)?
            && !text.is_empty()
        {
            out.push(text);
        }
        Ok(())
    }

    fn decode_event(&mut self, payload: &str) -> Result<Option<String>, ModelError> {
        let payload = payload.trim();
        if self.flavor == SseFlavor::OpenAI && payload == "[DONE]" {
            self.done = true;
            return Ok(None);
        }
        let event: Value = serde_json::from_str(payload)
            .map_err(|e| ModelError::Parse(format!("malformed stream event: {}", e)))?;

        match self.flavor {
            SseFlavor::Anthropic => match event["type"].as_str().unwrap_or_default() {
                "content_block_delta" if event["delta"]["type"] == "text_delta" => {
                    Ok(event["delta"]["text"].as_str().map(str::to_string))
                }
                "message_stop" => {
                    self.done = true;
                    Ok(None)
                }
                "error" => Err(stream_error(&event["error"])),
                _ => Ok(None),
            },
            SseFlavor::OpenAI => {
                if let Some(error) = event.get("error") {
                    return Err(stream_error(error));
                }
                Ok(event["choices"][0]["delta"]["content"]
                    .as_str()
                    .map(str::to_string))
            }
        }
    }
}

/// Map an in-stream error object to an API error with an HTTP-like status,
/// so retry classification treats it like the equivalent response code.
fn stream_error(error: &Value) -> ModelError {
    let kind = error["type"]
        .as_str()
        .or_else(|| error["code"].as_str())
        .unwrap_or_default();
    let message = error["message"]
        .as_str()
        .unwrap_or("stream error")
        .to_string();
    let status = match kind {
        "overloaded_error" => 529,
        "rate_limit_error" | "rate_limit_exceeded" => 429,
        "api_error" | "server_error" => 500,
        _ => 400,
    };
    ModelError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anthropic_deltas_across_slices() {
        let body = "event: message_start\ndata: {\"type\":\"message_start\"}\n\n\
                    event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hel\"}}\n\n\
                    data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"lo\"}}\n\n\
                    data: {\"type\":\"message_stop\"}\n\n";
        let mut decoder = SseDecoder::new(SseFlavor::Anthropic);
        let mut text = String::new();
        for chunk in body.as_bytes().chunks(7) {
            text.extend(decoder.push(chunk).unwrap());
        }
        text.extend(decoder.finish().unwrap());
        assert_eq!(text, "Hello");
        assert!(decoder.is_done());
    }

    #[test]
    fn test_split_multibyte_character() {
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"caf\u{e9}\"}}]}\r\n\r\n";
        let bytes = body.as_bytes();
        let split = body.find('\u{e9}').unwrap() + 1;
        let mut decoder = SseDecoder::new(SseFlavor::OpenAI);
        let mut out = decoder.push(&bytes[..split]).unwrap();
        out.extend(decoder.push(&bytes[split..]).unwrap());
        assert_eq!(out, vec!["caf\u{e9}".to_string()]);
    }

    #[test]
    fn test_openai_done_stops_decoding() {
        let body = "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\"A\"}}]}\n\n\
                    data: [DONE]\n\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n";
        let mut decoder = SseDecoder::new(SseFlavor::OpenAI);
        assert_eq!(decoder.push(body.as_bytes()).unwrap(), vec!["A".to_string()]);
        assert!(decoder.is_done());
    }

    #[test]
    fn test_overloaded_event_is_retryable() {
        let body = "event: error\ndata: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n\n";
        let mut decoder = SseDecoder::new(SseFlavor::Anthropic);
        let err = decoder.push(body.as_bytes()).unwrap_err();
        assert!(matches!(err, ModelError::Api { status: 529, .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_finish_flushes_unterminated_event() {
        let mut decoder = SseDecoder::new(SseFlavor::OpenAI);
        assert!(
            decoder
                .push(b"data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}")
                .unwrap()
                .is_empty()
        );
        assert_eq!(decoder.finish().unwrap(), vec!["tail".to_string()]);
    }

    #[test]
    fn test_malformed_event_is_parse_error() {
        let mut decoder = SseDecoder::new(SseFlavor::Anthropic);
        let err = decoder.push(b"data: {not json\n\n").unwrap_err();
        assert!(matches!(err, ModelError::Parse(_)));
    }
}
