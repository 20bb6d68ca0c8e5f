//! Decoder for the `application/vnd.amazon.eventstream` binary framing
//! used by Bedrock streaming responses.
//!
//! Each message is a prelude (total length, headers length, prelude CRC),
//! a block of typed headers, a payload, and a trailing message CRC. Only
//! string-typed headers are retained; the other value types are skipped by
//! their fixed or length-prefixed sizes. CRCs are not verified — a
//! truncated or corrupt frame surfaces as a parse error instead.

use bench_core::BenchError;
use bytes::{Buf, Bytes, BytesMut};
use std::collections::HashMap;

/// Prelude (12 bytes) plus trailing CRC (4 bytes).
const FRAME_OVERHEAD: usize = 16;

/// Header value types defined by the event-stream encoding.
const TYPE_BOOL_TRUE: u8 = 0;
const TYPE_BOOL_FALSE: u8 = 1;
const TYPE_BYTE: u8 = 2;
const TYPE_SHORT: u8 = 3;
const TYPE_INT: u8 = 4;
const TYPE_LONG: u8 = 5;
const TYPE_BYTE_ARRAY: u8 = 6;
const TYPE_STRING: u8 = 7;
const TYPE_TIMESTAMP: u8 = 8;
const TYPE_UUID: u8 = 9;

/// One decoded event-stream message.
#[derive(Debug, Clone)]
pub struct Frame {
    /// String-typed headers, including `:message-type` and `:event-type`.
    pub headers: HashMap<String, String>,
    /// Raw payload, JSON for every Bedrock event type.
    pub payload: Bytes,
}

impl Frame {
    /// The `:message-type` header (`event` or `exception`).
    pub fn message_type(&self) -> Option<&str> {
        self.headers.get(":message-type").map(String::as_str)
    }

    /// The `:event-type` header for event messages.
    pub fn event_type(&self) -> Option<&str> {
        self.headers.get(":event-type").map(String::as_str)
    }

    /// The `:exception-type` header for exception messages.
    pub fn exception_type(&self) -> Option<&str> {
        self.headers.get(":exception-type").map(String::as_str)
    }
}

/// Incremental frame decoder over arbitrarily chunked input bytes.
#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    buffer: BytesMut,
}

impl EventStreamDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes received from the transport.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Decode the next complete frame, if the buffer holds one.
    ///
    /// # Errors
    /// Returns a parse error on structurally invalid framing.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, BenchError> {
        if self.buffer.len() < 12 {
            return Ok(None);
        }

        let total_len = u32::from_be_bytes([
            self.buffer[0],
            self.buffer[1],
            self.buffer[2],
            self.buffer[3],
        ]) as usize;

        if total_len < FRAME_OVERHEAD {
            return Err(BenchError::parse(format!(
                "event-stream frame length {total_len} below minimum {FRAME_OVERHEAD}"
            )));
        }
        if self.buffer.len() < total_len {
            return Ok(None);
        }

        let mut frame = self.buffer.split_to(total_len).freeze();
        let _total = frame.get_u32();
        let headers_len = frame.get_u32() as usize;
        let _prelude_crc = frame.get_u32();

        if FRAME_OVERHEAD + headers_len > total_len {
            return Err(BenchError::parse(format!(
                "event-stream headers length {headers_len} exceeds frame of {total_len}"
            )));
        }

        let mut header_bytes = frame.split_to(headers_len);
        let payload = frame.split_to(total_len - FRAME_OVERHEAD - headers_len);
        let _message_crc = frame.get_u32();

        let headers = parse_headers(&mut header_bytes)?;
        Ok(Some(Frame { headers, payload }))
    }

    /// Bytes currently buffered but not yet decodable.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

fn parse_headers(bytes: &mut Bytes) -> Result<HashMap<String, String>, BenchError> {
    let mut headers = HashMap::new();

    while bytes.has_remaining() {
        let name_len = bytes.get_u8() as usize;
        if bytes.remaining() < name_len + 1 {
            return Err(BenchError::parse("truncated event-stream header name"));
        }
        let name_bytes = bytes.split_to(name_len);
        let name = std::str::from_utf8(&name_bytes)
            .map_err(|_| BenchError::parse("event-stream header name is not UTF-8"))?
            .to_string();

        let value_type = bytes.get_u8();
        match value_type {
            TYPE_BOOL_TRUE | TYPE_BOOL_FALSE => {}
            TYPE_BYTE => skip(bytes, 1)?,
            TYPE_SHORT => skip(bytes, 2)?,
            TYPE_INT => skip(bytes, 4)?,
            TYPE_LONG | TYPE_TIMESTAMP => skip(bytes, 8)?,
            TYPE_UUID => skip(bytes, 16)?,
            TYPE_BYTE_ARRAY => {
                let len = get_u16_checked(bytes)? as usize;
                skip(bytes, len)?;
            }
            TYPE_STRING => {
                let len = get_u16_checked(bytes)? as usize;
                if bytes.remaining() < len {
                    return Err(BenchError::parse("truncated event-stream string header"));
                }
                let value_bytes = bytes.split_to(len);
                let value = std::str::from_utf8(&value_bytes)
                    .map_err(|_| BenchError::parse("event-stream header value is not UTF-8"))?
                    .to_string();
                headers.insert(name, value);
            }
            other => {
                return Err(BenchError::parse(format!(
                    "unknown event-stream header type {other}"
                )));
            }
        }
    }

    Ok(headers)
}

fn get_u16_checked(bytes: &mut Bytes) -> Result<u16, BenchError> {
    if bytes.remaining() < 2 {
        return Err(BenchError::parse("truncated event-stream header length"));
    }
    Ok(bytes.get_u16())
}

fn skip(bytes: &mut Bytes, count: usize) -> Result<(), BenchError> {
    if bytes.remaining() < count {
        return Err(BenchError::parse("truncated event-stream header value"));
    }
    bytes.advance(count);
    Ok(())
}

/// Encode a frame with string headers, for tests and fixtures.
///
/// CRC fields are written as zero; the decoder does not verify them.
#[cfg(test)]
pub(crate) fn encode_frame(headers: &[(&str, &str)], payload: &[u8]) -> Vec<u8> {
    let mut header_bytes = Vec::new();
    for (name, value) in headers {
        header_bytes.push(name.len() as u8);
        header_bytes.extend_from_slice(name.as_bytes());
        header_bytes.push(TYPE_STRING);
        header_bytes.extend_from_slice(&(value.len() as u16).to_be_bytes());
        header_bytes.extend_from_slice(value.as_bytes());
    }

    let total_len = (FRAME_OVERHEAD + header_bytes.len() + payload.len()) as u32;
    let mut frame = Vec::with_capacity(total_len as usize);
    frame.extend_from_slice(&total_len.to_be_bytes());
    frame.extend_from_slice(&(header_bytes.len() as u32).to_be_bytes());
    frame.extend_from_slice(&0u32.to_be_bytes());
    frame.extend_from_slice(&header_bytes);
    frame.extend_from_slice(payload);
    frame.extend_from_slice(&0u32.to_be_bytes());
    frame
}
