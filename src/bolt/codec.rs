//! Bolt message framing codec.
//!
//! Messages are transferred in chunks: each chunk is a 2-byte big-endian
//! length header followed by that many payload bytes, and a message ends
//! with a zero-length chunk (`0x00 0x00`). Empty messages (a bare end
//! marker) are NOOP keep-alives and are skipped.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::message::{BoltRequest, BoltResponse};
use super::packstream::{decode, encode, PackStreamValue};
use super::BoltError;

/// Maximum payload bytes per chunk (16 KiB).
pub const MAX_CHUNK_SIZE: usize = 16384;

/// End of message marker.
pub const END_MARKER: [u8; 2] = [0x00, 0x00];

/// Default cap on a single reassembled message (16 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Chunking codec over raw PackStream values.
#[derive(Debug)]
pub struct BoltCodec {
    max_message_size: usize,
    message_buffer: BytesMut,
}

impl BoltCodec {
    /// Create a codec with the default message size cap.
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_MESSAGE_SIZE)
    }

    /// Create a codec with a custom message size cap.
    pub fn with_max_size(max_message_size: usize) -> Self {
        Self {
            max_message_size,
            message_buffer: BytesMut::with_capacity(4096),
        }
    }

    fn encode_chunked(&self, data: &[u8], dst: &mut BytesMut) {
        for chunk in data.chunks(MAX_CHUNK_SIZE) {
            dst.put_u16(chunk.len() as u16);
            dst.put_slice(chunk);
        }
        dst.put_slice(&END_MARKER);
    }
}

impl Default for BoltCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for BoltCodec {
    type Item = PackStreamValue;
    type Error = BoltError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if src.len() < 2 {
                return Ok(None);
            }

            let chunk_size = u16::from_be_bytes([src[0], src[1]]) as usize;

            if chunk_size == 0 {
                src.advance(2);

                if self.message_buffer.is_empty() {
                    // NOOP keep-alive
                    continue;
                }

                let message_data = self.message_buffer.split();
                let value = decode(&message_data).map_err(BoltError::PackStream)?;
                return Ok(Some(value));
            }

            if src.len() < 2 + chunk_size {
                return Ok(None);
            }

            if self.message_buffer.len() + chunk_size > self.max_message_size {
                return Err(BoltError::MessageTooLarge {
                    size: self.message_buffer.len() + chunk_size,
                    max: self.max_message_size,
                });
            }

            src.advance(2);
            self.message_buffer.extend_from_slice(&src[..chunk_size]);
            src.advance(chunk_size);
        }
    }
}

impl Encoder<PackStreamValue> for BoltCodec {
    type Error = BoltError;

    fn encode(&mut self, item: PackStreamValue, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let encoded = encode(&item).map_err(BoltError::PackStream)?;
        self.encode_chunked(&encoded, dst);
        Ok(())
    }
}

/// Client-side codec: encodes requests, decodes responses.
#[derive(Debug, Default)]
pub struct BoltClientCodec {
    inner: BoltCodec,
}

impl BoltClientCodec {
    /// Create a client codec.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for BoltClientCodec {
    type Item = BoltResponse;
    type Error = BoltError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.inner.decode(src)? {
            Some(value) => {
                let structure = value
                    .as_structure()
                    .ok_or_else(|| BoltError::Protocol("expected message structure".to_string()))?;
                let response =
                    BoltResponse::from_structure(structure).map_err(BoltError::PackStream)?;
                Ok(Some(response))
            }
            None => Ok(None),
        }
    }
}

impl Encoder<BoltRequest> for BoltClientCodec {
    type Error = BoltError;

    fn encode(&mut self, item: BoltRequest, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let value = PackStreamValue::Structure(item.to_structure());
        self.inner.encode(value, dst)
    }
}

/// Server-side codec: decodes requests, encodes responses. Used by the
/// test harness to play the server half of an exchange.
#[derive(Debug, Default)]
pub struct BoltServerCodec {
    inner: BoltCodec,
}

impl BoltServerCodec {
    /// Create a server codec.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for BoltServerCodec {
    type Item = BoltRequest;
    type Error = BoltError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.inner.decode(src)? {
            Some(value) => {
                let structure = value
                    .as_structure()
                    .ok_or_else(|| BoltError::Protocol("expected message structure".to_string()))?;
                let request =
                    BoltRequest::from_structure(structure).map_err(BoltError::PackStream)?;
                Ok(Some(request))
            }
            None => Ok(None),
        }
    }
}

impl Encoder<BoltResponse> for BoltServerCodec {
    type Error = BoltError;

    fn encode(&mut self, item: BoltResponse, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let value = PackStreamValue::Structure(item.to_structure());
        self.inner.encode(value, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bolt::message::{RunMessage, SuccessMessage};

    #[test]
    fn value_roundtrip() {
        let mut codec = BoltCodec::new();
        let mut buf = BytesMut::new();

        let value = PackStreamValue::String("Hello, Bolt!".to_string());
        codec.encode(value.clone(), &mut buf).unwrap();
        assert!(buf.len() > 2);

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, value);
        assert!(buf.is_empty());
    }

    #[test]
    fn large_message_spans_chunks() {
        let mut codec = BoltCodec::new();
        let mut buf = BytesMut::new();

        let large = "x".repeat(MAX_CHUNK_SIZE * 2 + 100);
        codec
            .encode(PackStreamValue::String(large.clone()), &mut buf)
            .unwrap();

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.as_str().unwrap(), large);
    }

    #[test]
    fn partial_input_yields_none() {
        let mut codec = BoltCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(PackStreamValue::Integer(42), &mut buf).unwrap();

        let full = buf.clone();
        let mut partial = BytesMut::from(&full[..2]);
        assert!(codec.decode(&mut partial).unwrap().is_none());

        let mut complete = full;
        assert_eq!(
            codec.decode(&mut complete).unwrap().unwrap().as_int(),
            Some(42)
        );
    }

    #[test]
    fn noop_chunks_are_skipped() {
        let mut codec = BoltCodec::new();
        let mut buf = BytesMut::new();

        buf.put_slice(&END_MARKER);
        buf.put_slice(&END_MARKER);
        codec.encode(PackStreamValue::Boolean(true), &mut buf).unwrap();

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.as_bool(), Some(true));
    }

    #[test]
    fn oversized_message_is_rejected() {
        let mut codec = BoltCodec::with_max_size(100);
        let mut buf = BytesMut::new();
        buf.put_u16(200);
        buf.extend_from_slice(&[0u8; 200]);

        assert!(matches!(
            codec.decode(&mut buf),
            Err(BoltError::MessageTooLarge { .. })
        ));
    }

    #[test]
    fn several_messages_in_one_buffer() {
        let mut codec = BoltCodec::new();
        let mut buf = BytesMut::new();
        for i in 1..=3 {
            codec.encode(PackStreamValue::Integer(i), &mut buf).unwrap();
        }
        for i in 1..=3 {
            assert_eq!(
                codec.decode(&mut buf).unwrap().unwrap().as_int(),
                Some(i)
            );
        }
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn client_and_server_codecs_interoperate() {
        let mut client = BoltClientCodec::new();
        let mut server = BoltServerCodec::new();
        let mut wire = BytesMut::new();

        client
            .encode(
                BoltRequest::Run(RunMessage::new("RETURN 1")),
                &mut wire,
            )
            .unwrap();
        let request = server.decode(&mut wire).unwrap().unwrap();
        assert_eq!(request.name(), "RUN");

        server
            .encode(
                BoltResponse::Success(SuccessMessage::run_success(vec!["1".into()], None)),
                &mut wire,
            )
            .unwrap();
        let response = client.decode(&mut wire).unwrap().unwrap();
        assert!(response.is_success());
    }
}
