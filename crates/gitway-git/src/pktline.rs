//! Git pkt-line framing.
//!
//! Every line of the smart protocol's transport is prefixed with a
//! 4-character hex length covering the payload plus the prefix itself;
//! "0000" is a flush packet with no payload. The gateway only ever emits
//! pkt-lines (for the service-advertisement header), but decoding is
//! provided so the framing can be verified end to end.

use crate::{GitError, Result};
use std::io::{Read, Write};

/// Largest payload that still fits the 4-hex-digit length prefix
/// (0xffff minus the prefix itself).
pub const MAX_PAYLOAD: usize = 0xffff - 4;

/// A pkt-line packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PktLine {
    /// Data line with content.
    Data(Vec<u8>),
    /// Flush packet (0000).
    Flush,
}

impl PktLine {
    /// Creates a data packet from a string slice.
    pub fn from_string(s: &str) -> Self {
        Self::Data(s.as_bytes().to_vec())
    }

    /// Creates a data packet from bytes.
    pub fn from_bytes(b: impl Into<Vec<u8>>) -> Self {
        Self::Data(b.into())
    }

    /// Encodes the packet to bytes.
    ///
    /// Fails with [`GitError::PayloadTooLarge`] when the payload cannot be
    /// represented in the 4-hex-digit length prefix.
    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            Self::Data(data) => {
                if data.len() > MAX_PAYLOAD {
                    return Err(GitError::PayloadTooLarge(data.len()));
                }
                let mut result = format!("{:04x}", data.len() + 4).into_bytes();
                result.extend_from_slice(data);
                Ok(result)
            }
            Self::Flush => Ok(b"0000".to_vec()),
        }
    }

    /// Returns true if this is a flush packet.
    pub fn is_flush(&self) -> bool {
        matches!(self, Self::Flush)
    }

    /// Returns the data content, or None for flush packets.
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            Self::Data(data) => Some(data),
            Self::Flush => None,
        }
    }
}

/// Reader for pkt-line framed input.
pub struct PktLineReader<R> {
    reader: R,
}

impl<R: Read> PktLineReader<R> {
    /// Creates a new pkt-line reader.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Reads the next packet, or None at end of input.
    pub fn read(&mut self) -> Result<Option<PktLine>> {
        let mut len_buf = [0u8; 4];
        match self.reader.read_exact(&mut len_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let len_str = std::str::from_utf8(&len_buf)
            .map_err(|_| GitError::InvalidPktLine("non-ASCII length prefix".to_string()))?;

        if len_str == "0000" {
            return Ok(Some(PktLine::Flush));
        }

        let len = u16::from_str_radix(len_str, 16)
            .map_err(|_| GitError::InvalidPktLine(format!("bad length prefix {len_str:?}")))?
            as usize;

        if len < 4 {
            return Err(GitError::InvalidPktLine(format!(
                "length {len} smaller than the prefix"
            )));
        }

        let mut data = vec![0u8; len - 4];
        self.reader.read_exact(&mut data)?;

        Ok(Some(PktLine::Data(data)))
    }

    /// Consumes the reader and returns the inner reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Writer for pkt-line framed output.
pub struct PktLineWriter<W> {
    writer: W,
}

impl<W: Write> PktLineWriter<W> {
    /// Creates a new pkt-line writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one packet.
    pub fn write(&mut self, pkt: &PktLine) -> Result<()> {
        self.writer.write_all(&pkt.encode()?)?;
        Ok(())
    }

    /// Writes a flush packet.
    pub fn flush_pkt(&mut self) -> Result<()> {
        self.write(&PktLine::Flush)
    }

    /// Consumes the writer and returns the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    #[test]
    fn encode_data_and_flush() {
        assert_eq!(
            PktLine::from_string("hello\n").encode().unwrap(),
            b"000ahello\n"
        );
        assert_eq!(PktLine::Flush.encode().unwrap(), b"0000");
    }

    #[test]
    fn encode_empty_payload() {
        assert_eq!(PktLine::from_bytes(Vec::new()).encode().unwrap(), b"0004");
    }

    #[test]
    fn encode_service_header() {
        let pkt = PktLine::from_string("# service=git-upload-pack\n");
        assert_eq!(pkt.encode().unwrap(), b"001e# service=git-upload-pack\n");
    }

    #[test]
    fn encode_at_max_payload() {
        let pkt = PktLine::from_bytes(vec![b'x'; MAX_PAYLOAD]);
        let encoded = pkt.encode().unwrap();
        assert_eq!(&encoded[..4], b"ffff");
        assert_eq!(encoded.len(), MAX_PAYLOAD + 4);
    }

    #[test]
    fn encode_past_max_payload_fails() {
        let pkt = PktLine::from_bytes(vec![b'x'; MAX_PAYLOAD + 1]);
        match pkt.encode() {
            Err(GitError::PayloadTooLarge(n)) => assert_eq!(n, MAX_PAYLOAD + 1),
            other => panic!("expected PayloadTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn read_flush() {
        let mut reader = PktLineReader::new(Cursor::new(b"0000".to_vec()));
        assert_eq!(reader.read().unwrap(), Some(PktLine::Flush));
        assert_eq!(reader.read().unwrap(), None);
    }

    #[test]
    fn read_rejects_undersized_length() {
        let mut reader = PktLineReader::new(Cursor::new(b"0003".to_vec()));
        assert!(matches!(
            reader.read(),
            Err(GitError::InvalidPktLine(_))
        ));
    }

    #[test]
    fn read_rejects_non_hex_length() {
        let mut reader = PktLineReader::new(Cursor::new(b"zzzzabcd".to_vec()));
        assert!(matches!(
            reader.read(),
            Err(GitError::InvalidPktLine(_))
        ));
    }

    #[test]
    fn read_truncated_frame_is_io_error() {
        let mut reader = PktLineReader::new(Cursor::new(b"0009hi".to_vec()));
        assert!(matches!(reader.read(), Err(GitError::Io(_))));
    }

    #[test]
    fn writer_then_reader_roundtrip() {
        let mut buf = Vec::new();
        {
            let mut writer = PktLineWriter::new(&mut buf);
            writer
                .write(&PktLine::from_string("# service=git-upload-pack\n"))
                .unwrap();
            writer.flush_pkt().unwrap();
        }

        let mut reader = PktLineReader::new(Cursor::new(buf));
        assert_eq!(
            reader.read().unwrap(),
            Some(PktLine::from_string("# service=git-upload-pack\n"))
        );
        assert_eq!(reader.read().unwrap(), Some(PktLine::Flush));
        assert_eq!(reader.read().unwrap(), None);
    }

    proptest! {
        /// Any representable payload survives encode then decode.
        #[test]
        fn prop_pktline_roundtrip(data in prop::collection::vec(any::<u8>(), 0..4096)) {
            let encoded = PktLine::from_bytes(data.clone()).encode().unwrap();
            let mut reader = PktLineReader::new(Cursor::new(encoded));
            let decoded = reader.read().unwrap().unwrap();
            prop_assert_eq!(decoded.data().unwrap(), &data[..]);
        }

        /// Encoding only fails past the largest representable payload.
        #[test]
        fn prop_encode_respects_max_payload(extra in 0usize..8) {
            let ok = PktLine::from_bytes(vec![0u8; MAX_PAYLOAD - extra]);
            prop_assert!(ok.encode().is_ok());
            let too_big = PktLine::from_bytes(vec![0u8; MAX_PAYLOAD + 1 + extra]);
            prop_assert!(matches!(too_big.encode(), Err(GitError::PayloadTooLarge(_))));
        }
    }
}
