/// Wire layout of serialized ciphertexts.
///
/// Every suite family serializes to a plain concatenation of fixed-size
/// fields followed by one variable-size AEAD body:
///
/// ```text
/// classic: [nonce: N][ciphertext ‖ tag: len + T]
/// kem:     [kem_ct: K][nonce: N][ciphertext ‖ tag: len + T]
/// hybrid:  [kem_ct: K][key_nonce: N][wrapped_key ‖ tag: S + T][data_nonce: N][ciphertext ‖ tag: len + T]
/// ```
///
/// Parsing never copies; frames borrow from the input buffer. A buffer that
/// ends before a fixed-size field is complete yields a [`FramingError`].
use serde::Serialize;
use thiserror::Error;

/// Structural truncation of a serialized ciphertext.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("ciphertext too short: {field} needs {needed} bytes, {available} remaining")]
pub struct FramingError {
    /// Name of the field that could not be sliced
    pub field: &'static str,
    /// Bytes the field requires
    pub needed: usize,
    /// Bytes left in the buffer at that offset
    pub available: usize,
}

/// Shape of a serialized ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeFamily {
    ClassicAead,
    Kem,
    Hybrid,
}

/// Fixed field sizes of one registered suite.
///
/// - `kem_ciphertext_size` (K) is zero for classic suites
/// - `nonce_size` (N) applies to every AEAD layer of the suite
/// - `key_size` (S) is the AEAD key size, also the wrapped-key plaintext size
/// - `tag_size` (T) is appended by every AEAD seal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct WireLayout {
    pub family: SchemeFamily,
    pub kem_ciphertext_size: usize,
    pub nonce_size: usize,
    pub key_size: usize,
    pub tag_size: usize,
}

impl WireLayout {
    pub const fn classic(nonce_size: usize, key_size: usize, tag_size: usize) -> Self {
        Self {
            family: SchemeFamily::ClassicAead,
            kem_ciphertext_size: 0,
            nonce_size,
            key_size,
            tag_size,
        }
    }

    pub const fn kem(
        kem_ciphertext_size: usize,
        nonce_size: usize,
        key_size: usize,
        tag_size: usize,
    ) -> Self {
        Self {
            family: SchemeFamily::Kem,
            kem_ciphertext_size,
            nonce_size,
            key_size,
            tag_size,
        }
    }

    pub const fn hybrid(
        kem_ciphertext_size: usize,
        nonce_size: usize,
        key_size: usize,
        tag_size: usize,
    ) -> Self {
        Self {
            family: SchemeFamily::Hybrid,
            kem_ciphertext_size,
            nonce_size,
            key_size,
            tag_size,
        }
    }

    /// Size of one `nonce ‖ ciphertext ‖ tag` block for a plaintext of `len` bytes.
    pub fn sealed_len(&self, len: usize) -> usize {
        self.nonce_size + len + self.tag_size
    }

    /// Size of the wrapped symmetric key including its tag (S + T).
    pub fn wrapped_key_len(&self) -> usize {
        self.key_size + self.tag_size
    }

    /// Exact serialized length for a plaintext of `plaintext_len` bytes.
    pub fn serialized_len(&self, plaintext_len: usize) -> usize {
        let payload = self.sealed_len(plaintext_len);
        match self.family {
            SchemeFamily::ClassicAead => payload,
            SchemeFamily::Kem => self.kem_ciphertext_size + payload,
            SchemeFamily::Hybrid => {
                self.kem_ciphertext_size
                    + self.nonce_size
                    + self.wrapped_key_len()
                    + payload
            }
        }
    }

    /// Smallest buffer that frames without error (empty plaintext).
    pub fn min_len(&self) -> usize {
        self.serialized_len(0)
    }
}

/// Cursor slicing fixed-size fields off the front of a buffer.
struct FrameReader<'a> {
    remaining: &'a [u8],
}

impl<'a> FrameReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { remaining: buf }
    }

    fn take(&mut self, field: &'static str, len: usize) -> Result<&'a [u8], FramingError> {
        if self.remaining.len() < len {
            return Err(FramingError {
                field,
                needed: len,
                available: self.remaining.len(),
            });
        }
        let (head, tail) = self.remaining.split_at(len);
        self.remaining = tail;
        Ok(head)
    }

    /// Everything left, which must still hold at least a tag.
    fn rest(self, field: &'static str, tag_size: usize) -> Result<&'a [u8], FramingError> {
        if self.remaining.len() < tag_size {
            return Err(FramingError {
                field,
                needed: tag_size,
                available: self.remaining.len(),
            });
        }
        Ok(self.remaining)
    }
}

/// One AEAD output: nonce plus ciphertext with its trailing tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SealedFrame<'a> {
    pub nonce: &'a [u8],
    pub body: &'a [u8],
}

impl<'a> SealedFrame<'a> {
    /// Parse `nonce ‖ ciphertext ‖ tag`.
    pub fn parse(buf: &'a [u8], layout: &WireLayout) -> Result<Self, FramingError> {
        let mut reader = FrameReader::new(buf);
        let nonce = reader.take("nonce", layout.nonce_size)?;
        let body = reader.rest("ciphertext", layout.tag_size)?;
        Ok(Self { nonce, body })
    }

    pub fn encoded_len(&self) -> usize {
        self.nonce.len() + self.body.len()
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.nonce);
        out.extend_from_slice(self.body);
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut out);
        out
    }
}

/// KEM-only ciphertext: encapsulation followed by the sealed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KemFrame<'a> {
    pub kem_ciphertext: &'a [u8],
    pub payload: SealedFrame<'a>,
}

impl<'a> KemFrame<'a> {
    pub fn parse(buf: &'a [u8], layout: &WireLayout) -> Result<Self, FramingError> {
        let mut reader = FrameReader::new(buf);
        let kem_ciphertext = reader.take("kem ciphertext", layout.kem_ciphertext_size)?;
        let nonce = reader.take("nonce", layout.nonce_size)?;
        let body = reader.rest("ciphertext", layout.tag_size)?;
        Ok(Self {
            kem_ciphertext,
            payload: SealedFrame { nonce, body },
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.kem_ciphertext.len() + self.payload.encoded_len());
        out.extend_from_slice(self.kem_ciphertext);
        self.payload.write_to(&mut out);
        out
    }
}

/// Hybrid ciphertext: encapsulation, wrapped symmetric key, sealed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HybridFrame<'a> {
    pub kem_ciphertext: &'a [u8],
    pub wrapped_key: SealedFrame<'a>,
    pub data: SealedFrame<'a>,
}

impl<'a> HybridFrame<'a> {
    pub fn parse(buf: &'a [u8], layout: &WireLayout) -> Result<Self, FramingError> {
        let mut reader = FrameReader::new(buf);
        let kem_ciphertext = reader.take("kem ciphertext", layout.kem_ciphertext_size)?;
        let key_nonce = reader.take("key nonce", layout.nonce_size)?;
        let wrapped_key = reader.take("wrapped key", layout.wrapped_key_len())?;
        let data_nonce = reader.take("data nonce", layout.nonce_size)?;
        let data = reader.rest("data ciphertext", layout.tag_size)?;
        Ok(Self {
            kem_ciphertext,
            wrapped_key: SealedFrame {
                nonce: key_nonce,
                body: wrapped_key,
            },
            data: SealedFrame {
                nonce: data_nonce,
                body: data,
            },
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            self.kem_ciphertext.len() + self.wrapped_key.encoded_len() + self.data.encoded_len(),
        );
        out.extend_from_slice(self.kem_ciphertext);
        self.wrapped_key.write_to(&mut out);
        self.data.write_to(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASSIC: WireLayout = WireLayout::classic(12, 32, 16);
    const KEM: WireLayout = WireLayout::kem(1088, 12, 32, 16);
    const HYBRID: WireLayout = WireLayout::hybrid(1088, 12, 32, 16);

    #[test]
    fn test_serialized_lengths() {
        assert_eq!(CLASSIC.serialized_len(10), 12 + 10 + 16);
        assert_eq!(KEM.serialized_len(10), 1088 + 12 + 10 + 16);
        assert_eq!(HYBRID.serialized_len(10), 1088 + 12 + 48 + 12 + 10 + 16);
        assert_eq!(HYBRID.min_len(), 1088 + 12 + 48 + 12 + 16);
    }

    #[test]
    fn test_hybrid_frame_offsets() {
        let mut buf = Vec::new();
        buf.extend(std::iter::repeat(0xAA).take(1088));
        buf.extend(std::iter::repeat(0x01).take(12));
        buf.extend(std::iter::repeat(0x02).take(48));
        buf.extend(std::iter::repeat(0x03).take(12));
        buf.extend(std::iter::repeat(0x04).take(20));

        let frame = HybridFrame::parse(&buf, &HYBRID).unwrap();
        assert!(frame.kem_ciphertext.iter().all(|&b| b == 0xAA));
        assert!(frame.wrapped_key.nonce.iter().all(|&b| b == 0x01));
        assert_eq!(frame.wrapped_key.body.len(), 48);
        assert!(frame.data.nonce.iter().all(|&b| b == 0x03));
        assert_eq!(frame.data.body, &[0x04; 20][..]);
        assert_eq!(frame.encode(), buf);
    }

    #[test]
    fn test_truncated_classic_reports_nonce() {
        let err = SealedFrame::parse(&[0u8; 5], &CLASSIC).unwrap_err();
        assert_eq!(err.field, "nonce");
        assert_eq!(err.needed, 12);
        assert_eq!(err.available, 5);
    }

    #[test]
    fn test_missing_tag_is_framing_error() {
        let err = SealedFrame::parse(&[0u8; 12 + 15], &CLASSIC).unwrap_err();
        assert_eq!(err.field, "ciphertext");
    }

    #[test]
    fn test_truncated_hybrid_wrapped_key() {
        let buf = vec![0u8; 1088 + 12 + 40];
        let err = HybridFrame::parse(&buf, &HYBRID).unwrap_err();
        assert_eq!(err.field, "wrapped key");
        assert_eq!(err.needed, 48);
        assert_eq!(err.available, 40);
    }

    #[test]
    fn test_kem_frame_needs_full_encapsulation() {
        let err = KemFrame::parse(&[0u8; 1000], &KEM).unwrap_err();
        assert_eq!(err.field, "kem ciphertext");
    }

    #[test]
    fn test_min_len_parses() {
        let buf = vec![0u8; CLASSIC.min_len()];
        assert!(SealedFrame::parse(&buf, &CLASSIC).is_ok());

        let buf = vec![0u8; KEM.min_len()];
        assert!(KemFrame::parse(&buf, &KEM).is_ok());
        assert!(KemFrame::parse(&buf[..buf.len() - 1], &KEM).is_err());

        let buf = vec![0u8; HYBRID.min_len()];
        assert!(HybridFrame::parse(&buf, &HYBRID).is_ok());
        assert!(HybridFrame::parse(&buf[..buf.len() - 1], &HYBRID).is_err());
    }
}
