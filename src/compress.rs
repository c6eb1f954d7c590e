//! The decompressors shared by both dictionary formats.
//!
//! sdct records the method in its header; aar does not record which method
//! compressed an article, so [`decompress_any`] tries each registered method
//! in order and keeps the raw bytes when none of them accepts the data.
use crate::{DictFormatError, Result};
use bzip2::read::BzDecoder;
use flate2::read::ZlibDecoder;
use std::fmt;
use std::io::Read;

/// A compression method understood by the dictionary formats.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Compression {
    #[default]
    None = 0,
    /// Historically called "gzip" by both formats, but the payloads are bare
    /// zlib streams.
    Gzip = 1,
    Bzip2 = 2,
}

/// Trial order for articles whose compression method is not recorded.
pub const DECOMPRESSION: [Compression; 2] = [Compression::Gzip, Compression::Bzip2];

impl TryFrom<u8> for Compression {
    type Error = DictFormatError;

    fn try_from(original: u8) -> Result<Self> {
        match original {
            0 => Ok(Compression::None),
            1 => Ok(Compression::Gzip),
            2 => Ok(Compression::Bzip2),
            n => Err(DictFormatError::UnknownCompression(n)),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Compression::None => "no compression",
            Compression::Gzip => "gzip",
            Compression::Bzip2 => "bzip2",
        })
    }
}

impl Compression {
    /// Decompress one payload with this method.
    /// Trailing bytes after the end of the compressed stream are ignored,
    /// callers may hand in a buffer that extends past the stream.
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        match self {
            Compression::None => out.extend_from_slice(data),
            Compression::Gzip => {
                ZlibDecoder::new(data)
                    .read_to_end(&mut out)
                    .map_err(|source| DictFormatError::Decompress { method: *self, source })?;
            }
            Compression::Bzip2 => {
                BzDecoder::new(data)
                    .read_to_end(&mut out)
                    .map_err(|source| DictFormatError::Decompress { method: *self, source })?;
            }
        }
        Ok(out)
    }
}

/// Best-effort decompression for the aar article store: the first method that
/// accepts the data wins, raw bytes are the fallback.
/// A failed attempt never affects the next one.
pub fn decompress_any(data: &[u8]) -> Vec<u8> {
    for method in DECOMPRESSION {
        if let Ok(out) = method.decompress(data) {
            return out;
        }
    }
    data.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::init;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    pub(crate) fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    pub(crate) fn bzip2(data: &[u8]) -> Vec<u8> {
        let mut encoder = ::bzip2::write::BzEncoder::new(Vec::new(), ::bzip2::Compression::best());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn method_ids() {
        init();
        assert_eq!(Compression::try_from(0).unwrap(), Compression::None);
        assert_eq!(Compression::try_from(1).unwrap(), Compression::Gzip);
        assert_eq!(Compression::try_from(2).unwrap(), Compression::Bzip2);
        assert!(matches!(Compression::try_from(7), Err(DictFormatError::UnknownCompression(7))));
    }

    #[test]
    fn round_trips() {
        init();
        let text = b"the quick brown aardvark".repeat(20);
        assert_eq!(Compression::Gzip.decompress(&zlib(&text)).unwrap(), text);
        assert_eq!(Compression::Bzip2.decompress(&bzip2(&text)).unwrap(), text);
        assert_eq!(Compression::None.decompress(&text).unwrap(), text);
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        init();
        let mut padded = zlib(b"short article");
        padded.extend_from_slice(b"#### bytes of the next section ####");
        assert_eq!(Compression::Gzip.decompress(&padded).unwrap(), b"short article");
    }

    #[test]
    fn any_success_fallback() {
        init();
        let text = b"compressed either way";
        assert_eq!(decompress_any(&zlib(text)), text);
        assert_eq!(decompress_any(&bzip2(text)), text);
        // neither method accepts plain text, the raw bytes win
        assert_eq!(decompress_any(b"plain text article"), b"plain text article");
    }
}
