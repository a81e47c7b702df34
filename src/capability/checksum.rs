use crate::error::{Error, Field, Result};
use crate::utils::first_foreign_char;

use super::Input;

/// A text checksum, checked for size and alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedChecksum {
    /// Exact length in characters, if fixed.
    pub size: Option<usize>,
    /// Accepted characters, if restricted.
    pub charset: Option<&'static str>,
}

impl EncodedChecksum {
    /// Checks a checksum read from a hash string. Violations are never repaired.
    pub fn normalize(&self, scheme: &'static str, checksum: Input<'_>) -> Result<String> {
        let text = match checksum {
            Input::Text(text) => text,
            Input::Bytes(bytes) => std::str::from_utf8(bytes)
                .map_err(|_| Error::malformed(scheme, "checksum is not ascii"))?,
        };
        if let Some(size) = self.size {
            if text.len() != size {
                return Err(Error::malformed(scheme, "checksum has wrong size"));
            }
        }
        if let Some(chars) = self.charset {
            if first_foreign_char(text.as_bytes(), chars).is_some() {
                return Err(Error::malformed(scheme, "invalid characters in checksum"));
            }
        }
        Ok(text.to_owned())
    }
}

/// A checksum stored as raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawChecksum {
    /// Exact length in bytes, if fixed.
    pub size: Option<usize>,
}

impl RawChecksum {
    /// Checks a raw checksum. Text is refused outright.
    pub fn normalize(&self, scheme: &'static str, checksum: Input<'_>) -> Result<Vec<u8>> {
        let bytes = match checksum {
            Input::Bytes(bytes) => bytes,
            Input::Text(_) => return Err(Error::ChecksumMustBeBytes { scheme }),
        };
        match self.size {
            Some(size) if bytes.len() != size => {
                Err(Error::malformed(scheme, "checksum has wrong size"))
            }
            _ => Ok(bytes.to_vec()),
        }
    }
}

/// The checksum form a scheme uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumSpec {
    /// Text checksum.
    Encoded(EncodedChecksum),
    /// Raw byte checksum.
    Raw(RawChecksum),
    /// One digest per algorithm, as SCRAM stores them.
    Map,
}

impl ChecksumSpec {
    /// Checks a text checksum. Schemes that don't store text checksums refuse it.
    pub fn normalize_encoded(&self, scheme: &'static str, checksum: Input<'_>) -> Result<String> {
        match self {
            ChecksumSpec::Encoded(spec) => spec.normalize(scheme, checksum),
            _ => Err(Error::UnsupportedSetting {
                scheme,
                field: Field::Checksum,
            }),
        }
    }

    /// Checks a raw checksum. Schemes that don't store raw checksums refuse it.
    pub fn normalize_raw(&self, scheme: &'static str, checksum: Input<'_>) -> Result<Vec<u8>> {
        match self {
            ChecksumSpec::Raw(spec) => spec.normalize(scheme, checksum),
            _ => Err(Error::UnsupportedSetting {
                scheme,
                field: Field::Checksum,
            }),
        }
    }
}
