use crate::advisory::{Advisories, Advisory};
use crate::error::{Error, Field, Result};
use crate::random::{getrandbytes, getrandstr};
use crate::utils::first_foreign_char;

use super::Input;

/// The alphabet salts are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaltCharset {
    /// Salt is text restricted to these ASCII characters.
    Chars(&'static str),
    /// Salt is arbitrary bytes.
    Bytes,
}

/// Salt constraints of a scheme. Sizes count characters for text salts and bytes for raw ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaltSpec {
    /// Smallest accepted salt.
    pub min_size: usize,
    /// Largest accepted salt, if bounded.
    pub max_size: Option<usize>,
    /// Size of generated salts.
    pub default_size: usize,
    /// Alphabet of the salt.
    pub charset: SaltCharset,
}

impl SaltSpec {
    /// `true` if the salt is raw bytes rather than text.
    pub fn is_raw(&self) -> bool {
        self.charset == SaltCharset::Bytes
    }

    fn clamp_size(
        &self,
        scheme: &'static str,
        size: usize,
        strict: bool,
        advisories: &mut Advisories,
    ) -> Result<usize> {
        if size < self.min_size {
            return Err(Error::SaltTooShort {
                scheme,
                min: self.min_size,
            });
        }
        match self.max_size {
            Some(max) if size > max => {
                if strict {
                    return Err(Error::SaltTooLong { scheme, max });
                }
                advisories.record(Advisory::SaltTruncated {
                    scheme,
                    from: size,
                    to: max,
                });
                Ok(max)
            }
            _ => Ok(size),
        }
    }

    /// Generates a random salt of `size` (default: `default_size`) drawn from the alphabet.
    pub fn generate_salt(
        &self,
        scheme: &'static str,
        size: Option<usize>,
        strict: bool,
        advisories: &mut Advisories,
    ) -> Result<Vec<u8>> {
        let size = match size {
            Some(size) => self.clamp_size(scheme, size, strict, advisories)?,
            None => self.default_size,
        };
        Ok(match self.charset {
            SaltCharset::Chars(chars) => getrandstr(chars, size).into_bytes(),
            SaltCharset::Bytes => getrandbytes(size),
        })
    }

    /// Validates a caller-supplied salt, or generates one if none was given.
    ///
    /// Text salts come back as their ASCII bytes; text handed to a raw-salt scheme is taken as
    /// its UTF-8 encoding.
    pub fn normalize_salt(
        &self,
        scheme: &'static str,
        salt: Option<Input<'_>>,
        size: Option<usize>,
        strict: bool,
        advisories: &mut Advisories,
    ) -> Result<Vec<u8>> {
        let salt = match salt {
            Some(salt) => salt.as_bytes(),
            None if strict => {
                return Err(Error::MissingParameter {
                    scheme,
                    field: Field::Salt,
                })
            }
            None => return self.generate_salt(scheme, size, strict, advisories),
        };

        if let SaltCharset::Chars(chars) = self.charset {
            if let Some(character) = first_foreign_char(salt, chars) {
                return Err(Error::InvalidSalt { scheme, character });
            }
        }

        let kept = self.clamp_size(scheme, salt.len(), strict, advisories)?;
        Ok(salt[..kept].to_vec())
    }
}

/// Turns a salt validated against a `Chars` alphabet back into text.
pub(crate) fn salt_text(salt: &[u8]) -> String {
    salt.iter().map(|&b| char::from(b)).collect()
}
