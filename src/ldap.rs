//! RFC 2307 style digests as found in LDAP `userPassword` attributes.
//!
//! | scheme | format |
//! |--------|--------|
//! | [`LdapMd5`], [`LdapSha1`] | `{MD5}` / `{SHA}` followed by the base64 digest |
//! | [`LdapSaltedMd5`], [`LdapSaltedSha1`] | `{SMD5}` / `{SSHA}` followed by base64 of digest and 4 byte salt |
//! | [`LdapPlaintext`] | the password itself |

use std::fmt;
use std::marker::PhantomData;

use crate::advisory::{Advisories, Advisory};
use crate::capability::{ChecksumSpec, EncodedChecksum, Input, RawChecksum, SaltCharset, SaltSpec};
use crate::crypto::{self, HashAlg};
use crate::error::{Error, Field, Result};
use crate::handler::{Descriptor, Handler, Params, Settings};
use crate::utils::{first_foreign_char, to_unicode, B64_CHARS, PADDED_B64_CHARS};

const SALT_SIZE: usize = 4;

/// Length of the padded base64 encoding of `len` bytes, and how many of those are `=`.
const fn b64_len(len: usize) -> (usize, usize) {
    ((len + 2) / 3 * 4, (3 - len % 3) % 3)
}

// Canonical padded base64 of exactly `raw_len` bytes.
fn is_padded_b64(text: &str, raw_len: usize) -> bool {
    let (len, pad) = b64_len(raw_len);
    let bytes = text.as_bytes();
    bytes.len() == len
        && first_foreign_char(&bytes[..len - pad], B64_CHARS).is_none()
        && bytes[len - pad..].iter().all(|&b| b == b'=')
}

/// The digest behind an LDAP scheme pair.
pub trait LdapDigest: fmt::Debug + Clone + PartialEq + Eq + 'static {
    /// Name of the unsalted scheme.
    const NAME: &'static str;
    /// Prefix of the unsalted scheme.
    const IDENT: &'static str;
    /// Name of the salted scheme.
    const SALTED_NAME: &'static str;
    /// Prefix of the salted scheme.
    const SALTED_IDENT: &'static str;
    /// Digest size in bytes.
    const SIZE: usize;

    /// Computes the digest.
    fn digest(data: &[u8]) -> Result<Vec<u8>>;
}

/// MD5, for `{MD5}` and `{SMD5}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Md5 {}

impl LdapDigest for Md5 {
    const NAME: &'static str = "ldap_md5";
    const IDENT: &'static str = "{MD5}";
    const SALTED_NAME: &'static str = "ldap_salted_md5";
    const SALTED_IDENT: &'static str = "{SMD5}";
    const SIZE: usize = 16;

    fn digest(data: &[u8]) -> Result<Vec<u8>> {
        Ok(crypto::md5_digest(data))
    }
}

/// SHA-1, for `{SHA}` and `{SSHA}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sha1 {}

impl LdapDigest for Sha1 {
    const NAME: &'static str = "ldap_sha1";
    const IDENT: &'static str = "{SHA}";
    const SALTED_NAME: &'static str = "ldap_salted_sha1";
    const SALTED_IDENT: &'static str = "{SSHA}";
    const SIZE: usize = 20;

    fn digest(data: &[u8]) -> Result<Vec<u8>> {
        crypto::digest(HashAlg::Sha1, data)
    }
}

/// An unsalted digest, `{MD5}...` or `{SHA}...`.
///
/// The configuration string is the bare prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdapPlainDigest<D: LdapDigest> {
    checksum: Option<String>,
    _digest: PhantomData<D>,
}

/// `{MD5}<base64 digest>`
pub type LdapMd5 = LdapPlainDigest<Md5>;

/// `{SHA}<base64 digest>`
pub type LdapSha1 = LdapPlainDigest<Sha1>;

impl<D: LdapDigest> Handler for LdapPlainDigest<D> {
    const DESCRIPTOR: Descriptor = Descriptor {
        name: D::NAME,
        ident: Some(D::IDENT),
        salt: None,
        rounds: None,
        idents: None,
        checksum: ChecksumSpec::Encoded(EncodedChecksum {
            size: Some(b64_len(D::SIZE).0),
            charset: Some(PADDED_B64_CHARS),
        }),
        settings: &[],
    };

    type Checksum = String;

    fn from_string(hash: &str) -> Result<Self> {
        let name = Self::name();
        if hash.is_empty() {
            return Err(Error::malformed(name, "empty hash"));
        }
        let digest = hash
            .strip_prefix(D::IDENT)
            .ok_or(Error::InvalidHashPrefix { scheme: name })?;
        if digest.is_empty() {
            return Ok(LdapPlainDigest {
                checksum: None,
                _digest: PhantomData,
            });
        }
        let checksum = Self::DESCRIPTOR
            .checksum
            .normalize_encoded(name, Input::Text(digest))?;
        if !is_padded_b64(&checksum, D::SIZE) {
            return Err(Error::malformed(name, "invalid base64 padding"));
        }
        Ok(LdapPlainDigest {
            checksum: Some(checksum),
            _digest: PhantomData,
        })
    }

    fn with_settings(settings: &Settings<'_>) -> Result<Self> {
        Params::from_settings(&Self::DESCRIPTOR, settings, &mut Advisories::new())?;
        Ok(LdapPlainDigest {
            checksum: None,
            _digest: PhantomData,
        })
    }

    fn calc_checksum(&self, secret: &[u8]) -> Result<String> {
        Ok(base64::encode(D::digest(secret)?))
    }

    fn checksum(&self) -> Option<&String> {
        self.checksum.as_ref()
    }

    fn with_checksum(mut self, checksum: String) -> Self {
        self.checksum = Some(checksum);
        self
    }

    fn advisories(&self) -> &[Advisory] {
        &[]
    }
}

impl<D: LdapDigest> fmt::Display for LdapPlainDigest<D> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(D::IDENT)?;
        match self.checksum {
            Some(ref checksum) => fmt.write_str(checksum),
            None => Ok(()),
        }
    }
}

/// A salted digest, `{SMD5}` or `{SSHA}` followed by base64 of digest and a 4 byte salt.
///
/// Configuration strings carry an all-zero placeholder digest, and parsing treats that
/// placeholder as "no checksum".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdapSaltedDigest<D: LdapDigest> {
    salt: Vec<u8>,
    checksum: Option<Vec<u8>>,
    advisories: Vec<Advisory>,
    _digest: PhantomData<D>,
}

/// `{SMD5}<base64 of digest || salt>`
pub type LdapSaltedMd5 = LdapSaltedDigest<Md5>;

/// `{SSHA}<base64 of digest || salt>`
pub type LdapSaltedSha1 = LdapSaltedDigest<Sha1>;

impl<D: LdapDigest> LdapSaltedDigest<D> {
    /// Raw salt.
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }
}

impl<D: LdapDigest> Handler for LdapSaltedDigest<D> {
    const DESCRIPTOR: Descriptor = Descriptor {
        name: D::SALTED_NAME,
        ident: Some(D::SALTED_IDENT),
        salt: Some(SaltSpec {
            min_size: SALT_SIZE,
            max_size: Some(SALT_SIZE),
            default_size: SALT_SIZE,
            charset: SaltCharset::Bytes,
        }),
        rounds: None,
        idents: None,
        checksum: ChecksumSpec::Raw(RawChecksum {
            size: Some(D::SIZE),
        }),
        settings: &[Field::Salt],
    };

    type Checksum = Vec<u8>;

    fn from_string(hash: &str) -> Result<Self> {
        let name = Self::name();
        if hash.is_empty() {
            return Err(Error::malformed(name, "empty hash"));
        }
        let data = hash
            .strip_prefix(D::SALTED_IDENT)
            .ok_or(Error::InvalidHashPrefix { scheme: name })?;
        if !is_padded_b64(data, D::SIZE + SALT_SIZE) {
            return Err(Error::malformed(name, "expected base64 of digest and salt"));
        }
        let data = base64::decode(data).map_err(|_| Error::malformed(name, "invalid base64"))?;
        let (checksum, salt) = data.split_at(D::SIZE);

        let params = Params::parsed(&Self::DESCRIPTOR, Some(Input::Bytes(salt)), None, None)?;
        let checksum = Self::DESCRIPTOR
            .checksum
            .normalize_raw(name, Input::Bytes(checksum))?;
        let checksum = if checksum.iter().all(|&b| b == 0) {
            None
        } else {
            Some(checksum)
        };
        Ok(LdapSaltedDigest {
            salt: params.salt().to_vec(),
            checksum,
            advisories: Vec::new(),
            _digest: PhantomData,
        })
    }

    fn with_settings(settings: &Settings<'_>) -> Result<Self> {
        let mut advisories = Advisories::new();
        let params = Params::from_settings(&Self::DESCRIPTOR, settings, &mut advisories)?;
        Ok(LdapSaltedDigest {
            salt: params.salt().to_vec(),
            checksum: None,
            advisories: advisories.into_vec(),
            _digest: PhantomData,
        })
    }

    fn calc_checksum(&self, secret: &[u8]) -> Result<Vec<u8>> {
        let mut data = secret.to_vec();
        data.extend_from_slice(&self.salt);
        D::digest(&data)
    }

    fn checksum(&self) -> Option<&Vec<u8>> {
        self.checksum.as_ref()
    }

    fn with_checksum(mut self, checksum: Vec<u8>) -> Self {
        self.checksum = Some(checksum);
        self
    }

    fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }
}

impl<D: LdapDigest> fmt::Display for LdapSaltedDigest<D> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let mut data = match self.checksum {
            Some(ref checksum) => checksum.clone(),
            None => vec![0u8; D::SIZE],
        };
        data.extend_from_slice(&self.salt);
        write!(fmt, "{}{}", D::SALTED_IDENT, base64::encode(data))
    }
}

// `{SCHEME}` at the start of a value marks an RFC 2307 hash.
fn has_scheme_prefix(value: &str) -> bool {
    value
        .strip_prefix('{')
        .and_then(|rest| rest.split_once('}'))
        .map_or(false, |(scheme, _)| {
            !scheme.is_empty() && scheme.chars().all(|c| c.is_alphanumeric() || c == '_')
        })
}

/// The password stored as is.
///
/// Claims every non-empty value that doesn't start with an RFC 2307 `{SCHEME}` prefix. The
/// configuration string is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdapPlaintext {
    checksum: Option<String>,
}

impl Handler for LdapPlaintext {
    const DESCRIPTOR: Descriptor = Descriptor {
        name: "ldap_plaintext",
        ident: None,
        salt: None,
        rounds: None,
        idents: None,
        checksum: ChecksumSpec::Encoded(EncodedChecksum {
            size: None,
            charset: None,
        }),
        settings: &[],
    };

    type Checksum = String;

    fn from_string(hash: &str) -> Result<Self> {
        let name = Self::name();
        if has_scheme_prefix(hash) {
            return Err(Error::InvalidHashPrefix { scheme: name });
        }
        let checksum = match hash {
            "" => None,
            text => Some(
                Self::DESCRIPTOR
                    .checksum
                    .normalize_encoded(name, Input::Text(text))?,
            ),
        };
        Ok(LdapPlaintext { checksum })
    }

    fn with_settings(settings: &Settings<'_>) -> Result<Self> {
        Params::from_settings(&Self::DESCRIPTOR, settings, &mut Advisories::new())?;
        Ok(LdapPlaintext { checksum: None })
    }

    fn calc_checksum(&self, secret: &[u8]) -> Result<String> {
        Ok(to_unicode(secret)?.to_owned())
    }

    fn checksum(&self) -> Option<&String> {
        self.checksum.as_ref()
    }

    fn with_checksum(mut self, checksum: String) -> Self {
        self.checksum = Some(checksum);
        self
    }

    fn advisories(&self) -> &[Advisory] {
        &[]
    }
}

impl fmt::Display for LdapPlaintext {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.checksum.as_deref().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_reference_hash() {
        let hash = "{SHA}W6ph5Mm5Pz8GgiULbPgzG37mj9g=";
        assert_eq!(
            LdapSha1::encrypt(b"password", &Settings::new()).unwrap().into_inner(),
            hash
        );
        assert!(LdapSha1::verify(b"password", hash).unwrap());
        assert!(!LdapSha1::verify(b"Password", hash).unwrap());
        assert_eq!(
            LdapSha1::from_string("{SHA}W6ph5Mm5Pz8GgiULbPgzG37mj9g"),
            Err(Error::malformed("ldap_sha1", "checksum has wrong size"))
        );
        assert_eq!(
            LdapSha1::from_string("{SHA}W6ph5Mm5Pz8GgiULbPgzG37mj9=="),
            Err(Error::malformed("ldap_sha1", "invalid base64 padding"))
        );
    }

    #[test]
    fn md5_reference_hashes() {
        let hash = "{MD5}X03MO1qnZdYdgyfeuILPmQ==";
        assert_eq!(
            LdapMd5::encrypt(b"password", &Settings::new()).unwrap().into_inner(),
            hash
        );
        assert!(LdapMd5::verify(b"password", hash).unwrap());
        assert!(!LdapSha1::identify(hash));

        let salted = "{SMD5}nXuh5+7dhsJMIAfcer5MygECAwQ=";
        let settings = Settings::new().salt(&[1u8, 2, 3, 4]);
        assert_eq!(
            LdapSaltedMd5::encrypt(b"password", &settings).unwrap().into_inner(),
            salted
        );
        assert_eq!(LdapSaltedMd5::from_string(salted).unwrap().salt(), &[1, 2, 3, 4]);
        assert!(LdapSaltedMd5::verify(b"password", salted).unwrap());
        assert!(LdapSaltedMd5::from_string("{SMD5}nXuh5+7dhsJMIAfcer5MygECAwQ").is_err());
    }

    #[test]
    fn unsalted_takes_no_settings() {
        assert_eq!(
            LdapSha1::genconfig(&Settings::new().salt("abcd")),
            Err(Error::UnsupportedSetting {
                scheme: "ldap_sha1",
                field: Field::Salt
            })
        );
        assert_eq!(LdapMd5::genconfig(&Settings::new()).unwrap().into_inner(), "{MD5}");
    }

    #[test]
    fn salted_sha1_layout() {
        let hash = "{SSHA}ouUZQtFbhkQrfIJ43qx176Wfj4YBAgME";
        let parsed = LdapSaltedSha1::from_string(hash).unwrap();
        assert_eq!(parsed.salt(), &[1, 2, 3, 4]);
        assert_eq!(parsed.to_string(), hash);
        assert!(LdapSaltedSha1::verify(b"password", hash).unwrap());

        let settings = Settings::new().salt(&[1u8, 2, 3, 4]);
        assert_eq!(
            LdapSaltedSha1::encrypt(b"password", &settings).unwrap().into_inner(),
            hash
        );
    }

    #[test]
    fn salted_sha1_config_is_placeholder() {
        let config = LdapSaltedSha1::genconfig(&Settings::new()).unwrap().into_inner();
        assert!(config.starts_with("{SSHA}AAAAAAAAAAAAAAAAAAAAAAAAA"));
        let parsed = LdapSaltedSha1::from_string(&config).unwrap();
        assert!(parsed.checksum().is_none());
        assert_eq!(parsed.salt().len(), 4);
        assert_eq!(
            LdapSaltedSha1::verify(b"x", &config),
            Err(Error::InvalidHash {
                scheme: "ldap_salted_sha1"
            })
        );
    }

    #[test]
    fn salted_sha1_salt_is_exactly_four_bytes() {
        let short = Settings::new().salt(&[1u8, 2, 3]);
        assert_eq!(
            LdapSaltedSha1::genconfig(&short),
            Err(Error::SaltTooShort {
                scheme: "ldap_salted_sha1",
                min: 4
            })
        );
        let long = Settings::new().salt(&[1u8, 2, 3, 4, 5]).strict(true);
        assert_eq!(
            LdapSaltedSha1::genconfig(&long),
            Err(Error::SaltTooLong {
                scheme: "ldap_salted_sha1",
                max: 4
            })
        );
        assert!(LdapSaltedSha1::from_string("{SSHA}ouUZQtFbhkQrfIJ43qx176Wfj4YBAgM=").is_err());
    }

    #[test]
    fn plaintext_claims_everything_unprefixed() {
        assert!(LdapPlaintext::identify("hunter2"));
        assert!(LdapPlaintext::identify("{not a scheme"));
        assert!(LdapPlaintext::identify("{} empty braces"));
        assert!(!LdapPlaintext::identify("{SSHA}ouUZQtFbhkQrfIJ43qx176Wfj4YBAgME"));
        assert!(!LdapPlaintext::identify("{CRYPT}$1$abc"));
        assert!(!LdapPlaintext::identify(""));
        assert_eq!(
            LdapPlaintext::from_string("{MD5}X03MO1qnZdYdgyfeuILPmQ=="),
            Err(Error::InvalidHashPrefix {
                scheme: "ldap_plaintext"
            })
        );
    }

    #[test]
    fn plaintext_hash_is_the_password() {
        let hash = LdapPlaintext::encrypt("lètmein".as_bytes(), &Settings::new()).unwrap();
        assert_eq!(&*hash, "lètmein");
        assert!(LdapPlaintext::verify("lètmein".as_bytes(), &hash).unwrap());
        assert!(!LdapPlaintext::verify(b"letmein", &hash).unwrap());
        assert_eq!(LdapPlaintext::genconfig(&Settings::new()).unwrap().into_inner(), "");
        assert_eq!(
            LdapPlaintext::genhash(b"pw", "").unwrap().into_inner(),
            "pw"
        );
        assert!(LdapPlaintext::encrypt(&[0xff], &Settings::new()).is_err());
    }
}
