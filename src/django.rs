//! Password hashes in the formats of Django's `auth` framework.
//!
//! * `sha1$<salt>$<hex digest>`: one round of SHA-1 over salt and password, and `md5$` with MD5.
//! * `pbkdf2_sha256$<rounds>$<salt>$<base64 digest>` and the `pbkdf2_sha1` variant.
//!
//! * `!`: the marker of an account without a usable password.
//!
//! Salts are alphanumeric text. Configuration strings leave the checksum field off.

use std::fmt;
use std::marker::PhantomData;

use crate::advisory::{Advisories, Advisory};
use crate::capability::{
    salt_text, BackendSlot, ChecksumSpec, EncodedChecksum, HasManyBackends, Input, RoundsCost,
    RoundsSpec, SaltCharset, SaltSpec,
};
use crate::crypto::{self, HashAlg, Pbkdf2Backend};
use crate::error::{Field, Result};
use crate::handler::{Descriptor, Handler, Params, Settings};
use crate::mcf::{parse_mc2, parse_mc3, render_mc2, render_mc3};
use crate::utils::{hex_encode, LOWER_HEX_CHARS, PADDED_B64_CHARS};

const DISABLED_MARKER: &str = "!";

/// Characters Django draws salts from.
pub const SALT_CHARS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// The digest behind a Django salted hasher.
pub trait SaltedDigest: fmt::Debug + Clone + PartialEq + Eq + 'static {
    /// Scheme name.
    const NAME: &'static str;
    /// Prefix, including the trailing separator.
    const IDENT: &'static str;
    /// Length of the hex checksum.
    const CHECKSUM_SIZE: usize;

    /// Computes the digest.
    fn digest(data: &[u8]) -> Result<Vec<u8>>;
}

/// SHA-1, `SHA1PasswordHasher`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaltedSha1 {}

impl SaltedDigest for SaltedSha1 {
    const NAME: &'static str = "django_salted_sha1";
    const IDENT: &'static str = "sha1$";
    const CHECKSUM_SIZE: usize = 40;

    fn digest(data: &[u8]) -> Result<Vec<u8>> {
        crypto::digest(HashAlg::Sha1, data)
    }
}

/// MD5, `MD5PasswordHasher`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaltedMd5 {}

impl SaltedDigest for SaltedMd5 {
    const NAME: &'static str = "django_salted_md5";
    const IDENT: &'static str = "md5$";
    const CHECKSUM_SIZE: usize = 32;

    fn digest(data: &[u8]) -> Result<Vec<u8>> {
        Ok(crypto::md5_digest(data))
    }
}

/// One round of `D` over salt and password, `<ident><salt>$<hex digest>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DjangoSalted<D: SaltedDigest> {
    salt: String,
    checksum: Option<String>,
    advisories: Vec<Advisory>,
    _digest: PhantomData<D>,
}

/// `sha1$<salt>$<hex digest>`
pub type DjangoSaltedSha1 = DjangoSalted<SaltedSha1>;

/// `md5$<salt>$<hex digest>`
pub type DjangoSaltedMd5 = DjangoSalted<SaltedMd5>;

impl<D: SaltedDigest> DjangoSalted<D> {
    /// Salt text.
    pub fn salt(&self) -> &str {
        &self.salt
    }
}

impl<D: SaltedDigest> Handler for DjangoSalted<D> {
    const DESCRIPTOR: Descriptor = Descriptor {
        name: D::NAME,
        ident: Some(D::IDENT),
        salt: Some(SaltSpec {
            min_size: 0,
            max_size: None,
            default_size: 12,
            charset: SaltCharset::Chars(SALT_CHARS),
        }),
        rounds: None,
        idents: None,
        checksum: ChecksumSpec::Encoded(EncodedChecksum {
            size: Some(D::CHECKSUM_SIZE),
            charset: Some(LOWER_HEX_CHARS),
        }),
        settings: &[Field::Salt, Field::SaltSize],
    };

    type Checksum = String;

    fn from_string(hash: &str) -> Result<Self> {
        let (salt, checksum) = parse_mc2(hash, D::IDENT, D::NAME)?;
        let params = Params::parsed(&Self::DESCRIPTOR, Some(Input::Text(salt)), None, None)?;
        Ok(DjangoSalted {
            salt: salt_text(params.salt()),
            checksum: normalize_checksum(&Self::DESCRIPTOR, checksum)?,
            advisories: Vec::new(),
            _digest: PhantomData,
        })
    }

    fn with_settings(settings: &Settings<'_>) -> Result<Self> {
        let mut advisories = Advisories::new();
        let params = Params::from_settings(&Self::DESCRIPTOR, settings, &mut advisories)?;
        Ok(DjangoSalted {
            salt: salt_text(params.salt()),
            checksum: None,
            advisories: advisories.into_vec(),
            _digest: PhantomData,
        })
    }

    fn calc_checksum(&self, secret: &[u8]) -> Result<String> {
        let mut data = self.salt.as_bytes().to_vec();
        data.extend_from_slice(secret);
        Ok(hex_encode(&D::digest(&data)?))
    }

    fn checksum(&self) -> Option<&String> {
        self.checksum.as_ref()
    }

    fn with_checksum(mut self, checksum: String) -> Self {
        self.checksum = Some(checksum);
        self
    }

    fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }
}

impl<D: SaltedDigest> fmt::Display for DjangoSalted<D> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(&render_mc2(D::IDENT, &self.salt, self.checksum.as_deref()))
    }
}

fn normalize_checksum(descriptor: &Descriptor, checksum: Option<&str>) -> Result<Option<String>> {
    checksum
        .map(|checksum| {
            descriptor
                .checksum
                .normalize_encoded(descriptor.name, Input::Text(checksum))
        })
        .transpose()
}

/// The PRF a Django PBKDF2 hasher is built on.
pub trait DjangoDigest: fmt::Debug + Clone + PartialEq + Eq + 'static {
    /// Scheme name.
    const NAME: &'static str;
    /// Prefix, including the trailing separator.
    const IDENT: &'static str;
    /// HMAC digest.
    const PRF: HashAlg;
    /// Length of the base64 checksum.
    const CHECKSUM_SIZE: usize;

    /// Backend slot of the scheme.
    fn backend_slot() -> &'static BackendSlot<Pbkdf2Backend>;
}

static PBKDF2_SHA256_BACKEND: BackendSlot<Pbkdf2Backend> =
    BackendSlot::new("django_pbkdf2_sha256");
static PBKDF2_SHA1_BACKEND: BackendSlot<Pbkdf2Backend> = BackendSlot::new("django_pbkdf2_sha1");

/// PBKDF2-HMAC-SHA256, `PBKDF2PasswordHasher`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sha256Digest {}

impl DjangoDigest for Sha256Digest {
    const NAME: &'static str = "django_pbkdf2_sha256";
    const IDENT: &'static str = "pbkdf2_sha256$";
    const PRF: HashAlg = HashAlg::Sha256;
    const CHECKSUM_SIZE: usize = 44;

    fn backend_slot() -> &'static BackendSlot<Pbkdf2Backend> {
        &PBKDF2_SHA256_BACKEND
    }
}

/// PBKDF2-HMAC-SHA1, `PBKDF2SHA1PasswordHasher`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sha1Digest {}

impl DjangoDigest for Sha1Digest {
    const NAME: &'static str = "django_pbkdf2_sha1";
    const IDENT: &'static str = "pbkdf2_sha1$";
    const PRF: HashAlg = HashAlg::Sha1;
    const CHECKSUM_SIZE: usize = 28;

    fn backend_slot() -> &'static BackendSlot<Pbkdf2Backend> {
        &PBKDF2_SHA1_BACKEND
    }
}

/// A Django PBKDF2 hash over the digest `D`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DjangoPbkdf2<D: DjangoDigest> {
    salt: String,
    rounds: u32,
    checksum: Option<String>,
    advisories: Vec<Advisory>,
    _digest: PhantomData<D>,
}

/// `pbkdf2_sha256$...`
pub type DjangoPbkdf2Sha256 = DjangoPbkdf2<Sha256Digest>;

/// `pbkdf2_sha1$...`
pub type DjangoPbkdf2Sha1 = DjangoPbkdf2<Sha1Digest>;

impl<D: DjangoDigest> DjangoPbkdf2<D> {
    /// Salt text.
    pub fn salt(&self) -> &str {
        &self.salt
    }

    /// PBKDF2 rounds.
    pub fn rounds(&self) -> u32 {
        self.rounds
    }
}

impl<D: DjangoDigest> HasManyBackends for DjangoPbkdf2<D> {
    type Backend = Pbkdf2Backend;

    fn backend_slot() -> &'static BackendSlot<Pbkdf2Backend> {
        D::backend_slot()
    }
}

impl<D: DjangoDigest> Handler for DjangoPbkdf2<D> {
    const DESCRIPTOR: Descriptor = Descriptor {
        name: D::NAME,
        ident: Some(D::IDENT),
        salt: Some(SaltSpec {
            min_size: 1,
            max_size: None,
            default_size: 12,
            charset: SaltCharset::Chars(SALT_CHARS),
        }),
        rounds: Some(RoundsSpec {
            min: 1,
            max: Some(0xffff_ffff),
            default: Some(10000),
            cost: RoundsCost::Linear,
            strict_bounds: false,
        }),
        idents: None,
        checksum: ChecksumSpec::Encoded(EncodedChecksum {
            size: Some(D::CHECKSUM_SIZE),
            charset: Some(PADDED_B64_CHARS),
        }),
        settings: &[Field::Salt, Field::SaltSize, Field::Rounds],
    };

    type Checksum = String;

    fn from_string(hash: &str) -> Result<Self> {
        let (rounds, salt, checksum) = parse_mc3(hash, D::IDENT, D::NAME)?;
        let params = Params::parsed(
            &Self::DESCRIPTOR,
            Some(Input::Text(salt)),
            Some(rounds),
            None,
        )?;
        Ok(DjangoPbkdf2 {
            salt: salt_text(params.salt()),
            rounds: params.rounds(),
            checksum: normalize_checksum(&Self::DESCRIPTOR, checksum)?,
            advisories: Vec::new(),
            _digest: PhantomData,
        })
    }

    fn with_settings(settings: &Settings<'_>) -> Result<Self> {
        let mut advisories = Advisories::new();
        let params = Params::from_settings(&Self::DESCRIPTOR, settings, &mut advisories)?;
        Ok(DjangoPbkdf2 {
            salt: salt_text(params.salt()),
            rounds: params.rounds(),
            checksum: None,
            advisories: advisories.into_vec(),
            _digest: PhantomData,
        })
    }

    fn calc_checksum(&self, secret: &[u8]) -> Result<String> {
        let key = Self::get_backend()?.pbkdf2(
            secret,
            self.salt.as_bytes(),
            self.rounds,
            None,
            D::PRF,
        )?;
        Ok(base64::encode(key))
    }

    fn checksum(&self) -> Option<&String> {
        self.checksum.as_ref()
    }

    fn with_checksum(mut self, checksum: String) -> Self {
        self.checksum = Some(checksum);
        self
    }

    fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }
}

impl<D: DjangoDigest> fmt::Display for DjangoPbkdf2<D> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(&render_mc3(
            D::IDENT,
            self.rounds,
            &self.salt,
            self.checksum.as_deref(),
        ))
    }
}

/// The `!` Django stores for accounts with an unusable password.
///
/// Hashing yields the marker again, and no secret ever matches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DjangoDisabled {
    checksum: Option<String>,
}

impl Handler for DjangoDisabled {
    const DESCRIPTOR: Descriptor = Descriptor {
        name: "django_disabled",
        ident: None,
        salt: None,
        rounds: None,
        idents: None,
        checksum: ChecksumSpec::Encoded(EncodedChecksum {
            size: Some(DISABLED_MARKER.len()),
            charset: Some(DISABLED_MARKER),
        }),
        settings: &[],
    };

    type Checksum = String;

    fn from_string(hash: &str) -> Result<Self> {
        let checksum = Self::DESCRIPTOR
            .checksum
            .normalize_encoded(Self::name(), Input::Text(hash))?;
        Ok(DjangoDisabled {
            checksum: Some(checksum),
        })
    }

    fn with_settings(settings: &Settings<'_>) -> Result<Self> {
        Params::from_settings(&Self::DESCRIPTOR, settings, &mut Advisories::new())?;
        Ok(DjangoDisabled { checksum: None })
    }

    fn calc_checksum(&self, _secret: &[u8]) -> Result<String> {
        Ok(DISABLED_MARKER.to_owned())
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

    fn matches(&self, _secret: &[u8]) -> Result<bool> {
        Ok(false)
    }
}

impl fmt::Display for DjangoDisabled {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(DISABLED_MARKER)
    }
}
