//! The contract every password hash scheme implements.
//!
//! A scheme is a type implementing [`Handler`]. A value of that type is one hash: either a
//! configuration (parameters chosen, no checksum yet) or a computed hash. Scheme-wide
//! constants live in [`Handler::DESCRIPTOR`].

use std::fmt;

use crate::advisory::{Advised, Advisories, Advisory};
use crate::capability::{ChecksumSpec, IdentSpec, Input, RoundsSpec, SaltSpec};
use crate::error::{Error, Field, Result};
use crate::utils::{consteq, splitcomma};

/// Static description of a scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    /// Unique scheme name.
    pub name: &'static str,
    /// Fixed prefix every hash of the scheme starts with, if any.
    pub ident: Option<&'static str>,
    /// Salt constraints, for salted schemes.
    pub salt: Option<SaltSpec>,
    /// Rounds constraints, for schemes with a work factor.
    pub rounds: Option<RoundsSpec>,
    /// Accepted prefixes, for schemes with several.
    pub idents: Option<IdentSpec>,
    /// Checksum form.
    pub checksum: ChecksumSpec,
    /// Settings [`Settings`] may carry for this scheme.
    pub settings: &'static [Field],
}

/// Keyword settings for [`Handler::genconfig`] and [`Handler::encrypt`].
///
/// ```
/// use passhash::Settings;
///
/// let settings = Settings::new().salt("seasalt").rounds(12000).strict(true);
/// assert_eq!(settings.rounds, Some(12000));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings<'a> {
    /// Explicit salt. Generated when absent.
    pub salt: Option<Input<'a>>,
    /// Size of a generated salt.
    pub salt_size: Option<usize>,
    /// Work factor.
    pub rounds: Option<u32>,
    /// Identifier prefix or one of its aliases.
    pub ident: Option<&'a str>,
    /// Digest algorithms, for schemes storing several.
    pub algs: Option<Vec<String>>,
    /// Account name, for schemes salted with it.
    pub user: Option<&'a str>,
    /// Turns correctable violations into errors.
    pub strict: bool,
}

impl<'a> Settings<'a> {
    /// Empty, lenient settings.
    pub fn new() -> Self {
        Settings::default()
    }

    /// Sets the salt, as text or bytes.
    pub fn salt<S: Into<Input<'a>>>(mut self, salt: S) -> Self {
        self.salt = Some(salt.into());
        self
    }

    /// Sets the size of a generated salt.
    pub fn salt_size(mut self, size: usize) -> Self {
        self.salt_size = Some(size);
        self
    }

    /// Sets the rounds.
    pub fn rounds(mut self, rounds: u32) -> Self {
        self.rounds = Some(rounds);
        self
    }

    /// Sets the identifier.
    pub fn ident(mut self, ident: &'a str) -> Self {
        self.ident = Some(ident);
        self
    }

    /// Sets the algorithm list.
    pub fn algs<I, S>(mut self, algs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.algs = Some(algs.into_iter().map(|s| s.as_ref().to_owned()).collect());
        self
    }

    /// Sets the algorithm list from a comma separated string.
    pub fn algs_list(self, algs: &str) -> Self {
        self.algs(splitcomma(algs))
    }

    /// Sets the account name.
    pub fn user(mut self, user: &'a str) -> Self {
        self.user = Some(user);
        self
    }

    /// Enables or disables strict checking.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    fn given(&self) -> impl Iterator<Item = Field> + '_ {
        [
            (self.salt.is_some(), Field::Salt),
            (self.salt_size.is_some(), Field::SaltSize),
            (self.rounds.is_some(), Field::Rounds),
            (self.ident.is_some(), Field::Ident),
            (self.algs.is_some(), Field::Algorithms),
            (self.user.is_some(), Field::User),
        ]
        .into_iter()
        .filter_map(|(set, field)| if set { Some(field) } else { None })
    }
}

/// Normalized parameters of one hash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    /// Salt bytes. Text salts are their ASCII bytes.
    pub salt: Option<Vec<u8>>,
    /// Rounds.
    pub rounds: Option<u32>,
    /// Identifier prefix.
    pub ident: Option<&'static str>,
}

impl Params {
    /// Normalizes `settings` against `descriptor`, generating what is missing and recording
    /// lenient repairs in `advisories`.
    pub fn from_settings(
        descriptor: &Descriptor,
        settings: &Settings<'_>,
        advisories: &mut Advisories,
    ) -> Result<Params> {
        let scheme = descriptor.name;
        if let Some(field) = settings
            .given()
            .find(|field| !descriptor.settings.contains(field))
        {
            return Err(Error::UnsupportedSetting { scheme, field });
        }

        let salt = match descriptor.salt {
            Some(spec) => Some(spec.normalize_salt(
                scheme,
                settings.salt,
                settings.salt_size,
                settings.strict,
                advisories,
            )?),
            None => None,
        };
        let rounds = match descriptor.rounds {
            Some(spec) => Some(spec.normalize_rounds(
                scheme,
                settings.rounds,
                settings.strict,
                advisories,
            )?),
            None => None,
        };
        let ident = match descriptor.idents {
            Some(spec) => Some(spec.normalize_ident(scheme, settings.ident, settings.strict)?),
            None => None,
        };
        Ok(Params {
            salt,
            rounds,
            ident,
        })
    }

    /// Normalizes fields read from a hash string. Nothing is generated or repaired.
    pub fn parsed(
        descriptor: &Descriptor,
        salt: Option<Input<'_>>,
        rounds: Option<u32>,
        ident: Option<&str>,
    ) -> Result<Params> {
        let settings = Settings {
            salt,
            rounds,
            ident,
            strict: true,
            ..Settings::default()
        };
        let mut ignored = Advisories::new();
        Params::from_settings(descriptor, &settings, &mut ignored)
    }

    pub(crate) fn salt(&self) -> &[u8] {
        self.salt.as_deref().unwrap_or_default()
    }

    pub(crate) fn rounds(&self) -> u32 {
        self.rounds.unwrap_or_default()
    }
}

/// Equality check used by [`Handler::verify`]. Implementations must not exit early on the
/// first differing byte.
pub trait ChecksumValue {
    /// Constant-time equality.
    fn ct_eq(&self, other: &Self) -> bool;
}

impl ChecksumValue for String {
    fn ct_eq(&self, other: &Self) -> bool {
        consteq(self.as_bytes(), other.as_bytes())
    }
}

impl ChecksumValue for Vec<u8> {
    fn ct_eq(&self, other: &Self) -> bool {
        consteq(self, other)
    }
}

/// A password hash scheme.
///
/// Implementors supply parsing, construction from settings, and the checksum function; the
/// provided methods build the public operations from those.
///
/// ```
/// use passhash::{DjangoPbkdf2Sha256, Handler, Settings};
///
/// let settings = Settings::new().rounds(1000);
/// let hash = DjangoPbkdf2Sha256::encrypt(b"secret", &settings).unwrap();
/// assert!(DjangoPbkdf2Sha256::verify(b"secret", &hash).unwrap());
/// assert!(!DjangoPbkdf2Sha256::verify(b"guess", &hash).unwrap());
/// ```
pub trait Handler: Sized + fmt::Display {
    /// Scheme constants.
    const DESCRIPTOR: Descriptor;

    /// Checksum representation.
    type Checksum: ChecksumValue;

    /// Parses a hash or configuration string.
    ///
    /// Fails with `InvalidHashPrefix` if the string belongs to another scheme and with
    /// `MalformedHash` if it is structurally broken.
    fn from_string(hash: &str) -> Result<Self>;

    /// Builds a configuration from caller settings.
    fn with_settings(settings: &Settings<'_>) -> Result<Self>;

    /// Computes the checksum of `secret` under this hash's parameters.
    fn calc_checksum(&self, secret: &[u8]) -> Result<Self::Checksum>;

    /// The stored checksum; `None` for a configuration string.
    fn checksum(&self) -> Option<&Self::Checksum>;

    /// Replaces the checksum, turning a configuration into a computed hash.
    fn with_checksum(self, checksum: Self::Checksum) -> Self;

    /// Advisories raised while this value was built.
    fn advisories(&self) -> &[Advisory];

    /// The scheme name.
    fn name() -> &'static str {
        Self::DESCRIPTOR.name
    }

    /// Whether `hash` looks like it belongs to this scheme. Never fails.
    fn identify(hash: &str) -> bool {
        if hash.is_empty() {
            return false;
        }
        match Self::DESCRIPTOR.ident {
            Some(prefix) => hash.starts_with(prefix),
            None => Self::from_string(hash).is_ok(),
        }
    }

    /// Renders a configuration string.
    fn genconfig(settings: &Settings<'_>) -> Result<Advised<String>> {
        let config = Self::with_settings(settings)?;
        Ok(Advised::new(config.to_string(), config.advisories().to_vec()))
    }

    /// Hashes `secret` under the parameters of `config`, which may be a configuration string
    /// or an existing hash.
    fn genhash(secret: &[u8], config: &str) -> Result<Advised<String>> {
        Self::from_string(config)?.computed(secret)
    }

    /// Hashes `secret` with freshly normalized settings.
    fn encrypt(secret: &[u8], settings: &Settings<'_>) -> Result<Advised<String>> {
        Self::with_settings(settings)?.computed(secret)
    }

    /// Checks `secret` against `hash`.
    ///
    /// A hash that doesn't parse, or a configuration string, is reported as `InvalidHash`
    /// without detail.
    fn verify(secret: &[u8], hash: &str) -> Result<bool> {
        Self::parse_for_verify(hash)?.matches(secret)
    }

    #[doc(hidden)]
    fn matches(&self, secret: &[u8]) -> Result<bool> {
        let stored = self.checksum().ok_or(Error::InvalidHash {
            scheme: Self::name(),
        })?;
        Ok(self.calc_checksum(secret)?.ct_eq(stored))
    }

    #[doc(hidden)]
    fn parse_for_verify(hash: &str) -> Result<Self> {
        if hash.is_empty() {
            return Err(Error::NoHashSupplied);
        }
        Self::from_string(hash).map_err(|_| Error::InvalidHash {
            scheme: Self::name(),
        })
    }

    #[doc(hidden)]
    fn computed(self, secret: &[u8]) -> Result<Advised<String>> {
        let checksum = self.calc_checksum(secret)?;
        let hash = self.with_checksum(checksum);
        Ok(Advised::new(hash.to_string(), hash.advisories().to_vec()))
    }
}

/// A scheme whose checksum also depends on the account name.
///
/// The name isn't part of the hash string, so it has to be supplied again to check a secret:
///
/// ```
/// use passhash::{Handler, HasUserContext, Msdcc2, Settings};
///
/// let hash = Msdcc2::encrypt(b"password", &Settings::new().user("Administrator")).unwrap();
/// assert!(Msdcc2::verify_for(b"password", &hash, "administrator").unwrap());
/// assert!(!Msdcc2::verify_for(b"password", &hash, "guest").unwrap());
/// ```
pub trait HasUserContext: Handler {
    /// Binds the hash to `user`.
    fn for_user(self, user: &str) -> Self;

    /// [`Handler::genhash`] on behalf of `user`.
    fn genhash_for(secret: &[u8], config: &str, user: &str) -> Result<Advised<String>> {
        Self::from_string(config)?.for_user(user).computed(secret)
    }

    /// [`Handler::verify`] on behalf of `user`.
    fn verify_for(secret: &[u8], hash: &str, user: &str) -> Result<bool> {
        Self::parse_for_verify(hash)?.for_user(user).matches(secret)
    }
}
