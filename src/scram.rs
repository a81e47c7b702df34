//! Stored SCRAM credentials in the `$scram$` format.
//!
//! A hash holds one PBKDF2 digest per algorithm, all sharing salt and rounds, so a server can
//! run a SCRAM exchange (RFC 5802) for any of the stored mechanisms:
//!
//! ```text
//! $scram$<rounds>$<ab64 salt>$sha-1=<ab64 digest>,sha-256=<ab64 digest>,...
//! ```
//!
//! A configuration string lists bare algorithm names in place of the digests. `sha-1` is
//! always present since SCRAM-SHA-1 is the mandatory mechanism.
//!
//! # Usage
//!
//! ```
//! use passhash::{Handler, Scram, Settings};
//! use passhash::scram::extract_digest_info;
//!
//! let settings = Settings::new().rounds(1000).algs(["sha-1", "sha-256"]);
//! let hash = Scram::encrypt(b"pencil", &settings).unwrap();
//! assert!(Scram::verify(b"pencil", &hash).unwrap());
//!
//! // A server hands these to its SCRAM-SHA-256 exchange.
//! let (salt, rounds, salted_password) = extract_digest_info(&hash, "SCRAM-SHA-256").unwrap();
//! assert_eq!((salt.len(), rounds, salted_password.len()), (12, 1000, 32));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use stringprep::saslprep;

use crate::advisory::{Advised, Advisories, Advisory};
use crate::capability::{
    BackendSlot, ChecksumSpec, HasManyBackends, Input, RoundsCost, RoundsSpec, SaltCharset,
    SaltSpec,
};
use crate::crypto::{HashAlg, Pbkdf2Backend};
use crate::error::{Error, Field, Result};
use crate::handler::{ChecksumValue, Descriptor, Handler, Params, Settings};
use crate::mcf::parse_rounds;
use crate::utils::{ab64_decode, ab64_encode, consteq, to_unicode};

const NAME: &str = "scram";
const IDENT: &str = "$scram$";

/// Algorithms stored when none are requested.
pub const DEFAULT_ALGS: &[&str] = &["sha-1", "sha-256", "sha-512"];

/// Order in which [`Scram::verify`] picks the single digest it checks.
pub const VERIFY_ALGS: &[&str] = &["sha-256", "sha-512", "sha-224", "sha-384", "sha-1"];

/// Longest algorithm name SCRAM mechanism names leave room for.
pub const MAX_ALG_NAME: usize = 9;

/// Digest per IANA algorithm name, sorted by name.
pub type DigestMap = BTreeMap<String, Vec<u8>>;

static BACKEND: BackendSlot<Pbkdf2Backend> = BackendSlot::new(NAME);

/// Naming conventions for digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameFormat {
    /// IANA names as used in SCRAM mechanism names: `sha-256`.
    Iana,
    /// Python hashlib names: `sha256`.
    Hashlib,
}

/// Normalizes a digest name into `format`.
///
/// Accepts IANA and hashlib names, SCRAM mechanism names (`SCRAM-SHA-256-PLUS`) and
/// `hmac-` prefixed PRF names, in any case. Names of unknown algorithms come back lower-cased
/// with those decorations removed.
pub fn norm_hash_name(name: &str, format: NameFormat) -> String {
    let lower = name.trim().to_ascii_lowercase();
    let mut core = lower.as_str();
    if let Some(mech) = core.strip_prefix("scram-") {
        core = mech.strip_suffix("-plus").unwrap_or(mech);
    }
    core = core
        .strip_prefix("hmac-")
        .or_else(|| core.strip_prefix("hmac_"))
        .unwrap_or(core);
    let alg = HashAlg::from_name(core).or_else(|| HashAlg::from_name(&core.replace('_', "-")));
    match (alg, format) {
        (Some(alg), NameFormat::Iana) => alg.iana_name().to_owned(),
        (Some(alg), NameFormat::Hashlib) => alg.hashlib_name().to_owned(),
        (None, _) => core.to_owned(),
    }
}

fn norm_algs<'a>(algs: impl IntoIterator<Item = &'a str>) -> Result<Vec<String>> {
    let mut algs: Vec<String> = algs
        .into_iter()
        .map(|alg| norm_hash_name(alg, NameFormat::Iana))
        .collect();
    algs.sort();
    algs.dedup();
    if let Some(long) = algs.iter().find(|alg| alg.len() > MAX_ALG_NAME) {
        return Err(Error::UnsupportedAlgorithm(long.clone()));
    }
    if !algs.iter().any(|alg| alg == "sha-1") {
        return Err(Error::MissingRequiredAlgorithm);
    }
    Ok(algs)
}

fn check_stored_name(alg: &str) -> Result<()> {
    if alg.len() > MAX_ALG_NAME {
        return Err(Error::malformed(NAME, "algorithm name too long"));
    }
    if alg.is_empty() || alg != norm_hash_name(alg, NameFormat::Iana) {
        return Err(Error::malformed(NAME, "malformed algorithm name"));
    }
    Ok(())
}

fn derive_with(
    backend: Pbkdf2Backend,
    password: &[u8],
    salt: &[u8],
    rounds: u32,
    alg: &str,
) -> Result<Vec<u8>> {
    if rounds < 1 {
        return Err(Error::RoundsTooLow {
            scheme: NAME,
            min: 1,
        });
    }
    let prf = HashAlg::from_name(&norm_hash_name(alg, NameFormat::Iana))
        .ok_or_else(|| Error::UnsupportedAlgorithm(alg.to_owned()))?;
    let prepared = saslprep(to_unicode(password)?)
        .map_err(|_| Error::InvalidSecret("secret rejected by SASLprep"))?;
    backend
        .or_supporting(prf)?
        .pbkdf2(prepared.as_bytes(), salt, rounds, None, prf)
}

/// Computes `SaltedPassword := Hi(SASLprep(password), salt, rounds)` for `alg`.
///
/// This is the value a SCRAM server needs to derive its stored and server keys. Digests the
/// selected backend can't compute are taken from the next backend that can.
pub fn derive_digest(password: &[u8], salt: &[u8], rounds: u32, alg: &str) -> Result<Vec<u8>> {
    derive_with(Scram::get_backend()?, password, salt, rounds, alg)
}

/// Returns salt, rounds and the digest of `alg` stored in `hash`.
pub fn extract_digest_info(hash: &str, alg: &str) -> Result<(Vec<u8>, u32, Vec<u8>)> {
    let alg = norm_hash_name(alg, NameFormat::Iana);
    let scram = Scram::from_string(hash)?;
    let mut digests = scram
        .checksum
        .ok_or_else(|| Error::malformed(NAME, "scram hash contains no digests"))?;
    let digest = digests
        .remove(&alg)
        .ok_or(Error::AlgorithmNotPresent(alg))?;
    Ok((scram.salt, scram.rounds, digest))
}

/// Lists the algorithms stored in `hash`, named in `format`.
pub fn extract_digest_algs(hash: &str, format: NameFormat) -> Result<Vec<String>> {
    let scram = Scram::from_string(hash)?;
    Ok(scram
        .algs
        .iter()
        .map(|alg| norm_hash_name(alg, format))
        .collect())
}

impl ChecksumValue for DigestMap {
    fn ct_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other)
                .fold(true, |equal, ((ka, va), (kb, vb))| {
                    equal & (ka == kb) & consteq(va, vb)
                })
    }
}

/// A SCRAM hash or configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scram {
    salt: Vec<u8>,
    rounds: u32,
    algs: Vec<String>,
    checksum: Option<DigestMap>,
    advisories: Vec<Advisory>,
}

impl Scram {
    /// Raw salt.
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// PBKDF2 rounds.
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Algorithm names, sorted.
    pub fn algs(&self) -> &[String] {
        &self.algs
    }

    /// Checks `secret` against `hash`, either quickly against the strongest supported digest
    /// or, with `full`, against every stored digest.
    ///
    /// A full check where some digests match and others don't returns `false` with an
    /// [`InconsistentDigests`](enum.Advisory.html#variant.InconsistentDigests) advisory; the
    /// hash has likely been tampered with.
    pub fn verify_with(secret: &[u8], hash: &str, full: bool) -> Result<Advised<bool>> {
        let scram = Self::parse_for_verify(hash)?;
        let digests = scram
            .checksum
            .as_ref()
            .ok_or(Error::InvalidHash { scheme: NAME })?;
        let backend = Self::get_backend()?;

        if !full {
            let usable = |alg: &str| {
                HashAlg::from_name(alg).map_or(false, |a| backend.or_supporting(a).is_ok())
            };
            for &alg in VERIFY_ALGS {
                if let Some(stored) = digests.get(alg).filter(|_| usable(alg)) {
                    let other = derive_with(backend, secret, &scram.salt, scram.rounds, alg)?;
                    return Ok(Advised::new(consteq(&other, stored), Vec::new()));
                }
            }
            return Err(Error::AlgorithmNotPresent("sha-1".to_owned()));
        }

        let (mut correct, mut failed) = (false, false);
        for (alg, stored) in digests {
            let other = derive_with(backend, secret, &scram.salt, scram.rounds, alg)?;
            if other.len() != stored.len() {
                return Err(Error::malformed(NAME, "mis-sized digest"));
            }
            if consteq(&other, stored) {
                correct = true;
            } else {
                failed = true;
            }
        }
        let mut advisories = Advisories::new();
        if correct && failed {
            advisories.record(Advisory::InconsistentDigests { scheme: NAME });
            return Ok(Advised::new(false, advisories.into_vec()));
        }
        Ok(Advised::new(correct, advisories.into_vec()))
    }

    /// Checks every stored digest. See [`Scram::verify_with`].
    pub fn verify_full(secret: &[u8], hash: &str) -> Result<Advised<bool>> {
        Self::verify_with(secret, hash, true)
    }
}

impl HasManyBackends for Scram {
    type Backend = Pbkdf2Backend;

    fn backend_slot() -> &'static BackendSlot<Pbkdf2Backend> {
        &BACKEND
    }
}

impl Handler for Scram {
    const DESCRIPTOR: Descriptor = Descriptor {
        name: NAME,
        ident: Some(IDENT),
        salt: Some(SaltSpec {
            min_size: 0,
            max_size: Some(1024),
            default_size: 12,
            charset: SaltCharset::Bytes,
        }),
        rounds: Some(RoundsSpec {
            min: 1,
            max: Some(u32::MAX),
            default: Some(6400),
            cost: RoundsCost::Linear,
            strict_bounds: false,
        }),
        idents: None,
        checksum: ChecksumSpec::Map,
        settings: &[Field::Salt, Field::SaltSize, Field::Rounds, Field::Algorithms],
    };

    type Checksum = DigestMap;

    fn from_string(hash: &str) -> Result<Self> {
        if hash.is_empty() {
            return Err(Error::malformed(NAME, "empty hash"));
        }
        let rest = hash
            .strip_prefix(IDENT)
            .ok_or(Error::InvalidHashPrefix { scheme: NAME })?;
        let mut parts = rest.split('$');
        let (rounds, salt, list) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(rounds), Some(salt), Some(list), None) => (rounds, salt, list),
            _ => return Err(Error::malformed(NAME, "wrong number of fields")),
        };
        let rounds = parse_rounds(rounds, NAME)?;
        let salt = ab64_decode(salt).ok_or_else(|| Error::malformed(NAME, "invalid salt"))?;
        if list.is_empty() {
            return Err(Error::malformed(NAME, "empty digest list"));
        }

        let (algs, checksum) = if list.contains('=') {
            let mut digests = DigestMap::new();
            for pair in list.split(',') {
                let (alg, digest) = pair
                    .split_once('=')
                    .ok_or_else(|| Error::malformed(NAME, "digest without algorithm"))?;
                check_stored_name(alg)?;
                let digest =
                    ab64_decode(digest).ok_or_else(|| Error::malformed(NAME, "invalid digest"))?;
                if digests.insert(alg.to_owned(), digest).is_some() {
                    return Err(Error::malformed(NAME, "duplicate algorithm"));
                }
            }
            (digests.keys().cloned().collect::<Vec<_>>(), Some(digests))
        } else {
            let mut algs = Vec::new();
            for alg in list.split(',') {
                check_stored_name(alg)?;
                algs.push(alg.to_owned());
            }
            algs.sort();
            algs.dedup();
            (algs, None)
        };
        if !algs.iter().any(|alg| alg == "sha-1") {
            return Err(Error::MissingRequiredAlgorithm);
        }

        let params = Params::parsed(&Self::DESCRIPTOR, Some(Input::Bytes(&salt)), Some(rounds), None)?;
        Ok(Scram {
            salt: params.salt().to_vec(),
            rounds: params.rounds(),
            algs,
            checksum,
            advisories: Vec::new(),
        })
    }

    fn with_settings(settings: &Settings<'_>) -> Result<Self> {
        let mut advisories = Advisories::new();
        let params = Params::from_settings(&Self::DESCRIPTOR, settings, &mut advisories)?;
        let algs = match settings.algs {
            Some(ref algs) => norm_algs(algs.iter().map(String::as_str))?,
            None => norm_algs(DEFAULT_ALGS.iter().copied())?,
        };
        Ok(Scram {
            salt: params.salt().to_vec(),
            rounds: params.rounds(),
            algs,
            checksum: None,
            advisories: advisories.into_vec(),
        })
    }

    fn calc_checksum(&self, secret: &[u8]) -> Result<DigestMap> {
        let backend = Self::get_backend()?;
        self.algs
            .iter()
            .map(|alg| {
                let digest = derive_with(backend, secret, &self.salt, self.rounds, alg)?;
                Ok((alg.clone(), digest))
            })
            .collect()
    }

    fn checksum(&self) -> Option<&DigestMap> {
        self.checksum.as_ref()
    }

    fn with_checksum(mut self, checksum: DigestMap) -> Self {
        self.algs = checksum.keys().cloned().collect();
        self.checksum = Some(checksum);
        self
    }

    fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    fn verify(secret: &[u8], hash: &str) -> Result<bool> {
        Self::verify_with(secret, hash, false).map(Advised::into_inner)
    }
}

impl fmt::Display for Scram {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}{}${}$", IDENT, self.rounds, ab64_encode(&self.salt))?;
        match self.checksum {
            Some(ref digests) => {
                let mut first = true;
                for (alg, digest) in digests {
                    if !first {
                        fmt.write_str(",")?;
                    }
                    first = false;
                    write!(fmt, "{}={}", alg, ab64_encode(digest))?;
                }
                Ok(())
            }
            None => fmt.write_str(&self.algs.join(",")),
        }
    }
}
