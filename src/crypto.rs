//! Hash primitives the schemes are built from.
//!
//! `ring` supplies SHA-1, SHA-2, HMAC and PBKDF2. With the `rustcrypto` feature a second
//! PBKDF2 backend on top of the RustCrypto crates is available, which also knows SHA-224.
//! The legacy primitives `ring` leaves out (MD4, MD5, single DES) come from the RustCrypto
//! crates unconditionally.

use std::fmt;
use std::num::NonZeroU32;

use ring::{digest, hmac, pbkdf2 as ring_pbkdf2};

use crate::capability::Backend;
use crate::error::{Error, Result};

/// Digest algorithms the crate can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashAlg {
    /// SHA-1
    Sha1,
    /// SHA-224
    Sha224,
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

impl HashAlg {
    /// Every algorithm, in ascending output size.
    pub const ALL: [HashAlg; 5] = [
        HashAlg::Sha1,
        HashAlg::Sha224,
        HashAlg::Sha256,
        HashAlg::Sha384,
        HashAlg::Sha512,
    ];

    /// IANA hash function textual name, e.g. `sha-256`.
    pub fn iana_name(self) -> &'static str {
        match self {
            HashAlg::Sha1 => "sha-1",
            HashAlg::Sha224 => "sha-224",
            HashAlg::Sha256 => "sha-256",
            HashAlg::Sha384 => "sha-384",
            HashAlg::Sha512 => "sha-512",
        }
    }

    /// Python hashlib style name, e.g. `sha256`.
    pub fn hashlib_name(self) -> &'static str {
        match self {
            HashAlg::Sha1 => "sha1",
            HashAlg::Sha224 => "sha224",
            HashAlg::Sha256 => "sha256",
            HashAlg::Sha384 => "sha384",
            HashAlg::Sha512 => "sha512",
        }
    }

    /// Looks up an algorithm by either its IANA or hashlib name, exactly as written.
    pub fn from_name(name: &str) -> Option<HashAlg> {
        HashAlg::ALL
            .iter()
            .copied()
            .find(|alg| alg.iana_name() == name || alg.hashlib_name() == name)
    }

    /// Digest size in bytes.
    pub fn output_len(self) -> usize {
        match self {
            HashAlg::Sha1 => digest::SHA1_OUTPUT_LEN,
            HashAlg::Sha224 => 28,
            HashAlg::Sha256 => digest::SHA256_OUTPUT_LEN,
            HashAlg::Sha384 => digest::SHA384_OUTPUT_LEN,
            HashAlg::Sha512 => digest::SHA512_OUTPUT_LEN,
        }
    }

    fn ring_digest(self) -> Option<&'static digest::Algorithm> {
        match self {
            HashAlg::Sha1 => Some(&digest::SHA1_FOR_LEGACY_USE_ONLY),
            HashAlg::Sha224 => None,
            HashAlg::Sha256 => Some(&digest::SHA256),
            HashAlg::Sha384 => Some(&digest::SHA384),
            HashAlg::Sha512 => Some(&digest::SHA512),
        }
    }

    fn ring_hmac(self) -> Option<hmac::Algorithm> {
        match self {
            HashAlg::Sha1 => Some(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY),
            HashAlg::Sha224 => None,
            HashAlg::Sha256 => Some(hmac::HMAC_SHA256),
            HashAlg::Sha384 => Some(hmac::HMAC_SHA384),
            HashAlg::Sha512 => Some(hmac::HMAC_SHA512),
        }
    }

    fn ring_pbkdf2(self) -> Option<ring_pbkdf2::Algorithm> {
        match self {
            HashAlg::Sha1 => Some(ring_pbkdf2::PBKDF2_HMAC_SHA1),
            HashAlg::Sha224 => None,
            HashAlg::Sha256 => Some(ring_pbkdf2::PBKDF2_HMAC_SHA256),
            HashAlg::Sha384 => Some(ring_pbkdf2::PBKDF2_HMAC_SHA384),
            HashAlg::Sha512 => Some(ring_pbkdf2::PBKDF2_HMAC_SHA512),
        }
    }

    fn unsupported(self) -> Error {
        Error::UnsupportedAlgorithm(self.iana_name().to_owned())
    }
}

impl fmt::Display for HashAlg {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.iana_name())
    }
}

/// Computes the digest of `data`.
pub fn digest(alg: HashAlg, data: &[u8]) -> Result<Vec<u8>> {
    if let Some(ring_alg) = alg.ring_digest() {
        return Ok(digest::digest(ring_alg, data).as_ref().to_vec());
    }
    rustcrypto::digest(alg, data).ok_or_else(|| alg.unsupported())
}

/// Computes HMAC of `msg` keyed with `key`.
pub fn hmac_digest(alg: HashAlg, key: &[u8], msg: &[u8]) -> Result<Vec<u8>> {
    if let Some(ring_alg) = alg.ring_hmac() {
        let key = hmac::Key::new(ring_alg, key);
        return Ok(hmac::sign(&key, msg).as_ref().to_vec());
    }
    rustcrypto::hmac(alg, key, msg).ok_or_else(|| alg.unsupported())
}

/// MD4 digest of `data`, as used by NT hashes.
pub fn md4_digest(data: &[u8]) -> Vec<u8> {
    use md4::{Digest, Md4};
    Md4::digest(data).to_vec()
}

/// MD5 digest of `data`.
pub fn md5_digest(data: &[u8]) -> Vec<u8> {
    use md5::{Digest, Md5};
    Md5::digest(data).to_vec()
}

// Spreads 56 key bits over 8 bytes, 7 per byte, leaving the parity bit clear.
fn expand_des_key(key: &[u8; 7]) -> [u8; 8] {
    let mut bits = [0u8; 8];
    bits[1..].copy_from_slice(key);
    let bits = u64::from_be_bytes(bits);
    let mut expanded = [0u8; 8];
    for (i, byte) in expanded.iter_mut().enumerate() {
        *byte = ((bits >> (49 - 7 * i)) as u8 & 0x7f) << 1;
    }
    expanded
}

/// Encrypts a single 8 byte block with DES under a 56 bit key packed into 7 bytes.
pub fn des_block_encrypt(key: &[u8; 7], block: &[u8; 8]) -> [u8; 8] {
    use des::cipher::generic_array::GenericArray;
    use des::cipher::{BlockEncrypt, KeyInit};
    use des::Des;

    let cipher = Des::new(GenericArray::from_slice(&expand_des_key(key)));
    let mut data = GenericArray::clone_from_slice(block);
    cipher.encrypt_block(&mut data);
    let mut out = [0u8; 8];
    out.copy_from_slice(&data);
    out
}

/// PBKDF2 key derivation with HMAC-`prf`, on the first backend able to compute it.
///
/// `keylen` defaults to the digest size of `prf`.
pub fn pbkdf2(
    secret: &[u8],
    salt: &[u8],
    rounds: u32,
    keylen: Option<usize>,
    prf: HashAlg,
) -> Result<Vec<u8>> {
    Pbkdf2Backend::first_supporting(prf)?.pbkdf2(secret, salt, rounds, keylen, prf)
}

/// Implementations of PBKDF2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pbkdf2Backend {
    /// `ring`, always present.
    Ring,
    /// The RustCrypto `pbkdf2` crate, behind the `rustcrypto` feature.
    RustCrypto,
}

impl Backend for Pbkdf2Backend {
    const ALL: &'static [Pbkdf2Backend] = &[Pbkdf2Backend::Ring, Pbkdf2Backend::RustCrypto];

    fn name(self) -> &'static str {
        match self {
            Pbkdf2Backend::Ring => "ring",
            Pbkdf2Backend::RustCrypto => "rustcrypto",
        }
    }

    fn is_available(self) -> bool {
        match self {
            Pbkdf2Backend::Ring => true,
            Pbkdf2Backend::RustCrypto => rustcrypto::AVAILABLE,
        }
    }
}

impl Pbkdf2Backend {
    /// Whether this backend can use `prf`.
    pub fn supports(self, prf: HashAlg) -> bool {
        match self {
            Pbkdf2Backend::Ring => prf.ring_pbkdf2().is_some(),
            Pbkdf2Backend::RustCrypto => rustcrypto::AVAILABLE,
        }
    }

    /// The first available backend, in priority order, able to use `prf`.
    pub fn first_supporting(prf: HashAlg) -> Result<Pbkdf2Backend> {
        Pbkdf2Backend::ALL
            .iter()
            .copied()
            .find(|b| b.is_available() && b.supports(prf))
            .ok_or_else(|| prf.unsupported())
    }

    /// `self` when it can use `prf`, otherwise the first available backend that can.
    pub fn or_supporting(self, prf: HashAlg) -> Result<Pbkdf2Backend> {
        if self.is_available() && self.supports(prf) {
            Ok(self)
        } else {
            Pbkdf2Backend::first_supporting(prf)
        }
    }

    /// Derives a `keylen` byte key (default: digest size of `prf`).
    pub fn pbkdf2(
        self,
        secret: &[u8],
        salt: &[u8],
        rounds: u32,
        keylen: Option<usize>,
        prf: HashAlg,
    ) -> Result<Vec<u8>> {
        let iterations = NonZeroU32::new(rounds).ok_or(Error::RoundsTooLow {
            scheme: "pbkdf2",
            min: 1,
        })?;
        let mut out = vec![0u8; keylen.unwrap_or_else(|| prf.output_len())];
        match self {
            Pbkdf2Backend::Ring => {
                let alg = prf.ring_pbkdf2().ok_or_else(|| prf.unsupported())?;
                ring_pbkdf2::derive(alg, iterations, salt, secret, &mut out);
            }
            Pbkdf2Backend::RustCrypto => {
                if !rustcrypto::pbkdf2(prf, secret, salt, iterations.get(), &mut out) {
                    return Err(prf.unsupported());
                }
            }
        }
        Ok(out)
    }
}

#[cfg(feature = "rustcrypto")]
mod rustcrypto {
    use hmac::{Hmac, Mac};
    use pbkdf2::pbkdf2_hmac;
    use sha1::Sha1;
    use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

    use super::HashAlg;

    pub const AVAILABLE: bool = true;

    pub fn digest(alg: HashAlg, data: &[u8]) -> Option<Vec<u8>> {
        Some(match alg {
            HashAlg::Sha1 => Sha1::digest(data).to_vec(),
            HashAlg::Sha224 => Sha224::digest(data).to_vec(),
            HashAlg::Sha256 => Sha256::digest(data).to_vec(),
            HashAlg::Sha384 => Sha384::digest(data).to_vec(),
            HashAlg::Sha512 => Sha512::digest(data).to_vec(),
        })
    }

    fn mac<M: Mac + hmac::digest::KeyInit>(key: &[u8], msg: &[u8]) -> Option<Vec<u8>> {
        let mut mac = <M as hmac::digest::KeyInit>::new_from_slice(key).ok()?;
        mac.update(msg);
        Some(mac.finalize().into_bytes().to_vec())
    }

    pub fn hmac(alg: HashAlg, key: &[u8], msg: &[u8]) -> Option<Vec<u8>> {
        match alg {
            HashAlg::Sha1 => mac::<Hmac<Sha1>>(key, msg),
            HashAlg::Sha224 => mac::<Hmac<Sha224>>(key, msg),
            HashAlg::Sha256 => mac::<Hmac<Sha256>>(key, msg),
            HashAlg::Sha384 => mac::<Hmac<Sha384>>(key, msg),
            HashAlg::Sha512 => mac::<Hmac<Sha512>>(key, msg),
        }
    }

    pub fn pbkdf2(alg: HashAlg, secret: &[u8], salt: &[u8], rounds: u32, out: &mut [u8]) -> bool {
        match alg {
            HashAlg::Sha1 => pbkdf2_hmac::<Sha1>(secret, salt, rounds, out),
            HashAlg::Sha224 => pbkdf2_hmac::<Sha224>(secret, salt, rounds, out),
            HashAlg::Sha256 => pbkdf2_hmac::<Sha256>(secret, salt, rounds, out),
            HashAlg::Sha384 => pbkdf2_hmac::<Sha384>(secret, salt, rounds, out),
            HashAlg::Sha512 => pbkdf2_hmac::<Sha512>(secret, salt, rounds, out),
        }
        true
    }
}

#[cfg(not(feature = "rustcrypto"))]
mod rustcrypto {
    use super::HashAlg;

    pub const AVAILABLE: bool = false;

    pub fn digest(_alg: HashAlg, _data: &[u8]) -> Option<Vec<u8>> {
        None
    }

    pub fn hmac(_alg: HashAlg, _key: &[u8], _msg: &[u8]) -> Option<Vec<u8>> {
        None
    }

    pub fn pbkdf2(_alg: HashAlg, _secret: &[u8], _salt: &[u8], _rounds: u32, _out: &mut [u8]) -> bool {
        false
    }
}
