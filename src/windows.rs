//! Microsoft Windows password hashes.
//!
//! * [`LmHash`]: LAN Manager, two DES encryptions of a constant under the upper-cased password.
//! * [`NtHash`]: MD4 over the UTF-16LE encoded password. Also comes with FreeBSD's `$3$$`
//!   modular crypt prefix in front of it.
//! * [`Msdcc`] and [`Msdcc2`]: domain cached credentials, salted with the account name.
//!
//! All of them are 32 hex digits. Hex digits may come in either case; output is always lower
//! case. None of them has a checksum-free form, so configuration strings carry 32 zeros.

use std::fmt;
use std::marker::PhantomData;

use crate::advisory::Advisory;
use crate::capability::{ChecksumSpec, EncodedChecksum, IdentSpec, Input};
use crate::crypto::{des_block_encrypt, md4_digest, pbkdf2, HashAlg};
use crate::error::{Error, Field, Result};
use crate::handler::{Descriptor, HasUserContext, Handler, Params, Settings};
use crate::utils::{hex_encode, to_unicode, HEX_CHARS};

/// Identifier of the bare form.
pub const BARE_IDENT: &str = "";

/// Identifier of the FreeBSD form.
pub const BSD_IDENT: &str = "$3$$";

const IDENTS: IdentSpec = IdentSpec {
    default: BARE_IDENT,
    values: &[BARE_IDENT, BSD_IDENT],
    aliases: &[("bare", BARE_IDENT), ("bsd", BSD_IDENT), ("freebsd", BSD_IDENT)],
};

const HEX_CHECKSUM: ChecksumSpec = ChecksumSpec::Encoded(EncodedChecksum {
    size: Some(32),
    charset: Some(HEX_CHARS),
});

const STUB: &str = "00000000000000000000000000000000";

const LM_MAGIC: &[u8; 8] = b"KGS!@#$%";

/// Reads a hex checksum, lower-cased, with the all-zero stub read as "no checksum".
fn parse_hex(descriptor: &Descriptor, hex: &str) -> Result<Option<String>> {
    if hex.is_empty() {
        return Err(Error::malformed(descriptor.name, "empty hash"));
    }
    let checksum = descriptor
        .checksum
        .normalize_encoded(descriptor.name, Input::Text(hex))?
        .to_ascii_lowercase();
    Ok(if checksum == STUB { None } else { Some(checksum) })
}

fn utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// A LAN Manager hash.
///
/// The secret is taken as bytes in the legacy code page, upper-cased in the ASCII range, and
/// cut or zero-padded to 14 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LmHash {
    checksum: Option<String>,
}

impl LmHash {
    /// Raw 16 byte digest of `secret`.
    pub fn raw(secret: &[u8]) -> Vec<u8> {
        let mut padded = [0u8; 14];
        for (slot, byte) in padded.iter_mut().zip(secret) {
            *slot = byte.to_ascii_uppercase();
        }
        let mut first = [0u8; 7];
        let mut second = [0u8; 7];
        first.copy_from_slice(&padded[..7]);
        second.copy_from_slice(&padded[7..]);

        let mut digest = des_block_encrypt(&first, LM_MAGIC).to_vec();
        digest.extend_from_slice(&des_block_encrypt(&second, LM_MAGIC));
        digest
    }
}

impl Handler for LmHash {
    const DESCRIPTOR: Descriptor = Descriptor {
        name: "lmhash",
        ident: None,
        salt: None,
        rounds: None,
        idents: None,
        checksum: HEX_CHECKSUM,
        settings: &[],
    };

    type Checksum = String;

    fn from_string(hash: &str) -> Result<Self> {
        Ok(LmHash {
            checksum: parse_hex(&Self::DESCRIPTOR, hash)?,
        })
    }

    fn with_settings(settings: &Settings<'_>) -> Result<Self> {
        Params::from_settings(&Self::DESCRIPTOR, settings, &mut Default::default())?;
        Ok(LmHash { checksum: None })
    }

    fn calc_checksum(&self, secret: &[u8]) -> Result<String> {
        Ok(hex_encode(&Self::raw(secret)))
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

impl fmt::Display for LmHash {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.checksum.as_deref().unwrap_or(STUB))
    }
}

/// An NT hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NtHash {
    ident: &'static str,
    checksum: Option<String>,
}

impl NtHash {
    /// Raw 16 byte digest of `secret`, which must be UTF-8.
    pub fn raw(secret: &[u8]) -> Result<Vec<u8>> {
        Ok(md4_digest(&utf16le(to_unicode(secret)?)))
    }

    /// Identifier this hash is rendered with.
    pub fn ident(&self) -> &'static str {
        self.ident
    }
}

impl Handler for NtHash {
    const DESCRIPTOR: Descriptor = Descriptor {
        name: "nthash",
        ident: None,
        salt: None,
        rounds: None,
        idents: Some(IDENTS),
        checksum: HEX_CHECKSUM,
        settings: &[Field::Ident],
    };

    type Checksum = String;

    fn from_string(hash: &str) -> Result<Self> {
        let name = Self::name();
        if hash.is_empty() {
            return Err(Error::malformed(name, "empty hash"));
        }
        let ident = IDENTS
            .match_prefix(hash)
            .ok_or(Error::InvalidHashPrefix { scheme: name })?;
        let params = Params::parsed(&Self::DESCRIPTOR, None, None, Some(ident))?;
        Ok(NtHash {
            ident: params.ident.unwrap_or(BARE_IDENT),
            checksum: parse_hex(&Self::DESCRIPTOR, &hash[ident.len()..])?,
        })
    }

    fn with_settings(settings: &Settings<'_>) -> Result<Self> {
        let params = Params::from_settings(&Self::DESCRIPTOR, settings, &mut Default::default())?;
        Ok(NtHash {
            ident: params.ident.unwrap_or(BARE_IDENT),
            checksum: None,
        })
    }

    fn calc_checksum(&self, secret: &[u8]) -> Result<String> {
        Ok(hex_encode(&Self::raw(secret)?))
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

impl fmt::Display for NtHash {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "{}{}",
            self.ident,
            self.checksum.as_deref().unwrap_or(STUB)
        )
    }
}

/// A version of the domain cached credentials algorithm.
pub trait CacheVersion: fmt::Debug + Clone + PartialEq + Eq + 'static {
    /// Scheme name.
    const NAME: &'static str;

    /// Digest of `secret` for the account `user`.
    fn raw(secret: &[u8], user: &str) -> Result<Vec<u8>>;
}

// MD4(NT hash || lower-cased user name), with both sides in UTF-16LE.
fn dcc1(secret: &[u8], user: &str) -> Result<Vec<u8>> {
    let mut data = NtHash::raw(secret)?;
    data.extend_from_slice(&utf16le(&user.to_lowercase()));
    Ok(md4_digest(&data))
}

/// Version 1, `MD4(MD4(password) || user)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dcc1 {}

impl CacheVersion for Dcc1 {
    const NAME: &'static str = "msdcc";

    fn raw(secret: &[u8], user: &str) -> Result<Vec<u8>> {
        dcc1(secret, user)
    }
}

/// Version 2, version 1 strengthened by 10240 rounds of PBKDF2-HMAC-SHA1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dcc2 {}

impl Dcc2 {
    const ROUNDS: u32 = 10240;
}

impl CacheVersion for Dcc2 {
    const NAME: &'static str = "msdcc2";

    fn raw(secret: &[u8], user: &str) -> Result<Vec<u8>> {
        let v1 = dcc1(secret, user)?;
        let salt = utf16le(&user.to_lowercase());
        pbkdf2(&v1, &salt, Dcc2::ROUNDS, Some(16), HashAlg::Sha1)
    }
}

/// A domain cached credentials hash. The account name isn't stored in the hash and has to be
/// supplied through [`Settings::user`] or [`HasUserContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainCached<V: CacheVersion> {
    user: Option<String>,
    checksum: Option<String>,
    _version: PhantomData<V>,
}

/// Domain cached credentials, version 1.
pub type Msdcc = DomainCached<Dcc1>;

/// Domain cached credentials, version 2.
pub type Msdcc2 = DomainCached<Dcc2>;

impl<V: CacheVersion> DomainCached<V> {
    /// Raw 16 byte digest of `secret` for `user`. The user name is case insensitive.
    pub fn raw(secret: &[u8], user: &str) -> Result<Vec<u8>> {
        V::raw(secret, user)
    }

    /// Account name the hash is bound to, if known.
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }
}

impl<V: CacheVersion> Handler for DomainCached<V> {
    const DESCRIPTOR: Descriptor = Descriptor {
        name: V::NAME,
        ident: None,
        salt: None,
        rounds: None,
        idents: None,
        checksum: HEX_CHECKSUM,
        settings: &[Field::User],
    };

    type Checksum = String;

    fn from_string(hash: &str) -> Result<Self> {
        Ok(DomainCached {
            user: None,
            checksum: parse_hex(&Self::DESCRIPTOR, hash)?,
            _version: PhantomData,
        })
    }

    fn with_settings(settings: &Settings<'_>) -> Result<Self> {
        Params::from_settings(&Self::DESCRIPTOR, settings, &mut Default::default())?;
        Ok(DomainCached {
            user: settings.user.map(str::to_owned),
            checksum: None,
            _version: PhantomData,
        })
    }

    fn calc_checksum(&self, secret: &[u8]) -> Result<String> {
        let user = self.user.as_deref().ok_or(Error::MissingParameter {
            scheme: V::NAME,
            field: Field::User,
        })?;
        Ok(hex_encode(&V::raw(secret, user)?))
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

impl<V: CacheVersion> HasUserContext for DomainCached<V> {
    fn for_user(mut self, user: &str) -> Self {
        self.user = Some(user.to_owned());
        self
    }
}

impl<V: CacheVersion> fmt::Display for DomainCached<V> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.checksum.as_deref().unwrap_or(STUB))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSWORD: &str = "8846f7eaee8fb117ad06bdd830b7586c";

    #[test]
    fn reference_digests() {
        assert_eq!(
            NtHash::encrypt(b"password", &Settings::new()).unwrap().into_inner(),
            PASSWORD
        );
        assert_eq!(
            NtHash::encrypt(b"", &Settings::new()).unwrap().into_inner(),
            "31d6cfe0d16ae931b73c59d7e0c089c0"
        );
        assert!(NtHash::raw(&[0xff]).is_err());
    }

    #[test]
    fn bsd_ident_and_aliases() {
        let bsd = NtHash::encrypt(b"password", &Settings::new().ident("freebsd")).unwrap();
        assert_eq!(&*bsd, &format!("$3$${}", PASSWORD));
        assert!(NtHash::verify(b"password", &bsd).unwrap());
        assert_eq!(NtHash::from_string(&bsd).unwrap().ident(), BSD_IDENT);
        assert_eq!(
            NtHash::genconfig(&Settings::new().ident("$5$")),
            Err(Error::InvalidIdentifier {
                scheme: "nthash",
                ident: "$5$".into()
            })
        );
    }

    #[test]
    fn upper_case_accepted_lower_case_rendered() {
        let upper = PASSWORD.to_ascii_uppercase();
        assert!(NtHash::verify(b"password", &upper).unwrap());
        assert_eq!(NtHash::from_string(&upper).unwrap().to_string(), PASSWORD);
    }

    #[test]
    fn identify_needs_full_parse() {
        assert!(NtHash::identify(PASSWORD));
        assert!(NtHash::identify(&format!("$3$${}", PASSWORD)));
        assert!(!NtHash::identify("$1$abc$def"));
        assert!(!NtHash::identify(&PASSWORD[1..]));
        assert!(!NtHash::identify("$3$$"));
    }

    #[test]
    fn config_is_stub() {
        let config = NtHash::genconfig(&Settings::new()).unwrap().into_inner();
        assert_eq!(config, STUB);
        assert_eq!(
            NtHash::verify(b"password", &config),
            Err(Error::InvalidHash { scheme: "nthash" })
        );
        assert_eq!(NtHash::genhash(b"password", &config).unwrap().into_inner(), PASSWORD);
    }

    #[test]
    fn lmhash_reference_digests() {
        for (secret, hash) in [
            (&b"password"[..], "e52cac67419a9a224a3b108f3fa6cb6d"),
            (b"", "aad3b435b51404eeaad3b435b51404ee"),
            (b"OLDPASSWORD", "c9b81d939d6fd80cd408e6b105741864"),
            (b"PassWord1!", "e52cac67419a9a22ce171273f527391f"),
        ] {
            assert_eq!(
                LmHash::encrypt(secret, &Settings::new()).unwrap().into_inner(),
                hash
            );
            assert!(LmHash::verify(secret, hash).unwrap());
        }
    }

    #[test]
    fn lmhash_ignores_case_and_tail() {
        let hash = LmHash::encrypt(b"Test12345678901234", &Settings::new()).unwrap();
        assert_eq!(&*hash, "624aac413795cdc1daaca2bddd6ba750");
        assert!(LmHash::verify(b"TEST1234567890", &hash).unwrap());
        assert!(LmHash::verify(b"test1234567890xyz", &hash).unwrap());
        assert!(!LmHash::verify(b"test123456789", &hash).unwrap());
        assert!(LmHash::verify(b"PASSWORD", "E52CAC67419A9A224A3B108F3FA6CB6D").unwrap());
    }

    #[test]
    fn msdcc_reference_digests() {
        for (secret, user, hash) in [
            ("Asdf999", "sevans", "b1176c2587478785ec1037e5abc916d0"),
            ("ASDqwe123", "jdoe", "592cdfbc3f1ef77ae95c75f851e37166"),
            ("test1", "test1", "64cd29e36a8431a2b111378564a10631"),
        ] {
            let settings = Settings::new().user(user);
            assert_eq!(
                Msdcc::encrypt(secret.as_bytes(), &settings).unwrap().into_inner(),
                hash
            );
            assert!(Msdcc::verify_for(secret.as_bytes(), hash, user).unwrap());
        }
    }

    #[test]
    fn msdcc2_reference_digests() {
        for (secret, user, hash) in [
            ("test1", "test1", "607bbe89611e37446e736f7856515bf8"),
            ("qerwt", "Joe", "e09b38f84ab0be586b730baf61781e30"),
            ("12345", "Joe", "6432f517a900b3fc34ffe57f0f346e16"),
        ] {
            assert_eq!(hex_encode(&Msdcc2::raw(secret.as_bytes(), user).unwrap()), hash);
            assert!(Msdcc2::verify_for(secret.as_bytes(), hash, user).unwrap());
        }
    }

    #[test]
    fn user_name_is_case_insensitive_and_required() {
        let hash = "4c253e4b65c007a8cd683ea57bc43c76";
        assert!(Msdcc2::verify_for(b"password", hash, "ADMINISTRATOR").unwrap());
        assert!(!Msdcc2::verify_for(b"password", hash, "Admin").unwrap());
        assert_eq!(
            Msdcc2::verify(b"password", hash),
            Err(Error::MissingParameter {
                scheme: "msdcc2",
                field: Field::User
            })
        );
        assert_eq!(
            Msdcc::genhash_for(b"password", STUB, "Administrator")
                .unwrap()
                .into_inner(),
            "25fd08fa89795ed54207e6e8442a6ca0"
        );
        assert_eq!(
            NtHash::genconfig(&Settings::new().user("bob")),
            Err(Error::UnsupportedSetting {
                scheme: "nthash",
                field: Field::User
            })
        );
    }
}
