//! # Password hash handlers
//!
//! This crate parses, generates and verifies password hashes in a number of incompatible
//! on-disk formats. The centerpiece is the `$scram$` format, which stores one salted digest
//! per SCRAM mechanism (RFC 5802, RFC 7677) so a server can authenticate clients over any of
//! them without keeping the plaintext.
//!
//! Every scheme is a type implementing [`Handler`](trait.Handler.html):
//!
//! | type | format |
//! |------|--------|
//! | [`Scram`](struct.Scram.html) | `$scram$6400$<salt>$sha-1=...,sha-256=...` |
//! | [`DjangoPbkdf2Sha256`](type.DjangoPbkdf2Sha256.html) | `pbkdf2_sha256$10000$<salt>$<digest>` |
//! | [`DjangoPbkdf2Sha1`](type.DjangoPbkdf2Sha1.html) | `pbkdf2_sha1$10000$<salt>$<digest>` |
//! | [`DjangoSaltedSha1`](type.DjangoSaltedSha1.html) | `sha1$<salt>$<digest>` |
//! | [`DjangoSaltedMd5`](type.DjangoSaltedMd5.html) | `md5$<salt>$<digest>` |
//! | [`DjangoDisabled`](struct.DjangoDisabled.html) | `!` |
//! | [`LdapMd5`](type.LdapMd5.html) | `{MD5}<digest>` |
//! | [`LdapSha1`](type.LdapSha1.html) | `{SHA}<digest>` |
//! | [`LdapSaltedMd5`](type.LdapSaltedMd5.html) | `{SMD5}<digest and salt>` |
//! | [`LdapSaltedSha1`](type.LdapSaltedSha1.html) | `{SSHA}<digest and salt>` |
//! | [`LdapPlaintext`](struct.LdapPlaintext.html) | the password itself |
//! | [`LmHash`](struct.LmHash.html) | `<hex digest>` |
//! | [`NtHash`](struct.NtHash.html) | `<hex digest>` or `$3$$<hex digest>` |
//! | [`Msdcc`](type.Msdcc.html), [`Msdcc2`](type.Msdcc2.html) | `<hex digest>`, salted with the user name |
//!
//! # Usage
//!
//! Hashing a new password and checking it later needs two calls. Settings not given explicitly
//! fall back to the scheme's defaults, and salts are generated from the operating system's
//! random generator.
//!
//! ``` rust
//! use passhash::{DjangoPbkdf2Sha256, Handler, Settings};
//!
//! let hash = DjangoPbkdf2Sha256::encrypt(b"hunter2", &Settings::new()).unwrap();
//! assert_eq!(hash.len(), 77);
//!
//! assert!(DjangoPbkdf2Sha256::verify(b"hunter2", &hash).unwrap());
//! assert!(!DjangoPbkdf2Sha256::verify(b"hunter3", &hash).unwrap());
//! ```
//!
//! Settings are checked against the scheme's limits. By default a value that can be repaired
//! is repaired, and the repair is reported as an [`Advisory`](enum.Advisory.html) on the
//! result and through the `log` crate. With `strict(true)` the same value is an error.
//!
//! ``` rust
//! use passhash::{Advisory, Handler, Scram, Settings};
//!
//! let hash = Scram::encrypt(b"pencil", &Settings::new().rounds(0)).unwrap();
//! assert_eq!(
//!     hash.advisories(),
//!     &[Advisory::RoundsClamped { scheme: "scram", requested: 0, applied: 1 }]
//! );
//!
//! assert!(Scram::encrypt(b"pencil", &Settings::new().rounds(0).strict(true)).is_err());
//! ```
//!
//! # Features
//!
//! * `rustcrypto`: adds a PBKDF2 backend built on the RustCrypto crates, which also supports
//!   SHA-224. Backends are chosen per scheme with
//!   [`HasManyBackends::select_backend`](capability/trait.HasManyBackends.html).

#![warn(missing_docs)]

mod advisory;
pub mod capability;
pub mod crypto;
pub mod django;
mod error;
pub mod handler;
pub mod ldap;
pub mod mcf;
pub mod random;
pub mod scram;
pub mod utils;
pub mod windows;

pub use advisory::{Advised, Advisories, Advisory};
pub use capability::{HasManyBackends, Input};
pub use django::{
    DjangoDisabled, DjangoPbkdf2Sha1, DjangoPbkdf2Sha256, DjangoSaltedMd5, DjangoSaltedSha1,
};
pub use error::{Error, Field, Result};
pub use handler::{Descriptor, Handler, HasUserContext, Params, Settings};
pub use ldap::{LdapMd5, LdapPlaintext, LdapSaltedMd5, LdapSaltedSha1, LdapSha1};
pub use scram::Scram;
pub use windows::{LmHash, Msdcc, Msdcc2, NtHash};
