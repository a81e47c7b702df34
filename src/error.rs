use std::fmt;

use thiserror::Error;

/// The error cases of every handler operation.
///
/// Errors carry the name of the scheme that raised them, so a caller juggling several handlers
/// can tell which one refused the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A setting required in strict mode was not supplied.
    #[error("{scheme}: no {field} specified")]
    MissingParameter {
        /// Scheme name.
        scheme: &'static str,
        /// The missing setting.
        field: Field,
    },
    /// The scheme doesn't accept the setting `Field`.
    #[error("{scheme} does not support the {field} setting")]
    UnsupportedSetting {
        /// Scheme name.
        scheme: &'static str,
        /// The rejected setting.
        field: Field,
    },
    /// The salt contains a character outside the scheme's alphabet.
    #[error("invalid character in {scheme} salt: {character:?}")]
    InvalidSalt {
        /// Scheme name.
        scheme: &'static str,
        /// First offending character.
        character: char,
    },
    /// The salt is shorter than the scheme allows.
    #[error("{scheme} salt must be at least {min} characters")]
    SaltTooShort {
        /// Scheme name.
        scheme: &'static str,
        /// Minimum salt size.
        min: usize,
    },
    /// The salt is longer than the scheme allows and strict checking is enabled.
    #[error("{scheme} salt must be at most {max} characters")]
    SaltTooLong {
        /// Scheme name.
        scheme: &'static str,
        /// Maximum salt size.
        max: usize,
    },
    /// The rounds are below the scheme's minimum and strict checking is enabled.
    #[error("{scheme} rounds must be >= {min}")]
    RoundsTooLow {
        /// Scheme name.
        scheme: &'static str,
        /// Minimum rounds.
        min: u32,
    },
    /// The rounds are above the scheme's maximum and strict checking is enabled.
    #[error("{scheme} rounds must be <= {max}")]
    RoundsTooHigh {
        /// Scheme name.
        scheme: &'static str,
        /// Maximum rounds.
        max: u32,
    },
    /// The identifier is neither a known prefix nor an alias of one.
    #[error("invalid {scheme} ident: {ident:?}")]
    InvalidIdentifier {
        /// Scheme name.
        scheme: &'static str,
        /// The rejected identifier.
        ident: String,
    },
    /// A scheme storing raw checksum bytes was handed text.
    #[error("{scheme} checksum must be specified as bytes")]
    ChecksumMustBeBytes {
        /// Scheme name.
        scheme: &'static str,
    },
    /// The hash string is structurally invalid for the scheme.
    #[error("malformed {scheme} hash ({reason})")]
    MalformedHash {
        /// Scheme name.
        scheme: &'static str,
        /// What was wrong.
        reason: &'static str,
    },
    /// The hash string belongs to some other scheme.
    #[error("not a valid {scheme} hash (wrong prefix)")]
    InvalidHashPrefix {
        /// Scheme name.
        scheme: &'static str,
    },
    /// `verify` couldn't parse the hash. Deliberately carries no detail.
    #[error("not a valid {scheme} hash")]
    InvalidHash {
        /// Scheme name.
        scheme: &'static str,
    },
    /// `verify` was called with an empty hash.
    #[error("no hash specified")]
    NoHashSupplied,
    /// The SCRAM hash holds no digest for the requested algorithm.
    #[error("scram hash has no digest for algorithm {0:?}")]
    AlgorithmNotPresent(String),
    /// The SCRAM algorithm list lacks `sha-1`.
    #[error("sha-1 must be in algorithm list of scram hash")]
    MissingRequiredAlgorithm,
    /// The active backend can't compute the digest algorithm.
    #[error("unsupported digest algorithm: {0:?}")]
    UnsupportedAlgorithm(String),
    /// None of the scheme's backends is usable on this build.
    #[error("no {scheme} backends available")]
    NoBackendAvailable {
        /// Scheme name.
        scheme: &'static str,
    },
    /// The requested backend is unknown or unavailable.
    #[error("{scheme} backend not available: {backend:?}")]
    InvalidBackend {
        /// Scheme name.
        scheme: &'static str,
        /// The requested backend name.
        backend: String,
    },
    /// The secret isn't usable by the scheme (e.g. not UTF-8 where text is required, or
    /// rejected by SASLprep).
    #[error("invalid secret: {0}")]
    InvalidSecret(&'static str),
}

/// The settings and hash fields errors refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Salt
    Salt,
    /// Salt size
    SaltSize,
    /// Rounds
    Rounds,
    /// Identifier prefix
    Ident,
    /// Checksum
    Checksum,
    /// SCRAM algorithm list
    Algorithms,
    /// Account name, for schemes salted with it
    User,
}

impl fmt::Display for Field {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            Field::Salt => "salt",
            Field::SaltSize => "salt_size",
            Field::Rounds => "rounds",
            Field::Ident => "ident",
            Field::Checksum => "checksum",
            Field::Algorithms => "algs",
            Field::User => "user",
        };
        fmt.write_str(name)
    }
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn malformed(scheme: &'static str, reason: &'static str) -> Self {
        Error::MalformedHash { scheme, reason }
    }
}
