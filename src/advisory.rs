//! Non-fatal diagnostics raised when a lenient normalization repaired its input.

use std::fmt;
use std::ops::Deref;

use log::warn;

/// A repair applied to caller input, or a suspicious condition that didn't warrant an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// A salt longer than the scheme's maximum was cut down.
    SaltTruncated {
        /// Scheme name.
        scheme: &'static str,
        /// Size that was supplied or requested.
        from: usize,
        /// Size that was kept.
        to: usize,
    },
    /// A rounds value outside the scheme's bounds was clamped.
    RoundsClamped {
        /// Scheme name.
        scheme: &'static str,
        /// Value that was supplied.
        requested: u32,
        /// Value that was used.
        applied: u32,
    },
    /// Some digests of a multi-digest hash matched the secret and some didn't.
    InconsistentDigests {
        /// Scheme name.
        scheme: &'static str,
    },
}

impl fmt::Display for Advisory {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Advisory::SaltTruncated { scheme, from, to } => {
                write!(fmt, "{} salt truncated from {} to {} characters", scheme, from, to)
            }
            Advisory::RoundsClamped {
                scheme,
                requested,
                applied,
            } if requested < applied => {
                write!(fmt, "{} does not allow less than {} rounds: {}", scheme, applied, requested)
            }
            Advisory::RoundsClamped {
                scheme,
                requested,
                applied,
            } => {
                write!(fmt, "{} does not allow more than {} rounds: {}", scheme, applied, requested)
            }
            Advisory::InconsistentDigests { scheme } => {
                write!(fmt, "{} hash verified inconsistently, may be corrupted", scheme)
            }
        }
    }
}

/// Collects advisories while a hash instance is being built.
///
/// Every advisory is logged at `warn` level as it is recorded, so operators see them even when
/// the caller drops the returned list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Advisories(Vec<Advisory>);

impl Advisories {
    /// An empty collection.
    pub fn new() -> Self {
        Advisories(Vec::new())
    }

    /// Records and logs `advisory`.
    pub fn record(&mut self, advisory: Advisory) {
        warn!("{}", advisory);
        self.0.push(advisory);
    }

    /// The advisories recorded so far, oldest first.
    pub fn as_slice(&self) -> &[Advisory] {
        &self.0
    }

    /// Consumes the collection.
    pub fn into_vec(self) -> Vec<Advisory> {
        self.0
    }

    /// `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A successful result together with the advisories raised while producing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advised<T> {
    value: T,
    advisories: Vec<Advisory>,
}

impl<T> Advised<T> {
    /// Wraps `value` with the given advisories.
    pub fn new(value: T, advisories: Vec<Advisory>) -> Self {
        Advised { value, advisories }
    }

    /// Advisories raised while producing the value.
    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    /// Discards the advisories.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Splits into the value and its advisories.
    pub fn into_parts(self) -> (T, Vec<Advisory>) {
        (self.value, self.advisories)
    }
}

impl<T> Deref for Advised<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.value
    }
}
