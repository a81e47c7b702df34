//! Reusable building blocks a scheme composes into its behaviour.
//!
//! Each capability is a plain value describing the scheme's constraints, with the normalization
//! logic attached. A handler lists the capabilities it has in its
//! [`Descriptor`](../handler/struct.Descriptor.html) and calls them while building an instance.

mod backend;
mod checksum;
mod ident;
mod rounds;
mod salt;

pub use self::backend::{Backend, BackendSlot, HasManyBackends};
pub use self::checksum::{ChecksumSpec, EncodedChecksum, RawChecksum};
pub use self::ident::IdentSpec;
pub use self::rounds::{RoundsCost, RoundsSpec};
pub use self::salt::{SaltCharset, SaltSpec};
pub(crate) use self::salt::salt_text;

/// A caller-supplied value that may be given as text or as raw bytes.
///
/// Some fields accept either form. Others insist on one; a raw-checksum scheme rejects text
/// with [`ChecksumMustBeBytes`](../enum.Error.html#variant.ChecksumMustBeBytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    /// Text, encoded as UTF-8 wherever bytes are needed.
    Text(&'a str),
    /// Raw bytes.
    Bytes(&'a [u8]),
}

impl<'a> Input<'a> {
    /// The bytes of the value. Text yields its UTF-8 encoding.
    pub fn as_bytes(&self) -> &'a [u8] {
        match *self {
            Input::Text(text) => text.as_bytes(),
            Input::Bytes(bytes) => bytes,
        }
    }
}

impl<'a> From<&'a str> for Input<'a> {
    fn from(text: &'a str) -> Self {
        Input::Text(text)
    }
}

impl<'a> From<&'a String> for Input<'a> {
    fn from(text: &'a String) -> Self {
        Input::Text(text)
    }
}

impl<'a> From<&'a [u8]> for Input<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Input::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for Input<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Input::Bytes(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Input<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        Input::Bytes(bytes)
    }
}
