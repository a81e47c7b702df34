//! Process-wide randomness for salts and generated passwords.
//!
//! The operating system generator is used whenever it works. If it can't be read, a `StdRng`
//! seeded by [`genseed`] takes over for the rest of the process; that generator lives behind
//! a mutex so concurrent callers serialize their draws.

use std::process;
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use log::warn;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use ring::digest::{digest, SHA256};

/// Characters used by [`generate_password`] unless told otherwise: alphanumerics without
/// the look-alikes `1IiLl0OoS5`.
pub const PASSWORD_CHARS: &str = "2346789ABCDEFGHJKMNPQRTUVWXYZabcdefghjkmnpqrstuvwxyz";

static OS_RNG_USABLE: OnceLock<bool> = OnceLock::new();
static FALLBACK_RNG: OnceLock<Mutex<StdRng>> = OnceLock::new();

fn os_rng_usable() -> bool {
    *OS_RNG_USABLE.get_or_init(|| {
        let mut first_byte = [0u8; 1];
        match OsRng.try_fill_bytes(&mut first_byte) {
            Ok(()) => true,
            Err(err) => {
                warn!("OS random generator unavailable ({}), using seeded fallback", err);
                false
            }
        }
    })
}

fn with_fallback_rng<T>(f: impl FnOnce(&mut dyn RngCore) -> T) -> T {
    let rng = FALLBACK_RNG.get_or_init(|| Mutex::new(StdRng::from_seed(genseed(None))));
    let mut guard = rng.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut *guard)
}

fn with_rng<T>(f: impl FnOnce(&mut dyn RngCore) -> T) -> T {
    if os_rng_usable() {
        f(&mut OsRng)
    } else {
        with_fallback_rng(f)
    }
}

/// Builds a 256 bit seed from whatever entropy the process can scrape together: the
/// optional caller-supplied `value`, the process id, the address of a fresh allocation, the
/// wall-clock time, and 16 bytes from the OS generator when it is readable.
pub fn genseed(value: Option<&[u8]>) -> [u8; 32] {
    let marker = Box::new(0u8);
    let address = &*marker as *const u8 as usize;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();
    let mut urandom = [0u8; 16];
    let urandom = match OsRng.try_fill_bytes(&mut urandom) {
        Ok(()) => Some(urandom),
        Err(_) => None,
    };
    let text = format!(
        "{:?} {} {:x} {:.15} {:?}",
        value,
        process::id(),
        address,
        now,
        urandom
    );

    let mut seed = [0u8; 32];
    seed.copy_from_slice(digest(&SHA256, text.as_bytes()).as_ref());
    seed
}

/// Returns `count` random bytes.
pub fn getrandbytes(count: usize) -> Vec<u8> {
    let mut buf = vec![0u8; count];
    with_rng(|rng| rng.fill_bytes(&mut buf));
    buf
}

/// Returns a string of `count` characters drawn uniformly from the ASCII `charset`.
///
/// # Panics
///
/// Panics if `charset` is empty while `count` is not zero.
pub fn getrandstr(charset: &str, count: usize) -> String {
    if count == 0 {
        return String::new();
    }
    assert!(!charset.is_empty(), "alphabet must not be empty");
    let letters = charset.as_bytes();
    let range = Uniform::from(0..letters.len());
    with_rng(|rng| {
        (0..count)
            .map(|_| char::from(letters[range.sample(&mut *rng)]))
            .collect()
    })
}

/// Generates a random password of `size` characters from `charset`, defaulting to
/// [`PASSWORD_CHARS`].
pub fn generate_password(size: usize, charset: Option<&str>) -> String {
    getrandstr(charset.unwrap_or(PASSWORD_CHARS), size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn randstr_stays_in_alphabet() {
        let s = getrandstr("ab", 200);
        assert_eq!(s.len(), 200);
        assert!(s.chars().all(|c| c == 'a' || c == 'b'));
        // 2^-199 chance of a false failure.
        assert!(s.contains('a') && s.contains('b'));
        assert_eq!(getrandstr("x", 3), "xxx");
        assert_eq!(getrandstr("", 0), "");
    }

    #[test]
    fn randbytes_have_requested_length() {
        assert_eq!(getrandbytes(0).len(), 0);
        assert_eq!(getrandbytes(1024).len(), 1024);
    }

    #[test]
    fn generated_passwords_avoid_lookalikes() {
        let pw = generate_password(64, None);
        assert_eq!(pw.len(), 64);
        assert!(!pw.chars().any(|c| "1IiLl0OoS5".contains(c)));
        assert_eq!(generate_password(4, Some("z")), "zzzz");
    }

    #[test]
    fn seeds_differ_between_calls() {
        assert_ne!(genseed(None), genseed(None));
        assert_ne!(genseed(Some(&b"state"[..])), genseed(Some(&b"state"[..])));
    }

    #[test]
    fn fallback_generator_is_usable() {
        let drawn = with_fallback_rng(|rng| rng.next_u64());
        let again = with_fallback_rng(|rng| rng.next_u64());
        assert_ne!(drawn, again);
    }
}
