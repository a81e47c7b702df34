//! Parsers and renderers for `$`-separated modular-crypt style strings.
//!
//! `parse_mc2` handles `<prefix><salt>[$<checksum>]`; `parse_mc3` handles
//! `<prefix><rounds>$<salt>[$<checksum>]`. An empty checksum field reads as absent.

use crate::error::{Error, Result};

const SEP: char = '$';

fn strip<'a>(hash: &'a str, prefix: &str, scheme: &'static str) -> Result<&'a str> {
    if hash.is_empty() {
        return Err(Error::malformed(scheme, "empty hash"));
    }
    hash.strip_prefix(prefix)
        .ok_or(Error::InvalidHashPrefix { scheme })
}

fn non_empty(field: &str) -> Option<&str> {
    if field.is_empty() {
        None
    } else {
        Some(field)
    }
}

/// Splits a two-field hash into salt and optional checksum.
pub fn parse_mc2<'a>(
    hash: &'a str,
    prefix: &str,
    scheme: &'static str,
) -> Result<(&'a str, Option<&'a str>)> {
    let rest = strip(hash, prefix, scheme)?;
    let mut parts = rest.split(SEP);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(salt), None, None) => Ok((salt, None)),
        (Some(salt), Some(checksum), None) => Ok((salt, non_empty(checksum))),
        _ => Err(Error::malformed(scheme, "wrong number of fields")),
    }
}

/// Splits a three-field hash into rounds, salt, and optional checksum.
///
/// Rounds must be written canonically: decimal digits only, no leading zero unless the value
/// is `0`.
pub fn parse_mc3<'a>(
    hash: &'a str,
    prefix: &str,
    scheme: &'static str,
) -> Result<(u32, &'a str, Option<&'a str>)> {
    let rest = strip(hash, prefix, scheme)?;
    let mut parts = rest.split(SEP);
    let (rounds, salt, checksum) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(rounds), Some(salt), None, None) => (rounds, salt, None),
        (Some(rounds), Some(salt), Some(checksum), None) => (rounds, salt, non_empty(checksum)),
        _ => return Err(Error::malformed(scheme, "wrong number of fields")),
    };
    Ok((parse_rounds(rounds, scheme)?, salt, checksum))
}

/// Parses a canonical decimal rounds field.
pub(crate) fn parse_rounds(rounds: &str, scheme: &'static str) -> Result<u32> {
    if rounds.is_empty() {
        return Err(Error::malformed(scheme, "empty rounds field"));
    }
    if !rounds.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::malformed(scheme, "rounds field is not a number"));
    }
    if rounds.len() > 1 && rounds.starts_with('0') {
        return Err(Error::malformed(scheme, "zero-padded rounds field"));
    }
    rounds
        .parse()
        .map_err(|_| Error::malformed(scheme, "rounds field out of range"))
}

/// Renders `<prefix><salt>[$<checksum>]`.
pub fn render_mc2(prefix: &str, salt: &str, checksum: Option<&str>) -> String {
    match checksum {
        Some(checksum) => format!("{}{}{}{}", prefix, salt, SEP, checksum),
        None => format!("{}{}", prefix, salt),
    }
}

/// Renders `<prefix><rounds>$<salt>[$<checksum>]`.
pub fn render_mc3(prefix: &str, rounds: u32, salt: &str, checksum: Option<&str>) -> String {
    match checksum {
        Some(checksum) => format!("{}{}{}{}{}{}", prefix, rounds, SEP, salt, SEP, checksum),
        None => format!("{}{}{}{}", prefix, rounds, SEP, salt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mc2_fields() {
        assert_eq!(parse_mc2("sha1$abc$0f", "sha1$", "t"), Ok(("abc", Some("0f"))));
        assert_eq!(parse_mc2("sha1$abc$", "sha1$", "t"), Ok(("abc", None)));
        assert_eq!(parse_mc2("sha1$abc", "sha1$", "t"), Ok(("abc", None)));
        assert_eq!(parse_mc2("sha1$", "sha1$", "t"), Ok(("", None)));
        assert_eq!(
            parse_mc2("sha1$a$b$c", "sha1$", "t"),
            Err(Error::malformed("t", "wrong number of fields"))
        );
    }

    #[test]
    fn prefix_and_empty_input() {
        assert_eq!(
            parse_mc2("md5$abc$0f", "sha1$", "t"),
            Err(Error::InvalidHashPrefix { scheme: "t" })
        );
        assert_eq!(
            parse_mc3("", "x$", "t"),
            Err(Error::malformed("t", "empty hash"))
        );
    }

    #[test]
    fn mc3_fields() {
        assert_eq!(parse_mc3("x$5000$salt$chk", "x$", "t"), Ok((5000, "salt", Some("chk"))));
        assert_eq!(parse_mc3("x$0$salt", "x$", "t"), Ok((0, "salt", None)));
        assert!(parse_mc3("x$5000", "x$", "t").is_err());
        assert!(parse_mc3("x$1$2$3$4", "x$", "t").is_err());
    }

    #[test]
    fn mc3_rounds_must_be_canonical() {
        assert_eq!(
            parse_mc3("x$05000$salt$chk", "x$", "t"),
            Err(Error::malformed("t", "zero-padded rounds field"))
        );
        assert!(parse_mc3("x$$salt$chk", "x$", "t").is_err());
        assert!(parse_mc3("x$+5$salt$chk", "x$", "t").is_err());
        assert!(parse_mc3("x$4294967296$salt$chk", "x$", "t").is_err());
        assert_eq!(
            parse_mc3("x$4294967295$s", "x$", "t"),
            Ok((u32::MAX, "s", None))
        );
    }

    #[test]
    fn render_inverts_parse() {
        assert_eq!(render_mc2("sha1$", "abc", Some("0f")), "sha1$abc$0f");
        assert_eq!(render_mc2("sha1$", "abc", None), "sha1$abc");
        assert_eq!(render_mc3("x$", 7, "s", Some("c")), "x$7$s$c");
        assert_eq!(render_mc3("x$", 7, "s", None), "x$7$s");
    }
}
