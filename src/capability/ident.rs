use crate::error::{Error, Field, Result};

/// Identifier prefixes a multi-identifier scheme accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentSpec {
    /// Identifier used when none is given.
    pub default: &'static str,
    /// Every accepted identifier.
    pub values: &'static [&'static str],
    /// Alternate spellings and the identifier each one stands for.
    pub aliases: &'static [(&'static str, &'static str)],
}

impl IdentSpec {
    /// Resolves `ident` to one of the accepted identifiers.
    pub fn normalize_ident(
        &self,
        scheme: &'static str,
        ident: Option<&str>,
        strict: bool,
    ) -> Result<&'static str> {
        let ident = match ident {
            Some(ident) => ident,
            None if strict => {
                return Err(Error::MissingParameter {
                    scheme,
                    field: Field::Ident,
                })
            }
            None => return Ok(self.default),
        };
        if let Some(&known) = self.values.iter().find(|&&known| known == ident) {
            return Ok(known);
        }
        self.aliases
            .iter()
            .find(|&&(alias, _)| alias == ident)
            .map(|&(_, target)| target)
            .filter(|target| self.values.contains(target))
            .ok_or_else(|| Error::InvalidIdentifier {
                scheme,
                ident: ident.to_owned(),
            })
    }

    /// The accepted identifier `hash` starts with. Longer identifiers are tried first, so the
    /// empty identifier only matches when nothing else does.
    pub fn match_prefix(&self, hash: &str) -> Option<&'static str> {
        let mut best: Option<&'static str> = None;
        for &ident in self.values {
            if hash.starts_with(ident) && best.map_or(true, |b| ident.len() > b.len()) {
                best = Some(ident);
            }
        }
        best
    }
}
