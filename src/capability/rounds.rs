use crate::advisory::{Advisories, Advisory};
use crate::error::{Error, Field, Result};

/// How the rounds value scales the work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundsCost {
    /// Work grows with the value.
    Linear,
    /// Work grows with two to the power of the value.
    Log2,
}

/// Rounds constraints of a scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundsSpec {
    /// Smallest accepted value.
    pub min: u32,
    /// Largest accepted value, if bounded.
    pub max: Option<u32>,
    /// Value used when none is given.
    pub default: Option<u32>,
    /// Cost model, informational.
    pub cost: RoundsCost,
    /// Bound violations are always errors, even in lenient mode.
    pub strict_bounds: bool,
}

impl RoundsSpec {
    /// Validates `rounds`, substituting the default when absent and clamping out-of-range
    /// values unless `strict`.
    pub fn normalize_rounds(
        &self,
        scheme: &'static str,
        rounds: Option<u32>,
        strict: bool,
        advisories: &mut Advisories,
    ) -> Result<u32> {
        let rounds = match (rounds, self.default) {
            (Some(rounds), _) => rounds,
            (None, Some(default)) if !strict => return Ok(default),
            (None, _) => {
                return Err(Error::MissingParameter {
                    scheme,
                    field: Field::Rounds,
                })
            }
        };

        let strict = strict || self.strict_bounds;
        if rounds < self.min {
            if strict {
                return Err(Error::RoundsTooLow {
                    scheme,
                    min: self.min,
                });
            }
            advisories.record(Advisory::RoundsClamped {
                scheme,
                requested: rounds,
                applied: self.min,
            });
            return Ok(self.min);
        }

        match self.max {
            Some(max) if rounds > max => {
                if strict {
                    return Err(Error::RoundsTooHigh { scheme, max });
                }
                advisories.record(Advisory::RoundsClamped {
                    scheme,
                    requested: rounds,
                    applied: max,
                });
                Ok(max)
            }
            _ => Ok(rounds),
        }
    }
}
