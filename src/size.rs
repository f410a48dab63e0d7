//! The `"<width>x<height>"` ad size token shared by every component.

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Pixel dimensions of a creative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdSize {
    pub width: u32,
    pub height: u32,
}

impl AdSize {
    /// Substituted whenever a size token cannot be parsed.
    pub const FALLBACK: AdSize = AdSize {
        width: 300,
        height: 250,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Parse a size token, substituting [`AdSize::FALLBACK`] on failure.
    ///
    /// Sizes are typed in by users, so anything from `"300"` to `"abcxdef"`
    /// can show up here.
    pub fn parse_or_default(token: &str) -> AdSize {
        Self::parse_or(token, Self::FALLBACK)
    }

    /// Like [`AdSize::parse_or_default`] with a caller-chosen fallback.
    pub fn parse_or(token: &str, fallback: AdSize) -> AdSize {
        match token.parse::<AdSize>() {
            Ok(size) => size,
            Err(_) => {
                log::debug!("unparseable ad size {:?}, using {}", token, fallback);
                fallback
            }
        }
    }
}

impl Default for AdSize {
    fn default() -> Self {
        Self::FALLBACK
    }
}

fn parse_dimension(part: &str) -> Option<u32> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse::<u32>().ok().filter(|v| *v > 0)
}

impl FromStr for AdSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (w, h) = s
            .split_once('x')
            .ok_or_else(|| Error::InvalidSize(s.to_string()))?;
        match (parse_dimension(w), parse_dimension(h)) {
            (Some(width), Some(height)) => Ok(AdSize { width, height }),
            _ => Err(Error::InvalidSize(s.to_string())),
        }
    }
}

impl fmt::Display for AdSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_tokens() {
        assert_eq!("300x250".parse::<AdSize>().unwrap(), AdSize::new(300, 250));
        assert_eq!("728x90".parse::<AdSize>().unwrap(), AdSize::new(728, 90));
        assert_eq!(AdSize::new(160, 600).to_string(), "160x600");
    }

    #[test]
    fn rejects_malformed_tokens() {
        for bad in [
            "abcxdef",
            "300",
            "",
            "x",
            "300x",
            "x250",
            "0x250",
            "300X250",
            " 300x250",
            "300x250x1",
            "-3x4",
            "+3x4",
        ] {
            assert!(bad.parse::<AdSize>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn falls_back_without_failing() {
        assert_eq!(AdSize::parse_or_default("abcxdef"), AdSize::FALLBACK);
        assert_eq!(AdSize::parse_or_default("300"), AdSize::new(300, 250));
        assert_eq!(AdSize::parse_or("nope", AdSize::new(1, 2)), AdSize::new(1, 2));
    }
}
