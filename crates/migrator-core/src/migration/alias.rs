use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Symbolic reference to a target version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alias {
    /// Before every migration; reverts everything.
    First,
    /// The highest available version.
    Latest,
    /// The current version.
    Current,
    /// The available version immediately before the current one.
    Prev,
    /// The available version immediately after the current one.
    Next,
    /// Walk this many steps through the available versions from the current one.
    Offset(i64),
    /// A concrete version identifier.
    Explicit(String),
}

impl Alias {
    /// Parse an alias. Never fails; anything that is not a keyword or a
    /// well-formed `current+N` / `current-N` offset is taken as an explicit
    /// version and validated at resolution time.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed {
            "first" => Self::First,
            "latest" => Self::Latest,
            "current" => Self::Current,
            "prev" => Self::Prev,
            "next" => Self::Next,
            _ => parse_offset(trimmed).unwrap_or_else(|| Self::Explicit(trimmed.to_string())),
        }
    }
}

fn parse_offset(input: &str) -> Option<Alias> {
    let delta = input.strip_prefix("current")?.trim_start();
    let (sign, digits) = match delta.chars().next()? {
        '+' => (1, &delta[1..]),
        '-' => (-1, &delta[1..]),
        _ => return None,
    };
    let digits = digits.trim_start();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let steps: i64 = digits.parse().ok()?;
    Some(Alias::Offset(sign * steps))
}

impl FromStr for Alias {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => f.write_str("first"),
            Self::Latest => f.write_str("latest"),
            Self::Current => f.write_str("current"),
            Self::Prev => f.write_str("prev"),
            Self::Next => f.write_str("next"),
            Self::Offset(n) if *n >= 0 => write!(f, "current+{}", n),
            Self::Offset(n) => write!(f, "current{}", n),
            Self::Explicit(v) => f.write_str(v),
        }
    }
}
