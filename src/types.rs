// 1.0: identifiers and time. every id is a validated newtype so a raw string
// never reaches the domain without passing its constructor.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("{kind} must not be empty")]
    Empty { kind: &'static str },

    #[error("{kind} must start with 0x, got {value:?}")]
    MissingPrefix { kind: &'static str, value: String },

    #[error("{kind} contains invalid character {ch:?} in {value:?}")]
    InvalidCharacter {
        kind: &'static str,
        value: String,
        ch: char,
    },

    #[error("{kind} is too long: {len} hex digits, max {max}")]
    TooLong {
        kind: &'static str,
        len: usize,
        max: usize,
    },
}

// 0x-prefixed body, checked with the given per-character predicate
fn validate_prefixed(
    kind: &'static str,
    value: &str,
    valid: impl Fn(char) -> bool,
) -> Result<(), IdError> {
    if value.is_empty() {
        return Err(IdError::Empty { kind });
    }
    let body = value
        .strip_prefix("0x")
        .ok_or_else(|| IdError::MissingPrefix {
            kind,
            value: value.to_string(),
        })?;
    if body.is_empty() {
        return Err(IdError::Empty { kind });
    }
    if let Some(ch) = body.chars().find(|c| !valid(*c)) {
        return Err(IdError::InvalidCharacter {
            kind,
            value: value.to_string(),
            ch,
        });
    }
    Ok(())
}

// 1.1: account address. 0x followed by at most 64 hex digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub const MAX_HEX_DIGITS: usize = 64;

    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        validate_prefixed("address", &value, |c| c.is_ascii_hexdigit())?;
        let len = value.len() - 2;
        if len > Self::MAX_HEX_DIGITS {
            return Err(IdError::TooLong {
                kind: "address",
                len,
                max: Self::MAX_HEX_DIGITS,
            });
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// 1.2: asset id. 0x followed by alphanumerics; indexers also hand out
// symbolic ids so hex is not required here.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetId(String);

impl AssetId {
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        validate_prefixed("asset id", &value, |c| c.is_ascii_alphanumeric())?;
        Ok(Self(value))
    }

    /// For compile-time constants known to be well formed.
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(IdError::Empty { kind: $kind });
                }
                Ok(Self(value))
            }

            pub fn new_unchecked(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }
    };
}

opaque_id!(
    /// Identifier of one market configuration record.
    MarketConfigId,
    "market config id"
);
opaque_id!(
    /// Identifier of one position revision (one row of a position's history).
    PositionRevisionId,
    "position revision id"
);

macro_rules! id_conversions {
    ($($name:ident),*) => {
        $(
            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl FromStr for $name {
                type Err = IdError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    Self::new(s)
                }
            }

            impl TryFrom<String> for $name {
                type Error = IdError;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    Self::new(value)
                }
            }

            impl From<$name> for String {
                fn from(id: $name) -> String {
                    id.0
                }
            }
        )*
    };
}

id_conversions!(Address, AssetId, MarketConfigId, PositionRevisionId);

// 1.3: millisecond timestamp of a position revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }
}
