//! Parameter types, typed values and addresses

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::keccak256;

/// Errors from the ABI wire codec and value checks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("expected {expected} values, got {got}")]
    ArityMismatch { expected: usize, got: usize },

    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("unsupported parameter type: {0}")]
    UnsupportedType(String),

    #[error("data too short: need {needed} bytes at offset {offset}, have {available}")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("value out of range for {0}")]
    Overflow(String),

    #[error("invalid UTF-8 in string value")]
    InvalidUtf8,

    #[error("invalid boolean encoding")]
    InvalidBool,

    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// A 20-byte account or contract address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Mixed-case checksummed hex (EIP-55).
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let byte = hash[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl FromStr for Address {
    type Err = AbiError;

    /// Accepts 40 hex characters with an optional `0x` prefix. Checksum
    /// casing is not enforced.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.len() != 40 {
            return Err(AbiError::InvalidAddress(format!(
                "expected 40 hex characters, got {}",
                digits.len()
            )));
        }
        let mut out = [0u8; 20];
        hex::decode_to_slice(digits, &mut out)
            .map_err(|e| AbiError::InvalidAddress(e.to_string()))?;
        Ok(Address(out))
    }
}

/// Parameter type from a method interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Address,
    Bool,
    String,
    Bytes,
    FixedBytes(usize),
    /// Unsigned integer of the given bit width. Values travel as `u128`.
    Uint(usize),
    Array(Box<ParamType>),
    /// Declared in the interface but not callable through this codec.
    Unsupported(String),
}

impl ParamType {
    pub fn parse(raw: &str) -> ParamType {
        let raw = raw.trim();
        if let Some(inner) = raw.strip_suffix("[]") {
            return match ParamType::parse(inner) {
                ParamType::Unsupported(_) => ParamType::Unsupported(raw.to_string()),
                inner => ParamType::Array(Box::new(inner)),
            };
        }
        match raw {
            "address" => ParamType::Address,
            "bool" => ParamType::Bool,
            "string" => ParamType::String,
            "bytes" => ParamType::Bytes,
            "uint" => ParamType::Uint(256),
            _ => {
                if let Some(bits) = raw.strip_prefix("uint").and_then(|b| b.parse::<usize>().ok()) {
                    if bits > 0 && bits <= 256 && bits % 8 == 0 {
                        return ParamType::Uint(bits);
                    }
                }
                if let Some(n) = raw.strip_prefix("bytes").and_then(|b| b.parse::<usize>().ok()) {
                    if (1..=32).contains(&n) {
                        return ParamType::FixedBytes(n);
                    }
                }
                ParamType::Unsupported(raw.to_string())
            }
        }
    }

    /// Encoded out of line, behind an offset in the head.
    pub fn is_dynamic(&self) -> bool {
        matches!(
            self,
            ParamType::String | ParamType::Bytes | ParamType::Array(_)
        )
    }

    /// True if `value` can be encoded as this type.
    pub fn matches(&self, value: &AbiValue) -> bool {
        match (self, value) {
            (ParamType::Address, AbiValue::Address(_)) => true,
            (ParamType::Bool, AbiValue::Bool(_)) => true,
            (ParamType::String, AbiValue::String(_)) => true,
            (ParamType::Bytes, AbiValue::Bytes(_)) => true,
            (ParamType::FixedBytes(n), AbiValue::FixedBytes(b)) => b.len() == *n,
            (ParamType::Uint(bits), AbiValue::Uint(v)) => *bits >= 128 || (*v >> *bits) == 0,
            (ParamType::Array(inner), AbiValue::Array(items)) => {
                items.iter().all(|item| inner.matches(item))
            }
            _ => false,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Address => f.write_str("address"),
            ParamType::Bool => f.write_str("bool"),
            ParamType::String => f.write_str("string"),
            ParamType::Bytes => f.write_str("bytes"),
            ParamType::FixedBytes(n) => write!(f, "bytes{}", n),
            ParamType::Uint(bits) => write!(f, "uint{}", bits),
            ParamType::Array(inner) => write!(f, "{}[]", inner),
            ParamType::Unsupported(raw) => f.write_str(raw),
        }
    }
}

/// A typed argument or return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Address(Address),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    FixedBytes(Vec<u8>),
    Uint(u128),
    Array(Vec<AbiValue>),
}

impl AbiValue {
    pub fn type_name(&self) -> String {
        match self {
            AbiValue::Address(_) => "address".into(),
            AbiValue::Bool(_) => "bool".into(),
            AbiValue::String(_) => "string".into(),
            AbiValue::Bytes(_) => "bytes".into(),
            AbiValue::FixedBytes(b) => format!("bytes{}", b.len()),
            AbiValue::Uint(_) => "uint".into(),
            AbiValue::Array(items) => match items.first() {
                Some(first) => format!("{}[]", first.type_name()),
                None => "[]".into(),
            },
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AbiValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for AbiValue {
    fn from(s: &str) -> Self {
        AbiValue::String(s.to_string())
    }
}

impl From<String> for AbiValue {
    fn from(s: String) -> Self {
        AbiValue::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_types() {
        assert_eq!(ParamType::parse("uint256"), ParamType::Uint(256));
        assert_eq!(ParamType::parse("uint"), ParamType::Uint(256));
        assert_eq!(ParamType::parse("bytes32"), ParamType::FixedBytes(32));
        assert_eq!(
            ParamType::parse("string[]"),
            ParamType::Array(Box::new(ParamType::String))
        );
        assert!(matches!(ParamType::parse("tuple"), ParamType::Unsupported(_)));
        assert!(matches!(ParamType::parse("tuple[]"), ParamType::Unsupported(_)));
        assert!(matches!(ParamType::parse("uint7"), ParamType::Unsupported(_)));
    }

    #[test]
    fn address_checksum_matches_known_vector() {
        let addr: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap();
        assert_eq!(addr.to_string(), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    }

    #[test]
    fn address_rejects_wrong_length() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!("zz".repeat(20).parse::<Address>().is_err());
    }

    #[test]
    fn narrow_uint_rejects_wide_value() {
        assert!(ParamType::Uint(8).matches(&AbiValue::Uint(255)));
        assert!(!ParamType::Uint(8).matches(&AbiValue::Uint(256)));
        assert!(ParamType::Uint(256).matches(&AbiValue::Uint(u128::MAX)));
    }
}
