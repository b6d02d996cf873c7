//! Contract call wire format
//!
//! Standard head/tail layout: static values occupy one 32-byte word in the
//! head; dynamic values (`string`, `bytes`, `T[]`) put an offset in the head
//! and their length-prefixed body in the tail.

use super::types::{AbiError, AbiValue, Address, ParamType};

const WORD: usize = 32;

/// Encode values against their declared types.
pub fn encode_values(types: &[ParamType], values: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
    if types.len() != values.len() {
        return Err(AbiError::ArityMismatch {
            expected: types.len(),
            got: values.len(),
        });
    }

    let head_len = WORD * types.len();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for (ty, value) in types.iter().zip(values) {
        if let ParamType::Unsupported(raw) = ty {
            return Err(AbiError::UnsupportedType(raw.clone()));
        }
        if !ty.matches(value) {
            return Err(AbiError::TypeMismatch {
                expected: ty.to_string(),
                got: value.type_name(),
            });
        }
        if ty.is_dynamic() {
            head.extend_from_slice(&usize_word(head_len + tail.len()));
            tail.extend(encode_dynamic(ty, value)?);
        } else {
            head.extend_from_slice(&encode_static(value));
        }
    }

    head.extend(tail);
    Ok(head)
}

/// Decode values of the declared types from `data`.
pub fn decode_values(types: &[ParamType], data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
    let mut out = Vec::with_capacity(types.len());
    for (i, ty) in types.iter().enumerate() {
        let head_offset = i * WORD;
        let value = if ty.is_dynamic() {
            let offset = read_offset(data, head_offset)?;
            decode_dynamic(ty, data, offset)?
        } else {
            decode_static(ty, read_word(data, head_offset)?)?
        };
        out.push(value);
    }
    Ok(out)
}

fn encode_static(value: &AbiValue) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    match value {
        AbiValue::Address(addr) => word[12..].copy_from_slice(addr.as_bytes()),
        AbiValue::Bool(b) => word[31] = u8::from(*b),
        AbiValue::Uint(v) => word[16..].copy_from_slice(&v.to_be_bytes()),
        AbiValue::FixedBytes(bytes) => word[..bytes.len()].copy_from_slice(bytes),
        // Dynamic values never reach here; `matches` already paired type and value.
        AbiValue::String(_) | AbiValue::Bytes(_) | AbiValue::Array(_) => {}
    }
    word
}

fn encode_dynamic(ty: &ParamType, value: &AbiValue) -> Result<Vec<u8>, AbiError> {
    match (ty, value) {
        (ParamType::String, AbiValue::String(s)) => Ok(encode_bytes(s.as_bytes())),
        (ParamType::Bytes, AbiValue::Bytes(b)) => Ok(encode_bytes(b)),
        (ParamType::Array(inner), AbiValue::Array(items)) => {
            let mut out = usize_word(items.len()).to_vec();
            let types = vec![(**inner).clone(); items.len()];
            out.extend(encode_values(&types, items)?);
            Ok(out)
        }
        _ => Err(AbiError::TypeMismatch {
            expected: ty.to_string(),
            got: value.type_name(),
        }),
    }
}

fn encode_bytes(bytes: &[u8]) -> Vec<u8> {
    let padded = bytes.len().div_ceil(WORD) * WORD;
    let mut out = Vec::with_capacity(WORD + padded);
    out.extend_from_slice(&usize_word(bytes.len()));
    out.extend_from_slice(bytes);
    out.resize(WORD + padded, 0);
    out
}

fn usize_word(n: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[24..].copy_from_slice(&(n as u64).to_be_bytes());
    word
}

fn read_word(data: &[u8], offset: usize) -> Result<&[u8], AbiError> {
    read_slice(data, offset, WORD)
}

fn read_slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8], AbiError> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or(AbiError::OutOfBounds {
            offset,
            needed: len,
            available: data.len(),
        })
}

fn read_offset(data: &[u8], offset: usize) -> Result<usize, AbiError> {
    let word = read_word(data, offset)?;
    if word[..24].iter().any(|b| *b != 0) {
        return Err(AbiError::Overflow("offset".into()));
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&word[24..]);
    usize::try_from(u64::from_be_bytes(buf)).map_err(|_| AbiError::Overflow("offset".into()))
}

fn decode_static(ty: &ParamType, word: &[u8]) -> Result<AbiValue, AbiError> {
    match ty {
        ParamType::Address => {
            let mut addr = [0u8; 20];
            addr.copy_from_slice(&word[12..]);
            Ok(AbiValue::Address(Address(addr)))
        }
        ParamType::Bool => {
            if word[..31].iter().any(|b| *b != 0) || word[31] > 1 {
                return Err(AbiError::InvalidBool);
            }
            Ok(AbiValue::Bool(word[31] == 1))
        }
        ParamType::Uint(bits) => {
            if word[..16].iter().any(|b| *b != 0) {
                return Err(AbiError::Overflow(ty.to_string()));
            }
            let mut buf = [0u8; 16];
            buf.copy_from_slice(&word[16..]);
            let value = u128::from_be_bytes(buf);
            if *bits < 128 && (value >> *bits) != 0 {
                return Err(AbiError::Overflow(ty.to_string()));
            }
            Ok(AbiValue::Uint(value))
        }
        ParamType::FixedBytes(n) => Ok(AbiValue::FixedBytes(word[..*n].to_vec())),
        ParamType::Unsupported(raw) => Err(AbiError::UnsupportedType(raw.clone())),
        ParamType::String | ParamType::Bytes | ParamType::Array(_) => {
            Err(AbiError::UnsupportedType(ty.to_string()))
        }
    }
}

fn decode_dynamic(ty: &ParamType, data: &[u8], offset: usize) -> Result<AbiValue, AbiError> {
    let len = read_offset(data, offset)?;
    let body_start = offset + WORD;
    match ty {
        ParamType::String => {
            let bytes = read_slice(data, body_start, len)?;
            String::from_utf8(bytes.to_vec())
                .map(AbiValue::String)
                .map_err(|_| AbiError::InvalidUtf8)
        }
        ParamType::Bytes => Ok(AbiValue::Bytes(read_slice(data, body_start, len)?.to_vec())),
        ParamType::Array(inner) => {
            let body = data.get(body_start..).unwrap_or(&[]);
            // Every element needs at least one head word.
            if len.saturating_mul(WORD) > body.len() {
                return Err(AbiError::OutOfBounds {
                    offset: body_start,
                    needed: len.saturating_mul(WORD),
                    available: body.len(),
                });
            }
            let types = vec![(**inner).clone(); len];
            Ok(AbiValue::Array(decode_values(&types, body)?))
        }
        _ => Err(AbiError::UnsupportedType(ty.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_hex(data: &[u8], index: usize) -> String {
        hex::encode(&data[index * WORD..(index + 1) * WORD])
    }

    #[test]
    fn encodes_single_string_like_solidity() {
        let data = encode_values(&[ParamType::String], &["abc".into()]).unwrap();
        assert_eq!(data.len(), 3 * WORD);
        assert!(word_hex(&data, 0).ends_with("20"));
        assert!(word_hex(&data, 1).ends_with("03"));
        assert!(word_hex(&data, 2).starts_with("616263"));
    }

    #[test]
    fn decodes_mixed_tuple() {
        let owner: Address = "0x0000000000000000000000000000000000000abc".parse().unwrap();
        let types = vec![
            ParamType::String,
            ParamType::String,
            ParamType::Uint(256),
            ParamType::Uint(256),
            ParamType::Address,
            ParamType::Bool,
            ParamType::String,
        ];
        let values = vec![
            AbiValue::from("Summer"),
            AbiValue::from("A photography contest with a long description"),
            AbiValue::Uint(1_751_673_600),
            AbiValue::Uint(1_754_352_000),
            AbiValue::Address(owner),
            AbiValue::Bool(true),
            AbiValue::from(""),
        ];
        let data = encode_values(&types, &values).unwrap();
        assert_eq!(decode_values(&types, &data).unwrap(), values);
    }

    #[test]
    fn decodes_string_array() {
        let ty = vec![ParamType::Array(Box::new(ParamType::String))];
        let values = vec![AbiValue::Array(vec!["a".into(), "bb".into(), "ccc".into()])];
        let data = encode_values(&ty, &values).unwrap();
        assert_eq!(decode_values(&ty, &data).unwrap(), values);
    }

    #[test]
    fn rejects_wrong_arity_and_type() {
        assert!(matches!(
            encode_values(&[ParamType::String], &[]),
            Err(AbiError::ArityMismatch { .. })
        ));
        assert!(matches!(
            encode_values(&[ParamType::String], &[AbiValue::Bool(true)]),
            Err(AbiError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn truncated_data_is_an_error_not_a_panic() {
        let data = encode_values(&[ParamType::String], &["hello world".into()]).unwrap();
        let err = decode_values(&[ParamType::String], &data[..40]).unwrap_err();
        assert!(matches!(err, AbiError::OutOfBounds { .. }));

        let bogus_len = {
            let mut d = usize_word(WORD).to_vec();
            d.extend_from_slice(&usize_word(1_000_000));
            d
        };
        let arr = vec![ParamType::Array(Box::new(ParamType::String))];
        assert!(decode_values(&arr, &bogus_len).is_err());
    }

    #[test]
    fn oversized_uint_is_rejected() {
        let mut word = [0xffu8; WORD];
        word[0] = 0x01;
        assert!(matches!(
            decode_values(&[ParamType::Uint(256)], &word),
            Err(AbiError::Overflow(_))
        ));
    }
}
