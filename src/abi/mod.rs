//! Contract method interface
//!
//! Parses the JSON interface description produced by contract toolchains
//! (a build artifact with an `"abi"` array, or the bare array itself) into
//! a [`MethodInterface`]: callable methods keyed by name, each with typed
//! inputs and outputs.
//!
//! The interface is loaded once at startup and shared read-only.
//!
//! ## Supported types
//!
//! `address`, `bool`, `string`, `bytes`, `bytesN`, `uintN` (values up to
//! `u128`) and dynamic arrays of those. Other types parse as
//! [`ParamType::Unsupported`]; methods using them load fine but cannot be
//! called.

pub mod encoding;
pub mod types;

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use sha3::{Digest, Keccak256};

use crate::error::GatewayError;

pub use encoding::{decode_values, encode_values};
pub use types::{AbiError, AbiValue, Address, ParamType};

/// Keccak-256 digest.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// A named, typed parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub kind: ParamType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    Pure,
    View,
    NonPayable,
    Payable,
}

/// One callable contract method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub inputs: Vec<Param>,
    pub outputs: Vec<Param>,
    pub mutability: Mutability,
}

impl Method {
    /// Read-only methods are answered without a transaction.
    pub fn is_view(&self) -> bool {
        matches!(self.mutability, Mutability::Pure | Mutability::View)
    }

    /// Canonical signature, e.g. `createContestJson(string,string)`.
    pub fn signature(&self) -> String {
        let args: Vec<String> = self.inputs.iter().map(|p| p.kind.to_string()).collect();
        format!("{}({})", self.name, args.join(","))
    }

    /// First four bytes of the signature hash.
    pub fn selector(&self) -> [u8; 4] {
        let hash = keccak256(self.signature().as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    pub fn input_types(&self) -> Vec<ParamType> {
        self.inputs.iter().map(|p| p.kind.clone()).collect()
    }

    pub fn output_types(&self) -> Vec<ParamType> {
        self.outputs.iter().map(|p| p.kind.clone()).collect()
    }

    /// Selector followed by the encoded arguments.
    pub fn encode_call(&self, args: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
        let mut data = self.selector().to_vec();
        data.extend(encode_values(&self.input_types(), args)?);
        Ok(data)
    }

    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
        decode_values(&self.output_types(), data)
    }
}

/// Parsed method interface of one contract.
#[derive(Debug, Clone, Default)]
pub struct MethodInterface {
    methods: HashMap<String, Method>,
}

impl MethodInterface {
    /// Parse from JSON text. See [`load_interface`].
    pub fn from_json_str(json: &str) -> Result<Self, GatewayError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| GatewayError::InterfaceLoad(format!("invalid JSON: {}", e)))?;

        let entries = match &value {
            serde_json::Value::Object(map) => map
                .get("abi")
                .cloned()
                .ok_or_else(|| GatewayError::InterfaceLoad("missing \"abi\" field".into()))?,
            serde_json::Value::Array(_) => value.clone(),
            _ => {
                return Err(GatewayError::InterfaceLoad(
                    "expected an object with an \"abi\" field".into(),
                ))
            }
        };

        let raw: Vec<RawEntry> = serde_json::from_value(entries)
            .map_err(|e| GatewayError::InterfaceLoad(format!("invalid abi entry: {}", e)))?;

        let mut methods: HashMap<String, Method> = HashMap::new();
        for entry in raw.into_iter().filter(|e| e.kind == "function") {
            let method = entry.into_method();
            // Overloads keep the first declaration under the plain name.
            let mut key = method.name.clone();
            let mut n = 0;
            while methods.contains_key(&key) {
                key = format!("{}{}", method.name, n);
                n += 1;
            }
            methods.insert(key, method);
        }

        Ok(Self { methods })
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Parse a method interface from a reader.
pub fn load_interface<R: Read>(mut reader: R) -> Result<MethodInterface, GatewayError> {
    let mut json = String::new();
    reader
        .read_to_string(&mut json)
        .map_err(|e| GatewayError::InterfaceLoad(format!("unreadable source: {}", e)))?;
    MethodInterface::from_json_str(&json)
}

/// Parse a method interface from a file on disk.
pub fn load_interface_file<P: AsRef<Path>>(path: P) -> Result<MethodInterface, GatewayError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| {
        GatewayError::InterfaceLoad(format!("cannot open {}: {}", path.display(), e))
    })?;
    load_interface(std::io::BufReader::new(file))
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(rename = "type", default = "default_entry_type")]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    inputs: Vec<RawParam>,
    #[serde(default)]
    outputs: Vec<RawParam>,
    #[serde(rename = "stateMutability", default)]
    state_mutability: Option<String>,
    /// Pre-0.5 artifacts mark views with `constant`.
    #[serde(default)]
    constant: Option<bool>,
}

#[derive(Deserialize)]
struct RawParam {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

fn default_entry_type() -> String {
    "function".to_string()
}

impl RawEntry {
    fn into_method(self) -> Method {
        let mutability = match self.state_mutability.as_deref() {
            Some("pure") => Mutability::Pure,
            Some("view") => Mutability::View,
            Some("payable") => Mutability::Payable,
            Some(_) => Mutability::NonPayable,
            None if self.constant == Some(true) => Mutability::View,
            None => Mutability::NonPayable,
        };
        let convert = |params: Vec<RawParam>| {
            params
                .into_iter()
                .map(|p| Param {
                    name: p.name,
                    kind: ParamType::parse(&p.kind),
                })
                .collect()
        };
        Method {
            name: self.name,
            inputs: convert(self.inputs),
            outputs: convert(self.outputs),
            mutability,
        }
    }
}

/// Interface of the `ContentStorage` contract methods the record store uses.
pub const CONTENT_STORAGE_INTERFACE: &str = include_str!("../../contracts/ContentStorage.json");
