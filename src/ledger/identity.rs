//! Signing identity and transactor
//!
//! An [`Identity`] wraps the secp256k1 key that signs submissions and
//! derives its address. A [`Transactor`] pairs an identity with the chain id
//! it signs for and produces raw legacy (EIP-155) transactions.

use std::fmt;
use std::sync::Arc;

use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;

use super::rlp;
use crate::abi::{keccak256, Address};
use crate::error::LedgerError;

/// Placeholder value shipped in example environment files.
pub const PLACEHOLDER_PRIVATE_KEY: &str = "your_private_key_here";

/// The key that signs state-changing calls.
pub struct Identity {
    key: SigningKey,
    address: Address,
}

impl Identity {
    /// Parse a hex private key, with or without `0x`.
    pub fn from_hex(private_key: &str) -> Result<Self, LedgerError> {
        let trimmed = private_key.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(digits)
            .map_err(|e| LedgerError::Signing(format!("private key is not hex: {}", e)))?;
        let key = SigningKey::from_slice(&bytes)
            .map_err(|_| LedgerError::Signing("private key is not a valid secp256k1 scalar".into()))?;
        Ok(Self::from_key(key))
    }

    /// Fresh throwaway identity, for simulated runs.
    pub fn random() -> Self {
        loop {
            let mut bytes = [0u8; 32];
            OsRng.fill_bytes(&mut bytes);
            if let Ok(key) = SigningKey::from_slice(&bytes) {
                return Self::from_key(key);
            }
        }
    }

    fn from_key(key: SigningKey) -> Self {
        let point = key.verifying_key().to_encoded_point(false);
        // Uncompressed SEC1: 0x04 || X || Y. The address hashes X || Y.
        let hash = keccak256(&point.as_bytes()[1..]);
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&hash[12..]);
        Self {
            key,
            address: Address(addr),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte digest. Returns `(r, s, recovery id)`.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<([u8; 32], [u8; 32], u8), LedgerError> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(digest)
            .map_err(|e| LedgerError::Signing(e.to_string()))?;
        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Ok((r, s, recovery_id.to_byte()))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Fields of a legacy transaction before signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: Address,
    pub value: u128,
    pub data: Vec<u8>,
}

impl LegacyTransaction {
    fn base_fields(&self) -> Vec<Vec<u8>> {
        vec![
            rlp::encode_uint(self.nonce as u128),
            rlp::encode_uint(self.gas_price),
            rlp::encode_uint(self.gas_limit as u128),
            rlp::encode_bytes(self.to.as_bytes()),
            rlp::encode_uint(self.value),
            rlp::encode_bytes(&self.data),
        ]
    }

    /// Digest signed under EIP-155.
    pub fn signing_hash(&self, chain_id: u64) -> [u8; 32] {
        let mut fields = self.base_fields();
        fields.push(rlp::encode_uint(chain_id as u128));
        fields.push(rlp::encode_uint(0));
        fields.push(rlp::encode_uint(0));
        keccak256(&rlp::encode_list(&fields))
    }
}

/// Identity plus the chain id it signs for.
#[derive(Debug, Clone)]
pub struct Transactor {
    identity: Arc<Identity>,
    chain_id: u64,
}

impl Transactor {
    pub fn new(identity: Arc<Identity>, chain_id: u64) -> Result<Self, LedgerError> {
        if chain_id == 0 {
            return Err(LedgerError::Signing("chain id must be non-zero".into()));
        }
        // v = chain_id * 2 + 36 must fit the signature scalar.
        if chain_id > (u64::MAX - 36) / 2 {
            return Err(LedgerError::Signing(format!("chain id {} out of range", chain_id)));
        }
        Ok(Self { identity, chain_id })
    }

    pub fn from(&self) -> Address {
        self.identity.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Sign and serialize a transaction ready for broadcast.
    pub fn sign(&self, tx: &LegacyTransaction) -> Result<Vec<u8>, LedgerError> {
        let digest = tx.signing_hash(self.chain_id);
        let (r, s, recovery_id) = self.identity.sign_digest(&digest)?;
        let v = self.chain_id as u128 * 2 + 35 + recovery_id as u128;

        let mut fields = tx.base_fields();
        fields.push(rlp::encode_uint(v));
        fields.push(rlp::encode_bytes(rlp::trim_leading_zeros(&r)));
        fields.push(rlp::encode_bytes(rlp::trim_leading_zeros(&s)));
        Ok(rlp::encode_list(&fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known development key (first account of the default test mnemonic).
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn derives_address_from_private_key() {
        let identity = Identity::from_hex(DEV_KEY).unwrap();
        assert_eq!(identity.address().to_string(), DEV_ADDRESS);

        let bare = Identity::from_hex(DEV_KEY.trim_start_matches("0x")).unwrap();
        assert_eq!(bare.address(), identity.address());
    }

    #[test]
    fn rejects_bad_keys() {
        assert!(Identity::from_hex(PLACEHOLDER_PRIVATE_KEY).is_err());
        assert!(Identity::from_hex("0x1234").is_err());
        assert!(Identity::from_hex(&"00".repeat(32)).is_err());
    }

    #[test]
    fn debug_does_not_leak_key() {
        let identity = Identity::from_hex(DEV_KEY).unwrap();
        let printed = format!("{:?}", identity);
        assert!(!printed.contains("ac0974bec3"));
    }

    #[test]
    fn transactor_rejects_zero_chain_id() {
        let identity = Arc::new(Identity::random());
        assert!(Transactor::new(identity.clone(), 0).is_err());
        assert!(Transactor::new(identity, 80001).is_ok());
    }

    #[test]
    fn signed_transaction_is_an_rlp_list() {
        let transactor = Transactor::new(Arc::new(Identity::from_hex(DEV_KEY).unwrap()), 1).unwrap();
        let tx = LegacyTransaction {
            nonce: 0,
            gas_price: 20_000_000_000,
            gas_limit: 21_000,
            to: "0x3535353535353535353535353535353535353535".parse().unwrap(),
            value: 0,
            data: vec![],
        };
        let raw = transactor.sign(&tx).unwrap();
        // Long list prefix: 0xf8 followed by one length byte.
        assert_eq!(raw[0], 0xf8);
        assert_eq!(raw[1] as usize, raw.len() - 2);
    }
}
