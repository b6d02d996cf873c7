//! Record identifiers and placeholder transaction tags
//!
//! Identifiers are 16 bytes of OS entropy rendered as 32 lowercase hex
//! characters. Transaction tags are `0x` followed by 64 hex characters.
//! Tags minted here stand in for ledger hashes on paths that never reach
//! the ledger; they carry no meaning beyond uniqueness.

use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::warn;

/// Length in bytes of a record identifier before hex encoding.
pub const ID_BYTES: usize = 16;

/// Length in bytes of a transaction tag before hex encoding.
pub const TX_TAG_BYTES: usize = 32;

/// Generate a new record identifier.
pub fn new_id() -> String {
    new_id_from(&mut OsRng)
}

/// Generate a new placeholder transaction tag.
pub fn new_tx_tag() -> String {
    new_tx_tag_from(&mut OsRng)
}

/// Identifier from the given entropy source, with a timestamp fallback.
pub fn new_id_from<R: RngCore + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0u8; ID_BYTES];
    match rng.try_fill_bytes(&mut bytes) {
        Ok(()) => hex::encode(bytes),
        Err(e) => {
            let fallback = format!("content_{}", Utc::now().timestamp());
            warn!(error = %e, id = %fallback, "Entropy unavailable, using timestamp id");
            fallback
        }
    }
}

/// Transaction tag from the given entropy source, with an all-zero fallback.
pub fn new_tx_tag_from<R: RngCore + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0u8; TX_TAG_BYTES];
    match rng.try_fill_bytes(&mut bytes) {
        Ok(()) => format!("0x{}", hex::encode(bytes)),
        Err(e) => {
            warn!(error = %e, "Entropy unavailable, using zero transaction tag");
            format!("0x{}", "0".repeat(TX_TAG_BYTES * 2))
        }
    }
}

/// True if `s` has the shape of a generated identifier.
pub fn is_generated_id(s: &str) -> bool {
    s.len() == ID_BYTES * 2 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// True if `s` has the shape of a transaction tag.
pub fn is_tx_tag(s: &str) -> bool {
    s.strip_prefix("0x")
        .map(|h| h.len() == TX_TAG_BYTES * 2 && h.bytes().all(|b| b.is_ascii_hexdigit()))
        .unwrap_or(false)
}
