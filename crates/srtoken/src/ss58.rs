//! SS58 address encoding
//!
//! `base58(prefix || public_key || checksum)` where the checksum is the first two
//! bytes of `blake2b-512("SS58PRE" || prefix || public_key)`. Prefixes below 64
//! take one byte; 64..=16383 take the two-byte form.

use blake2::{Blake2b512, Digest};

use crate::{Result, errors::TokenError};

const CHECKSUM_PREAMBLE: &[u8] = b"SS58PRE";
const CHECKSUM_LEN: usize = 2;
const PUBLIC_KEY_LEN: usize = 32;
const MAX_PREFIX: u16 = 16_383;

/// Encode a 32-byte public key as an SS58 address
pub fn encode(public_key: &[u8], prefix: u16) -> Result<String> {
    if public_key.len() != PUBLIC_KEY_LEN {
        return Err(TokenError::KeyDerivation {
            reason: format!(
                "SS58 public key must be {PUBLIC_KEY_LEN} bytes, got {}",
                public_key.len()
            ),
        });
    }

    let mut payload = prefix_bytes(prefix)?;
    payload.extend_from_slice(public_key);
    let hash = checksum(&payload);
    payload.extend_from_slice(&hash[..CHECKSUM_LEN]);
    Ok(bs58::encode(payload).into_string())
}

/// Decode an SS58 address into `(prefix, public_key)`
pub fn decode(address: &str) -> Result<(u16, Vec<u8>)> {
    let data = bs58::decode(address)
        .into_vec()
        .map_err(|e| TokenError::malformed(format!("address is not base58: {e}")))?;

    let (prefix, prefix_len) = match data.first() {
        Some(&first) if first < 64 => (u16::from(first), 1),
        Some(&first) if first < 128 => {
            let second = *data
                .get(1)
                .ok_or_else(|| TokenError::malformed("address truncated"))?;
            let lower = (first << 2) | (second >> 6);
            let upper = second & 0b0011_1111;
            (u16::from(lower) | (u16::from(upper) << 8), 2)
        }
        Some(_) => return Err(TokenError::malformed("reserved SS58 prefix")),
        None => return Err(TokenError::malformed("empty address")),
    };

    if data.len() != prefix_len + PUBLIC_KEY_LEN + CHECKSUM_LEN {
        return Err(TokenError::malformed(format!(
            "address has unexpected length {}",
            data.len()
        )));
    }

    let (body, check) = data.split_at(prefix_len + PUBLIC_KEY_LEN);
    if checksum(body)[..CHECKSUM_LEN] != *check {
        return Err(TokenError::malformed("address checksum mismatch"));
    }

    Ok((prefix, body[prefix_len..].to_vec()))
}

fn prefix_bytes(prefix: u16) -> Result<Vec<u8>> {
    match prefix {
        0..=63 => Ok(vec![prefix as u8]),
        64..=MAX_PREFIX => {
            let first = ((prefix & 0b0000_0000_1111_1100) as u8 >> 2) | 0b0100_0000;
            let second = ((prefix >> 8) as u8) | (((prefix & 0b0000_0000_0000_0011) as u8) << 6);
            Ok(vec![first, second])
        }
        _ => Err(TokenError::KeyDerivation {
            reason: format!("SS58 prefix {prefix} out of range"),
        }),
    }
}

fn checksum(payload: &[u8]) -> [u8; 64] {
    let mut hasher = Blake2b512::new();
    hasher.update(CHECKSUM_PREAMBLE);
    hasher.update(payload);
    hasher.finalize().into()
}
