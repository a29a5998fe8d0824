use crate::CoreError;
use sha2::{Digest, Sha512_256};
use std::fmt;
use std::str::FromStr;

const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
const PUBLIC_KEY_LEN: usize = 32;
const CHECKSUM_LEN: usize = 4;
const ADDRESS_LEN: usize = 58;

/// An account address: a 32-byte public key rendered as checksummed base32.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; PUBLIC_KEY_LEN]);

impl Address {
    #[must_use]
    pub fn from_public_key(public_key: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self(public_key)
    }

    #[must_use]
    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    fn checksum(public_key: &[u8]) -> [u8; CHECKSUM_LEN] {
        let digest = Sha512_256::digest(public_key);
        let mut out = [0u8; CHECKSUM_LEN];
        out.copy_from_slice(&digest[digest.len() - CHECKSUM_LEN..]);
        out
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CoreError::InvalidAddress {
            address: s.to_string(),
            reason: reason.to_string(),
        };

        if s.len() != ADDRESS_LEN {
            return Err(invalid("wrong length"));
        }

        let bytes = base32_decode(s).ok_or_else(|| invalid("not valid base32"))?;
        if bytes.len() != PUBLIC_KEY_LEN + CHECKSUM_LEN {
            return Err(invalid("wrong decoded length"));
        }

        let (key, checksum) = bytes.split_at(PUBLIC_KEY_LEN);
        if Self::checksum(key) != checksum {
            return Err(invalid("checksum mismatch"));
        }

        let mut public_key = [0u8; PUBLIC_KEY_LEN];
        public_key.copy_from_slice(key);
        Ok(Self(public_key))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bytes = Vec::with_capacity(PUBLIC_KEY_LEN + CHECKSUM_LEN);
        bytes.extend_from_slice(&self.0);
        bytes.extend_from_slice(&Self::checksum(&self.0));
        f.write_str(&base32_encode(&bytes))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

/// Decode every watch-list entry, reporting all malformed entries together.
///
/// # Errors
/// Returns `CoreError::InvalidWatchList` listing each address that failed.
pub fn validate_watch_list<S: AsRef<str>>(entries: &[S]) -> Result<Vec<Address>, CoreError> {
    let mut addresses = Vec::with_capacity(entries.len());
    let mut failures = Vec::new();

    for entry in entries {
        match entry.as_ref().trim().parse::<Address>() {
            Ok(address) => addresses.push(address),
            Err(e) => failures.push(e),
        }
    }

    if failures.is_empty() {
        Ok(addresses)
    } else {
        Err(CoreError::InvalidWatchList(failures))
    }
}

// Unpadded RFC 4648 base32. Trailing bits must be zero.
fn base32_decode(input: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;

    for c in input.bytes() {
        let value = ALPHABET.iter().position(|&a| a == c)?;
        buffer = (buffer << 5) | u32::try_from(value).ok()?;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(u8::try_from((buffer >> bits) & 0xff).ok()?);
        }
    }

    if buffer & ((1 << bits) - 1) != 0 {
        return None;
    }
    Some(out)
}

fn base32_encode(input: &[u8]) -> String {
    let mut out = String::with_capacity(input.len().div_ceil(5) * 8);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;

    for &byte in input {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(char::from(ALPHABET[((buffer >> bits) & 0x1f) as usize]));
        }
    }
    if bits > 0 {
        out.push(char::from(ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO_ADDRESS: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ";
    const SEQUENTIAL_ADDRESS: &str = "AAAQEAYEAUDAOCAJBIFQYDIOB4IBCEQTCQKRMFYYDENBWHA5DYP7MUPJQE";

    #[test]
    fn test_zero_address() {
        let address: Address = ZERO_ADDRESS.parse().unwrap();
        assert_eq!(address.public_key(), &[0u8; 32]);
        assert_eq!(address.to_string(), ZERO_ADDRESS);
    }

    #[test]
    fn test_encode_matches_known_address() {
        let mut key = [0u8; 32];
        for (i, b) in key.iter_mut().enumerate() {
            *b = u8::try_from(i).unwrap();
        }
        let address = Address::from_public_key(key);
        assert_eq!(address.to_string(), SEQUENTIAL_ADDRESS);
        assert_eq!(SEQUENTIAL_ADDRESS.parse::<Address>().unwrap(), address);
    }

    #[test]
    fn test_bad_checksum_rejected() {
        let tampered = format!("{}AAAAAA", &ZERO_ADDRESS[..52]);
        let err = tampered.parse::<Address>().unwrap_err();
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn test_wrong_length_and_alphabet_rejected() {
        assert!("ABC".parse::<Address>().is_err());
        let lower = ZERO_ADDRESS.to_lowercase();
        assert!(lower.parse::<Address>().is_err());
    }

    #[test]
    fn test_watch_list_collects_all_failures() {
        let entries = ["bogus", ZERO_ADDRESS, "also-bogus"];
        let Err(CoreError::InvalidWatchList(failures)) = validate_watch_list(&entries) else {
            panic!("expected watch list failure");
        };
        assert_eq!(failures.len(), 2);

        let ok = validate_watch_list(&[ZERO_ADDRESS, SEQUENTIAL_ADDRESS]).unwrap();
        assert_eq!(ok.len(), 2);
    }
}
