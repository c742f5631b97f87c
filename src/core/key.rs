// Copyright (c) 2026 Spring83
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Ed25519 keys that embed a magic suffix and an expiration month/year.
//!
//! A conforming key's last four bytes carry:
//! - `key[28] & 0x0F == MAGIC_NIBBLE`
//! - `key[29] == MAGIC_BYTE`
//! - `key[30]` decodes to an expiry month, `key[31]` to an expiry year
//!   (`2000 + 10*hi + lo`, both nibbles `<= 9`)

use ring::rand::{SecureRandom, SystemRandom};
use ring::signature::{Ed25519KeyPair, KeyPair, UnparsedPublicKey, ED25519};
use std::sync::{Arc, OnceLock};
use subtle::ConstantTimeEq;
use thiserror::Error;
use zeroize::Zeroize;

use crate::core::timestamp::Timestamp;

/// Low nibble of `key[28]` that marks a Spring-83 key.
pub const MAGIC_NIBBLE: u8 = 0x08;
/// `key[29]` value that marks a Spring-83 key.
pub const MAGIC_BYTE: u8 = 0x3E;

/// Reserved seed for the protocol's publicly-known test key. It is exempt
/// from the conforming-key requirement: callers match it by literal
/// equality against the request path, not by passing `is_valid`.
pub const TEST_KEY_SEED: [u8; 32] = [
    0x73, 0x70, 0x72, 0x69, 0x6e, 0x67, 0x38, 0x33, // "spring83"
    0x2d, 0x74, 0x65, 0x73, 0x74, 0x2d, 0x6b, 0x65, // "-test-ke"
    0x79, 0x2d, 0x72, 0x65, 0x73, 0x65, 0x72, 0x76, // "y-reserv"
    0x65, 0x64, 0x2d, 0x73, 0x65, 0x65, 0x64, 0x00, // "ed-seed\0"
];

/// Key-related failures: malformed hex, wrong length, or an undecodable
/// expiry month/year embedded in the key suffix.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum KeyError {
    /// Hex string was not valid hex, or decoded to the wrong byte length.
    #[error("invalid hex encoding")]
    InvalidHex,
    /// `key[30]` did not decode to a month in `1..=12`.
    #[error("invalid expiry month")]
    InvalidMonth,
    /// A nibble of `key[31]` exceeded 9.
    #[error("invalid expiry year nibble")]
    InvalidYearNibble,
}

/// The expiration month/year embedded in a conforming key's last two bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMonthYear {
    /// Expiry month, `1..=12`.
    pub month: u8,
    /// Expiry year, e.g. `2031`.
    pub year: u16,
}

impl KeyMonthYear {
    /// Decode from the last two bytes of a public key.
    pub fn decode(key: &[u8; 32]) -> Result<Self, KeyError> {
        let month = match key[30] {
            m @ 0x01..=0x09 => m,
            0x10 => 10,
            0x11 => 11,
            0x12 => 12,
            _ => return Err(KeyError::InvalidMonth),
        };

        let hi = key[31] >> 4;
        let lo = key[31] & 0x0F;
        if hi > 9 || lo > 9 {
            return Err(KeyError::InvalidYearNibble);
        }
        let year = 2000 + 10 * hi as u16 + lo as u16;

        Ok(Self { month, year })
    }

    /// Is this expiry valid relative to `now`? `(ey > ny) || (ey == ny &&
    /// em >= nm) || (ey == ny + 1) || (ey == ny + 2 && em <= nm)`.
    pub fn check_expiration_date(&self, now: (u8, u16)) -> bool {
        let (nm, ny) = now;
        let (em, ey) = (self.month, self.year);

        ey > ny
            || (ey == ny && em >= nm)
            || (ey == ny + 1)
            || (ey == ny + 2 && em <= nm)
    }
}

/// Is `key` conforming (carries the magic nibble/byte pair)?
pub fn is_conforming(key: &[u8; 32]) -> bool {
    key[28] & 0x0F == MAGIC_NIBBLE && key[29] == MAGIC_BYTE
}

/// Is `key` conforming AND valid relative to the current wall-clock month?
pub fn is_valid(key: &[u8; 32]) -> bool {
    if !is_conforming(key) {
        return false;
    }
    let now = Timestamp::now();
    match KeyMonthYear::decode(key) {
        Ok(kmy) => kmy.check_expiration_date((now.month(), now.year())),
        Err(_) => false,
    }
}

/// Decode a fixed-length hex string into exactly `N` bytes.
fn hex_fixed<const N: usize>(s: &str) -> Result<[u8; N], KeyError> {
    let v = hex::decode(s.trim()).map_err(|_| KeyError::InvalidHex)?;
    if v.len() != N {
        return Err(KeyError::InvalidHex);
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&v);
    Ok(out)
}

/// Decode a 64-hex-char Ed25519 secret seed.
pub fn secret_from_hex(s: &str) -> Result<[u8; 32], KeyError> {
    hex_fixed::<32>(s)
}

/// Decode a 64-hex-char Ed25519 public key.
pub fn public_from_hex(s: &str) -> Result<[u8; 32], KeyError> {
    hex_fixed::<32>(s)
}

/// Decode a 128-hex-char Ed25519 signature.
pub fn signature_from_hex(s: &str) -> Result<[u8; 64], KeyError> {
    hex_fixed::<64>(s)
}

/// Constant-time comparison of two public keys, used for the test-key match
/// and denylist membership so key comparisons don't leak timing.
pub fn keys_equal(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.ct_eq(b).into()
}

/// An Ed25519 keypair whose public half is a conforming Spring-83 key.
pub struct ConformingKeyPair {
    seed: [u8; 32],
    public: [u8; 32],
}

impl Drop for ConformingKeyPair {
    fn drop(&mut self) {
        self.seed.zeroize();
    }
}

impl ConformingKeyPair {
    /// Build directly from a 32-byte seed without checking conformance.
    /// Used for the server's reserved test key, which is exempt from the
    /// conforming-key requirement (it is matched by literal equality, not
    /// by passing `is_valid`).
    pub fn from_seed_unchecked(seed: [u8; 32]) -> Result<Self, KeyError> {
        let kp = Ed25519KeyPair::from_seed_unchecked(&seed).map_err(|_| KeyError::InvalidHex)?;
        let mut public = [0u8; 32];
        public.copy_from_slice(kp.public_key().as_ref());
        Ok(Self { seed, public })
    }

    /// Public key bytes.
    pub fn public(&self) -> &[u8; 32] {
        &self.public
    }

    /// Public key as lowercase hex.
    pub fn public_hex(&self) -> String {
        hex::encode(self.public)
    }

    /// Secret seed as lowercase hex.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.seed)
    }

    /// Sign `msg`, returning the 64-byte Ed25519 signature.
    pub fn sign(&self, msg: &[u8]) -> [u8; 64] {
        // `from_seed_unchecked` above already validated the seed once; a
        // fresh keypair is rebuilt here since `Ed25519KeyPair` isn't `Clone`
        // and we'd rather not carry ring's internal type across threads.
        let kp = Ed25519KeyPair::from_seed_unchecked(&self.seed).expect("seed validated at construction");
        let sig = kp.sign(msg);
        let mut out = [0u8; 64];
        out.copy_from_slice(sig.as_ref());
        out
    }
}

/// Derive the reserved test keypair from [`TEST_KEY_SEED`].
pub fn test_keypair() -> ConformingKeyPair {
    ConformingKeyPair::from_seed_unchecked(TEST_KEY_SEED).expect("TEST_KEY_SEED is a valid Ed25519 seed")
}

/// Verify an Ed25519 signature over `msg` under `pubkey`.
pub fn verify(pubkey: &[u8; 32], msg: &[u8], signature: &[u8; 64]) -> bool {
    UnparsedPublicKey::new(&ED25519, pubkey).verify(msg, signature).is_ok()
}

fn try_generate_one(rng: &SystemRandom) -> Option<ConformingKeyPair> {
    let mut seed = [0u8; 32];
    rng.fill(&mut seed).ok()?;
    let kp = ConformingKeyPair::from_seed_unchecked(seed).ok()?;
    if is_valid(kp.public()) {
        Some(kp)
    } else {
        None
    }
}

/// Search for a conforming keypair using `threads` worker threads racing to
/// find one. Coordination is a single `OnceLock`: every worker polls it each
/// iteration and the first to call `set` wins; losers observe it populated
/// and exit on their next check. No mutex is held across iterations.
pub fn generate_conforming(threads: usize) -> ConformingKeyPair {
    let winner: Arc<OnceLock<ConformingKeyPair>> = Arc::new(OnceLock::new());
    let threads = threads.max(1);

    std::thread::scope(|scope| {
        for _ in 0..threads {
            let winner = Arc::clone(&winner);
            scope.spawn(move || {
                let rng = SystemRandom::new();
                while winner.get().is_none() {
                    if let Some(candidate) = try_generate_one(&rng) {
                        let _ = winner.set(candidate);
                        return;
                    }
                }
            });
        }
    });

    Arc::try_unwrap(winner)
        .ok()
        .and_then(OnceLock::into_inner)
        .expect("a worker always finds a conforming key before the scope returns")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_with_suffix(month: u8, year_byte: u8) -> [u8; 32] {
        let mut k = [0u8; 32];
        k[28] = MAGIC_NIBBLE;
        k[29] = MAGIC_BYTE;
        k[30] = month;
        k[31] = year_byte;
        k
    }

    #[test]
    fn conforming_requires_both_magic_bytes() {
        let mut k = [0u8; 32];
        assert!(!is_conforming(&k));
        k[28] = MAGIC_NIBBLE;
        assert!(!is_conforming(&k));
        k[29] = MAGIC_BYTE;
        assert!(is_conforming(&k));
    }

    #[test]
    fn month_year_decode_rejects_bad_month() {
        let k = key_with_suffix(0x13, 0x25);
        assert_eq!(KeyMonthYear::decode(&k), Err(KeyError::InvalidMonth));
    }

    #[test]
    fn month_year_decode_rejects_bad_nibble() {
        let k = key_with_suffix(0x01, 0xAF);
        assert_eq!(KeyMonthYear::decode(&k), Err(KeyError::InvalidYearNibble));
    }

    #[test]
    fn month_year_decode_accepts_valid_suffix() {
        let k = key_with_suffix(0x11, 0x25);
        let kmy = KeyMonthYear::decode(&k).unwrap();
        assert_eq!(kmy.month, 11);
        assert_eq!(kmy.year, 2025);
    }

    #[test]
    fn expiration_window_matches_spec_formula() {
        let kmy = KeyMonthYear { month: 6, year: 2025 };
        assert!(kmy.check_expiration_date((1, 2024))); // ey > ny
        assert!(kmy.check_expiration_date((6, 2025))); // ey == ny, em >= nm
        assert!(!kmy.check_expiration_date((7, 2025))); // ey == ny, em < nm
        assert!(kmy.check_expiration_date((12, 2024))); // ey == ny + 1
        assert!(kmy.check_expiration_date((3, 2023))); // ey == ny + 2, em <= nm
        assert!(!kmy.check_expiration_date((9, 2023))); // ey == ny + 2, em > nm
        assert!(!kmy.check_expiration_date((1, 2023))); // more than two years out
    }

    #[test]
    fn hex_roundtrip() {
        let kp = ConformingKeyPair::from_seed_unchecked([7u8; 32]).unwrap();
        let pk = public_from_hex(&kp.public_hex()).unwrap();
        assert_eq!(&pk, kp.public());
        let sk = secret_from_hex(&kp.secret_hex()).unwrap();
        let kp2 = ConformingKeyPair::from_seed_unchecked(sk).unwrap();
        assert_eq!(kp2.public(), kp.public());
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let kp = ConformingKeyPair::from_seed_unchecked([3u8; 32]).unwrap();
        let sig = kp.sign(b"hello board");
        assert!(verify(kp.public(), b"hello board", &sig));
        assert!(!verify(kp.public(), b"tampered", &sig));
    }

    #[test]
    fn generate_conforming_finds_a_valid_key() {
        let kp = generate_conforming(2);
        assert!(is_valid(kp.public()));
    }

    #[test]
    fn test_keypair_is_deterministic() {
        let a = test_keypair();
        let b = test_keypair();
        assert_eq!(a.public(), b.public());
    }
}
