//! Keystream manager (§4.8): generates the XOR keystream for encrypted
//! traffic given an algorithm ID and key material. Three families are
//! supported, mirroring the three encryption schemes narrowband radios
//! actually ship: RC4 (commercial "basic privacy" algorithms on DMR/NXDN),
//! AES-OFB (P25 AES-256 and the TYT-enhanced 10-byte-IV DMR variant), and a
//! reversed 64-bit LFSR (P25 Phase 1 ADP/DES-OFB clones that use the legacy
//! P25 "DES-XL"-style keystream generator run backwards to align with how
//! receivers decode against a forward-running transmitter).

use aes::Aes256;
use cipher::{KeyInit, KeyIvInit, StreamCipher};
use ofb::Ofb;
use rc4::Rc4;

use crate::errors::{DvError, KeystreamError};

type Aes256Ofb = Ofb<Aes256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeystreamAlgorithm {
    Rc4 { drop_bytes: usize },
    Aes256Ofb,
    /// TYT's enhanced privacy profile: AES-256-OFB with a 10-byte IV instead
    /// of the standard 16-byte block-size IV, zero-padded to the block size.
    TytAes256Ofb,
    /// P25 Phase 1 ESS keystream, generated by the standard LFSR-64 run in
    /// reverse to match transmitter framing order.
    Lfsr64Reverse,
}

pub struct KeystreamManager;

impl KeystreamManager {
    /// Produces `len` keystream bytes for the given algorithm and key.
    pub fn generate(
        algorithm: KeystreamAlgorithm,
        key: &[u8],
        iv: &[u8],
        len: usize,
    ) -> Result<Vec<u8>, DvError> {
        match algorithm {
            KeystreamAlgorithm::Rc4 { drop_bytes } => Self::rc4(key, drop_bytes, len),
            KeystreamAlgorithm::Aes256Ofb => Self::aes_ofb(key, iv, len),
            KeystreamAlgorithm::TytAes256Ofb => Self::tyt_aes_ofb(key, iv, len),
            KeystreamAlgorithm::Lfsr64Reverse => Self::lfsr64_reverse(key, len),
        }
    }

    fn rc4(key: &[u8], drop_bytes: usize, len: usize) -> Result<Vec<u8>, DvError> {
        if key.is_empty() || key.len() > 16 {
            return Err(KeystreamError::InvalidKeyLength {
                expected: 16,
                actual: key.len(),
            }
            .into());
        }
        // The `Rc4` type alias is fixed at a 16-byte key slot; shorter
        // protocol keys (e.g. DMR's 40-bit basic privacy key) are
        // zero-padded into it, matching how those radios derive their
        // session key material.
        let mut padded = [0u8; 16];
        padded[..key.len()].copy_from_slice(key);

        let mut cipher = Rc4::new(&padded.into());
        let mut buf = vec![0u8; drop_bytes + len];
        cipher.apply_keystream(&mut buf);
        Ok(buf.split_off(drop_bytes))
    }

    fn aes_ofb(key: &[u8], iv: &[u8], len: usize) -> Result<Vec<u8>, DvError> {
        if key.len() != 32 {
            return Err(KeystreamError::InvalidKeyLength {
                expected: 32,
                actual: key.len(),
            }
            .into());
        }
        let mut block_iv = [0u8; 16];
        let n = iv.len().min(16);
        block_iv[..n].copy_from_slice(&iv[..n]);
        let key_array: [u8; 32] = key.try_into().expect("length checked above");

        let mut cipher = Aes256Ofb::new(&key_array.into(), &block_iv.into());
        let mut buf = vec![0u8; len];
        cipher.apply_keystream(&mut buf);
        Ok(buf)
    }

    fn tyt_aes_ofb(key: &[u8], iv: &[u8], len: usize) -> Result<Vec<u8>, DvError> {
        if iv.len() != 10 {
            return Err(KeystreamError::InvalidKeyLength {
                expected: 10,
                actual: iv.len(),
            }
            .into());
        }
        Self::aes_ofb(key, iv, len)
    }

    /// 64-bit LFSR with the P25 reference polynomial, clocked once per
    /// output bit and consumed MSB-first; the legacy keystream is produced
    /// by running the generator from the seed and reversing the resulting
    /// bit order to match the transmitter's framing convention.
    fn lfsr64_reverse(key: &[u8], len: usize) -> Result<Vec<u8>, DvError> {
        if key.len() != 8 {
            return Err(KeystreamError::InvalidKeyLength {
                expected: 8,
                actual: key.len(),
            }
            .into());
        }
        let mut state = u64::from_be_bytes(key.try_into().unwrap());
        // x^64 + x^62 + x^46 + x^38 + x^27 + x^15 + 1: bit63 is the implicit
        // output tap, the other five map to register bit (exponent - 1).
        const TAPS: u64 = (1 << 63) | (1 << 61) | (1 << 45) | (1 << 37) | (1 << 26) | (1 << 14);
        let bits_needed = len * 8;
        let mut bits = Vec::with_capacity(bits_needed);
        for _ in 0..bits_needed {
            let out = (state >> 63) & 1;
            let feedback = (state & TAPS).count_ones() & 1;
            state = (state << 1) | feedback as u64;
            bits.push(out as u8);
        }
        bits.reverse();
        Ok(crate::utils::pack_bits(&bits))
    }
}
