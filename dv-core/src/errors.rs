//! Error taxonomy for the decoder core, mirroring the granular per-concern
//! split used across the rest of the crate: each stage reports into its own
//! enum, and `DvError` is the top-level sum type returned at API boundaries.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DvError {
    #[error("slicer error: {0}")]
    Slice(#[from] SliceError),

    #[error("frame sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("trunking error: {0}")]
    Trunk(#[from] TrunkError),

    #[error("keystream error: {0}")]
    Keystream(#[from] KeystreamError),

    #[error("file I/O error: {0}")]
    File(#[from] FileError),
}

/// Errors from the threshold tracker / slicer (§4.1, §4.2).
#[derive(Debug, Error)]
pub enum SliceError {
    #[error("unknown modulation mode {0:?}")]
    UnknownModulation(u8),

    #[error("threshold window empty: at least one sample required before slicing")]
    EmptyWindow,
}

/// Errors surfaced by the frame synchronizer (§4.4).
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no sync pattern matched within tolerance budget")]
    NoSyncFound,

    #[error("dibit ring underrun: need {required}, have {available}")]
    RingUnderrun { required: usize, available: usize },
}

/// Errors from the P25 trunking state machine (§4.6).
#[derive(Debug, Error)]
pub enum TrunkError {
    #[error("channel {channel:#06x} unresolved: IDEN {iden} not seeded or untrusted")]
    ChannelUnresolved { channel: u16, iden: u8 },

    #[error("grant refused by policy: {reason}")]
    PolicyRejected { reason: String },

    #[error("NID parity mismatch on P25P1 frame")]
    NidParityMismatch,

    #[error("unknown MAC-VPDU opcode {opcode:#04x} with no MCO length hint available")]
    MacVpduLengthUnknown { opcode: u8 },
}

/// Errors from keystream construction (§4.8).
#[derive(Debug, Error)]
pub enum KeystreamError {
    #[error("key length {actual} does not fit the {expected}-byte KIV slot")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("requested {requested} keystream bits but only {available} were generated")]
    Exhausted { requested: usize, available: usize },
}

/// Errors from artifact/WAV/symbol-capture file handling (§6).
#[derive(Debug, Error)]
pub enum FileError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("WAV encode error: {0}")]
    Wav(#[from] hound::Error),

    #[error("unrecognized artifact cookie {cookie:?}")]
    BadCookie { cookie: [u8; 4] },
}

pub type Result<T> = std::result::Result<T, DvError>;
