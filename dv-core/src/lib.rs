//! Core decode engine for narrowband digital-voice land-mobile radio:
//! symbol slicing, frame synchronization, P25 trunking, and per-protocol
//! frame dispatch for P25 Phase 1/2, DMR, NXDN, YSF, D-STAR, M17,
//! ProVoice, EDACS, dPMR, and X2-TDMA.

pub mod collaborators;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod errors;
pub mod event_history;
pub mod fec;
pub mod files;
pub mod frame_sync;
pub mod handlers;
pub mod keystream;
pub mod logging;
pub mod slicer;
pub mod state;
pub mod symbol_buffers;
pub mod threshold;
pub mod trunk;
pub mod utils;

pub use config::DecoderOptions;
pub use errors::{DvError, Result};
pub use state::DecoderState;
