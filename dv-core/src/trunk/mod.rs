//! P25 trunking subsystem (§4.6, §4.7): control-channel state machine,
//! IDEN frequency table, and patch tracking.

pub mod iden;
pub mod mac_vpdu;
pub mod patch;
pub mod sm;

pub use iden::{IdenBandType, IdenEntry, IdenTable};
pub use patch::{CryptoContext, PatchFlag, PatchRecord, PatchTracker};
pub use sm::{CallType, GrantRequest, P25TrunkStateMachine, SmEvent, SmState};
