//! Per-protocol frame handlers (§4.6 and peers). Each module implements
//! [`crate::dispatcher::FrameHandler`] for one protocol family.

pub mod dmr;
pub mod dpmr;
pub mod dstar;
pub mod edacs;
pub mod m17;
pub mod nxdn;
pub mod p25p1;
pub mod p25p2;
pub mod provoice;
pub mod x2tdma;
pub mod ysf;

use crate::config::ProtocolEnables;
use crate::dispatcher::ProtocolDispatcher;

/// Builds a dispatcher with every enabled protocol registered in the
/// specificity order prescribed by §4.5: NXDN, D-STAR, DMR, X2-TDMA,
/// ProVoice, EDACS, YSF, M17, P25 Phase 2, dPMR, P25 Phase 1.
pub fn build_dispatcher(enabled: ProtocolEnables) -> ProtocolDispatcher {
    let mut dispatcher = ProtocolDispatcher::new();
    if enabled.nxdn48 || enabled.nxdn96 {
        dispatcher.register(Box::new(nxdn::NxdnHandler::default()));
    }
    if enabled.dstar {
        dispatcher.register(Box::new(dstar::DstarHandler::default()));
    }
    if enabled.dmr {
        dispatcher.register(Box::new(dmr::DmrHandler::default()));
    }
    if enabled.x2tdma {
        dispatcher.register(Box::new(x2tdma::X2tdmaHandler::default()));
    }
    if enabled.provoice {
        dispatcher.register(Box::new(provoice::ProvoiceHandler::default()));
    }
    if enabled.edacs {
        dispatcher.register(Box::new(edacs::EdacsHandler::default()));
    }
    if enabled.ysf {
        dispatcher.register(Box::new(ysf::YsfHandler::default()));
    }
    if enabled.m17 {
        dispatcher.register(Box::new(m17::M17Handler::default()));
    }
    if enabled.p25p2 {
        dispatcher.register(Box::new(p25p2::P25p2Handler::default()));
    }
    if enabled.dpmr {
        dispatcher.register(Box::new(dpmr::DpmrHandler::default()));
    }
    if enabled.p25p1 {
        dispatcher.register(Box::new(p25p1::P25p1Handler::default()));
    }
    dispatcher
}
