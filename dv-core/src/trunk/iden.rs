//! IDEN (identifier) table (§4.7): P25 trunking systems broadcast a table
//! mapping a 4-bit IDEN tag to the channel-spacing parameters needed to
//! turn a 12-bit channel number into an absolute frequency.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdenBandType {
    /// TDMA-capable channel (P25 Phase 2 / trunked TDMA voice channels).
    Tdma { slots_per_carrier: u8 },
    Fdma,
}

#[derive(Debug, Clone, Copy)]
pub struct IdenEntry {
    pub valid: bool,
    pub band_type: IdenBandType,
    /// Channel spacing in Hz.
    pub channel_spacing_hz: u32,
    /// Transmit base frequency in Hz.
    pub base_freq_hz: u64,
    /// Transmit offset from base in Hz, applied when resolving the
    /// receive-side frequency of a two-frequency repeater pair.
    pub tx_offset_hz: i64,
    /// Whether this IDEN has actually been seen on the control channel
    /// (vs. a caller-supplied seed value used before the real broadcast
    /// arrives, §9 Open Questions).
    pub trusted: bool,
}

impl Default for IdenEntry {
    fn default() -> Self {
        Self {
            valid: false,
            band_type: IdenBandType::Fdma,
            channel_spacing_hz: 12_500,
            base_freq_hz: 0,
            tx_offset_hz: 0,
            trusted: false,
        }
    }
}

/// 16-slot table (IDEN is a 4-bit field, §3 `p25_chan_iden[16]`).
#[derive(Debug, Clone)]
pub struct IdenTable {
    entries: [IdenEntry; 16],
}

impl Default for IdenTable {
    fn default() -> Self {
        Self {
            entries: [IdenEntry::default(); 16],
        }
    }
}

impl IdenTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, iden: u8, entry: IdenEntry) {
        if (iden as usize) < self.entries.len() {
            self.entries[iden as usize] = entry;
        }
    }

    pub fn get(&self, iden: u8) -> Option<&IdenEntry> {
        self.entries.get(iden as usize).filter(|e| e.valid)
    }

    /// Resolve a 12-bit channel number (top 4 bits IDEN, low 12 bits channel
    /// number within that IDEN's band) to a transmit frequency in Hz.
    pub fn resolve_tx_freq(&self, channel: u16) -> Option<u64> {
        let iden = ((channel >> 12) & 0xF) as u8;
        let chan_no = (channel & 0x0FFF) as u64;
        let entry = self.get(iden)?;
        Some(entry.base_freq_hz + chan_no * entry.channel_spacing_hz as u64)
    }

    pub fn resolve_rx_freq(&self, channel: u16) -> Option<u64> {
        let iden = ((channel >> 12) & 0xF) as u8;
        let entry = self.get(iden)?;
        let tx = self.resolve_tx_freq(channel)?;
        Some((tx as i64 + entry.tx_offset_hz) as u64)
    }

    pub fn is_trusted(&self, iden: u8) -> bool {
        self.get(iden).map(|e| e.trusted).unwrap_or(false)
    }
}
