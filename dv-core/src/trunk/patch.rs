//! Patch / regroup tracking (§3, §4.6, §8 scenario 6).
//!
//! A patch binds a "super group" talkgroup to one or more constituent
//! working group IDs (WGIDs) and working unit IDs (WUIDs); traffic on any
//! constituent is reported under the super group. A patch also carries a
//! flag distinguishing an ordinary patch from a simulselect, and an
//! optional crypto context (key/algorithm/suite) for encrypted super
//! groups. Stale patches are swept out after a TTL so a system that
//! silently drops a patch doesn't leave it active forever; a drained patch
//! (no WGIDs or WUIDs left) is kept but reported as inactive until it is
//! either repopulated or explicitly cleared.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

const PATCH_TTL_S: i64 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchFlag {
    Patch,
    Simulselect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CryptoContext {
    pub key_id: u16,
    pub alg_id: u8,
    pub suite_id: u8,
}

#[derive(Debug, Clone)]
pub struct PatchRecord {
    pub super_group: u32,
    pub flag: PatchFlag,
    pub active: bool,
    pub last_seen: DateTime<Utc>,
    pub wgids: Vec<u32>,
    pub wuids: Vec<u32>,
    pub kas: Option<CryptoContext>,
}

impl PatchRecord {
    fn new(super_group: u32, flag: PatchFlag, now: DateTime<Utc>) -> Self {
        Self {
            super_group,
            flag,
            active: true,
            last_seen: now,
            wgids: Vec::new(),
            wuids: Vec::new(),
            kas: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        (now - self.last_seen).num_seconds() > PATCH_TTL_S
    }

    fn is_drained(&self) -> bool {
        self.wgids.is_empty() && self.wuids.is_empty()
    }

    fn sg_tag(&self) -> String {
        let flag = match self.flag {
            PatchFlag::Patch => "P",
            PatchFlag::Simulselect => "S",
        };
        format!("SG{:03}[{flag}]", self.super_group)
    }

    fn wg_field(&self) -> Option<String> {
        if self.wgids.is_empty() {
            return None;
        }
        if self.wgids.len() > 2 {
            Some(format!(
                "WG:{}({:04},{:04}+",
                self.wgids.len(),
                self.wgids[0],
                self.wgids[1]
            ))
        } else {
            let list = self
                .wgids
                .iter()
                .map(|w| format!("{w:04}"))
                .collect::<Vec<_>>()
                .join(",");
            Some(format!("WG:{}({list})", self.wgids.len()))
        }
    }

    /// Composes this patch's detail line: `SG<sg>[<flag>] WG:n(...) U:n
    /// K:<key> A:<alg> S:<suite>`, omitting any field that doesn't apply.
    fn compose_details(&self) -> String {
        let mut parts = vec![self.sg_tag()];
        if let Some(wg) = self.wg_field() {
            parts.push(wg);
        }
        if !self.wuids.is_empty() {
            parts.push(format!("U:{}", self.wuids.len()));
        }
        if let Some(kas) = &self.kas {
            parts.push(format!("K:{:X} A:{:X} S:{}", kas.key_id, kas.alg_id, kas.suite_id));
        }
        parts.join(" ")
    }
}

#[derive(Debug, Clone, Default)]
pub struct PatchTracker {
    patches: BTreeMap<u32, PatchRecord>,
}

impl PatchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares (or re-declares) a super group patch with the given flag,
    /// refreshing its TTL and marking it active.
    pub fn patch_update(&mut self, super_group: u32, flag: PatchFlag, now: DateTime<Utc>) {
        let entry = self
            .patches
            .entry(super_group)
            .or_insert_with(|| PatchRecord::new(super_group, flag, now));
        entry.flag = flag;
        entry.active = true;
        entry.last_seen = now;
    }

    pub fn patch_add_wgid(&mut self, super_group: u32, wgid: u32, now: DateTime<Utc>) {
        if let Some(p) = self.patches.get_mut(&super_group) {
            if !p.wgids.contains(&wgid) {
                p.wgids.push(wgid);
            }
            p.active = true;
            p.last_seen = now;
        }
    }

    pub fn patch_add_wuid(&mut self, super_group: u32, wuid: u32, now: DateTime<Utc>) {
        if let Some(p) = self.patches.get_mut(&super_group) {
            if !p.wuids.contains(&wuid) {
                p.wuids.push(wuid);
            }
            p.active = true;
            p.last_seen = now;
        }
    }

    pub fn patch_remove_wgid(&mut self, super_group: u32, wgid: u32) {
        if let Some(p) = self.patches.get_mut(&super_group) {
            p.wgids.retain(|&w| w != wgid);
            if p.is_drained() {
                p.active = false;
            }
        }
    }

    pub fn patch_remove_wuid(&mut self, super_group: u32, wuid: u32) {
        if let Some(p) = self.patches.get_mut(&super_group) {
            p.wuids.retain(|&u| u != wuid);
            if p.is_drained() {
                p.active = false;
            }
        }
    }

    pub fn patch_set_kas(&mut self, super_group: u32, key_id: u16, alg_id: u8, suite_id: u8) {
        if let Some(p) = self.patches.get_mut(&super_group) {
            p.kas = Some(CryptoContext { key_id, alg_id, suite_id });
        }
    }

    /// Drops a super group's patch record entirely, not just deactivating it.
    pub fn patch_clear_sg(&mut self, super_group: u32) {
        self.patches.remove(&super_group);
    }

    /// Resolves a talkgroup that might be a patch constituent to the super
    /// group it should be reported under, or the talkgroup itself if no
    /// active patch covers it.
    pub fn resolve(&self, talkgroup: u32, now: DateTime<Utc>) -> u32 {
        for patch in self.patches.values() {
            if !patch.active || patch.is_expired(now) {
                continue;
            }
            if patch.super_group == talkgroup || patch.wgids.contains(&talkgroup) {
                return patch.super_group;
            }
        }
        talkgroup
    }

    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> Vec<u32> {
        let expired: Vec<u32> = self
            .patches
            .iter()
            .filter(|(_, p)| p.is_expired(now))
            .map(|(k, _)| *k)
            .collect();
        for k in &expired {
            self.patches.remove(k);
        }
        expired
    }

    /// Composes the summary line: `P: 069,142` listing active super groups
    /// in ascending order. Sweeps expired patches first.
    pub fn patch_compose_summary(&mut self, now: DateTime<Utc>) -> String {
        self.sweep_expired(now);
        let sgs: Vec<String> = self
            .patches
            .values()
            .filter(|p| p.active)
            .map(|p| format!("{:03}", p.super_group))
            .collect();
        format!("P: {}", sgs.join(","))
    }

    /// Composes the per-patch detail lines for every active super group.
    /// Sweeps expired patches first.
    pub fn patch_compose_details(&mut self, now: DateTime<Utc>) -> String {
        self.sweep_expired(now);
        self.patches
            .values()
            .filter(|p| p.active)
            .map(PatchRecord::compose_details)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn active(&self) -> impl Iterator<Item = &PatchRecord> {
        self.patches.values().filter(|p| p.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn resolves_wgid_to_super_group() {
        let mut tracker = PatchTracker::new();
        tracker.patch_update(9000, PatchFlag::Patch, now());
        tracker.patch_add_wgid(9000, 101, now());
        tracker.patch_add_wgid(9000, 102, now());
        assert_eq!(tracker.resolve(101, now()), 9000);
        assert_eq!(tracker.resolve(999, now()), 999);
    }

    #[test]
    fn sweeps_expired_patches() {
        let mut tracker = PatchTracker::new();
        let stale_time = now() - Duration::seconds(PATCH_TTL_S + 1);
        tracker.patch_update(9000, PatchFlag::Patch, stale_time);
        tracker.patch_add_wgid(9000, 101, stale_time);
        let swept = tracker.sweep_expired(now());
        assert_eq!(swept, vec![9000]);
        assert_eq!(tracker.resolve(101, now()), 101);
    }

    #[test]
    fn clear_sg_removes_the_record_entirely() {
        let mut tracker = PatchTracker::new();
        tracker.patch_update(69, PatchFlag::Patch, now());
        tracker.patch_add_wgid(69, 837, now());
        tracker.patch_clear_sg(69);
        assert_eq!(tracker.active().count(), 0);
        assert_eq!(tracker.patch_compose_summary(now()), "P: ");
    }

    #[test]
    fn draining_all_constituents_deactivates_without_removing() {
        let mut tracker = PatchTracker::new();
        tracker.patch_update(77, PatchFlag::Simulselect, now());
        tracker.patch_add_wgid(77, 201, now());
        tracker.patch_remove_wgid(77, 201);
        assert_eq!(tracker.active().count(), 0);
        assert!(tracker.patch_compose_details(now()).is_empty());
    }

    #[test]
    fn scenario_6_composes_the_documented_summary_and_details() {
        let mut tracker = PatchTracker::new();
        tracker.patch_update(69, PatchFlag::Patch, now());
        tracker.patch_add_wgid(69, 837, now());
        tracker.patch_add_wgid(69, 1929, now());
        tracker.patch_add_wgid(69, 2001, now());
        tracker.patch_add_wgid(69, 2002, now());
        tracker.patch_set_kas(69, 0x1234, 0x84, 17);

        assert_eq!(tracker.patch_compose_summary(now()), "P: 069");
        let details = tracker.patch_compose_details(now());
        assert!(details.contains("SG069[P]"));
        assert!(details.contains("WG:4(0837,1929+"));
        assert!(details.contains("K:1234 A:84 S:17"));

        let stale_time = now() - Duration::seconds(PATCH_TTL_S + 1);
        tracker.patch_update(142, PatchFlag::Patch, stale_time);
        assert_eq!(tracker.patch_compose_summary(now()), "P: 069");

        tracker.patch_clear_sg(69);
        tracker.patch_update(77, PatchFlag::Simulselect, now());
        tracker.patch_add_wgid(77, 300, now());
        tracker.patch_remove_wgid(77, 300);
        let details = tracker.patch_compose_details(now());
        assert!(!details.contains("SG069"));
        assert!(!details.contains("SG077"));
    }
}
