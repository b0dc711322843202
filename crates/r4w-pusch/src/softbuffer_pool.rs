//! # Softbuffer Pool -- HARQ Process Storage Lifecycle
//!
//! Hands out [`RxSoftbuffer`]s keyed by HARQ process (RNTI and HARQ process
//! number). A reservation either reuses the process's existing softbuffer,
//! recreating it when the codeblock count changed, or takes a free entry.
//! Entries not reserved again within `expire_timeout_slots` are released
//! by [`RxSoftbufferPool::run_slot`].
//!
//! A reservation returns `&mut RxSoftbuffer`, so one HARQ process can only
//! ever have one decode in flight.
//!
//! ## Example
//!
//! ```rust
//! use r4w_pusch::softbuffer_pool::{RxSoftbufferPool, SoftbufferIdentifier, SoftbufferPoolConfig};
//!
//! let mut pool = RxSoftbufferPool::new(SoftbufferPoolConfig::default());
//! let id = SoftbufferIdentifier { rnti: 0x4601, harq_ack_id: 0 };
//! let buffer = pool.reserve(10, id, 3).unwrap();
//! assert_eq!(buffer.get_nof_codeblocks(), 3);
//! assert_eq!(pool.nof_reserved(), 1);
//! pool.free(&id);
//! assert_eq!(pool.nof_reserved(), 0);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SoftbufferPoolError;
use crate::softbuffer::RxSoftbuffer;

/// HARQ process key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SoftbufferIdentifier {
    pub rnti: u16,
    pub harq_ack_id: u8,
}

/// Pool dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftbufferPoolConfig {
    /// Number of softbuffers (concurrent HARQ processes).
    pub max_softbuffers: usize,
    /// Largest codeblock count a softbuffer may hold.
    pub max_nof_codeblocks: usize,
    /// Slots after the last reservation before an entry is released.
    pub expire_timeout_slots: u64,
}

impl Default for SoftbufferPoolConfig {
    fn default() -> Self {
        Self {
            max_softbuffers: 64,
            max_nof_codeblocks: 152,
            expire_timeout_slots: 100,
        }
    }
}

/// Aggregate pool statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SoftbufferPoolStats {
    /// Reservations served from a free entry.
    pub new_reservations: u64,
    /// Reservations that reused a process's softbuffer.
    pub reuses: u64,
    /// Reuses that recreated the softbuffer for a new codeblock count.
    pub recreations: u64,
    /// Entries released by expiry.
    pub expirations: u64,
    /// Reservations rejected because every entry was busy.
    pub exhausted: u64,
}

#[derive(Debug)]
struct PoolEntry {
    owner: Option<SoftbufferIdentifier>,
    expire_slot: u64,
    buffer: RxSoftbuffer,
}

/// Softbuffer pool.
#[derive(Debug)]
pub struct RxSoftbufferPool {
    config: SoftbufferPoolConfig,
    entries: Vec<PoolEntry>,
    stats: SoftbufferPoolStats,
}

impl RxSoftbufferPool {
    pub fn new(config: SoftbufferPoolConfig) -> Self {
        let entries = (0..config.max_softbuffers)
            .map(|_| PoolEntry {
                owner: None,
                expire_slot: 0,
                buffer: RxSoftbuffer::new(0),
            })
            .collect();
        Self {
            config,
            entries,
            stats: SoftbufferPoolStats::default(),
        }
    }

    pub fn config(&self) -> &SoftbufferPoolConfig {
        &self.config
    }

    /// Reserve the softbuffer of HARQ process `id` for `nof_codeblocks`
    /// codeblocks at `slot`.
    pub fn reserve(
        &mut self,
        slot: u64,
        id: SoftbufferIdentifier,
        nof_codeblocks: usize,
    ) -> Result<&mut RxSoftbuffer, SoftbufferPoolError> {
        if nof_codeblocks > self.config.max_nof_codeblocks {
            return Err(SoftbufferPoolError::TooManyCodeblocks {
                requested: nof_codeblocks,
                max: self.config.max_nof_codeblocks,
            });
        }
        let expire_slot = slot + self.config.expire_timeout_slots;

        if let Some(idx) = self.entries.iter().position(|e| e.owner == Some(id)) {
            self.stats.reuses += 1;
            let entry = &mut self.entries[idx];
            if entry.buffer.get_nof_codeblocks() != nof_codeblocks {
                debug!(
                    rnti = id.rnti,
                    harq = id.harq_ack_id,
                    old = entry.buffer.get_nof_codeblocks(),
                    new = nof_codeblocks,
                    "recreating softbuffer"
                );
                self.stats.recreations += 1;
                entry.buffer = RxSoftbuffer::new(nof_codeblocks);
            }
            entry.expire_slot = expire_slot;
            return Ok(&mut entry.buffer);
        }

        let Some(idx) = self.entries.iter().position(|e| e.owner.is_none()) else {
            self.stats.exhausted += 1;
            warn!(rnti = id.rnti, harq = id.harq_ack_id, slot, "softbuffer pool exhausted");
            return Err(SoftbufferPoolError::Exhausted);
        };

        self.stats.new_reservations += 1;
        let entry = &mut self.entries[idx];
        entry.owner = Some(id);
        entry.expire_slot = expire_slot;
        entry.buffer = RxSoftbuffer::new(nof_codeblocks);
        Ok(&mut entry.buffer)
    }

    /// Release the softbuffer of `id`. Returns `false` if it held none.
    pub fn free(&mut self, id: &SoftbufferIdentifier) -> bool {
        match self.entries.iter_mut().find(|e| e.owner.as_ref() == Some(id)) {
            Some(entry) => {
                entry.owner = None;
                entry.buffer = RxSoftbuffer::new(0);
                true
            }
            None => false,
        }
    }

    /// Advance to `slot`, releasing expired entries.
    pub fn run_slot(&mut self, slot: u64) {
        for entry in self.entries.iter_mut() {
            if let Some(id) = entry.owner {
                if slot >= entry.expire_slot {
                    debug!(rnti = id.rnti, harq = id.harq_ack_id, slot, "softbuffer expired");
                    entry.owner = None;
                    entry.buffer = RxSoftbuffer::new(0);
                    self.stats.expirations += 1;
                }
            }
        }
    }

    pub fn nof_reserved(&self) -> usize {
        self.entries.iter().filter(|e| e.owner.is_some()).count()
    }

    pub fn stats(&self) -> &SoftbufferPoolStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LogLikelihoodRatio;

    fn id(rnti: u16, harq: u8) -> SoftbufferIdentifier {
        SoftbufferIdentifier { rnti, harq_ack_id: harq }
    }

    fn pool(max_softbuffers: usize) -> RxSoftbufferPool {
        RxSoftbufferPool::new(SoftbufferPoolConfig {
            max_softbuffers,
            max_nof_codeblocks: 8,
            expire_timeout_slots: 10,
        })
    }

    #[test]
    fn test_reuse_keeps_content() {
        let mut pool = pool(2);
        pool.reserve(0, id(1, 0), 2).unwrap().get_soft_bits(1, 4)[0] = LogLikelihoodRatio::new(9);
        let buffer = pool.reserve(1, id(1, 0), 2).unwrap();
        assert_eq!(buffer.get_soft_bits(1, 4)[0].value(), 9);
        assert_eq!(pool.stats().reuses, 1);
        assert_eq!(pool.nof_reserved(), 1);
    }

    #[test]
    fn test_recreate_on_codeblock_count_change() {
        let mut pool = pool(2);
        pool.reserve(0, id(1, 0), 2).unwrap().get_pass_flags()[0].mark_passed();
        let buffer = pool.reserve(1, id(1, 0), 3).unwrap();
        assert_eq!(buffer.get_nof_codeblocks(), 3);
        assert!(buffer.get_pass_flags().iter().all(|f| !f.is_passed()));
        assert_eq!(pool.stats().recreations, 1);
    }

    #[test]
    fn test_exhaustion() {
        let mut pool = pool(2);
        pool.reserve(0, id(1, 0), 1).unwrap();
        pool.reserve(0, id(1, 1), 1).unwrap();
        assert_eq!(pool.reserve(0, id(2, 0), 1).unwrap_err(), SoftbufferPoolError::Exhausted);
        assert_eq!(pool.stats().exhausted, 1);

        assert!(pool.free(&id(1, 1)));
        assert!(!pool.free(&id(1, 1)));
        assert!(pool.reserve(0, id(2, 0), 1).is_ok());
    }

    #[test]
    fn test_too_many_codeblocks() {
        let mut pool = pool(1);
        assert_eq!(
            pool.reserve(0, id(1, 0), 9).unwrap_err(),
            SoftbufferPoolError::TooManyCodeblocks { requested: 9, max: 8 }
        );
    }

    #[test]
    fn test_expiry() {
        let mut pool = pool(2);
        pool.reserve(0, id(1, 0), 1).unwrap();
        pool.reserve(5, id(2, 0), 1).unwrap();

        pool.run_slot(9);
        assert_eq!(pool.nof_reserved(), 2);
        pool.run_slot(10);
        assert_eq!(pool.nof_reserved(), 1);
        assert_eq!(pool.stats().expirations, 1);

        // Reserving again pushes the deadline.
        pool.reserve(14, id(2, 0), 1).unwrap();
        pool.run_slot(15);
        assert_eq!(pool.nof_reserved(), 1);
        pool.run_slot(24);
        assert_eq!(pool.nof_reserved(), 0);
    }
}
