//! Simulated flash.
//!
//! A deterministic, in-memory stand-in for the raw NOR-like device the
//! `flashkv` engine is built against. Two things make this more than a
//! `Vec<u8>` wrapped in the `storage::Flash` trait:
//!
//! - NOR bit-clear enforcement: `write` rejects any attempt to set a bit
//!   that is currently `0` back to `1`. Only `erase_sector` may do that,
//!   and it always restores a whole sector to all-ones. This catches the
//!   class of bug the real engine's header-rewrite trick depends on not
//!   existing: a page status transition that happens to work against a
//!   plain mutable byte array but would silently corrupt real flash.
//! - Power-loss injection: [`SimFlash::arm_crash_after`] lets a test say
//!   "the device dies after N more mutating operations". The Nth
//!   operation still lands (a real device completes the physical write
//!   before power actually drops), but the `N+1`th and every call after
//!   it fail immediately, without touching the buffer. A test then
//!   simulates a reboot by constructing a fresh engine over the same
//!   `SimFlash` (after [`SimFlash::revive`]) and calling `init()`.
//!
//! Every mutating call is appended to a [`Transaction`] log
//! (see [`mod@transaction`]) so a test can count exactly how many
//! operations a given call sequence performs, then re-run with
//! `arm_crash_after` set to any prefix of that count.

mod transaction;

pub use transaction::{Transaction, TransactionKind};

use rand::RngCore;
use rand_xoshiro::Xoshiro256Plus;
use storage::{Flash, FlashError, ReadFlash, Result};

/// In-memory NOR flash simulator.
pub struct SimFlash {
    data: Vec<u8>,
    erase_size: u32,
    write_size: u32,
    crash_budget: Option<u32>,
    crashed: bool,
    transactions: Vec<Transaction>,
}

impl SimFlash {
    /// Build a flash of `num_pages` sectors of `erase_size` bytes each,
    /// in the erased (all-`0xFF`) state, with a `write_size`-byte write
    /// alignment (4, per the entry/header codec used by `flashkv`).
    pub fn new(num_pages: u32, erase_size: u32, write_size: u32) -> SimFlash {
        assert!(erase_size % write_size == 0, "erase_size must be a write_size multiple");
        SimFlash {
            data: vec![0xFF; (num_pages * erase_size) as usize],
            erase_size,
            write_size,
            crash_budget: None,
            crashed: false,
            transactions: Vec::new(),
        }
    }

    /// Arm fault injection: the next `ops` mutating calls (`write` or
    /// `erase_sector`) succeed normally; the one after that, and every
    /// call thereafter, fails with [`FlashError::Err`] without touching
    /// the buffer. Pass `0` to crash before the very next mutating call.
    pub fn arm_crash_after(&mut self, ops: u32) {
        self.crash_budget = Some(ops);
        self.crashed = false;
    }

    /// Clear fault injection and the crashed latch, as if the device had
    /// just been power-cycled: the bytes are untouched, but the engine
    /// wrapping this flash must call `init()` again before using it.
    pub fn revive(&mut self) {
        self.crash_budget = None;
        self.crashed = false;
    }

    /// Whether a prior mutating call has already exhausted its crash
    /// budget (i.e. the simulated device is currently "powered off").
    pub fn is_crashed(&self) -> bool {
        self.crashed
    }

    /// Raw bytes, for assertions against the on-disk layout in tests.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// The recorded mutating-operation log, oldest first.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Number of mutating operations (`write`/`erase_sector`) performed
    /// so far. Useful for computing an exact `arm_crash_after` budget: run
    /// a scenario once uncrashed, read `op_count()` at the point of
    /// interest, then re-run fresh with that budget armed from the start.
    pub fn op_count(&self) -> u32 {
        self.transactions.len() as u32
    }

    fn check_budget(&mut self) -> Result<()> {
        if self.crashed {
            return Err(FlashError::Err);
        }
        match self.crash_budget {
            Some(0) => {
                self.crashed = true;
                Err(FlashError::Err)
            }
            Some(n) => {
                self.crash_budget = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl ReadFlash for SimFlash {
    fn read_size(&self) -> u32 {
        1
    }

    fn capacity(&self) -> u32 {
        self.data.len() as u32
    }

    fn read(&mut self, addr: u32, bytes: &mut [u8]) -> Result<()> {
        if self.crashed {
            return Err(FlashError::Err);
        }
        let start = addr as usize;
        let end = start + bytes.len();
        if end > self.data.len() {
            return Err(FlashError::Err);
        }
        bytes.copy_from_slice(&self.data[start..end]);
        Ok(())
    }
}

impl Flash for SimFlash {
    fn write_size(&self) -> u32 {
        self.write_size
    }

    fn erase_size(&self) -> u32 {
        self.erase_size
    }

    fn erase_sector(&mut self, sector_index: u32) -> Result<()> {
        self.check_budget()?;
        let start = (sector_index * self.erase_size) as usize;
        let end = start + self.erase_size as usize;
        if end > self.data.len() {
            return Err(FlashError::Err);
        }
        self.data[start..end].fill(0xFF);
        self.transactions.push(Transaction {
            kind: TransactionKind::Erase,
            addr: start as u32,
            len: self.erase_size,
        });
        Ok(())
    }

    fn write(&mut self, addr: u32, bytes: &[u8]) -> Result<()> {
        self.check_budget()?;
        let start = addr as usize;
        let end = start + bytes.len();
        if end > self.data.len() {
            return Err(FlashError::Err);
        }
        for (existing, incoming) in self.data[start..end].iter().zip(bytes) {
            if incoming & !existing != 0 {
                // Would require setting a bit that isn't erased -- not
                // something NOR flash can do without an erase first.
                return Err(FlashError::Err);
            }
        }
        self.data[start..end].copy_from_slice(bytes);
        self.transactions.push(Transaction {
            kind: TransactionKind::Write,
            addr,
            len: bytes.len() as u32,
        });
        Ok(())
    }
}

/// Fill `dst` with deterministic pseudo-random bytes from a seeded RNG,
/// for tests that need many distinct values without hardcoding them.
pub fn fill_random(seed: u64, dst: &mut [u8]) {
    let mut rng = Xoshiro256Plus::seed_from_u64(seed);
    rng.fill_bytes(dst);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erase_then_write_roundtrip() {
        let mut flash = SimFlash::new(2, 4096, 4);
        flash.write(0, &[0, 0, 0, 0]).unwrap();
        let mut buf = [0xFFu8; 4];
        flash.read(0, &mut buf).unwrap();
        assert_eq!(buf, [0, 0, 0, 0]);
    }

    #[test]
    fn write_rejects_setting_bits() {
        let mut flash = SimFlash::new(2, 4096, 4);
        flash.write(0, &[0x00, 0x00, 0x00, 0x00]).unwrap();
        // Bit-clear only: writing back 0xFF would need to set bits.
        assert!(flash.write(0, &[0xFF, 0xFF, 0xFF, 0xFF]).is_err());
    }

    #[test]
    fn erase_restores_erased_state() {
        let mut flash = SimFlash::new(2, 4096, 4);
        flash.write(0, &[0, 0, 0, 0]).unwrap();
        flash.erase_sector(0).unwrap();
        assert_eq!(&flash.bytes()[0..4], &[0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn crash_budget_allows_exact_prefix() {
        let mut flash = SimFlash::new(2, 4096, 4);
        flash.arm_crash_after(1);
        flash.write(0, &[0, 0, 0, 0]).unwrap();
        assert!(flash.write(4, &[0, 0, 0, 0]).is_err());
        assert!(flash.is_crashed());
        flash.revive();
        flash.write(4, &[0, 0, 0, 0]).unwrap();
    }
}
