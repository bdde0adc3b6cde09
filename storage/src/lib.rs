//! Flash adapter contract.
//!
//! A thin, synchronous wrapper over the three primitives a raw NOR-like
//! flash device exposes: erase a sector, read bytes, write bytes. The
//! traits here carry no policy — no caching, no retries, no bounds
//! checking beyond what the device itself reports via `capacity`,
//! `read_size`, `write_size` and `erase_size`. Higher layers (see the
//! `flashkv` crate) own the address arithmetic and the invariants that
//! make those addresses valid.

#![cfg_attr(not(any(feature = "std", test)), no_std)]

#[cfg(feature = "defmt")]
use defmt::Format;

/// The two non-success outcomes a physical flash device can produce.
///
/// `Ok` is represented by `Result::Ok(())`; these are the medium errors
/// of the adapter contract, returned verbatim by every layer above.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub enum FlashError {
    /// The device reported a failure performing the operation.
    Err,
    /// The device did not respond within its expected latency budget.
    Timeout,
}

impl core::fmt::Display for FlashError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FlashError::Err => write!(f, "flash device error"),
            FlashError::Timeout => write!(f, "flash device timeout"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FlashError {}

pub type Result<T> = core::result::Result<T, FlashError>;

/// Read-only view into a flash device.
pub trait ReadFlash {
    /// Minimum alignment and size multiple for `read`.
    fn read_size(&self) -> u32;
    /// Total addressable capacity, in bytes.
    fn capacity(&self) -> u32;
    /// Read `bytes.len()` bytes starting at `addr` into `bytes`.
    fn read(&mut self, addr: u32, bytes: &mut [u8]) -> Result<()>;
}

/// A flash device that can also be erased and written.
///
/// Per NOR semantics, `write` may only ever clear bits: the target
/// region must already be in the erased (all-ones) state for any bit
/// being programmed to a `0`. Only `erase_sector` returns a region to
/// the all-ones state.
pub trait Flash: ReadFlash {
    /// Minimum alignment and size multiple for `write`.
    fn write_size(&self) -> u32;
    /// Size of one erase unit (sector).
    fn erase_size(&self) -> u32;
    /// Erase the sector identified by `sector_index`.
    fn erase_sector(&mut self, sector_index: u32) -> Result<()>;
    /// Write `bytes` starting at `addr`.
    fn write(&mut self, addr: u32, bytes: &[u8]) -> Result<()>;
}
