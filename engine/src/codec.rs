//! Wire format for page headers and entries, and the flash accessors
//! that read and write them.

use asraw::{AsMutRaw, AsRaw};
use storage::Flash;

use crate::error::{Error, Result};
use crate::layout::{Layout, EMPTY_KEY};

/// A page's lifecycle state, encoded as a `u32` status word at the start
/// of the page. Transitions only ever clear bits
/// (`ERASED` -> `COPY` -> `ACTIVE`), matching what NOR flash can do
/// between erases.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PageStatus {
    Erased,
    Copy,
    Active,
}

impl PageStatus {
    const ERASED_RAW: u32 = 0xFFFF_FFFF;
    const COPY_RAW: u32 = 0xAAAA_AAAA;
    const ACTIVE_RAW: u32 = 0x0000_0000;

    fn to_raw(self) -> u32 {
        match self {
            PageStatus::Erased => Self::ERASED_RAW,
            PageStatus::Copy => Self::COPY_RAW,
            PageStatus::Active => Self::ACTIVE_RAW,
        }
    }

    fn from_raw(raw: u32) -> Option<PageStatus> {
        match raw {
            Self::ERASED_RAW => Some(PageStatus::Erased),
            Self::COPY_RAW => Some(PageStatus::Copy),
            Self::ACTIVE_RAW => Some(PageStatus::Active),
            _ => None,
        }
    }
}

/// One key/value slot. Both fields are little-endian; every compilation
/// target this crate supports (Cortex-M, RISC-V, and the `std` hosts
/// used for testing) is little-endian, so the in-memory and on-wire
/// layouts coincide and no explicit byte-swap is needed.
#[repr(C)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct Entry {
    pub key: u16,
    pub value: u16,
}

// Safety (AsMutRaw): `Entry` is `repr(C)`, contains only plain integers,
// and has no padding (two `u16` fields), so any 4-byte pattern is a
// valid `Entry`.
impl AsRaw for Entry {}
unsafe impl AsMutRaw for Entry {}

impl Entry {
    pub fn is_empty(&self) -> bool {
        self.key == EMPTY_KEY
    }
}

#[repr(transparent)]
#[derive(Clone, Copy)]
struct RawHeader(u32);

impl AsRaw for RawHeader {}
unsafe impl AsMutRaw for RawHeader {}

pub fn read_header<F: Flash>(flash: &mut F, layout: &Layout, page: u32) -> Result<PageStatus> {
    let mut raw = RawHeader(0);
    flash.read(layout.page_addr(page), raw.as_mut_raw())?;
    PageStatus::from_raw(raw.0).ok_or(Error::Corrupt)
}

pub fn write_header<F: Flash>(
    flash: &mut F,
    layout: &Layout,
    page: u32,
    status: PageStatus,
) -> Result<()> {
    let raw = RawHeader(status.to_raw());
    flash.write(layout.page_addr(page), raw.as_raw())?;
    Ok(())
}

pub fn read_entry<F: Flash>(flash: &mut F, layout: &Layout, page: u32, slot: u32) -> Result<Entry> {
    let mut entry = Entry::default();
    flash.read(layout.slot_addr(page, slot), entry.as_mut_raw())?;
    Ok(entry)
}

pub fn write_entry<F: Flash>(
    flash: &mut F,
    layout: &Layout,
    page: u32,
    slot: u32,
    entry: Entry,
) -> Result<()> {
    flash.write(layout.slot_addr(page, slot), entry.as_raw())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use simflash::SimFlash;

    #[test]
    fn header_roundtrips_through_the_status_progression() {
        let mut flash = SimFlash::new(2, 4096, 4);
        let layout = Layout::new(4096, 2, 64).unwrap();
        assert_eq!(read_header(&mut flash, &layout, 0).unwrap(), PageStatus::Erased);
        write_header(&mut flash, &layout, 0, PageStatus::Copy).unwrap();
        assert_eq!(read_header(&mut flash, &layout, 0).unwrap(), PageStatus::Copy);
        write_header(&mut flash, &layout, 0, PageStatus::Active).unwrap();
        assert_eq!(read_header(&mut flash, &layout, 0).unwrap(), PageStatus::Active);
    }

    #[test]
    fn entry_roundtrips() {
        let mut flash = SimFlash::new(2, 4096, 4);
        let layout = Layout::new(4096, 2, 64).unwrap();
        let entry = Entry { key: 7, value: 42 };
        write_entry(&mut flash, &layout, 0, 1, entry).unwrap();
        assert_eq!(read_entry(&mut flash, &layout, 0, 1).unwrap(), entry);
        assert!(read_entry(&mut flash, &layout, 0, 2).unwrap().is_empty());
    }
}
