//! Append-only log operations on the active page: reverse-scan reads,
//! append writes, and the full-page trigger into compaction.

use storage::Flash;

use crate::codec::{self, Entry, PageStatus};
use crate::compaction;
use crate::directory;
use crate::error::{Error, Result};
use crate::layout::{Layout, EMPTY_KEY};

fn validate_key(layout: &Layout, key: u16) -> Result<()> {
    if key == EMPTY_KEY || key > layout.max_key() {
        return Err(Error::InvalidKey);
    }
    Ok(())
}

/// Latest-wins reverse scan of `page` for `key`: the highest-indexed
/// slot holding `key` is the live value, since every later write of the
/// same key appends further up the page.
pub(crate) fn read_from_page<F: Flash>(
    flash: &mut F,
    layout: &Layout,
    page: u32,
    key: u16,
) -> Result<Option<u16>> {
    for slot in (1..=layout.slot_count()).rev() {
        let entry = codec::read_entry(flash, layout, page, slot)?;
        if entry.key == key {
            return Ok(Some(entry.value));
        }
    }
    Ok(None)
}

pub(crate) fn read_key<F: Flash>(flash: &mut F, layout: &Layout, key: u16) -> Result<Option<u16>> {
    validate_key(layout, key)?;
    let page = directory::find_page(flash, layout, PageStatus::Active)?.ok_or(Error::Corrupt)?;
    read_from_page(flash, layout, page, key)
}

/// Next free slot on `page`: scan downward from the second-to-last slot;
/// the first non-empty slot found bounds the used prefix, and the
/// append target is one slot above it. If the whole range is empty, the
/// target is slot 1.
fn next_free_slot<F: Flash>(flash: &mut F, layout: &Layout, page: u32) -> Result<u32> {
    let slot_count = layout.slot_count();
    for slot in (1..slot_count).rev() {
        let entry = codec::read_entry(flash, layout, page, slot)?;
        if !entry.is_empty() {
            return Ok(slot + 1);
        }
    }
    Ok(1)
}

pub(crate) fn write_key<F: Flash>(
    flash: &mut F,
    layout: &Layout,
    key: u16,
    value: u16,
) -> Result<()> {
    validate_key(layout, key)?;
    let mut page = directory::find_page(flash, layout, PageStatus::Active)?.ok_or(Error::Corrupt)?;

    let last = codec::read_entry(flash, layout, page, layout.slot_count())?;
    if !last.is_empty() {
        page = compaction::pack(flash, layout, page)?;
    }

    let target = next_free_slot(flash, layout, page)?;
    codec::write_entry(flash, layout, page, target, Entry { key, value })
}
