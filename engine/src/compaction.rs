//! Three-phase pack (Arm/Migrate/Commit) and the boot-time recovery
//! decision matrix that resumes or undoes whichever phase a power loss
//! interrupted.

use storage::Flash;

use crate::codec::{self, Entry, PageStatus};
use crate::directory;
use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::log;

/// Compact `src`'s live entries onto the next page and return the new
/// active page index. Crash-safe at every point: a power loss during
/// Migrate leaves `src` ACTIVE and the destination COPY, which
/// `recover` resumes from scratch; a power loss during Commit after the
/// erase leaves no ACTIVE page at all, which `recover` finishes by
/// promoting the already-migrated destination.
pub(crate) fn pack<F: Flash>(flash: &mut F, layout: &Layout, src: u32) -> Result<u32> {
    let dst = (src + 1) % layout.num_pages();

    // Phase 1: Arm. The destination must be freshly erased -- any other
    // state means the directory lied about which page was free.
    if codec::read_header(flash, layout, dst)? != PageStatus::Erased {
        return Err(Error::Corrupt);
    }
    codec::write_header(flash, layout, dst, PageStatus::Copy)?;
    #[cfg(feature = "defmt")]
    defmt::debug!("pack: armed dst={=u32} as COPY", dst);

    migrate(flash, layout, src, dst)?;

    // Phase 3: Commit. Erasing src first means a crash between these two
    // writes leaves no ACTIVE page, which recover()'s (0, 1) branch
    // handles by promoting dst.
    flash.erase_sector(src)?;
    codec::write_header(flash, layout, dst, PageStatus::Active)?;
    #[cfg(feature = "defmt")]
    defmt::debug!("pack: committed dst={=u32} as ACTIVE", dst);

    Ok(dst)
}

/// Phase 2: Migrate. Copy every live key's current value from `src` to
/// `dst`, in increasing key order, leaving `dst` in COPY state.
fn migrate<F: Flash>(flash: &mut F, layout: &Layout, src: u32, dst: u32) -> Result<()> {
    let mut next_slot = 1;
    for key in 0..=layout.max_key() {
        if let Some(value) = log::read_from_page(flash, layout, src, key)? {
            if next_slot >= layout.slot_count() {
                return Err(Error::Full);
            }
            codec::write_entry(flash, layout, dst, next_slot, Entry { key, value })?;
            next_slot += 1;
        }
    }
    Ok(())
}

/// Boot-time recovery: read the page census and resolve it to exactly
/// one ACTIVE page, repeating or undoing whichever pack phase a power
/// loss may have interrupted.
///
/// | census (active, copy) | meaning                         | action                         |
/// |------------------------|----------------------------------|-------------------------------|
/// | (1, 0)                 | normal                           | none                          |
/// | (1, 1)                 | crash during Migrate             | discard copy, retry pack      |
/// | (0, 1)                 | crash during Commit, after erase | promote copy to active        |
/// | (0, 0)                 | virgin device / deep corruption  | format                        |
/// | anything else           | corruption                      | format                        |
pub(crate) fn recover<F: Flash>(flash: &mut F, layout: &Layout) -> Result<()> {
    let (num_active, num_copy) = directory::count_by_status(flash, layout)?;
    #[cfg(feature = "defmt")]
    defmt::debug!("recover: census active={=u32} copy={=u32}", num_active, num_copy);

    match (num_active, num_copy) {
        (1, 0) => Ok(()),
        (1, 1) => {
            let copy_page =
                directory::find_page(flash, layout, PageStatus::Copy)?.ok_or(Error::Corrupt)?;
            flash.erase_sector(copy_page)?;
            let active_page =
                directory::find_page(flash, layout, PageStatus::Active)?.ok_or(Error::Corrupt)?;
            pack(flash, layout, active_page)?;
            Ok(())
        }
        (0, 1) => {
            let copy_page =
                directory::find_page(flash, layout, PageStatus::Copy)?.ok_or(Error::Corrupt)?;
            codec::write_header(flash, layout, copy_page, PageStatus::Active)?;
            for page in 0..layout.num_pages() {
                if page != copy_page {
                    flash.erase_sector(page)?;
                }
            }
            Ok(())
        }
        (0, 0) => format(flash, layout),
        _ => format(flash, layout),
    }
}

fn format<F: Flash>(flash: &mut F, layout: &Layout) -> Result<()> {
    #[cfg(feature = "defmt")]
    defmt::trace!("recover: formatting device");
    for page in 0..layout.num_pages() {
        flash.erase_sector(page)?;
    }
    codec::write_header(flash, layout, 0, PageStatus::Active)
}
