//! Page census: locating pages by status and counting them.

use storage::Flash;

use crate::codec::{self, PageStatus};
use crate::error::{Error, Result};
use crate::layout::Layout;

/// First page (lowest index) whose header equals `target`, if any.
/// A page whose header decodes to neither ERASED, COPY nor ACTIVE is
/// skipped rather than treated as an error: the census is exactly the
/// input recovery decides on, and a lone corrupted header should not by
/// itself abort every other operation.
pub fn find_page<F: Flash>(
    flash: &mut F,
    layout: &Layout,
    target: PageStatus,
) -> Result<Option<u32>> {
    for page in 0..layout.num_pages() {
        match codec::read_header(flash, layout, page) {
            Ok(status) if status == target => return Ok(Some(page)),
            Ok(_) => {}
            Err(Error::Corrupt) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}

/// `(num_active, num_copy)` across every page, the census recovery
/// decides on. Pages with a corrupted header count toward neither; if
/// that leaves the census unable to explain the device's state,
/// recovery falls back to a full format.
pub fn count_by_status<F: Flash>(flash: &mut F, layout: &Layout) -> Result<(u32, u32)> {
    let mut num_active = 0;
    let mut num_copy = 0;
    for page in 0..layout.num_pages() {
        match codec::read_header(flash, layout, page) {
            Ok(PageStatus::Active) => num_active += 1,
            Ok(PageStatus::Copy) => num_copy += 1,
            Ok(PageStatus::Erased) => {}
            Err(Error::Corrupt) => {}
            Err(e) => return Err(e),
        }
    }
    Ok((num_active, num_copy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use simflash::SimFlash;

    #[test]
    fn finds_the_lone_active_page() {
        let mut flash = SimFlash::new(3, 4096, 4);
        let layout = Layout::new(4096, 3, 64).unwrap();
        codec::write_header(&mut flash, &layout, 1, PageStatus::Active).unwrap();
        assert_eq!(find_page(&mut flash, &layout, PageStatus::Active).unwrap(), Some(1));
        assert_eq!(count_by_status(&mut flash, &layout).unwrap(), (1, 0));
    }
}
