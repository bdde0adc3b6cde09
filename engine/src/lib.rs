//! Log-structured, two-page wear-leveling key/value store for raw NOR
//! flash.
//!
//! Keys are fixed-width `u16` handles into a contiguous array of `u16`
//! values; there is no schema beyond that. Every write appends a new
//! `(key, value)` entry to whichever of the two pages is currently
//! ACTIVE; a read is a reverse scan for the highest-indexed entry with
//! the requested key, since later entries shadow earlier ones. When the
//! active page fills, [`compaction::pack`] copies each key's current
//! value onto the other page, erases the old one, and promotes the new
//! one to ACTIVE -- a three-phase, crash-safe protocol
//! ([`Eeprom::init`] resumes or undoes an interrupted one at boot).

#![cfg_attr(not(any(feature = "std", test)), no_std)]

mod codec;
mod compaction;
mod directory;
mod error;
mod layout;
mod log;

pub use codec::PageStatus;
pub use error::Error;
pub use layout::{ConfigError, Layout};

use storage::Flash;

pub type Result<T> = error::Result<T>;

/// A key/value store backed by a [`storage::Flash`] device and a
/// [`Layout`] describing its page geometry.
pub struct Eeprom<F: Flash> {
    flash: F,
    layout: Layout,
}

impl<F: Flash> Eeprom<F> {
    /// Wrap `flash` without touching it. Call [`Eeprom::init`] before
    /// any [`read`](Eeprom::read) or [`write`](Eeprom::write): the
    /// device may be in whatever state a prior session (or a crash)
    /// left it in.
    pub fn new(flash: F, layout: Layout) -> Self {
        Eeprom { flash, layout }
    }

    /// Resolve the device to exactly one ACTIVE page, resuming or
    /// undoing an interrupted pack, or formatting on first boot or
    /// unrecoverable corruption. Idempotent: calling it again on an
    /// already-normal device is a no-op past the initial page scan.
    pub fn init(&mut self) -> Result<()> {
        compaction::recover(&mut self.flash, &self.layout)
    }

    /// Current value of `key`, or `None` if it has never been written.
    ///
    /// # Errors
    /// [`Error::InvalidKey`] if `key` is outside `0..=layout.max_key()`.
    pub fn read(&mut self, key: u16) -> Result<Option<u16>> {
        log::read_key(&mut self.flash, &self.layout, key)
    }

    /// Append `(key, value)`, transparently packing the active page
    /// first if it has no room left.
    ///
    /// # Errors
    /// [`Error::InvalidKey`] if `key` is outside `0..=layout.max_key()`;
    /// [`Error::Full`] if every key is live at once and still doesn't
    /// fit on a freshly packed page (a [`Layout`] precondition violation
    /// that should have been caught at construction).
    pub fn write(&mut self, key: u16, value: u16) -> Result<()> {
        log::write_key(&mut self.flash, &self.layout, key, value)
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Unwrap back to the underlying flash device.
    pub fn into_inner(self) -> F {
        self.flash
    }
}
