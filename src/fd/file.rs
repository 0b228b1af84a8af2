//! Open File Handles
//!
//! An [`OpenFile`] is what a descriptor slot owns: the filesystem's file
//! (content and cursor) plus per-handle flags.

use bitflags::bitflags;

use crate::fs::{ContentGuard, File};

bitflags! {
    /// Per-handle state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HandleFlags: u8 {
        /// Writes through this handle are denied.
        ///
        /// Set when a process opens its own executable.
        const DENY_WRITE = 1 << 0;
    }
}

/// A file bound to a descriptor slot.
#[derive(Debug)]
pub struct OpenFile<F> {
    file: F,
    flags: HandleFlags,
}

impl<F: File> OpenFile<F> {
    /// Wrap a freshly opened file.
    pub fn new(file: F) -> Self {
        Self {
            file,
            flags: HandleFlags::empty(),
        }
    }

    /// Handle flags.
    #[inline]
    pub fn flags(&self) -> HandleFlags {
        self.flags
    }

    /// Deny writes to the file and remember it on the handle.
    pub fn deny_write(&mut self) {
        self.flags.insert(HandleFlags::DENY_WRITE);
        self.file.deny_write();
    }

    /// Read at the cursor, under the content lock.
    pub fn read(&mut self, _content: &ContentGuard<'_>, buf: &mut [u8]) -> usize {
        self.file.read(buf)
    }

    /// Write at the cursor, under the content lock.
    ///
    /// A deny-write handle re-asserts the denial on the file before writing,
    /// so the filesystem decides the outcome (normally 0 bytes).
    pub fn write(&mut self, _content: &ContentGuard<'_>, buf: &[u8]) -> usize {
        if self.flags.contains(HandleFlags::DENY_WRITE) {
            self.file.deny_write();
        }
        self.file.write(buf)
    }

    pub fn seek(&mut self, pos: u32) {
        self.file.seek(pos);
    }

    pub fn tell(&self) -> u32 {
        self.file.tell()
    }

    pub fn length(&self) -> u32 {
        self.file.length()
    }
}
