//! User Address Validation
//!
//! Every user address a handler dereferences passes through [`Validator`]
//! first. The validator's outputs ([`UserWord`], [`UserBuffer`],
//! [`UserBufferMut`]) are the only way to obtain a [`UserRange`], and a
//! `UserRange` is the only thing [`UserMemory`] will turn into bytes.
//!
//! # Security Checks
//! 1. Address is not null
//! 2. Address is below the user/kernel boundary
//! 3. Address is mapped in the current process
//! 4. Start + length does not overflow
//! 5. Both endpoints and every page in between pass 1-3
//!
//! Strings are copied into the kernel one validated byte at a time, so a
//! string running off the end of a mapping faults instead of being read.

use alloc::string::String;
use alloc::vec::Vec;

use crate::config::regions::PAGE_SIZE;
use crate::config::{Config, WORD_SIZE};
use crate::mm::{UserMemory, VirtAddr};

use super::error::Fault;

/// A validated span of user memory.
///
/// Constructed only by this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserRange {
    start: VirtAddr,
    len: usize,
}

impl UserRange {
    /// First byte of the range.
    #[inline]
    pub fn start(&self) -> VirtAddr {
        self.start
    }

    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// A validated 32-bit word slot.
#[derive(Debug)]
pub struct UserWord(UserRange);

impl UserWord {
    /// Read the little-endian word.
    pub fn read<M: UserMemory + ?Sized>(&self, mem: &M) -> u32 {
        let mut word = [0u8; WORD_SIZE];
        word.copy_from_slice(mem.bytes(&self.0));
        u32::from_le_bytes(word)
    }
}

/// A validated user buffer the kernel reads from.
#[derive(Debug)]
pub struct UserBuffer(UserRange);

impl UserBuffer {
    /// Get the buffer as a byte slice.
    ///
    /// The contents may change under us if user code shares the page with
    /// another thread; callers copy what they need.
    pub fn as_bytes<'m, M: UserMemory + ?Sized>(&self, mem: &'m M) -> &'m [u8] {
        mem.bytes(&self.0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.len == 0
    }
}

/// A validated user buffer the kernel writes into.
#[derive(Debug)]
pub struct UserBufferMut(UserRange);

impl UserBufferMut {
    /// Get the buffer as a mutable byte slice.
    pub fn as_bytes_mut<'m, M: UserMemory + ?Sized>(&self, mem: &'m mut M) -> &'m mut [u8] {
        mem.bytes_mut(&self.0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.len == 0
    }
}

/// Checks user addresses against the process's address space.
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    user_top: usize,
    max_str_len: usize,
}

impl Validator {
    /// Build a validator for the given configuration.
    pub const fn new(config: &Config) -> Self {
        Self {
            user_top: config.user_top,
            max_str_len: config.max_path_len,
        }
    }

    /// Check a single address.
    pub fn validate<M: UserMemory + ?Sized>(&self, mem: &M, addr: VirtAddr) -> bool {
        !addr.is_null() && addr.as_usize() < self.user_top && mem.is_mapped(addr)
    }

    /// Check `addr`, `addr + len` and every page boundary between them.
    pub fn validate_range<M: UserMemory + ?Sized>(
        &self,
        mem: &M,
        addr: VirtAddr,
        len: usize,
    ) -> bool {
        let end = match addr.checked_add(len) {
            Some(end) => end,
            None => return false,
        };
        if !self.validate(mem, addr) || !self.validate(mem, end) {
            return false;
        }
        let mut page = addr.page_down().checked_add(PAGE_SIZE);
        while let Some(p) = page {
            if p >= end {
                break;
            }
            if !self.validate(mem, p) {
                return false;
            }
            page = p.checked_add(PAGE_SIZE);
        }
        true
    }

    /// Validate the 4-byte word slot at `addr`.
    pub fn word<M: UserMemory + ?Sized>(&self, mem: &M, addr: VirtAddr) -> Result<UserWord, Fault> {
        if !self.validate_range(mem, addr, WORD_SIZE - 1) {
            return Err(Fault::BadAddress(addr));
        }
        Ok(UserWord(UserRange {
            start: addr,
            len: WORD_SIZE,
        }))
    }

    /// Validate a buffer the kernel will read from.
    pub fn buffer<M: UserMemory + ?Sized>(
        &self,
        mem: &M,
        addr: VirtAddr,
        len: usize,
    ) -> Result<UserBuffer, Fault> {
        self.range(mem, addr, len).map(UserBuffer)
    }

    /// Validate a buffer the kernel will write into.
    pub fn buffer_mut<M: UserMemory + ?Sized>(
        &self,
        mem: &M,
        addr: VirtAddr,
        len: usize,
    ) -> Result<UserBufferMut, Fault> {
        self.range(mem, addr, len).map(UserBufferMut)
    }

    fn range<M: UserMemory + ?Sized>(
        &self,
        mem: &M,
        addr: VirtAddr,
        len: usize,
    ) -> Result<UserRange, Fault> {
        if addr.is_null() {
            return Err(Fault::NullArgument);
        }
        if !self.validate_range(mem, addr, len) {
            return Err(Fault::BadAddress(addr));
        }
        Ok(UserRange { start: addr, len })
    }

    /// Copy a NUL-terminated user string into the kernel.
    ///
    /// Every byte up to the terminator is validated. A string longer than
    /// the path limit or not UTF-8 is still read to its end, then returned
    /// as `None`: no file or program can have that name.
    ///
    /// `addr` must be non-null; callers apply their own null policy first.
    pub fn string<M: UserMemory + ?Sized>(
        &self,
        mem: &M,
        addr: VirtAddr,
    ) -> Result<Option<String>, Fault> {
        let mut bytes = Vec::new();
        let mut overlong = false;
        let mut at = addr;
        loop {
            if !self.validate(mem, at) {
                return Err(Fault::BadAddress(at));
            }
            let byte = mem.bytes(&UserRange { start: at, len: 1 })[0];
            if byte == 0 {
                break;
            }
            if bytes.len() < self.max_str_len {
                bytes.push(byte);
            } else {
                overlong = true;
            }
            at = at.checked_add(1).ok_or(Fault::BadAddress(at))?;
        }
        if overlong {
            return Ok(None);
        }
        Ok(String::from_utf8(bytes).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockMemory, USER_BASE, USER_SIZE};

    fn validator() -> Validator {
        Validator::new(&Config::new())
    }

    #[test]
    fn test_null_and_kernel_rejected() {
        let mem = MockMemory::new();
        let v = validator();
        assert!(!v.validate(&mem, VirtAddr::NULL));
        assert!(!v.validate(&mem, VirtAddr::new(0xC000_0000)));
        assert!(v.validate(&mem, VirtAddr::new(USER_BASE)));
    }

    #[test]
    fn test_unmapped_rejected() {
        let mem = MockMemory::new();
        let v = validator();
        assert!(!v.validate(&mem, VirtAddr::new(USER_BASE - 1)));
        assert!(!v.validate(&mem, VirtAddr::new(USER_BASE + USER_SIZE)));
    }

    #[test]
    fn test_range_checks_end() {
        let mem = MockMemory::new();
        let v = validator();
        let last = USER_BASE + USER_SIZE - 1;
        assert!(v.validate_range(&mem, VirtAddr::new(USER_BASE), 16));
        assert!(!v.validate_range(&mem, VirtAddr::new(last), 1));
        assert!(!v.validate_range(&mem, VirtAddr::new(usize::MAX - 2), 8));
    }

    #[test]
    fn test_range_checks_interior_pages() {
        let mut mem = MockMemory::new();
        let hole = USER_BASE + 2 * PAGE_SIZE;
        mem.unmap_page(hole);
        let v = validator();
        assert!(!v.validate_range(&mem, VirtAddr::new(USER_BASE + 8), 3 * PAGE_SIZE));
        assert!(v.validate_range(&mem, VirtAddr::new(USER_BASE + 8), PAGE_SIZE));
    }

    #[test]
    fn test_word_reads_little_endian() {
        let mut mem = MockMemory::new();
        mem.write(USER_BASE + 0x40, &0x1234_5678u32.to_le_bytes());
        let word = validator().word(&mem, VirtAddr::new(USER_BASE + 0x40)).unwrap();
        assert_eq!(word.read(&mem), 0x1234_5678);
    }

    #[test]
    fn test_null_buffer_faults() {
        let mem = MockMemory::new();
        let v = validator();
        assert_eq!(
            v.buffer(&mem, VirtAddr::NULL, 0).unwrap_err(),
            Fault::NullArgument
        );
        assert!(v.buffer(&mem, VirtAddr::new(USER_BASE), 0).unwrap().is_empty());
    }

    #[test]
    fn test_string_copy() {
        let mut mem = MockMemory::new();
        mem.write_str(USER_BASE + 0x100, "hello");
        let v = validator();
        let copied = v.string(&mem, VirtAddr::new(USER_BASE + 0x100)).unwrap();
        assert_eq!(copied.as_deref(), Some("hello"));
    }

    #[test]
    fn test_string_running_off_mapping_faults() {
        let mut mem = MockMemory::new();
        let tail = USER_BASE + USER_SIZE - 3;
        mem.write(tail, b"abc");
        let err = validator().string(&mem, VirtAddr::new(tail)).unwrap_err();
        assert_eq!(err, Fault::BadAddress(VirtAddr::new(USER_BASE + USER_SIZE)));
    }

    #[test]
    fn test_string_too_long_is_unnameable() {
        let mut mem = MockMemory::new();
        mem.write(USER_BASE, &[b'a'; 64]);
        mem.write(USER_BASE + 64, &[0]);
        let mut cfg = Config::new();
        cfg.max_path_len = 16;
        let copied = Validator::new(&cfg).string(&mem, VirtAddr::new(USER_BASE)).unwrap();
        assert_eq!(copied, None);
    }

    #[test]
    fn test_string_too_long_still_validated() {
        let mut mem = MockMemory::new();
        let tail = USER_BASE + USER_SIZE - 64;
        mem.write(tail, &[b'a'; 64]);
        let mut cfg = Config::new();
        cfg.max_path_len = 16;
        let err = Validator::new(&cfg).string(&mem, VirtAddr::new(tail)).unwrap_err();
        assert_eq!(err, Fault::BadAddress(VirtAddr::new(USER_BASE + USER_SIZE)));
    }

    #[test]
    fn test_string_not_utf8_is_unnameable() {
        let mut mem = MockMemory::new();
        mem.write(USER_BASE, b"a\xFFb\0");
        let copied = validator().string(&mem, VirtAddr::new(USER_BASE)).unwrap();
        assert_eq!(copied, None);
    }
}
