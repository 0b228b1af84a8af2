//! User Address Space Access
//!
//! [`UserMemory`] is the seam between the syscall layer and the virtual
//! memory subsystem. Its byte accessors take a [`UserRange`], which only the
//! syscall validator can construct, so unchecked user addresses cannot reach
//! a dereference.

use crate::syscall::UserRange;

use super::address::VirtAddr;

/// The address space of the process that trapped.
pub trait UserMemory {
    /// Check whether `addr` is mapped in this address space.
    ///
    /// Only called for non-null addresses below the user boundary.
    fn is_mapped(&self, addr: VirtAddr) -> bool;

    /// Borrow the bytes of a validated range.
    fn bytes(&self, range: &UserRange) -> &[u8];

    /// Mutably borrow the bytes of a validated range.
    fn bytes_mut(&mut self, range: &UserRange) -> &mut [u8];
}

/// The address space currently installed in the MMU.
///
/// User pages are reachable from kernel mode at their user virtual address,
/// so a validated range is accessed in place.
pub struct ActiveSpace {
    lookup: fn(VirtAddr) -> bool,
}

impl ActiveSpace {
    /// Wrap the active page directory.
    ///
    /// # Safety
    /// `lookup` must report exactly the pages mapped in the page directory
    /// that is active while this value is in use, and those pages must stay
    /// mapped until the syscall returns.
    pub const unsafe fn new(lookup: fn(VirtAddr) -> bool) -> Self {
        Self { lookup }
    }
}

impl UserMemory for ActiveSpace {
    fn is_mapped(&self, addr: VirtAddr) -> bool {
        (self.lookup)(addr)
    }

    fn bytes(&self, range: &UserRange) -> &[u8] {
        if range.is_empty() {
            return &[];
        }
        // SAFETY:
        // - Every page of the range was checked mapped by the validator
        // - The range lies below PHYS_BASE and does not overflow
        // - ActiveSpace::new guarantees the mapping outlives the syscall
        unsafe { core::slice::from_raw_parts(range.start().as_usize() as *const u8, range.len()) }
    }

    fn bytes_mut(&mut self, range: &UserRange) -> &mut [u8] {
        if range.is_empty() {
            return &mut [];
        }
        // SAFETY: Same as ActiveSpace::bytes
        unsafe {
            core::slice::from_raw_parts_mut(range.start().as_usize() as *mut u8, range.len())
        }
    }
}
