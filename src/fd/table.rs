//! File Descriptor Table
//!
//! Each process owns one table mapping small integers to open files.
//!
//! # Design
//! - Fixed capacity of `FD_TABLE_SIZE` slots
//! - Slots 0-2 are reserved for the console and never hold a file
//! - A bitmap of free slots makes "lowest free descriptor" a single
//!   `trailing_zeros`
//! - A slot owns its `OpenFile`; releasing the slot drops (closes) it

use core::array;

use crate::config::FD_TABLE_SIZE;
use crate::fs::File;

use super::file::OpenFile;

/// A descriptor number that is in range for the table.
///
/// Newtype so handlers cannot index the table with an arbitrary integer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[repr(transparent)]
pub struct Fd(u8);

impl Fd {
    /// Console input.
    pub const STDIN: Self = Self(0);

    /// Console output.
    pub const STDOUT: Self = Self(1);

    /// Reserved, never allocated.
    pub const RESERVED: Self = Self(2);

    /// First descriptor handed out by `allocate`.
    pub const FIRST_USER: Self = Self(3);

    /// Create a descriptor from a raw user value.
    ///
    /// Returns None if the value is negative or past the table.
    #[inline]
    pub const fn new(raw: i32) -> Option<Self> {
        if raw >= 0 && (raw as usize) < FD_TABLE_SIZE {
            Some(Self(raw as u8))
        } else {
            None
        }
    }

    /// Get the index value.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The value returned to user code.
    #[inline]
    pub const fn as_raw(self) -> i32 {
        self.0 as i32
    }

    /// Check whether this descriptor can ever hold a file.
    #[inline]
    pub const fn is_allocatable(self) -> bool {
        self.0 >= Self::FIRST_USER.0
    }
}

/// Error type for descriptor table operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdError {
    /// The descriptor is reserved or out of range.
    InvalidFd,
    /// Every allocatable slot is in use.
    TableFull,
    /// The slot holds no file.
    SlotEmpty,
}

impl core::fmt::Display for FdError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidFd => write!(f, "invalid file descriptor"),
            Self::TableFull => write!(f, "file descriptor table full"),
            Self::SlotEmpty => write!(f, "file descriptor not open"),
        }
    }
}

const _: () = assert!(FD_TABLE_SIZE == u128::BITS as usize);

/// Bits set for every allocatable slot.
const ALLOCATABLE: u128 = !0u128 << Fd::FIRST_USER.0;

/// A process's file descriptor table.
pub struct FdTable<F> {
    /// Slot contents.
    slots: [Option<OpenFile<F>>; FD_TABLE_SIZE],
    /// Bit i set means slot i is free and allocatable.
    free: u128,
}

impl<F: File> FdTable<F> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            slots: array::from_fn(|_| None),
            free: ALLOCATABLE,
        }
    }

    /// Bind `file` to the lowest free allocatable descriptor.
    ///
    /// On `TableFull` the file is dropped, which closes it.
    pub fn allocate(&mut self, file: OpenFile<F>) -> Result<Fd, FdError> {
        if self.free == 0 {
            return Err(FdError::TableFull);
        }
        let fd = Fd(self.free.trailing_zeros() as u8);
        self.free &= !(1u128 << fd.0);
        self.slots[fd.index()] = Some(file);
        log::trace!("fd {} allocated", fd.0);
        Ok(fd)
    }

    /// Look up the open file bound to `fd`.
    #[inline]
    pub fn lookup(&mut self, fd: Fd) -> Option<&mut OpenFile<F>> {
        self.slots[fd.index()].as_mut()
    }

    /// Check whether `fd` currently holds a file.
    #[inline]
    pub fn is_open(&self, fd: Fd) -> bool {
        self.slots[fd.index()].is_some()
    }

    /// Release `fd`, closing its file.
    ///
    /// Callers check liveness first; releasing an empty slot is an error.
    pub fn release(&mut self, fd: Fd) -> Result<(), FdError> {
        if !fd.is_allocatable() {
            return Err(FdError::InvalidFd);
        }
        match self.slots[fd.index()].take() {
            Some(file) => {
                self.free |= 1u128 << fd.0;
                drop(file);
                log::trace!("fd {} released", fd.0);
                Ok(())
            }
            None => Err(FdError::SlotEmpty),
        }
    }

    /// Release every open descriptor in ascending order.
    ///
    /// Returns how many were released.
    pub fn release_all(&mut self) -> usize {
        let mut released = 0;
        for index in Fd::FIRST_USER.index()..FD_TABLE_SIZE {
            let fd = Fd(index as u8);
            if self.is_open(fd) && self.release(fd).is_ok() {
                released += 1;
            }
        }
        released
    }

    /// Number of open descriptors.
    pub fn len(&self) -> usize {
        (ALLOCATABLE & !self.free).count_ones() as usize
    }

    /// Check if no descriptors are open.
    pub fn is_empty(&self) -> bool {
        self.free == ALLOCATABLE
    }

    /// Iterate over open descriptors in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (Fd, &OpenFile<F>)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|file| (Fd(i as u8), file)))
    }
}

impl<F: File> Default for FdTable<F> {
    fn default() -> Self {
        Self::new()
    }
}
