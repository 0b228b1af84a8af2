//! Filesystem Collaborator
//!
//! The on-disk filesystem is external. This module defines what the syscall
//! layer needs from it and wraps it in a [`FileStore`] that owns the single
//! lock serializing all file content access.
//!
//! # Locking
//! - One `spin::Mutex<()>` for the whole store, not one per file
//! - Held only for the duration of one content read or write
//! - Never held while validating user memory

use spin::{Mutex, MutexGuard};

/// An open file as returned by the filesystem.
///
/// Dropping the value closes the file.
pub trait File: Send {
    /// Read up to `buf.len()` bytes at the cursor, advancing it.
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Write `buf` at the cursor, advancing it.
    ///
    /// Returns the number of bytes written, which is 0 while writes are denied.
    fn write(&mut self, buf: &[u8]) -> usize;

    /// Move the cursor to `pos` bytes from the start of the file.
    fn seek(&mut self, pos: u32);

    /// Current cursor position.
    fn tell(&self) -> u32;

    /// File length in bytes.
    fn length(&self) -> u32;

    /// Deny writes to the underlying file while this handle is open.
    fn deny_write(&mut self);
}

/// The filesystem namespace.
pub trait FileSystem: Sync {
    /// Open file type.
    type File: File;

    /// Create a file of `initial_size` bytes. Fails if it already exists.
    fn create(&self, path: &str, initial_size: u32) -> bool;

    /// Remove a file.
    fn remove(&self, path: &str) -> bool;

    /// Open a file by name.
    fn open(&self, path: &str) -> Option<Self::File>;
}

/// A filesystem together with its global content lock.
pub struct FileStore<FS> {
    fs: FS,
    content: Mutex<()>,
}

/// Proof that the global content lock is held. Released on drop.
pub struct ContentGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl<FS: FileSystem> FileStore<FS> {
    /// Wrap a filesystem.
    pub const fn new(fs: FS) -> Self {
        Self {
            fs,
            content: Mutex::new(()),
        }
    }

    /// Namespace operations. These do not take the content lock.
    #[inline]
    pub fn namespace(&self) -> &FS {
        &self.fs
    }

    /// Acquire the global content lock.
    pub fn lock_content(&self) -> ContentGuard<'_> {
        ContentGuard {
            _guard: self.content.lock(),
        }
    }

    /// Check whether some thread currently holds the content lock.
    pub fn is_content_locked(&self) -> bool {
        self.content.is_locked()
    }
}
