//! Memory access for the syscall layer
//!
//! Provides:
//! - User virtual address type
//! - The user address space seam used by the validator and handlers
//!
//! # Security Principles
//! - User addresses are plain integers until validated
//! - Unsafe code is confined to `ActiveSpace`

mod address;
mod space;

pub use address::{VirtAddr, PAGE_MASK};
pub use space::{ActiveSpace, UserMemory};
