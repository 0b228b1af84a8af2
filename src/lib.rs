//! sysgate - Syscall Trap Boundary for a Teaching Kernel
//!
//! The layer between a user program's `int 0x30` and the rest of the kernel.
//!
//! # Responsibilities
//! - Decode the syscall number and argument words from the user stack
//! - Validate every user address before it is dereferenced
//! - Own each process's file descriptor table
//! - Serialize all file content access behind one global lock
//! - Turn every user fault into `exit(-1)` instead of kernel undefined behaviour
//!
//! # Collaborators
//! The scheduler, virtual memory, program loader, filesystem and device
//! drivers live elsewhere. They are reached through the traits in
//! [`device`], [`fs`], [`mm`] and [`process`], and handed to the syscall
//! layer explicitly through [`syscall::Kernel`] and [`process::Process`].
//!
//! # Security Features
//! - Unchecked user addresses cannot reach a dereference: only the
//!   validator produces the ranges that user memory accessors accept
//! - Descriptor slots own their files, so a file is closed exactly once
//! - The content lock is a scoped guard, released on every path

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

extern crate alloc;

pub mod config;
pub mod device;
pub mod fd;
pub mod fs;
pub mod logging;
pub mod mm;
pub mod process;
pub mod syscall;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use process::Process;
pub use syscall::{dispatch, handle_trap, Control, Kernel, TrapFrame};
