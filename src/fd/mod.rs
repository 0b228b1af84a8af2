//! Per-Process File Descriptors
//!
//! # Design
//! - Each process owns one `FdTable`
//! - Descriptors are addressed by `Fd`, a range-checked index
//! - A slot goes Free -> Open (open) -> Free (close or exit), nothing else
//!
//! # Security Properties
//! - A file is bound to at most one descriptor
//! - Releasing a descriptor closes its file exactly once

pub mod file;
pub mod table;

pub use file::{HandleFlags, OpenFile};
pub use table::{Fd, FdError, FdTable};
