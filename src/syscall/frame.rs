//! Call frame decoding
//!
//! User code pushes the syscall number and its arguments on its stack and
//! traps. The frame base (the user stack pointer) holds the number; argument
//! `k` (1-based) is the little-endian word at `base + 4 * k`.
//!
//! ```text
//! base + 12  | arg 3 |
//! base +  8  | arg 2 |
//! base +  4  | arg 1 |
//! base       |  nr   |
//! ```

use crate::config::WORD_SIZE;
use crate::mm::{UserMemory, VirtAddr};

use super::error::Fault;
use super::number::SyscallNumber;
use super::validate::{UserWord, Validator};

/// Maximum number of argument words a syscall takes.
pub const MAX_ARGS: usize = 3;

/// The part of the trapped register state the syscall layer uses.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapFrame {
    /// User stack pointer at the time of the trap.
    pub esp: usize,
    /// Return value register.
    pub eax: u32,
}

impl TrapFrame {
    pub const fn new(esp: usize) -> Self {
        Self { esp, eax: 0 }
    }
}

/// Raw argument words of a decoded call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Args([u32; MAX_ARGS]);

impl Args {
    pub const fn new(words: [u32; MAX_ARGS]) -> Self {
        Self(words)
    }

    /// Argument `k` as an unsigned word (1-based).
    #[inline]
    pub fn word(&self, k: usize) -> u32 {
        self.0[k - 1]
    }

    /// Argument `k` reinterpreted as a signed integer.
    #[inline]
    pub fn int(&self, k: usize) -> i32 {
        self.word(k) as i32
    }

    /// Argument `k` as a user address.
    #[inline]
    pub fn addr(&self, k: usize) -> VirtAddr {
        VirtAddr::new(self.word(k) as usize)
    }
}

/// Result of decoding a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// A known syscall with all of its argument slots read.
    Call(SyscallNumber, Args),
    /// A syscall number nobody implements.
    Unknown(u32),
}

/// Read the syscall number and arguments from the frame.
///
/// Every argument slot of the call is validated before any of them is read.
pub fn decode<M: UserMemory + ?Sized>(
    validator: &Validator,
    mem: &M,
    frame: &TrapFrame,
) -> Result<Decoded, Fault> {
    let base = VirtAddr::new(frame.esp);
    let raw = validator.word(mem, base)?.read(mem);
    let number = match SyscallNumber::from_raw(raw) {
        Some(number) => number,
        None => return Ok(Decoded::Unknown(raw)),
    };

    let arity = number.arity();
    let mut slots: [Option<UserWord>; MAX_ARGS] = [None, None, None];
    for k in 1..=arity {
        let addr = base
            .checked_add(WORD_SIZE * k)
            .ok_or(Fault::BadAddress(base))?;
        slots[k - 1] = Some(validator.word(mem, addr)?);
    }

    let mut words = [0u32; MAX_ARGS];
    for (word, slot) in words.iter_mut().zip(slots.iter()) {
        if let Some(slot) = slot {
            *word = slot.read(mem);
        }
    }
    Ok(Decoded::Call(number, Args(words)))
}
