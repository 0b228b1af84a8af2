//! In-memory collaborators for host tests.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use spin::Mutex;

use crate::config::regions::PAGE_SIZE;
use crate::config::WORD_SIZE;
use crate::device::{Console, Keyboard};
use crate::fs::{File, FileSystem};
use crate::mm::{UserMemory, VirtAddr, PAGE_MASK};
use crate::process::{Pid, ProcessControl};
use crate::syscall::UserRange;

/// First mapped user address.
pub const USER_BASE: usize = 0x0804_8000;
/// Size of the mapped user image.
pub const USER_SIZE: usize = 16 * PAGE_SIZE;

/// Where `push_frame` places the call frame.
const FRAME_AT: usize = USER_BASE + 0x80;
/// Start of the bump region used by `alloc` and `alloc_str`.
const HEAP_AT: usize = USER_BASE + PAGE_SIZE;

/// A flat, contiguous user image with optional unmapped pages.
pub struct MockMemory {
    data: Vec<u8>,
    holes: BTreeSet<usize>,
    next: usize,
}

impl MockMemory {
    pub fn new() -> Self {
        Self {
            data: vec![0; USER_SIZE],
            holes: BTreeSet::new(),
            next: HEAP_AT,
        }
    }

    fn offset(addr: usize) -> usize {
        addr - USER_BASE
    }

    pub fn unmap_page(&mut self, addr: usize) {
        self.holes.insert(addr & !PAGE_MASK);
    }

    pub fn write(&mut self, addr: usize, bytes: &[u8]) {
        let at = Self::offset(addr);
        self.data[at..at + bytes.len()].copy_from_slice(bytes);
    }

    pub fn write_str(&mut self, addr: usize, s: &str) {
        self.write(addr, s.as_bytes());
        self.write(addr + s.len(), &[0]);
    }

    pub fn read(&self, addr: usize, len: usize) -> &[u8] {
        let at = Self::offset(addr);
        &self.data[at..at + len]
    }

    /// Reserve `len` bytes and return their address.
    pub fn alloc(&mut self, len: usize) -> usize {
        let addr = self.next;
        self.next += len + 1;
        addr
    }

    /// Copy a NUL-terminated string in and return its address.
    pub fn alloc_str(&mut self, s: &str) -> usize {
        let addr = self.alloc(s.len() + 1);
        self.write_str(addr, s);
        addr
    }

    /// Lay out a call frame and return the stack pointer.
    pub fn push_frame(&mut self, number: u32, args: &[u32]) -> usize {
        self.write(FRAME_AT, &number.to_le_bytes());
        for (k, arg) in args.iter().enumerate() {
            self.write(FRAME_AT + WORD_SIZE * (k + 1), &arg.to_le_bytes());
        }
        FRAME_AT
    }
}

impl UserMemory for MockMemory {
    fn is_mapped(&self, addr: VirtAddr) -> bool {
        let addr = addr.as_usize();
        (USER_BASE..USER_BASE + USER_SIZE).contains(&addr)
            && !self.holes.contains(&(addr & !PAGE_MASK))
    }

    fn bytes(&self, range: &UserRange) -> &[u8] {
        self.read(range.start().as_usize(), range.len())
    }

    fn bytes_mut(&mut self, range: &UserRange) -> &mut [u8] {
        let at = Self::offset(range.start().as_usize());
        &mut self.data[at..at + range.len()]
    }
}

/// Console that records everything written to it.
pub struct MockConsole {
    out: Mutex<Vec<u8>>,
}

impl MockConsole {
    pub const fn new() -> Self {
        Self {
            out: Mutex::new(Vec::new()),
        }
    }

    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.out.lock()).into_owned()
    }
}

impl Console for MockConsole {
    fn write_bytes(&self, bytes: &[u8]) {
        self.out.lock().extend_from_slice(bytes);
    }
}

/// Keyboard replaying a fixed sequence of keys, then NULs.
pub struct MockKeyboard {
    keys: Mutex<VecDeque<u8>>,
}

impl MockKeyboard {
    pub fn new(keys: &[u8]) -> Self {
        Self {
            keys: Mutex::new(keys.iter().copied().collect()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.keys.lock().len()
    }
}

impl Keyboard for MockKeyboard {
    fn getc(&self) -> u8 {
        self.keys.lock().pop_front().unwrap_or(0)
    }
}

struct Node {
    data: Mutex<Vec<u8>>,
    writers_denied: AtomicUsize,
}

#[derive(Default)]
struct FsShared {
    files: Mutex<BTreeMap<String, Arc<Node>>>,
    journal: Mutex<Vec<u8>>,
    closes: Mutex<Vec<String>>,
    deny_calls: AtomicUsize,
}

/// In-memory filesystem. Clones share state.
#[derive(Clone, Default)]
pub struct MemFs {
    shared: Arc<FsShared>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        let files = self.shared.files.lock();
        files.get(path).map(|node| node.data.lock().clone())
    }

    /// Files closed so far.
    pub fn closed(&self) -> usize {
        self.shared.closes.lock().len()
    }

    /// Names of closed files, in close order.
    pub fn close_order(&self) -> Vec<String> {
        self.shared.closes.lock().clone()
    }

    pub fn deny_write_calls(&self) -> usize {
        self.shared.deny_calls.load(Ordering::SeqCst)
    }

    /// Every byte written to any file, in the order it landed.
    pub fn journal(&self) -> Vec<u8> {
        self.shared.journal.lock().clone()
    }
}

impl FileSystem for MemFs {
    type File = MemFile;

    fn create(&self, path: &str, initial_size: u32) -> bool {
        let mut files = self.shared.files.lock();
        if files.contains_key(path) {
            return false;
        }
        let node = Node {
            data: Mutex::new(vec![0; initial_size as usize]),
            writers_denied: AtomicUsize::new(0),
        };
        files.insert(path.into(), Arc::new(node));
        true
    }

    fn remove(&self, path: &str) -> bool {
        self.shared.files.lock().remove(path).is_some()
    }

    fn open(&self, path: &str) -> Option<MemFile> {
        let node = self.shared.files.lock().get(path).cloned()?;
        Some(MemFile {
            name: path.into(),
            node,
            fs: self.shared.clone(),
            pos: 0,
            denied: false,
        })
    }
}

/// An open in-memory file.
pub struct MemFile {
    name: String,
    node: Arc<Node>,
    fs: Arc<FsShared>,
    pos: u32,
    denied: bool,
}

impl File for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let data = self.node.data.lock();
        let start = (self.pos as usize).min(data.len());
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        self.pos += n as u32;
        n
    }

    /// Byte at a time, yielding in between, so unserialized writers interleave.
    fn write(&mut self, buf: &[u8]) -> usize {
        if self.node.writers_denied.load(Ordering::SeqCst) > 0 {
            return 0;
        }
        for &byte in buf {
            {
                let mut data = self.node.data.lock();
                let at = self.pos as usize;
                if at < data.len() {
                    data[at] = byte;
                } else {
                    data.resize(at, 0);
                    data.push(byte);
                }
            }
            self.fs.journal.lock().push(byte);
            self.pos += 1;
            std::thread::yield_now();
        }
        buf.len()
    }

    fn seek(&mut self, pos: u32) {
        self.pos = pos;
    }

    fn tell(&self) -> u32 {
        self.pos
    }

    fn length(&self) -> u32 {
        self.node.data.lock().len() as u32
    }

    fn deny_write(&mut self) {
        self.fs.deny_calls.fetch_add(1, Ordering::SeqCst);
        if !self.denied {
            self.denied = true;
            self.node.writers_denied.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Drop for MemFile {
    fn drop(&mut self) {
        if self.denied {
            self.node.writers_denied.fetch_sub(1, Ordering::SeqCst);
        }
        let name = std::mem::take(&mut self.name);
        self.fs.closes.lock().push(name);
    }
}

/// Process table where every known program exits immediately.
pub struct MockProcesses {
    programs: Vec<&'static str>,
    state: Mutex<(Pid, BTreeMap<Pid, i32>)>,
}

impl MockProcesses {
    pub fn new(programs: &[&'static str]) -> Self {
        Self {
            programs: programs.to_vec(),
            state: Mutex::new((2, BTreeMap::new())),
        }
    }

    /// Record the status child `pid` exits with.
    pub fn finish(&self, pid: Pid, status: i32) {
        if let Some(slot) = self.state.lock().1.get_mut(&pid) {
            *slot = status;
        }
    }
}

impl ProcessControl for MockProcesses {
    fn execute(&self, cmdline: &str) -> Option<Pid> {
        let program = cmdline.split_whitespace().next()?;
        if !self.programs.iter().any(|known| *known == program) {
            return None;
        }
        let mut state = self.state.lock();
        state.0 += 1;
        let pid = state.0;
        state.1.insert(pid, 0);
        Some(pid)
    }

    fn wait(&self, pid: Pid) -> i32 {
        self.state.lock().1.remove(&pid).unwrap_or(-1)
    }
}
