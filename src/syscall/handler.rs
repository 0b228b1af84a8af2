//! System Call Handler
//!
//! Dispatches system calls and implements individual syscall handlers.
//!
//! # Security Considerations
//! - The frame is decoded and every argument slot validated before any
//!   handler runs
//! - Handlers validate pointer and buffer arguments before touching them
//! - A fatal fault exits the process with -1 before any side effect of the
//!   faulting handler
//! - File content is read and written under the global content lock only

use crate::config::UnknownSyscall;
use crate::config::Config;
use crate::device::{Console, Keyboard};
use crate::fd::{Fd, OpenFile};
use crate::fs::{File, FileStore, FileSystem};
use crate::mm::{UserMemory, VirtAddr};
use crate::process::{Process, ProcessControl, PID_ERROR};

use super::error::Fault;
use super::frame::{decode, Args, Decoded, TrapFrame};
use super::number::SyscallNumber;
use super::validate::Validator;

/// Kernel services shared by every process's syscalls.
pub struct Kernel<'k, FS: FileSystem> {
    /// Filesystem and global content lock.
    pub files: &'k FileStore<FS>,
    /// Console output.
    pub console: &'k dyn Console,
    /// Keyboard input.
    pub keyboard: &'k dyn Keyboard,
    /// Process creation and reaping.
    pub processes: &'k dyn ProcessControl,
    /// Syscall layer policy.
    pub config: Config,
}

impl<'k, FS: FileSystem> Kernel<'k, FS> {
    /// Bundle the kernel services with the default configuration.
    pub fn new(
        files: &'k FileStore<FS>,
        console: &'k dyn Console,
        keyboard: &'k dyn Keyboard,
        processes: &'k dyn ProcessControl,
    ) -> Self {
        Self {
            files,
            console,
            keyboard,
            processes,
            config: Config::new(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }
}

/// What the trapping thread does after a syscall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Return to user mode.
    Resume,
    /// The process has exited with this status; terminate the thread.
    Exit(i32),
    /// Power the machine off.
    Halt,
}

/// What a handler produced.
enum Reply {
    /// Store in the return register.
    Value(i32),
    /// No return value.
    Void,
    Exit(i32),
    Halt,
}

impl Reply {
    fn bool(ok: bool) -> Self {
        Self::Value(ok as i32)
    }
}

/// Dispatch the system call described by `frame`.
///
/// The return register is written only for calls that produce a value.
/// Any fatal fault exits `process` with status -1.
pub fn dispatch<FS, M>(
    kernel: &Kernel<'_, FS>,
    process: &mut Process<FS::File>,
    mem: &mut M,
    frame: &mut TrapFrame,
) -> Control
where
    FS: FileSystem,
    M: UserMemory + ?Sized,
{
    let mut call = Syscall {
        kernel,
        process,
        mem,
        validator: Validator::new(&kernel.config),
    };

    let reply = decode(&call.validator, &*call.mem, frame).and_then(|decoded| match decoded {
        Decoded::Call(number, args) => {
            log::debug!("[SYSCALL] {}: {:?} {:?}", call.process.name(), number, args);
            call.handle(number, &args)
        }
        Decoded::Unknown(raw) => match call.kernel.config.unknown_syscall {
            UnknownSyscall::Ignore => {
                log::warn!("[SYSCALL] {}: ignoring unknown syscall {}", call.process.name(), raw);
                Ok(Reply::Void)
            }
            UnknownSyscall::Terminate => Err(Fault::UnknownSyscall(raw)),
        },
    });

    match reply {
        Ok(Reply::Value(value)) => {
            frame.eax = value as u32;
            Control::Resume
        }
        Ok(Reply::Void) => Control::Resume,
        Ok(Reply::Exit(status)) => Control::Exit(status),
        Ok(Reply::Halt) => Control::Halt,
        Err(fault) => {
            log::warn!("[SYSCALL] {}: {}, terminating", call.process.name(), fault);
            call.exit(-1);
            Control::Exit(-1)
        }
    }
}

/// One syscall in flight: the shared kernel plus the trapping process.
struct Syscall<'a, 'k, FS: FileSystem, M: ?Sized> {
    kernel: &'a Kernel<'k, FS>,
    process: &'a mut Process<FS::File>,
    mem: &'a mut M,
    validator: Validator,
}

impl<FS, M> Syscall<'_, '_, FS, M>
where
    FS: FileSystem,
    M: UserMemory + ?Sized,
{
    fn handle(&mut self, number: SyscallNumber, args: &Args) -> Result<Reply, Fault> {
        match number {
            SyscallNumber::Halt => Ok(Reply::Halt),
            SyscallNumber::Exit => {
                let status = args.int(1);
                self.exit(status);
                Ok(Reply::Exit(status))
            }
            SyscallNumber::Exec => self.exec(args.addr(1)),
            SyscallNumber::Wait => Ok(Reply::Value(self.kernel.processes.wait(args.int(1)))),
            SyscallNumber::Create => self.create(args.addr(1), args.word(2)),
            SyscallNumber::Remove => self.remove(args.addr(1)),
            SyscallNumber::Open => self.open(args.addr(1)),
            SyscallNumber::Filesize => self.filesize(args.int(1)),
            SyscallNumber::Read => self.read(args.int(1), args.addr(2), args.word(3)),
            SyscallNumber::Write => self.write(args.int(1), args.addr(2), args.word(3)),
            SyscallNumber::Seek => self.seek(args.int(1), args.word(2)),
            SyscallNumber::Tell => self.tell(args.int(1)),
            SyscallNumber::Close => self.close(args.int(1)),
        }
    }

    /// The single termination path, for both `exit` and fatal faults.
    fn exit(&mut self, status: i32) {
        self.process.exit(status, self.kernel.console);
    }

    fn exec(&mut self, cmdline: VirtAddr) -> Result<Reply, Fault> {
        if cmdline.is_null() {
            return Err(Fault::NullArgument);
        }
        let pid = match self.validator.string(&*self.mem, cmdline)? {
            Some(cmdline) => self.kernel.processes.execute(&cmdline).unwrap_or(PID_ERROR),
            None => PID_ERROR,
        };
        Ok(Reply::Value(pid))
    }

    fn create(&mut self, path: VirtAddr, initial_size: u32) -> Result<Reply, Fault> {
        if path.is_null() {
            return Err(Fault::NullArgument);
        }
        let created = match self.validator.string(&*self.mem, path)? {
            Some(path) => self.kernel.files.namespace().create(&path, initial_size),
            None => false,
        };
        Ok(Reply::bool(created))
    }

    fn remove(&mut self, path: VirtAddr) -> Result<Reply, Fault> {
        if path.is_null() {
            return Ok(Reply::bool(false));
        }
        let removed = match self.validator.string(&*self.mem, path)? {
            Some(path) => self.kernel.files.namespace().remove(&path),
            None => false,
        };
        Ok(Reply::bool(removed))
    }

    fn open(&mut self, path: VirtAddr) -> Result<Reply, Fault> {
        if path.is_null() {
            return Ok(Reply::Value(-1));
        }
        let path = match self.validator.string(&*self.mem, path)? {
            Some(path) => path,
            None => return Ok(Reply::Value(-1)),
        };
        let file = match self.kernel.files.namespace().open(&path) {
            Some(file) => file,
            None => return Ok(Reply::Value(-1)),
        };

        let mut file = OpenFile::new(file);
        // a running executable's image must not change under it
        if path == self.process.name() {
            file.deny_write();
        }
        match self.process.fds_mut().allocate(file) {
            Ok(fd) => Ok(Reply::Value(fd.as_raw())),
            Err(e) => {
                log::debug!("[SYSCALL] {}: open {:?}: {}", self.process.name(), path, e);
                Ok(Reply::Value(-1))
            }
        }
    }

    fn filesize(&mut self, fd: i32) -> Result<Reply, Fault> {
        let file = open_file(self.process, fd)?;
        Ok(Reply::Value(file.length() as i32))
    }

    fn read(&mut self, fd: i32, buf: VirtAddr, size: u32) -> Result<Reply, Fault> {
        if fd == Fd::STDIN.as_raw() {
            let dst = self.validator.buffer_mut(&*self.mem, buf, size as usize)?;
            let keyboard = self.kernel.keyboard;
            let mut count = 0;
            for byte in dst.as_bytes_mut(&mut *self.mem) {
                *byte = keyboard.getc();
                count += 1;
                if *byte == 0 {
                    break;
                }
            }
            return Ok(Reply::Value(count));
        }
        if fd < Fd::FIRST_USER.as_raw() {
            return Ok(Reply::Value(-1));
        }

        let dst = self.validator.buffer_mut(&*self.mem, buf, size as usize)?;
        let file = open_file(self.process, fd)?;
        let bytes = dst.as_bytes_mut(&mut *self.mem);
        let content = self.kernel.files.lock_content();
        Ok(Reply::Value(file.read(&content, bytes) as i32))
    }

    fn write(&mut self, fd: i32, buf: VirtAddr, size: u32) -> Result<Reply, Fault> {
        if fd == Fd::STDOUT.as_raw() {
            let src = self.validator.buffer(&*self.mem, buf, size as usize)?;
            self.kernel.console.write_bytes(src.as_bytes(&*self.mem));
            return Ok(Reply::Value(size as i32));
        }
        if fd < Fd::FIRST_USER.as_raw() {
            return Ok(Reply::Value(-1));
        }

        let src = self.validator.buffer(&*self.mem, buf, size as usize)?;
        let file = open_file(self.process, fd)?;
        let bytes = src.as_bytes(&*self.mem);
        let content = self.kernel.files.lock_content();
        Ok(Reply::Value(file.write(&content, bytes) as i32))
    }

    fn seek(&mut self, fd: i32, pos: u32) -> Result<Reply, Fault> {
        open_file(self.process, fd)?.seek(pos);
        Ok(Reply::Void)
    }

    fn tell(&mut self, fd: i32) -> Result<Reply, Fault> {
        let pos = open_file(self.process, fd)?.tell();
        Ok(Reply::Value(pos as i32))
    }

    fn close(&mut self, raw: i32) -> Result<Reply, Fault> {
        let fd = Fd::new(raw).ok_or(Fault::BadFd(raw))?;
        self.process
            .fds_mut()
            .release(fd)
            .map_err(|_| Fault::BadFd(raw))?;
        Ok(Reply::Void)
    }
}

/// Look up a descriptor that must be open.
fn open_file<F: File>(process: &mut Process<F>, raw: i32) -> Result<&mut OpenFile<F>, Fault> {
    match Fd::new(raw) {
        Some(fd) => process.fds_mut().lookup(fd).ok_or(Fault::BadFd(raw)),
        None => Err(Fault::BadFd(raw)),
    }
}
