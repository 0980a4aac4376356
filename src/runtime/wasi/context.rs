//! WASI environment: the file-descriptor table
//!
//! Host functions share one `WasiEnvironment` (behind an `Arc`) holding
//! the descriptor table. Descriptors wrap plain `Read`/`Write` trait
//! objects so tests can substitute fixtures for real standard streams.

use crate::runtime::RuntimeError;
use std::io::{Read, Write};
use std::sync::{Mutex, MutexGuard};

/// A file descriptor entry
pub struct FileDescriptor {
    reader: Option<Box<dyn Read + Send>>,
    writer: Option<Box<dyn Write + Send>>,
}

impl FileDescriptor {
    /// Create a readable file descriptor
    pub fn new_reader(reader: Box<dyn Read + Send>) -> Self {
        FileDescriptor {
            reader: Some(reader),
            writer: None,
        }
    }

    /// Create a writable file descriptor
    pub fn new_writer(writer: Box<dyn Write + Send>) -> Self {
        FileDescriptor {
            reader: None,
            writer: Some(writer),
        }
    }

    pub fn is_readable(&self) -> bool {
        self.reader.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.writer.is_some()
    }

    /// Read from this descriptor
    pub fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.reader {
            Some(reader) => reader.read(buf),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "fd is not readable",
            )),
        }
    }

    /// Write to this descriptor
    pub fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.writer {
            Some(writer) => writer.write(buf),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "fd is not writable",
            )),
        }
    }

    /// Flush this descriptor
    pub fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.writer {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for FileDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDescriptor")
            .field("readable", &self.is_readable())
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// Shared WASI state: the descriptor table
///
/// Slots 0, 1, and 2 are stdin, stdout, and stderr; further descriptors
/// are appended with [`WasiEnvironment::push_descriptor`].
#[derive(Debug, Default)]
pub struct WasiEnvironment {
    fds: Mutex<Vec<Option<FileDescriptor>>>,
}

impl WasiEnvironment {
    /// Create a builder for the environment
    pub fn builder() -> WasiEnvironmentBuilder {
        WasiEnvironmentBuilder::new()
    }

    /// Append a descriptor, returning its fd number
    pub fn push_descriptor(&self, fd: FileDescriptor) -> Result<u32, RuntimeError> {
        let mut fds = self.descriptors()?;
        fds.push(Some(fd));
        Ok((fds.len() - 1) as u32)
    }

    /// Lock the descriptor table
    pub fn descriptors(
        &self,
    ) -> Result<MutexGuard<'_, Vec<Option<FileDescriptor>>>, RuntimeError> {
        self.fds
            .lock()
            .map_err(|_| RuntimeError::HostFunctionFailed("poisoned fd table lock".to_string()))
    }
}

/// Builder for [`WasiEnvironment`]
#[derive(Default)]
pub struct WasiEnvironmentBuilder {
    stdin: Option<Box<dyn Read + Send>>,
    stdout: Option<Box<dyn Write + Send>>,
    stderr: Option<Box<dyn Write + Send>>,
}

impl WasiEnvironmentBuilder {
    pub fn new() -> Self {
        WasiEnvironmentBuilder::default()
    }

    pub fn stdin(mut self, reader: Box<dyn Read + Send>) -> Self {
        self.stdin = Some(reader);
        self
    }

    pub fn stdout(mut self, writer: Box<dyn Write + Send>) -> Self {
        self.stdout = Some(writer);
        self
    }

    pub fn stderr(mut self, writer: Box<dyn Write + Send>) -> Self {
        self.stderr = Some(writer);
        self
    }

    pub fn build(self) -> WasiEnvironment {
        let fds = vec![
            self.stdin.map(FileDescriptor::new_reader),
            self.stdout.map(FileDescriptor::new_writer),
            self.stderr.map(FileDescriptor::new_writer),
        ];
        WasiEnvironment {
            fds: Mutex::new(fds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn builder_fills_standard_slots() {
        let env = WasiEnvironment::builder()
            .stdin(Box::new(Cursor::new(vec![1, 2, 3])))
            .stdout(Box::new(Vec::new()))
            .build();

        let fds = env.descriptors().unwrap();
        assert!(fds[0].as_ref().unwrap().is_readable());
        assert!(fds[1].as_ref().unwrap().is_writable());
        assert!(fds[2].is_none()); // no stderr configured
    }

    #[test]
    fn push_descriptor_appends_after_standard_slots() {
        let env = WasiEnvironment::builder().build();
        let fd = env
            .push_descriptor(FileDescriptor::new_reader(Box::new(Cursor::new(vec![]))))
            .unwrap();
        assert_eq!(fd, 3);
    }

    #[test]
    fn descriptor_direction_is_enforced() {
        let mut fd = FileDescriptor::new_writer(Box::new(Vec::new()));
        let mut buf = [0u8; 4];
        assert!(fd.read(&mut buf).is_err());
        assert_eq!(fd.write(b"ok").unwrap(), 2);
    }
}
