//! In-memory file system for exercising the handle pool and sessions.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::pool::Opener;

/// Failure injected into one in-memory file.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Fault {
    /// Reads fail once the stream position reaches this offset.
    ReadAfter(u64),
}

#[derive(Debug, Default)]
struct Inner {
    files: HashMap<PathBuf, (Vec<u8>, Option<Fault>)>,
    live: usize,
    peak: usize,
    opens: usize,
    descriptor_limit: Option<usize>,
}

/// Shared in-memory file system; cloned openers see the same counters.
#[derive(Debug, Clone, Default)]
pub(crate) struct MemFs {
    inner: Rc<RefCell<Inner>>,
}

impl MemFs {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_file(self, name: &str, data: &[u8]) -> Self {
        self.inner
            .borrow_mut()
            .files
            .insert(PathBuf::from(name), (data.to_vec(), None));
        self
    }

    pub(crate) fn with_faulty_file(self, name: &str, data: &[u8], fault: Fault) -> Self {
        self.inner
            .borrow_mut()
            .files
            .insert(PathBuf::from(name), (data.to_vec(), Some(fault)));
        self
    }

    /// Simulate a process descriptor table with room for `limit` handles.
    pub(crate) fn with_descriptor_limit(self, limit: usize) -> Self {
        self.inner.borrow_mut().descriptor_limit = Some(limit);
        self
    }

    pub(crate) fn opener(&self) -> MemOpener {
        MemOpener {
            inner: Rc::clone(&self.inner),
        }
    }

    /// Handles open right now.
    pub(crate) fn live(&self) -> usize {
        self.inner.borrow().live
    }

    /// Most handles ever open at once.
    pub(crate) fn peak_live(&self) -> usize {
        self.inner.borrow().peak
    }

    /// Successful opens, including reopens.
    pub(crate) fn opens(&self) -> usize {
        self.inner.borrow().opens
    }
}

fn exhaustion_error() -> io::Error {
    #[cfg(unix)]
    {
        io::Error::from_raw_os_error(libc::EMFILE)
    }
    #[cfg(not(unix))]
    {
        io::Error::from_raw_os_error(4)
    }
}

#[derive(Debug)]
pub(crate) struct MemOpener {
    inner: Rc<RefCell<Inner>>,
}

impl Opener for MemOpener {
    type Handle = MemHandle;

    fn open(&mut self, path: &Path) -> io::Result<MemHandle> {
        let mut inner = self.inner.borrow_mut();
        if inner.descriptor_limit.is_some_and(|limit| inner.live >= limit) {
            return Err(exhaustion_error());
        }
        let (data, fault) = inner
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        inner.live += 1;
        inner.peak = inner.peak.max(inner.live);
        inner.opens += 1;
        Ok(MemHandle {
            data: Cursor::new(data),
            fault,
            inner: Rc::clone(&self.inner),
        })
    }
}

#[derive(Debug)]
pub(crate) struct MemHandle {
    data: Cursor<Vec<u8>>,
    fault: Option<Fault>,
    inner: Rc<RefCell<Inner>>,
}

impl Read for MemHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.fault {
            Some(Fault::ReadAfter(limit)) => {
                let pos = self.data.position();
                if pos >= limit {
                    return Err(io::Error::other("injected read failure"));
                }
                let len = buf.len().min((limit - pos) as usize);
                self.data.read(&mut buf[..len])
            }
            None => self.data.read(buf),
        }
    }
}

impl Seek for MemHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.data.seek(pos)
    }
}

impl Drop for MemHandle {
    fn drop(&mut self) {
        self.inner.borrow_mut().live -= 1;
    }
}
