//! WebAssembly linear memory
//!
//! Bounds-checked access to a page-based byte buffer. All accesses are
//! validated before touching the underlying data; out-of-bounds access
//! traps. Multi-byte quantities are little-endian.
//!
//! Memory layout follows the WebAssembly specification:
//! - Page size: 64KB (65,536 bytes)
//! - Address space: 32-bit
//! - Out-of-bounds access: traps

use super::RuntimeError;
use byteorder::{ByteOrder, LittleEndian};

/// WebAssembly page size in bytes (64KB)
pub const PAGE_SIZE: usize = 65536;

/// Maximum number of pages (2^16 = 64K pages = 4GB total)
pub const MAX_PAGES: u32 = 65536;

/// A WebAssembly linear memory instance
#[derive(Debug)]
pub struct MemoryInstance {
    /// The actual memory data
    data: Vec<u8>,
    /// Current size in pages
    current_pages: u32,
    /// Maximum size in pages (None = default max)
    max_pages: Option<u32>,
}

impl MemoryInstance {
    /// Create a new memory instance with the given limits
    ///
    /// # Errors
    /// - Initial pages exceeds the specified or system maximum
    pub fn new(initial_pages: u32, max_pages: Option<u32>) -> Result<Self, RuntimeError> {
        if initial_pages > MAX_PAGES {
            return Err(RuntimeError::MemoryError(format!(
                "initial memory size {initial_pages} pages exceeds maximum {MAX_PAGES} pages"
            )));
        }
        if let Some(max) = max_pages {
            if initial_pages > max {
                return Err(RuntimeError::MemoryError(format!(
                    "initial size {initial_pages} pages exceeds specified maximum {max} pages"
                )));
            }
            if max > MAX_PAGES {
                return Err(RuntimeError::MemoryError(format!(
                    "maximum size {max} pages exceeds system maximum {MAX_PAGES} pages"
                )));
            }
        }

        // Zero-initialised per the WebAssembly specification
        let data = vec![0u8; initial_pages as usize * PAGE_SIZE];

        Ok(MemoryInstance {
            data,
            current_pages: initial_pages,
            max_pages,
        })
    }

    /// Current memory size in pages
    pub fn size(&self) -> u32 {
        self.current_pages
    }

    /// Current memory size in bytes
    pub fn size_in_bytes(&self) -> usize {
        self.data.len()
    }

    /// Grow memory by `delta_pages` pages
    ///
    /// Returns the previous size in pages, or -1 if growth fails.
    pub fn grow(&mut self, delta_pages: u32) -> i32 {
        let current = self.current_pages;

        let Some(new_pages) = current.checked_add(delta_pages) else {
            return -1;
        };
        let effective_max = self.max_pages.unwrap_or(MAX_PAGES);
        if new_pages > effective_max {
            return -1;
        }

        let new_bytes = new_pages as usize * PAGE_SIZE;
        match self.data.try_reserve(new_bytes - self.data.len()) {
            Ok(()) => {
                self.data.resize(new_bytes, 0);
                self.current_pages = new_pages;
                current as i32
            }
            Err(_) => -1,
        }
    }

    /// Validate that `[addr, addr + len)` lies within the buffer
    #[inline]
    fn check_bounds(&self, addr: u32, len: usize) -> Result<usize, RuntimeError> {
        let addr = addr as usize;
        let end = addr
            .checked_add(len)
            .ok_or(RuntimeError::MemoryOutOfBounds)?;
        if end > self.data.len() {
            return Err(RuntimeError::MemoryOutOfBounds);
        }
        Ok(addr)
    }

    /// Load an `n`-byte little-endian unsigned integer (1 <= n <= 8)
    pub fn load_uint(&self, addr: u32, n: usize) -> Result<u64, RuntimeError> {
        check_width(n)?;
        let addr = self.check_bounds(addr, n)?;
        Ok(LittleEndian::read_uint(&self.data[addr..addr + n], n))
    }

    /// Store the low `n` bytes of `value` little-endian (1 <= n <= 8)
    pub fn store_uint(&mut self, addr: u32, n: usize, value: u64) -> Result<(), RuntimeError> {
        check_width(n)?;
        let addr = self.check_bounds(addr, n)?;
        let value = if n < 8 {
            value & ((1u64 << (n * 8)) - 1)
        } else {
            value
        };
        LittleEndian::write_uint(&mut self.data[addr..addr + n], value, n);
        Ok(())
    }

    /// Read a byte range out of memory
    pub fn read_bytes(&self, addr: u32, len: usize) -> Result<Vec<u8>, RuntimeError> {
        let addr = self.check_bounds(addr, len)?;
        Ok(self.data[addr..addr + len].to_vec())
    }

    /// Write a byte slice into memory
    pub fn write_bytes(&mut self, addr: u32, bytes: &[u8]) -> Result<(), RuntimeError> {
        let addr = self.check_bounds(addr, bytes.len())?;
        self.data[addr..addr + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

#[inline]
fn check_width(n: usize) -> Result<(), RuntimeError> {
    if n == 0 || n > 8 {
        return Err(RuntimeError::MemoryError(format!(
            "unsupported access width {n}"
        )));
    }
    Ok(())
}
