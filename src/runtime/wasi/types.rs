//! WASI type definitions and error codes
//!
//! The subset of WASI preview1 errno values the host functions here can
//! produce.
//!
//! See: <https://github.com/WebAssembly/WASI/blob/wasi-0.1/preview1/docs.md#errno>

/// WASI error codes (errno values)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum WasiErrno {
    /// No error occurred
    Success = 0,
    /// Resource unavailable, or operation would block
    Again = 6,
    /// Bad file descriptor
    BadF = 8,
    /// Bad address
    Fault = 21,
    /// Invalid argument
    Inval = 28,
    /// I/O error
    Io = 29,
}

impl WasiErrno {
    /// The errno as a guest-facing i32 return value
    pub fn as_i32(self) -> i32 {
        self as u32 as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errno_values_match_wasi() {
        assert_eq!(WasiErrno::Success.as_i32(), 0);
        assert_eq!(WasiErrno::BadF.as_i32(), 8);
        assert_eq!(WasiErrno::Io.as_i32(), 29);
    }
}
