use std::{borrow::Cow, fmt, str};

/// Returns the part of `bytes` before the first NUL, or all of it if there is none
#[must_use]
pub fn until_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|v| *v == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}

/// A NUL-padded string stored in a u8 array of a fixed size, as found in signed structures
#[derive(Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct SizedCString<const SIZE: usize>([u8; SIZE]);

impl<const SIZE: usize> SizedCString<SIZE> {
    /// Returns the string up to the first NUL, or str::Utf8Error if it's not valid UTF-8 data
    /// <https://doc.rust-lang.org/std/str/fn.from_utf8.html>
    pub fn as_str(&self) -> Result<&str, str::Utf8Error> {
        str::from_utf8(until_nul(&self.0))
    }
    /// Converts to a string, replacing invalid UTF-8 sequences with replacement character
    /// <https://doc.rust-lang.org/std/string/struct.String.html#method.from_utf8_lossy>
    #[must_use]
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(until_nul(&self.0))
    }
    /// Checks if string inside this struct is all zeroes
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0)
    }
    /// Returns a reference to data stored inside, padding included
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.0
    }
}

impl<const SIZE: usize> From<[u8; SIZE]> for SizedCString<SIZE> {
    fn from(other: [u8; SIZE]) -> SizedCString<SIZE> {
        SizedCString(other)
    }
}

impl<const SIZE: usize> fmt::Debug for SizedCString<SIZE> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_fmt(format_args!("\"{}\"", self.to_string_lossy()))
    }
}
