use thiserror::Error;

/// Errors returned by [`ByteCursor`] reads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("out of bounds at offset {offset}: need {needed} bytes, {remaining} remaining")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
}

/// Bounds-checked little-endian reader over a borrowed byte region.
///
/// Every read consumes exactly its width and advances the position. A read
/// that would cross the end of the region fails without moving the cursor.
///
/// # Examples
/// ```
/// use ppiscope_core::ByteCursor;
///
/// let mut cursor = ByteCursor::new(&[0x01, 0x34, 0x12]);
/// assert_eq!(cursor.read_u8()?, 0x01);
/// assert_eq!(cursor.read_u16_le()?, 0x1234);
/// assert_eq!(cursor.remaining(), 0);
/// assert!(cursor.read_u8().is_err());
/// # Ok::<(), ppiscope_core::CursorError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current offset from the start of the region.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Count of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        let [byte] = self.take::<1>()?;
        Ok(byte)
    }

    pub fn read_u16_le(&mut self) -> Result<u16, CursorError> {
        self.take::<2>().map(u16::from_le_bytes)
    }

    pub fn read_u32_le(&mut self) -> Result<u32, CursorError> {
        self.take::<4>().map(u32::from_le_bytes)
    }

    pub fn read_u64_le(&mut self) -> Result<u64, CursorError> {
        self.take::<8>().map(u64::from_le_bytes)
    }

    pub fn read_i8(&mut self) -> Result<i8, CursorError> {
        self.take::<1>().map(i8::from_le_bytes)
    }

    /// Non-owning view of the next `len` bytes; advances past them.
    pub fn slice(&mut self, len: usize) -> Result<&'a [u8], CursorError> {
        let end = self
            .position
            .checked_add(len)
            .ok_or_else(|| self.out_of_bounds(len))?;
        let bytes = self
            .data
            .get(self.position..end)
            .ok_or_else(|| self.out_of_bounds(len))?;
        self.position = end;
        Ok(bytes)
    }

    /// Advance by `len` bytes without producing a view.
    pub fn skip(&mut self, len: usize) -> Result<(), CursorError> {
        self.slice(len).map(|_| ())
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], CursorError> {
        let bytes = self.slice(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn out_of_bounds(&self, needed: usize) -> CursorError {
        CursorError::OutOfBounds {
            offset: self.position,
            needed,
            remaining: self.remaining(),
        }
    }
}
