mod cursor;

pub use cursor::{ByteCursor, CursorError};
