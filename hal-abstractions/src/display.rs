//! Character display sink

/// A row/column addressed character display (e.g. HD44780 16x2)
///
/// Text that runs past the end of a row is truncated by the implementor.
#[allow(async_fn_in_trait)]
pub trait DisplaySink {
    /// Blank the whole display and home the cursor
    async fn clear(&mut self);

    /// Write `text` starting at `row`, `col` (both zero-based)
    async fn write_at(&mut self, row: u8, col: u8, text: &str);
}

impl<T: DisplaySink + ?Sized> DisplaySink for &mut T {
    async fn clear(&mut self) {
        T::clear(self).await
    }

    async fn write_at(&mut self, row: u8, col: u8, text: &str) {
        T::write_at(self, row, col, text).await
    }
}
