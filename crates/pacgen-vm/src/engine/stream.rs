//! Incrementally supplied input.

/// Append-only input buffer.
///
/// Positions are absolute offsets from the first byte ever appended. Once
/// frozen, no more bytes arrive: insufficient input becomes final.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stream {
    data: Vec<u8>,
    frozen: bool,
}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    /// A frozen stream holding all of `bytes`.
    pub fn complete(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            data: bytes.into(),
            frozen: true,
        }
    }

    /// # Panics
    /// If the stream is frozen.
    pub fn append(&mut self, bytes: &[u8]) {
        assert!(!self.frozen, "append to a frozen stream");
        self.data.extend_from_slice(bytes);
    }

    /// Mark the end of data.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Bytes from `position` to the end of what has arrived so far.
    pub fn remaining(&self, position: usize) -> &[u8] {
        self.data.get(position..).unwrap_or_default()
    }

    /// Bytes in `start..end`, clamped to what has arrived.
    pub fn slice(&self, start: usize, end: usize) -> &[u8] {
        let end = end.min(self.data.len());
        self.data.get(start..end).unwrap_or_default()
    }

    /// Whether `position` is the final end of data.
    pub fn at_end(&self, position: usize) -> bool {
        self.frozen && position >= self.data.len()
    }
}
