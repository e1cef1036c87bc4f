use bytes::Bytes;

/// Raw storage for one decoded result row: per column, either NULL or the
/// still-encoded value bytes. Kept as cheap `Bytes` slices of the original
/// packet; interpretation happens lazily in [`MySqlRow`][crate::MySqlRow].
#[derive(Debug)]
pub(crate) struct Row {
    pub(crate) values: Vec<Option<Bytes>>,
}

impl Row {
    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Bytes> {
        self.values.get(index).and_then(Option::as_ref)
    }
}
