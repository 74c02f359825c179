//! In-memory byte buffers behind opaque URL-like handles.
//!
//! Stands in for the browser's object-URL allocator: callers store encoded
//! bytes and get back a cheap handle usable as an image source or download
//! target. Unlike the browser, revocation is explicit. The panel revokes a
//! handle as soon as it is replaced so repeated compressions do not pile up
//! dead buffers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Handle to a buffer held by a [`BlobStore`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobUrl(u64);

impl fmt::Display for BlobUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:imagesqueeze/{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct BlobStore {
    next_id: u64,
    entries: HashMap<u64, Arc<Vec<u8>>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bytes` and hand out a fresh handle.
    pub fn create(&mut self, bytes: Vec<u8>) -> BlobUrl {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, Arc::new(bytes));
        BlobUrl(id)
    }

    pub fn get(&self, url: &BlobUrl) -> Option<Arc<Vec<u8>>> {
        self.entries.get(&url.0).cloned()
    }

    /// Drop the buffer behind `url`. Returns false if it was already gone.
    pub fn revoke(&mut self, url: &BlobUrl) -> bool {
        self.entries.remove(&url.0).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_get_round_trips() {
        let mut store = BlobStore::new();
        let url = store.create(vec![1, 2, 3]);
        assert_eq!(store.get(&url).unwrap().as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn handles_are_distinct() {
        let mut store = BlobStore::new();
        let a = store.create(vec![0]);
        let b = store.create(vec![0]);
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn revoke_drops_the_buffer() {
        let mut store = BlobStore::new();
        let url = store.create(vec![9]);
        assert!(store.revoke(&url));
        assert!(store.get(&url).is_none());
        assert!(!store.revoke(&url));
        assert!(store.is_empty());
    }

    #[test]
    fn display_is_url_shaped() {
        let mut store = BlobStore::new();
        let url = store.create(Vec::new());
        assert!(url.to_string().starts_with("blob:imagesqueeze/"));
    }
}
