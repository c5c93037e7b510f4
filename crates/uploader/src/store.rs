//! Copy-on-write file collection.
//!
//! The collection is published as immutable snapshots through a
//! `tokio::sync::watch` channel. Writers build a new vector and swap it in
//! while holding the channel's write lock, so readers see either the old or
//! the new collection, never a mix, and concurrent writers cannot lose
//! each other's updates.

use std::sync::Arc;

use docdrop_transfer::FileDescriptor;
use tokio::sync::watch;

/// Immutable view of the collection at one point in time.
pub type Snapshot = Arc<Vec<FileDescriptor>>;

/// Shared, ordered collection of file descriptors.
#[derive(Debug, Clone)]
pub struct FileStore {
    tx: Arc<watch::Sender<Snapshot>>,
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FileStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Vec::new()));
        Self { tx: Arc::new(tx) }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.tx.borrow())
    }

    /// Receiver notified on every published change.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    pub fn get(&self, id: &str) -> Option<FileDescriptor> {
        self.tx.borrow().iter().find(|f| f.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    /// Runs `f` against the current collection under the write lock.
    ///
    /// If `f` returns a new collection it replaces the current one and
    /// subscribers are notified; `None` leaves the collection untouched.
    pub fn transact<R>(
        &self,
        f: impl FnOnce(&[FileDescriptor]) -> (Option<Vec<FileDescriptor>>, R),
    ) -> R {
        let mut out = None;
        self.tx.send_if_modified(|current| {
            let (next, result) = f(current);
            out = Some(result);
            match next {
                Some(next) => {
                    *current = Arc::new(next);
                    true
                }
                None => false,
            }
        });
        match out {
            Some(result) => result,
            None => unreachable!("send_if_modified always runs its closure"),
        }
    }

    /// Replaces the entry with `id` by `f(entry)`. Returns the new entry.
    pub fn update(
        &self,
        id: &str,
        f: impl FnOnce(&FileDescriptor) -> FileDescriptor,
    ) -> Option<FileDescriptor> {
        self.transact(|files| {
            let Some(pos) = files.iter().position(|d| d.id == id) else {
                return (None, None);
            };
            let updated = f(&files[pos]);
            if updated == files[pos] {
                return (None, Some(updated));
            }
            let mut next = files.to_vec();
            next[pos] = updated.clone();
            (Some(next), Some(updated))
        })
    }

    /// Appends descriptors at the end, preserving their order.
    pub fn append(&self, added: Vec<FileDescriptor>) {
        if added.is_empty() {
            return;
        }
        self.transact(|files| {
            let mut next = files.to_vec();
            next.extend(added);
            (Some(next), ())
        })
    }

    /// Removes the entry with `id`, returning it.
    pub fn remove(&self, id: &str) -> Option<FileDescriptor> {
        self.transact(|files| {
            let Some(pos) = files.iter().position(|d| d.id == id) else {
                return (None, None);
            };
            let mut next = files.to_vec();
            let removed = next.remove(pos);
            (Some(next), Some(removed))
        })
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.tx.send_replace(Arc::new(Vec::new()));
    }
}
