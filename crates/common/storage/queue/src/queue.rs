// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Main queue struct and the produce/consume bookkeeping.
//!
//! The [`PersistentQueue`] keeps two numbers in memory:
//! - `counter`: id of the most recently produced element
//! - `pointer`: id of the most recently consumed element
//!
//! Every id in `(pointer, counter]` has an element file on disk. Producers
//! only move `counter`, consumers only move `pointer`, and each side has its
//! own lock, so producers never wait on consumers and vice versa.
//!
//! ## Usage
//!
//! ```no_run
//! use pqueue_common_storage_queue::{PersistentQueue, QueueBuilder};
//!
//! # fn main() -> pqueue_common_storage_queue::Result<()> {
//! let queue: PersistentQueue<String> = QueueBuilder::new("/path/to/queue").build()?;
//!
//! queue.offer("hello".to_string());
//! assert_eq!(queue.poll().as_deref(), Some("hello"));
//! # Ok(())
//! # }
//! ```

use std::{
    io,
    marker::PhantomData,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};
use snafu::{OptionExt, ResultExt, ensure};
use tracing::{error, info};

use crate::{
    QueueBuilder, QueueConfig, Result,
    codec::{BincodeCodec, Codec},
    error::{
        CreateDirSnafu, IdExhaustedSnafu, OutOfRangeSnafu, QueueError, RemoveDirSnafu,
        UnsupportedSnafu,
    },
    file::ElementStore,
    iter::Iter,
    recovery::{self, RecoveryInfo},
};

/// A durable FIFO queue storing one file per element.
///
/// The queue is `Send + Sync`; share it between producer and consumer threads
/// with an `Arc`. Two instances must never point at the same directory.
pub struct PersistentQueue<T, C = BincodeCodec> {
    config:       QueueConfig,
    store:        ElementStore<C>,
    /// Id of the last produced element. Published with `Release` once the
    /// element file is fully written.
    counter:      AtomicU64,
    /// Id of the last consumed element. Always `<= counter`.
    pointer:      AtomicU64,
    produce_lock: Mutex<()>,
    consume_lock: Mutex<()>,
    _element:     PhantomData<fn(T) -> T>,
}

/// Result of looking at the head of the queue.
enum Slot<T> {
    Empty,
    Element(T),
    Unreadable(u64),
}

impl<T> Slot<T> {
    fn into_option(self) -> Option<T> {
        match self {
            Self::Element(element) => Some(element),
            Self::Empty | Self::Unreadable(_) => None,
        }
    }

    fn into_result(self) -> Result<T> {
        match self {
            Self::Element(element) => Ok(element),
            Self::Empty => Err(QueueError::Empty),
            Self::Unreadable(id) => Err(QueueError::Unreadable { id }),
        }
    }
}

impl<T> PersistentQueue<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Opens (or creates) a queue at `base_path` with default settings and
    /// the bincode codec.
    pub fn open<P: Into<PathBuf>>(base_path: P) -> Result<Self> {
        QueueBuilder::new(base_path).build()
    }
}

impl<T, C> PersistentQueue<T, C>
where
    C: Codec<T>,
{
    /// Create a queue instance from a validated configuration.
    ///
    /// If the directory exists, its element files are scanned to restore
    /// counter and pointer. Otherwise, the directory is created.
    pub(crate) fn new(config: QueueConfig, codec: C) -> Result<Self> {
        config.validate()?;

        let RecoveryInfo {
            counter, pointer, ..
        } = recovery::recover(&config)?;
        let store = ElementStore::new(&config, codec);

        info!(
            path = ?config.base_path,
            prefix = %config.filename_prefix,
            counter,
            pointer,
            "Queue initialized"
        );

        Ok(Self {
            config,
            store,
            counter: AtomicU64::new(counter),
            pointer: AtomicU64::new(pointer),
            produce_lock: Mutex::new(()),
            consume_lock: Mutex::new(()),
            _element: PhantomData,
        })
    }

    // ------------------------------------------------------------------
    // Produce
    // ------------------------------------------------------------------

    /// Append an element to the tail of the queue and return its id.
    ///
    /// Durability is best-effort: if the element file cannot be written the
    /// failure is logged and the id is still assigned, so the slot will read
    /// back as unreadable. Use [`try_offer`](Self::try_offer) to surface
    /// write failures instead.
    ///
    /// Returns `0`, which is never a valid id, if the counter is already at
    /// `u64::MAX`; the element is dropped and the counter stays put.
    pub fn offer(&self, element: T) -> u64 {
        let _guard = self.produce_lock.lock();

        let id = match self.next_produce_id() {
            Ok(id) => id,
            Err(e) => {
                error!(error = ?e, "Refusing to produce queue element");
                return 0;
            }
        };
        if let Err(e) = self.store.write(id, &element) {
            error!(id, error = ?e, "Unable to persist queue element");
        }

        self.counter.store(id, Ordering::Release);
        id
    }

    /// Same as [`offer`](Self::offer).
    pub fn add(&self, element: T) -> u64 { self.offer(element) }

    /// Append an element only if its file was written successfully.
    ///
    /// On failure the counter is left untouched, so the id is reused by the
    /// next produce.
    ///
    /// # Errors
    ///
    /// [`QueueError::IdExhausted`] once the counter is at `u64::MAX`, or the
    /// write error of the element file.
    pub fn try_offer(&self, element: T) -> Result<u64> {
        let _guard = self.produce_lock.lock();

        let id = self.next_produce_id()?;
        if let Err(e) = self.store.write(id, &element) {
            self.store.remove(id);
            return Err(e);
        }

        self.counter.store(id, Ordering::Release);
        Ok(id)
    }

    /// Offer every item in order and return the assigned ids.
    ///
    /// Not atomic: other producers may interleave between items.
    pub fn add_all<I>(&self, items: I) -> Vec<u64>
    where
        I: IntoIterator<Item = T>,
    {
        items.into_iter().map(|element| self.offer(element)).collect()
    }

    /// Id for the next produce. Caller must hold `produce_lock`.
    fn next_produce_id(&self) -> Result<u64> {
        let counter = self.counter.load(Ordering::Relaxed);
        counter.checked_add(1).context(IdExhaustedSnafu { counter })
    }

    // ------------------------------------------------------------------
    // Consume
    // ------------------------------------------------------------------

    /// Remove and return the head of the queue, or `None` if it is empty.
    ///
    /// A head that cannot be read is still consumed; it is logged and `None`
    /// is returned in its place.
    pub fn poll(&self) -> Option<T> { self.take_next().into_option() }

    /// Remove and return the head of the queue.
    ///
    /// # Errors
    ///
    /// [`QueueError::Empty`] when there is nothing to consume and
    /// [`QueueError::Unreadable`] when the consumed slot could not be read.
    pub fn remove(&self) -> Result<T> { self.take_next().into_result() }

    /// Return the head of the queue without consuming it.
    pub fn peek(&self) -> Option<T> { self.read_next().into_option() }

    /// Return the head of the queue without consuming it.
    ///
    /// # Errors
    ///
    /// Same as [`remove`](Self::remove).
    pub fn element(&self) -> Result<T> { self.read_next().into_result() }

    /// Read the live element with the given id.
    ///
    /// # Errors
    ///
    /// [`QueueError::OutOfRange`] unless `pointer < id <= counter`, or the
    /// underlying read error if the file cannot be decoded.
    pub fn get(&self, id: u64) -> Result<T> {
        let _guard = self.consume_lock.lock();

        let pointer = self.pointer.load(Ordering::Relaxed);
        let counter = self.counter.load(Ordering::Acquire);
        ensure!(
            id > pointer && id <= counter,
            OutOfRangeSnafu {
                id,
                pointer,
                counter,
            }
        );

        self.store.read(id)
    }

    fn take_next(&self) -> Slot<T> {
        let _guard = self.consume_lock.lock();

        let Some(id) = self.next_id() else {
            return Slot::Empty;
        };
        let slot = self.read_slot(id);
        self.store.remove(id);
        self.pointer.store(id, Ordering::Release);

        if let Slot::Unreadable(id) = slot {
            error!(id, "Discarded unreadable queue element");
        }
        slot
    }

    fn read_next(&self) -> Slot<T> {
        let _guard = self.consume_lock.lock();

        match self.next_id() {
            Some(id) => self.read_slot(id),
            None => Slot::Empty,
        }
    }

    /// Id of the head element. Caller must hold `consume_lock`.
    fn next_id(&self) -> Option<u64> {
        let pointer = self.pointer.load(Ordering::Relaxed);
        (pointer < self.counter.load(Ordering::Acquire)).then(|| pointer + 1)
    }

    fn read_slot(&self, id: u64) -> Slot<T> {
        match self.store.read(id) {
            Ok(element) => Slot::Element(element),
            Err(e) => {
                error!(id, error = ?e, "Unable to read queue element");
                Slot::Unreadable(id)
            }
        }
    }

    // ------------------------------------------------------------------
    // Whole-queue operations
    // ------------------------------------------------------------------

    /// Delete every element and restart numbering at 1.
    ///
    /// The whole queue directory is removed and recreated, including any
    /// unrelated files it contains.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be removed or recreated.
    pub fn clear(&self) -> Result<()> {
        let _produce = self.produce_lock.lock();
        let _consume = self.consume_lock.lock();

        let base_path = self.store.base_path();
        match std::fs::remove_dir_all(base_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).context(RemoveDirSnafu { path: base_path }),
        }

        self.pointer.store(0, Ordering::Release);
        self.counter.store(0, Ordering::Release);

        std::fs::create_dir_all(base_path).context(CreateDirSnafu { path: base_path })?;

        info!(path = ?base_path, "Queue cleared");
        Ok(())
    }

    /// Snapshot iterator from the newest element to the oldest.
    ///
    /// See [`Iter`] for how it reacts to concurrent consumers.
    pub fn iter(&self) -> Iter<'_, T, C> { Iter::new(self) }
}

impl<T, C> PersistentQueue<T, C> {
    /// Number of live elements: `counter - pointer`.
    #[must_use]
    pub fn len(&self) -> u64 {
        let pointer = self.pointer.load(Ordering::Acquire);
        let counter = self.counter.load(Ordering::Acquire);
        counter.saturating_sub(pointer)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Id of the most recently produced element, 0 if none.
    #[must_use]
    pub fn counter(&self) -> u64 { self.counter.load(Ordering::Acquire) }

    /// Id of the most recently consumed element, 0 if none.
    #[must_use]
    pub fn pointer(&self) -> u64 { self.pointer.load(Ordering::Acquire) }

    #[must_use]
    pub const fn config(&self) -> &QueueConfig { &self.config }

    /// Directory holding the element files.
    #[must_use]
    pub fn path(&self) -> &Path { &self.config.base_path }
}

// ----------------------------------------------------------------------
// Unsupported collection operations
//
// Random access removal and membership tests would require reading every
// element file. They fail unconditionally, whatever the queue holds.
// ----------------------------------------------------------------------

impl<T, C> PersistentQueue<T, C> {
    pub fn contains(&self, _element: &T) -> Result<bool> {
        UnsupportedSnafu {
            operation: "contains",
        }
        .fail()
    }

    pub fn to_vec(&self) -> Result<Vec<T>> {
        UnsupportedSnafu {
            operation: "to_vec",
        }
        .fail()
    }

    pub fn remove_item(&self, _element: &T) -> Result<bool> {
        UnsupportedSnafu {
            operation: "remove_item",
        }
        .fail()
    }

    pub fn contains_all<'a, I>(&self, _items: I) -> Result<bool>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        UnsupportedSnafu {
            operation: "contains_all",
        }
        .fail()
    }

    pub fn remove_all<'a, I>(&self, _items: I) -> Result<bool>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        UnsupportedSnafu {
            operation: "remove_all",
        }
        .fail()
    }

    pub fn retain_all<'a, I>(&self, _items: I) -> Result<bool>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        UnsupportedSnafu {
            operation: "retain_all",
        }
        .fail()
    }
}

impl<'a, T, C> IntoIterator for &'a PersistentQueue<T, C>
where
    C: Codec<T>,
{
    type IntoIter = Iter<'a, T, C>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

impl<T, C> std::fmt::Debug for PersistentQueue<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentQueue")
            .field("path", &self.config.base_path)
            .field("prefix", &self.config.filename_prefix)
            .field("counter", &self.counter())
            .field("pointer", &self.pointer())
            .finish_non_exhaustive()
    }
}
