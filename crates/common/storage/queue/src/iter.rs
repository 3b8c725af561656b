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

//! Snapshot iterator over the live elements, newest first.

use std::iter::FusedIterator;

use tracing::warn;

use crate::{PersistentQueue, codec::Codec};

/// Walks the queue from the newest element to the oldest without consuming.
///
/// The upper bound is the counter at creation time, so elements produced
/// afterwards are never returned. The lower bound is the live pointer: when a
/// consumer catches up with the cursor the iteration ends instead of returning
/// consumed elements.
///
/// Slots whose file cannot be read or decoded are skipped with a warning, so
/// the iterator may yield fewer items than [`len`](PersistentQueue::len).
pub struct Iter<'a, T, C> {
    queue:    &'a PersistentQueue<T, C>,
    /// Id of the next element to return.
    cursor:   u64,
    finished: bool,
}

impl<'a, T, C> Iter<'a, T, C>
where
    C: Codec<T>,
{
    pub(crate) fn new(queue: &'a PersistentQueue<T, C>) -> Self {
        Self {
            cursor: queue.counter(),
            queue,
            finished: false,
        }
    }
}

impl<T, C> Iterator for Iter<'_, T, C>
where
    C: Codec<T>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        while !self.finished {
            let id = self.cursor;
            if id <= self.queue.pointer() {
                self.finished = true;
                break;
            }

            match self.queue.get(id) {
                Ok(element) => {
                    self.cursor -= 1;
                    return Some(element);
                }
                Err(e) if e.is_not_found() => self.finished = true,
                Err(e) => {
                    warn!(id, error = ?e, "Skipping unreadable queue element");
                    self.cursor -= 1;
                }
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            return (0, Some(0));
        }
        let remaining = self.cursor.saturating_sub(self.queue.pointer());
        (0, usize::try_from(remaining).ok())
    }
}

impl<T, C> FusedIterator for Iter<'_, T, C> where C: Codec<T> {}
