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

use std::{io, path::PathBuf};

use snafu::Snafu;

/// Queue operation errors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum QueueError {
    /// `remove` or `element` was called on an empty queue.
    #[snafu(display("Queue is empty"))]
    Empty,

    /// Requested id is not a live element.
    #[snafu(display("Element {id} is not in the queue (pointer {pointer}, counter {counter})"))]
    OutOfRange { id: u64, pointer: u64, counter: u64 },

    /// The slot exists but its file could not be read or decoded.
    #[snafu(display("Element {id} could not be read"))]
    Unreadable { id: u64 },

    /// Bulk collection operation that this queue does not support.
    #[snafu(display("Operation `{operation}` is not supported by the persistent queue"))]
    Unsupported { operation: &'static str },

    /// Counter is already at the largest id, nothing more can be produced.
    #[snafu(display("Element ids exhausted at counter {counter}"))]
    IdExhausted { counter: u64 },

    /// Element files found during recovery do not form one contiguous range.
    #[snafu(display(
        "Non-contiguous element files: ids {first}..={last} but only {found} file(s) present"
    ))]
    NonContiguous { first: u64, last: u64, found: u64 },

    /// Base path exists but cannot hold a queue.
    #[snafu(display("Invalid queue path: {}", path.display()))]
    InvalidPath { path: PathBuf },

    /// Prefix would produce file names outside the queue directory.
    #[snafu(display("Invalid filename prefix: {prefix:?}"))]
    InvalidPrefix { prefix: String },

    #[snafu(display("Failed to create queue directory {}", path.display()))]
    CreateDir {
        path:   PathBuf,
        source: io::Error,
        #[snafu(implicit)]
        loc:    snafu::Location,
    },

    #[snafu(display("Failed to remove queue directory {}", path.display()))]
    RemoveDir {
        path:   PathBuf,
        source: io::Error,
        #[snafu(implicit)]
        loc:    snafu::Location,
    },

    #[snafu(display("Failed to list queue directory {}", path.display()))]
    ReadDir {
        path:   PathBuf,
        source: io::Error,
        #[snafu(implicit)]
        loc:    snafu::Location,
    },

    #[snafu(display("Failed to write element file {}", path.display()))]
    WriteElement {
        path:   PathBuf,
        source: io::Error,
        #[snafu(implicit)]
        loc:    snafu::Location,
    },

    #[snafu(display("Failed to read element file {}", path.display()))]
    ReadElement {
        path:   PathBuf,
        source: io::Error,
        #[snafu(implicit)]
        loc:    snafu::Location,
    },

    /// Codec could not serialize the element.
    #[snafu(display("Failed to encode element: {message}"))]
    Encode { message: String },

    /// Codec could not deserialize the element.
    #[snafu(display("Failed to decode element: {message}"))]
    Decode { message: String },

    /// CRC trailer does not match the payload.
    #[snafu(display("Checksum mismatch in element file {}", path.display()))]
    ChecksumMismatch { path: PathBuf },

    /// File is too short to carry a CRC trailer.
    #[snafu(display("Element file {} is truncated", path.display()))]
    Truncated { path: PathBuf },
}

impl QueueError {
    /// Returns `true` for the not-found family: empty queue or an id outside
    /// the live range.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Empty | Self::OutOfRange { .. })
    }
}

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;
