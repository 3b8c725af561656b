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

//! Durable FIFO queue that keeps every element in its own file.
//!
//! Elements are written to `<dir>/<prefix>_<id>.obj` as they are produced and
//! the file is deleted when the element is consumed. On startup the directory
//! listing alone is enough to restore the queue.

pub mod builder;
pub mod codec;
pub mod config;
mod crc;
pub mod error;
mod file;
pub mod iter;
pub mod path;
pub mod queue;
pub mod recovery;

pub use builder::QueueBuilder;
pub use codec::{BincodeCodec, Codec, JsonCodec};
pub use config::{GapPolicy, QueueConfig};
pub use error::{QueueError, Result};
pub use iter::Iter;
pub use queue::PersistentQueue;
pub use recovery::RecoveryInfo;
