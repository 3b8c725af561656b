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

use std::path::PathBuf;

use crate::{BincodeCodec, Codec, GapPolicy, PersistentQueue, QueueConfig, Result};

pub struct QueueBuilder {
    config: QueueConfig,
}

impl QueueBuilder {
    pub fn new<P: Into<PathBuf>>(base_path: P) -> Self {
        Self {
            config: QueueConfig {
                base_path: base_path.into(),
                ..Default::default()
            },
        }
    }

    /// Start from a full configuration, e.g. one loaded with serde.
    pub const fn from_config(config: QueueConfig) -> Self { Self { config } }

    pub fn filename_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.filename_prefix = prefix.into();
        self
    }

    pub fn gap_policy(mut self, policy: GapPolicy) -> Self {
        self.config.gap_policy = policy;
        self
    }

    pub fn sync_writes(mut self, sync: bool) -> Self {
        self.config.sync_writes = sync;
        self
    }

    pub fn checksum(mut self, checksum: bool) -> Self {
        self.config.checksum = checksum;
        self
    }

    /// Open the queue with the default bincode codec.
    pub fn build<T>(self) -> Result<PersistentQueue<T>>
    where
        BincodeCodec: Codec<T>,
    {
        self.build_with_codec(BincodeCodec)
    }

    pub fn build_with_codec<T, C>(self, codec: C) -> Result<PersistentQueue<T, C>>
    where
        C: Codec<T>,
    {
        PersistentQueue::new(self.config, codec)
    }
}
