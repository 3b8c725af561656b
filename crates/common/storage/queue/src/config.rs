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

use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use snafu::ensure;

use crate::{Result, error::InvalidPrefixSnafu};

/// Prefix used for element file names when none is configured.
pub const DEFAULT_FILENAME_PREFIX: &str = "element";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SmartDefault)]
#[serde(default)]
pub struct QueueConfig {
    /// Directory holding the element files. Created if absent.
    #[default(_code = "PathBuf::from(\"./queue_data\")")]
    pub base_path:       PathBuf,
    /// File names are `<filename_prefix>_<id>.obj`.
    #[default(_code = "DEFAULT_FILENAME_PREFIX.to_string()")]
    pub filename_prefix: String,
    pub gap_policy:      GapPolicy,
    /// `fsync` every element file before the element becomes visible.
    pub sync_writes:     bool,
    /// Append a CRC-32 trailer to every element file.
    pub checksum:        bool,
}

impl QueueConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        let prefix = &self.filename_prefix;
        ensure!(
            !prefix.is_empty() && !prefix.contains(['/', '\\']) && prefix != "." && prefix != "..",
            InvalidPrefixSnafu {
                prefix: prefix.clone(),
            }
        );
        Ok(())
    }
}

/// What recovery does when the element ids on disk have holes.
///
/// A failed best-effort [`offer`](crate::PersistentQueue::offer) leaves such a
/// hole behind, so holes are tolerated unless asked otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Refuse to open the queue.
    Reject,
    /// Open anyway; missing slots are discarded when consumed.
    #[default]
    Tolerate,
}
