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

//! Element file operations: one file per live queue element.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use snafu::ResultExt;
use tracing::{debug, warn};

use crate::{
    QueueConfig, Result,
    codec::Codec,
    crc::{CrcCheck, append_crc, split_crc},
    error::{ChecksumMismatchSnafu, ReadElementSnafu, TruncatedSnafu, WriteElementSnafu},
    path::element_file_path,
};

/// Reads, writes and deletes element files inside the queue directory.
///
/// Holds no sequence state; callers decide which id to touch.
pub(crate) struct ElementStore<C> {
    base_path:   PathBuf,
    prefix:      String,
    codec:       C,
    sync_writes: bool,
    checksum:    bool,
}

impl<C> ElementStore<C> {
    pub(crate) fn new(config: &QueueConfig, codec: C) -> Self {
        Self {
            base_path: config.base_path.clone(),
            prefix: config.filename_prefix.clone(),
            codec,
            sync_writes: config.sync_writes,
            checksum: config.checksum,
        }
    }

    pub(crate) fn base_path(&self) -> &Path { &self.base_path }

    pub(crate) fn path(&self, id: u64) -> PathBuf {
        element_file_path(&self.base_path, &self.prefix, id)
    }

    /// Serializes `element` into the file for `id`, replacing any previous
    /// content.
    pub(crate) fn write<T>(&self, id: u64, element: &T) -> Result<()>
    where
        C: Codec<T>,
    {
        let mut bytes = self.codec.encode(element)?;
        if self.checksum {
            bytes = append_crc(bytes);
        }

        let path = self.path(id);
        write_file(&path, &bytes, self.sync_writes).context(WriteElementSnafu { path: &path })?;

        debug!(id, path = ?path, bytes = bytes.len(), "Wrote queue element");
        Ok(())
    }

    /// Reads and decodes the file for `id`.
    pub(crate) fn read<T>(&self, id: u64) -> Result<T>
    where
        C: Codec<T>,
    {
        let path = self.path(id);
        let bytes = std::fs::read(&path).context(ReadElementSnafu { path: &path })?;

        let payload = if self.checksum {
            match split_crc(&bytes) {
                CrcCheck::Valid(payload) => payload,
                CrcCheck::Mismatch => return ChecksumMismatchSnafu { path }.fail(),
                CrcCheck::Truncated => return TruncatedSnafu { path }.fail(),
            }
        } else {
            bytes.as_slice()
        };

        let element = self.codec.decode(payload)?;
        debug!(id, path = ?path, "Read queue element");
        Ok(element)
    }

    /// Deletes the file for `id`. A missing file is not an error.
    pub(crate) fn remove(&self, id: u64) {
        let path = self.path(id);
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(id, path = ?path, error = %e, "Failed to delete queue element"),
        }
    }
}

fn write_file(path: &Path, bytes: &[u8], sync: bool) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(bytes)?;
    let file = writer.into_inner().map_err(io::IntoInnerError::into_error)?;
    if sync {
        file.sync_all()?;
    }
    Ok(())
}
