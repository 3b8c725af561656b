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

//! Element file naming: `<prefix>_<id>.obj`.

use std::path::{Path, PathBuf};

use snafu::ResultExt;
use tracing::debug;

use crate::{Result, error::ReadDirSnafu};

/// Extension carried by every element file.
pub const ELEMENT_FILE_EXTENSION: &str = "obj";

/// Generates an element file name: `<prefix>_<id>.obj`.
pub fn element_file_name(prefix: &str, id: u64) -> String {
    format!("{prefix}_{id}.{ELEMENT_FILE_EXTENSION}")
}

/// Returns full path to an element file: `base/<prefix>_<id>.obj`.
pub fn element_file_path<P: AsRef<Path>>(base: P, prefix: &str, id: u64) -> PathBuf {
    base.as_ref().join(element_file_name(prefix, id))
}

/// Extracts the id from a file name produced by [`element_file_name`].
///
/// Only canonical names match: decimal digits, no leading zeros, id > 0.
pub fn parse_element_id(prefix: &str, file_name: &str) -> Option<u64> {
    let digits = file_name
        .strip_prefix(prefix)?
        .strip_prefix('_')?
        .strip_suffix(ELEMENT_FILE_EXTENSION)?
        .strip_suffix('.')?;

    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    digits.parse().ok()
}

/// Lists the ids of all element files directly under `base`.
///
/// Sub-directories and unrelated files are skipped. The result is unsorted.
pub fn scan_element_ids<P: AsRef<Path>>(base: P, prefix: &str) -> Result<Vec<u64>> {
    let base = base.as_ref();
    let mut ids = Vec::new();

    let entries = std::fs::read_dir(base).context(ReadDirSnafu { path: base })?;
    for entry in entries {
        let entry = entry.context(ReadDirSnafu { path: base })?;
        let file_type = entry.file_type().context(ReadDirSnafu { path: base })?;
        if !file_type.is_file() {
            continue;
        }

        let file_name = entry.file_name();
        match file_name.to_str().and_then(|name| parse_element_id(prefix, name)) {
            Some(id) => ids.push(id),
            None => debug!(file = ?file_name, "Skipping non-element file"),
        }
    }

    Ok(ids)
}
