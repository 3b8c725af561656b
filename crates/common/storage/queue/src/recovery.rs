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

//! Startup recovery for the persistent queue.
//!
//! There is no manifest: the set of element files is the queue. Recovery
//! lists the directory once and derives the in-memory state from it:
//! 1. `counter` is the highest id on disk
//! 2. `pointer` is the lowest id on disk minus one
//! 3. the ids in between must all be present, otherwise the configured
//!    [`GapPolicy`] decides
//!
//! A missing directory is created and yields an empty queue.

use snafu::{ResultExt, ensure};
use tracing::{info, warn};

use crate::{
    GapPolicy, QueueConfig, Result,
    error::{CreateDirSnafu, InvalidPathSnafu, NonContiguousSnafu},
    path::scan_element_ids,
};

/// State recovered from the element files present at startup.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryInfo {
    /// Highest id ever produced (0 when nothing is on disk).
    pub counter: u64,
    /// Highest id already consumed.
    pub pointer: u64,
    /// Number of element files found.
    pub files:   u64,
}

/// Scan (or create) the queue directory and rebuild counter and pointer.
pub fn recover(config: &QueueConfig) -> Result<RecoveryInfo> {
    let base_path = &config.base_path;

    if !base_path.exists() {
        std::fs::create_dir_all(base_path).context(CreateDirSnafu { path: base_path })?;
        info!(path = ?base_path, "Created queue directory");
        return Ok(RecoveryInfo::default());
    }
    ensure!(base_path.is_dir(), InvalidPathSnafu { path: base_path });

    let ids = scan_element_ids(base_path, &config.filename_prefix)?;
    let info = recover_from_ids(&ids, config.gap_policy)?;

    info!(
        path = ?base_path,
        counter = info.counter,
        pointer = info.pointer,
        files = info.files,
        "Queue recovery complete"
    );
    Ok(info)
}

fn recover_from_ids(ids: &[u64], gap_policy: GapPolicy) -> Result<RecoveryInfo> {
    let (Some(&first), Some(&last)) = (ids.iter().min(), ids.iter().max()) else {
        return Ok(RecoveryInfo::default());
    };

    let found = ids.len() as u64;
    let expected = last - first + 1;

    if found != expected {
        match gap_policy {
            GapPolicy::Reject => {
                return NonContiguousSnafu { first, last, found }.fail();
            }
            GapPolicy::Tolerate => {
                warn!(
                    first,
                    last,
                    found,
                    missing = expected - found,
                    "Element files are not contiguous, missing slots will be discarded"
                );
            }
        }
    }

    Ok(RecoveryInfo {
        counter: last,
        pointer: first - 1,
        files:   found,
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;
    use test_case::test_case;

    use super::*;
    use crate::{QueueError, path::element_file_path};

    fn test_config(base_path: PathBuf) -> QueueConfig {
        QueueConfig {
            base_path,
            ..Default::default()
        }
    }

    fn touch(config: &QueueConfig, ids: &[u64]) {
        for &id in ids {
            std::fs::write(
                element_file_path(&config.base_path, &config.filename_prefix, id),
                b"x",
            )
            .unwrap();
        }
    }

    #[test]
    fn test_recovery_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path().join("nested").join("queue"));

        let info = recover(&config).unwrap();

        assert_eq!(info, RecoveryInfo::default());
        assert!(config.base_path.is_dir());
    }

    #[test]
    fn test_recovery_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path().to_path_buf());

        let info = recover(&config).unwrap();

        assert_eq!(info.counter, 0);
        assert_eq!(info.pointer, 0);
        assert_eq!(info.files, 0);
    }

    #[test]
    fn test_recovery_partially_consumed() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path().to_path_buf());
        touch(&config, &[4, 5, 6, 7]);

        let info = recover(&config).unwrap();

        assert_eq!(info.counter, 7);
        assert_eq!(info.pointer, 3);
        assert_eq!(info.files, 4);
    }

    #[test]
    fn test_recovery_ignores_other_prefixes() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path().to_path_buf());
        touch(&config, &[1, 2]);
        std::fs::write(temp_dir.path().join("audit_9.obj"), b"x").unwrap();

        let info = recover(&config).unwrap();

        assert_eq!(info.counter, 2);
        assert_eq!(info.pointer, 0);
    }

    #[test]
    fn test_recovery_rejects_gap() {
        let temp_dir = TempDir::new().unwrap();
        let config = QueueConfig {
            gap_policy: GapPolicy::Reject,
            ..test_config(temp_dir.path().to_path_buf())
        };
        touch(&config, &[2, 3, 5]);

        let err = recover(&config).unwrap_err();

        assert!(matches!(
            err,
            QueueError::NonContiguous {
                first: 2,
                last:  5,
                found: 3,
            }
        ));
    }

    #[test]
    fn test_recovery_tolerates_gap_by_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path().to_path_buf());
        touch(&config, &[2, 3, 5]);

        let info = recover(&config).unwrap();

        assert_eq!(info.counter, 5);
        assert_eq!(info.pointer, 1);
        assert_eq!(info.files, 3);
    }

    #[test]
    fn test_recovery_rejects_file_as_base_path() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("not-a-dir");
        std::fs::write(&file_path, b"x").unwrap();

        let err = recover(&test_config(file_path)).unwrap_err();

        assert!(matches!(err, QueueError::InvalidPath { .. }));
    }

    #[test_case(&[], 0, 0 ; "no files")]
    #[test_case(&[1], 1, 0 ; "single fresh element")]
    #[test_case(&[9, 7, 8], 9, 6 ; "unsorted listing")]
    #[test_case(&[u64::MAX], u64::MAX, u64::MAX - 1 ; "max id")]
    fn test_recover_from_ids(ids: &[u64], counter: u64, pointer: u64) {
        let info = recover_from_ids(ids, GapPolicy::Reject).unwrap();
        assert_eq!(info.counter, counter);
        assert_eq!(info.pointer, pointer);
        assert_eq!(info.counter - info.pointer, ids.len() as u64);
    }
}
