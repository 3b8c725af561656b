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

//! CRC32 trailer for element files.
//!
//! Uses CRC-32 (IEEE polynomial) via crc32fast. When checksums are enabled an
//! element file is laid out as:
//!
//! ```text
//! ┌──────────────────────┬─────────────────┐
//! │   Payload (variable) │   CRC32 (4B)    │
//! │   codec bytes        │   little-endian │
//! └──────────────────────┴─────────────────┘
//! ```

use crc32fast::Hasher;

/// Size of the CRC32 trailer in bytes.
pub(crate) const CRC_SIZE: usize = 4;

#[inline]
pub(crate) fn calculate_crc(payload: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(payload);
    hasher.finalize()
}

/// Appends the CRC32 of `payload` to it.
pub(crate) fn append_crc(mut payload: Vec<u8>) -> Vec<u8> {
    let crc = calculate_crc(&payload);
    payload.extend_from_slice(&crc.to_le_bytes());
    payload
}

/// Outcome of checking a framed buffer.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CrcCheck<'a> {
    Valid(&'a [u8]),
    Mismatch,
    Truncated,
}

/// Splits the trailer off `framed` and verifies it against the payload.
pub(crate) fn split_crc(framed: &[u8]) -> CrcCheck<'_> {
    let Some(payload_len) = framed.len().checked_sub(CRC_SIZE) else {
        return CrcCheck::Truncated;
    };
    let (payload, trailer) = framed.split_at(payload_len);

    let mut crc_buf = [0u8; CRC_SIZE];
    crc_buf.copy_from_slice(trailer);

    if calculate_crc(payload) == u32::from_le_bytes(crc_buf) {
        CrcCheck::Valid(payload)
    } else {
        CrcCheck::Mismatch
    }
}
