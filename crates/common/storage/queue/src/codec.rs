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

//! Element serialization.
//!
//! A [`Codec`] turns exactly one element into bytes and back. It knows nothing
//! about files or sequence numbers; the queue stores whatever bytes the codec
//! produces as the content of one element file.

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    Result,
    error::{DecodeSnafu, EncodeSnafu},
};

/// Pluggable serialize/deserialize capability for one queue element.
pub trait Codec<T>: Send + Sync {
    /// Serializes `element` into a standalone byte buffer.
    fn encode(&self, element: &T) -> Result<Vec<u8>>;

    /// Deserializes an element from the full content of one element file.
    fn decode(&self, bytes: &[u8]) -> Result<T>;
}

/// Compact binary codec backed by bincode's serde bridge.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl<T> Codec<T> for BincodeCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, element: &T) -> Result<Vec<u8>> {
        bincode::serde::encode_to_vec(element, bincode::config::standard()).map_err(|e| {
            EncodeSnafu {
                message: e.to_string(),
            }
            .build()
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        let (element, read) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard()).map_err(
                |e| {
                    DecodeSnafu {
                        message: e.to_string(),
                    }
                    .build()
                },
            )?;

        snafu::ensure!(
            read == bytes.len(),
            DecodeSnafu {
                message: format!("{} trailing byte(s) after element", bytes.len() - read),
            }
        );

        Ok(element)
    }
}

/// Human-readable codec backed by serde_json.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T> Codec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, element: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(element).map_err(|e| {
            EncodeSnafu {
                message: e.to_string(),
            }
            .build()
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| {
            DecodeSnafu {
                message: e.to_string(),
            }
            .build()
        })
    }
}
