// Copyright 2025 jonefeewang@gmail.com
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Keys and values of the `__consumer_offsets` topic.
//!
//! The key starts with an i16 version. Versions 0 and 1 are offset commit
//! keys (group, topic, partition), version 2 is a group metadata key and
//! anything else is unknown to us. Both kinds share the topic, so every
//! record has to be version checked before it is looked at.
//!
//! Value layouts by version:
//!
//! | version | fields                                                        |
//! |---------|---------------------------------------------------------------|
//! | 0, 2    | offset, metadata, commit_timestamp                            |
//! | 1       | offset, metadata, commit_timestamp, expire_timestamp          |
//! | 3       | offset, leader_epoch, metadata, commit_timestamp              |
//! | 4+      | as 3, compact metadata string, trailing tagged fields         |
//!
//! Bytes after the last field of a known version are ignored.

use std::ops::RangeInclusive;

use bytes::{Bytes, BytesMut};

use crate::message::TopicPartition;
use crate::protocol::base::{
    put_empty_tagged_fields, skip_tagged_fields, CompactString, PString, PrimaryType, I16, I32,
    I64,
};
use crate::{AppError, AppResult};

pub const OFFSET_COMMIT_KEY_VERSIONS: RangeInclusive<i16> = 0..=1;
pub const GROUP_METADATA_KEY_VERSION: i16 = 2;
pub const FIRST_FLEXIBLE_VALUE_VERSION: i16 = 4;
pub const NO_LEADER_EPOCH: i32 = -1;
pub const NO_EXPIRE_TIMESTAMP: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetCommitKey {
    pub version: i16,
    pub group: String,
    pub topic: String,
    pub partition: i32,
}

impl OffsetCommitKey {
    pub fn new(group: impl Into<String>, topic: impl Into<String>, partition: i32) -> Self {
        Self {
            version: 1,
            group: group.into(),
            topic: topic.into(),
            partition,
        }
    }

    pub fn decode(bytes: &[u8]) -> AppResult<Self> {
        let mut buffer = BytesMut::from(bytes);
        let version = I16::decode(&mut buffer)?.value;
        if !OFFSET_COMMIT_KEY_VERSIONS.contains(&version) {
            return Err(AppError::UnsupportedVersion(version));
        }
        let group = PString::decode(&mut buffer)?.value;
        let topic = PString::decode(&mut buffer)?.value;
        let partition = I32::decode(&mut buffer)?.value;
        if partition < 0 {
            return Err(AppError::MalformedProtocol(format!(
                "negative partition {} in offset commit key",
                partition
            )));
        }

        Ok(Self {
            version,
            group,
            topic,
            partition,
        })
    }

    pub fn encode(&self) -> Bytes {
        let mut writer = BytesMut::with_capacity(self.wire_format_size());
        I16::from(self.version).encode(&mut writer);
        PString::from(self.group.clone()).encode(&mut writer);
        PString::from(self.topic.clone()).encode(&mut writer);
        I32::from(self.partition).encode(&mut writer);
        writer.freeze()
    }

    pub fn wire_format_size(&self) -> usize {
        2 + 2 + self.group.len() + 2 + self.topic.len() + 4
    }

    pub fn topic_partition(&self) -> TopicPartition {
        TopicPartition::new(self.topic.clone(), self.partition)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetCommitValue {
    pub version: i16,
    pub offset: i64,
    pub leader_epoch: i32,
    pub metadata: String,
    /// Epoch milliseconds, as recorded by the committing consumer.
    pub commit_timestamp: i64,
    pub expire_timestamp: i64,
}

impl OffsetCommitValue {
    pub fn new(offset: i64, metadata: impl Into<String>, commit_timestamp: i64) -> Self {
        Self {
            version: 3,
            offset,
            leader_epoch: NO_LEADER_EPOCH,
            metadata: metadata.into(),
            commit_timestamp,
            expire_timestamp: NO_EXPIRE_TIMESTAMP,
        }
    }

    pub fn with_version(mut self, version: i16) -> Self {
        self.version = version;
        self
    }

    pub fn decode(bytes: &[u8]) -> AppResult<Self> {
        let mut buffer = BytesMut::from(bytes);
        let version = I16::decode(&mut buffer)?.value;
        if version < 0 {
            return Err(AppError::MalformedProtocol(format!(
                "negative offset commit value version {}",
                version
            )));
        }
        let flexible = version >= FIRST_FLEXIBLE_VALUE_VERSION;

        let offset = I64::decode(&mut buffer)?.value;
        let leader_epoch = if version >= 3 {
            I32::decode(&mut buffer)?.value
        } else {
            NO_LEADER_EPOCH
        };
        let metadata = if flexible {
            CompactString::decode(&mut buffer)?.value
        } else {
            PString::decode(&mut buffer)?.value
        };
        let commit_timestamp = I64::decode(&mut buffer)?.value;
        let expire_timestamp = if version == 1 {
            I64::decode(&mut buffer)?.value
        } else {
            NO_EXPIRE_TIMESTAMP
        };
        if flexible {
            skip_tagged_fields(&mut buffer)?;
        }

        Ok(Self {
            version,
            offset,
            leader_epoch,
            metadata,
            commit_timestamp,
            expire_timestamp,
        })
    }

    pub fn encode(&self) -> Bytes {
        let flexible = self.version >= FIRST_FLEXIBLE_VALUE_VERSION;
        let mut writer = BytesMut::new();
        I16::from(self.version).encode(&mut writer);
        I64::from(self.offset).encode(&mut writer);
        if self.version >= 3 {
            I32::from(self.leader_epoch).encode(&mut writer);
        }
        if flexible {
            CompactString::from(self.metadata.clone()).encode(&mut writer);
        } else {
            PString::from(self.metadata.clone()).encode(&mut writer);
        }
        I64::from(self.commit_timestamp).encode(&mut writer);
        if self.version == 1 {
            I64::from(self.expire_timestamp).encode(&mut writer);
        }
        if flexible {
            put_empty_tagged_fields(&mut writer);
        }
        writer.freeze()
    }
}
