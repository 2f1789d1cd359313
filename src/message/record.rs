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

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use bytes::Bytes;

use super::constants::{
    KAFKA_KEY, KAFKA_OFFSET, KAFKA_PARTITION, KAFKA_TIMESTAMP_MS, KAFKA_TIMESTAMP_UNIX,
    KAFKA_TOMBSTONE_MESSAGE, KAFKA_TOPIC,
};
use super::TopicPartition;

/// Value of a message attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    String(String),
    Int(i64),
    Bool(bool),
    Bytes(Bytes),
}

impl MetaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            MetaValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl Display for MetaValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MetaValue::String(s) => write!(f, "{}", s),
            MetaValue::Int(i) => write!(f, "{}", i),
            MetaValue::Bool(b) => write!(f, "{}", b),
            MetaValue::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
        }
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::String(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::String(value.to_string())
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::Int(value)
    }
}

impl From<i32> for MetaValue {
    fn from(value: i32) -> Self {
        MetaValue::Int(value as i64)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Bool(value)
    }
}

impl From<Bytes> for MetaValue {
    fn from(value: Bytes) -> Self {
        MetaValue::Bytes(value)
    }
}

/// A record as it travels through the reader: raw key and value plus named
/// attributes. Attributes set upstream are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    key: Option<Bytes>,
    value: Option<Bytes>,
    meta: BTreeMap<String, MetaValue>,
}

pub type MessageBatch = Vec<Message>;

impl Message {
    pub fn new(key: Option<Bytes>, value: Option<Bytes>) -> Self {
        Self {
            key,
            value,
            meta: BTreeMap::new(),
        }
    }

    /// Builds the message for a record fetched from `topic_partition` and sets
    /// the standard fetch attributes on it.
    pub fn from_fetched(
        topic_partition: &TopicPartition,
        offset: i64,
        timestamp_ms: i64,
        key: Option<Bytes>,
        value: Option<Bytes>,
    ) -> Self {
        let tombstone = value.is_none();
        let mut message = Self::new(key.clone(), value);
        if let Some(key) = key {
            message.meta_set(KAFKA_KEY, key);
        }
        message.meta_set(KAFKA_TOPIC, topic_partition.topic());
        message.meta_set(KAFKA_PARTITION, topic_partition.partition());
        message.meta_set(KAFKA_OFFSET, offset);
        message.meta_set(KAFKA_TIMESTAMP_UNIX, timestamp_ms.div_euclid(1000));
        message.meta_set(KAFKA_TIMESTAMP_MS, timestamp_ms);
        message.meta_set(KAFKA_TOMBSTONE_MESSAGE, tombstone);
        message
    }

    pub fn key(&self) -> Option<&Bytes> {
        self.key.as_ref()
    }

    pub fn value(&self) -> Option<&Bytes> {
        self.value.as_ref()
    }

    pub fn meta_get(&self, name: &str) -> Option<&MetaValue> {
        self.meta.get(name)
    }

    pub fn meta_set(&mut self, name: impl Into<String>, value: impl Into<MetaValue>) {
        self.meta.insert(name.into(), value.into());
    }

    pub fn meta_len(&self) -> usize {
        self.meta.len()
    }
}
