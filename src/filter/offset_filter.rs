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

use std::sync::Arc;

use tracing::{debug, trace};

use crate::message::constants::{
    KAFKA_OFFSET_COMMIT_TIMESTAMP, KAFKA_OFFSET_GROUP, KAFKA_OFFSET_METADATA,
    KAFKA_OFFSET_PARTITION, KAFKA_OFFSET_TOPIC,
};
use crate::message::{Message, MessageBatch};
use crate::protocol::{OffsetCommitKey, OffsetCommitValue};

use super::TopicFilter;

/// Keeps the offset commits of the configured topics and tags them with the
/// decoded key and value fields.
///
/// Records that are not offset commits, belong to other topics or do not
/// decode are dropped from the batch. Dropping is never an error.
#[derive(Debug, Clone)]
pub struct OffsetRecordFilter {
    topics: Arc<TopicFilter>,
}

impl OffsetRecordFilter {
    pub fn new(topics: TopicFilter) -> Self {
        Self::with_shared(Arc::new(topics))
    }

    pub fn with_shared(topics: Arc<TopicFilter>) -> Self {
        Self { topics }
    }

    pub fn topics(&self) -> &TopicFilter {
        &self.topics
    }

    /// Surviving records keep their relative order.
    pub fn filter_batch(&self, batch: MessageBatch) -> MessageBatch {
        batch
            .into_iter()
            .filter_map(|message| self.filter_message(message))
            .collect()
    }

    pub fn filter_message(&self, mut message: Message) -> Option<Message> {
        let key = decode_key(&message)?;
        if !self.topics.matches(&key.topic) {
            trace!("Skipping updates for topic {:?}", key.topic);
            return None;
        }
        let value = decode_value(&message, &key)?;
        enrich(&mut message, key, value);
        Some(message)
    }
}

fn decode_key(message: &Message) -> Option<OffsetCommitKey> {
    let key = message.key()?;
    OffsetCommitKey::decode(key)
        .map_err(|e| debug!("Failed to decode record key: {}", e))
        .ok()
}

fn decode_value(message: &Message, key: &OffsetCommitKey) -> Option<OffsetCommitValue> {
    let Some(value) = message.value() else {
        debug!(
            "Offset commit for group {} on {} has no value",
            key.group,
            key.topic_partition()
        );
        return None;
    };
    OffsetCommitValue::decode(value)
        .map_err(|e| {
            debug!(
                "Failed to decode offset commit value of group {} on {}: {}",
                key.group,
                key.topic_partition(),
                e
            )
        })
        .ok()
}

fn enrich(message: &mut Message, key: OffsetCommitKey, value: OffsetCommitValue) {
    message.meta_set(KAFKA_OFFSET_TOPIC, key.topic);
    message.meta_set(KAFKA_OFFSET_GROUP, key.group);
    message.meta_set(KAFKA_OFFSET_PARTITION, key.partition);
    message.meta_set(KAFKA_OFFSET_COMMIT_TIMESTAMP, value.commit_timestamp);
    message.meta_set(KAFKA_OFFSET_METADATA, value.metadata);
}

#[cfg(test)]
mod tests {
    use bytes::{BufMut, Bytes, BytesMut};
    use rstest::{fixture, rstest};

    use super::*;
    use crate::message::constants::{CONSUMER_OFFSETS_TOPIC, KAFKA_OFFSET};
    use crate::message::{MetaValue, TopicPartition};
    use crate::service::setup_local_tracing;

    #[fixture]
    fn setup() {
        let _ = setup_local_tracing();
    }

    fn commit(group: &str, topic: &str, partition: i32, commit_timestamp: i64) -> Message {
        Message::new(
            Some(OffsetCommitKey::new(group, topic, partition).encode()),
            Some(
                OffsetCommitValue::new(100, format!("{}-meta", group), commit_timestamp).encode(),
            ),
        )
    }

    fn key_with_version(version: i16, topic: &str) -> Bytes {
        let mut writer = BytesMut::new();
        writer.put_i16(version);
        writer.put_i16(5);
        writer.put_slice(b"group");
        writer.put_i16(topic.len() as i16);
        writer.put_slice(topic.as_bytes());
        writer.put_i32(0);
        writer.freeze()
    }

    fn offset_topics(batch: &[Message]) -> Vec<&str> {
        batch
            .iter()
            .filter_map(|m| m.meta_get(KAFKA_OFFSET_TOPIC).and_then(MetaValue::as_str))
            .collect()
    }

    fn exact(topics: &[&str]) -> OffsetRecordFilter {
        OffsetRecordFilter::new(TopicFilter::new(topics, false).unwrap())
    }

    #[rstest]
    fn test_enriches_matching_commit(#[from(setup)] _setup: ()) {
        let filter = exact(&["payments"]);
        let batch = filter.filter_batch(vec![commit(
            "billing",
            "payments",
            3,
            1_700_000_000_000,
        )]);

        assert_eq!(batch.len(), 1);
        let message = &batch[0];
        assert_eq!(
            message.meta_get(KAFKA_OFFSET_TOPIC).and_then(MetaValue::as_str),
            Some("payments")
        );
        assert_eq!(
            message.meta_get(KAFKA_OFFSET_GROUP).and_then(MetaValue::as_str),
            Some("billing")
        );
        assert_eq!(
            message.meta_get(KAFKA_OFFSET_PARTITION).and_then(MetaValue::as_int),
            Some(3)
        );
        assert_eq!(
            message
                .meta_get(KAFKA_OFFSET_COMMIT_TIMESTAMP)
                .and_then(MetaValue::as_int),
            Some(1_700_000_000_000)
        );
        assert_eq!(
            message.meta_get(KAFKA_OFFSET_METADATA).and_then(MetaValue::as_str),
            Some("billing-meta")
        );
    }

    #[rstest]
    fn test_three_record_scenario(#[from(setup)] _setup: ()) {
        let filter = exact(&["payments"]);
        let unsupported = Message::new(
            Some(key_with_version(2, "payments")),
            Some(OffsetCommitValue::new(1, "", 1).encode()),
        );
        let batch = vec![
            unsupported,
            commit("g", "orders", 0, 10),
            commit("g", "payments", 0, 20),
        ];

        let filtered = filter.filter_batch(batch);
        assert_eq!(filtered.len(), 1);
        assert_eq!(offset_topics(&filtered), vec!["payments"]);
    }

    #[rstest]
    #[case(-1)]
    #[case(2)]
    #[case(3)]
    #[case(100)]
    fn test_unsupported_key_version_dropped_even_if_topic_matches(
        #[from(setup)] _setup: (),
        #[case] version: i16,
    ) {
        let filter = exact(&["payments"]);
        let message = Message::new(
            Some(key_with_version(version, "payments")),
            Some(OffsetCommitValue::new(1, "", 1).encode()),
        );
        assert!(filter.filter_batch(vec![message]).is_empty());
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    fn test_supported_key_versions_kept(#[from(setup)] _setup: (), #[case] version: i16) {
        let filter = exact(&["payments"]);
        let message = Message::new(
            Some(key_with_version(version, "payments")),
            Some(OffsetCommitValue::new(1, "", 1).encode()),
        );
        assert_eq!(filter.filter_batch(vec![message]).len(), 1);
    }

    #[rstest]
    fn test_pattern_scenario(#[from(setup)] _setup: ()) {
        let filter = OffsetRecordFilter::new(TopicFilter::new(&["events\\..*"], true).unwrap());
        let batch = vec![
            commit("g", "events.clicks", 0, 1),
            commit("g", "billing", 0, 2),
        ];
        assert_eq!(offset_topics(&filter.filter_batch(batch)), vec!["events.clicks"]);
    }

    #[rstest]
    fn test_records_without_usable_key_or_value_dropped(#[from(setup)] _setup: ()) {
        let filter = exact(&["payments"]);
        let key = OffsetCommitKey::new("g", "payments", 0).encode();
        let batch = vec![
            Message::new(None, Some(OffsetCommitValue::new(1, "", 1).encode())),
            Message::new(Some(Bytes::from_static(b"\x00")), None),
            Message::new(Some(key.clone()), None),
            Message::new(Some(key.clone()), Some(Bytes::from_static(b"\x00\x03\x00"))),
            Message::new(Some(key), Some(OffsetCommitValue::new(1, "ok", 1).encode())),
        ];

        let filtered = filter.filter_batch(batch);
        assert_eq!(filtered.len(), 1);
        assert_eq!(
            filtered[0]
                .meta_get(KAFKA_OFFSET_METADATA)
                .and_then(MetaValue::as_str),
            Some("ok")
        );
    }

    #[rstest]
    fn test_commit_with_extra_bytes_is_kept(#[from(setup)] _setup: ()) {
        let filter = exact(&["payments"]);
        assert!(filter.topics().matches("payments"));

        let mut key = OffsetCommitKey::new("g", "payments", 1).encode().to_vec();
        key.push(0);
        let mut value = OffsetCommitValue::new(5, "m", 1).encode().to_vec();
        value.push(0);
        let batch = vec![
            Message::new(
                Some(Bytes::from(key.clone())),
                Some(OffsetCommitValue::new(5, "m", 1).encode()),
            ),
            Message::new(
                Some(OffsetCommitKey::new("g", "payments", 2).encode()),
                Some(Bytes::from(value.clone())),
            ),
            Message::new(Some(Bytes::from(key)), Some(Bytes::from(value))),
        ];

        let filtered = filter.filter_batch(batch);
        assert_eq!(filtered.len(), 3);
        assert_eq!(offset_topics(&filtered), vec!["payments"; 3]);
    }

    #[rstest]
    fn test_order_preserved_and_existing_attributes_kept(#[from(setup)] _setup: ()) {
        let filter = exact(&["a", "c"]);
        let tp = TopicPartition::new(CONSUMER_OFFSETS_TOPIC, 4);
        let batch: MessageBatch = ["c", "b", "a", "c"]
            .iter()
            .enumerate()
            .map(|(offset, topic)| {
                let source = commit("g", topic, 0, 1);
                Message::from_fetched(
                    &tp,
                    offset as i64,
                    0,
                    source.key().cloned(),
                    source.value().cloned(),
                )
            })
            .collect();

        let filtered = filter.filter_batch(batch);
        assert_eq!(offset_topics(&filtered), vec!["c", "a", "c"]);
        let offsets: Vec<i64> = filtered
            .iter()
            .filter_map(|m| m.meta_get(KAFKA_OFFSET).and_then(MetaValue::as_int))
            .collect();
        assert_eq!(offsets, vec![0, 2, 3]);
    }

    #[rstest]
    fn test_filter_is_idempotent(#[from(setup)] _setup: ()) {
        let filter = OffsetRecordFilter::new(TopicFilter::new(&["^pay"], true).unwrap());
        let batch = vec![
            commit("g1", "payments", 0, 1),
            commit("g2", "orders", 1, 2),
            commit("g3", "payouts", 2, 3),
            Message::new(Some(key_with_version(7, "payments")), None),
        ];

        let first = filter.filter_batch(batch.clone());
        let second = filter.filter_batch(batch);
        assert_eq!(first, second);
        assert_eq!(offset_topics(&first), vec!["payments", "payouts"]);
    }
}
