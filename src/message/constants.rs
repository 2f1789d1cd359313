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

//! Message attribute names
//!
//! Downstream consumers look these up by name, they must not change.

/// Topic the offset log records are fetched from.
pub const CONSUMER_OFFSETS_TOPIC: &str = "__consumer_offsets";

// Set on every fetched record.
pub const KAFKA_KEY: &str = "kafka_key";
pub const KAFKA_TOPIC: &str = "kafka_topic";
pub const KAFKA_PARTITION: &str = "kafka_partition";
pub const KAFKA_OFFSET: &str = "kafka_offset";
pub const KAFKA_TIMESTAMP_UNIX: &str = "kafka_timestamp_unix";
pub const KAFKA_TIMESTAMP_MS: &str = "kafka_timestamp_ms";
pub const KAFKA_TOMBSTONE_MESSAGE: &str = "kafka_tombstone_message";

// Set on offset commits that pass the filter.
pub const KAFKA_OFFSET_TOPIC: &str = "kafka_offset_topic";
pub const KAFKA_OFFSET_GROUP: &str = "kafka_offset_group";
pub const KAFKA_OFFSET_PARTITION: &str = "kafka_offset_partition";
pub const KAFKA_OFFSET_COMMIT_TIMESTAMP: &str = "kafka_offset_commit_timestamp";
pub const KAFKA_OFFSET_METADATA: &str = "kafka_offset_metadata";
