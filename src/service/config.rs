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

use std::path::Path;

use serde::Deserialize;

use crate::filter::TopicFilter;

use super::{AppError, AppResult};

/// Which topics the offset commits are kept for.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct OffsetsConfig {
    /// Topic names, or patterns when `regexp_topics` is set. One entry may
    /// hold several comma separated topics.
    pub topics: Vec<String>,
    #[serde(default)]
    pub regexp_topics: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReaderSettings {
    /// Re-deliver nacked batches instead of passing the nack upstream.
    #[serde(default = "default_auto_replay_nacks")]
    pub auto_replay_nacks: bool,
    /// Number of fetched records per batch fed to the reader by the dump tool.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_auto_replay_nacks() -> bool {
    true
}

fn default_batch_size() -> usize {
    100
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            auto_replay_nacks: default_auto_replay_nacks(),
            batch_size: default_batch_size(),
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ReaderConfig {
    pub offsets: OffsetsConfig,
    #[serde(default)]
    pub reader: ReaderSettings,
}

impl ReaderConfig {
    pub fn set_up_config<P: AsRef<Path>>(path: P) -> AppResult<ReaderConfig> {
        let path_str = path
            .as_ref()
            .to_str()
            .ok_or(AppError::InvalidValue(format!(
                "config file path: {}",
                path.as_ref().to_string_lossy()
            )))?;
        let config = config::Config::builder()
            .add_source(config::File::with_name(path_str))
            .build()?;

        let reader_config: ReaderConfig = config.try_deserialize()?;
        if reader_config.reader.batch_size == 0 {
            return Err(AppError::InvalidValue(
                "reader.batch_size must be greater than zero".to_string(),
            ));
        }

        Ok(reader_config)
    }

    pub fn topic_filter(&self) -> AppResult<TopicFilter> {
        TopicFilter::new(&self.offsets.topics, self.offsets.regexp_topics)
    }
}
