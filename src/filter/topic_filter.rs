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

use regex::Regex;

use crate::{AppError, AppResult};

/// The set of topics whose offset commits are kept.
///
/// Matching is case sensitive. Patterns are unanchored: `events` matches
/// `audit.events.v1`, anchor with `^...$` to match whole names.
#[derive(Debug, Clone)]
pub enum TopicFilter {
    Exact(Vec<String>),
    Patterns(Vec<Regex>),
}

impl TopicFilter {
    /// Builds the filter from the configured topic list. Entries may contain
    /// several comma separated topics.
    pub fn new<S: AsRef<str>>(topics: &[S], regexp_topics: bool) -> AppResult<Self> {
        let topics = split_topics(topics);
        if topics.is_empty() {
            return Err(AppError::InvalidTopic(
                "at least one topic must be specified".to_string(),
            ));
        }

        if !regexp_topics {
            return Ok(TopicFilter::Exact(topics));
        }
        let patterns = topics
            .iter()
            .map(|topic| {
                Regex::new(topic).map_err(|e| {
                    AppError::InvalidTopic(format!(
                        "failed to compile topic regex {:?}: {}",
                        topic, e
                    ))
                })
            })
            .collect::<AppResult<Vec<_>>>()?;
        Ok(TopicFilter::Patterns(patterns))
    }

    pub fn matches(&self, topic: &str) -> bool {
        match self {
            TopicFilter::Exact(topics) => topics.iter().any(|t| t == topic),
            TopicFilter::Patterns(patterns) => patterns.iter().any(|p| p.is_match(topic)),
        }
    }
}

fn split_topics<S: AsRef<str>>(topics: &[S]) -> Vec<String> {
    topics
        .iter()
        .flat_map(|entry| entry.as_ref().split(','))
        .map(str::trim)
        .filter(|topic| !topic.is_empty())
        .map(str::to_string)
        .collect()
}
