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

use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use crate::filter::OffsetRecordFilter;
use crate::message::MessageBatch;
use crate::{AppError, AppResult};

use super::{AckFn, BatchSource};

/// Reads batches of `__consumer_offsets` records from `source` and hands out
/// only the offset commits accepted by the filter.
///
/// A batch with nothing left after filtering is acknowledged right away and
/// the next one is fetched, so callers never see an empty batch. Errors of the
/// source, cancellation included, are returned as they are.
pub struct OffsetsReader<S> {
    source: S,
    filter: OffsetRecordFilter,
}

impl<S: BatchSource> OffsetsReader<S> {
    pub fn new(source: S, filter: OffsetRecordFilter) -> Self {
        Self { source, filter }
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: BatchSource> BatchSource for OffsetsReader<S> {
    async fn read_batch(&mut self, token: &CancellationToken) -> AppResult<(MessageBatch, AckFn)> {
        loop {
            if token.is_cancelled() {
                return Err(AppError::Cancelled);
            }
            let (batch, ack) = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(AppError::Cancelled),
                fetched = self.source.read_batch(token) => fetched?,
            };

            let fetched = batch.len();
            let batch = self.filter.filter_batch(batch);
            if !batch.is_empty() {
                trace!("kept {} of {} offset log records", batch.len(), fetched);
                return Ok((batch, ack));
            }

            trace!(
                "no matching offset commits in batch of {} records, acknowledging it",
                fetched
            );
            let acked = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(AppError::Cancelled),
                acked = ack(token.clone(), None) => acked,
            };
            if let Err(e) = acked {
                warn!("Failed to acknowledge filtered out batch: {}", e);
            }
        }
    }

    async fn close(&mut self) -> AppResult<()> {
        self.source.close().await
    }
}
