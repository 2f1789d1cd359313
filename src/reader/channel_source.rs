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

use async_channel::{Receiver, Sender};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::message::MessageBatch;
use crate::{AppError, AppResult};

use super::{ack_fn, AckFn, BatchSource};

/// How the consumer finished one batch of a [`ChannelSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckOutcome {
    Ack { batch_id: u64, records: usize },
    Nack { batch_id: u64, records: usize, reason: String },
}

/// Batch source fed through a channel. Once every sender is dropped and the
/// channel is drained, reads fail with [`AppError::EndOfInput`].
pub struct ChannelSource {
    batches: Receiver<MessageBatch>,
    outcomes: Option<Sender<AckOutcome>>,
    next_batch_id: u64,
}

impl ChannelSource {
    pub fn new(batches: Receiver<MessageBatch>) -> Self {
        Self {
            batches,
            outcomes: None,
            next_batch_id: 0,
        }
    }

    /// Reports every acknowledgment on `outcomes`.
    pub fn with_outcomes(mut self, outcomes: Sender<AckOutcome>) -> Self {
        self.outcomes = Some(outcomes);
        self
    }
}

impl BatchSource for ChannelSource {
    async fn read_batch(&mut self, token: &CancellationToken) -> AppResult<(MessageBatch, AckFn)> {
        let batch = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(AppError::Cancelled),
            received = self.batches.recv() => received.map_err(|_| AppError::EndOfInput)?,
        };

        let batch_id = self.next_batch_id;
        self.next_batch_id += 1;
        let records = batch.len();
        trace!("received batch {} with {} records", batch_id, records);

        let outcomes = self.outcomes.clone();
        let ack = ack_fn(move |token: CancellationToken, error: Option<AppError>| async move {
            let Some(outcomes) = outcomes else {
                return Ok(());
            };
            let outcome = match error {
                None => AckOutcome::Ack { batch_id, records },
                Some(e) => AckOutcome::Nack {
                    batch_id,
                    records,
                    reason: e.to_string(),
                },
            };
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(AppError::Cancelled),
                sent = outcomes.send(outcome) => {
                    sent.map_err(|e| AppError::ChannelSendError(e.to_string()))
                }
            }
        });
        Ok((batch, ack))
    }

    async fn close(&mut self) -> AppResult<()> {
        self.batches.close();
        Ok(())
    }
}
