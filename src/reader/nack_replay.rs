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

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::message::MessageBatch;
use crate::{AppError, AppResult};

use super::{ack_fn, AckFn, BatchSource};

struct NackedBatch {
    batch: MessageBatch,
    ack: AckFn,
}

type ReplayQueue = Arc<Mutex<VecDeque<NackedBatch>>>;

/// Re-delivers batches the caller nacks instead of passing the nack to the
/// source. Replayed batches are served before anything new is fetched, and
/// the source only sees the final positive acknowledgment.
///
/// With `enabled == false` batches and acks pass through untouched.
pub struct AutoReplayNacks<S> {
    source: S,
    enabled: bool,
    replay: ReplayQueue,
}

impl<S: BatchSource> AutoReplayNacks<S> {
    pub fn new(source: S, enabled: bool) -> Self {
        Self {
            source,
            enabled,
            replay: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn pending_replays(&self) -> usize {
        self.replay.lock().len()
    }

    fn wrap(&self, batch: MessageBatch, ack: AckFn) -> (MessageBatch, AckFn) {
        let replay = self.replay.clone();
        let delivered = batch.clone();
        let wrapped = ack_fn(move |token, error: Option<AppError>| async move {
            match error {
                None => ack(token, None).await,
                Some(e) => {
                    debug!(
                        "batch of {} records nacked, queued for replay: {}",
                        batch.len(),
                        e
                    );
                    replay.lock().push_back(NackedBatch { batch, ack });
                    Ok(())
                }
            }
        });
        (delivered, wrapped)
    }
}

impl<S: BatchSource> BatchSource for AutoReplayNacks<S> {
    async fn read_batch(&mut self, token: &CancellationToken) -> AppResult<(MessageBatch, AckFn)> {
        if !self.enabled {
            return self.source.read_batch(token).await;
        }
        if token.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let nacked = self.replay.lock().pop_front();
        if let Some(NackedBatch { batch, ack }) = nacked {
            debug!("replaying nacked batch of {} records", batch.len());
            return Ok(self.wrap(batch, ack));
        }

        let (batch, ack) = self.source.read_batch(token).await?;
        Ok(self.wrap(batch, ack))
    }

    async fn close(&mut self) -> AppResult<()> {
        self.source.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::reader::{AckOutcome, ChannelSource};

    fn batch(values: &[&'static str]) -> MessageBatch {
        values
            .iter()
            .map(|v| Message::new(None, Some(bytes::Bytes::from_static(v.as_bytes()))))
            .collect()
    }

    #[tokio::test]
    async fn test_nacked_batch_is_replayed_before_new_input() {
        let (batch_tx, batch_rx) = async_channel::unbounded();
        let (outcome_tx, outcome_rx) = async_channel::unbounded();
        let mut reader =
            AutoReplayNacks::new(ChannelSource::new(batch_rx).with_outcomes(outcome_tx), true);
        let token = CancellationToken::new();

        batch_tx.send(batch(&["first"])).await.unwrap();
        batch_tx.send(batch(&["second"])).await.unwrap();

        let (delivered, ack) = reader.read_batch(&token).await.unwrap();
        assert_eq!(delivered, batch(&["first"]));
        ack(token.clone(), Some(AppError::InvalidValue("sink down".to_string())))
            .await
            .unwrap();
        assert_eq!(reader.pending_replays(), 1);
        // the nack never reaches the source
        assert!(outcome_rx.try_recv().is_err());

        let (replayed, ack) = reader.read_batch(&token).await.unwrap();
        assert_eq!(replayed, batch(&["first"]));
        assert_eq!(reader.pending_replays(), 0);
        ack(token.clone(), None).await.unwrap();
        assert_eq!(
            outcome_rx.recv().await.unwrap(),
            AckOutcome::Ack {
                batch_id: 0,
                records: 1
            }
        );

        let (next, _ack) = reader.read_batch(&token).await.unwrap();
        assert_eq!(next, batch(&["second"]));
    }

    #[tokio::test]
    async fn test_disabled_passes_nacks_through() {
        let (batch_tx, batch_rx) = async_channel::unbounded();
        let (outcome_tx, outcome_rx) = async_channel::unbounded();
        let mut reader =
            AutoReplayNacks::new(ChannelSource::new(batch_rx).with_outcomes(outcome_tx), false);
        let token = CancellationToken::new();

        batch_tx.send(batch(&["only"])).await.unwrap();
        drop(batch_tx);

        let (_delivered, ack) = reader.read_batch(&token).await.unwrap();
        ack(token.clone(), Some(AppError::InvalidValue("nope".to_string())))
            .await
            .unwrap();
        assert_eq!(reader.pending_replays(), 0);
        assert!(matches!(
            outcome_rx.recv().await.unwrap(),
            AckOutcome::Nack { batch_id: 0, .. }
        ));
        assert!(matches!(
            reader.read_batch(&token).await,
            Err(AppError::EndOfInput)
        ));
    }

    #[tokio::test]
    async fn test_cancelled_token_wins_over_pending_replay() {
        let (_batch_tx, batch_rx) = async_channel::unbounded();
        let mut reader = AutoReplayNacks::new(ChannelSource::new(batch_rx), true);
        let token = CancellationToken::new();
        reader.replay.lock().push_back(NackedBatch {
            batch: batch(&["pending"]),
            ack: ack_fn(|_token, _error| async { Ok(()) }),
        });
        token.cancel();

        assert!(matches!(
            reader.read_batch(&token).await,
            Err(AppError::Cancelled)
        ));
        assert_eq!(reader.pending_replays(), 1);
    }
}
