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

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::message::MessageBatch;
use crate::AppError;
use crate::AppResult;

pub use channel_source::{AckOutcome, ChannelSource};
pub use nack_replay::AutoReplayNacks;
pub use offsets_reader::OffsetsReader;

mod channel_source;
mod nack_replay;
mod offsets_reader;

pub type AckFuture = Pin<Box<dyn Future<Output = AppResult<()>> + Send>>;

/// Finalizes one delivered batch. `None` acknowledges it, `Some(error)` is a
/// negative acknowledgment carrying the reason.
pub type AckFn = Box<dyn FnOnce(CancellationToken, Option<AppError>) -> AckFuture + Send>;

pub fn ack_fn<F, Fut>(f: F) -> AckFn
where
    F: FnOnce(CancellationToken, Option<AppError>) -> Fut + Send + 'static,
    Fut: Future<Output = AppResult<()>> + Send + 'static,
{
    Box::new(
        move |token: CancellationToken, error: Option<AppError>| -> AckFuture {
            Box::pin(f(token, error))
        },
    )
}

/// An ordered source of record batches, delivered once each and acknowledged
/// through the returned [`AckFn`].
///
/// Readers are driven by one caller at a time. A cancelled token must make
/// `read_batch` return promptly.
pub trait BatchSource: Send {
    fn read_batch(
        &mut self,
        token: &CancellationToken,
    ) -> impl Future<Output = AppResult<(MessageBatch, AckFn)>> + Send;

    fn close(&mut self) -> impl Future<Output = AppResult<()>> + Send {
        async { Ok(()) }
    }
}
