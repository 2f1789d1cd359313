pub mod filter;
pub mod message;
pub mod protocol;
pub mod reader;
pub mod service;

pub use filter::{OffsetRecordFilter, TopicFilter};
pub use message::{Message, MessageBatch, MetaValue, TopicPartition};
pub use protocol::{OffsetCommitKey, OffsetCommitValue};
pub use reader::{ack_fn, AckFn, AutoReplayNacks, BatchSource, ChannelSource, OffsetsReader};
pub use service::{
    setup_local_tracing, setup_tracing, AppError, AppResult, OffsetsConfig, ReaderConfig,
    ReaderSettings,
};
