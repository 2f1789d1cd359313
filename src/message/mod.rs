pub use record::{Message, MessageBatch, MetaValue};
pub use topic_partition::TopicPartition;

pub mod constants;
mod record;
mod topic_partition;
