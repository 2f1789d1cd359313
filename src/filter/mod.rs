pub use offset_filter::OffsetRecordFilter;
pub use topic_filter::TopicFilter;

mod offset_filter;
mod topic_filter;
