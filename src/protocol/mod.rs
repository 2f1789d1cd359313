pub use offset_commit::{
    OffsetCommitKey, OffsetCommitValue, FIRST_FLEXIBLE_VALUE_VERSION, GROUP_METADATA_KEY_VERSION,
    NO_EXPIRE_TIMESTAMP, NO_LEADER_EPOCH, OFFSET_COMMIT_KEY_VERSIONS,
};

pub mod base;
pub mod dump;
mod offset_commit;
