pub use primary_types::{
    put_empty_tagged_fields, skip_tagged_fields, CompactString, NPBytes, PString, PrimaryType,
    UVarInt, I16, I32, I64,
};

mod primary_types;
