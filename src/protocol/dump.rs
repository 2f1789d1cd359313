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

//! Flat dump of `__consumer_offsets` records read by the `offsets-dump` tool.
//! Each entry is the record key followed by the record value, both as i32
//! length prefixed bytes with -1 standing for null.

use bytes::{Buf, Bytes, BytesMut};

use crate::protocol::base::{NPBytes, PrimaryType};
use crate::AppResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpRecord {
    pub key: Option<Bytes>,
    pub value: Option<Bytes>,
}

impl DumpRecord {
    pub fn new(key: Option<Bytes>, value: Option<Bytes>) -> Self {
        Self { key, value }
    }
}

pub fn decode_dump(mut buffer: BytesMut) -> AppResult<Vec<DumpRecord>> {
    let mut records = vec![];
    while buffer.has_remaining() {
        let key = NPBytes::decode(&mut buffer)?.value.map(BytesMut::freeze);
        let value = NPBytes::decode(&mut buffer)?.value.map(BytesMut::freeze);
        records.push(DumpRecord { key, value });
    }
    Ok(records)
}

pub fn encode_dump(records: &[DumpRecord]) -> BytesMut {
    let mut writer = BytesMut::new();
    for record in records {
        NPBytes::from(record.key.as_deref().map(BytesMut::from)).encode(&mut writer);
        NPBytes::from(record.value.as_deref().map(BytesMut::from)).encode(&mut writer);
    }
    writer
}
