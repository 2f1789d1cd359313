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

use bytes::{Buf, BufMut, BytesMut};
use integer_encoding::VarInt;

use crate::{AppError, AppResult};

///
/// Primary types of the offset log wire format.
/// Fixed width integers are big-endian. Strings carry an i16 length prefix,
/// compact strings an unsigned varint holding length + 1 (flexible versions).
/// Bytes carry an i32 length prefix, -1 meaning null.
///
macro_rules! define_type {
    ($type_name:ident, $inner_type:ty) => {
        #[derive(Debug, Default, Clone, PartialEq, Eq)]
        pub struct $type_name {
            pub value: $inner_type,
        }
        impl From<$inner_type> for $type_name {
            fn from(value: $inner_type) -> Self {
                Self { value }
            }
        }
    };
}
///
/// Implement the PrimaryType trait for the fixed width integers.
///
macro_rules! implement_primary_type {
    ($type:ident, $read_method:ident, $write_method:ident, $size:expr) => {
        impl PrimaryType for $type {
            fn decode(buffer: &mut BytesMut) -> AppResult<Self> {
                if buffer.remaining() < $size {
                    return Err(AppError::MalformedProtocol(format!(
                        "can not read a {}, insufficient data",
                        stringify!($type)
                    )));
                }
                let value = buffer.$read_method();
                Ok($type { value })
            }
            fn encode(self, writer: &mut BytesMut) {
                writer.$write_method(self.value);
            }
            fn wire_format_size(&self) -> usize {
                $size
            }
        }
    };
}

/// Fundamental types, the smallest unit of the offset commit key and value.
///
/// Every decode consumes exactly the bytes of the value it returns and fails
/// with `MalformedProtocol` instead of reading past the end of the buffer.
pub trait PrimaryType: Sized {
    fn decode(buffer: &mut BytesMut) -> AppResult<Self>;
    fn encode(self, writer: &mut BytesMut);

    fn wire_format_size(&self) -> usize;
}

define_type!(I16, i16);
define_type!(I32, i32);
define_type!(I64, i64);
define_type!(PString, String);
define_type!(CompactString, String);
define_type!(UVarInt, u32);
define_type!(NPBytes, Option<BytesMut>);

implement_primary_type!(I16, get_i16, put_i16, 2);
implement_primary_type!(I32, get_i32, put_i32, 4);
implement_primary_type!(I64, get_i64, put_i64, 8);

fn split_checked(buffer: &mut BytesMut, length: usize, type_name: &str) -> AppResult<BytesMut> {
    if buffer.remaining() < length {
        return Err(AppError::MalformedProtocol(format!(
            "can not read a {}, need {} bytes but {} left",
            type_name,
            length,
            buffer.remaining()
        )));
    }
    Ok(buffer.split_to(length))
}

fn utf8(bytes: BytesMut) -> AppResult<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| AppError::MalformedProtocol(e.to_string()))
}

impl PrimaryType for UVarInt {
    fn decode(buffer: &mut BytesMut) -> AppResult<Self> {
        let var = u32::decode_var(buffer.as_ref());
        if let Some((value, read_size)) = var {
            buffer.advance(read_size);
            Ok(UVarInt { value })
        } else {
            Err(AppError::MalformedProtocol(
                "can not read a UVarInt".into(),
            ))
        }
    }

    fn encode(self, writer: &mut BytesMut) {
        let var = self.value.encode_var_vec();
        writer.put_slice(var.as_slice());
    }

    fn wire_format_size(&self) -> usize {
        self.value.required_space()
    }
}

impl PrimaryType for PString {
    fn decode(buffer: &mut BytesMut) -> AppResult<Self> {
        let length = I16::decode(buffer)?.value;
        if length < 0 {
            return Err(AppError::MalformedProtocol(
                "String length can not be negative".into(),
            ));
        }
        let bytes = split_checked(buffer, length as usize, "PString")?;
        Ok(PString {
            value: utf8(bytes)?,
        })
    }
    fn encode(self, writer: &mut BytesMut) {
        let length = self.value.len();
        writer.put_i16(length as i16);
        writer.put_slice(self.value.as_bytes());
    }
    fn wire_format_size(&self) -> usize {
        2 + self.value.len()
    }
}

impl PrimaryType for CompactString {
    fn decode(buffer: &mut BytesMut) -> AppResult<Self> {
        let length_plus_one = UVarInt::decode(buffer)?.value;
        if length_plus_one == 0 {
            return Err(AppError::MalformedProtocol(
                "CompactString can not be null".into(),
            ));
        }
        let bytes = split_checked(buffer, (length_plus_one - 1) as usize, "CompactString")?;
        Ok(CompactString {
            value: utf8(bytes)?,
        })
    }
    fn encode(self, writer: &mut BytesMut) {
        UVarInt::from(self.value.len() as u32 + 1).encode(writer);
        writer.put_slice(self.value.as_bytes());
    }
    fn wire_format_size(&self) -> usize {
        (self.value.len() as u32 + 1).required_space() + self.value.len()
    }
}

impl PrimaryType for NPBytes {
    fn decode(buffer: &mut BytesMut) -> AppResult<Self> {
        let length = I32::decode(buffer)?.value;
        if length < 0 {
            Ok(NPBytes { value: None })
        } else {
            Ok(NPBytes {
                value: Some(split_checked(buffer, length as usize, "NPBytes")?),
            })
        }
    }
    fn encode(self, writer: &mut BytesMut) {
        if let Some(value) = self.value {
            let length = value.remaining();
            writer.put_i32(length as i32);
            writer.put_slice(value.as_ref());
        } else {
            writer.put_i32(-1);
        }
    }
    fn wire_format_size(&self) -> usize {
        if let Some(value) = &self.value {
            4 + value.remaining()
        } else {
            4
        }
    }
}

/// Skips the tagged field section that closes every flexible structure.
/// Returns the number of skipped fields.
pub fn skip_tagged_fields(buffer: &mut BytesMut) -> AppResult<u32> {
    let count = UVarInt::decode(buffer)?.value;
    for _ in 0..count {
        let _tag = UVarInt::decode(buffer)?;
        let size = UVarInt::decode(buffer)?.value;
        split_checked(buffer, size as usize, "tagged field")?;
    }
    Ok(count)
}

/// Writes an empty tagged field section.
pub fn put_empty_tagged_fields(writer: &mut BytesMut) {
    UVarInt::from(0).encode(writer);
}
