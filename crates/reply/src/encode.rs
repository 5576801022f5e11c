use bytes::BufMut;
use bytes::Bytes;
use bytes::BytesMut;
use log::error;

use crate::arena::Arena;
use crate::error::EncodeError;
use crate::types::RedisReply;
use crate::types::Text;
use crate::utils::*;

/// Trait for encoding replies back to RESP wire bytes.
pub trait ReplyEncoder {
	fn encode_to(&self, arena: &Arena, buf: &mut BytesMut) -> Result<(), EncodeError>;

	fn encode(&self, arena: &Arena) -> Result<Bytes, EncodeError> {
		let mut buf = BytesMut::new();
		self.encode_to(arena, &mut buf)?;
		Ok(buf.freeze())
	}
}

impl ReplyEncoder for RedisReply {
	/// Appends only. On failure `buf` may hold the part of an array written
	/// before the offending child.
	fn encode_to(&self, arena: &Arena, buf: &mut BytesMut) -> Result<(), EncodeError> {
		match self {
			RedisReply::Status(text) => encode_line(buf, SIMPLE_STRING, text, arena),
			RedisReply::Error(text) => encode_line(buf, ERROR, text, arena),
			RedisReply::Integer(i) => encode_decimal(buf, INTEGER, *i),
			RedisReply::String(text) => encode_bulk_string(buf, text, arena),
			RedisReply::Array(_) => encode_array(buf, self, arena)?,
			RedisReply::Nil => {
				error!("Do you forget to call SetXXX()?");
				return Err(EncodeError::Nil);
			}
		}
		Ok(())
	}
}

#[inline]
fn encode_line(buf: &mut BytesMut, marker: u8, text: &Text, arena: &Arena) {
	buf.put_u8(marker);
	buf.put_slice(text.as_bytes(arena));
	buf.put_slice(CRLF);
}

#[inline]
fn encode_decimal(buf: &mut BytesMut, marker: u8, value: impl itoa::Integer) {
	let mut digits = itoa::Buffer::new();
	buf.put_u8(marker);
	buf.put_slice(digits.format(value).as_bytes());
	buf.put_slice(CRLF);
}

#[inline]
fn encode_bulk_string(buf: &mut BytesMut, text: &Text, arena: &Arena) {
	let data = text.as_bytes(arena);
	buf.reserve(data.len() + 16);
	encode_decimal(buf, BULK_STRING, data.len());
	buf.put_slice(data);
	buf.put_slice(CRLF);
}

fn encode_array(buf: &mut BytesMut, reply: &RedisReply, arena: &Arena) -> Result<(), EncodeError> {
	encode_decimal(buf, ARRAY, reply.len());
	for child in reply.elements(arena) {
		child.encode_to(arena, buf)?;
	}
	Ok(())
}
