//! Resumable RESP reply parser.
//!
//! A reply is parsed in place. When the buffer runs dry inside an array, the
//! arrays on the way down keep a resume cursor and the next call continues
//! from there, so the caller only has to append bytes and call again with
//! the same reply and arena.

use bytes::Buf;
use bytes::BytesMut;
use log::error;
use log::trace;

use crate::arena::Arena;
use crate::arena::ReplySpan;
use crate::error::ParseError;
use crate::error::ReplyError;
use crate::types::RedisReply;
use crate::types::StringKind;
use crate::utils::*;

/// Default cap on a single bulk string or array allocation.
pub const DEFAULT_MAX_ALLOCATION_SIZE: usize = 64 * 1024 * 1024;

/// Default cap on array nesting.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Limits applied to untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
	/// Largest bulk string, in bytes, and largest array footprint.
	pub max_allocation_size: usize,
	/// Deepest array nesting accepted.
	pub max_depth: usize,
}

impl Default for ParserConfig {
	fn default() -> Self {
		Self {
			max_allocation_size: DEFAULT_MAX_ALLOCATION_SIZE,
			max_depth: DEFAULT_MAX_DEPTH,
		}
	}
}

impl ParserConfig {
	/// Most children a single array header may declare, and most children
	/// one reply may reserve across all of its nested arrays.
	pub fn max_array_len(&self) -> usize {
		self.max_allocation_size / std::mem::size_of::<RedisReply>()
	}
}

/// Result of a parsing attempt.
#[derive(Debug)]
pub enum ReplyParseResult {
	/// The reply now holds a complete value.
	Complete,
	/// The buffer does not contain enough data yet. Append and call again.
	Incomplete,
	/// The stream is unusable: malformed input or an exhausted arena.
	Error(ReplyError),
}

impl ReplyParseResult {
	pub fn is_complete(&self) -> bool {
		matches!(self, ReplyParseResult::Complete)
	}

	pub fn is_incomplete(&self) -> bool {
		matches!(self, ReplyParseResult::Incomplete)
	}
}

/// Where the value being worked on lives.
#[derive(Debug, Clone, Copy)]
enum Frame {
	Root,
	Child { elements: ReplySpan, index: usize },
}

/// A RESP reply parser that supports streaming.
///
/// The parser holds no per-reply state between calls; the frame stack is
/// rebuilt from the resume cursors on every call and only kept to reuse its
/// allocation.
#[derive(Debug, Default)]
pub struct ReplyParser {
	config: ParserConfig,
	frames: Vec<Frame>,
}

impl ReplyParser {
	pub fn new() -> Self {
		Self::with_config(ParserConfig::default())
	}

	pub fn with_config(config: ParserConfig) -> Self {
		Self {
			config,
			frames: Vec::new(),
		}
	}

	pub fn config(&self) -> &ParserConfig {
		&self.config
	}

	/// Parse one reply from the front of `buf` into `reply`.
	///
	/// On `Complete` the buffer is advanced exactly past the reply. On
	/// `Incomplete` the frame that ran out of bytes is left in the buffer
	/// untouched; array headers and children decoded before it stay consumed
	/// and are remembered by the resume cursors in `reply`.
	///
	/// `reply` must be `Nil`, a finished value (it is overwritten), or a
	/// suspended array built in `arena` by an earlier call.
	pub fn parse(
		&mut self,
		reply: &mut RedisReply,
		buf: &mut BytesMut,
		arena: &mut Arena,
	) -> ReplyParseResult {
		self.frames.clear();
		self.frames.push(Frame::Root);

		// Only a suspended reply carries its total over from earlier calls.
		let mut reserved = match reply.resume_cursor() {
			Some(_) => reply.reserved_items(),
			None => 0,
		};
		let result = self.drive(reply, buf, arena, &mut reserved);
		reply.set_reserved_items(reserved);

		match result {
			Ok(true) => ReplyParseResult::Complete,
			Ok(false) => {
				trace!("reply incomplete, {} bytes buffered", buf.len());
				ReplyParseResult::Incomplete
			}
			Err(e) => {
				error!("Fail to parse redis reply: {}", e);
				ReplyParseResult::Error(e)
			}
		}
	}

	fn drive(
		&mut self,
		reply: &mut RedisReply,
		buf: &mut BytesMut,
		arena: &mut Arena,
		reserved: &mut usize,
	) -> Result<bool, ReplyError> {
		while let Some(&frame) = self.frames.last() {
			let mut slot = load(frame, reply, arena);

			if let Some(cursor) = slot.resume_cursor() {
				if cursor == slot.len() {
					slot.set_resume_cursor(None);
					store(frame, reply, arena, slot);
					self.finish_frame(reply, arena);
					continue;
				}
				// The stack holds the root plus one frame per enclosing array.
				if self.frames.len() > self.config.max_depth {
					return Err(ParseError::NestingTooDeep(self.frames.len()).into());
				}
				if let Some(elements) = slot.element_span() {
					self.frames.push(Frame::Child {
						elements,
						index: cursor,
					});
				}
				continue;
			}

			let Some(value) = self.parse_value(buf, arena, reserved)? else {
				return Ok(false);
			};
			store(frame, reply, arena, value);
			if value.resume_cursor().is_none() {
				self.finish_frame(reply, arena);
			}
		}
		Ok(true)
	}

	/// Pop the finished frame and move its parent's cursor past it.
	fn finish_frame(&mut self, reply: &mut RedisReply, arena: &mut Arena) {
		self.frames.pop();
		if let Some(&parent) = self.frames.last() {
			let mut slot = load(parent, reply, arena);
			if let Some(cursor) = slot.resume_cursor() {
				slot.set_resume_cursor(Some(cursor + 1));
				store(parent, reply, arena, slot);
			}
		}
	}

	/// Decode one value from the front of `buf`.
	///
	/// Returns `Ok(None)` without touching `buf` when more bytes are needed.
	/// A non-empty array comes back with its children still `Nil` and its
	/// cursor at zero.
	fn parse_value(
		&self,
		buf: &mut BytesMut,
		arena: &mut Arena,
		reserved: &mut usize,
	) -> Result<Option<RedisReply>, ReplyError> {
		let Some(&marker) = buf.first() else {
			return Ok(None);
		};

		match marker {
			SIMPLE_STRING | ERROR => parse_simple_string(marker, buf, arena),
			INTEGER | BULK_STRING | ARRAY => {
				let Some((value, header_len)) = peek_header(buf)? else {
					return Ok(None);
				};
				match marker {
					INTEGER => {
						buf.advance(header_len);
						Ok(Some(RedisReply::Integer(value)))
					}
					BULK_STRING => self.parse_bulk_string(value, header_len, buf, arena),
					_ => self.start_array(value, header_len, buf, arena, reserved),
				}
			}
			_ => Err(ParseError::InvalidTypeMarker(marker).into()),
		}
	}

	fn parse_bulk_string(
		&self,
		len: i64,
		header_len: usize,
		buf: &mut BytesMut,
		arena: &mut Arena,
	) -> Result<Option<RedisReply>, ReplyError> {
		// $6\r\nfoobar\r\n
		if len < 0 {
			buf.advance(header_len);
			return Ok(Some(RedisReply::Nil));
		}
		let max = self.config.max_allocation_size;
		if len as u64 > max as u64 {
			return Err(ParseError::BulkStringTooLarge { len, max }.into());
		}

		let len = len as usize;
		let total = header_len + len + CRLF.len();
		if buf.len() < total {
			return Ok(None);
		}
		if &buf[header_len + len..total] != CRLF {
			return Err(ParseError::MissingCrlf.into());
		}

		let reply = RedisReply::bulk_string(&buf[header_len..header_len + len], arena)?;
		buf.advance(total);
		Ok(Some(reply))
	}

	fn start_array(
		&self,
		count: i64,
		header_len: usize,
		buf: &mut BytesMut,
		arena: &mut Arena,
		reserved: &mut usize,
	) -> Result<Option<RedisReply>, ReplyError> {
		if count < 0 {
			buf.advance(header_len);
			return Ok(Some(RedisReply::Nil));
		}
		let max = self.config.max_array_len();
		if count as u64 > max as u64 {
			return Err(ParseError::ArrayTooLarge { count, max }.into());
		}
		// Nested headers each within the limit must not add up past it.
		let total = *reserved + count as usize;
		if total > max {
			return Err(ParseError::TooManyItems { total, max }.into());
		}

		let mut reply = RedisReply::array(count as usize, arena)?;
		if count > 0 {
			reply.set_resume_cursor(Some(0));
		}
		*reserved = total;
		buf.advance(header_len);
		Ok(Some(reply))
	}
}

fn load(frame: Frame, reply: &RedisReply, arena: &Arena) -> RedisReply {
	match frame {
		Frame::Root => *reply,
		Frame::Child { elements, index } => arena.replies(elements)[index],
	}
}

fn store(frame: Frame, reply: &mut RedisReply, arena: &mut Arena, value: RedisReply) {
	match frame {
		Frame::Root => *reply = value,
		Frame::Child { elements, index } => arena.replies_mut(elements)[index] = value,
	}
}

/// `+OK\r\n` or `-ERR message\r\n`
fn parse_simple_string(
	marker: u8,
	buf: &mut BytesMut,
	arena: &mut Arena,
) -> Result<Option<RedisReply>, ReplyError> {
	let Some(pos) = find_crlf(&buf[1..]) else {
		if buf.len() > MAX_LINE_LEN {
			return Err(ParseError::LineTooLong(buf.len()).into());
		}
		return Ok(None);
	};

	let kind = if marker == ERROR {
		StringKind::Error
	} else {
		StringKind::Status
	};
	let reply = RedisReply::string(kind, &buf[1..1 + pos], arena)?;
	buf.advance(1 + pos + CRLF.len());
	Ok(Some(reply))
}

/// Decode the decimal header of `:`, `$` and `*` without consuming it.
///
/// Returns the value and the header length including the type marker and
/// CRLF.
fn peek_header(buf: &[u8]) -> Result<Option<(i64, usize)>, ParseError> {
	let window = &buf[..buf.len().min(HEADER_WINDOW)];
	match find_crlf(window) {
		Some(pos) => {
			let value = parse_integer(&window[1..pos])?;
			Ok(Some((value, pos + CRLF.len())))
		}
		None if window.len() == HEADER_WINDOW => Err(ParseError::HeaderTooLong(HEADER_WINDOW)),
		None => Ok(None),
	}
}

/// Convenience function for one-off parsing.
///
/// Meant for buffers that already hold a whole reply: `Ok(None)` means the
/// input was truncated, and any array prefix consumed on the way is lost.
/// For streams, keep a [`ReplyParser`] and the reply across reads.
pub fn parse_reply(
	buf: &mut BytesMut,
	arena: &mut Arena,
) -> Result<Option<RedisReply>, ReplyError> {
	let mut parser = ReplyParser::new();
	let mut reply = RedisReply::Nil;
	match parser.parse(&mut reply, buf, arena) {
		ReplyParseResult::Complete => Ok(Some(reply)),
		ReplyParseResult::Incomplete => Ok(None),
		ReplyParseResult::Error(e) => Err(e),
	}
}
