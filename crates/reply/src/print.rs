//! Human-readable rendering in the style of `redis-cli`.

use std::fmt;

use crate::types::RedisReply;
use crate::types::ReplyView;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Writes `bytes` with `"` and `\` backslash-escaped and every byte that is
/// zero or has the high bit set as `\u00` plus two hex digits, low nibble
/// first.
struct EscapedBytes<'a>(&'a [u8]);

impl fmt::Display for EscapedBytes<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let bytes = self.0;
		let mut flush_start = 0;
		for (i, &c) in bytes.iter().enumerate() {
			if c == 0 || c >= 0x80 {
				write_ascii(f, &bytes[flush_start..i])?;
				let escape = [
					b'\\',
					b'u',
					b'0',
					b'0',
					HEX_DIGITS[(c & 0xF) as usize],
					HEX_DIGITS[(c >> 4) as usize],
				];
				write_ascii(f, &escape)?;
				flush_start = i + 1;
			} else if c == b'"' || c == b'\\' {
				write_ascii(f, &bytes[flush_start..i])?;
				f.write_str("\\")?;
				write_ascii(f, &[c])?;
				flush_start = i + 1;
			}
		}
		write_ascii(f, &bytes[flush_start..])
	}
}

/// Runs between escapes never contain bytes above 0x7F.
fn write_ascii(f: &mut fmt::Formatter<'_>, run: &[u8]) -> fmt::Result {
	if run.is_empty() {
		return Ok(());
	}
	f.write_str(std::str::from_utf8(run).map_err(|_| fmt::Error)?)
}

impl fmt::Display for ReplyView<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let arena = self.arena;
		match self.reply {
			RedisReply::String(text) => {
				write!(f, "\"{}\"", EscapedBytes(text.as_bytes(arena)))
			}
			RedisReply::Array(_) => {
				f.write_str("[")?;
				for (i, child) in self.children().enumerate() {
					if i != 0 {
						f.write_str(", ")?;
					}
					fmt::Display::fmt(&child, f)?;
				}
				f.write_str("]")
			}
			RedisReply::Integer(i) => write!(f, "(integer) {}", i),
			RedisReply::Nil => f.write_str("(nil)"),
			RedisReply::Error(text) => {
				write!(f, "(error) {}", EscapedBytes(text.as_bytes(arena)))
			}
			RedisReply::Status(text) => {
				write!(f, "{}", EscapedBytes(text.as_bytes(arena)))
			}
		}
	}
}
