//! # reply - Resumable RESP reply codec
//!
//! Decodes replies arriving in pieces off a connection into an in-place,
//! arena-backed [`RedisReply`], and encodes, prints and copies them.
//!
//! ## Features
//!
//! - **Resumable parsing**: a reply split across reads continues where it
//!   stopped, bytes of an incomplete frame are never consumed
//! - **Arena storage**: long strings and array children live in an [`Arena`]
//!   released in bulk; strings under 16 bytes are stored inline
//! - **Hostile-input guards**: allocation size and nesting depth limits
//! - **`redis-cli` style printing** through [`ReplyView`]
//!
//! ## Example
//!
//! ```rust
//! use bytes::BytesMut;
//! use reply::{Arena, RedisReply, ReplyEncoder, ReplyParseResult, ReplyParser};
//!
//! let mut arena = Arena::new();
//! let mut parser = ReplyParser::new();
//! let mut reply = RedisReply::default();
//!
//! let mut buf = BytesMut::from(&b"*2\r\n$3\r\nfoo\r\n:4"[..]);
//! assert!(matches!(
//!     parser.parse(&mut reply, &mut buf, &mut arena),
//!     ReplyParseResult::Incomplete
//! ));
//!
//! buf.extend_from_slice(b"2\r\n");
//! assert!(matches!(
//!     parser.parse(&mut reply, &mut buf, &mut arena),
//!     ReplyParseResult::Complete
//! ));
//! assert_eq!(reply.view(&arena).to_string(), "[\"foo\", (integer) 42]");
//! assert_eq!(&reply.encode(&arena).unwrap()[..], b"*2\r\n$3\r\nfoo\r\n:42\r\n");
//! ```

mod arena;
mod copy;
mod encode;
mod error;
mod parser;
mod print;
mod types;
mod utils;

pub use arena::Arena;
pub use arena::ArenaId;
pub use arena::ByteSpan;
pub use arena::ReplySpan;
pub use encode::ReplyEncoder;
pub use error::AllocError;
pub use error::EncodeError;
pub use error::ParseError;
pub use error::ReplyError;
pub use parser::DEFAULT_MAX_ALLOCATION_SIZE;
pub use parser::DEFAULT_MAX_DEPTH;
pub use parser::ParserConfig;
pub use parser::ReplyParseResult;
pub use parser::ReplyParser;
pub use parser::parse_reply;
pub use types::INLINE_CAPACITY;
pub use types::RedisReply;
pub use types::ReplyArray;
pub use types::ReplyKind;
pub use types::ReplyView;
pub use types::StringKind;
pub use types::Text;
