//! Copying parsed replies out of their parse arena

use bytes::BytesMut;
use reply::Arena;
use reply::RedisReply;
use reply::ReplyEncoder;
use reply::ReplyParser;

#[test]
fn test_copy_outlives_source_arena() {
	let input = b"*3\r\n+OK\r\n$26\r\nabcdefghijklmnopqrstuvwxyz\r\n*1\r\n:9\r\n";
	let mut parse_arena = Arena::new();
	let mut buf = BytesMut::from(&input[..]);
	let parsed = reply::parse_reply(&mut buf, &mut parse_arena)
		.unwrap()
		.unwrap();

	let mut cache = Arena::new();
	let mut kept = RedisReply::default();
	kept.copy_from_different_arena(&mut cache, &parsed, &parse_arena)
		.unwrap();
	assert_eq!(kept.view(&cache), parsed.view(&parse_arena));

	parse_arena.reset();
	assert_eq!(&kept.encode(&cache).unwrap()[..], &input[..]);
}

#[test]
fn test_copy_suspended_array_prefix() {
	let mut parser = ReplyParser::new();
	let mut arena = Arena::new();
	let mut reply = RedisReply::default();
	let mut buf = BytesMut::from(&b"*3\r\n$16\r\n0123456789abcdef\r\n:2\r\n$3\r\nba"[..]);
	assert!(parser.parse(&mut reply, &mut buf, &mut arena).is_incomplete());
	assert_eq!(reply.resume_cursor(), Some(2));

	let mut dest = Arena::new();
	let mut copy = RedisReply::default();
	copy.copy_from_different_arena(&mut dest, &reply, &arena)
		.unwrap();
	assert_eq!(copy.resume_cursor(), Some(2));
	assert_eq!(copy.len(), 3);
	assert_eq!(
		copy.view(&dest).to_string(),
		"[\"0123456789abcdef\", (integer) 2, (nil)]"
	);

	// The copy picks up where the original stopped.
	arena.reset();
	buf.extend_from_slice(b"r\r\n");
	assert!(parser.parse(&mut copy, &mut buf, &mut dest).is_complete());
	assert_eq!(copy.resume_cursor(), None);
	assert_eq!(
		copy.view(&dest).to_string(),
		"[\"0123456789abcdef\", (integer) 2, \"bar\"]"
	);
}

#[test]
fn test_copy_suspended_nested_array() {
	let mut parser = ReplyParser::new();
	let mut arena = Arena::new();
	let mut reply = RedisReply::default();
	let mut buf = BytesMut::from(&b"*2\r\n:1\r\n*2\r\n+x\r\n"[..]);
	assert!(parser.parse(&mut reply, &mut buf, &mut arena).is_incomplete());
	assert_eq!(reply.resume_cursor(), Some(1));
	assert_eq!(
		reply.element(1, &arena).unwrap().resume_cursor(),
		Some(1)
	);

	let mut dest = Arena::new();
	let mut copy = RedisReply::default();
	copy.copy_from_different_arena(&mut dest, &reply, &arena)
		.unwrap();
	arena.reset();

	buf.extend_from_slice(b"+y\r\n");
	assert!(parser.parse(&mut copy, &mut buf, &mut dest).is_complete());
	assert_eq!(
		&copy.encode(&dest).unwrap()[..],
		b"*2\r\n:1\r\n*2\r\n+x\r\n+y\r\n"
	);
}

#[test]
fn test_copy_scalars() {
	let src_arena = Arena::new();
	let mut dest = Arena::new();

	let mut copy = RedisReply::default();
	copy.copy_from_different_arena(&mut dest, &RedisReply::integer(-5), &src_arena)
		.unwrap();
	assert_eq!(copy.integer_value(), Some(-5));

	copy.copy_from_different_arena(&mut dest, &RedisReply::Nil, &src_arena)
		.unwrap();
	assert!(copy.is_nil());
	assert!(dest.is_empty());
}
