//! Performance benchmarks for the reply parser and encoder

use std::hint::black_box;

use bytes::BytesMut;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use reply::{Arena, RedisReply, ReplyEncoder, ReplyParser};

fn bench_parse(c: &mut Criterion, group_name: &str, name: &str, data: &[u8]) {
	let mut group = c.benchmark_group(group_name);
	let mut parser = ReplyParser::new();
	let mut arena = Arena::new();

	group.throughput(Throughput::Bytes(data.len() as u64));
	group.bench_function(name, |b| {
		b.iter(|| {
			arena.reset();
			let mut reply = RedisReply::default();
			let mut buf = BytesMut::from(data);
			let result = parser.parse(&mut reply, black_box(&mut buf), &mut arena);
			assert!(result.is_complete());
			reply
		})
	});
	group.finish();
}

fn bench_parse_status(c: &mut Criterion) {
	bench_parse(c, "parse_status", "status", b"+OK\r\n");
}

fn bench_parse_bulk_string(c: &mut Criterion) {
	bench_parse(c, "parse_bulk_string", "inline", b"$11\r\nhello world\r\n");
	bench_parse(
		c,
		"parse_bulk_string",
		"arena",
		b"$43\r\nthe quick brown fox jumps over the lazy dog\r\n",
	);
}

fn bench_parse_integer(c: &mut Criterion) {
	bench_parse(c, "parse_integer", "integer", b":1000\r\n");
}

fn bench_parse_large_array(c: &mut Criterion) {
	// Create array with 100 elements
	let mut data = BytesMut::from("*100\r\n");
	for i in 0..100 {
		let item = format!("$3\r\n{:03}\r\n", i);
		data.extend_from_slice(item.as_bytes());
	}
	bench_parse(c, "parse_large_array", "array_100_items", &data);
}

fn bench_parse_split(c: &mut Criterion) {
	let mut group = c.benchmark_group("parse_split");
	let data = b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\nvalue\r\n";
	let (head, tail) = data.split_at(data.len() / 2);
	let mut parser = ReplyParser::new();
	let mut arena = Arena::new();

	group.throughput(Throughput::Bytes(data.len() as u64));
	group.bench_function("two_chunks", |b| {
		b.iter(|| {
			arena.reset();
			let mut reply = RedisReply::default();
			let mut buf = BytesMut::from(head);
			assert!(parser.parse(&mut reply, &mut buf, &mut arena).is_incomplete());
			buf.extend_from_slice(tail);
			assert!(parser.parse(&mut reply, &mut buf, &mut arena).is_complete());
			reply
		})
	});
	group.finish();
}

fn bench_encode_array(c: &mut Criterion) {
	let mut group = c.benchmark_group("encode_array");
	let mut arena = Arena::new();
	let mut buf = BytesMut::from(&b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\nvalue\r\n"[..]);
	let value = reply::parse_reply(&mut buf, &mut arena).unwrap().unwrap();

	group.bench_function("array_set_command", |b| {
		b.iter(|| black_box(&value).encode(&arena).unwrap())
	});
	group.finish();
}

fn bench_print(c: &mut Criterion) {
	let mut group = c.benchmark_group("print");
	let mut arena = Arena::new();
	let value = RedisReply::bulk_string(b"binary \x00\xff \"quoted\" payload", &mut arena).unwrap();

	group.bench_function("escaped_bulk_string", |b| {
		b.iter(|| black_box(&value).view(&arena).to_string())
	});
	group.finish();
}

criterion_group!(
	benches,
	bench_parse_status,
	bench_parse_bulk_string,
	bench_parse_integer,
	bench_parse_large_array,
	bench_parse_split,
	bench_encode_array,
	bench_print,
);

criterion_main!(benches);
