// SPDX-License-Identifier: Apache-2.0

use pretty_assertions::assert_eq;
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use sigbuf::{RawStorage, RingBuffer, StorageError, TypedView};

#[macro_use]
mod common;

use common::{check_accounting, ring_at};

#[derive(Copy, Clone, Debug)]
enum Op {
	Push(u8),
	Pull(u8),
	Discard(u8),
	Clear,
}

impl quickcheck::Arbitrary for Op {
	fn arbitrary(g: &mut quickcheck::Gen) -> Self {
		match u8::arbitrary(g) % 7 {
			0 | 1 | 2 => Op::Push(u8::arbitrary(g) % 24),
			3 | 4 => Op::Pull(u8::arbitrary(g) % 24),
			5 => Op::Discard(u8::arbitrary(g) % 24),
			_ => Op::Clear,
		}
	}
}

/// Runs random operations against a ring and a plain queue, checking the ring
/// holds the same bytes after every step.
#[quickcheck]
fn matches_queue(capacity: u8, ops: Vec<Op>) -> TestResult {
	use std::collections::VecDeque;

	let capacity = capacity as usize % 32;
	let mut ring = RingBuffer::new(capacity).unwrap();
	let mut model = VecDeque::new();
	let mut next = 0u8;

	for op in ops {
		match op {
			Op::Push(n) => {
				let data: Vec<u8> = (0..n).map(|_| { next = next.wrapping_add(1); next }).collect();
				let fits = model.len() + data.len() <= capacity;
				if ring.push_slice(&data).is_ok() != fits {
					return TestResult::error(format!("push of {n} bytes, fits: {fits}"))
				}
				if fits {
					model.extend(data);
				}
			}
			Op::Pull(n) => {
				let mut dst = vec![0; n as usize];
				let enough = model.len() >= dst.len();
				if ring.pull_into_slice(&mut dst).is_ok() != enough {
					return TestResult::error(format!("pull of {n} bytes, enough: {enough}"))
				}
				if enough {
					let expected: Vec<u8> = model.drain(..dst.len()).collect();
					if dst != expected {
						return TestResult::error(format!("pulled {dst:?}, expected {expected:?}"))
					}
				}
			}
			Op::Discard(n) => {
				let count = (n as usize).min(model.len());
				if ring.discard(n as usize) != count {
					return TestResult::failed()
				}
				model.drain(..count);
			}
			Op::Clear => {
				ring.clear();
				model.clear();
			}
		}

		check_accounting(&ring);
		let expected: Vec<u8> = model.iter().copied().collect();
		if ring.to_vec() != expected {
			return qc_assert_eq!(ring.to_vec(), expected, "after {op:?}")
		}
	}
	TestResult::passed()
}

#[quickcheck]
fn round_trip_across_boundary(cursor: u8, data: Vec<u8>) -> TestResult {
	if data.is_empty() {
		return TestResult::discard()
	}

	let capacity = data.len();
	let mut ring = ring_at(capacity, cursor as usize % capacity);
	ring.push_slice(&data).unwrap();
	assert!(ring.is_full());

	let mut dst = RawStorage::allocate(capacity).unwrap();
	ring.pull(&mut dst, capacity).unwrap();
	assert!(ring.is_empty());
	qc_assert_eq!(dst.to_vec(), data)
}

#[test]
fn push_exactly_to_boundary() {
	let mut ring = ring_at(8, 4);
	ring.push_slice(&[1, 2, 3, 4]).unwrap();
	assert!(ring.is_contiguous());
	assert_eq!(ring.as_slices(), (&[1u8, 2, 3, 4][..], &[0u8; 0][..]));

	ring.push_slice(&[5]).unwrap();
	assert!(!ring.is_contiguous());
	assert_eq!(ring.to_vec(), [1, 2, 3, 4, 5]);
}

#[test]
fn push_rejected_when_full() {
	let mut ring = RingBuffer::new(4).unwrap();
	ring.push_slice(&[1, 2, 3]).unwrap();
	assert_eq!(
		ring.push_slice(&[4, 5]),
		Err(StorageError::CapacityExceeded { requested: 2, free: 1 })
	);
	assert_eq!(ring.to_vec(), [1, 2, 3]);
}

#[test]
fn pull_rejected() {
	let mut ring = RingBuffer::new(8).unwrap();
	ring.push_slice(&[1, 2, 3]).unwrap();

	let mut small = RawStorage::allocate(2).unwrap();
	assert_eq!(
		ring.pull(&mut small, 3),
		Err(StorageError::DestinationTooSmall { requested: 3, capacity: 2 })
	);
	let mut large = RawStorage::allocate(8).unwrap();
	assert_eq!(
		ring.pull(&mut large, 4),
		Err(StorageError::InsufficientData { requested: 4, available: 3 })
	);
	assert_eq!(ring.bytes_available(), 3);
	assert_eq!(ring.read_cursor(), 0);
}

#[test]
fn pull_into_subview() {
	let mut ring = RingBuffer::new(8).unwrap();
	ring.push_slice(&[1, 2, 3]).unwrap();

	let dst = RawStorage::allocate(8).unwrap();
	ring.pull(&mut dst.subview(4, 4), 2).unwrap();
	assert_eq!(dst.to_vec(), [0, 0, 0, 0, 1, 2, 0, 0]);
}

#[test]
fn push_from_view() {
	let mut src = RawStorage::allocate(6).unwrap();
	src.copy_from_slice(&[1, 2, 3, 4, 5, 6]);

	let mut ring = ring_at(4, 3);
	ring.push(&src.subview(2, 3)).unwrap();
	assert_eq!(ring.to_vec(), [3, 4, 5]);
	assert_eq!(ring.as_slices(), (&[3u8][..], &[4u8, 5][..]));
}

/// Twelve-byte ring: an oversized push of four `u64` samples is rejected, then a
/// push of twelve bytes fills it and a pull of five leaves seven.
#[test]
fn fill_and_partial_pull() {
	let mut ring = RingBuffer::new(12).unwrap();

	let samples = TypedView::from_slice(&[1u64, 2, 3, 4]).unwrap();
	assert_eq!(
		ring.push(samples.as_raw()),
		Err(StorageError::CapacityExceeded { requested: 32, free: 12 })
	);
	assert_eq!(ring.bytes_available(), 0);
	assert_eq!(ring.read_cursor(), 0);

	let data: Vec<u8> = (10..22).collect();
	ring.push_slice(&data).unwrap();
	assert_eq!(ring.bytes_available(), 12);
	assert_eq!(ring.bytes_free(), 0);

	let mut dst = RawStorage::allocate(5).unwrap();
	ring.pull(&mut dst, 5).unwrap();
	assert_eq!(dst.to_vec(), &data[..5]);
	assert_eq!(ring.bytes_available(), 7);
	assert_eq!(ring.to_vec(), &data[5..]);
}

/// Twelve-byte ring: push eight, pull six, push eight more across the end.
#[test]
fn wraparound_scenario() {
	let mut ring = RingBuffer::new(12).unwrap();
	let data: Vec<u8> = (1..=8).collect();
	ring.push_slice(&data).unwrap();

	let mut dst = [0; 6];
	ring.pull_into_slice(&mut dst).unwrap();
	assert_eq!(dst, [1, 2, 3, 4, 5, 6]);
	assert_eq!(ring.read_cursor(), 6);
	assert_eq!(ring.bytes_available(), 2);

	ring.push_slice(&data).unwrap();
	assert_eq!(ring.bytes_available(), 10);
	assert_eq!(ring.bytes_free(), 2);
	assert_eq!(ring.to_vec(), [7, 8, 1, 2, 3, 4, 5, 6, 7, 8]);
	assert_eq!(ring.get(2), Some(1));
	assert_eq!(ring.get(10), None);
}

#[test]
fn discard_and_clear() {
	let mut ring = ring_at(8, 5);
	ring.push_slice(&[1, 2, 3, 4, 5]).unwrap();

	assert_eq!(ring.discard(0), 0);
	assert_eq!(ring.read_cursor(), 5);
	assert_eq!(ring.discard(4), 4);
	assert_eq!(ring.read_cursor(), 1);
	assert_eq!(ring.discard(100), 1);
	assert!(ring.is_empty());

	ring.push_slice(&[1]).unwrap();
	ring.clear();
	ring.clear();
	assert!(ring.is_empty());
	assert_eq!(ring.read_cursor(), 0);
	assert_eq!(ring.capacity(), 8);
}

#[test]
fn resize() {
	let mut ring = RingBuffer::new(4).unwrap();
	ring.push_slice(&[1, 2]).unwrap();

	ring.resize(4).unwrap();
	assert_eq!(ring.to_vec(), [1, 2]);

	ring.resize(16).unwrap();
	assert!(ring.is_empty());
	assert_eq!(ring.capacity(), 16);
}

#[test]
fn resize_failure_leaves_empty() {
	let mut ring = RingBuffer::new(4).unwrap();
	ring.push_slice(&[1, 2]).unwrap();

	assert!(ring.resize(usize::MAX).unwrap_err().is_allocation());
	assert_eq!(ring.capacity(), 0);
	assert!(ring.is_empty());
	assert!(ring.push_slice(&[1]).is_err());
}

#[test]
fn set_byte() {
	let mut ring = ring_at(4, 3);
	ring.push_slice(&[1, 2]).unwrap();
	assert_eq!(ring.set(1, 9), Some(2));
	assert_eq!(ring.set(2, 9), None);
	assert_eq!(ring.to_vec(), [1, 9]);

	unsafe {
		ring.set_unchecked(0, 8);
		assert_eq!(ring.get_unchecked(0), 8);
	}
}

#[test]
fn read_write_at() {
	let mut ring = ring_at(6, 4);
	ring.push_slice(&[1, 2, 3, 4]).unwrap();

	ring.write_at(1, &[7, 7]).unwrap();
	let mut dst = [0; 3];
	ring.read_at(1, &mut dst).unwrap();
	assert_eq!(dst, [7, 7, 4]);
	assert!(ring.read_at(2, &mut dst).is_err());
	assert_eq!(ring.bytes_available(), 4);
}

#[test]
fn clone_copies_on_write() {
	let mut a = ring_at(8, 6);
	a.push_slice(&[1, 2, 3, 4]).unwrap();

	let mut b = a.clone();
	assert!(a.is_shared());
	assert_eq!(b.to_vec(), [1, 2, 3, 4]);

	b.push_slice(&[5]).unwrap();
	assert!(!a.is_shared());
	assert!(!b.is_shared());
	assert_eq!(b.read_cursor(), 0);
	assert_eq!(a.to_vec(), [1, 2, 3, 4]);
	assert_eq!(b.to_vec(), [1, 2, 3, 4, 5]);

	// Pulling from a clone reads shared memory without copying it.
	let mut c = a.clone();
	c.discard(2);
	assert!(c.is_shared());
	assert_eq!(a.to_vec(), [1, 2, 3, 4]);
	assert_eq!(c.to_vec(), [3, 4]);
}

#[test]
fn empty_push_keeps_sharing() {
	let mut a = RingBuffer::new(8).unwrap();
	a.push_slice(&[1, 2]).unwrap();

	let mut b = a.clone();
	b.push_slice(&[]).unwrap();
	b.push(&RawStorage::empty()).unwrap();
	assert!(b.is_shared());
	b.write_at(0, &[]).unwrap();
	assert!(a.is_shared());
	assert_eq!(b.to_vec(), [1, 2]);
}
