// SPDX-License-Identifier: Apache-2.0

use pretty_assertions::assert_eq;
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use sigbuf::{StorageError, TypedRingBuffer, TypedView};

#[macro_use]
mod common;

#[quickcheck]
fn counts_agree(capacity: u8, pushes: Vec<u8>) -> TestResult {
	let capacity = capacity as usize % 16;
	let mut ring = TypedRingBuffer::<u32>::new(capacity).unwrap();
	for n in pushes {
		let values = vec![n as u32; n as usize % 8];
		let _ = ring.push_slice(&values);
		if ring.len() + ring.free() != capacity {
			return TestResult::failed()
		}
		ring.discard(1);
		if ring.len() * 4 != ring.as_bytes().bytes_available() {
			return TestResult::failed()
		}
	}
	qc_assert_eq!(ring.capacity(), capacity)
}

#[test]
fn push_discard_resize() {
	let mut ring = TypedRingBuffer::<f64>::new(12).unwrap();
	assert_eq!(ring.capacity(), 12);

	let data = TypedView::from_slice(&[1.0, 2.0, 3.0, 4.0]).unwrap();
	ring.push(&data).unwrap();
	assert_eq!(ring.len(), 4);

	assert_eq!(ring.discard(1), 1);
	assert_eq!(ring.len(), 3);
	assert_eq!(ring.to_vec(), [2.0, 3.0, 4.0]);

	ring.resize(8).unwrap();
	assert_eq!(ring.len(), 0);
	assert_eq!(ring.capacity(), 8);
}

#[test]
fn pull_across_boundary() {
	let mut ring = TypedRingBuffer::<i16>::new(4).unwrap();
	ring.push_slice(&[1, 2, 3]).unwrap();
	assert_eq!(ring.discard(2), 2);
	ring.push_slice(&[4, 5, 6]).unwrap();
	assert!(ring.is_full());
	assert!(!ring.as_bytes().is_contiguous());

	let mut dst = TypedView::<i16>::allocate(4).unwrap();
	ring.pull(&mut dst, 4).unwrap();
	assert_eq!(dst, [3, 4, 5, 6]);
	assert!(ring.is_empty());
}

#[test]
fn pull_rejected() {
	let mut ring = TypedRingBuffer::<u32>::new(4).unwrap();
	ring.push_slice(&[1, 2]).unwrap();

	let mut dst = TypedView::<u32>::allocate(1).unwrap();
	assert_eq!(
		ring.pull(&mut dst, 2),
		Err(StorageError::DestinationTooSmall { requested: 8, capacity: 4 })
	);

	let mut dst = TypedView::<u32>::allocate(4).unwrap();
	assert_eq!(
		ring.pull(&mut dst, 3),
		Err(StorageError::InsufficientData { requested: 12, available: 8 })
	);
	assert_eq!(ring.len(), 2);

	let mut slice = [0; 2];
	ring.pull_into_slice(&mut slice).unwrap();
	assert_eq!(slice, [1, 2]);
}

#[test]
fn push_rejected() {
	let mut ring = TypedRingBuffer::<u64>::new(2).unwrap();
	ring.push_slice(&[1]).unwrap();
	assert_eq!(
		ring.push_slice(&[2, 3]),
		Err(StorageError::CapacityExceeded { requested: 16, free: 8 })
	);
	assert_eq!(ring.len(), 1);
}

#[test]
fn element_access() {
	let mut ring = TypedRingBuffer::<f32>::new(3).unwrap();
	ring.push_slice(&[0.5, 1.5]).unwrap();
	ring.discard(1);
	ring.push_slice(&[2.5, 3.5]).unwrap();

	assert_eq!(ring.get(0), Some(1.5));
	assert_eq!(ring.get(2), Some(3.5));
	assert_eq!(ring.get(3), None);
	assert_eq!(ring.set(1, -1.0), Some(2.5));
	assert_eq!(ring.set(3, -1.0), None);
	assert_eq!(ring.to_vec(), [1.5, -1.0, 3.5]);

	unsafe {
		ring.set_unchecked(2, 9.0);
		assert_eq!(ring.get_unchecked(2), 9.0);
	}
}

#[test]
fn clone_keeps_count() {
	let mut a = TypedRingBuffer::<u16>::new(4).unwrap();
	a.push_slice(&[1, 2, 3]).unwrap();

	let mut b = a.clone();
	assert_eq!(b.len(), 3);
	b.push_slice(&[4]).unwrap();
	assert_eq!(a.to_vec(), [1, 2, 3]);
	assert_eq!(b.to_vec(), [1, 2, 3, 4]);

	a.clear();
	assert!(a.is_empty());
	assert_eq!(b.len(), 4);
}
