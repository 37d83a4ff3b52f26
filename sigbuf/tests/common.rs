// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code, unused_macros)]

use std::fmt::{Arguments, Debug};
use sigbuf::RingBuffer;

/// Like `assert_eq`, but returns a failed `TestResult` so quickcheck can shrink
/// the input instead of panicking.
macro_rules! qc_assert_eq {
	($left:expr,$right:expr) => {{
		let left = $left;
		let right = $right;
		if left == right {
			TestResult::passed()
		} else {
			TestResult::error(
				common::format_qc_assert_error(&left, &right, None)
			)
		}
	}};
	($left:expr,$right:expr,$($arg:tt)+) => {{
		let left = $left;
		let right = $right;
		if left == right {
			TestResult::passed()
		} else {
			TestResult::error(
				common::format_qc_assert_error(&left, &right, Some(format_args!($($arg)+)))
			)
		}
	}};
}

pub fn format_qc_assert_error<L: Debug, R: Debug>(left: &L, right: &R, msg: Option<Arguments>) -> String {
	match msg {
		Some(msg) => format!(
			"assertion failed `(left == right)`: {msg}\n \
			left: `{left:?}`,\nright: `{right:?}`",
		),
		None => format!(
			"assertion failed `(left == right)`:\n \
			left: `{left:?}`,\nright: `{right:?}`",
		)
	}
}

/// Returns a ring of `capacity` bytes whose read cursor sits at `cursor`, so the
/// next push starting there wraps around the end.
pub fn ring_at(capacity: usize, cursor: usize) -> RingBuffer {
	let mut ring = RingBuffer::new(capacity).unwrap();
	ring.push_slice(&vec![0; cursor]).unwrap();
	assert_eq!(ring.discard(cursor), cursor);
	ring
}

/// Checks the byte accounting invariants shared by every ring state.
pub fn check_accounting(ring: &RingBuffer) {
	assert!(ring.bytes_available() <= ring.capacity());
	assert_eq!(ring.bytes_available() + ring.bytes_free(), ring.capacity());
	assert!(ring.capacity() == 0 || ring.read_cursor() < ring.capacity());
}
