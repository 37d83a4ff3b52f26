// SPDX-License-Identifier: Apache-2.0

//! A fixed-capacity byte ring buffer.

use std::cmp::min;
use std::fmt;
use std::ops::Range;
use all_asserts::debug_assert_le;
use crate::error::{Result, StorageError};
use crate::options::AllocOptions;
use crate::raw::RawStorage;

/// A fixed-capacity circular byte buffer over one [`RawStorage`] allocation.
///
/// Bytes are pushed at the write position, `stored` bytes past the read cursor,
/// and pulled from the read cursor. Both positions wrap modulo the capacity, so a
/// push or pull that crosses the end of the allocation is split into two copies.
/// Pushing never grows the buffer; it fails when the bytes don't fit.
///
/// Cloning shares the allocation in constant time (`O(1)`). Shared memory is
/// copy-on-write: writing to a clone first copies its stored bytes to a fresh
/// allocation, leaving the other clones untouched.
#[derive(Clone, Default)]
pub struct RingBuffer {
	buf: RawStorage<'static>,
	options: AllocOptions,
	/// The read cursor, in `[0, capacity)`.
	head: usize,
	/// The number of stored bytes, in `[0, capacity]`.
	len: usize,
}

impl RingBuffer {
	/// Creates a ring buffer holding up to `capacity` bytes.
	pub fn new(capacity: usize) -> Result<Self> {
		Self::with_options(capacity, AllocOptions::default())
	}

	/// Creates a ring buffer holding up to `capacity` bytes, allocated with
	/// `options`.
	pub fn with_options(capacity: usize, options: AllocOptions) -> Result<Self> {
		Ok(Self {
			buf: RawStorage::allocate_with(capacity, options)?,
			options,
			head: 0,
			len: 0,
		})
	}

	/// Returns the capacity in bytes.
	pub fn capacity(&self) -> usize { self.buf.len() }
	/// Returns the number of bytes available for reading.
	pub fn bytes_available(&self) -> usize { self.len }
	/// Returns the number of bytes that can be pushed before the buffer is full.
	pub fn bytes_free(&self) -> usize { self.capacity() - self.len }
	/// Returns the read cursor, the position of the next unread byte.
	pub fn read_cursor(&self) -> usize { self.head }
	/// Returns `true` if no bytes are stored.
	pub fn is_empty(&self) -> bool { self.len == 0 }
	/// Returns `true` if no bytes can be pushed.
	pub fn is_full(&self) -> bool { self.len == self.capacity() }
	/// Returns `true` if the stored bytes don't wrap around the end of the buffer.
	pub fn is_contiguous(&self) -> bool { self.head + self.len <= self.capacity() }
	/// Returns `true` if the allocation is shared with a clone.
	pub fn is_shared(&self) -> bool { self.buf.is_shared() }

	/// Pushes all bytes in the `src` window, or fails with
	/// [`CapacityExceeded`](StorageError::CapacityExceeded) without pushing any
	/// if there isn't room for them.
	pub fn push(&mut self, src: &RawStorage<'_>) -> Result {
		let count = src.len();
		self.check_free(count)?;
		if count == 0 {
			return Ok(())
		}
		self.make_unique()?;
		let (a, b) = self.physical_ranges(self.len, count);
		let first = a.len();
		let memory = self.memory_mut();
		// Safety: the ranges together are exactly `count` bytes long.
		unsafe {
			src.read_unchecked(0, &mut memory[a]);
			src.read_unchecked(first, &mut memory[b]);
		}
		self.len += count;
		Ok(())
	}

	/// Pushes all bytes in `src`, or fails without pushing any if there isn't room
	/// for them.
	pub fn push_slice(&mut self, src: &[u8]) -> Result {
		self.check_free(src.len())?;
		if src.is_empty() {
			return Ok(())
		}
		self.make_unique()?;
		let (a, b) = self.physical_ranges(self.len, src.len());
		let (src_a, src_b) = src.split_at(a.len());
		let memory = self.memory_mut();
		memory[a].copy_from_slice(src_a);
		memory[b].copy_from_slice(src_b);
		self.len += src.len();
		Ok(())
	}

	/// Pulls `count` bytes into the start of the `dst` window. Fails without
	/// pulling if `dst` is shorter than `count` or fewer than `count` bytes are
	/// stored. Pulled bytes aren't cleared from memory.
	pub fn pull(&mut self, dst: &mut RawStorage<'_>, count: usize) -> Result {
		if count > dst.len() {
			return Err(StorageError::DestinationTooSmall { requested: count, capacity: dst.len() })
		}

		let (a, b) = self.stored_ranges(count)?;
		let first = a.len();
		let memory = self.memory();
		// Safety: dst was checked to hold `count` bytes.
		unsafe {
			dst.write_unchecked(0, &memory[a]);
			dst.write_unchecked(first, &memory[b]);
		}
		self.consume(count);
		Ok(())
	}

	/// Pulls exactly `dst.len()` bytes into `dst`, failing without pulling if fewer
	/// are stored.
	pub fn pull_into_slice(&mut self, dst: &mut [u8]) -> Result {
		let (a, b) = self.stored_ranges(dst.len())?;
		let (dst_a, dst_b) = dst.split_at_mut(a.len());
		let memory = self.memory();
		dst_a.copy_from_slice(&memory[a]);
		dst_b.copy_from_slice(&memory[b]);
		self.consume(dst.len());
		Ok(())
	}

	/// Discards up to `count` bytes from the front of the buffer without copying
	/// them, returning the number of bytes discarded.
	pub fn discard(&mut self, count: usize) -> usize {
		let count = min(count, self.len);
		self.consume(count);
		count
	}

	/// Clears the buffer. Memory isn't touched; stored bytes are only forgotten.
	pub fn clear(&mut self) {
		self.head = 0;
		self.len = 0;
	}

	/// Resizes the buffer to hold `capacity` bytes. Has no effect if the capacity
	/// is unchanged.
	///
	/// Stored bytes are *discarded*, not moved to the new allocation. Callers that
	/// need them must pull them first. If the new allocation fails, the buffer is
	/// left empty with zero capacity.
	pub fn resize(&mut self, capacity: usize) -> Result {
		if capacity == self.capacity() {
			return Ok(())
		}

		log::debug!("resizing ring buffer from {} to {capacity} bytes", self.capacity());
		self.clear();
		match RawStorage::allocate_with(capacity, self.options) {
			Ok(buf) => {
				self.buf = buf;
				Ok(())
			}
			Err(err) => {
				self.buf = RawStorage::empty();
				Err(err)
			}
		}
	}

	/// Returns the byte `index` positions past the read cursor, or `None` if fewer
	/// than `index + 1` bytes are stored.
	pub fn get(&self, index: usize) -> Option<u8> {
		// Safety: bounds checked.
		(index < self.len).then(|| unsafe { self.get_unchecked(index) })
	}

	/// Replaces the byte `index` positions past the read cursor, returning the old
	/// byte. Returns `None` without writing if fewer than `index + 1` bytes are
	/// stored, or if the buffer is shared and copying it failed.
	pub fn set(&mut self, index: usize, value: u8) -> Option<u8> {
		if index >= self.len {
			return None
		}

		self.make_unique().ok()?;
		let pos = self.wrap(index);
		Some(std::mem::replace(&mut self.memory_mut()[pos], value))
	}

	/// Returns the byte `index` positions past the read cursor, at physical offset
	/// `(read_cursor + index) mod capacity`, without checking bounds.
	///
	/// # Safety
	///
	/// `index` must be less than [`bytes_available`](Self::bytes_available). Reading
	/// beyond the stored bytes returns stale data.
	///
	/// # Panics
	///
	/// Panics if the capacity is zero.
	#[inline]
	pub unsafe fn get_unchecked(&self, index: usize) -> u8 {
		self.buf.get_unchecked(self.wrap(index))
	}

	/// Sets the byte `index` positions past the read cursor without checking
	/// bounds. The write is skipped if the buffer is shared and copying it fails.
	///
	/// # Safety
	///
	/// `index` must be less than [`bytes_available`](Self::bytes_available).
	///
	/// # Panics
	///
	/// Panics if the capacity is zero.
	#[inline]
	pub unsafe fn set_unchecked(&mut self, index: usize, value: u8) {
		if self.make_unique().is_ok() {
			let pos = self.wrap(index);
			*self.memory_mut().get_unchecked_mut(pos) = value;
		}
	}

	/// Copies `dst.len()` stored bytes, starting `offset` bytes past the read
	/// cursor, into `dst` without consuming them. Fails without copying if the
	/// range extends past the stored bytes.
	pub fn read_at(&self, offset: usize, dst: &mut [u8]) -> Result {
		self.check_stored(offset, dst.len())?;
		// Safety: the range is within the stored bytes.
		unsafe { self.read_unchecked(offset, dst) }
		Ok(())
	}

	/// Overwrites stored bytes, starting `offset` bytes past the read cursor, with
	/// `src`. Fails without writing if the range extends past the stored bytes.
	pub fn write_at(&mut self, offset: usize, src: &[u8]) -> Result {
		self.check_stored(offset, src.len())?;
		// Safety: the range is within the stored bytes.
		unsafe { self.write_unchecked(offset, src) }
	}

	/// Copies bytes starting `offset` bytes past the read cursor into `dst`,
	/// without checking bounds.
	///
	/// # Safety
	///
	/// `offset + dst.len()` must not exceed the stored byte count.
	pub(crate) unsafe fn read_unchecked(&self, offset: usize, dst: &mut [u8]) {
		let (a, b) = self.physical_ranges(offset, dst.len());
		let (dst_a, dst_b) = dst.split_at_mut(a.len());
		let memory = self.memory();
		dst_a.copy_from_slice(&memory[a]);
		dst_b.copy_from_slice(&memory[b]);
	}

	/// Copies `src` over bytes starting `offset` bytes past the read cursor,
	/// without checking bounds.
	///
	/// # Safety
	///
	/// `offset + src.len()` must not exceed the stored byte count.
	pub(crate) unsafe fn write_unchecked(&mut self, offset: usize, src: &[u8]) -> Result {
		if src.is_empty() {
			return Ok(())
		}
		self.make_unique()?;
		let (a, b) = self.physical_ranges(offset, src.len());
		let (src_a, src_b) = src.split_at(a.len());
		let memory = self.memory_mut();
		memory[a].copy_from_slice(src_a);
		memory[b].copy_from_slice(src_b);
		Ok(())
	}

	/// Returns a pair of slices which contain the stored bytes, in order.
	pub fn as_slices(&self) -> (&[u8], &[u8]) {
		let (a, b) = self.physical_ranges(0, self.len);
		let memory = self.memory();
		(&memory[a], &memory[b])
	}

	/// Copies the stored bytes, in order, into a new vector without consuming
	/// them.
	pub fn to_vec(&self) -> Vec<u8> {
		let (a, b) = self.as_slices();
		[a, b].concat()
	}

	/// Copies the stored bytes to an unshared allocation if this buffer shares its
	/// memory with a clone, returning `true` if a copy was made. The stored bytes
	/// are moved to the start of the new allocation.
	pub fn make_unique(&mut self) -> Result<bool> {
		if !self.buf.is_shared() {
			return Ok(false)
		}

		let mut buf = RawStorage::allocate_with(self.capacity(), self.options)?;
		let (a, b) = self.as_slices();
		buf.write_at(0, a);
		buf.write_at(a.len(), b);
		log::trace!("copied {} shared bytes to a new ring allocation", self.len);
		self.buf = buf;
		self.head = 0;
		Ok(true)
	}

	/// Wraps a logical offset from the read cursor to a physical offset.
	#[inline]
	fn wrap(&self, index: usize) -> usize {
		(self.head + index) % self.capacity()
	}

	fn consume(&mut self, count: usize) {
		debug_assert_le!(count, self.len);
		if count > 0 {
			self.head = self.wrap(count);
			self.len -= count;
		}
	}

	/// Returns the physical ranges of `count` bytes starting `offset` bytes past
	/// the read cursor, split where they cross the end of the buffer.
	fn physical_ranges(&self, offset: usize, count: usize) -> (Range<usize>, Range<usize>) {
		if count == 0 {
			return (0..0, 0..0)
		}

		let start = self.wrap(offset);
		let first = min(count, self.capacity() - start);
		(start..start + first, 0..count - first)
	}

	fn check_free(&self, count: usize) -> Result {
		let free = self.bytes_free();
		if count > free {
			return Err(StorageError::CapacityExceeded { requested: count, free })
		}
		Ok(())
	}

	/// Returns the stored ranges to read `count` bytes from, or an error if fewer
	/// are stored.
	fn stored_ranges(&self, count: usize) -> Result<(Range<usize>, Range<usize>)> {
		if count > self.len {
			return Err(StorageError::InsufficientData { requested: count, available: self.len })
		}
		Ok(self.physical_ranges(0, count))
	}

	fn check_stored(&self, offset: usize, count: usize) -> Result {
		match offset.checked_add(count) {
			Some(end) if end <= self.len => Ok(()),
			_ => Err(StorageError::InsufficientData {
				requested: offset.saturating_add(count),
				available: self.len
			})
		}
	}

	fn memory(&self) -> &[u8] {
		// Safety: no views of the ring's storage escape, and clones copy before
		// writing, so nothing writes this memory while it's shared.
		unsafe { self.buf.as_slice() }
	}

	/// Returns the whole allocation for writing. Callers must make the storage
	/// unique first.
	fn memory_mut(&mut self) -> &mut [u8] {
		debug_assert!(!self.buf.is_shared(), "ring memory must be unique before writing");
		// Safety: the storage is unshared, and no views of it escape.
		unsafe { self.buf.as_mut_slice() }
	}
}

impl fmt::Debug for RingBuffer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RingBuffer")
		 .field("capacity", &self.capacity())
		 .field("read_cursor", &self.head)
		 .field("stored", &self.len)
		 .finish()
	}
}
