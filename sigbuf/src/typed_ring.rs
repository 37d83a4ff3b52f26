// SPDX-License-Identifier: Apache-2.0

//! A fixed-capacity ring buffer of typed elements.

use std::fmt;
use std::marker::PhantomData;
use crate::element::Element;
use crate::error::{Result, StorageError};
use crate::options::AllocOptions;
use crate::ring::RingBuffer;
use crate::typed::TypedView;

/// A [`RingBuffer`] holding elements of type `T`. Every element count is scaled
/// by `size_of::<T>()` and passed down to the byte ring; the stored element count
/// is kept alongside so it doesn't need recomputing, and always equals the stored
/// byte count divided by the element size.
#[derive(Clone)]
pub struct TypedRingBuffer<T: Element> {
	ring: RingBuffer,
	stored: usize,
	_elem: PhantomData<T>,
}

impl<T: Element> TypedRingBuffer<T> {
	/// Creates a ring buffer holding up to `capacity` elements.
	pub fn new(capacity: usize) -> Result<Self> {
		Self::with_options(capacity, AllocOptions::for_type::<T>())
	}

	/// Creates a ring buffer holding up to `capacity` elements, allocated with
	/// `options`.
	pub fn with_options(capacity: usize, options: AllocOptions) -> Result<Self> {
		Ok(Self {
			ring: RingBuffer::with_options(byte_size::<T>(capacity)?, options)?,
			stored: 0,
			_elem: PhantomData,
		})
	}

	/// Returns the number of stored elements.
	pub fn len(&self) -> usize { self.stored }
	/// Returns the number of elements that can be pushed before the buffer is full.
	pub fn free(&self) -> usize { self.capacity() - self.stored }
	/// Returns the capacity in elements.
	pub fn capacity(&self) -> usize { T::count_in(self.ring.capacity()) }
	/// Returns `true` if no elements are stored.
	pub fn is_empty(&self) -> bool { self.stored == 0 }
	/// Returns `true` if no elements can be pushed.
	pub fn is_full(&self) -> bool { self.free() == 0 }
	/// Returns the underlying byte ring.
	pub fn as_bytes(&self) -> &RingBuffer { &self.ring }

	/// Pushes all elements in `data`, or fails without pushing any if there isn't
	/// room for them.
	pub fn push(&mut self, data: &TypedView<'_, T>) -> Result {
		let bytes = data.as_raw().subview(0, data.len() * T::SIZE);
		self.ring.push(&bytes)?;
		self.sync_stored();
		Ok(())
	}

	/// Pushes all elements in `values`, or fails without pushing any if there isn't
	/// room for them.
	pub fn push_slice(&mut self, values: &[T]) -> Result {
		self.ring.push_slice(bytemuck::cast_slice(values))?;
		self.sync_stored();
		Ok(())
	}

	/// Pulls `count` elements into the start of `dst`. Fails without pulling if
	/// `dst` holds fewer than `count` elements or fewer than `count` are stored.
	pub fn pull(&mut self, dst: &mut TypedView<'_, T>, count: usize) -> Result {
		if count > dst.len() {
			return Err(StorageError::DestinationTooSmall {
				requested: count.saturating_mul(T::SIZE),
				capacity: dst.len() * T::SIZE
			})
		}
		if count > self.stored {
			return Err(self.insufficient(count))
		}

		self.ring.pull(dst.as_raw_mut(), count * T::SIZE)?;
		self.stored -= count;
		Ok(())
	}

	/// Pulls exactly `dst.len()` elements into `dst`, failing without pulling if
	/// fewer are stored.
	pub fn pull_into_slice(&mut self, dst: &mut [T]) -> Result {
		self.ring.pull_into_slice(bytemuck::cast_slice_mut(dst))?;
		self.sync_stored();
		Ok(())
	}

	/// Discards up to `count` elements from the front of the buffer without copying
	/// them, returning the number of elements discarded.
	pub fn discard(&mut self, count: usize) -> usize {
		let before = self.stored;
		self.ring.discard(count.saturating_mul(T::SIZE));
		self.sync_stored();
		before - self.stored
	}

	/// Clears the buffer without touching memory.
	pub fn clear(&mut self) {
		self.ring.clear();
		self.stored = 0;
	}

	/// Resizes the buffer to hold `capacity` elements, *discarding* all stored
	/// elements unless the capacity is unchanged. If the new allocation fails, or
	/// its byte size overflows, the buffer is left empty with zero capacity.
	pub fn resize(&mut self, capacity: usize) -> Result {
		let result = match byte_size::<T>(capacity) {
			Ok(size) => self.ring.resize(size),
			Err(err) => self.ring.resize(0).and(Err(err))
		};
		self.sync_stored();
		result
	}

	/// Returns the element `index` positions past the read cursor, or `None` if
	/// fewer than `index + 1` elements are stored.
	pub fn get(&self, index: usize) -> Option<T> {
		// Safety: bounds checked.
		(index < self.stored).then(|| unsafe { self.get_unchecked(index) })
	}

	/// Replaces the element `index` positions past the read cursor, returning the
	/// old element. Returns `None` without writing if fewer than `index + 1`
	/// elements are stored, or if the buffer is shared and copying it failed.
	pub fn set(&mut self, index: usize, value: T) -> Option<T> {
		let old = self.get(index)?;
		self.ring.write_at(index * T::SIZE, bytemuck::bytes_of(&value)).ok()?;
		Some(old)
	}

	/// Returns the element `index` positions past the read cursor without checking
	/// bounds.
	///
	/// # Safety
	///
	/// `index` must be less than [`len`](Self::len).
	pub unsafe fn get_unchecked(&self, index: usize) -> T {
		let mut value = T::zeroed();
		self.ring.read_unchecked(index * T::SIZE, bytemuck::bytes_of_mut(&mut value));
		value
	}

	/// Sets the element `index` positions past the read cursor without checking
	/// bounds. The write is skipped if the buffer is shared and copying it fails.
	///
	/// # Safety
	///
	/// `index` must be less than [`len`](Self::len).
	pub unsafe fn set_unchecked(&mut self, index: usize, value: T) {
		let _ = self.ring.write_unchecked(index * T::SIZE, bytemuck::bytes_of(&value));
	}

	/// Copies the stored elements, in order, into a new vector without consuming
	/// them.
	pub fn to_vec(&self) -> Vec<T> {
		let mut vec = vec![T::zeroed(); self.stored];
		// Safety: the vector holds exactly the stored elements.
		unsafe {
			self.ring.read_unchecked(0, bytemuck::cast_slice_mut(&mut vec));
		}
		vec
	}

	fn sync_stored(&mut self) {
		self.stored = T::count_in(self.ring.bytes_available());
	}

	fn insufficient(&self, count: usize) -> StorageError {
		StorageError::InsufficientData {
			requested: count.saturating_mul(T::SIZE),
			available: self.ring.bytes_available()
		}
	}
}

/// Returns the byte size of `count` elements, or an allocation error on overflow.
fn byte_size<T: Element>(count: usize) -> Result<usize> {
	count.checked_mul(T::SIZE).ok_or(StorageError::Allocation { size: usize::MAX })
}

impl<T: Element> fmt::Debug for TypedRingBuffer<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TypedRingBuffer")
		 .field("capacity", &self.capacity())
		 .field("stored", &self.stored)
		 .field("bytes", &self.ring)
		 .finish()
	}
}
