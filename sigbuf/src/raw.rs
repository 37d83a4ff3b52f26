// SPDX-License-Identifier: Apache-2.0

//! Shared, windowed byte storage.

use std::alloc::{self, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};
use std::rc::Rc;
use std::slice;
use all_asserts::debug_assert_le;
use crate::element::Element;
use crate::error::{Result, StorageError};
use crate::options::AllocOptions;

/// A zero-filled heap allocation, freed when the last [`Rc`] referencing it is
/// dropped.
struct Block {
	ptr: NonNull<u8>,
	layout: Layout,
}

impl Block {
	fn allocate(size: usize, options: AllocOptions) -> Result<Self> {
		let layout = options.alignment()
			.and_then(|align| Layout::from_size_align(size, align).ok())
			.ok_or(StorageError::Allocation { size })?;
		if size == 0 {
			return Ok(Self { ptr: NonNull::dangling(), layout })
		}

		// Safety: the layout has a non-zero size.
		let ptr = unsafe { alloc::alloc_zeroed(layout) };
		match NonNull::new(ptr) {
			Some(ptr) => Ok(Self { ptr, layout }),
			None => Err(StorageError::Allocation { size })
		}
	}

	fn size(&self) -> usize { self.layout.size() }
}

impl Drop for Block {
	fn drop(&mut self) {
		if self.size() > 0 {
			log::trace!("freeing {} bytes", self.size());
			// Safety: the pointer was allocated with this layout and is only freed
			// here, once the last reference is gone.
			unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) }
		}
	}
}

#[derive(Clone)]
enum Memory<'d> {
	Empty,
	/// Reference-counted memory allocated by [`RawStorage::allocate`].
	Owned(Rc<Block>),
	/// Externally supplied memory, borrowed for `'d`. Not counted.
	Borrowed(NonNull<u8>, PhantomData<&'d mut [u8]>),
}

impl Memory<'_> {
	fn base(&self) -> Option<NonNull<u8>> {
		match self {
			Memory::Empty => None,
			Memory::Owned(block) => Some(block.ptr),
			&Memory::Borrowed(ptr, _) => Some(ptr)
		}
	}
}

/// A window of `len` bytes at `offset` into a shared byte allocation.
///
/// Storage is either *owned*, allocated by [`allocate`] and shared between all
/// views cloned or derived from it, or *borrowed* from external memory with
/// [`wrap`]. Owned memory is reference-counted: each [`clone`] or [`subview`]
/// adds a reference, each drop removes one, and the allocation is freed when the
/// last view over it is dropped. Borrowed memory is never counted or freed; the
/// `'d` lifetime keeps views from outliving it.
///
/// Views alias freely. A write through one view is visible through every other
/// view over the same bytes. The safe accessors copy in and out of the storage
/// and never hold references into it, so aliasing views can't invalidate them.
/// Zero-copy access through [`as_slice`] and [`as_mut_slice`] is `unsafe` for
/// that reason.
///
/// Counting is not atomic. Storage is neither [`Send`] nor [`Sync`], so views
/// can't be shared or moved across threads.
///
/// [`allocate`]: Self::allocate
/// [`wrap`]: Self::wrap
/// [`clone`]: Self::clone_view
/// [`subview`]: Self::subview
/// [`as_slice`]: Self::as_slice
/// [`as_mut_slice`]: Self::as_mut_slice
#[derive(Clone)]
pub struct RawStorage<'d> {
	mem: Memory<'d>,
	size: usize,
	offset: usize,
	length: usize,
}

impl Default for RawStorage<'_> {
	fn default() -> Self { Self::empty() }
}

impl<'d> RawStorage<'d> {
	/// Creates an empty buffer, with no memory behind it.
	pub const fn empty() -> Self {
		Self {
			mem: Memory::Empty,
			size: 0,
			offset: 0,
			length: 0,
		}
	}

	/// Allocates `size` zeroed bytes with the default [`AllocOptions`]. Allocating
	/// zero bytes returns the empty buffer.
	pub fn allocate(size: usize) -> Result<Self> {
		Self::allocate_with(size, AllocOptions::default())
	}

	/// Allocates `size` zeroed bytes with `options`.
	pub fn allocate_with(size: usize, options: AllocOptions) -> Result<Self> {
		if size == 0 {
			return Ok(Self::empty())
		}

		let block = Block::allocate(size, options).map_err(|err| {
			log::debug!("allocation of {size} bytes failed");
			err
		})?;
		log::trace!("allocated {size} bytes aligned to {}", block.layout.align());
		Ok(Self {
			mem: Memory::Owned(Rc::new(block)),
			size,
			offset: 0,
			length: size,
		})
	}

	/// Allocates `size` zeroed bytes, returning the empty buffer if the allocation
	/// fails.
	pub fn allocate_or_empty(size: usize) -> Self {
		Self::allocate(size).unwrap_or_default()
	}

	/// Wraps `length` bytes at `offset` in borrowed memory. The memory isn't
	/// counted; it stays owned by the caller. Returns the empty buffer if the
	/// window doesn't fit in `data`.
	pub fn wrap(data: &'d mut [u8], offset: usize, length: usize) -> Self {
		let fits = offset.checked_add(length).is_some_and(|end| end <= data.len());
		if !fits {
			return Self::empty()
		}

		let size = data.len();
		match NonNull::new(data.as_mut_ptr()) {
			Some(ptr) => Self {
				mem: Memory::Borrowed(ptr, PhantomData),
				size,
				offset,
				length,
			},
			None => Self::empty()
		}
	}

	/// Returns a view sharing all of this storage. Same as [`Clone::clone`].
	pub fn clone_view(&self) -> Self { self.clone() }

	/// Returns a view of `length` bytes at `offset` into this view's window,
	/// sharing the same storage. Returns the empty buffer if the range doesn't fit
	/// inside this view.
	pub fn subview(&self, offset: usize, length: usize) -> Self {
		let fits = offset.checked_add(length).is_some_and(|end| end <= self.length);
		if !fits {
			return Self::empty()
		}

		Self {
			mem: self.mem.clone(),
			size: self.size,
			offset: self.offset + offset,
			length,
		}
	}

	/// Returns the start of the whole allocation, or null for the empty buffer.
	pub fn base_ptr(&self) -> *const u8 {
		self.mem.base().map_or(ptr::null(), |ptr| ptr.as_ptr().cast_const())
	}

	/// Returns the start of this view's window, or null for the empty buffer.
	pub fn data_ptr(&self) -> *const u8 {
		self.mem.base().map_or(ptr::null(), |ptr|
			// Safety: offset <= size, so the result is within or one past the end
			// of the allocation.
			unsafe { ptr.as_ptr().add(self.offset).cast_const() }
		)
	}

	/// Returns the offset of the window into the allocation, in bytes.
	pub fn offset(&self) -> usize { self.offset }
	/// Returns the window length, in bytes.
	pub fn len(&self) -> usize { self.length }
	/// Returns the size of the whole allocation, in bytes.
	pub fn storage_size(&self) -> usize { self.size }
	/// Returns `true` if the window is empty.
	pub fn is_empty(&self) -> bool { self.length == 0 }

	/// Returns the number of views over this storage, or `None` if the storage
	/// is borrowed or empty.
	pub fn ref_count(&self) -> Option<usize> {
		match &self.mem {
			Memory::Owned(block) => Some(Rc::strong_count(block)),
			_ => None
		}
	}

	/// Returns `true` if the storage was allocated rather than borrowed.
	pub fn is_owned(&self) -> bool { matches!(self.mem, Memory::Owned(_)) }
	/// Returns `true` if the storage wraps external memory.
	pub fn is_borrowed(&self) -> bool { matches!(self.mem, Memory::Borrowed(..)) }
	/// Returns `true` if other views over this storage are alive.
	pub fn is_shared(&self) -> bool { self.ref_count().is_some_and(|n| n > 1) }

	/// Returns `true` if both views are over the same allocation, regardless of
	/// their windows.
	pub fn same_storage(&self, other: &RawStorage<'_>) -> bool {
		!self.base_ptr().is_null() && self.base_ptr() == other.base_ptr()
	}

	/// Copies `dst.len()` bytes at `offset` into `dst`, returning `false` without
	/// copying if the range is out of bounds.
	pub fn read_at(&self, offset: usize, dst: &mut [u8]) -> bool {
		if !self.contains_range(offset, dst.len()) {
			return false
		}
		// Safety: bounds checked above.
		unsafe { self.read_unchecked(offset, dst) }
		true
	}

	/// Copies `src` into the window at `offset`, returning `false` without copying
	/// if the range is out of bounds.
	pub fn write_at(&mut self, offset: usize, src: &[u8]) -> bool {
		if !self.contains_range(offset, src.len()) {
			return false
		}
		// Safety: bounds checked above.
		unsafe { self.write_unchecked(offset, src) }
		true
	}

	/// Copies as many bytes as fit from the start of the window into `dst`,
	/// returning the number of bytes copied.
	pub fn copy_to_slice(&self, dst: &mut [u8]) -> usize {
		let count = self.length.min(dst.len());
		// Safety: count is within both the window and dst.
		unsafe { self.read_unchecked(0, &mut dst[..count]) }
		count
	}

	/// Copies as many bytes of `src` as fit into the start of the window,
	/// returning the number of bytes copied.
	pub fn copy_from_slice(&mut self, src: &[u8]) -> usize {
		let count = self.length.min(src.len());
		// Safety: count is within both the window and src.
		unsafe { self.write_unchecked(0, &src[..count]) }
		count
	}

	/// Sets every byte in the window to `value`.
	pub fn fill(&mut self, value: u8) {
		if let Some(data) = self.window_ptr() {
			// Safety: the window is in bounds of a live allocation.
			unsafe { ptr::write_bytes(data.as_ptr(), value, self.length) }
		}
	}

	/// Copies the window into a new vector.
	pub fn to_vec(&self) -> Vec<u8> {
		let mut vec = vec![0; self.length];
		self.copy_to_slice(&mut vec);
		vec
	}

	/// Returns the byte at `index`, or `None` if out of bounds.
	pub fn get(&self, index: usize) -> Option<u8> {
		// Safety: bounds checked.
		(index < self.length).then(|| unsafe { self.get_unchecked(index) })
	}

	/// Replaces the byte at `index` with `value`, returning the old byte, or `None`
	/// if out of bounds.
	pub fn set(&mut self, index: usize, value: u8) -> Option<u8> {
		(index < self.length).then(|| unsafe {
			// Safety: bounds checked.
			let old = self.get_unchecked(index);
			self.set_unchecked(index, value);
			old
		})
	}

	/// Returns the byte at `index` without checking bounds.
	///
	/// # Safety
	///
	/// `index` must be less than [`len`](Self::len). Reading out of bounds is
	/// undefined behavior.
	#[inline]
	pub unsafe fn get_unchecked(&self, index: usize) -> u8 {
		self.read_value_unchecked(index)
	}

	/// Sets the byte at `index` without checking bounds.
	///
	/// # Safety
	///
	/// `index` must be less than [`len`](Self::len). Writing out of bounds is
	/// undefined behavior.
	#[inline]
	pub unsafe fn set_unchecked(&mut self, index: usize, value: u8) {
		self.write_value_unchecked(index, value)
	}

	/// Returns the window as a slice, without copying.
	///
	/// # Safety
	///
	/// No other view may write to the window's bytes while the slice is alive.
	pub unsafe fn as_slice(&self) -> &[u8] {
		match self.window_ptr() {
			Some(data) => slice::from_raw_parts(data.as_ptr(), self.length),
			None => &[]
		}
	}

	/// Returns the window as a mutable slice, without copying.
	///
	/// # Safety
	///
	/// No other view may read or write the window's bytes while the slice is
	/// alive.
	pub unsafe fn as_mut_slice(&mut self) -> &mut [u8] {
		match self.window_ptr() {
			Some(data) => slice::from_raw_parts_mut(data.as_ptr(), self.length),
			None => &mut []
		}
	}

	/// Reads an element at byte `offset` into the window, without assuming
	/// alignment.
	///
	/// # Safety
	///
	/// `offset + T::SIZE` must not exceed the window length.
	#[inline]
	pub(crate) unsafe fn read_value_unchecked<T: Element>(&self, offset: usize) -> T {
		debug_assert_le!(offset + T::SIZE, self.length);
		match self.window_ptr() {
			Some(data) => data.as_ptr().add(offset).cast::<T>().read_unaligned(),
			None => T::zeroed()
		}
	}

	/// Writes an element at byte `offset` into the window, without assuming
	/// alignment.
	///
	/// # Safety
	///
	/// `offset + T::SIZE` must not exceed the window length.
	#[inline]
	pub(crate) unsafe fn write_value_unchecked<T: Element>(&mut self, offset: usize, value: T) {
		debug_assert_le!(offset + T::SIZE, self.length);
		if let Some(data) = self.window_ptr() {
			data.as_ptr().add(offset).cast::<T>().write_unaligned(value)
		}
	}

	/// Copies bytes at `offset` into `dst`.
	///
	/// # Safety
	///
	/// `offset + dst.len()` must not exceed the window length.
	pub(crate) unsafe fn read_unchecked(&self, offset: usize, dst: &mut [u8]) {
		debug_assert_le!(offset + dst.len(), self.length);
		if let Some(data) = self.window_ptr() {
			// Views may alias the destination, so the ranges can overlap.
			ptr::copy(data.as_ptr().add(offset), dst.as_mut_ptr(), dst.len())
		}
	}

	/// Copies `src` into the window at `offset`.
	///
	/// # Safety
	///
	/// `offset + src.len()` must not exceed the window length.
	pub(crate) unsafe fn write_unchecked(&mut self, offset: usize, src: &[u8]) {
		debug_assert_le!(offset + src.len(), self.length);
		if let Some(data) = self.window_ptr() {
			ptr::copy(src.as_ptr(), data.as_ptr().add(offset), src.len())
		}
	}

	/// Returns `true` if `length` bytes at `offset` fit in the window.
	fn contains_range(&self, offset: usize, length: usize) -> bool {
		offset.checked_add(length).is_some_and(|end| end <= self.length)
	}

	fn window_ptr(&self) -> Option<NonNull<u8>> {
		if self.length == 0 {
			return None
		}
		// Safety: offset + length <= size, so the window is inside the allocation.
		self.mem.base().map(|base| unsafe {
			NonNull::new_unchecked(base.as_ptr().add(self.offset))
		})
	}
}

impl fmt::Debug for RawStorage<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RawStorage")
		 .field("offset", &self.offset)
		 .field("len", &self.length)
		 .field("storage_size", &self.size)
		 .field("ref_count", &self.ref_count())
		 .finish()
	}
}

impl<'d> From<&'d mut [u8]> for RawStorage<'d> {
	fn from(data: &'d mut [u8]) -> Self {
		let len = data.len();
		Self::wrap(data, 0, len)
	}
}
