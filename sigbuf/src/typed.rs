// SPDX-License-Identifier: Apache-2.0

//! Typed element views over raw storage.

use std::fmt;
use std::marker::PhantomData;
use std::iter::FusedIterator;
use std::ops::{DivAssign, MulAssign, Range};
use crate::element::{Element, Magnitude};
use crate::error::{Result, StorageError};
use crate::options::AllocOptions;
use crate::raw::RawStorage;

/// The number of elements printed from each end of a long view.
const DEBUG_EDGE: usize = 5;

/// A view of a [`RawStorage`] window as a sequence of `T` elements.
///
/// Element `i` sits at byte offset `i * size_of::<T>()` into the window. Trailing
/// bytes too few to hold a whole element are not part of the view. Views share
/// storage the same way raw views do: cloning and deriving sub-views is zero-copy,
/// and writes are visible through every view over the same bytes.
///
/// Elements are read and written by value without assuming alignment, so views
/// at any byte offset are valid. Only the zero-copy [`as_slice`] accessors need
/// an aligned window.
///
/// [`as_slice`]: Self::as_slice
#[derive(Clone)]
pub struct TypedView<'d, T: Element> {
	raw: RawStorage<'d>,
	len: usize,
	_elem: PhantomData<T>,
}

impl<T: Element> Default for TypedView<'_, T> {
	fn default() -> Self { Self::empty() }
}

impl<'d, T: Element> TypedView<'d, T> {
	/// Creates an empty view.
	pub const fn empty() -> Self {
		Self {
			raw: RawStorage::empty(),
			len: 0,
			_elem: PhantomData,
		}
	}

	/// Allocates zeroed storage for `len` elements, aligned for `T`.
	pub fn allocate(len: usize) -> Result<Self> {
		Self::allocate_with(len, AllocOptions::for_type::<T>())
	}

	/// Allocates zeroed storage for `len` elements with `options`.
	pub fn allocate_with(len: usize, options: AllocOptions) -> Result<Self> {
		let size = len.checked_mul(T::SIZE).ok_or(StorageError::Allocation { size: usize::MAX })?;
		Ok(Self::from_parts(RawStorage::allocate_with(size, options)?, len))
	}

	/// Allocates storage and copies `values` into it.
	pub fn from_slice(values: &[T]) -> Result<Self> {
		let mut view = Self::allocate(values.len())?;
		view.copy_from_slice(values);
		Ok(view)
	}

	/// Wraps borrowed elements without copying them.
	pub fn wrap(values: &'d mut [T]) -> Self {
		let len = values.len();
		Self::from_parts(bytemuck::cast_slice_mut::<T, u8>(values).into(), len)
	}

	/// Views `raw` as elements, counting as many whole elements as fit in its
	/// window.
	pub fn from_raw(raw: RawStorage<'d>) -> Self {
		let len = T::count_in(raw.len());
		Self::from_parts(raw, len)
	}

	fn from_parts(raw: RawStorage<'d>, len: usize) -> Self {
		Self { raw, len, _elem: PhantomData }
	}

	/// Returns the number of elements.
	pub fn len(&self) -> usize { self.len }
	/// Returns `true` if the view has no elements.
	pub fn is_empty(&self) -> bool { self.len == 0 }
	/// Returns the underlying raw view.
	pub fn as_raw(&self) -> &RawStorage<'d> { &self.raw }
	/// Returns the underlying raw view, mutably.
	pub fn as_raw_mut(&mut self) -> &mut RawStorage<'d> { &mut self.raw }
	/// Unwraps the underlying raw view.
	pub fn into_raw(self) -> RawStorage<'d> { self.raw }

	/// Returns the element at `index`, or `None` if out of bounds.
	pub fn get(&self, index: usize) -> Option<T> {
		// Safety: bounds checked.
		(index < self.len).then(|| unsafe { self.get_unchecked(index) })
	}

	/// Replaces the element at `index` with `value`, returning the old element, or
	/// `None` if out of bounds.
	pub fn set(&mut self, index: usize, value: T) -> Option<T> {
		(index < self.len).then(|| unsafe {
			// Safety: bounds checked.
			let old = self.get_unchecked(index);
			self.set_unchecked(index, value);
			old
		})
	}

	/// Returns the element at `index` without checking bounds.
	///
	/// # Safety
	///
	/// `index` must be less than [`len`](Self::len). Reading out of bounds is
	/// undefined behavior.
	#[inline]
	pub unsafe fn get_unchecked(&self, index: usize) -> T {
		self.raw.read_value_unchecked(index * T::SIZE)
	}

	/// Sets the element at `index` without checking bounds.
	///
	/// # Safety
	///
	/// `index` must be less than [`len`](Self::len). Writing out of bounds is
	/// undefined behavior.
	#[inline]
	pub unsafe fn set_unchecked(&mut self, index: usize, value: T) {
		self.raw.write_value_unchecked(index * T::SIZE, value)
	}

	/// Returns a view of `len` elements starting at `offset`, sharing storage with
	/// this view. Returns an empty view if the range exceeds this view.
	pub fn sub(&self, offset: usize, len: usize) -> Self {
		let fits = offset.checked_add(len).is_some_and(|end| end <= self.len);
		if !fits {
			return Self::empty()
		}

		Self::from_parts(self.raw.subview(offset * T::SIZE, len * T::SIZE), len)
	}

	/// Returns a view of the first `count` elements, or an empty view if there are
	/// fewer.
	pub fn head(&self, count: usize) -> Self {
		self.sub(0, count)
	}

	/// Returns a view of the last `count` elements, or an empty view if there are
	/// fewer.
	pub fn tail(&self, count: usize) -> Self {
		match self.len.checked_sub(count) {
			Some(offset) => self.sub(offset, count),
			None => Self::empty()
		}
	}

	/// Views the same bytes as elements of type `U`. The element count is the
	/// number of whole `U` elements in the byte window.
	pub fn reinterpret<U: Element>(&self) -> TypedView<'d, U> {
		TypedView::from_raw(self.raw.clone())
	}

	/// Copies the elements into a new vector.
	pub fn to_vec(&self) -> Vec<T> {
		let mut vec = vec![T::zeroed(); self.len];
		self.raw.copy_to_slice(bytemuck::cast_slice_mut(&mut vec));
		vec
	}

	/// Copies as many `values` as fit into the start of the view, returning the
	/// number of elements copied.
	pub fn copy_from_slice(&mut self, values: &[T]) -> usize {
		let count = self.len.min(values.len());
		self.raw.copy_from_slice(bytemuck::cast_slice(&values[..count]));
		count
	}

	/// Iterates over copies of the elements.
	pub fn iter(&self) -> Iter<'_, 'd, T> {
		Iter {
			view: self,
			range: 0..self.len,
		}
	}

	/// Applies `f` to every element in place.
	pub fn apply(&mut self, mut f: impl FnMut(T) -> T) {
		for i in 0..self.len {
			// Safety: indices are within bounds.
			unsafe {
				let value = self.get_unchecked(i);
				self.set_unchecked(i, f(value));
			}
		}
	}

	/// Returns the elements as a slice without copying, or `None` if the window
	/// isn't aligned for `T`.
	///
	/// # Safety
	///
	/// No other view may write to the viewed bytes while the slice is alive.
	pub unsafe fn as_slice(&self) -> Option<&[T]> {
		if self.is_empty() {
			return Some(&[])
		}
		let bytes = &self.raw.as_slice()[..self.len * T::SIZE];
		bytemuck::try_cast_slice(bytes).ok()
	}

	/// Returns the elements as a mutable slice without copying, or `None` if the
	/// window isn't aligned for `T`.
	///
	/// # Safety
	///
	/// No other view may read or write the viewed bytes while the slice is alive.
	pub unsafe fn as_mut_slice(&mut self) -> Option<&mut [T]> {
		if self.is_empty() {
			return Some(&mut [])
		}
		let size = self.len * T::SIZE;
		let bytes = &mut self.raw.as_mut_slice()[..size];
		bytemuck::try_cast_slice_mut(bytes).ok()
	}
}

/// An iterator over copies of a [`TypedView`]'s elements.
pub struct Iter<'a, 'd, T: Element> {
	view: &'a TypedView<'d, T>,
	range: Range<usize>,
}

impl<T: Element> Iterator for Iter<'_, '_, T> {
	type Item = T;

	fn next(&mut self) -> Option<T> {
		// Safety: the range is within the view's bounds.
		self.range.next().map(|i| unsafe { self.view.get_unchecked(i) })
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		self.range.size_hint()
	}
}

impl<T: Element> DoubleEndedIterator for Iter<'_, '_, T> {
	fn next_back(&mut self) -> Option<T> {
		// Safety: the range is within the view's bounds.
		self.range.next_back().map(|i| unsafe { self.view.get_unchecked(i) })
	}
}

impl<T: Element> ExactSizeIterator for Iter<'_, '_, T> { }

impl<T: Element> FusedIterator for Iter<'_, '_, T> { }

impl<T: Magnitude> TypedView<'_, T> {
	/// Returns the L1 norm, the sum of element magnitudes.
	pub fn norm_l1(&self) -> f64 {
		self.iter().map(T::magnitude).sum()
	}

	/// Returns the L2 norm, the square root of the sum of squared magnitudes.
	pub fn norm_l2(&self) -> f64 {
		self.iter().map(T::magnitude_sqr).sum::<f64>().sqrt()
	}

	/// Returns the Lp norm, the `p`-th root of the sum of magnitudes raised to the
	/// `p`-th power.
	pub fn norm_lp(&self, p: f64) -> f64 {
		self.iter()
			.map(|v| v.magnitude().powf(p))
			.sum::<f64>()
			.powf(p.recip())
	}
}

impl<T: Element + MulAssign> MulAssign<T> for TypedView<'_, T> {
	fn mul_assign(&mut self, rhs: T) {
		self.apply(|mut v| {
			v *= rhs;
			v
		})
	}
}

impl<T: Element + DivAssign> DivAssign<T> for TypedView<'_, T> {
	fn div_assign(&mut self, rhs: T) {
		self.apply(|mut v| {
			v /= rhs;
			v
		})
	}
}

impl<'d, T: Element> From<RawStorage<'d>> for TypedView<'d, T> {
	fn from(raw: RawStorage<'d>) -> Self { Self::from_raw(raw) }
}

impl<'d, T: Element> From<TypedView<'d, T>> for RawStorage<'d> {
	fn from(view: TypedView<'d, T>) -> Self { view.into_raw() }
}

impl<T: Element + PartialEq> PartialEq<[T]> for TypedView<'_, T> {
	fn eq(&self, other: &[T]) -> bool {
		self.len == other.len() &&
		self.iter().eq(other.iter().copied())
	}
}

impl<T: Element + PartialEq, const N: usize> PartialEq<[T; N]> for TypedView<'_, T> {
	fn eq(&self, other: &[T; N]) -> bool {
		self == &other[..]
	}
}

/// Prints all elements of short views. Views longer than ten elements print the
/// first and last five around an ellipsis.
impl<T: Element + fmt::Debug> fmt::Debug for TypedView<'_, T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		struct Ellipsis;

		impl fmt::Debug for Ellipsis {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str("...")
			}
		}

		let mut list = f.debug_list();
		if self.len > DEBUG_EDGE * 2 {
			list.entries(self.head(DEBUG_EDGE).iter())
				.entry(&Ellipsis)
				.entries(self.tail(DEBUG_EDGE).iter());
		} else {
			list.entries(self.iter());
		}
		list.finish()
	}
}

#[cfg(test)]
mod test {
	use super::TypedView;

	#[test]
	fn debug_short() {
		let view = TypedView::from_slice(&[1u16, 2, 3]).unwrap();
		assert_eq!(format!("{view:?}"), "[1, 2, 3]");
	}

	#[test]
	fn debug_long() {
		let values: Vec<i32> = (0..12).collect();
		let view = TypedView::from_slice(&values).unwrap();
		assert_eq!(format!("{view:?}"), "[0, 1, 2, 3, 4, ..., 7, 8, 9, 10, 11]");
	}

	#[test]
	fn trailing_bytes_excluded() {
		let raw = crate::RawStorage::allocate(11).unwrap();
		let view = TypedView::<u32>::from_raw(raw);
		assert_eq!(view.len(), 2);
	}
}
