// SPDX-License-Identifier: Apache-2.0

/// The default allocation alignment, enough for any primitive scalar and for
/// complex pairs of `f64`.
pub const DEFAULT_ALIGNMENT: usize = 16;

/// Options for allocating [`RawStorage`](crate::RawStorage) memory.
///
/// # Alignment
///
/// The byte alignment of fresh allocations. Defaults to `16`. Typed views over an
/// allocation read elements without assuming alignment, but zero-copy slice
/// access requires the window start to be aligned for the element type, so
/// allocating with at least the element's alignment keeps that path open. Values
/// that aren't a power of two are rounded up to the next one; values too large
/// to round fail to allocate.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct AllocOptions {
	pub alignment: usize,
}

impl Default for AllocOptions {
	fn default() -> Self { Self::new() }
}

impl AllocOptions {
	/// Creates a new set of allocation options.
	pub const fn new() -> Self {
		Self {
			alignment: DEFAULT_ALIGNMENT,
		}
	}

	/// Presets the options for elements of type `T`, aligning to at least
	/// `align_of::<T>()`.
	#[inline]
	pub const fn for_type<T>() -> Self {
		Self::new().with_min_alignment(std::mem::align_of::<T>())
	}

	/// Returns the allocation alignment, rounded up to a power of two, or `None`
	/// if no power of two that large fits in a `usize`.
	#[inline]
	pub const fn alignment(&self) -> Option<usize> {
		if self.alignment <= 1 {
			Some(1)
		} else {
			self.alignment.checked_next_power_of_two()
		}
	}

	/// Sets the allocation alignment.
	#[inline]
	pub fn set_alignment(&mut self, value: usize) {
		self.alignment = value;
	}

	/// Sets the allocation alignment.
	#[inline]
	pub const fn with_alignment(mut self, value: usize) -> Self {
		self.alignment = value;
		self
	}

	/// Raises the allocation alignment to at least `value`.
	#[inline]
	pub const fn with_min_alignment(self, value: usize) -> Self {
		if value > self.alignment {
			self.with_alignment(value)
		} else {
			self
		}
	}
}
