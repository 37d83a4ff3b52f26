// SPDX-License-Identifier: Apache-2.0

use std::result;

/// An error from a storage operation. Every variant leaves the buffer it came
/// from unchanged, except [`Allocation`] during a ring resize, which leaves the
/// ring empty.
///
/// Out-of-range sub-views are not errors; they produce an empty view instead.
///
/// [`Allocation`]: Self::Allocation
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum StorageError {
	/// The allocator could not provide the requested bytes.
	#[error("could not allocate {size} bytes")]
	Allocation { size: usize },
	/// A push was larger than the free space.
	#[error("cannot push {requested} bytes with only {free} bytes free")]
	CapacityExceeded { requested: usize, free: usize },
	/// A pull or discard asked for more than was stored.
	#[error("cannot pull {requested} bytes with only {available} bytes stored")]
	InsufficientData { requested: usize, available: usize },
	/// A pull destination was shorter than the requested count.
	#[error("cannot pull {requested} bytes into a destination of {capacity} bytes")]
	DestinationTooSmall { requested: usize, capacity: usize },
}

impl StorageError {
	/// Returns `true` if the error came from the allocator.
	pub fn is_allocation(&self) -> bool {
		matches!(self, Self::Allocation { .. })
	}

	/// Returns `true` if the operation was rejected for lack of space or data,
	/// meaning a retry after the other side catches up could succeed.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::CapacityExceeded { .. } | Self::InsufficientData { .. })
	}
}

pub type Result<T = ()> = result::Result<T, StorageError>;
