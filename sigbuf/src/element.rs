// SPDX-License-Identifier: Apache-2.0

use std::mem;
use num_traits::ToPrimitive;

/// A plain-old-data element that can be read from and written to raw bytes, like
/// an integer, a float, or a complex sample.
pub trait Element: bytemuck::Pod + Unpin {
	const SIZE: usize = mem::size_of::<Self>();

	/// Returns the number of whole elements in `bytes` bytes. Zero-sized elements
	/// always count as zero.
	#[inline]
	fn count_in(bytes: usize) -> usize {
		bytes.checked_div(Self::SIZE).unwrap_or(0)
	}
}

impl<T: bytemuck::Pod + Unpin> Element for T { }

/// An element with a magnitude, used by the typed view norms.
pub trait Magnitude: Element {
	/// Returns the absolute value, or modulus for complex elements.
	fn magnitude(self) -> f64;

	/// Returns the squared magnitude.
	fn magnitude_sqr(self) -> f64 {
		let m = self.magnitude();
		m * m
	}
}

macro_rules! generate {
	($($ty:ident)+) => {
		$(
		impl Magnitude for $ty {
			#[inline]
			fn magnitude(self) -> f64 {
				self.to_f64().map_or(f64::NAN, f64::abs)
			}
		}
		)+
	};
}

generate! { u8 i8 u16 i16 u32 i32 u64 i64 u128 i128 usize isize f32 f64 }

#[cfg(feature = "complex")]
mod complex {
	use num_complex::Complex;
	use num_traits::{Float, ToPrimitive};
	use super::{Element, Magnitude};

	impl<T: Float + Element> Magnitude for Complex<T> where Complex<T>: Element {
		#[inline]
		fn magnitude(self) -> f64 {
			self.norm().to_f64().unwrap_or(f64::NAN)
		}

		#[inline]
		fn magnitude_sqr(self) -> f64 {
			self.norm_sqr().to_f64().unwrap_or(f64::NAN)
		}
	}
}
