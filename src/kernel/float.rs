//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::tensor::Element;

//--------------------------------------------------------------------------------------------------

/// Element types the kernels can work with.
pub trait Float: Element + PartialOrd {
	type Atomic: AtomicFloat<Self>;

	const ZERO: Self;

	fn exp(self) -> Self;
}

/// A float cell in global memory. Concurrent blocks may access it at the same time.
pub trait AtomicFloat<F>: Send + Sync {
	fn new(val: F) -> Self;
	fn load(&self) -> F;
	fn store(&self, val: F);

	/// Adds `val` and returns the previous value.
	fn fetch_add(&self, val: F) -> F;
}

macro_rules! impl_float {
	($float:ty, $atomic_float:ident, $bits:ty) => {
		#[repr(transparent)]
		pub struct $atomic_float($bits);

		impl AtomicFloat<$float> for $atomic_float {
			fn new(val: $float) -> Self {
				Self(<$bits>::new(val.to_bits()))
			}

			fn load(&self) -> $float {
				<$float>::from_bits(self.0.load(Ordering::Relaxed))
			}

			fn store(&self, val: $float) {
				self.0.store(val.to_bits(), Ordering::Relaxed);
			}

			fn fetch_add(&self, val: $float) -> $float {
				let prev = self.0.fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
					Some((<$float>::from_bits(bits) + val).to_bits())
				});
				match prev {
					Ok(bits) | Err(bits) => <$float>::from_bits(bits),
				}
			}
		}

		impl Float for $float {
			type Atomic = $atomic_float;

			const ZERO: Self = 0.0;

			fn exp(self) -> Self {
				<$float>::exp(self)
			}
		}
	};
}

impl_float!(f32, AtomicF32, AtomicU32);
impl_float!(f64, AtomicF64, AtomicU64);

//--------------------------------------------------------------------------------------------------

pub fn identity<F: Float>(x: F) -> F {
	x
}

pub fn exp<F: Float>(x: F) -> F {
	x.exp()
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn atomic_fetch_add() {
		let cell = AtomicF32::new(1.5);
		assert_eq!(cell.fetch_add(2.0), 1.5);
		assert_eq!(cell.load(), 3.5);
		cell.store(-1.0);
		assert_eq!(cell.load(), -1.0);
	}

	#[test]
	fn concurrent_fetch_add() {
		let cell = AtomicF64::new(0.0);
		std::thread::scope(|s| {
			for _ in 0..8 {
				s.spawn(|| {
					for _ in 0..1000 {
						cell.fetch_add(0.5);
					}
				});
			}
		});
		assert_eq!(cell.load(), 4000.0);
	}
}

//--------------------------------------------------------------------------------------------------
