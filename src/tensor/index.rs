//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use smallvec::{SmallVec, smallvec};

use crate::util::cold_path;

use super::error::TensorError;

pub const INLINE_DIMS: usize = 5;

pub type DimVec = SmallVec<[usize; INLINE_DIMS]>;

//--------------------------------------------------------------------------------------------------

/// A list of per-dimension indices.
///
/// This is how the multi-index accessors take a variable number of arguments:
///
///     tensor.try_at((1, 2, 3))
///     tensor.try_at([1, 2, 3])
///     tensor.try_at(&indices[..])
pub trait Indices {
	fn to_dim_vec(&self) -> DimVec;
}

impl Indices for usize {
	fn to_dim_vec(&self) -> DimVec {
		smallvec![*self]
	}
}

impl<const K: usize> Indices for [usize; K] {
	fn to_dim_vec(&self) -> DimVec {
		SmallVec::from_slice(self)
	}
}

impl Indices for &[usize] {
	fn to_dim_vec(&self) -> DimVec {
		SmallVec::from_slice(self)
	}
}

impl Indices for DimVec {
	fn to_dim_vec(&self) -> DimVec {
		self.clone()
	}
}

macro_rules! impl_indices_for_tuple {
	(@usize $name:ident) => { usize };
	($($name:ident),+) => {
		impl Indices for ($(impl_indices_for_tuple!(@usize $name),)+) {
			#[allow(non_snake_case)]
			fn to_dim_vec(&self) -> DimVec {
				let ($($name,)+) = *self;
				smallvec![$($name),+]
			}
		}
	};
}

impl_indices_for_tuple!(I0);
impl_indices_for_tuple!(I0, I1);
impl_indices_for_tuple!(I0, I1, I2);
impl_indices_for_tuple!(I0, I1, I2, I3);
impl_indices_for_tuple!(I0, I1, I2, I3, I4);
impl_indices_for_tuple!(I0, I1, I2, I3, I4, I5);

//--------------------------------------------------------------------------------------------------

/// Row-major strides. The last dimension has stride 1.
pub fn strides(dims: &[usize]) -> DimVec {
	let mut result: DimVec = smallvec![0; dims.len()];
	let mut stride = 1;
	for (slot, &size) in result.iter_mut().zip(dims).rev() {
		*slot = stride;
		stride *= size;
	}
	result
}

/// Maps per-dimension indices to an offset into a row-major buffer.
///
/// Walks the dimensions from the first to the last. The offset accumulated so far and
/// the number of indices still to be consumed are carried through the fold, so nothing
/// is stored between calls.
pub fn offset_of(dims: &[usize], idx: &[usize]) -> Result<usize, TensorError> {
	let rank = dims.len();
	if idx.len() != rank {
		cold_path();
		return Err(TensorError::InvalidArgumentCount { expected: rank, got: idx.len() });
	}

	let (offset, remaining) = dims.iter().zip(idx).enumerate().try_fold(
		(0, rank),
		|(offset, remaining), (dimension, (&size, &i))| {
			if i >= size {
				cold_path();
				return Err(TensorError::IndexOutOfRange { dimension, limit: size, got: i });
			}
			// offset * size shifts everything accumulated so far by one dimension,
			// which is the same as multiplying each earlier index by its stride
			Ok((offset * size + i, remaining - 1))
		},
	)?;
	debug_assert!(remaining == 0);

	Ok(offset)
}

/// Inverse of `offset_of()`. `offset` should be below the product of `dims`.
pub fn unravel(mut offset: usize, dims: &[usize]) -> DimVec {
	let mut idx: DimVec = smallvec![0; dims.len()];
	for (slot, &size) in idx.iter_mut().zip(dims).rev() {
		if size != 0 {
			*slot = offset % size;
			offset /= size;
		}
	}
	idx
}

//--------------------------------------------------------------------------------------------------


//--------------------------------------------------------------------------------------------------
