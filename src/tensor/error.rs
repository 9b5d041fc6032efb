//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use crate::ErrPack;

//--------------------------------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TensorError {
	/// A multi-index did not contain exactly one index per dimension.
	InvalidArgumentCount { expected: usize, got: usize },

	/// The index `got` at `dimension` is not below `limit`.
	IndexOutOfRange { dimension: usize, limit: usize, got: usize },

	DimensionMismatch,

	InvalidSlice,
}

impl std::fmt::Display for TensorError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match *self {
			Self::InvalidArgumentCount { expected, got } => write!(
				f,
				"Invalid number of arguments: expected {expected} indices, got {got}"
			),
			Self::IndexOutOfRange { dimension, limit, got } => write!(
				f,
				"Index {got} out of range 0 ..< {limit} for dimension {dimension}"
			),
			Self::DimensionMismatch => write!(f, "Tensor dimensions don't match"),
			Self::InvalidSlice => write!(f, "Invalid slice selectors"),
		}
	}
}

//--------------------------------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct DimensionMismatchError;

impl From<DimensionMismatchError> for TensorError {
	fn from(_: DimensionMismatchError) -> Self {
		Self::DimensionMismatch
	}
}

impl From<DimensionMismatchError> for ErrPack<TensorError> {
	#[cold]
	#[inline(never)]
	fn from(_: DimensionMismatchError) -> Self {
		Self {
			code: TensorError::DimensionMismatch,
			extra: None,
		}
	}
}

impl From<TensorError> for ErrPack<TensorError> {
	#[cold]
	#[inline(never)]
	fn from(code: TensorError) -> Self {
		Self { code, extra: None }
	}
}

//--------------------------------------------------------------------------------------------------
