//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use std::ops::{Index, IndexMut};

use ndarray::{ArrayD, IxDyn};

use crate::util::cold_path;
use crate::{ErrExtra, ErrPack};

pub mod element;
pub mod error;
pub mod expr;
pub mod index;
pub mod slice;


pub use element::{Element, FromToF64};
pub use error::{DimensionMismatchError, TensorError};
pub use expr::{BinaryOp, Expr, IntoExpr, TensorExpr, TensorRef, UnaryOp};
pub use index::{DimVec, INLINE_DIMS, Indices};
pub use slice::TensorSlice;

//--------------------------------------------------------------------------------------------------

/// An `R`-dimensional array stored as one contiguous row-major buffer.
///
/// The last dimension varies fastest. The rank is part of the type and never changes.
///
/// Element access comes in two flavors:
///
/// - strict: `try_at()`, `try_at_mut()`, `try_dim_size()` return an error;
/// - lenient: `at()`, `at_mut()`, `dim_size()` log the error and degrade to element 0,
///   or to a size of 0. This keeps a numerical loop running but can hide bugs, so prefer
///   the strict accessors unless a caller really wants to continue.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor<T: Element, const R: usize> {
	data: Vec<T>,
	dims: [usize; R],
}

impl<T: Element, const R: usize> Default for Tensor<T, R> {
	fn default() -> Self {
		Self { data: Vec::new(), dims: [0; R] }
	}
}

impl<T: Element, const R: usize> Tensor<T, R> {
	/// Zero-filled tensor. Fails if `dims` doesn't have exactly `R` entries
	/// or if any of them is 0.
	pub fn new(dims: &[usize]) -> Result<Self, ErrPack<TensorError>> {
		let dims = Self::checked_dims(dims)?;
		let elems = dims.iter().product();
		Ok(Self { data: vec![T::default(); elems], dims })
	}

	/// Zero-filled tensor. Every dimension must be at least 1.
	pub fn zeros(dims: [usize; R]) -> Result<Self, ErrPack<TensorError>> {
		Self::new(&dims)
	}

	/// Takes ownership of an existing buffer.
	pub fn from_parts(data: Vec<T>, dims: &[usize]) -> Result<Self, ErrPack<TensorError>> {
		let dims = Self::checked_dims(dims)?;
		let elems = dims.iter().product::<usize>();
		if data.len() != elems {
			cold_path();
			return Err(ErrPack::with_message(
				TensorError::DimensionMismatch,
				format!("Buffer has {} elements, dimensions {dims:?} need {elems}", data.len()),
			));
		}
		Ok(Self { data, dims })
	}

	/// Evaluates an expression into a new tensor.
	///
	/// This is the only place where an `Expr` gets materialized. Every element is visited
	/// exactly once.
	pub fn eval<E: TensorExpr<T> + ?Sized>(expr: &E) -> Result<Self, ErrPack<TensorError>> {
		expr.validate()?;
		let dims = Self::checked_dims(&expr.dim_sizes())?;
		let elems = expr.size();
		if elems != dims.iter().product::<usize>() {
			cold_path();
			return Err(DimensionMismatchError.into());
		}
		let data = (0..elems).map(|i| expr.element_at(i)).collect();
		Ok(Self { data, dims })
	}

	fn checked_dims(dims: &[usize]) -> Result<[usize; R], ErrPack<TensorError>> {
		let Ok(dims) = <[usize; R]>::try_from(dims) else {
			cold_path();
			return Err(ErrPack::with_message(
				TensorError::DimensionMismatch,
				format!("Expected {R} dimensions, got {}", dims.len()),
			));
		};
		if let Some(dim) = dims.iter().position(|&size| size == 0) {
			cold_path();
			return Err(ErrPack::with_message(
				TensorError::DimensionMismatch,
				format!("Dimension {dim} of {dims:?} has size 0"),
			));
		}
		Ok(dims)
	}

	/// Returns the total number of elements in the tensor.
	pub fn size(&self) -> usize {
		self.data.len()
	}

	/// Returns the number of dimensions.
	pub fn rank(&self) -> usize {
		R
	}

	pub fn dim_sizes(&self) -> &[usize; R] {
		&self.dims
	}

	pub fn data(&self) -> &[T] {
		&self.data
	}

	pub fn data_mut(&mut self) -> &mut [T] {
		&mut self.data
	}

	pub fn into_data(self) -> Vec<T> {
		self.data
	}

	/// Size of one dimension.
	///
	/// An invalid `dim` is reported as `IndexOutOfRange` where both `dimension` and `got`
	/// hold `dim` and `limit` is the rank.
	pub fn try_dim_size(&self, dim: usize) -> Result<usize, ErrPack<TensorError>> {
		self.dims.get(dim).copied().ok_or_else(|| {
			cold_path();
			ErrPack::with_message(
				TensorError::IndexOutOfRange { dimension: dim, limit: R, got: dim },
				format!("No dimension {dim} in a tensor of rank {R}"),
			)
		})
	}

	/// Lenient `try_dim_size()`. An invalid `dim` is logged and reported as size 0.
	pub fn dim_size(&self, dim: usize) -> usize {
		match self.try_dim_size(dim) {
			Ok(size) => size,
			Err(err) => {
				log::error!("Tensor::dim_size(): {}", err.code);
				0
			},
		}
	}

	fn offset<I: Indices>(&self, idx: &I) -> Result<usize, ErrPack<TensorError>> {
		let idx = idx.to_dim_vec();
		let offset = index::offset_of(&self.dims, &idx)?;
		if offset >= self.data.len() {
			cold_path();
			return Err(DimensionMismatchError.into());
		}
		Ok(offset)
	}

	fn offset_or_first<I: Indices>(&self, idx: &I) -> usize {
		match self.offset(idx) {
			Ok(offset) => offset,
			Err(err) => {
				log::error!("Tensor::at(): {}; using element 0", err.code);
				0
			},
		}
	}

	#[allow(clippy::indexing_slicing)]
	pub fn try_at<I: Indices>(&self, idx: I) -> Result<&T, ErrPack<TensorError>> {
		let offset = self.offset(&idx)?;
		Ok(&self.data[offset])
	}

	#[allow(clippy::indexing_slicing)]
	pub fn try_at_mut<I: Indices>(&mut self, idx: I) -> Result<&mut T, ErrPack<TensorError>> {
		let offset = self.offset(&idx)?;
		Ok(&mut self.data[offset])
	}

	/// Lenient multi-index access. On a bad index, logs and returns element 0.
	///
	/// Panics if the tensor has no elements at all.
	#[allow(clippy::indexing_slicing)]
	pub fn at<I: Indices>(&self, idx: I) -> &T {
		let offset = self.offset_or_first(&idx);
		&self.data[offset]
	}

	/// Lenient mutable multi-index access. On a bad index, logs and returns element 0.
	///
	/// Panics if the tensor has no elements at all.
	#[allow(clippy::indexing_slicing)]
	pub fn at_mut<I: Indices>(&mut self, idx: I) -> &mut T {
		let offset = self.offset_or_first(&idx);
		&mut self.data[offset]
	}

	pub fn as_tensor_ref(&self) -> TensorRef<'_, T> {
		TensorRef { data: &self.data, dims: &self.dims }
	}

	/// Starts an expression with this tensor as its only operand.
	pub fn expr(&self) -> Expr<'_, T> {
		Expr::Tensor(self.as_tensor_ref())
	}

	/// Remaps the dimensions of this tensor. See `TensorSlice`.
	pub fn slice<I: Indices>(&self, selectors: I) -> Result<TensorSlice<'_, T>, ErrPack<TensorError>> {
		TensorSlice::new(self.as_tensor_ref(), &selectors.to_dim_vec())
	}

	pub fn to_ndarray(&self) -> Result<ArrayD<T>, ErrPack<TensorError>> {
		ArrayD::from_shape_vec(IxDyn(&self.dims), self.data.clone()).map_err(|err| {
			cold_path();
			ErrPack {
				code: TensorError::DimensionMismatch,
				extra: Some(Box::new(ErrExtra {
					message: "Cannot convert tensor to ndarray".into(),
					nested: Some(Box::new(err)),
				})),
			}
		})
	}
}

impl<T: Element, const R: usize> TensorExpr<T> for Tensor<T, R> {
	fn size(&self) -> usize {
		self.data.len()
	}

	fn dim_sizes(&self) -> DimVec {
		DimVec::from_slice(&self.dims)
	}

	#[allow(clippy::indexing_slicing)]
	fn element_at(&self, i: usize) -> T {
		self.data[i]
	}
}

impl<T: Element, const R: usize> Index<usize> for Tensor<T, R> {
	type Output = T;

	#[allow(clippy::indexing_slicing)]
	fn index(&self, i: usize) -> &T {
		&self.data[i]
	}
}

impl<T: Element, const R: usize> IndexMut<usize> for Tensor<T, R> {
	#[allow(clippy::indexing_slicing)]
	fn index_mut(&mut self, i: usize) -> &mut T {
		&mut self.data[i]
	}
}

impl<'a, T: Element, const R: usize> TryFrom<Expr<'a, T>> for Tensor<T, R> {
	type Error = ErrPack<TensorError>;

	fn try_from(expr: Expr<'a, T>) -> Result<Self, Self::Error> {
		Self::eval(&expr)
	}
}

impl<T: Element, const R: usize> TryFrom<&ArrayD<T>> for Tensor<T, R> {
	type Error = ErrPack<TensorError>;

	fn try_from(array: &ArrayD<T>) -> Result<Self, Self::Error> {
		// `iter()` walks in logical row-major order, whatever the memory layout is
		Self::from_parts(array.iter().copied().collect(), array.shape())
	}
}

//--------------------------------------------------------------------------------------------------
