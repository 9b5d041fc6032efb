//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use smallvec::SmallVec;

use crate::ErrPack;
use crate::util::cold_path;

use super::element::Element;
use super::error::TensorError;
use super::expr::{TensorExpr, TensorRef};
use super::index::{self, DimVec, Indices};

//--------------------------------------------------------------------------------------------------

/// A remapping of a tensor's dimensions. No data is copied.
///
/// Selector `k` names the source dimension that becomes dimension `k` of the view.
/// For a 3x2 tensor, selectors `(1, 0)` give a 2x3 view which is the transpose.
/// Source dimensions that are not selected are pinned at index 0.
/// The source must have at least one element.
#[derive(Clone, Debug)]
pub struct TensorSlice<'a, T> {
	data: &'a [T],
	dims: DimVec,
	strides: DimVec,
}

impl<'a, T: Element> TensorSlice<'a, T> {
	#[allow(clippy::indexing_slicing)]
	pub fn new(source: TensorRef<'a, T>, selectors: &[usize]) -> Result<Self, ErrPack<TensorError>> {
		let rank = source.dims.len();
		if source.data.is_empty() {
			cold_path();
			return Err(ErrPack::with_message(
				TensorError::InvalidSlice,
				format!("Cannot slice an empty tensor with dimensions {:?}", source.dims),
			));
		}
		if selectors.is_empty() || selectors.len() > rank {
			cold_path();
			return Err(ErrPack::with_message(
				TensorError::InvalidSlice,
				format!("Expected 1 ..= {rank} selectors, got {}", selectors.len()),
			));
		}

		let source_strides = index::strides(source.dims);
		let mut used: SmallVec<[bool; index::INLINE_DIMS]> = SmallVec::from_elem(false, rank);
		let mut dims = DimVec::with_capacity(selectors.len());
		let mut strides = DimVec::with_capacity(selectors.len());
		for (position, &sel) in selectors.iter().enumerate() {
			let Some(seen) = used.get_mut(sel) else {
				cold_path();
				return Err(TensorError::IndexOutOfRange { dimension: position, limit: rank, got: sel }
					.into());
			};
			if *seen {
				cold_path();
				return Err(ErrPack::with_message(
					TensorError::InvalidSlice,
					format!("Dimension {sel} selected more than once"),
				));
			}
			*seen = true;
			dims.push(source.dims[sel]);
			strides.push(source_strides[sel]);
		}

		Ok(Self { data: source.data, dims, strides })
	}

	pub fn rank(&self) -> usize {
		self.dims.len()
	}

	fn source_offset(&self, idx: &[usize]) -> usize {
		idx.iter().zip(&self.strides).map(|(i, stride)| i * stride).sum()
	}

	/// Element at a multi-index of the view.
	#[allow(clippy::indexing_slicing)]
	pub fn try_at<I: Indices>(&self, idx: I) -> Result<T, ErrPack<TensorError>> {
		let idx = idx.to_dim_vec();
		index::offset_of(&self.dims, &idx)?;
		Ok(self.data[self.source_offset(&idx)])
	}
}

impl<'a, T: Element> TensorExpr<T> for TensorSlice<'a, T> {
	fn size(&self) -> usize {
		self.dims.iter().product()
	}

	fn dim_sizes(&self) -> DimVec {
		self.dims.clone()
	}

	#[allow(clippy::indexing_slicing)]
	fn element_at(&self, i: usize) -> T {
		let idx = index::unravel(i, &self.dims);
		self.data[self.source_offset(&idx)]
	}
}

//--------------------------------------------------------------------------------------------------
