//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use crate::ErrPack;
use crate::util::cold_path;
use crate::util::errors::{alloc_error, copy_error};

use super::KernelError;
use super::float::{AtomicFloat, Float};

//--------------------------------------------------------------------------------------------------

/// A named buffer in device global memory.
///
/// Every element is an atomic cell, so blocks running at the same time can store
/// and accumulate into the buffer through a shared reference.
///
/// The kernels index the buffer without any checks other than Rust's bounds checks.
/// Keeping the indices in range is the caller's job.
pub struct DeviceBuffer<F: Float> {
	name: String,
	cells: Box<[F::Atomic]>,
}

impl<F: Float> DeviceBuffer<F> {
	pub fn zeroed(name: &str, elems: usize) -> Result<Self, ErrPack<KernelError>> {
		let mut cells = Vec::new();
		if cells.try_reserve_exact(elems).is_err() {
			cold_path();
			alloc_error(name);
			return Err(ErrPack::with_message(
				KernelError::AllocationFailure,
				format!("Cannot allocate {elems} elements for `{name}`"),
			));
		}
		cells.extend((0..elems).map(|_| F::Atomic::new(F::ZERO)));
		Ok(Self { name: name.to_string(), cells: cells.into_boxed_slice() })
	}

	pub fn from_host(name: &str, src: &[F]) -> Result<Self, ErrPack<KernelError>> {
		let buf = Self::zeroed(name, src.len())?;
		buf.copy_from_host(src)?;
		Ok(buf)
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn len(&self) -> usize {
		self.cells.len()
	}

	pub fn is_empty(&self) -> bool {
		self.cells.is_empty()
	}

	#[cold]
	#[inline(never)]
	fn copy_failed(&self, other: usize) -> ErrPack<KernelError> {
		copy_error(&self.name);
		ErrPack::with_message(
			KernelError::CopyFailure,
			format!("`{}` has {} elements, host side has {other}", self.name, self.len()),
		)
	}

	pub fn copy_from_host(&self, src: &[F]) -> Result<(), ErrPack<KernelError>> {
		if src.len() != self.len() {
			return Err(self.copy_failed(src.len()));
		}
		for (cell, &val) in self.cells.iter().zip(src) {
			cell.store(val);
		}
		Ok(())
	}

	pub fn copy_to_host(&self, dst: &mut [F]) -> Result<(), ErrPack<KernelError>> {
		if dst.len() != self.len() {
			return Err(self.copy_failed(dst.len()));
		}
		for (val, cell) in dst.iter_mut().zip(self.cells.iter()) {
			*val = cell.load();
		}
		Ok(())
	}

	pub fn to_host(&self) -> Vec<F> {
		self.cells.iter().map(|cell| cell.load()).collect()
	}

	pub fn fill(&self, val: F) {
		for cell in &self.cells {
			cell.store(val);
		}
	}

	#[inline]
	#[allow(clippy::indexing_slicing)]
	pub fn load(&self, i: usize) -> F {
		self.cells[i].load()
	}

	#[inline]
	#[allow(clippy::indexing_slicing)]
	pub fn store(&self, i: usize, val: F) {
		self.cells[i].store(val);
	}

	/// Reads `V` consecutive elements starting at `i` in one go.
	#[inline]
	#[allow(clippy::indexing_slicing)]
	pub fn load_vec<const V: usize>(&self, i: usize) -> [F; V] {
		let cells = &self.cells[i..i + V];
		std::array::from_fn(|k| cells[k].load())
	}

	/// Returns the previous value.
	#[inline]
	#[allow(clippy::indexing_slicing)]
	pub fn atomic_add(&self, i: usize, val: F) -> F {
		self.cells[i].fetch_add(val)
	}
}

impl<F: Float> std::fmt::Debug for DeviceBuffer<F> {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		f.debug_struct("DeviceBuffer")
			.field("name", &self.name)
			.field("elems", &self.len())
			.finish()
	}
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn host_round_trip() {
		let buf = DeviceBuffer::<f32>::from_host("x", &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
		assert_eq!(buf.len(), 5);
		assert_eq!(buf.name(), "x");
		assert_eq!(buf.load_vec::<4>(1), [2.0, 3.0, 4.0, 5.0]);
		buf.store(0, 10.0);
		assert_eq!(buf.atomic_add(0, 1.0), 10.0);

		let mut host = [0.0; 5];
		buf.copy_to_host(&mut host).unwrap();
		assert_eq!(host, [11.0, 2.0, 3.0, 4.0, 5.0]);

		buf.fill(0.25);
		assert_eq!(buf.to_host(), vec![0.25; 5]);
	}

	#[test]
	fn copy_size_mismatch() {
		let buf = DeviceBuffer::<f64>::zeroed("y", 3).unwrap();
		let err = buf.copy_from_host(&[1.0, 2.0]).unwrap_err();
		assert_eq!(err.code, KernelError::CopyFailure);
		let mut host = [0.0; 4];
		let err = buf.copy_to_host(&mut host).unwrap_err();
		assert_eq!(err.code, KernelError::CopyFailure);
		assert!(err.message().is_some_and(|m| m.contains("`y`")));
	}

	#[test]
	fn allocation_failure() {
		let err = DeviceBuffer::<f64>::zeroed("huge", usize::MAX).unwrap_err();
		assert_eq!(err.code, KernelError::AllocationFailure);
	}
}

//--------------------------------------------------------------------------------------------------
