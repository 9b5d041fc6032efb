//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use super::buffer::DeviceBuffer;
use super::float::Float;
use super::warp::{warp_all_reduce_sum, warp_reduce_sum};
use super::{BlockCtx, Kernel, WARP_SIZE};

//--------------------------------------------------------------------------------------------------

/// Reduces every warp and writes its partial sum into shared memory, one slot per warp.
#[allow(clippy::indexing_slicing)]
fn publish_warp_partials<F: Float>(block: &mut BlockCtx<F>, vals: &mut [F]) {
	debug_assert!(vals.len() == block.block_dim());

	let shared = block.shared_mut();
	shared.clear();
	for warp in vals.chunks_exact_mut(WARP_SIZE) {
		warp_reduce_sum(warp);
		shared.push(warp[0]);
	}
	block.sync_threads();
}

/// Lane `i` reads the partial of warp `i`, or zero if the block has fewer warps.
fn load_warp_partials<F: Float>(block: &BlockCtx<F>, lanes: &mut [F]) {
	let shared = block.shared();
	for (lane, val) in lanes.iter_mut().enumerate() {
		*val = shared.get(lane).copied().unwrap_or(F::ZERO);
	}
}

/// Sums one value per thread over the whole block.
///
/// `vals` holds the value of every thread and is used as scratch space.
/// The returned total is what thread 0 sees. Other threads hold partial sums.
#[allow(clippy::indexing_slicing)]
pub fn block_reduce_sum<F: Float>(block: &mut BlockCtx<F>, vals: &mut [F]) -> F {
	publish_warp_partials(block, vals);

	let first_warp = &mut vals[..WARP_SIZE];
	load_warp_partials(block, first_warp);
	warp_reduce_sum(first_warp);
	first_warp[0]
}

/// Like `block_reduce_sum()`, but every thread of the block ends up with the total.
///
/// Every warp reduces the partials again with the butterfly exchange.
#[allow(clippy::indexing_slicing)]
pub fn block_reduce_sum_all<F: Float>(block: &mut BlockCtx<F>, vals: &mut [F]) -> F {
	publish_warp_partials(block, vals);

	for warp in vals.chunks_exact_mut(WARP_SIZE) {
		load_warp_partials(block, warp);
		warp_all_reduce_sum(warp);
	}
	vals[0]
}

//--------------------------------------------------------------------------------------------------

/// Every block sums its own `block_dim` elements of `input` and writes the total to
/// `output[block_idx * block_dim]`, the first element the block owns.
pub struct BlockSum<'a, F: Float> {
	pub input: &'a DeviceBuffer<F>,
	pub output: &'a DeviceBuffer<F>,
	pub n: usize,
}

impl<F: Float> Kernel<F> for BlockSum<'_, F> {
	fn name(&self) -> &'static str {
		"block_sum"
	}

	fn run_block(&self, block: &mut BlockCtx<F>) {
		let mut vals = block.threads(|t| {
			let g = block.global_thread(t);
			if g < self.n { self.input.load(g) } else { F::ZERO }
		});
		let total = block_reduce_sum(block, &mut vals);

		let first = block.global_thread(0);
		if first < self.n {
			self.output.store(first, total);
		}
	}
}

/// Every block sums its own elements of `input` and every thread writes the total
/// to its own element of `output`.
pub struct BlockSumAll<'a, F: Float> {
	pub input: &'a DeviceBuffer<F>,
	pub output: &'a DeviceBuffer<F>,
	pub n: usize,
}

impl<F: Float> Kernel<F> for BlockSumAll<'_, F> {
	fn name(&self) -> &'static str {
		"block_sum_all"
	}

	#[allow(clippy::indexing_slicing)]
	fn run_block(&self, block: &mut BlockCtx<F>) {
		let mut vals = block.threads(|t| {
			let g = block.global_thread(t);
			if g < self.n { self.input.load(g) } else { F::ZERO }
		});
		block_reduce_sum_all(block, &mut vals);

		block.threads(|t| {
			let g = block.global_thread(t);
			if g < self.n {
				self.output.store(g, vals[t]);
			}
		});
	}
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
	use assert_approx_eq::assert_approx_eq;

	use super::*;
	use crate::kernel::{Device, DeviceConfig, LaunchConfig};
	use crate::util::LossyInto;

	fn ramp(n: usize) -> Vec<f64> {
		(0..n).map(|i| i.lossy_into()).collect()
	}

	#[test]
	fn reduce_within_block() {
		for threads in [32, 64, 256, 1024] {
			let config = LaunchConfig::new(1, threads);
			let mut block = BlockCtx::<f64>::new(0, &config);

			let expected: f64 = (threads * (threads - 1) / 2).lossy_into();
			let mut vals = ramp(threads);
			assert_approx_eq!(block_reduce_sum(&mut block, &mut vals), expected);

			let mut vals = ramp(threads);
			assert_approx_eq!(block_reduce_sum_all(&mut block, &mut vals), expected);
			assert!(vals.iter().all(|&v| v == expected));
		}
	}

	#[test]
	fn block_sum_kernel() {
		let device = Device::new(DeviceConfig::default()).unwrap();
		let n = 200;
		let input = DeviceBuffer::from_host("in", &vec![1.0_f32; n]).unwrap();
		let output = DeviceBuffer::<f32>::zeroed("out", n).unwrap();

		let config = LaunchConfig::new(4, 64);
		device.launch(&config, &BlockSum { input: &input, output: &output, n }).unwrap();

		let out = output.to_host();
		assert_approx_eq!(out[0], 64.0);
		assert_approx_eq!(out[64], 64.0);
		assert_approx_eq!(out[128], 64.0);
		// the last block only owns 8 elements
		assert_approx_eq!(out[192], 8.0);
		assert_approx_eq!(out[1], 0.0);
	}

	#[test]
	fn block_sum_all_kernel() {
		let device = Device::new(DeviceConfig::default()).unwrap();
		let n = 100;
		let input = DeviceBuffer::from_host("in", &ramp(n)).unwrap();
		let output = DeviceBuffer::<f64>::zeroed("out", n).unwrap();

		let config = LaunchConfig::new(2, 64);
		device.launch(&config, &BlockSumAll { input: &input, output: &output, n }).unwrap();

		let out = output.to_host();
		let first: f64 = (0_i32..64).map(f64::from).sum();
		let second: f64 = (64_i32..100).map(f64::from).sum();
		assert!(out[..64].iter().all(|&v| v == first));
		assert!(out[64..].iter().all(|&v| v == second));
	}
}

//--------------------------------------------------------------------------------------------------
