//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use crate::ErrPack;
use crate::tensor::Tensor;
use crate::util::cold_path;

use super::broadcast::BroadcastBlockValue;
use super::buffer::DeviceBuffer;
use super::float::{Float, exp};
use super::grid::{VecWidth, grid_reduce_sum};
use super::{BlockCtx, Device, Kernel, KernelError, LaunchConfig};

//--------------------------------------------------------------------------------------------------

/// `output[i] = transform(input[i]) / output[i]` for `i < n`.
///
/// `output` must already hold the denominator at every position.
/// There is no max subtraction, so large inputs can overflow `exp`.
pub struct SoftmaxNormalize<'a, F: Float, Tf: Fn(F) -> F + Sync> {
	pub input: &'a DeviceBuffer<F>,
	pub output: &'a DeviceBuffer<F>,
	pub n: usize,
	pub transform: Tf,
}

impl<F: Float, Tf: Fn(F) -> F + Sync> Kernel<F> for SoftmaxNormalize<'_, F, Tf> {
	fn name(&self) -> &'static str {
		"softmax_normalize"
	}

	fn run_block(&self, block: &mut BlockCtx<F>) {
		let f = &self.transform;
		let stride = block.grid_stride();
		block.threads(|t| {
			for i in (block.global_thread(t)..self.n).step_by(stride) {
				let denom = self.output.load(i);
				self.output.store(i, f(self.input.load(i)) / denom);
			}
		});
	}
}

//--------------------------------------------------------------------------------------------------

/// Computes `output[i] = exp(input[i]) / sum(exp(input))` on the device.
///
/// Runs three launches: the grid reduction of `exp(input)` into `output[0]`,
/// a single-block broadcast of `output[0]` over the whole output, and the normalization.
pub fn softmax<F: Float>(
	device: &Device,
	config: &LaunchConfig,
	input: &DeviceBuffer<F>,
	output: &DeviceBuffer<F>,
) -> Result<(), ErrPack<KernelError>> {
	if input.len() != output.len() {
		cold_path();
		return Err(ErrPack::with_message(
			KernelError::BufferSizeMismatch,
			format!(
				"softmax: `{}` has {} elements, `{}` has {}",
				input.name(),
				input.len(),
				output.name(),
				output.len()
			),
		));
	}
	let n = input.len();
	if n == 0 {
		return Ok(());
	}

	output.fill(F::ZERO);
	grid_reduce_sum(device, config, input, output, n, VecWidth::Four, exp)?;

	let single_block = LaunchConfig::new(1, config.threads_per_block);
	device.launch(&single_block, &BroadcastBlockValue { data: output, n })?;

	device.launch(config, &SoftmaxNormalize { input, output, n, transform: exp })
}

/// Softmax over all elements of `tensor`, regardless of its shape.
pub fn softmax_tensor<F: Float, const R: usize>(
	device: &Device,
	config: &LaunchConfig,
	tensor: &Tensor<F, R>,
) -> Result<Tensor<F, R>, ErrPack<KernelError>> {
	let input = DeviceBuffer::from_host("softmax_input", tensor.data())?;
	let output = DeviceBuffer::zeroed("softmax_output", tensor.size())?;
	softmax(device, config, &input, &output)?;

	let mut result = tensor.clone();
	output.copy_to_host(result.data_mut())?;
	Ok(result)
}

//--------------------------------------------------------------------------------------------------


//--------------------------------------------------------------------------------------------------
