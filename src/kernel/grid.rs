//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use crate::ErrPack;

use super::block::block_reduce_sum;
use super::buffer::DeviceBuffer;
use super::float::Float;
use super::{BlockCtx, Device, Kernel, KernelError, LaunchConfig};

//--------------------------------------------------------------------------------------------------

/// Accumulates `sum(transform(input[i]))` for `i < n` into `output[0]`.
///
/// Every thread walks the input with a grid-stride loop, reading `V` consecutive
/// elements at a time. Elements that don't fill a whole vector are picked up by a
/// scalar loop. Each block then reduces its partials and adds the block total to
/// `output[0]` with a single atomic add.
///
/// `output[0]` is not cleared by the kernel. The caller zeroes it before the launch.
/// `n` must not exceed `input.len()`.
pub struct GridReduceSum<'a, F: Float, Tf: Fn(F) -> F + Sync, const V: usize> {
	pub input: &'a DeviceBuffer<F>,
	pub output: &'a DeviceBuffer<F>,
	pub n: usize,
	pub transform: Tf,
}

impl<'a, F: Float, Tf: Fn(F) -> F + Sync, const V: usize> GridReduceSum<'a, F, Tf, V> {
	pub fn new(
		input: &'a DeviceBuffer<F>,
		output: &'a DeviceBuffer<F>,
		n: usize,
		transform: Tf,
	) -> Self {
		Self { input, output, n, transform }
	}

	fn thread_partial(&self, global_thread: usize, stride: usize) -> F {
		let f = &self.transform;
		let mut sum = F::ZERO;

		let vectors = self.n / V;
		for v in (global_thread..vectors).step_by(stride) {
			for x in self.input.load_vec::<V>(v * V) {
				sum = sum + f(x);
			}
		}

		for i in (vectors * V + global_thread..self.n).step_by(stride) {
			sum = sum + f(self.input.load(i));
		}
		sum
	}
}

impl<F: Float, Tf: Fn(F) -> F + Sync, const V: usize> Kernel<F> for GridReduceSum<'_, F, Tf, V> {
	fn name(&self) -> &'static str {
		const { assert!(V == 1 || V == 2 || V == 4) };
		match V {
			1 => "grid_reduce_sum",
			2 => "grid_reduce_sum_vec2",
			_ => "grid_reduce_sum_vec4",
		}
	}

	fn run_block(&self, block: &mut BlockCtx<F>) {
		const { assert!(V == 1 || V == 2 || V == 4) };

		let stride = block.grid_stride();
		let mut vals = block.threads(|t| self.thread_partial(block.global_thread(t), stride));
		let total = block_reduce_sum(block, &mut vals);

		// thread 0
		self.output.atomic_add(0, total);
	}
}

//--------------------------------------------------------------------------------------------------

/// Width of the loads in the grid-stride loop.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum VecWidth {
	#[default]
	Scalar,
	Two,
	Four,
}

impl VecWidth {
	pub fn elems(self) -> usize {
		match self {
			Self::Scalar => 1,
			Self::Two => 2,
			Self::Four => 4,
		}
	}
}

/// Launches `GridReduceSum` with the requested load width.
///
/// `output[0]` must be zeroed by the caller.
pub fn grid_reduce_sum<F: Float, Tf: Fn(F) -> F + Sync>(
	device: &Device,
	config: &LaunchConfig,
	input: &DeviceBuffer<F>,
	output: &DeviceBuffer<F>,
	n: usize,
	width: VecWidth,
	transform: Tf,
) -> Result<(), ErrPack<KernelError>> {
	match width {
		VecWidth::Scalar => {
			device.launch(config, &GridReduceSum::<F, Tf, 1>::new(input, output, n, transform))
		},
		VecWidth::Two => {
			device.launch(config, &GridReduceSum::<F, Tf, 2>::new(input, output, n, transform))
		},
		VecWidth::Four => {
			device.launch(config, &GridReduceSum::<F, Tf, 4>::new(input, output, n, transform))
		},
	}
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use assert_approx_eq::assert_approx_eq;

	use super::*;
	use crate::kernel::DeviceConfig;
	use crate::kernel::float::{exp, identity};

	const WIDTHS: [VecWidth; 3] = [VecWidth::Scalar, VecWidth::Two, VecWidth::Four];

	fn configs() -> Vec<LaunchConfig> {
		vec![
			LaunchConfig::new(1, 32),
			LaunchConfig::new(1, 1024),
			LaunchConfig::new(3, 64),
			LaunchConfig::new(8, 128),
			LaunchConfig::new(64, 256),
		]
	}

	#[test]
	fn sum_of_ones() {
		let device = Device::new(DeviceConfig { name: "test".into(), worker_threads: 4 }).unwrap();
		let n = 1000;
		let input = DeviceBuffer::from_host("ones", &vec![1.0_f32; n]).unwrap();
		let output = DeviceBuffer::<f32>::zeroed("sum", 1).unwrap();

		for config in configs() {
			for width in WIDTHS {
				output.fill(0.0);
				grid_reduce_sum(&device, &config, &input, &output, n, width, identity).unwrap();
				assert_approx_eq!(output.load(0), 1000.0, 1e-3);
			}
		}
	}

	#[test]
	fn sum_with_remainder() {
		let device = Device::new(DeviceConfig::default()).unwrap();
		// not a multiple of any vector width
		let n = 1003;
		let data: Vec<f64> = (0_i32..1003).map(f64::from).collect();
		let input = DeviceBuffer::from_host("ramp", &data).unwrap();
		let output = DeviceBuffer::<f64>::zeroed("sum", 1).unwrap();

		for config in configs() {
			for width in WIDTHS {
				output.fill(0.0);
				grid_reduce_sum(&device, &config, &input, &output, n, width, identity).unwrap();
				assert_approx_eq!(output.load(0), 1002.0 * 1003.0 / 2.0);
			}
		}
	}

	#[test]
	fn only_first_n_elements() {
		let device = Device::new(DeviceConfig::default()).unwrap();
		let input = DeviceBuffer::from_host("in", &[1.0_f64, 2.0, 3.0, 4.0, 100.0]).unwrap();
		let output = DeviceBuffer::<f64>::zeroed("sum", 1).unwrap();

		let kernel = GridReduceSum::<f64, _, 4>::new(&input, &output, 4, identity);
		device.launch(&LaunchConfig::new(2, 32), &kernel).unwrap();
		assert_approx_eq!(output.load(0), 10.0);
	}

	#[test]
	fn exp_transform() {
		let device = Device::new(DeviceConfig::default()).unwrap();
		let input = DeviceBuffer::from_host("in", &[1.0_f64, 2.0, 3.0]).unwrap();
		let output = DeviceBuffer::<f64>::zeroed("sum", 1).unwrap();

		grid_reduce_sum(&device, &LaunchConfig::new(1, 32), &input, &output, 3, VecWidth::Two, exp)
			.unwrap();
		assert_approx_eq!(output.load(0), 1.0_f64.exp() + 2.0_f64.exp() + 3.0_f64.exp());
	}

	#[test]
	fn accumulates_into_existing_value() {
		let device = Device::new(DeviceConfig::default()).unwrap();
		let input = DeviceBuffer::from_host("in", &[1.0_f32; 64]).unwrap();
		let output = DeviceBuffer::from_host("sum", &[5.0_f32]).unwrap();

		let kernel = GridReduceSum::<f32, _, 1>::new(&input, &output, 64, |x: f32| x * 2.0);
		device.launch(&LaunchConfig::new(2, 32), &kernel).unwrap();
		assert_approx_eq!(output.load(0), 133.0);
	}

	#[test]
	fn rejects_bad_launch() {
		let device = Device::new(DeviceConfig::default()).unwrap();
		let input = DeviceBuffer::from_host("in", &[1.0_f32; 8]).unwrap();
		let output = DeviceBuffer::<f32>::zeroed("sum", 1).unwrap();

		let config = LaunchConfig::new(1, 48);
		let err = grid_reduce_sum(&device, &config, &input, &output, 8, VecWidth::Scalar, identity)
			.unwrap_err();
		assert_eq!(err.code, KernelError::InvalidLaunchConfig);
		assert_eq!(output.load(0), 0.0);
	}
}

//--------------------------------------------------------------------------------------------------
