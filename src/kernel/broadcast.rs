//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use super::buffer::DeviceBuffer;
use super::float::Float;
use super::{BlockCtx, Kernel};

//--------------------------------------------------------------------------------------------------

/// Copies the first element of each block's segment to the rest of the segment.
///
/// A segment is `block_dim` consecutive elements. With a grid-stride loop, block `b`
/// also covers segments `b + grid_dim`, `b + 2 * grid_dim`, and so on. Those later
/// segments receive the value of segment `b`, so a single-block launch spreads
/// `data[0]` over the whole buffer.
///
/// `n` must not exceed `data.len()`.
pub struct BroadcastBlockValue<'a, F: Float> {
	pub data: &'a DeviceBuffer<F>,
	pub n: usize,
}

impl<F: Float> Kernel<F> for BroadcastBlockValue<'_, F> {
	fn name(&self) -> &'static str {
		"broadcast_block_value"
	}

	#[allow(clippy::indexing_slicing)]
	fn run_block(&self, block: &mut BlockCtx<F>) {
		let first = block.global_thread(0);
		if first >= self.n {
			return;
		}

		// every thread reads before anybody writes
		let vals = block.threads(|_| self.data.load(first));
		block.sync_threads();

		let stride = block.grid_stride();
		block.threads(|t| {
			for i in (block.global_thread(t)..self.n).step_by(stride) {
				self.data.store(i, vals[t]);
			}
		});
	}
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
	use super::*;
	use crate::kernel::{Device, DeviceConfig, LaunchConfig};

	fn segment_starts(n: usize, block_dim: usize) -> Vec<f32> {
		let mut data = vec![0.0; n];
		for (seg, chunk) in data.chunks_mut(block_dim).enumerate() {
			chunk[0] = f32::from(u16::try_from(seg + 1).unwrap());
		}
		data
	}

	#[test]
	fn single_wave() {
		let device = Device::new(DeviceConfig::default()).unwrap();
		let data = DeviceBuffer::from_host("data", &segment_starts(128, 32)).unwrap();

		device.launch(&LaunchConfig::new(4, 32), &BroadcastBlockValue { data: &data, n: 128 }).unwrap();

		let out = data.to_host();
		for (seg, chunk) in out.chunks(32).enumerate() {
			let expected = f32::from(u16::try_from(seg + 1).unwrap());
			assert!(chunk.iter().all(|&v| v == expected));
		}
	}

	#[test]
	fn later_waves_source_from_earlier_blocks() {
		let device = Device::new(DeviceConfig::default()).unwrap();
		// 5 segments, 2 blocks: segments 2 and 4 come from block 0, segment 3 from block 1
		let n = 150;
		let data = DeviceBuffer::from_host("data", &segment_starts(n, 32)).unwrap();

		device.launch(&LaunchConfig::new(2, 32), &BroadcastBlockValue { data: &data, n }).unwrap();

		let out = data.to_host();
		let expected_by_segment = [1.0, 2.0, 1.0, 2.0, 1.0];
		for (seg, chunk) in out.chunks(32).enumerate() {
			assert!(chunk.iter().all(|&v| v == expected_by_segment[seg]));
		}
	}

	#[test]
	fn single_block_spreads_first_element() {
		let device = Device::new(DeviceConfig::default()).unwrap();
		let mut host = vec![0.0_f64; 1000];
		host[0] = 6.5;
		let data = DeviceBuffer::from_host("data", &host).unwrap();

		device.launch(&LaunchConfig::new(1, 256), &BroadcastBlockValue { data: &data, n: 1000 }).unwrap();

		assert!(data.to_host().iter().all(|&v| v == 6.5));
	}

	#[test]
	fn leaves_tail_alone() {
		let device = Device::new(DeviceConfig::default()).unwrap();
		let data = DeviceBuffer::from_host("data", &[3.0_f32, 0.0, 0.0, 9.0]).unwrap();

		device.launch(&LaunchConfig::new(1, 32), &BroadcastBlockValue { data: &data, n: 3 }).unwrap();

		assert_eq!(data.to_host(), vec![3.0, 3.0, 3.0, 9.0]);
	}
}

//--------------------------------------------------------------------------------------------------
