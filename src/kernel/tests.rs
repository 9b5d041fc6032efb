//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

//--------------------------------------------------------------------------------------------------

#[test]
fn launch_config_validation() {
	assert!(LaunchConfig::new(1, 32).validate().is_ok());
	assert!(LaunchConfig::new(100, 1024).validate().is_ok());

	for bad in [
		LaunchConfig::new(0, 32),
		LaunchConfig::new(1, 0),
		LaunchConfig::new(1, 33),
		LaunchConfig::new(1, 1056),
	] {
		let err = bad.validate().unwrap_err();
		assert_eq!(err.code, KernelError::InvalidLaunchConfig);
		assert!(err.message().is_some());
	}
}

#[test]
fn launch_config_geometry() {
	let config = LaunchConfig::new(3, 256);
	assert_eq!(config.warps_per_block(), 8);
	assert_eq!(config.total_threads(), 768);
}

#[test]
fn block_ctx_indices() {
	let config = LaunchConfig::new(4, 64);
	let block = BlockCtx::<f32>::new(2, &config);
	assert_eq!(block.block_idx(), 2);
	assert_eq!(block.block_dim(), 64);
	assert_eq!(block.grid_dim(), 4);
	assert_eq!(block.warps(), 2);
	assert_eq!(block.global_thread(5), 133);
	assert_eq!(block.grid_stride(), 256);
	assert_eq!(block.threads(|t| t * 2).len(), 64);
	assert!(block.shared().is_empty());
}

struct CountBlocks<'a> {
	blocks: &'a AtomicUsize,
	threads: &'a AtomicUsize,
	dirty_shared: &'a AtomicUsize,
}

impl Kernel<f32> for CountBlocks<'_> {
	fn name(&self) -> &'static str {
		"count_blocks"
	}

	fn run_block(&self, block: &mut BlockCtx<f32>) {
		if !block.shared().is_empty() {
			self.dirty_shared.fetch_add(1, Ordering::Relaxed);
		}
		block.shared_mut().push(1.0);
		block.sync_threads();

		self.blocks.fetch_add(1, Ordering::Relaxed);
		block.threads(|_| self.threads.fetch_add(1, Ordering::Relaxed));
	}
}

#[test]
fn launch_runs_every_block() {
	let device = Device::new(DeviceConfig { name: "counter".into(), worker_threads: 3 }).unwrap();
	assert_eq!(device.name(), "counter");

	let blocks = AtomicUsize::new(0);
	let threads = AtomicUsize::new(0);
	let dirty_shared = AtomicUsize::new(0);
	let kernel = CountBlocks { blocks: &blocks, threads: &threads, dirty_shared: &dirty_shared };

	device.launch(&LaunchConfig::new(17, 96), &kernel).unwrap();
	device.launch(&LaunchConfig::new(17, 96), &kernel).unwrap();

	assert_eq!(blocks.load(Ordering::Relaxed), 34);
	assert_eq!(threads.load(Ordering::Relaxed), 34 * 96);
	assert_eq!(dirty_shared.load(Ordering::Relaxed), 0);
}

#[test]
fn invalid_launch_runs_nothing() {
	let device = Device::new(DeviceConfig::default()).unwrap();
	let blocks = AtomicUsize::new(0);
	let threads = AtomicUsize::new(0);
	let dirty_shared = AtomicUsize::new(0);
	let kernel = CountBlocks { blocks: &blocks, threads: &threads, dirty_shared: &dirty_shared };

	let err = device.launch(&LaunchConfig::new(2, 40), &kernel).unwrap_err();
	assert_eq!(err.code, KernelError::InvalidLaunchConfig);
	assert_eq!(blocks.load(Ordering::Relaxed), 0);
}

//--------------------------------------------------------------------------------------------------
