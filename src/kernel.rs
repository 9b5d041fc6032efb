//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

//! Data-parallel kernels in the lane / warp / block / grid model.
//!
//! A kernel is written per block. The blocks of a grid run concurrently on the
//! device's worker pool. Inside a block, the lanes run in lockstep: `BlockCtx::threads()`
//! evaluates one phase for every lane before the next phase starts, so a phase boundary
//! behaves like a barrier.

use arrayvec::ArrayVec;
use rayon::prelude::*;

use crate::util::cold_path;
use crate::{ErrExtra, ErrPack};

pub mod block;
pub mod broadcast;
pub mod buffer;
pub mod float;
pub mod grid;
pub mod softmax;
pub mod warp;

#[cfg(test)]
mod tests;

pub use block::{BlockSum, BlockSumAll, block_reduce_sum, block_reduce_sum_all};
pub use broadcast::BroadcastBlockValue;
pub use buffer::DeviceBuffer;
pub use float::{AtomicF32, AtomicF64, AtomicFloat, Float, exp, identity};
pub use grid::{GridReduceSum, VecWidth, grid_reduce_sum};
pub use softmax::{SoftmaxNormalize, softmax, softmax_tensor};
pub use warp::{shfl_down, shfl_xor, warp_all_reduce_sum, warp_reduce_sum};

pub const WARP_SIZE: usize = 32;

/// One shared memory slot per warp.
pub const MAX_WARPS_PER_BLOCK: usize = 32;

//--------------------------------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum KernelError {
	InvalidLaunchConfig,
	AllocationFailure,
	CopyFailure,
	BufferSizeMismatch,
	ThreadPool,
}

impl std::fmt::Display for KernelError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::InvalidLaunchConfig => write!(f, "Invalid launch configuration"),
			Self::AllocationFailure => write!(f, "Device allocation failed"),
			Self::CopyFailure => write!(f, "Host <-> device copy failed"),
			Self::BufferSizeMismatch => write!(f, "Buffer sizes don't match"),
			Self::ThreadPool => write!(f, "Cannot create worker pool"),
		}
	}
}

//--------------------------------------------------------------------------------------------------

/// Launch geometry. Always chosen by the caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
	pub blocks: usize,
	pub threads_per_block: usize,
}

impl LaunchConfig {
	pub fn new(blocks: usize, threads_per_block: usize) -> Self {
		Self { blocks, threads_per_block }
	}

	pub fn warps_per_block(&self) -> usize {
		self.threads_per_block / WARP_SIZE
	}

	pub fn total_threads(&self) -> usize {
		self.blocks * self.threads_per_block
	}

	/// Blocks must be made of whole warps, at most `MAX_WARPS_PER_BLOCK` of them.
	pub fn validate(&self) -> Result<(), ErrPack<KernelError>> {
		let threads = self.threads_per_block;
		if self.blocks == 0
			|| threads == 0
			|| threads % WARP_SIZE != 0
			|| threads > WARP_SIZE * MAX_WARPS_PER_BLOCK
		{
			cold_path();
			return Err(ErrPack::with_message(
				KernelError::InvalidLaunchConfig,
				format!(
					"{} blocks x {threads} threads; need blocks > 0 and threads a multiple of {WARP_SIZE} up to {}",
					self.blocks,
					WARP_SIZE * MAX_WARPS_PER_BLOCK
				),
			));
		}
		Ok(())
	}
}

//--------------------------------------------------------------------------------------------------

/// Execution state of one block.
///
/// Shared memory starts out empty for every block of every launch.
pub struct BlockCtx<F> {
	block_idx: usize,
	block_dim: usize,
	grid_dim: usize,
	shared: ArrayVec<F, MAX_WARPS_PER_BLOCK>,
	barriers: usize,
}

impl<F: Copy> BlockCtx<F> {
	pub fn new(block_idx: usize, config: &LaunchConfig) -> Self {
		Self {
			block_idx,
			block_dim: config.threads_per_block,
			grid_dim: config.blocks,
			shared: ArrayVec::new(),
			barriers: 0,
		}
	}

	pub fn block_idx(&self) -> usize {
		self.block_idx
	}

	/// Threads per block.
	pub fn block_dim(&self) -> usize {
		self.block_dim
	}

	/// Blocks per grid.
	pub fn grid_dim(&self) -> usize {
		self.grid_dim
	}

	pub fn warps(&self) -> usize {
		self.block_dim / WARP_SIZE
	}

	pub fn global_thread(&self, thread: usize) -> usize {
		self.block_idx * self.block_dim + thread
	}

	/// Distance between two consecutive elements handled by the same thread
	/// in a grid-stride loop.
	pub fn grid_stride(&self) -> usize {
		self.block_dim * self.grid_dim
	}

	/// Runs one phase for every thread of the block and collects the per-thread results.
	pub fn threads<R>(&self, f: impl FnMut(usize) -> R) -> Vec<R> {
		(0..self.block_dim).map(f).collect()
	}

	pub fn shared(&self) -> &ArrayVec<F, MAX_WARPS_PER_BLOCK> {
		&self.shared
	}

	pub fn shared_mut(&mut self) -> &mut ArrayVec<F, MAX_WARPS_PER_BLOCK> {
		&mut self.shared
	}

	/// Barrier. With lockstep lanes every write made before this point is already
	/// visible, so only the count is kept.
	pub fn sync_threads(&mut self) {
		self.barriers += 1;
	}

	pub fn barriers(&self) -> usize {
		self.barriers
	}
}

//--------------------------------------------------------------------------------------------------

pub trait Kernel<F: Float>: Sync {
	fn name(&self) -> &'static str;

	fn run_block(&self, block: &mut BlockCtx<F>);
}

//--------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DeviceConfig {
	pub name: String,

	/// Number of worker threads. 0 lets rayon decide.
	pub worker_threads: usize,
}

impl Default for DeviceConfig {
	fn default() -> Self {
		Self { name: "CPU".to_string(), worker_threads: 0 }
	}
}

/// Runs kernels. Blocks are distributed over a pool of worker threads.
pub struct Device {
	name: String,
	pool: rayon::ThreadPool,
}

impl Device {
	pub fn new(config: DeviceConfig) -> Result<Self, ErrPack<KernelError>> {
		let DeviceConfig { name, worker_threads } = config;
		let thread_prefix = name.clone();
		let pool = rayon::ThreadPoolBuilder::new()
			.num_threads(worker_threads)
			.thread_name(move |i| format!("{thread_prefix}-{i}"))
			.build()
			.map_err(|err| {
				cold_path();
				ErrPack {
					code: KernelError::ThreadPool,
					extra: Some(Box::new(ErrExtra {
						message: format!("Cannot create worker pool for device `{name}`").into(),
						nested: Some(Box::new(err)),
					})),
				}
			})?;
		log::info!("Device `{name}` ready with {} worker threads", pool.current_num_threads());
		Ok(Self { name, pool })
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Runs `kernel` on every block of the grid and waits until all of them finish.
	///
	/// Blocks may run in any order and at the same time.
	pub fn launch<F: Float, K: Kernel<F>>(
		&self,
		config: &LaunchConfig,
		kernel: &K,
	) -> Result<(), ErrPack<KernelError>> {
		config.validate()?;
		log::debug!(
			"{}: launching `{}` with {} blocks x {} threads",
			self.name,
			kernel.name(),
			config.blocks,
			config.threads_per_block
		);
		self.pool.install(|| {
			(0..config.blocks).into_par_iter().for_each(|block_idx| {
				let mut block = BlockCtx::new(block_idx, config);
				kernel.run_block(&mut block);
			});
		});
		Ok(())
	}
}

impl std::fmt::Debug for Device {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		f.debug_struct("Device")
			.field("name", &self.name)
			.field("worker_threads", &self.pool.current_num_threads())
			.finish()
	}
}

//--------------------------------------------------------------------------------------------------
