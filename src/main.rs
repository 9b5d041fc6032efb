//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use std::error::Error;

use clap::Parser;

use frnn::cell::Cell;
use frnn::kernel::{
	Device, DeviceBuffer, DeviceConfig, LaunchConfig, VecWidth, grid_reduce_sum, identity,
	softmax_tensor,
};
use frnn::tensor::Tensor;

#[derive(Parser)]
#[command(name = "frnn", about = "Tensor expressions and reduction kernels demo")]
struct Cli {
	/// Verbose logging (repeat for more: -v, -vv, -vvv).
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbose: u8,

	/// Worker threads of the device. 0 picks the number of CPUs.
	#[arg(short = 'j', long, default_value_t = 0)]
	threads: usize,

	/// Blocks per grid.
	#[arg(long, default_value_t = 2)]
	blocks: usize,

	/// Threads per block. Must be a multiple of 32.
	#[arg(long, default_value_t = 64)]
	threads_per_block: usize,
}

fn main() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();
	stderrlog::new()
		.module(module_path!())
		.module("frnn")
		.verbosity(usize::from(cli.verbose))
		.init()?;

	let a = Tensor::<f32, 2>::from_parts(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3])?;
	let b = Tensor::<f32, 2>::from_parts(vec![0.5, 0.5, 0.5, 1.0, 1.0, 1.0], &[2, 3])?;

	let c: Tensor<f32, 2> = (&a + &b * &a).eval()?;
	println!("a + b * a = {:?}", c.data());

	let t: Tensor<f32, 2> = Tensor::eval(&a.slice((1, 0))?)?;
	println!("transposed {:?} = {:?}", t.dim_sizes(), t.data());

	let device = Device::new(DeviceConfig { worker_threads: cli.threads, ..DeviceConfig::default() })?;
	let config = LaunchConfig::new(cli.blocks, cli.threads_per_block);

	let ones = DeviceBuffer::from_host("ones", &vec![1.0_f32; 1000])?;
	let sum = DeviceBuffer::<f32>::zeroed("sum", 1)?;
	grid_reduce_sum(&device, &config, &ones, &sum, ones.len(), VecWidth::Four, identity)?;
	println!("sum of 1000 ones = {}", sum.load(0));

	let s = softmax_tensor(&device, &config, &c)?;
	println!("softmax = {:?}", s.data());

	let mut cell = Cell::<f32>::default();
	cell.input = s.data().iter().copied().fold(0.0, f32::max);
	println!("{cell:?}");

	Ok(())
}

//--------------------------------------------------------------------------------------------------


//--------------------------------------------------------------------------------------------------
