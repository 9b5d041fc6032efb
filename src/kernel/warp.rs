//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use arrayvec::ArrayVec;

use super::WARP_SIZE;
use super::float::Float;

//--------------------------------------------------------------------------------------------------

/// Lane `i` receives the value of lane `i + delta`.
///
/// Lanes whose source would be past the end of the warp keep their own value.
pub fn shfl_down<F: Copy>(lanes: &[F], delta: usize) -> ArrayVec<F, WARP_SIZE> {
	lanes
		.iter()
		.take(WARP_SIZE)
		.enumerate()
		.map(|(lane, own)| *lanes.get(lane + delta).unwrap_or(own))
		.collect()
}

/// Lane `i` receives the value of lane `i ^ mask`.
pub fn shfl_xor<F: Copy>(lanes: &[F], mask: usize) -> ArrayVec<F, WARP_SIZE> {
	lanes
		.iter()
		.take(WARP_SIZE)
		.enumerate()
		.map(|(lane, own)| *lanes.get(lane ^ mask).unwrap_or(own))
		.collect()
}

/// Sums the lanes of one warp with `log2(WARP_SIZE)` shift steps.
///
/// Only lane 0 holds the total afterwards.
pub fn warp_reduce_sum<F: Float>(lanes: &mut [F]) {
	debug_assert!(lanes.len() == WARP_SIZE);
	let mut delta = WARP_SIZE / 2;
	while delta > 0 {
		let other = shfl_down(lanes, delta);
		for (val, other) in lanes.iter_mut().zip(other) {
			*val = *val + other;
		}
		delta /= 2;
	}
}

/// Like `warp_reduce_sum()`, but the butterfly exchange leaves the total in every lane.
pub fn warp_all_reduce_sum<F: Float>(lanes: &mut [F]) {
	debug_assert!(lanes.len() == WARP_SIZE);
	let mut mask = WARP_SIZE / 2;
	while mask > 0 {
		let other = shfl_xor(lanes, mask);
		for (val, other) in lanes.iter_mut().zip(other) {
			*val = *val + other;
		}
		mask /= 2;
	}
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
	use super::*;
	use crate::util::LossyInto;

	fn lane_ids() -> Vec<f64> {
		(0..WARP_SIZE).map(|i| i.lossy_into()).collect()
	}

	#[test]
	fn shuffles() {
		let lanes = lane_ids();
		let down = shfl_down(&lanes, 4);
		assert_eq!(down[0], 4.0);
		assert_eq!(down[27], 31.0);
		// out of range sources keep their own value
		assert_eq!(down[28], 28.0);
		assert_eq!(down[31], 31.0);

		let xor = shfl_xor(&lanes, 1);
		assert_eq!(xor[0], 1.0);
		assert_eq!(xor[1], 0.0);
		assert_eq!(xor[30], 31.0);
	}

	#[test]
	fn reduce_lane_zero() {
		let mut lanes = lane_ids();
		warp_reduce_sum(&mut lanes);
		assert_eq!(lanes[0], 496.0);
	}

	#[test]
	fn all_reduce_every_lane() {
		let mut lanes = lane_ids();
		warp_all_reduce_sum(&mut lanes);
		assert!(lanes.iter().all(|&x| x == 496.0));
	}
}

//--------------------------------------------------------------------------------------------------
