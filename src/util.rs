//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

pub mod errors;

/// Marks the unlikely branch of a condition.
#[cold]
#[inline(never)]
pub fn cold_path() {}

pub trait LossyInto<T> {
	fn lossy_into(self) -> T;
}

#[allow(clippy::cast_precision_loss)]
impl LossyInto<f64> for usize {
	fn lossy_into(self) -> f64 {
		self as f64
	}
}

#[allow(clippy::cast_precision_loss)]
impl LossyInto<f32> for usize {
	fn lossy_into(self) -> f32 {
		self as f32
	}
}
