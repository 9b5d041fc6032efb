//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Sub};

//--------------------------------------------------------------------------------------------------

pub trait FromToF64 {
	fn from_f64(val: f64) -> Self;
	fn to_f64(&self) -> f64;
}

#[allow(clippy::use_self)]
impl FromToF64 for f32 {
	fn from_f64(val: f64) -> Self {
		#[allow(clippy::cast_possible_truncation)]
		(val as f32)
	}

	fn to_f64(&self) -> f64 {
		f64::from(*self)
	}
}

#[allow(clippy::use_self)]
impl FromToF64 for f64 {
	fn from_f64(val: f64) -> Self {
		val
	}

	fn to_f64(&self) -> f64 {
		*self
	}
}

#[allow(clippy::use_self)]
impl FromToF64 for i32 {
	fn from_f64(val: f64) -> Self {
		#[allow(clippy::cast_possible_truncation)]
		(val as i32)
	}

	fn to_f64(&self) -> f64 {
		f64::from(*self)
	}
}

#[allow(clippy::use_self)]
impl FromToF64 for i64 {
	fn from_f64(val: f64) -> Self {
		#[allow(clippy::cast_possible_truncation)]
		(val as i64)
	}

	#[allow(clippy::cast_precision_loss)]
	fn to_f64(&self) -> f64 {
		*self as f64
	}
}

//--------------------------------------------------------------------------------------------------

/// Types that can be stored in a `Tensor`.
pub trait Element:
	Copy
	+ Default
	+ Debug
	+ Send
	+ Sync
	+ 'static
	+ PartialEq
	+ Add<Output = Self>
	+ Sub<Output = Self>
	+ Mul<Output = Self>
	+ Div<Output = Self>
	+ FromToF64
{
}

impl Element for f32 {}
impl Element for f64 {}
impl Element for i32 {}
impl Element for i64 {}

//--------------------------------------------------------------------------------------------------
