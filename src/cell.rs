//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

/// State of one LSTM cell.
///
/// `P` is the precision of the computation, typically `f32` or `f64`.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct Cell<P> {
	/// Value fed into the cell.
	pub input: P,

	/// Value produced by the cell.
	pub output: P,

	/// Forget gate. Decides how much of the previous state is kept.
	pub forget: P,

	/// Current state.
	pub state_t: P,

	/// Previous state.
	pub state_t1: P,
}

//--------------------------------------------------------------------------------------------------


//--------------------------------------------------------------------------------------------------
