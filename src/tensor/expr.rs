//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use std::ops::{Add, Div, Mul, Neg, Sub};

use smallvec::SmallVec;

use crate::ErrPack;
use crate::util::cold_path;

use super::element::{Element, FromToF64};
use super::error::TensorError;
use super::index::DimVec;
use super::slice::TensorSlice;
use super::Tensor;

//--------------------------------------------------------------------------------------------------

/// Anything that can be read element by element like a tensor.
///
/// `element_at()` takes a flat row-major index in `0 ..< size()`.
pub trait TensorExpr<T: Element> {
	fn size(&self) -> usize;

	fn dim_sizes(&self) -> DimVec;

	fn element_at(&self, i: usize) -> T;

	/// Checks that all operands agree on their dimensions.
	fn validate(&self) -> Result<(), ErrPack<TensorError>> {
		Ok(())
	}
}

//--------------------------------------------------------------------------------------------------

/// Non-owning view of a tensor's buffer and dimensions.
#[derive(Clone, Copy, Debug)]
pub struct TensorRef<'a, T> {
	pub(crate) data: &'a [T],
	pub(crate) dims: &'a [usize],
}

impl<'a, T> TensorRef<'a, T> {
	pub fn data(&self) -> &'a [T] {
		self.data
	}

	pub fn dims(&self) -> &'a [usize] {
		self.dims
	}
}

//--------------------------------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnaryOp {
	Neg,
	Abs,
	Exp,
	Tanh,
	Sigmoid,
}

impl UnaryOp {
	pub fn apply<T: Element>(self, a: T) -> T {
		let a = a.to_f64();
		let result = match self {
			Self::Neg => -a,
			Self::Abs => a.abs(),
			Self::Exp => a.exp(),
			Self::Tanh => a.tanh(),
			Self::Sigmoid => 1.0 / (1.0 + (-a).exp()),
		};
		T::from_f64(result)
	}
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinaryOp {
	Add,
	Sub,
	Mul,
	Div,
}

impl BinaryOp {
	pub fn apply<T: Element>(self, a: T, b: T) -> T {
		match self {
			Self::Add => a + b,
			Self::Sub => a - b,
			Self::Mul => a * b,
			Self::Div => a / b,
		}
	}
}

//--------------------------------------------------------------------------------------------------

/// Deferred arithmetic over tensors.
///
/// Nodes only borrow their leaves, so an `Expr` cannot outlive the tensors it reads.
/// Nothing is computed until the expression is evaluated into a `Tensor`.
#[derive(Clone, Debug)]
pub enum Expr<'a, T: Element> {
	Tensor(TensorRef<'a, T>),
	Slice(TensorSlice<'a, T>),
	Unary(UnaryOp, Box<Expr<'a, T>>),
	Binary(BinaryOp, Box<Expr<'a, T>>, Box<Expr<'a, T>>),
}

impl<'a, T: Element> Expr<'a, T> {
	pub fn unary(op: UnaryOp, a: impl IntoExpr<'a, T>) -> Self {
		Self::Unary(op, Box::new(a.into_expr()))
	}

	pub fn binary(op: BinaryOp, a: impl IntoExpr<'a, T>, b: impl IntoExpr<'a, T>) -> Self {
		Self::Binary(op, Box::new(a.into_expr()), Box::new(b.into_expr()))
	}

	pub fn abs(self) -> Self {
		Self::unary(UnaryOp::Abs, self)
	}

	pub fn exp(self) -> Self {
		Self::unary(UnaryOp::Exp, self)
	}

	pub fn tanh(self) -> Self {
		Self::unary(UnaryOp::Tanh, self)
	}

	pub fn sigmoid(self) -> Self {
		Self::unary(UnaryOp::Sigmoid, self)
	}

	/// Materializes the expression.
	pub fn eval<const R: usize>(&self) -> Result<Tensor<T, R>, ErrPack<TensorError>> {
		Tensor::eval(self)
	}

	/// Number of nodes in the expression tree.
	pub fn node_count(&self) -> usize {
		match self {
			Self::Tensor(_) | Self::Slice(_) => 1,
			Self::Unary(_, a) => 1 + a.node_count(),
			Self::Binary(_, a, b) => 1 + a.node_count() + b.node_count(),
		}
	}
}

impl<'a, T: Element> TensorExpr<T> for Expr<'a, T> {
	fn size(&self) -> usize {
		match self {
			Self::Tensor(t) => t.data.len(),
			Self::Slice(s) => s.size(),
			Self::Unary(_, a) | Self::Binary(_, a, _) => a.size(),
		}
	}

	fn dim_sizes(&self) -> DimVec {
		match self {
			Self::Tensor(t) => SmallVec::from_slice(t.dims),
			Self::Slice(s) => s.dim_sizes(),
			Self::Unary(_, a) | Self::Binary(_, a, _) => a.dim_sizes(),
		}
	}

	#[allow(clippy::indexing_slicing)]
	fn element_at(&self, i: usize) -> T {
		match self {
			Self::Tensor(t) => t.data[i],
			Self::Slice(s) => s.element_at(i),
			Self::Unary(op, a) => op.apply(a.element_at(i)),
			Self::Binary(op, a, b) => op.apply(a.element_at(i), b.element_at(i)),
		}
	}

	fn validate(&self) -> Result<(), ErrPack<TensorError>> {
		match self {
			Self::Tensor(_) | Self::Slice(_) => Ok(()),
			Self::Unary(_, a) => a.validate(),
			Self::Binary(op, a, b) => {
				a.validate()?;
				b.validate()?;
				let a_dims = a.dim_sizes();
				let b_dims = b.dim_sizes();
				if a_dims != b_dims || a.size() != b.size() {
					cold_path();
					return Err(ErrPack::with_message(
						TensorError::DimensionMismatch,
						format!("{op:?}: operand dimensions {a_dims:?} and {b_dims:?} don't match"),
					));
				}
				Ok(())
			},
		}
	}
}

//--------------------------------------------------------------------------------------------------

pub trait IntoExpr<'a, T: Element> {
	fn into_expr(self) -> Expr<'a, T>;
}

impl<'a, T: Element> IntoExpr<'a, T> for Expr<'a, T> {
	fn into_expr(self) -> Expr<'a, T> {
		self
	}
}

impl<'a, T: Element, const R: usize> IntoExpr<'a, T> for &'a Tensor<T, R> {
	fn into_expr(self) -> Expr<'a, T> {
		Expr::Tensor(self.as_tensor_ref())
	}
}

impl<'a, T: Element> IntoExpr<'a, T> for TensorSlice<'a, T> {
	fn into_expr(self) -> Expr<'a, T> {
		Expr::Slice(self)
	}
}

impl<'a, T: Element> IntoExpr<'a, T> for &TensorSlice<'a, T> {
	fn into_expr(self) -> Expr<'a, T> {
		Expr::Slice(self.clone())
	}
}

//--------------------------------------------------------------------------------------------------

macro_rules! impl_binary_operator {
	($trait:ident, $method:ident, $op:expr) => {
		impl<'a, T: Element, Rhs: IntoExpr<'a, T>> $trait<Rhs> for Expr<'a, T> {
			type Output = Expr<'a, T>;

			fn $method(self, rhs: Rhs) -> Self::Output {
				Expr::binary($op, self, rhs)
			}
		}

		impl<'a, T: Element, const R: usize, Rhs: IntoExpr<'a, T>> $trait<Rhs> for &'a Tensor<T, R> {
			type Output = Expr<'a, T>;

			fn $method(self, rhs: Rhs) -> Self::Output {
				Expr::binary($op, self, rhs)
			}
		}

		impl<'a, T: Element, Rhs: IntoExpr<'a, T>> $trait<Rhs> for TensorSlice<'a, T> {
			type Output = Expr<'a, T>;

			fn $method(self, rhs: Rhs) -> Self::Output {
				Expr::binary($op, self, rhs)
			}
		}
	};
}

impl_binary_operator!(Add, add, BinaryOp::Add);
impl_binary_operator!(Sub, sub, BinaryOp::Sub);
impl_binary_operator!(Mul, mul, BinaryOp::Mul);
impl_binary_operator!(Div, div, BinaryOp::Div);

impl<'a, T: Element> Neg for Expr<'a, T> {
	type Output = Self;

	fn neg(self) -> Self {
		Self::unary(UnaryOp::Neg, self)
	}
}

impl<'a, T: Element, const R: usize> Neg for &'a Tensor<T, R> {
	type Output = Expr<'a, T>;

	fn neg(self) -> Expr<'a, T> {
		Expr::unary(UnaryOp::Neg, self)
	}
}

//--------------------------------------------------------------------------------------------------
