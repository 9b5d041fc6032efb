//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

// clippy
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]
#![warn(clippy::cast_lossless)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::indexing_slicing)]
#![warn(clippy::panic_in_result_fn)]
#![warn(clippy::panic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::elidable_lifetime_names)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::inline_always)]
#![allow(clippy::tabs_in_doc_comments)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::module_name_repetitions)]

use std::borrow::Cow;
use std::convert::Infallible;

pub mod cell;
pub mod kernel;
pub mod tensor;
pub mod util;

//--------------------------------------------------------------------------------------------------

#[derive(Debug)]
pub struct ErrExtra {
	pub message: Cow<'static, str>,
	pub nested: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug)]
pub struct ErrPack<Code: Copy + std::fmt::Debug> {
	pub code: Code,
	pub extra: Option<Box<ErrExtra>>,
}

impl<Code: Copy + std::fmt::Debug> ErrPack<Code> {
	pub fn new(code: Code) -> Self {
		Self { code, extra: None }
	}

	#[cold]
	#[inline(never)]
	pub fn with_message(code: Code, message: impl Into<Cow<'static, str>>) -> Self {
		Self {
			code,
			extra: Some(Box::new(ErrExtra { message: message.into(), nested: None })),
		}
	}

	pub fn message(&self) -> Option<&str> {
		self.extra.as_ref().map(|extra| extra.message.as_ref())
	}
}

#[cold]
#[inline(never)]
#[allow(clippy::panic)]
fn panic_infallible_to_err_conversion<Code: Copy + std::fmt::Debug>() -> ErrPack<Code> {
	panic!("Infallible should never be converted to ErrPack");
}

impl<Code: Copy + std::fmt::Debug> From<Infallible> for ErrPack<Code> {
	fn from(_: Infallible) -> Self {
		panic_infallible_to_err_conversion()
	}
}

impl<Code: Copy + std::fmt::Debug> std::error::Error for ErrPack<Code> {
}

impl<Code: Copy + std::fmt::Debug> std::fmt::Display for ErrPack<Code> {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let code = self.code;
		write!(f, "(ErrPack: code={code:?}")?;
		if let Some(ref extra) = self.extra {
			let msg = extra.message.as_ref();
			if !msg.is_empty() {
				write!(f, ", message={msg}")?;
			}
			if let Some(nested) = &extra.nested {
				write!(f, ", nested={nested:?}")?;
			}
		}
		write!(f, ")")
	}
}

//--------------------------------------------------------------------------------------------------
