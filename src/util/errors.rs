//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

//! Reporting hooks for failed accelerator memory operations.
//!
//! The hooks only write a diagnostic. They never propagate anything, so the
//! caller still has to check the status of the operation itself.

/// Reports that the resource `name` could not be allocated.
pub fn alloc_error(name: &str) {
	log::error!("Error: could not allocate memory for `{name}`");
}

/// Reports that the resource `name` could not be copied between host and device.
pub fn copy_error(name: &str) {
	log::error!("Error: could not copy `{name}` between host and device");
}
