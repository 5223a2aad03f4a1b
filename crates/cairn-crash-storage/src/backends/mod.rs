// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Backend driver variants.
//!
//! Each driver maps the [`crate::backend::Connection`] capability set onto
//! one kind of store. The object-store and column-store drivers sit on
//! narrow wire-client traits so their SDKs stay out of this crate; the HTTP
//! collector driver is concrete over `reqwest`; the memory driver backs the
//! test suite and single-process deployments.

pub mod column_store;
pub mod http_collector;
pub mod memory;
pub mod object_store;
