// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod alerts;
pub mod import;
pub mod links;

pub use alerts::AlertSink;
