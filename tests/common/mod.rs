//! Common test utilities for charney.
//!
//! This module provides shared builders for pipeline tests.

pub mod test_data;
