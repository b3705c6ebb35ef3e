//! Unit tests for annotation format implementations.
//!
//! These tests verify the correctness of format serialization, deserialization,
//! and round-trip conversions.
