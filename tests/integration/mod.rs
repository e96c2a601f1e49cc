//! Integration tests for the dagcar packing pipeline

mod archive_round_trip;
mod range_slicing;
mod store_modes;
mod support;
mod tree_determinism;
mod tree_structure;
