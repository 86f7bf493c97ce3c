//! Run configuration for the batch binary.

pub mod run;
