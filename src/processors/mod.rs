//! File processors that drive the translation client

pub mod batch;
