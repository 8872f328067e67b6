//! Infrastructure layer.

pub mod storage;
