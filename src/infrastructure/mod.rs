//! Infrastructure layer - storage backends, event dispatch and logging

pub mod logging;
pub mod storage;
pub mod user;
