//! The staging index: a binary `DIRC`-format file tracking what will go
//! into the next commit, plus the manager that keeps it consistent under
//! concurrent access.

pub mod codec;
pub mod manager;

pub use codec::IndexEntry;
pub use manager::{AddOutcome, IndexManager};
