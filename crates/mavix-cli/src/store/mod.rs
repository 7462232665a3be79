//! Local artifact index storage.

pub mod actor;
pub mod db;

pub use actor::StoreHandle;
pub use db::{IndexDb, SearchHit, StoreError};
