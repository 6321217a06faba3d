// src/store/mod.rs
mod error;
mod file;
mod memory;
mod traits;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::RecordStore;
