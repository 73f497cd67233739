//! Persistence for the product table, pricing config, A/B registry and id
//! counter behind a swappable [`StoreBackend`].

pub mod backend;
pub mod error;
pub mod file;
pub mod memory;
pub mod store;

pub use backend::StoreBackend;
pub use error::StoreError;
pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use store::Store;
