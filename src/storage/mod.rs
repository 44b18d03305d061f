//! Storage implementations for the record store trait

pub mod in_memory;

pub use in_memory::InMemoryStore;
