#[path = "mod_memory_store.rs"]
mod memory_store_tests;
