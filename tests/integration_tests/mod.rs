mod store;

#[path = "mod_lib.rs"]
mod lib_tests;
