
mod sync_tests;
