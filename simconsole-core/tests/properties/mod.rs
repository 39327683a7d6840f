//! Property-based tests for the SimConsole core library

mod book_tests;
mod persistence_tests;
mod roster_tests;
mod tabs_tests;
mod tree_tests;
