//! Integration test modules

mod completion;
mod conversation;
mod rendering;
