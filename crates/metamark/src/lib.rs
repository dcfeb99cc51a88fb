//! metamark - Extract mark-selected metadata from C++ declaration trees
//!
//! The binary wires configuration, mark loading, tree loading and extraction
//! together and writes one `.meta` JSON document per source file. The pieces
//! it is built from live here so they can be tested without spawning it.

pub mod config;
pub mod outline;
pub mod output;
pub mod suggest;
