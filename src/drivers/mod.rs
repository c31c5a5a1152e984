//! Hardware initialisation and interrupt plumbing.

pub mod hw_init;
