//! Shared fixtures for hearth-runtime integration tests.

// Each test binary uses a different subset.
#![allow(dead_code)]

pub mod observer;
pub mod vcs;
