//! Shared test utilities for scanpipe integration tests.
//!
//! - `TestHarness` builds an input tree and a pipeline wired to recording
//!   collaborators inside a temporary directory
//! - `VolumeFixture` writes one volume's list files, TIFF images and OCR texts

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
