//! Infrastructure layer - startup state assembly.

pub mod state;
