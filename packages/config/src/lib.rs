// ABOUTME: Shared configuration vocabulary for Quadbase binaries
// ABOUTME: Re-exports environment variable names so every crate reads the same keys

pub mod constants;

pub use constants::*;
