//! Purpose: Shared core library crate used by the `itemized` CLI and tests.
//! Exports: `core` (schema layouts, blob decoding, script rendering, errors).
//! Role: Internal library backing the binary; not yet a stable public SDK.
//! Invariants: Treat the crate API as internal until a dedicated library release.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod core;
