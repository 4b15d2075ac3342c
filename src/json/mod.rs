//! Purpose: Internal JSON parsing boundary shared by document reads.
//! Exports: `parse` module with decode helpers.
//! Role: Single seam for parser usage so callsites avoid ad hoc decode logic.
//! Invariants: Helper APIs stay small and deterministic (no hidden global state).

pub(crate) mod parse;
