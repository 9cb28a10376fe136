//! Structured activity logging (JSONL, append-only, rotated by size).

pub mod jsonl;
