// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain structs and traits describing what the system works
// with: pairs of texts, optionally labeled as equivalent, and
// anything that can turn a text into a sequence of vectors.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits

// A pair of texts with an optional equivalence label
pub mod text_pair;

// Core abstractions (traits) that other layers implement
pub mod traits;
