// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits that describe the problem:
// which device to train on, which noise the sampler draws,
// which optimiser updates the weights, and where images come from.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits

// Run-time choices (device, noise distribution, optimiser)
pub mod settings;

// Core abstractions (traits) that other layers implement
pub mod traits;
