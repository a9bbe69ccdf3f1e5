// ============================================================
// Layer 5 — Machine Learning
// ============================================================
// Everything that touches Burn tensors with learnable weights:
//
//   model       → Encoder / Decoder / BetaVae modules
//   sampler     → reparameterisation trick and noise choice
//   loss        → summed BCE + β-weighted KL
//   backend     → ComputeDevice → concrete Burn backend
//   trainer     → epoch loop, optimiser, checkpoint
//   inferencer  → reload + reconstruct / traverse
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

pub mod backend;
pub mod inferencer;
pub mod loss;
pub mod model;
pub mod sampler;
pub mod trainer;
