// ============================================================
// Layer 5 — Backend Selection
// ============================================================
// The device is chosen once, from TrainConfig::device, and then
// passed by value into every constructor:
//
//   ComputeDevice::Cpu → Autodiff<NdArray>  on NdArrayDevice::Cpu
//   ComputeDevice::Gpu → Autodiff<Wgpu>     on WgpuDevice::default()
//                        (only with the `wgpu` cargo feature)
//
// Work that must run on "whatever backend was picked" implements
// BackendTask; its generic `run` is monomorphised once per backend.

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    tensor::backend::AutodiffBackend,
};

use crate::domain::settings::ComputeDevice;

/// A unit of work that is generic over the Burn backend.
pub trait BackendTask {
    type Output;

    fn run<B: AutodiffBackend>(self, device: B::Device) -> Result<Self::Output>;
}

/// Resolve `device` to a concrete backend and run `task` on it.
pub fn dispatch<T: BackendTask>(device: ComputeDevice, task: T) -> Result<T::Output> {
    match device {
        ComputeDevice::Cpu => {
            tracing::info!("Using NdArray CPU backend");
            task.run::<Autodiff<NdArray>>(NdArrayDevice::Cpu)
        }
        #[cfg(feature = "wgpu")]
        ComputeDevice::Gpu => {
            let device = burn::backend::wgpu::WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            task.run::<Autodiff<burn::backend::Wgpu>>(device)
        }
        #[cfg(not(feature = "wgpu"))]
        ComputeDevice::Gpu => {
            anyhow::bail!("GPU requested but this binary was built without the `wgpu` feature")
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::prelude::*;

    struct SumTask(Vec<f32>);

    impl BackendTask for SumTask {
        type Output = f32;

        fn run<B: AutodiffBackend>(self, device: B::Device) -> Result<f32> {
            let len = self.0.len();
            let t = Tensor::<B, 1>::from_data(TensorData::new(self.0, [len]), &device);
            Ok(t.sum().into_scalar().elem::<f32>())
        }
    }

    #[test]
    fn test_cpu_dispatch_runs_task() {
        let total = dispatch(ComputeDevice::Cpu, SumTask(vec![1.0, 2.0, 3.5])).unwrap();
        assert_eq!(total, 6.5);
    }
}
