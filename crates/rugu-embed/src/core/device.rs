use candle_core::Device;

#[cfg(feature = "clap")]
use clap::ValueEnum;

use crate::Result;

#[cfg(all(feature = "metal", feature = "cuda"))]
compile_error!("feature \"metal\" and feature \"cuda\" cannot be enabled at the same time");

/// Where model weights live and inference runs.
///
/// Accelerators only work when the crate is built with the matching feature. Otherwise
/// [`DeviceKind::device`] returns the candle "not compiled with ... support" error.
#[cfg_attr(feature = "clap", derive(ValueEnum))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    #[default]
    Cpu,
    Cuda,
    Metal,
}

impl DeviceKind {
    pub fn device(&self) -> Result<Device> {
        let device = match self {
            DeviceKind::Cpu => Device::Cpu,
            DeviceKind::Cuda => Device::new_cuda(0)?,
            DeviceKind::Metal => Device::new_metal(0)?,
        };
        Ok(device)
    }
}

pub fn print_device_info(device: &Device) {
    if device.is_cpu() {
        tracing::info!("Using CPU")
    }
    if device.is_cuda() {
        tracing::info!("Using CUDA")
    }
    if device.is_metal() {
        tracing::info!("Using Metal")
    }
}
