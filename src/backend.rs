//! Compute backend used for inference
//!
//! The NdArray CPU backend is the default. Building with `--features cuda`
//! switches every binary to the CUDA backend. No autodiff wrapper is needed
//! since models are only ever run forward.

use burn::tensor::backend::Backend;

#[cfg(feature = "cuda")]
pub type DefaultBackend = burn_cuda::Cuda;

#[cfg(all(not(feature = "cuda"), feature = "ndarray"))]
pub type DefaultBackend = burn::backend::NdArray;

#[cfg(all(not(feature = "cuda"), not(feature = "ndarray")))]
compile_error!("Enable either the `ndarray` or the `cuda` feature");

/// Device type of [`DefaultBackend`]
pub type DefaultDevice = <DefaultBackend as Backend>::Device;

pub fn default_device() -> DefaultDevice {
    DefaultDevice::default()
}

/// Backend name for start-up logs and the health endpoint
pub fn backend_name() -> &'static str {
    if cfg!(feature = "cuda") {
        "CUDA (GPU)"
    } else {
        "NdArray (CPU)"
    }
}
