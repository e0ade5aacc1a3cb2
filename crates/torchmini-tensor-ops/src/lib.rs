#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for tensor operations.
///
/// Defines [`TensorOpsError`] for handling failures during tensor computations.
pub mod error;

/// Elementwise operations over [`torchmini_tensor::Tensor4D`] views.
///
/// Operations run the flat-slice kernels of `torchmini-kernels` over contiguous views and
/// reject non-contiguous operands.
pub mod ops;

pub use error::TensorOpsError;
