use thiserror::Error;
use torchmini_kernels::KernelError;
use torchmini_tensor::TensorError;

/// An error type for tensor operations.
#[derive(Error, Debug, PartialEq)]
pub enum TensorOpsError {
    /// Shape mismatch
    #[error("Shape mismatch: {0:?} != {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// An operand is not laid out contiguously.
    #[error("Tensor is not contiguous: strides {0:?} for shape {1:?}")]
    NotContiguous(Vec<usize>, Vec<usize>),

    /// The output shares storage with an input and overlaps it at a different offset.
    #[error("Output at storage offset {1} partially overlaps an input at storage offset {0}")]
    PartialOverlap(usize, usize),

    /// Tensor error
    #[error("Error with the tensor: {0}")]
    TensorError(#[from] TensorError),

    /// Kernel error
    #[error(transparent)]
    KernelError(#[from] KernelError),
}
