use thiserror::Error;

/// An error type for kernel operations.
#[derive(Error, Debug, PartialEq)]
pub enum KernelError {
    /// Length mismatch between the two input slices
    #[error("Length mismatch: expected equal length inputs, got {0} and {1}")]
    LengthMismatch(usize, usize),

    /// Length mismatch between the inputs and the output slice
    #[error("Output length mismatch: inputs have {0} elements, output has {1}")]
    OutputLengthMismatch(usize, usize),
}
