#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use torchmini_tensor as tensor;

#[doc(inline)]
pub use torchmini_kernels as kernels;

#[doc(inline)]
pub use torchmini_tensor_ops as tensor_ops;
