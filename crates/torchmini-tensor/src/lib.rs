#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! `torchmini-tensor` is the storage and view layer of a small CPU tensor library. A single
//! reference-counted `f32` allocation can back many rank-4 views without copying, and the
//! allocator behind it is pluggable.
//!
//! # Architecture
//!
//! - **TensorAllocator**: trait-based allocation, shared as [`SharedAllocator`] handles
//! - **TensorOptions**: device tag plus allocator handle, passed to factories
//! - **Storage**: one shared buffer; clones share, the last drop frees
//! - **Tensor4D**: shape, strides and offset over a storage
//!
//! # Quick Start
//!
//! ```rust
//! use torchmini_tensor::{Shape4, Strides4, Tensor4D, TensorOptions};
//!
//! // allocate a contiguous 1x2x2x2 tensor and fill it
//! let mut t = Tensor4D::contiguous(Shape4::new(1, 2, 2, 2), &TensorOptions::default()).unwrap();
//! t.fill(1.0).unwrap();
//!
//! // view the second channel without copying
//! let channel = Tensor4D::new(
//!     t.storage().clone(),
//!     Shape4::new(1, 1, 2, 2),
//!     Strides4::new(4, 4, 2, 1),
//!     4,
//! )
//! .unwrap();
//! assert!(channel.storage().ptr_eq(t.storage()));
//! assert_eq!(channel.as_slice().unwrap(), &[1.0; 4]);
//! ```

/// Allocator module containing memory management utilities.
///
/// This module provides the [`TensorAllocator`] trait, the system-backed [`CpuAllocator`]
/// and the counting [`allocator::TrackingAllocator`].
pub mod allocator;

/// Device module containing device abstraction.
pub mod device;

/// Options module containing the allocation settings passed to tensor factories.
pub mod options;

/// Serde module for JSON/other format serialization and deserialization.
#[cfg(feature = "serde")]
pub mod serde;

/// Shape module containing the rank-4 shape and stride types.
pub mod shape;

/// Storage module containing the reference-counted buffer.
pub mod storage;

/// Tensor module containing the 4D view and error types.
pub mod tensor;

pub use crate::allocator::{
    default_allocator, CpuAllocator, SharedAllocator, TensorAllocator, TensorAllocatorError,
};
pub use crate::device::Device;
pub use crate::options::TensorOptions;
pub use crate::shape::{Shape4, Strides4};
pub use crate::storage::Storage;
pub use crate::tensor::{Tensor4D, TensorError};
