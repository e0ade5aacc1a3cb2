use crate::TensorError;

/// The extents of a rank-4 tensor in `(N, C, H, W)` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shape4 {
    /// Batch extent.
    pub n: usize,
    /// Channel extent.
    pub c: usize,
    /// Height extent.
    pub h: usize,
    /// Width extent.
    pub w: usize,
}

impl Shape4 {
    /// Creates a shape from its four extents.
    pub const fn new(n: usize, c: usize, h: usize, w: usize) -> Self {
        Self { n, c, h, w }
    }

    /// Returns the extents as an array.
    pub const fn to_array(self) -> [usize; 4] {
        [self.n, self.c, self.h, self.w]
    }

    /// Returns the number of elements, the product of the four extents.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::ShapeOverflow`] if the product does not fit in `usize`.
    ///
    /// # Example
    ///
    /// ```
    /// use torchmini_tensor::Shape4;
    ///
    /// assert_eq!(Shape4::new(2, 3, 4, 5).numel().unwrap(), 120);
    /// assert!(Shape4::new(usize::MAX, 2, 1, 1).numel().is_err());
    /// ```
    pub fn numel(&self) -> Result<usize, TensorError> {
        self.to_array()
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
            .ok_or(TensorError::ShapeOverflow {
                shape: self.to_array(),
            })
    }

    /// Returns true if any extent is zero.
    pub fn is_empty(&self) -> bool {
        self.to_array().contains(&0)
    }
}

impl From<[usize; 4]> for Shape4 {
    fn from([n, c, h, w]: [usize; 4]) -> Self {
        Self::new(n, c, h, w)
    }
}

impl From<Shape4> for [usize; 4] {
    fn from(shape: Shape4) -> Self {
        shape.to_array()
    }
}

/// Per-dimension element strides of a rank-4 tensor in `(N, C, H, W)` order.
///
/// Strides count elements, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Strides4 {
    /// Batch stride.
    pub n: usize,
    /// Channel stride.
    pub c: usize,
    /// Height stride.
    pub h: usize,
    /// Width stride.
    pub w: usize,
}

impl Strides4 {
    /// Creates strides from four element counts.
    pub const fn new(n: usize, c: usize, h: usize, w: usize) -> Self {
        Self { n, c, h, w }
    }

    /// Returns the strides as an array.
    pub const fn to_array(self) -> [usize; 4] {
        [self.n, self.c, self.h, self.w]
    }

    /// Computes the row-major (contiguous) strides for `shape`.
    ///
    /// The last axis has stride 1 and every other axis strides over the product of the
    /// extents to its right: `w = 1, h = W, c = H * W, n = C * H * W`.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::ShapeOverflow`] if a stride does not fit in `usize`.
    ///
    /// # Example
    ///
    /// ```
    /// use torchmini_tensor::{Shape4, Strides4};
    ///
    /// let strides = Strides4::contiguous(&Shape4::new(2, 3, 4, 5)).unwrap();
    /// assert_eq!(strides, Strides4::new(60, 20, 5, 1));
    /// ```
    pub fn contiguous(shape: &Shape4) -> Result<Self, TensorError> {
        let dims = shape.to_array();
        let mut strides = [0; 4];
        let mut stride: usize = 1;
        for i in (0..dims.len()).rev() {
            strides[i] = stride;
            if i > 0 {
                stride = stride
                    .checked_mul(dims[i])
                    .ok_or(TensorError::ShapeOverflow { shape: dims })?;
            }
        }
        Ok(strides.into())
    }
}

impl From<[usize; 4]> for Strides4 {
    fn from([n, c, h, w]: [usize; 4]) -> Self {
        Self::new(n, c, h, w)
    }
}

impl From<Strides4> for [usize; 4] {
    fn from(strides: Strides4) -> Self {
        strides.to_array()
    }
}
