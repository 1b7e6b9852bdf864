//! Tensor aliases used between pipeline stages.

/// 1D tensor, one value per class.
pub type Tensor1D = ndarray::Array1<f32>;
/// 2D tensor, `[batch, classes]`.
pub type Tensor2D = ndarray::Array2<f32>;
/// 3D tensor, `[channels, height, width]`.
pub type Tensor3D = ndarray::Array3<f32>;
/// 4D tensor, `[batch, channels, height, width]`.
pub type Tensor4D = ndarray::Array4<f32>;
