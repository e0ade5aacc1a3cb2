use serde::ser::SerializeStruct;
use serde::Deserialize;

use crate::{allocator::default_allocator, Shape4, Storage, Strides4, Tensor4D};

impl serde::Serialize for Tensor4D {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let data = self.as_slice().map_err(serde::ser::Error::custom)?;
        let mut state = serializer.serialize_struct("Tensor4D", 3)?;
        state.serialize_field("data", data)?;
        state.serialize_field("shape", &self.shape())?;
        state.serialize_field("strides", &self.strides())?;
        state.end()
    }
}

impl<'de> serde::Deserialize<'de> for Tensor4D {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct TensorData {
            data: Vec<f32>,
            shape: Shape4,
            strides: Strides4,
        }

        let TensorData {
            data,
            shape,
            strides,
        } = TensorData::deserialize(deserializer)?;

        let numel = shape.numel().map_err(serde::de::Error::custom)?;
        if numel != data.len() {
            return Err(serde::de::Error::custom(format!(
                "shape needs {numel} elements, got {}",
                data.len()
            )));
        }

        let storage =
            Storage::from_slice(&data, default_allocator()).map_err(serde::de::Error::custom)?;
        let tensor = Tensor4D::new(storage, shape, strides, 0).map_err(serde::de::Error::custom)?;
        if !tensor.is_contiguous() {
            return Err(serde::de::Error::custom("serialized tensors must be contiguous"));
        }
        Ok(tensor)
    }
}
