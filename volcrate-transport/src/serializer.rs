//! Widget property serializers
//!
//! Each serializer pairs an encoder for server-to-client updates with a
//! policy for values the client sends back.

use ndarray::ArrayD;
use serde_json::Value;
use volcrate_core::{NumericArray, PropertySerializer, Result, TransportConfig, VolumeData};
use volcrate_io::{rgba_to_json, volume_to_json};

use crate::codec::{decode_array, encode_array, ArrayPayload};
use crate::json::json_to_array_typed;

/// Serializer for plain numeric array properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArraySerializer {
    pub config: TransportConfig,
    /// Accept values sent by the client instead of keeping the server value
    pub update_from_client: bool,
}

impl ArraySerializer {
    /// Serializer for a property that only the server changes
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            update_from_client: false,
        }
    }

    /// Serializer for a property the client may also edit
    pub fn with_client_updates(config: TransportConfig) -> Self {
        Self {
            config,
            update_from_client: true,
        }
    }
}

impl PropertySerializer for ArraySerializer {
    type Value = NumericArray;
    type Wire = ArrayPayload;

    fn to_json(&self, value: Option<&NumericArray>) -> Result<Option<ArrayPayload>> {
        value.map(|array| encode_array(array, &self.config)).transpose()
    }

    /// Client echoes of server-owned arrays are ignored and the current value kept
    ///
    /// JSON updates keep the element type of the current value when there is one.
    fn from_json(&self, wire: ArrayPayload, current: Option<&NumericArray>) -> Result<Option<NumericArray>> {
        if !self.update_from_client {
            return Ok(current.cloned());
        }
        match (&wire, current) {
            (ArrayPayload::Json(value), Some(current)) => json_to_array_typed(value, current.dtype()).map(Some),
            _ => decode_array(&wire, &self.config).map(Some),
        }
    }
}

/// Serializer sending a volume as a PNG atlas envelope
#[derive(Debug, Clone, Copy, Default)]
pub struct CubePngSerializer;

impl PropertySerializer for CubePngSerializer {
    type Value = VolumeData;
    type Wire = Value;

    fn to_json(&self, value: Option<&VolumeData>) -> Result<Option<Value>> {
        volume_to_json(value)?.map(|envelope| envelope.to_json()).transpose()
    }

    /// Images are never read back from the client
    fn from_json(&self, _wire: Value, _current: Option<&VolumeData>) -> Result<Option<VolumeData>> {
        Ok(None)
    }
}

/// Serializer sending an RGBA array as a single PNG envelope
#[derive(Debug, Clone, Copy, Default)]
pub struct RgbaPngSerializer;

impl PropertySerializer for RgbaPngSerializer {
    type Value = ArrayD<f64>;
    type Wire = Value;

    fn to_json(&self, value: Option<&ArrayD<f64>>) -> Result<Option<Value>> {
        value
            .map(|rgba| rgba_to_json(rgba.view())?.to_json())
            .transpose()
    }

    /// Images are never read back from the client
    fn from_json(&self, _wire: Value, _current: Option<&ArrayD<f64>>) -> Result<Option<ArrayD<f64>>> {
        Ok(None)
    }
}
