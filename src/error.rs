//! Error types for board loading, configuration and model validation

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Inconsistencies in the board model. The offending entity is skipped and
/// the check run continues.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelError {
    #[error("part {ref_des}: footprint \"{footprint}\" not found")]
    MissingFootprint { ref_des: String, footprint: String },

    #[error("part {ref_des}: has {found} pins but footprint \"{footprint}\" defines {expected}")]
    PinCountMismatch {
        ref_des: String,
        footprint: String,
        found: usize,
        expected: usize,
    },

    #[error("part {ref_des}: rotation {angle} is not a multiple of 90 degrees")]
    UnsupportedRotation { ref_des: String, angle: i32 },

    #[error("part {ref_des} pin {pin}: net id {net} does not exist")]
    DanglingPinNet { ref_des: String, pin: String, net: usize },

    #[error("net \"{net}\" pin {index}: refers to a missing part or pin")]
    DanglingNetPin { net: String, index: usize },

    #[error("net \"{net}\" connection {connection}: {vertices} vertices for {segments} segments")]
    VertexCountMismatch {
        net: String,
        connection: usize,
        vertices: usize,
        segments: usize,
    },

    #[error("net \"{net}\" connection {connection}: net pin index {pin} out of range")]
    ConnectionPinOutOfRange { net: String, connection: usize, pin: usize },

    #[error("net \"{net}\" connection {connection} segment {segment}: copper layer {layer} out of range")]
    SegmentLayerOutOfRange {
        net: String,
        connection: usize,
        segment: usize,
        layer: usize,
    },

    #[error("net \"{net}\" area {area}: copper layer {layer} out of range")]
    AreaLayerOutOfRange { net: String, area: usize, layer: usize },

    #[error("net \"{net}\" area {area}: contour {contour} has fewer than 3 corners")]
    DegenerateArea { net: String, area: usize, contour: usize },

    #[error("net \"{net}\" connection {connection} vertex {vertex}: via has no pad on any layer")]
    ViaWithoutPad { net: String, connection: usize, vertex: usize },

    #[error("board has {layers} copper layers, at most {max} are supported")]
    TooManyCopperLayers { layers: usize, max: usize },
}

/// Errors reading a board snapshot
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read board file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse board file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors loading or validating a DRC configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Config validation error: {message}")]
    ValidationError { message: String },
}
