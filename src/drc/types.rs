//! DRC data types and structures
//!
//! Contains the rule set, violation kinds, structured locations and the
//! violation record itself.

use serde::{Deserialize, Serialize};

use crate::board::{mil, NetId, PartId};
use crate::error::ConfigError;

/// Clearance rules, all in nanometres
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignRules {
    pub pad_pad: i32,
    pub pad_trace: i32,
    pub hole_copper: i32,
    pub hole_hole: i32,
    pub trace_trace: i32,
    pub copper_copper: i32,
    pub annular_ring_pins: i32,
    pub annular_ring_vias: i32,
    pub board_edge_copper: i32,
    pub board_edge_hole: i32,
    pub trace_width: i32,
}

impl Default for DesignRules {
    fn default() -> Self {
        Self {
            pad_pad: mil(10),
            pad_trace: mil(10),
            hole_copper: mil(15),
            hole_hole: mil(25),
            trace_trace: mil(10),
            copper_copper: mil(10),
            annular_ring_pins: mil(7),
            annular_ring_vias: mil(5),
            board_edge_copper: mil(25),
            board_edge_hole: mil(25),
            trace_width: mil(10),
        }
    }
}

impl DesignRules {
    /// Clearance used to prune part pairs
    pub fn part_clearance(&self) -> i32 {
        self.pad_pad.max(self.hole_copper).max(self.hole_hole)
    }

    /// Clearance used to prune connection pairs of different nets
    pub fn net_clearance(&self) -> i32 {
        self.hole_copper.max(self.hole_hole).max(self.trace_trace)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("pad_pad", self.pad_pad),
            ("pad_trace", self.pad_trace),
            ("hole_copper", self.hole_copper),
            ("hole_hole", self.hole_hole),
            ("trace_trace", self.trace_trace),
            ("copper_copper", self.copper_copper),
            ("annular_ring_pins", self.annular_ring_pins),
            ("annular_ring_vias", self.annular_ring_vias),
            ("board_edge_copper", self.board_edge_copper),
            ("board_edge_hole", self.board_edge_hole),
            ("trace_width", self.trace_width),
        ];
        match fields.iter().find(|(_, v)| *v < 0) {
            Some((name, _)) => Err(ConfigError::ValidationError {
                message: format!("{} must not be negative", name),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrcErrorKind {
    PadPad,
    PadPadhole,
    PadholePadhole,
    SegPad,
    SegPadhole,
    ViaPad,
    ViaPadhole,
    ViaholePad,
    ViaholePadhole,
    SegSeg,
    SegVia,
    SegViahole,
    ViaVia,
    ViaViahole,
    ViaholeViahole,
    TraceWidth,
    RingPad,
    RingVia,
    #[serde(rename = "BOARDEDGE_PAD")]
    BoardEdgePad,
    #[serde(rename = "BOARDEDGE_PADHOLE")]
    BoardEdgePadhole,
    #[serde(rename = "BOARDEDGE_VIA")]
    BoardEdgeVia,
    #[serde(rename = "BOARDEDGE_VIAHOLE")]
    BoardEdgeViahole,
    #[serde(rename = "BOARDEDGE_TRACE")]
    BoardEdgeTrace,
    #[serde(rename = "BOARDEDGE_COPPERAREA")]
    BoardEdgeCopperArea,
    #[serde(rename = "COPPERAREA_COPPERAREA")]
    CopperAreaCopperArea,
    #[serde(rename = "COPPERAREA_INSIDE_COPPERAREA")]
    CopperAreaInsideCopperArea,
    Unrouted,
}

/// Where a violation sits in the board model
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Location {
    Pad { part: PartId, pin: usize },
    Segment { net: NetId, connection: usize, segment: usize },
    Via { net: NetId, connection: usize, vertex: usize },
    AreaSide { net: NetId, area: usize, side: usize },
    AreaCorner { net: NetId, area: usize, corner: usize },
    Area { net: NetId, area: usize },
    Connection { net: NetId, connection: usize },
}

/// One reported violation. Checkers build these with `seq == 0`; the error
/// sink assigns the sequence number on acceptance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrcError {
    pub seq: usize,
    pub kind: DrcErrorKind,
    pub message: String,
    pub name_a: String,
    pub name_b: String,
    pub location_a: Location,
    pub location_b: Location,
    pub point_a: [i32; 2],
    pub point_b: [i32; 2],
    /// Size of the region to show around the violation
    pub extent: i32,
    pub layer: Option<usize>,
    /// Measured clearance, when the violation has one
    pub distance: Option<i32>,
}

impl DrcError {
    /// A violation involving a single entity
    pub fn new(kind: DrcErrorKind, message: String, name: &str, location: Location, point: [i32; 2]) -> Self {
        Self {
            seq: 0,
            kind,
            message,
            name_a: name.to_string(),
            name_b: name.to_string(),
            location_a: location,
            location_b: location,
            point_a: point,
            point_b: point,
            extent: 0,
            layer: None,
            distance: None,
        }
    }

    /// Set the second entity of a two-entity violation
    pub fn with_other(mut self, name: &str, location: Location, point: [i32; 2]) -> Self {
        self.name_b = name.to_string();
        self.location_b = location;
        self.point_b = point;
        self
    }

    pub fn on_layer(mut self, layer: usize) -> Self {
        self.layer = Some(layer);
        self
    }

    pub fn with_distance(mut self, distance: i32) -> Self {
        self.distance = Some(distance);
        self
    }

    pub fn with_extent(mut self, extent: i32) -> Self {
        self.extent = extent;
        self
    }

    /// Line written to the DRC log
    pub fn log_line(&self) -> String {
        format!("{}: {}", self.seq + 1, self.message)
    }
}
