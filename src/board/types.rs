//! Board model: footprints, parts, nets, connections and copper areas
//!
//! Parts and nets live in plain vectors and are referred to by index
//! handles. All coordinates are integer nanometres.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::geometry::{PadShape, Polygon};

pub const NM_PER_MIL: i32 = 25_400;
pub const NM_PER_MM: i32 = 1_000_000;

pub const TOP_LAYER: usize = 0;
pub const BOTTOM_LAYER: usize = 1;
/// Layer masks are `u64`
pub const MAX_COPPER_LAYERS: usize = 64;

/// Convert mils to board units
pub const fn mil(v: i32) -> i32 {
    v * NM_PER_MIL
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetId(pub usize);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    Top,
    Bottom,
}

/// One pad of a padstack
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadDef {
    #[serde(default)]
    pub shape: PadShape,
    #[serde(default)]
    pub width: i32,
    #[serde(default)]
    pub length: i32,
    #[serde(default)]
    pub radius: i32,
}

impl PadDef {
    pub fn round(diameter: i32) -> Self {
        Self { shape: PadShape::Round, width: diameter, length: diameter, radius: 0 }
    }

    pub fn rect(width: i32, length: i32) -> Self {
        Self { shape: PadShape::Rect, width, length, radius: 0 }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Padstack {
    #[serde(default)]
    pub hole_size: i32,
    #[serde(default)]
    pub top: PadDef,
    #[serde(default)]
    pub inner: PadDef,
    #[serde(default)]
    pub bottom: PadDef,
}

impl Padstack {
    /// Plated through-hole with the same pad on every layer
    pub fn through_hole(pad: PadDef, hole_size: i32) -> Self {
        Self { hole_size, top: pad, inner: pad, bottom: pad }
    }

    /// Surface-mount pad on the top side only
    pub fn smt(pad: PadDef) -> Self {
        Self { hole_size: 0, top: pad, ..Default::default() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootprintPin {
    pub name: String,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub angle: i32,
    pub padstack: Padstack,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    pub name: String,
    #[serde(default)]
    pub pins: Vec<FootprintPin>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartPin {
    #[serde(default)]
    pub net: Option<NetId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub ref_des: String,
    pub x: i32,
    pub y: i32,
    /// Clockwise rotation in degrees
    #[serde(default)]
    pub angle: i32,
    #[serde(default)]
    pub side: Side,
    #[serde(default)]
    pub footprint: Option<String>,
    #[serde(default)]
    pub pins: Vec<PartPin>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceLayer {
    /// Unrouted placeholder
    RatLine,
    Copper(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub layer: TraceLayer,
    #[serde(default)]
    pub width: i32,
}

impl Segment {
    pub fn copper(layer: usize, width: i32) -> Self {
        Self { layer: TraceLayer::Copper(layer), width }
    }

    pub fn rat_line() -> Self {
        Self { layer: TraceLayer::RatLine, width: 0 }
    }

    pub fn is_rat_line(&self) -> bool {
        matches!(self.layer, TraceLayer::RatLine)
    }

    pub fn copper_layer(&self) -> Option<usize> {
        match self.layer {
            TraceLayer::Copper(l) => Some(l),
            TraceLayer::RatLine => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Via {
    pub pad_w: i32,
    pub hole_w: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub via: Option<Via>,
}

impl Vertex {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y, via: None }
    }

    pub fn with_via(x: i32, y: i32, pad_w: i32, hole_w: i32) -> Self {
        Self { x, y, via: Some(Via { pad_w, hole_w }) }
    }

    pub fn point(&self) -> [i32; 2] {
        [self.x, self.y]
    }

    pub fn hole_w(&self) -> i32 {
        self.via.map_or(0, |v| v.hole_w)
    }
}

/// A routed (or partially routed) path between two net pins.
/// Segment `i` joins vertex `i` and vertex `i + 1`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Index into the owning net's pin list
    pub start_pin: usize,
    /// Index into the owning net's pin list; `None` for a stub trace
    #[serde(default)]
    pub end_pin: Option<usize>,
    pub vertices: Vec<Vertex>,
    pub segments: Vec<Segment>,
}

impl Connection {
    pub fn has_rat_line(&self) -> bool {
        self.segments.iter().any(Segment::is_rat_line)
    }

    /// Segment endpoints, when the vertex list is consistent
    pub fn segment_points(&self, is: usize) -> Option<([i32; 2], [i32; 2])> {
        Some((self.vertices.get(is)?.point(), self.vertices.get(is + 1)?.point()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetPin {
    pub part: PartId,
    /// Pin index within the part
    pub pin: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub layer: usize,
    pub polygon: Polygon,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Net {
    pub name: String,
    #[serde(default)]
    pub pins: Vec<NetPin>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub areas: Vec<Area>,
}

fn default_copper_layers() -> usize {
    2
}

/// A frozen board snapshot
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    #[serde(default = "default_copper_layers")]
    pub copper_layers: usize,
    #[serde(default)]
    pub footprints: IndexMap<String, Footprint>,
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default)]
    pub nets: Vec<Net>,
    #[serde(default)]
    pub outline: Vec<Polygon>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(default_copper_layers())
    }
}

impl Board {
    pub fn new(copper_layers: usize) -> Self {
        Self {
            copper_layers,
            footprints: IndexMap::new(),
            parts: Vec::new(),
            nets: Vec::new(),
            outline: Vec::new(),
        }
    }

    pub fn add_footprint(&mut self, footprint: Footprint) {
        self.footprints.insert(footprint.name.clone(), footprint);
    }

    pub fn add_part(&mut self, part: Part) -> PartId {
        self.parts.push(part);
        PartId(self.parts.len() - 1)
    }

    pub fn add_net(&mut self, name: &str) -> NetId {
        self.nets.push(Net { name: name.to_string(), ..Default::default() });
        NetId(self.nets.len() - 1)
    }

    /// Place a part from the library with all pins unconnected
    pub fn place(&mut self, ref_des: &str, footprint: &str, x: i32, y: i32, angle: i32, side: Side) -> PartId {
        let pin_count = self.footprints.get(footprint).map_or(0, |f| f.pins.len());
        self.add_part(Part {
            ref_des: ref_des.to_string(),
            x,
            y,
            angle,
            side,
            footprint: Some(footprint.to_string()),
            pins: vec![PartPin::default(); pin_count],
        })
    }

    /// Assign a part pin to a net, returning its index in the net's pin list
    pub fn connect_pin(&mut self, net: NetId, part: PartId, pin: usize) -> Option<usize> {
        let slot = self.parts.get_mut(part.0)?.pins.get_mut(pin)?;
        slot.net = Some(net);
        let n = self.nets.get_mut(net.0)?;
        n.pins.push(NetPin { part, pin });
        Some(n.pins.len() - 1)
    }

    pub fn part(&self, id: PartId) -> Option<&Part> {
        self.parts.get(id.0)
    }

    pub fn net(&self, id: NetId) -> Option<&Net> {
        self.nets.get(id.0)
    }

    pub fn parts(&self) -> impl Iterator<Item = (PartId, &Part)> + '_ {
        self.parts.iter().enumerate().map(|(i, p)| (PartId(i), p))
    }

    pub fn nets(&self) -> impl Iterator<Item = (NetId, &Net)> + '_ {
        self.nets.iter().enumerate().map(|(i, n)| (NetId(i), n))
    }

    pub fn footprint_of(&self, part: &Part) -> Option<&Footprint> {
        part.footprint.as_ref().and_then(|name| self.footprints.get(name))
    }

    /// "REF.PIN" name of a part pin
    pub fn pin_name(&self, part: PartId, pin: usize) -> String {
        let Some(p) = self.part(part) else {
            return format!("?.{}", pin + 1);
        };
        let pin_name = self
            .footprint_of(p)
            .and_then(|f| f.pins.get(pin))
            .map_or_else(|| (pin + 1).to_string(), |fp| fp.name.clone());
        format!("{}.{}", p.ref_des, pin_name)
    }

    pub fn net_name(&self, net: NetId) -> &str {
        self.net(net).map_or("", |n| n.name.as_str())
    }
}
