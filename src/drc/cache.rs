//! Per-entity geometry cache
//!
//! Built once per run before any pairwise checker. Holds bounding boxes,
//! hole sizes and copper layer masks for parts, pins and connections, plus
//! the per-layer pad of every pin and via. Entities that fail validation are
//! left out (`None`) and reported as model errors.

use tracing::{debug, warn};

use crate::board::{
    footprint::is_quadrant, pad_draw_info, Board, Connection, Net, NetId, PadInfo, Part, PartId, MAX_COPPER_LAYERS,
};
use crate::error::ModelError;
use crate::geometry::BBox;

use super::types::DesignRules;
use super::via::via_pad_width;
use super::ordered_map;

/// Bit for a copper layer in a layer mask
pub fn layer_bit(layer: usize) -> u64 {
    if layer < MAX_COPPER_LAYERS {
        1u64 << layer
    } else {
        0
    }
}

#[derive(Clone, Debug)]
pub struct PinCache {
    pub bbox: BBox,
    pub center: [i32; 2],
    pub hole_size: i32,
    pub max_r: i32,
    pub layers: u64,
    pub net: Option<NetId>,
    /// Placed pad per copper layer
    pub pads: Vec<Option<PadInfo>>,
}

impl PinCache {
    pub fn has_hole(&self) -> bool {
        self.hole_size > 0
    }

    /// Pad with copper on `layer`
    pub fn copper(&self, layer: usize) -> Option<&PadInfo> {
        self.pads.get(layer)?.as_ref().filter(|p| p.has_pad())
    }
}

#[derive(Clone, Debug)]
pub struct PartCache {
    pub bbox: BBox,
    pub hole_flag: bool,
    pub layers: u64,
    pub pins: Vec<PinCache>,
}

#[derive(Clone, Debug)]
pub struct ViaCache {
    /// Pad diameter per copper layer
    pub widths: Vec<i32>,
    pub max_w: i32,
    /// Smallest non-zero pad diameter
    pub min_w: i32,
    pub hole_w: i32,
}

impl ViaCache {
    pub fn width(&self, layer: usize) -> i32 {
        self.widths.get(layer).copied().unwrap_or(0)
    }
}

#[derive(Clone, Debug)]
pub struct ConnectionCache {
    pub bbox: BBox,
    pub vias_present: bool,
    pub layers: u64,
    /// Via data per vertex
    pub vias: Vec<Option<ViaCache>>,
}

impl ConnectionCache {
    /// Box of one segment grown by its half width and the pad of the via
    /// at its far end
    pub fn segment_box(&self, conn: &Connection, is: usize) -> BBox {
        let Some((a, b)) = conn.segment_points(is) else {
            return BBox::EMPTY;
        };
        let seg_w = conn.segments.get(is).map_or(0, |s| s.width);
        let via_w = self.vias.get(is + 1).and_then(|v| v.as_ref()).map_or(0, |v| v.max_w);
        BBox::of_segment(a, b, seg_w.max(via_w) / 2)
    }
}

#[derive(Clone, Debug, Default)]
pub struct DrcCache {
    pub parts: Vec<Option<PartCache>>,
    pub connections: Vec<Vec<Option<ConnectionCache>>>,
    /// Areas that passed validation
    pub areas: Vec<Vec<bool>>,
}

impl DrcCache {
    pub fn build(board: &Board, rules: &DesignRules, parallel: bool) -> (Self, Vec<ModelError>) {
        if board.copper_layers > MAX_COPPER_LAYERS {
            let err = ModelError::TooManyCopperLayers { layers: board.copper_layers, max: MAX_COPPER_LAYERS };
            warn!(%err, "DRC cache left empty");
            return (Self::empty(), vec![err]);
        }
        let mut errors = Vec::new();

        let parts = ordered_map(parallel, board.parts.len(), |i| build_part(board, PartId(i)));
        let parts = parts
            .into_iter()
            .map(|r| match r {
                Ok(c) => c,
                Err(errs) => {
                    errors.extend(errs);
                    None
                }
            })
            .collect();

        let nets = ordered_map(parallel, board.nets.len(), |i| build_net(board, rules, NetId(i)));
        let mut connections = Vec::with_capacity(nets.len());
        let mut areas = Vec::with_capacity(nets.len());
        for (conns, area_ok, errs) in nets {
            connections.push(conns);
            areas.push(area_ok);
            errors.extend(errs);
        }

        debug!(parts = board.parts.len(), nets = board.nets.len(), malformed = errors.len(), "DRC cache built");
        (Self { parts, connections, areas }, errors)
    }

    /// Cache with no valid entity; every check skips everything
    fn empty() -> Self {
        Self { parts: Vec::new(), connections: Vec::new(), areas: Vec::new() }
    }

    pub fn part(&self, id: PartId) -> Option<&PartCache> {
        self.parts.get(id.0)?.as_ref()
    }

    pub fn connection(&self, net: NetId, connection: usize) -> Option<&ConnectionCache> {
        self.connections.get(net.0)?.get(connection)?.as_ref()
    }

    pub fn area_ok(&self, net: NetId, area: usize) -> bool {
        self.areas.get(net.0).and_then(|a| a.get(area)).copied().unwrap_or(false)
    }
}

fn validate_part(board: &Board, part: &Part) -> Vec<ModelError> {
    let mut errors = Vec::new();
    let Some(name) = &part.footprint else {
        return errors;
    };
    match board.footprints.get(name) {
        None => errors.push(ModelError::MissingFootprint {
            ref_des: part.ref_des.clone(),
            footprint: name.clone(),
        }),
        Some(fp) => {
            if fp.pins.len() != part.pins.len() {
                errors.push(ModelError::PinCountMismatch {
                    ref_des: part.ref_des.clone(),
                    footprint: name.clone(),
                    found: part.pins.len(),
                    expected: fp.pins.len(),
                });
            }
            if let Some(bad) = fp.pins.iter().find(|p| !is_quadrant(p.angle)) {
                errors.push(ModelError::UnsupportedRotation {
                    ref_des: format!("{}.{}", part.ref_des, bad.name),
                    angle: bad.angle,
                });
            }
        }
    }
    if !is_quadrant(part.angle) {
        errors.push(ModelError::UnsupportedRotation { ref_des: part.ref_des.clone(), angle: part.angle });
    }
    for (ip, pin) in part.pins.iter().enumerate() {
        if let Some(net) = pin.net.filter(|n| board.net(*n).is_none()) {
            errors.push(ModelError::DanglingPinNet {
                ref_des: part.ref_des.clone(),
                pin: (ip + 1).to_string(),
                net: net.0,
            });
        }
    }
    errors
}

fn build_part(board: &Board, id: PartId) -> Result<Option<PartCache>, Vec<ModelError>> {
    let Some(part) = board.part(id) else {
        return Ok(None);
    };
    let errors = validate_part(board, part);
    if !errors.is_empty() {
        return Err(errors);
    }
    let Some(fp) = board.footprint_of(part) else {
        return Ok(None);
    };

    let mut cache = PartCache { bbox: BBox::EMPTY, hole_flag: false, layers: 0, pins: Vec::with_capacity(fp.pins.len()) };
    for ip in 0..fp.pins.len() {
        let pads: Vec<Option<PadInfo>> = (0..board.copper_layers).map(|il| pad_draw_info(board, id, ip, il)).collect();
        let mut pin = PinCache {
            bbox: BBox::EMPTY,
            center: [part.x, part.y],
            hole_size: 0,
            max_r: 0,
            layers: 0,
            net: part.pins.get(ip).and_then(|p| p.net),
            pads: Vec::new(),
        };
        for (il, pad) in pads.iter().enumerate() {
            let Some(pad) = pad else { continue };
            let [x, y] = pad.center();
            pin.center = [x, y];
            if pad.has_hole() {
                pin.bbox.include(BBox::around(x, y, pad.hole / 2, pad.hole / 2));
                pin.hole_size = pad.hole;
                pin.max_r = pin.max_r.max(pad.hole / 2);
                cache.hole_flag = true;
            }
            if pad.has_pad() {
                let (hx, hy) = pad.geom.half_extents();
                pin.bbox.include(BBox::around(x, y, hx, hy));
                pin.layers |= layer_bit(il);
                pin.max_r = pin.max_r.max(pad.geom.radius());
            }
        }
        pin.pads = pads;
        cache.bbox.include(pin.bbox);
        cache.layers |= pin.layers;
        cache.pins.push(pin);
    }
    Ok(Some(cache))
}

type NetCaches = (Vec<Option<ConnectionCache>>, Vec<bool>, Vec<ModelError>);

fn validate_connection(board: &Board, net: &Net, ic: usize, conn: &Connection) -> Vec<ModelError> {
    let mut errors = Vec::new();
    if conn.vertices.len() != conn.segments.len() + 1 {
        errors.push(ModelError::VertexCountMismatch {
            net: net.name.clone(),
            connection: ic,
            vertices: conn.vertices.len(),
            segments: conn.segments.len(),
        });
    }
    for pin in std::iter::once(conn.start_pin).chain(conn.end_pin) {
        if pin >= net.pins.len() {
            errors.push(ModelError::ConnectionPinOutOfRange { net: net.name.clone(), connection: ic, pin });
        }
    }
    for (is, seg) in conn.segments.iter().enumerate() {
        if let Some(layer) = seg.copper_layer().filter(|l| *l >= board.copper_layers) {
            errors.push(ModelError::SegmentLayerOutOfRange {
                net: net.name.clone(),
                connection: ic,
                segment: is,
                layer,
            });
        }
    }
    errors
}

fn build_net(board: &Board, rules: &DesignRules, id: NetId) -> NetCaches {
    let mut errors = Vec::new();
    let Some(net) = board.net(id) else {
        return (Vec::new(), Vec::new(), errors);
    };

    for (index, np) in net.pins.iter().enumerate() {
        let exists = board.part(np.part).is_some_and(|p| np.pin < p.pins.len());
        if !exists {
            errors.push(ModelError::DanglingNetPin { net: net.name.clone(), index });
        }
    }

    let mut conns = Vec::with_capacity(net.connections.len());
    for (ic, conn) in net.connections.iter().enumerate() {
        let errs = validate_connection(board, net, ic, conn);
        if !errs.is_empty() {
            errors.extend(errs);
            conns.push(None);
            continue;
        }

        let mut cache = ConnectionCache { bbox: BBox::EMPTY, vias_present: false, layers: 0, vias: Vec::new() };
        for (iv, vtx) in conn.vertices.iter().enumerate() {
            if vtx.via.is_none() {
                cache.vias.push(None);
                continue;
            }
            let widths: Vec<i32> = (0..board.copper_layers).map(|il| via_pad_width(board, rules, id, ic, iv, il)).collect();
            let max_w = widths.iter().copied().max().unwrap_or(0);
            if max_w <= 0 {
                errors.push(ModelError::ViaWithoutPad { net: net.name.clone(), connection: ic, vertex: iv });
                cache.vias.push(None);
                continue;
            }
            let min_w = widths.iter().copied().filter(|w| *w > 0).min().unwrap_or(max_w);
            for (il, w) in widths.iter().enumerate() {
                if *w > 0 {
                    cache.layers |= layer_bit(il);
                }
            }
            cache.bbox.include(BBox::around(vtx.x, vtx.y, max_w / 2, max_w / 2));
            cache.vias_present = true;
            cache.vias.push(Some(ViaCache { widths, max_w, min_w, hole_w: vtx.hole_w() }));
        }
        for (is, seg) in conn.segments.iter().enumerate() {
            if let Some((a, b)) = conn.segment_points(is) {
                cache.bbox.include(BBox::of_segment(a, b, seg.width / 2));
            }
            if let Some(layer) = seg.copper_layer() {
                cache.layers |= layer_bit(layer);
            }
        }
        conns.push(Some(cache));
    }

    let mut area_ok = Vec::with_capacity(net.areas.len());
    for (ia, area) in net.areas.iter().enumerate() {
        let mut ok = true;
        if area.layer >= board.copper_layers {
            errors.push(ModelError::AreaLayerOutOfRange { net: net.name.clone(), area: ia, layer: area.layer });
            ok = false;
        }
        if let Some(contour) = area.polygon.contours.iter().position(|c| c.len() < 3) {
            errors.push(ModelError::DegenerateArea { net: net.name.clone(), area: ia, contour });
            ok = false;
        }
        if area.polygon.contours.is_empty() {
            ok = false;
        }
        area_ok.push(ok);
    }

    (conns, area_ok, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{mil, Footprint, FootprintPin, PadDef, Padstack, Segment, Side, Vertex};

    fn board() -> Board {
        let mut board = Board::new(2);
        board.add_footprint(Footprint {
            name: "CONN2".to_string(),
            pins: vec![
                FootprintPin {
                    name: "1".to_string(),
                    x: 0,
                    y: 0,
                    angle: 0,
                    padstack: Padstack::through_hole(PadDef::round(mil(60)), mil(35)),
                },
                FootprintPin {
                    name: "2".to_string(),
                    x: mil(100),
                    y: 0,
                    angle: 90,
                    padstack: Padstack::smt(PadDef::rect(mil(20), mil(80))),
                },
            ],
        });
        board
    }

    #[test]
    fn test_part_bbox_contains_pins() {
        let mut b = board();
        b.place("J1", "CONN2", mil(500), mil(500), 180, Side::Top);
        b.place("J2", "CONN2", mil(900), mil(500), 90, Side::Bottom);
        let (cache, errors) = DrcCache::build(&b, &DesignRules::default(), false);
        assert!(errors.is_empty(), "unexpected model errors: {:?}", errors);
        for part in cache.parts.iter().flatten() {
            for pin in &part.pins {
                assert!(part.bbox.contains(&pin.bbox), "pin box {:?} outside part box {:?}", pin.bbox, part.bbox);
            }
            assert!(part.hole_flag);
        }
    }

    #[test]
    fn test_layer_masks() {
        let mut b = board();
        b.place("J1", "CONN2", 0, 0, 0, Side::Top);
        b.place("J2", "CONN2", 0, 0, 0, Side::Bottom);
        let (cache, _) = DrcCache::build(&b, &DesignRules::default(), true);
        let j1 = cache.part(PartId(0)).unwrap();
        assert_eq!(j1.pins[0].layers, 0b11);
        assert_eq!(j1.pins[1].layers, 0b01, "smt pad on top only");
        let j2 = cache.part(PartId(1)).unwrap();
        assert_eq!(j2.pins[1].layers, 0b10, "bottom part smt pad on bottom");
    }

    #[test]
    fn test_pin_radius_reaches_pad_corner() {
        let mut b = board();
        b.place("J1", "CONN2", 0, 0, 0, Side::Top);
        let (cache, _) = DrcCache::build(&b, &DesignRules::default(), false);
        let j1 = cache.part(PartId(0)).unwrap();
        assert_eq!(j1.pins[0].max_r, mil(30), "round pad radius");
        // 20 x 80 mil rect: corner at hypot(10, 40) mil
        let corner = crate::geometry::distance::round_nm((mil(10) as f64).hypot(mil(40) as f64));
        assert_eq!(j1.pins[1].max_r, corner);
        assert!(j1.pins[1].max_r > mil(41), "radius {} stops at the half extent", j1.pins[1].max_r);
    }

    #[test]
    fn test_too_many_copper_layers() {
        let mut b = board();
        b.copper_layers = MAX_COPPER_LAYERS + 1;
        b.place("J1", "CONN2", 0, 0, 0, Side::Top);
        let (cache, errors) = DrcCache::build(&b, &DesignRules::default(), false);
        assert_eq!(
            errors,
            vec![ModelError::TooManyCopperLayers { layers: 65, max: 64 }],
            "board past the mask width must be rejected"
        );
        assert!(cache.part(PartId(0)).is_none());

        b.copper_layers = MAX_COPPER_LAYERS;
        let (cache, errors) = DrcCache::build(&b, &DesignRules::default(), false);
        assert!(errors.is_empty(), "errors: {:?}", errors);
        assert!(cache.part(PartId(0)).is_some());
    }

    #[test]
    fn test_bad_parts_are_skipped() {
        let mut b = board();
        b.place("J1", "MISSING", 0, 0, 0, Side::Top);
        b.place("J2", "CONN2", 0, 0, 45, Side::Top);
        let (cache, errors) = DrcCache::build(&b, &DesignRules::default(), false);
        assert!(cache.part(PartId(0)).is_none());
        assert!(cache.part(PartId(1)).is_none());
        assert_eq!(errors.len(), 2, "errors: {:?}", errors);
    }

    #[test]
    fn test_connection_cache() {
        let mut b = board();
        let net = b.add_net("N1");
        b.nets[0].pins.push(crate::board::NetPin { part: PartId(0), pin: 0 });
        b.nets[0].connections.push(Connection {
            start_pin: 0,
            end_pin: None,
            vertices: vec![Vertex::new(0, 0), Vertex::with_via(1000, 0, 400, 200), Vertex::new(1000, 1000)],
            segments: vec![Segment::copper(0, 100), Segment::copper(1, 100)],
        });
        b.nets[0].connections.push(Connection {
            start_pin: 0,
            end_pin: None,
            vertices: vec![Vertex::new(0, 0)],
            segments: vec![Segment::copper(0, 100)],
        });
        let (cache, errors) = DrcCache::build(&b, &DesignRules::default(), false);
        let c = cache.connection(net, 0).unwrap();
        assert!(c.vias_present);
        assert_eq!(c.layers, 0b11);
        assert_eq!(c.bbox, BBox::new(-50, -200, 1200, 1050));
        assert_eq!(c.vias[1].as_ref().map(|v| v.min_w), Some(400));
        assert!(cache.connection(net, 1).is_none());
        assert!(
            errors.iter().any(|e| matches!(e, ModelError::VertexCountMismatch { connection: 1, .. })),
            "errors: {:?}",
            errors
        );
    }
}
