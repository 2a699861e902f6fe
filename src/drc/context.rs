//! Shared read-only state for the checkers of one run

use crate::board::Board;
use crate::config::DrcSettings;

use super::board_edge::BoardEdges;
use super::cache::DrcCache;
use super::types::DesignRules;

pub struct DrcContext<'a> {
    pub board: &'a Board,
    pub rules: &'a DesignRules,
    pub settings: &'a DrcSettings,
    pub cache: &'a DrcCache,
    pub edges: &'a BoardEdges,
}

impl DrcContext<'_> {
    /// Dimension in the configured units, e.g. "7.5 mil"
    pub fn dim(&self, nm: i32) -> String {
        self.settings.units.dimension(nm)
    }

    /// Location suffix, e.g. "x=1000, y=250"
    pub fn at(&self, p: [i32; 2]) -> String {
        let u = self.settings.units;
        format!("x={}, y={}", u.coordinate(p[0]), u.coordinate(p[1]))
    }

    pub fn parallel(&self) -> bool {
        self.settings.parallel
    }
}
