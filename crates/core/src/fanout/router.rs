use std::collections::BTreeSet;

use crate::ticket::Station;

use super::{OrderLine, RoutingConfig};

/// Resolves which station prepares each order line.
///
/// Precedence: item mapping, then category mapping, then the default station.
#[derive(Debug, Clone)]
pub struct StationRouter {
    config: RoutingConfig,
}

impl StationRouter {
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    pub fn route(&self, line: &OrderLine) -> Station {
        if let Some(station) = self.config.items.get(&line.menu_item_id) {
            return *station;
        }
        line.category
            .as_ref()
            .and_then(|c| self.config.categories.get(c))
            .copied()
            .unwrap_or(self.config.default_station)
    }

    /// Distinct stations involved in `lines`, kitchen first.
    pub fn stations_for(&self, lines: &[OrderLine]) -> Vec<Station> {
        lines
            .iter()
            .map(|line| self.route(line))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl Default for StationRouter {
    fn default() -> Self {
        Self::new(RoutingConfig::default())
    }
}
