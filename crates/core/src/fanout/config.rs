//! Station routing configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ticket::Station;

/// Maps menu items to the station that prepares them.
///
/// ```toml
/// [routing]
/// default_station = "KITCHEN"
///
/// [routing.categories]
/// drinks = "BAR"
///
/// [routing.items]
/// affogato = "BAR"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutingConfig {
    /// Station for items with no explicit or category mapping.
    #[serde(default = "default_station")]
    pub default_station: Station,

    /// Category name -> station.
    #[serde(default)]
    pub categories: HashMap<String, Station>,

    /// Menu item id -> station. Wins over the category mapping.
    #[serde(default)]
    pub items: HashMap<String, Station>,
}

fn default_station() -> Station {
    Station::Kitchen
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_station: default_station(),
            categories: HashMap::new(),
            items: HashMap::new(),
        }
    }
}
