//! The Brick store exposed as a callable tool.

use crate::brick::{BrickStore, RdfRequest};
use brickwise_core::{Result, Tool};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub const RDF_TOOLKIT: &str = "rdf_toolkit";

/// Unified facade for querying a building's Brick graph.
pub struct RdfToolkit {
    store: Arc<BrickStore>,
}

impl RdfToolkit {
    pub fn new(store: Arc<BrickStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for RdfToolkit {
    fn name(&self) -> &str {
        RDF_TOOLKIT
    }

    fn description(&self) -> &str {
        "Query a building's Brick ontology graph. Operations: \
         'area' (floor area in m2), 'zones' (zones and parent building), \
         'temperature_sensors_uuid' (temperature sensors with UUIDs and locations), \
         'generic_sensors' (all sensors), 'meters' (meters and what they feed). \
         Use the building identifier already present in the conversation; never invent one."
    }

    fn parameters_schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "building_name": {
                    "type": "string",
                    "description": "Building short code, e.g. 'BCGW'"
                },
                "operation": {
                    "type": "string",
                    "enum": ["area", "zones", "temperature_sensors_uuid", "generic_sensors", "meters"]
                },
                "location_filter": {
                    "type": "string",
                    "description": "Optional substring filter on sensor/meter location"
                },
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": 1000
                }
            },
            "required": ["building_name", "operation"]
        }))
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        // Malformed arguments stay in-band so the next decision node
        // can observe them and re-route.
        let request: RdfRequest = match serde_json::from_value(args) {
            Ok(request) => request,
            Err(e) => return Ok(json!({ "error": format!("invalid rdf_toolkit arguments: {e}") })),
        };
        Ok(self.store.query(&request).await)
    }
}
