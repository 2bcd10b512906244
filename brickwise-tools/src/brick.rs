//! Brick graph facade: per-building Turtle files exposed through five
//! fixed operations with stable result shapes.
//!
//! Every failure — missing file, parse error, unknown operation — comes
//! back as an `{"error": "..."}` payload. The caller is a decision node
//! feeding results to a model, so errors must stay in-band: the next
//! node observes the payload and routes, nothing escapes as Err.

use crate::turtle::{self, Term, Triple, RDF_TYPE};
use brickwise_core::{BrickError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

const BRICK: &str = "https://brickschema.org/schema/Brick#";

/// One of the five supported graph operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RdfOperation {
    Area,
    Zones,
    TemperatureSensorsUuid,
    GenericSensors,
    Meters,
}

/// Request constructed by decision nodes, never by the user directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RdfRequest {
    pub building_name: String,
    pub operation: RdfOperation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// An in-memory Brick graph for one building.
pub struct BrickGraph {
    triples: Vec<Triple>,
}

impl BrickGraph {
    pub fn parse(turtle: &str) -> Result<Self> {
        Ok(Self { triples: turtle::parse(turtle)? })
    }

    fn brick(local: &str) -> String {
        format!("{BRICK}{local}")
    }

    /// Objects of `(subject, predicate, ?)`.
    fn objects<'a>(&'a self, subject: &'a Term, predicate: &'a str) -> impl Iterator<Item = &'a Term> {
        self.triples
            .iter()
            .filter(move |t| t.subject == *subject && t.predicate == predicate)
            .map(|t| &t.object)
    }

    /// Subjects typed with a class whose IRI ends with `class_suffix`,
    /// paired with that class.
    fn subjects_of_class_suffix<'a>(
        &'a self,
        class_suffix: &'a str,
    ) -> impl Iterator<Item = (&'a Term, &'a str)> {
        self.triples.iter().filter_map(move |t| {
            if t.predicate != RDF_TYPE {
                return None;
            }
            match &t.object {
                Term::Iri(class) if class.ends_with(class_suffix) => {
                    Some((&t.subject, class.as_str()))
                }
                _ => None,
            }
        })
    }

    /// Floor area, read through the `hasArea -> [ value ]` blank node.
    fn area(&self, building: &str) -> Value {
        let has_area = Self::brick("hasArea");
        let value_pred = Self::brick("value");

        let area = self
            .triples
            .iter()
            .find(|t| t.predicate == has_area)
            .and_then(|t| self.objects(&t.object, &value_pred).next())
            .and_then(|v| v.as_str().parse::<f64>().ok());

        json!({ "building": building, "area_m2": area })
    }

    fn zones(&self, building: &str, limit: Option<usize>) -> Value {
        let zone_class = Self::brick("Zone");
        let is_part_of = Self::brick("isPartOf");

        let mut zones: Vec<Value> = self
            .triples
            .iter()
            .filter(|t| t.predicate == RDF_TYPE && t.object == Term::Iri(zone_class.clone()))
            .flat_map(|t| {
                self.objects(&t.subject, &is_part_of)
                    .map(move |parent| json!({ "zone": t.subject.as_str(), "building": parent.as_str() }))
            })
            .collect();
        truncate(&mut zones, limit);

        json!({ "building": building, "zones": zones })
    }

    fn sensors(
        &self,
        building: &str,
        class_suffix: &str,
        location_filter: Option<&str>,
        limit: Option<usize>,
    ) -> Value {
        let has_uuid = Self::brick("hasUUID");
        let is_point_of = Self::brick("isPointOf");

        let mut sensors: Vec<Value> = self
            .subjects_of_class_suffix(class_suffix)
            .filter_map(|(sensor, class)| {
                let uuid = self.objects(sensor, &has_uuid).next()?;
                let location = self.objects(sensor, &is_point_of).next()?;
                Some(json!({
                    "sensor": sensor.as_str(),
                    "uuid": uuid.as_str(),
                    "class": class,
                    "location": location.as_str(),
                }))
            })
            .filter(|row| matches_filter(row, "location", location_filter))
            .collect();
        truncate(&mut sensors, limit);

        json!({ "building": building, "sensors": sensors })
    }

    fn meters(&self, building: &str, location_filter: Option<&str>, limit: Option<usize>) -> Value {
        let has_uuid = Self::brick("hasUUID");
        let feeds = Self::brick("feeds");

        let mut meters: Vec<Value> = self
            .subjects_of_class_suffix("Meter")
            .filter_map(|(meter, class)| {
                let uuid = self.objects(meter, &has_uuid).next()?;
                let fed = self.objects(meter, &feeds).next()?;
                Some(json!({
                    "meter": meter.as_str(),
                    "uuid": uuid.as_str(),
                    "class": class,
                    "feeds": fed.as_str(),
                }))
            })
            .filter(|row| matches_filter(row, "feeds", location_filter))
            .collect();
        truncate(&mut meters, limit);

        json!({ "building": building, "meters": meters })
    }

    /// Execute one operation against this graph.
    pub fn execute(&self, request: &RdfRequest) -> Value {
        let building = request.building_name.as_str();
        let filter = request.location_filter.as_deref();
        let limit = request.limit;

        match request.operation {
            RdfOperation::Area => self.area(building),
            RdfOperation::Zones => self.zones(building, limit),
            RdfOperation::TemperatureSensorsUuid => {
                self.sensors(building, "Temperature_Sensor", filter, limit)
            }
            RdfOperation::GenericSensors => self.sensors(building, "Sensor", filter, limit),
            RdfOperation::Meters => self.meters(building, filter, limit),
        }
    }
}

fn matches_filter(row: &Value, key: &str, filter: Option<&str>) -> bool {
    match filter {
        None => true,
        Some(needle) => row
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false),
    }
}

fn truncate(rows: &mut Vec<Value>, limit: Option<usize>) {
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
}

/// Per-building graph cache over a directory of `bui_<CODE>.ttl` files.
///
/// Graphs load lazily on first use and stay cached for the process
/// lifetime. Repeated identical requests against unchanged files return
/// identical results.
pub struct BrickStore {
    ttl_dir: PathBuf,
    graphs: RwLock<HashMap<String, Arc<BrickGraph>>>,
}

impl BrickStore {
    pub fn new(ttl_dir: impl Into<PathBuf>) -> Self {
        Self { ttl_dir: ttl_dir.into(), graphs: RwLock::new(HashMap::new()) }
    }

    fn building_path(&self, building_name: &str) -> PathBuf {
        self.ttl_dir.join(format!("bui_{}.ttl", building_name.to_uppercase()))
    }

    async fn load(&self, building_name: &str) -> Result<Arc<BrickGraph>> {
        let key = building_name.to_uppercase();
        {
            let graphs = self.graphs.read().await;
            if let Some(graph) = graphs.get(&key) {
                return Ok(graph.clone());
            }
        }

        let path = self.building_path(building_name);
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            BrickError::Tool(format!("TTL file not found: {}: {e}", path.display()))
        })?;
        let graph = Arc::new(BrickGraph::parse(&content)?);

        let mut graphs = self.graphs.write().await;
        Ok(graphs.entry(key).or_insert(graph).clone())
    }

    /// Run one operation; all failures come back as `{"error": ...}`.
    pub async fn query(&self, request: &RdfRequest) -> Value {
        tracing::debug!(
            building = %request.building_name,
            operation = ?request.operation,
            "querying brick graph"
        );
        match self.load(&request.building_name).await {
            Ok(graph) => graph.execute(request),
            Err(e) => json!({ "error": e.to_string() }),
        }
    }

    pub fn ttl_dir(&self) -> &Path {
        &self.ttl_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUILDING: &str = r#"
@prefix brick: <https://brickschema.org/schema/Brick#> .
@prefix bldg: <urn:Building#> .

bldg:BCGW_Building a brick:Building ;
    brick:hasArea [ brick:value "12345.0" ; brick:hasUnit brick:M2 ] .

bldg:Z01 a brick:Zone ;
    brick:isPartOf bldg:BCGW_Building .
bldg:Z02 a brick:Zone ;
    brick:isPartOf bldg:BCGW_Building .

bldg:Temp_S1 a brick:Zone_Air_Temperature_Sensor ;
    brick:hasUUID "550e8400-e29b-41d4-a716-446655440000" ;
    brick:isPointOf bldg:Z01 .
bldg:Hum_S1 a brick:Humidity_Sensor ;
    brick:hasUUID "650e8400-e29b-41d4-a716-446655440001" ;
    brick:isPointOf bldg:Z02 .

bldg:Elec_M1 a brick:Electric_Meter ;
    brick:hasUUID "750e8400-e29b-41d4-a716-446655440002" ;
    brick:feeds bldg:Panel_A .
"#;

    fn graph() -> BrickGraph {
        BrickGraph::parse(BUILDING).unwrap()
    }

    fn request(operation: RdfOperation) -> RdfRequest {
        RdfRequest {
            building_name: "BCGW".to_string(),
            operation,
            location_filter: None,
            limit: None,
        }
    }

    #[test]
    fn test_area() {
        let result = graph().execute(&request(RdfOperation::Area));
        assert_eq!(result["building"], "BCGW");
        assert_eq!(result["area_m2"], json!(12345.0));
    }

    #[test]
    fn test_area_absent_is_null() {
        let empty = BrickGraph::parse("@prefix brick: <urn:b#> .\n").unwrap();
        let result = empty.execute(&request(RdfOperation::Area));
        assert_eq!(result["area_m2"], Value::Null);
    }

    #[test]
    fn test_zones() {
        let result = graph().execute(&request(RdfOperation::Zones));
        let zones = result["zones"].as_array().unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0]["building"], "urn:Building#BCGW_Building");
    }

    #[test]
    fn test_temperature_sensors_excludes_other_classes() {
        let result = graph().execute(&request(RdfOperation::TemperatureSensorsUuid));
        let sensors = result["sensors"].as_array().unwrap();
        assert_eq!(sensors.len(), 1);
        assert_eq!(sensors[0]["uuid"], "550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(sensors[0]["location"], "urn:Building#Z01");
    }

    #[test]
    fn test_generic_sensors_include_all_sensor_classes() {
        let result = graph().execute(&request(RdfOperation::GenericSensors));
        assert_eq!(result["sensors"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_meters() {
        let result = graph().execute(&request(RdfOperation::Meters));
        let meters = result["meters"].as_array().unwrap();
        assert_eq!(meters.len(), 1);
        assert_eq!(meters[0]["feeds"], "urn:Building#Panel_A");
    }

    #[test]
    fn test_location_filter_and_limit() {
        let mut req = request(RdfOperation::GenericSensors);
        req.location_filter = Some("z01".to_string());
        let result = graph().execute(&req);
        assert_eq!(result["sensors"].as_array().unwrap().len(), 1);

        let mut req = request(RdfOperation::Zones);
        req.limit = Some(1);
        let result = graph().execute(&req);
        assert_eq!(result["zones"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_store_missing_file_returns_error_payload() {
        let dir = tempfile::tempdir().unwrap();
        let store = BrickStore::new(dir.path());

        let result = store.query(&request(RdfOperation::Area)).await;
        assert!(result["error"].as_str().unwrap().contains("TTL file not found"));
    }

    #[tokio::test]
    async fn test_store_caches_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bui_BCGW.ttl"), BUILDING).unwrap();
        let store = BrickStore::new(dir.path());

        let first = store.query(&request(RdfOperation::Zones)).await;
        let second = store.query(&request(RdfOperation::Zones)).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_store_lowercase_building_resolves() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bui_BCGW.ttl"), BUILDING).unwrap();
        let store = BrickStore::new(dir.path());

        let mut req = request(RdfOperation::Area);
        req.building_name = "bcgw".to_string();
        let result = store.query(&req).await;
        assert_eq!(result["area_m2"], json!(12345.0));
    }
}
