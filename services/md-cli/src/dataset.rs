//! YAML datasets: a layer description plus its records.
//!
//! ```yaml
//! resource:
//!   name: watertemp
//!   kind: raster
//!   native_crs: EPSG:4326
//!   native_extent: { min_x: 0.0, min_y: 40.0, max_x: 15.0, max_y: 45.0 }
//!   dimensions:
//!     - { name: elevation, attribute: elevation, value_kind: integer }
//! records:
//!   - id: granule_0.tiff
//!     footprint: [0.0, 40.0, 15.0, 45.0]
//!     attributes: { elevation: 0 }
//! ```
//!
//! Attribute values are typed by the dimension that references them; an
//! attribute no dimension uses is kept as text.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use md_common::BoundingBox;
use md_engine::{
    DataSource, DimensionValue, FeatureStore, GranuleIndex, Record, ResourceInfo, ResourceKind,
    ValueKind,
};
use serde::Deserialize;
use tracing::info;

/// A scalar as written in YAML.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl RawValue {
    fn literal(&self) -> String {
        match self {
            RawValue::Integer(v) => v.to_string(),
            RawValue::Float(v) => v.to_string(),
            RawValue::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordSpec {
    #[serde(default)]
    pub id: String,
    /// `[min_x, min_y, max_x, max_y]` in the native CRS.
    pub footprint: [f64; 4],
    #[serde(default)]
    pub attributes: BTreeMap<String, RawValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Dataset {
    pub resource: ResourceInfo,
    #[serde(default)]
    pub records: Vec<RecordSpec>,
}

impl Dataset {
    /// Load a dataset file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset {}", path.display()))?;
        let dataset = Self::from_yaml(&contents)
            .with_context(|| format!("Failed to parse dataset {}", path.display()))?;

        info!(
            layer = %dataset.resource.name,
            records = dataset.records.len(),
            "Loaded dataset"
        );
        Ok(dataset)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Value kind of every attribute referenced by a dimension.
    fn attribute_kinds(&self) -> BTreeMap<&str, ValueKind> {
        let mut kinds = BTreeMap::new();
        for dimension in &self.resource.dimensions {
            kinds.insert(dimension.attribute.as_str(), dimension.value_kind);
            if let Some(end) = &dimension.end_attribute {
                kinds.insert(end.as_str(), dimension.value_kind);
            }
        }
        kinds
    }

    /// Typed records, in file order.
    pub fn records(&self) -> Result<Vec<Record>> {
        let kinds = self.attribute_kinds();
        self.records
            .iter()
            .enumerate()
            .map(|(i, spec)| -> Result<Record> {
                let [min_x, min_y, max_x, max_y] = spec.footprint;
                let mut record = Record::new(&spec.id, BoundingBox::new(min_x, min_y, max_x, max_y));
                for (name, raw) in &spec.attributes {
                    let value = match kinds.get(name.as_str()) {
                        Some(kind) => kind
                            .parse(&raw.literal())
                            .with_context(|| format!("record {} attribute '{}'", i, name))?,
                        None => DimensionValue::Text(raw.literal()),
                    };
                    record = record.with_attribute(name.as_str(), value);
                }
                Ok(record)
            })
            .collect()
    }

    /// Split into the layer description and a data source over its records:
    /// a granule index for raster layers, a feature store for vector ones.
    pub fn into_source(self) -> Result<(ResourceInfo, Box<dyn DataSource>)> {
        let records = self.records()?;
        let source: Box<dyn DataSource> = match self.resource.kind {
            ResourceKind::Raster => {
                let mut index = GranuleIndex::new(&self.resource.name);
                records.into_iter().for_each(|r| index.insert(r));
                Box::new(index)
            }
            ResourceKind::Vector => {
                let mut store = FeatureStore::new(&self.resource.name);
                records.into_iter().for_each(|r| store.insert(r));
                Box::new(store)
            }
        };
        Ok((self.resource, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use md_engine::Predicate;
    use std::io::Write;

    const DATASET: &str = r#"
resource:
  name: depths
  kind: vector
  native_crs: EPSG:4326
  native_extent: { min_x: -180.0, min_y: -90.0, max_x: 180.0, max_y: 90.0 }
  dimensions:
    - name: elevation
      attribute: startElevation
      end_attribute: endElevation
      value_kind: float
    - name: time
      attribute: startTime
      value_kind: time
      default_value: { strategy: maximum }
records:
  - footprint: [-180.0, -90.0, 0.0, 0.0]
    attributes: { startElevation: 1, endElevation: 2.5, startTime: "2012-02-11T00:00:00Z", label: north }
  - id: custom-id
    footprint: [0.0, -90.0, 180.0, 0.0]
    attributes: { startElevation: 2, endElevation: 3, startTime: "2012-02-12" }
"#;

    #[test]
    fn test_attributes_are_typed_by_dimension() {
        let dataset = Dataset::from_yaml(DATASET).unwrap();
        let records = dataset.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].attribute("startElevation"),
            Some(&DimensionValue::Float(1.0))
        );
        assert!(matches!(
            records[0].attribute("startTime"),
            Some(DimensionValue::Time(_))
        ));
        assert_eq!(
            records[0].attribute("label"),
            Some(&DimensionValue::Text("north".to_string()))
        );
    }

    #[test]
    fn test_vector_dataset_becomes_feature_store() {
        let (resource, source) = Dataset::from_yaml(DATASET).unwrap().into_source().unwrap();
        assert_eq!(resource.kind, ResourceKind::Vector);
        let ids: Vec<String> = source
            .query_records(&Predicate::Include)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["depths.0", "custom-id"]);
    }

    #[test]
    fn test_bad_attribute_is_reported() {
        let broken = DATASET.replace("startElevation: 2,", "startElevation: deep,");
        let err = Dataset::from_yaml(&broken).unwrap().records().unwrap_err();
        assert!(format!("{:#}", err).contains("startElevation"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DATASET.as_bytes()).unwrap();
        let dataset = Dataset::load(file.path()).unwrap();
        assert_eq!(dataset.resource.name, "depths");

        let missing = Dataset::load(file.path().with_extension("missing"));
        assert!(format!("{:#}", missing.unwrap_err()).contains("Failed to read dataset"));
    }
}
