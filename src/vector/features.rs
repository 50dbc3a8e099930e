//! GeoJSON output in WGS84

use std::fs;
use std::path::Path;

use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, Value};
use log::info;

use crate::coordinate::CoordinateTransformer;
use crate::errors::{TreeKitError, TreeKitResult};

use super::dataset::{FieldValue, VectorDataset};

fn json_value(value: &FieldValue) -> JsonValue {
    match value {
        FieldValue::Integer(v) => JsonValue::from(*v),
        FieldValue::Float(v) => JsonValue::from(*v),
        FieldValue::Text(v) => JsonValue::from(v.as_str()),
        FieldValue::Null => JsonValue::Null,
    }
}

/// Reprojects the dataset and builds one Point feature per tree
pub fn to_feature_collection(dataset: &VectorDataset, transformer: &CoordinateTransformer) -> TreeKitResult<FeatureCollection> {
    let names = VectorDataset::field_names();
    let mut features = Vec::with_capacity(dataset.len());

    for (index, point) in dataset.points().iter().enumerate() {
        let wgs84 = transformer.transform(&point.position)?;

        let mut properties = JsonObject::new();
        for (name, value) in names.iter().zip(dataset.attributes(index).iter()) {
            properties.insert(name.to_string(), json_value(value));
        }

        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![wgs84.x, wgs84.y]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }

    Ok(FeatureCollection { bbox: None, features, foreign_members: None })
}

/// Writes a feature collection as pretty-printed JSON
pub fn write_geojson_file(path: &Path, collection: &FeatureCollection) -> TreeKitResult<()> {
    let json = serde_json::to_string_pretty(&GeoJson::from(collection.clone()))
        .map_err(|e| TreeKitError::export(path, e.into()))?;
    fs::write(path, json).map_err(|e| TreeKitError::export(path, e))?;

    info!("Wrote {} GeoJSON features to {}", collection.features.len(), path.display());
    Ok(())
}
