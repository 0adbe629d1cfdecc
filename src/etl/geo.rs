// src/etl/geo.rs

use crate::domain::{CoercedListing, ProcessedListing};
use crate::errors::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Pre-fitted nearest-centre model over (latitude, longitude).
///
/// The id -> label table belongs to the artifact: zone names are whatever the
/// training run decided, never recomputed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoClusterer {
    /// Feature order the centres were fitted with.
    pub feature_names: Vec<String>,
    pub centers: Vec<Vec<f64>>,
    pub labels: BTreeMap<usize, String>,
}

const EXPECTED_FEATURES: [&str; 2] = ["latitude", "longitude"];

impl GeoClusterer {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            EtlError::ClusterModel(format!("cannot read {}: {e}", path.display()))
        })?;
        let clusterer: GeoClusterer = serde_json::from_str(&text).map_err(|e| {
            EtlError::ClusterModel(format!("cannot parse {}: {e}", path.display()))
        })?;
        clusterer.validate()?;
        Ok(clusterer)
    }

    /// Checks the artifact agrees with how we feed it.
    pub fn validate(&self) -> Result<()> {
        if self.feature_names != EXPECTED_FEATURES {
            return Err(EtlError::ClusterModel(format!(
                "expected features {:?}, model was fitted on {:?}",
                EXPECTED_FEATURES, self.feature_names
            )));
        }
        if self.centers.is_empty() {
            return Err(EtlError::ClusterModel("model has no centres".into()));
        }
        for (id, center) in self.centers.iter().enumerate() {
            if center.len() != EXPECTED_FEATURES.len() {
                return Err(EtlError::ClusterModel(format!(
                    "centre {id} has {} coordinates, expected {}",
                    center.len(),
                    EXPECTED_FEATURES.len()
                )));
            }
            if !self.labels.contains_key(&id) {
                return Err(EtlError::ClusterModel(format!("no zone label for cluster {id}")));
            }
        }
        Ok(())
    }

    /// Index of the nearest centre; the first one wins ties.
    pub fn predict(&self, latitude: f64, longitude: f64) -> usize {
        self.centers
            .iter()
            .map(|c| (c[0] - latitude).powi(2) + (c[1] - longitude).powi(2))
            .enumerate()
            .fold((0, f64::INFINITY), |best, (id, d)| if d < best.1 { (id, d) } else { best })
            .0
    }

    pub fn zone(&self, latitude: f64, longitude: f64) -> Result<&str> {
        let id = self.predict(latitude, longitude);
        self.labels
            .get(&id)
            .map(String::as_str)
            .ok_or_else(|| EtlError::ClusterModel(format!("no zone label for cluster {id}")))
    }

    /// Replaces every listing's coordinates with its zone label.
    pub fn assign(&self, listings: Vec<CoercedListing>) -> Result<Vec<ProcessedListing>> {
        self.validate()?;

        listings
            .into_iter()
            .map(|l| {
                let zone = self.zone(l.latitude, l.longitude)?.to_string();
                Ok(l.into_processed(zone))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::{coerced, valencia_clusterer};

    #[test]
    fn assigns_nearest_zone_and_drops_coordinates() {
        let clusterer = valencia_clusterer();

        let mut north = coerced("1", 900.0);
        north.latitude = 39.50;
        north.longitude = -0.37;
        let mut south = coerced("2", 900.0);
        south.latitude = 39.43;
        south.longitude = -0.36;

        let processed = clusterer.assign(vec![north, south]).unwrap();
        assert_eq!(processed[0].direction, "north");
        assert_eq!(processed[1].direction, "south");

        let json = serde_json::to_value(&processed[0]).unwrap();
        assert!(json.get("latitude").is_none());
        assert!(json.get("longitude").is_none());
    }

    #[test]
    fn swapped_feature_order_is_rejected() {
        let mut clusterer = valencia_clusterer();
        clusterer.feature_names = vec!["longitude".into(), "latitude".into()];

        let err = clusterer.assign(vec![coerced("1", 900.0)]).unwrap_err();
        assert!(matches!(err, EtlError::ClusterModel(_)));
    }

    #[test]
    fn every_centre_needs_a_label() {
        let mut clusterer = valencia_clusterer();
        clusterer.labels.remove(&3);
        assert!(matches!(clusterer.validate(), Err(EtlError::ClusterModel(_))));
    }

    #[test]
    fn loads_labels_keyed_by_string_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kmeans_clustering.json");
        std::fs::write(
            &path,
            r#"{
                "feature_names": ["latitude", "longitude"],
                "centers": [[39.47, -0.38], [39.44, -0.36]],
                "labels": {"0": "central", "1": "south"}
            }"#,
        )
        .unwrap();

        let clusterer = GeoClusterer::load(&path).unwrap();
        assert_eq!(clusterer.zone(39.445, -0.361).unwrap(), "south");
    }
}
