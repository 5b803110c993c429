//! Read-only peak catalog with a latitude-banded bounding-box query.
//!
//! The catalog is loaded once at startup from a JSON document and never
//! mutated. Queries prune by a latitude-sorted index first, then filter
//! longitude exactly, so query time tracks the local peak density rather
//! than the full catalog size.
//!
//! A catalog that cannot be loaded is represented as the empty catalog:
//! every query returns zero candidates and classification degrades to
//! "no mountain" instead of failing.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::{info, warn};

use crate::geo::BoundingBox;
use crate::peak::Peak;

/// On-disk catalog document: `{"peaks": [...]}`.
#[derive(Debug, Deserialize)]
struct CatalogDocument {
    peaks: Vec<Peak>,
}

#[derive(Debug, Clone, Default)]
pub struct PeakCatalog {
    peaks: Vec<Peak>,
    /// Indices into `peaks`, sorted by latitude. Lets `query` binary-search
    /// the latitude band of a bounding box.
    by_latitude: Vec<u32>,
}

impl PeakCatalog {
    /// Build a catalog and its latitude index from owned peaks.
    pub fn from_peaks(peaks: Vec<Peak>) -> Self {
        let mut by_latitude: Vec<u32> = (0..peaks.len() as u32).collect();
        by_latitude.sort_by(|&a, &b| {
            peaks[a as usize]
                .latitude
                .total_cmp(&peaks[b as usize].latitude)
        });
        Self { peaks, by_latitude }
    }

    /// The catalog with no peaks. Stands in for an unavailable catalog.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a catalog document from an in-memory string.
    pub fn load_from_str(data: &str) -> anyhow::Result<Self> {
        let doc: CatalogDocument =
            serde_json::from_str(data).context("malformed peak catalog document")?;
        Ok(Self::from_peaks(doc.peaks))
    }

    /// Load a catalog document from a file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read peak catalog {}", path.display()))?;
        let catalog = Self::load_from_str(&data)?;
        info!("loaded {} peaks from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Load a catalog, mapping any failure to the empty catalog.
    ///
    /// An unavailable catalog must classify as zero candidates, not crash.
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
        match Self::load_from_file(&path) {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!(
                    "peak catalog unavailable ({err:#}); continuing with empty catalog"
                );
                Self::empty()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    /// All catalog peaks, in document order.
    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }

    /// Peaks inside the bounding box.
    ///
    /// Scans only the latitude band `[min_lat, max_lat]` via the sorted
    /// index, then filters longitude exactly.
    pub fn query(&self, bbox: &BoundingBox) -> Vec<&Peak> {
        if self.is_empty() {
            return Vec::new();
        }

        let start = self
            .by_latitude
            .partition_point(|&i| self.peaks[i as usize].latitude < bbox.min_lat);
        let end = self
            .by_latitude
            .partition_point(|&i| self.peaks[i as usize].latitude <= bbox.max_lat);

        self.by_latitude[start..end]
            .iter()
            .map(|&i| &self.peaks[i as usize])
            .filter(|p| p.longitude >= bbox.min_lon && p.longitude <= bbox.max_lon)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;

    fn peak(id: u64, name: &str, lat: f64, lon: f64) -> Peak {
        Peak {
            id,
            name: name.to_string(),
            latitude: lat,
            longitude: lon,
            elevation: "14000".to_string(),
            state: None,
        }
    }

    #[test]
    fn query_returns_only_peaks_inside_the_box() {
        let catalog = PeakCatalog::from_peaks(vec![
            peak(1, "Inside", 40.005, -105.005),
            peak(2, "North of box", 40.02, -105.0),
            peak(3, "Wrong longitude", 40.005, -104.5),
            peak(4, "Also inside", 39.995, -104.995),
        ]);

        let bbox = BoundingBox::around(&Coordinate::new(40.0, -105.0), 0.01);
        let mut ids: Vec<u64> = catalog.query(&bbox).iter().map(|p| p.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn query_matches_brute_force_scan() {
        // Grid of peaks around the box; index path must agree with a full scan.
        let mut peaks = Vec::new();
        let mut id = 0;
        for i in -5..=5 {
            for j in -5..=5 {
                id += 1;
                peaks.push(peak(
                    id,
                    "grid",
                    40.0 + i as f64 * 0.004,
                    -105.0 + j as f64 * 0.004,
                ));
            }
        }
        let catalog = PeakCatalog::from_peaks(peaks.clone());
        let bbox = BoundingBox::around(&Coordinate::new(40.0, -105.0), 0.01);

        let mut indexed: Vec<u64> = catalog.query(&bbox).iter().map(|p| p.id).collect();
        let mut brute: Vec<u64> = peaks
            .iter()
            .filter(|p| bbox.contains(p.latitude, p.longitude))
            .map(|p| p.id)
            .collect();
        indexed.sort_unstable();
        brute.sort_unstable();
        assert_eq!(indexed, brute);
    }

    #[test]
    fn empty_catalog_yields_no_candidates() {
        let catalog = PeakCatalog::empty();
        let bbox = BoundingBox::around(&Coordinate::new(40.0, -105.0), 0.01);
        assert!(catalog.query(&bbox).is_empty());
    }

    #[test]
    fn missing_file_degrades_to_empty_catalog() {
        let catalog = PeakCatalog::load_or_empty("/nonexistent/peaks.json");
        assert!(catalog.is_empty());
    }

    #[test]
    fn loads_document_with_mixed_field_types() {
        let catalog = PeakCatalog::load_from_str(
            r#"{"peaks": [
                {"id": 1, "name": "A", "latitude": 40.0, "longitude": -105.0,
                 "elevation": 14000, "state": "CO"},
                {"id": "2", "name": "B", "latitude": 41.0, "longitude": -106.0,
                 "elevation": "13,500 ft"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.peaks()[1].elevation, "13,500 ft");
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(PeakCatalog::load_from_str(r#"{"peaks": [{"id": {}}]}"#).is_err());
        assert!(PeakCatalog::load_from_str("not json").is_err());
    }
}
