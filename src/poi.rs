//! The point-of-interest domain type.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::geo::Coordinate;

/// Tag key carrying the stable knowledge-base identifier (a QID).
pub const WIKIDATA_TAG: &str = "wikidata";

/// A named feature candidate for recognition.
///
/// Constructed once by retrieval after both the geospatial query and image
/// acquisition have resolved; consumed read-only by the match engine and
/// discarded at end of session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poi {
    pub name: String,
    /// Unknown for results from the degraded fallback source.
    pub coordinate: Option<Coordinate>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    pub image_path: Option<PathBuf>,
}

impl Poi {
    pub fn wikidata_id(&self) -> Option<&str> {
        self.tags.get(WIKIDATA_TAG).map(|s| s.as_str())
    }

    /// Type hint for the reference description: a `historic` tag value wins,
    /// then `tourism`, then a generic label.
    pub fn type_hint(&self) -> &str {
        self.tags
            .get("historic")
            .or_else(|| self.tags.get("tourism"))
            .map(|s| s.as_str())
            .unwrap_or("point of interest")
    }

    /// Text the engine embeds for this POI.
    pub fn description(&self, locale_hint: &str) -> String {
        format!("{}, {} in {}", self.name, self.type_hint(), locale_hint)
    }

    pub fn has_image(&self) -> bool {
        self.image_path.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poi_with_tags(tags: &[(&str, &str)]) -> Poi {
        Poi {
            name: "Château de Castelnau".to_string(),
            coordinate: None,
            tags: tags
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            image_path: None,
        }
    }

    #[test]
    fn test_type_hint_prefers_historic() {
        let poi = poi_with_tags(&[("historic", "castle"), ("tourism", "museum")]);
        assert_eq!(poi.type_hint(), "castle");
    }

    #[test]
    fn test_type_hint_falls_back_to_tourism() {
        let poi = poi_with_tags(&[("tourism", "museum")]);
        assert_eq!(poi.type_hint(), "museum");
    }

    #[test]
    fn test_type_hint_generic_default() {
        let poi = poi_with_tags(&[("amenity", "fountain")]);
        assert_eq!(poi.type_hint(), "point of interest");
    }

    #[test]
    fn test_description_format() {
        let poi = poi_with_tags(&[("historic", "castle")]);
        assert_eq!(
            poi.description("France"),
            "Château de Castelnau, castle in France"
        );
    }

    #[test]
    fn test_wikidata_id_from_tags() {
        let poi = poi_with_tags(&[("wikidata", "Q1129459")]);
        assert_eq!(poi.wikidata_id(), Some("Q1129459"));
        assert_eq!(poi_with_tags(&[]).wikidata_id(), None);
    }
}
