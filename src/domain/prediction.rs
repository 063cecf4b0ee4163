use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::detection::Detection;
use super::fertilizer::FertilizerEntry;

/// Una detección tal como sale por la API, ya cruzada con la tabla de fertilizantes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub label: String,
    pub confidence: f64,
    pub fertilizer: String,
    pub quantity: String,
    pub frequency: String,
}

impl DetectionRecord {
    pub fn new(detection: &Detection, entry: FertilizerEntry) -> Self {
        Self {
            label: detection.label.clone(),
            confidence: detection.confidence_percent(),
            fertilizer: entry.fertilizer,
            quantity: entry.quantity,
            frequency: entry.frequency,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionReport {
    pub detections: Vec<DetectionRecord>,
    pub result_image_url: String,
    pub original_image_url: String,
}

pub fn summarize_detections(detections: &[Detection]) -> String {
    let mut counts = BTreeMap::new();
    for det in detections {
        *counts.entry(&det.label).or_insert(0) += 1;
    }
    counts.iter()
        .map(|(label, count)| format!("{} {}", count, label))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::detection::BoundingBox;

    fn det(label: &str) -> Detection {
        Detection {
            bbox: BoundingBox { x1: 0, y1: 0, x2: 1, y2: 1 },
            score: 0.5,
            class_id: 0,
            label: label.into(),
        }
    }

    #[test]
    fn summary_counts_per_label() {
        let dets = vec![det("weed_B"), det("weed_A"), det("weed_B")];
        assert_eq!(summarize_detections(&dets), "1 weed_A, 2 weed_B");
        assert_eq!(summarize_detections(&[]), "");
    }

    #[test]
    fn record_serializes_five_keys() {
        let rec = DetectionRecord::new(&det("weed_A"), FertilizerEntry::not_found());
        let json = serde_json::to_value(&rec).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 5);
        assert_eq!(obj["confidence"], 50.0);
        assert_eq!(obj["fertilizer"], "Not found");
    }
}
