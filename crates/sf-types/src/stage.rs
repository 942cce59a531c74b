//! Level-description document consumed by the game's renderer.

use serde::{Deserialize, Serialize};

use crate::level::{MovingPlatform, StaticPlatform};
use crate::result::OptimizationResult;

/// Rectangular goal region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Text drawn at a fixed world position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAnchor {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

impl TextAnchor {
    pub fn new(x: f64, y: f64, text: impl Into<String>) -> Self {
        Self {
            x,
            y,
            text: text.into(),
        }
    }
}

/// A full stage file. Only `platforms` and `moving_platforms` come from the
/// optimizer; everything else is fixed stage furniture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDocument {
    pub id: u32,
    pub name: String,
    pub description: String,
    /// Static platforms, without the start platform.
    pub platforms: Vec<StaticPlatform>,
    pub moving_platforms: Vec<MovingPlatform>,
    pub holes: Vec<serde_json::Value>,
    pub spikes: Vec<serde_json::Value>,
    pub moving_spikes: Vec<serde_json::Value>,
    pub goal: Goal,
    pub start_text: TextAnchor,
    pub goal_text: TextAnchor,
    pub left_edge_message: TextAnchor,
    pub left_edge_sub_message: TextAnchor,
}

impl StageDocument {
    /// Stage 2 ("moving platform tutorial") built from an optimized layout.
    pub fn moving_platform_tutorial(
        platforms: Vec<StaticPlatform>,
        moving_platforms: Vec<MovingPlatform>,
    ) -> Self {
        Self {
            id: 2,
            name: "Stage 2".to_string(),
            description: "Moving Platform Tutorial - Mathematically Optimized!".to_string(),
            platforms,
            moving_platforms,
            holes: Vec::new(),
            spikes: Vec::new(),
            moving_spikes: Vec::new(),
            goal: Goal {
                x: 2400.0,
                y: 400.0,
                width: 40.0,
                height: 50.0,
            },
            start_text: TextAnchor::new(50.0, 450.0, "STAGE 2"),
            goal_text: TextAnchor::new(2420.0, 380.0, "GOAL"),
            left_edge_message: TextAnchor::new(-400.0, 450.0, "OPTIMIZED TUTORIAL!"),
            left_edge_sub_message: TextAnchor::new(-400.0, 470.0, "MATH-POWERED PLATFORMS →"),
        }
    }

    /// Document for a successful run, `None` for a failed one.
    pub fn from_result(result: &OptimizationResult) -> Option<Self> {
        if !result.success {
            return None;
        }
        Some(Self::moving_platform_tutorial(
            result.level.platforms.clone(),
            result.level.moving_platforms.clone(),
        ))
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use crate::result::{OptimizationResult, ScoreBreakdown};
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_result(success: bool) -> OptimizationResult {
        let start = StaticPlatform {
            x1: -500.0,
            y1: 500.0,
            x2: 300.0,
            y2: 500.0,
        };
        let level = Level::new(
            start,
            vec![StaticPlatform::anchored(400.0, 500.0, 100.0)],
            vec![MovingPlatform::new(800.0, 1400.0, 500.0, 0.6, 80.0)],
        );
        OptimizationResult {
            id: Uuid::new_v4(),
            success,
            level,
            parameters: vec![400.0, 500.0, 800.0, 1400.0, 500.0, 0.6],
            score: 42.0,
            breakdown: ScoreBreakdown {
                clearability: 0.0,
                educational: 0.0,
                variety: 0.0,
                total: 42.0,
            },
            message: "ok".to_string(),
            iterations: 3,
            evaluations: 30,
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn document_skips_start_platform() {
        let doc = StageDocument::from_result(&sample_result(true)).unwrap();
        assert_eq!(doc.platforms.len(), 1);
        assert_eq!(doc.platforms[0].x1, 400.0);
        assert_eq!(doc.moving_platforms.len(), 1);
    }

    #[test]
    fn failed_run_has_no_document() {
        assert!(StageDocument::from_result(&sample_result(false)).is_none());
    }

    #[test]
    fn document_uses_stage_file_keys() {
        let doc = StageDocument::from_result(&sample_result(true)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&doc.to_json_pretty().unwrap()).unwrap();

        assert_eq!(json["id"], 2);
        assert_eq!(json["name"], "Stage 2");
        assert!(json["movingPlatforms"].is_array());
        assert!(json["movingSpikes"].as_array().unwrap().is_empty());
        assert_eq!(json["goal"]["x"], 2400.0);
        assert_eq!(json["startText"]["text"], "STAGE 2");
        assert_eq!(json["leftEdgeSubMessage"]["y"], 470.0);
        assert_eq!(json["movingPlatforms"][0]["startX"], 800.0);
    }

    #[test]
    fn document_round_trips_through_json() {
        let doc = StageDocument::from_result(&sample_result(true)).unwrap();
        let back: StageDocument = serde_json::from_str(&doc.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back, doc);
    }
}
