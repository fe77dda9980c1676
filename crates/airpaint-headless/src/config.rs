use anyhow::bail;
use serde::{Deserialize, Serialize};

use airpaint_params::{BrushState, CanvasSize, WindState};

/// Headless run configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessConfig {
    pub canvas: [u32; 2],
    pub frames: u32,
    #[serde(default = "default_snapshot_every")]
    pub snapshot_every: u32,
    #[serde(default)]
    pub brush: BrushState,
    #[serde(default)]
    pub wind: WindState,
    pub stroke: StrokeConfig,
}

fn default_snapshot_every() -> u32 {
    10
}

/// Where the pointer comes from during a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrokeConfig {
    /// Explicit keyframes; the pointer holds its last keyframe between them
    Scripted { points: Vec<StrokePoint> },
    /// Straight strokes with seeded random endpoints
    Random { seed: u64, segments: u32 },
}

/// Pointer state from `frame` onwards, in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    pub frame: u32,
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_pressure")]
    pub pressure: f32,
    #[serde(default = "default_down")]
    pub down: bool,
}

fn default_pressure() -> f32 {
    0.5
}

fn default_down() -> bool {
    true
}

impl HeadlessConfig {
    pub fn size(&self) -> CanvasSize {
        CanvasSize::new(self.canvas[0], self.canvas[1])
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let [w, h] = self.canvas;
        if w < 16 || h < 16 {
            bail!("Canvas size too small ({}x{}). Minimum supported is 16x16.", w, h);
        }
        if self.frames == 0 {
            bail!("Frame count must be greater than 0.");
        }
        if self.snapshot_every == 0 {
            bail!("Snapshot interval must be greater than 0.");
        }
        match &self.stroke {
            StrokeConfig::Scripted { points } if points.is_empty() => {
                bail!("Scripted stroke needs at least one point.");
            }
            StrokeConfig::Random { segments: 0, .. } => {
                bail!("Random stroke needs at least one segment.");
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPTED: &str = "
canvas: [256, 128]
frames: 40
brush:
  radius: 12.0
stroke:
  kind: scripted
  points:
    - { frame: 0, x: 20.0, y: 64.0 }
    - { frame: 30, x: 230.0, y: 64.0, pressure: 0.9 }
    - { frame: 35, x: 230.0, y: 64.0, down: false }
";

    #[test]
    fn scripted_config_parses_with_defaults() {
        let config: HeadlessConfig = serde_yaml::from_str(SCRIPTED).unwrap();
        assert_eq!(config.size(), CanvasSize::new(256, 128));
        assert_eq!(config.snapshot_every, 10);
        assert_eq!(config.brush.radius, 12.0);
        assert_eq!(config.brush.hardness, BrushState::default().hardness);
        assert_eq!(config.wind, WindState::default());

        let StrokeConfig::Scripted { points } = &config.stroke else {
            panic!("expected a scripted stroke");
        };
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].pressure, 0.5);
        assert!(points[0].down);
        assert!(!points[2].down);
        config.validate().unwrap();
    }

    #[test]
    fn random_config_parses() {
        let config: HeadlessConfig = serde_yaml::from_str(
            "canvas: [64, 64]\nframes: 10\nstroke: { kind: random, seed: 7, segments: 2 }\n",
        )
        .unwrap();
        assert!(matches!(config.stroke, StrokeConfig::Random { seed: 7, segments: 2 }));
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let mut config: HeadlessConfig = serde_yaml::from_str(SCRIPTED).unwrap();
        config.frames = 0;
        assert!(config.validate().is_err());

        config.frames = 10;
        config.canvas = [8, 8];
        assert!(config.validate().is_err());

        config.canvas = [64, 64];
        config.stroke = StrokeConfig::Random { seed: 1, segments: 0 };
        assert!(config.validate().is_err());
    }
}
