use serde::{Deserialize, Serialize};
use thiserror::Error;

const OVERWORLD_JSON: &str = include_str!("../../../../../assets/levels/overworld.json");

#[derive(Debug, Error)]
pub(crate) enum LevelError {
    #[error("level layout is malformed at `{path}`: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("level `{level}` has invalid {field}: {reason}")]
    Invalid {
        level: String,
        field: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LevelBounds {
    pub(crate) width: f32,
    pub(crate) height: f32,
}

/// A static floor brick anchored at its left edge, vertically centred.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FloorSegment {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) width: f32,
    pub(crate) height: f32,
}

/// Bottom-left anchor of the player sprite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SpawnPoint {
    pub(crate) x: f32,
    pub(crate) y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct EnemySpawn {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) velocity_x: f32,
}

/// Centre of a collectible; `texture` also selects its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CollectiblePlacement {
    pub(crate) texture: String,
    pub(crate) x: f32,
    pub(crate) y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Level {
    pub(crate) name: String,
    pub(crate) bounds: LevelBounds,
    pub(crate) gravity: f32,
    pub(crate) floor: Vec<FloorSegment>,
    pub(crate) player: SpawnPoint,
    pub(crate) enemy: EnemySpawn,
    pub(crate) collectibles: Vec<CollectiblePlacement>,
}

impl Level {
    /// The single level shipped with the game, embedded at build time.
    pub(crate) fn overworld() -> Result<Self, LevelError> {
        Self::from_json(OVERWORLD_JSON)
    }

    pub(crate) fn from_json(raw: &str) -> Result<Self, LevelError> {
        let deserializer = &mut serde_json::Deserializer::from_str(raw);
        let level: Level =
            serde_path_to_error::deserialize(deserializer).map_err(|error| LevelError::Parse {
                path: error.path().to_string(),
                source: error.into_inner(),
            })?;
        level.validate()?;
        Ok(level)
    }

    /// The player dies once its bottom edge reaches this line.
    pub(crate) fn death_line(&self) -> f32 {
        self.bounds.height
    }

    fn validate(&self) -> Result<(), LevelError> {
        if !positive(self.bounds.width) || !positive(self.bounds.height) {
            return Err(self.invalid(
                "bounds",
                format!("{}x{} is not a positive size", self.bounds.width, self.bounds.height),
            ));
        }
        if !self.gravity.is_finite() {
            return Err(self.invalid("gravity", format!("{} is not finite", self.gravity)));
        }
        if self.floor.is_empty() {
            return Err(self.invalid("floor", "at least one segment is required".to_string()));
        }
        for (index, segment) in self.floor.iter().enumerate() {
            if !positive(segment.width) || !positive(segment.height) {
                return Err(self.invalid(
                    "floor",
                    format!(
                        "segment {index} has size {}x{}",
                        segment.width, segment.height
                    ),
                ));
            }
        }
        Ok(())
    }

    fn invalid(&self, field: &'static str, reason: String) -> LevelError {
        LevelError::Invalid {
            level: self.name.clone(),
            field,
            reason,
        }
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}
