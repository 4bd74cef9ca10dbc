use std::time::Duration;

use engine::{InputSnapshot, Scene, SceneCommand, SceneWorld};
use tracing::{error, info, warn};

use super::level::Level;
use super::world::GameWorld;

pub(crate) struct PlatformerScene {
    level: Level,
    state: Option<GameWorld>,
}

impl PlatformerScene {
    pub(crate) fn new(level: Level) -> Self {
        Self { level, state: None }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> Option<&GameWorld> {
        self.state.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> Option<&mut GameWorld> {
        self.state.as_mut()
    }

    fn log_state_dump(&self, state: &GameWorld, world: &SceneWorld) {
        match serde_json::to_string(&state.state_dump(world)) {
            Ok(dump) => info!(scene = %self.level.name, dump = %dump, "state_dump"),
            Err(err) => warn!(scene = %self.level.name, error = %err, "state_dump_failed"),
        }
    }
}

impl Scene for PlatformerScene {
    fn load(&mut self, world: &mut SceneWorld) {
        match GameWorld::setup(&self.level, world) {
            Ok(state) => {
                info!(
                    scene = %self.level.name,
                    entity_count = world.entity_count(),
                    "scene_loaded"
                );
                self.state = Some(state);
            }
            Err(err) => {
                error!(scene = %self.level.name, error = %err, "scene_setup_failed");
                self.state = None;
            }
        }
    }

    fn update(
        &mut self,
        fixed_dt: Duration,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        let Some(mut state) = self.state.take() else {
            return SceneCommand::None;
        };
        let command = state.tick(world, fixed_dt, input);
        if input.dump_state_pressed() {
            self.log_state_dump(&state, world);
        }
        self.state = Some(state);
        command
    }

    fn unload(&mut self, world: &mut SceneWorld) {
        info!(
            scene = %self.level.name,
            entity_count = world.entity_count(),
            score = self.state.as_ref().map(|state| state.score.total()).unwrap_or(0),
            "scene_unload"
        );
        self.state = None;
    }

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        let state = self.state.as_ref()?;
        Some(format!("Platformer | Score {}", state.score.total()))
    }

    fn debug_lines(&self, world: &SceneWorld) -> Vec<String> {
        let Some(state) = self.state.as_ref() else {
            return vec!["no level loaded".to_string()];
        };
        let mut lines = vec![
            format!("score {}", state.score.total()),
            format!("mode {:?}", state.mode()).to_lowercase(),
        ];
        if let Some(body) = world.body(state.player.id) {
            let position = body.position();
            lines.push(format!("pos {:.0} {:.0}", position.x, position.y));
        }
        lines.push(format!("timers {}", state.timers.active_count()));
        lines
    }
}
