mod animation;
mod audio;
mod input;
mod loop_runner;
mod metrics;
mod physics;
mod rendering;
mod scene;
mod timers;
mod tools;
mod tween;

pub use animation::{AnimationDef, AnimationPlayer, AnimationRegistry, PlayMode, TextureDesc};
pub use audio::{AudioBus, AudioCommand, PlayOptions, SoundHandle};
pub use input::InputAction;
pub use loop_runner::{run_app, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::LoopMetricsSnapshot;
pub use physics::{
    Body, BodyDesc, BodyDescError, BodyKind, BodySet, ColliderId, Contact, GroupId, PairMode, Rect,
    Touching,
};
pub use rendering::{world_to_screen, Renderer, Viewport};
pub use scene::{
    Camera2D, Entity, EntityId, InputSnapshot, RenderableDesc, RenderableKind, Scene, SceneCommand,
    SceneWorld, TextArtifact, TextId, TextStyle, Vec2,
};
pub use timers::{TimerHandle, TimerQueue};
pub use tween::{TextProperty, TweenId};
pub(crate) use tools::OverlayData;
