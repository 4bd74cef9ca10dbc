use engine::{AnimationDef, SceneWorld, TextureDesc, TextureKeyError};

pub(crate) mod textures {
    pub(crate) const MARIO: &str = "mario";
    pub(crate) const MARIO_GROWN: &str = "mario-grown";
    pub(crate) const GOOMBA: &str = "goomba";
    pub(crate) const COIN: &str = "coin";
    pub(crate) const SUPERMUSHROOM: &str = "supermushroom";
    pub(crate) const FLOORBRICKS: &str = "floorbricks";
}

pub(crate) mod anims {
    pub(crate) const GOOMBA_WALK: &str = "goomba-walk";
    pub(crate) const GOOMBA_HURT: &str = "goomba-hurt";
    pub(crate) const MARIO_IDLE: &str = "mario-idle";
    pub(crate) const MARIO_WALK: &str = "mario-walk";
    pub(crate) const MARIO_JUMP: &str = "mario-jump";
    pub(crate) const MARIO_DEAD: &str = "mario-dead";
    pub(crate) const MARIO_GROWN_IDLE: &str = "mario-grown-idle";
    pub(crate) const MARIO_GROWN_WALK: &str = "mario-grown-walk";
    pub(crate) const MARIO_GROWN_JUMP: &str = "mario-grown-jump";
    pub(crate) const COIN_IDLE: &str = "coin-idle";
    pub(crate) const SUPERMUSHROOM_IDLE: &str = "supermushroom-idle";
}

pub(crate) mod cues {
    pub(crate) const MAIN_THEME: &str = "main-theme";
    pub(crate) const GOOMBA_STOMP: &str = "goomba-stomp";
    pub(crate) const COIN_PICKUP: &str = "coin-pickup";
    pub(crate) const POWERUP: &str = "powerup";
    pub(crate) const GAMEOVER: &str = "gameover";
}

fn texture(key: &'static str, path: &'static str, frame_width: u32, frame_height: u32) -> TextureDesc {
    TextureDesc {
        key,
        path,
        frame_width,
        frame_height,
    }
}

fn animation(
    key: &'static str,
    texture: &'static str,
    frames: &[u32],
    frame_rate: f32,
    repeat: bool,
) -> AnimationDef {
    AnimationDef {
        key,
        texture,
        frames: frames.to_vec(),
        frame_rate,
        repeat,
    }
}

fn texture_table() -> [TextureDesc; 6] {
    [
        texture(textures::MARIO, "sprites/entities/mario.png", 18, 16),
        texture(textures::MARIO_GROWN, "sprites/entities/mario-grown.png", 18, 32),
        texture(textures::GOOMBA, "sprites/entities/overworld/goomba.png", 16, 16),
        texture(textures::COIN, "sprites/collectibles/coin.png", 16, 16),
        texture(textures::SUPERMUSHROOM, "sprites/collectibles/super-mushroom.png", 16, 16),
        texture(textures::FLOORBRICKS, "sprites/scenery/overworld/floorbricks.png", 128, 32),
    ]
}

fn animation_table() -> [AnimationDef; 11] {
    [
        animation(anims::MARIO_WALK, textures::MARIO, &[3, 2, 1], 12.0, true),
        animation(anims::MARIO_IDLE, textures::MARIO, &[0], 0.0, false),
        animation(anims::MARIO_JUMP, textures::MARIO, &[5], 0.0, false),
        animation(anims::MARIO_DEAD, textures::MARIO, &[4], 0.0, false),
        animation(anims::MARIO_GROWN_WALK, textures::MARIO_GROWN, &[3, 2, 1], 12.0, true),
        animation(anims::MARIO_GROWN_IDLE, textures::MARIO_GROWN, &[0], 0.0, false),
        animation(anims::MARIO_GROWN_JUMP, textures::MARIO_GROWN, &[5], 0.0, false),
        animation(anims::GOOMBA_WALK, textures::GOOMBA, &[0, 1], 12.0, true),
        animation(anims::GOOMBA_HURT, textures::GOOMBA, &[2], 0.0, false),
        animation(anims::COIN_IDLE, textures::COIN, &[0, 1, 2, 3], 12.0, true),
        animation(anims::SUPERMUSHROOM_IDLE, textures::SUPERMUSHROOM, &[0], 0.0, false),
    ]
}

/// Registers every spritesheet and animation the level uses.
pub(crate) fn register(world: &mut SceneWorld) -> Result<(), TextureKeyError> {
    for desc in texture_table() {
        world.register_texture(desc)?;
    }
    for def in animation_table() {
        world.register_animation(def)?;
    }
    Ok(())
}
