//! Decisions for the two interactions the level registers. Nothing here
//! touches the world; the scene applies the returned outcome.

use engine::Touching;
use serde::Serialize;

use super::assets::{anims, textures};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Stomp,
    Kill,
    CollectCoin,
    CollectPowerUp,
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum CollectibleKind {
    Coin,
    PowerUp,
}

impl CollectibleKind {
    pub(crate) fn from_texture_key(key: &str) -> Option<Self> {
        match key {
            textures::COIN => Some(Self::Coin),
            textures::SUPERMUSHROOM => Some(Self::PowerUp),
            _ => None,
        }
    }

    pub(crate) fn texture_key(self) -> &'static str {
        match self {
            Self::Coin => textures::COIN,
            Self::PowerUp => textures::SUPERMUSHROOM,
        }
    }

    pub(crate) fn idle_animation(self) -> &'static str {
        match self {
            Self::Coin => anims::COIN_IDLE,
            Self::PowerUp => anims::SUPERMUSHROOM_IDLE,
        }
    }
}

/// Player against the patrolling enemy. Landing on top is decided by the
/// touching flags of both bodies, never by comparing positions.
pub(crate) fn enemy_contact_outcome(
    player_dead: bool,
    enemy_stomped: bool,
    player_touching: Touching,
    enemy_touching: Touching,
) -> Outcome {
    if player_dead || enemy_stomped {
        return Outcome::Ignore;
    }
    if player_touching.down && enemy_touching.up {
        Outcome::Stomp
    } else {
        Outcome::Kill
    }
}

pub(crate) fn collectible_outcome(kind: Option<CollectibleKind>) -> Outcome {
    match kind {
        Some(CollectibleKind::Coin) => Outcome::CollectCoin,
        Some(CollectibleKind::PowerUp) => Outcome::CollectPowerUp,
        None => Outcome::Ignore,
    }
}
