use engine::{InputAction, InputSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Horizontal {
    Left,
    Right,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MovementIntent {
    pub(crate) horizontal: Horizontal,
    pub(crate) jump: bool,
}

impl MovementIntent {
    /// Left wins when both directions are held.
    pub(crate) fn from_input(input: &InputSnapshot) -> Self {
        let horizontal = if input.is_down(InputAction::MoveLeft) {
            Horizontal::Left
        } else if input.is_down(InputAction::MoveRight) {
            Horizontal::Right
        } else {
            Horizontal::None
        };
        Self {
            horizontal,
            jump: input.is_down(InputAction::Jump),
        }
    }
}
