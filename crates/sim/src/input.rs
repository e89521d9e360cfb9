use crate::math::Vec2;

/// What the controller wants for the next tick. Movement is a raw direction;
/// the simulation normalizes it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Intent {
    pub movement: Vec2,
    pub fire: bool,
    pub restart: bool,
    pub rotate_steps: i32,
}

impl Intent {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn moving(movement: Vec2) -> Self {
        Self {
            movement,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Fire,
    Restart,
    RotateLeft,
    RotateRight,
}

const ACTION_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, Default)]
pub struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    pub fn movement(&self) -> Vec2 {
        let axis = |negative: InputAction, positive: InputAction| {
            f32::from(self.is_down(positive) as u8) - f32::from(self.is_down(negative) as u8)
        };
        Vec2::new(
            axis(InputAction::MoveLeft, InputAction::MoveRight),
            axis(InputAction::MoveUp, InputAction::MoveDown),
        )
    }

    pub fn intent(&self) -> Intent {
        Intent {
            movement: self.movement(),
            fire: self.is_down(InputAction::Fire),
            restart: self.is_down(InputAction::Restart),
            rotate_steps: i32::from(self.is_down(InputAction::RotateRight))
                - i32::from(self.is_down(InputAction::RotateLeft)),
        }
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Fire => 4,
            InputAction::Restart => 5,
            InputAction::RotateLeft => 6,
            InputAction::RotateRight => 7,
        }
    }
}
