//! Controller button combinations exposed as discrete actions.

/// Buttons held for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Buttons {
    pub right: bool,
    pub left: bool,
    /// A: jump.
    pub jump: bool,
    /// B: run.
    pub run: bool,
}

impl Buttons {
    const fn new(right: bool, left: bool, jump: bool, run: bool) -> Self {
        Self {
            right,
            left,
            jump,
            run,
        }
    }

    /// Horizontal direction: +1 right, -1 left, 0 when both or neither.
    pub fn direction(&self) -> f32 {
        match (self.right, self.left) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        }
    }
}

const NOOP: Buttons = Buttons::new(false, false, false, false);
const RIGHT: Buttons = Buttons::new(true, false, false, false);
const RIGHT_A: Buttons = Buttons::new(true, false, true, false);
const RIGHT_B: Buttons = Buttons::new(true, false, false, true);
const RIGHT_A_B: Buttons = Buttons::new(true, false, true, true);
const A: Buttons = Buttons::new(false, false, true, false);
const LEFT: Buttons = Buttons::new(false, true, false, false);
const LEFT_A: Buttons = Buttons::new(false, true, true, false);
const LEFT_B: Buttons = Buttons::new(false, true, false, true);
const LEFT_A_B: Buttons = Buttons::new(false, true, true, true);

const RIGHT_ONLY: [Buttons; 5] = [NOOP, RIGHT, RIGHT_A, RIGHT_B, RIGHT_A_B];
const SIMPLE: [Buttons; 7] = [NOOP, RIGHT, RIGHT_A, RIGHT_B, RIGHT_A_B, A, LEFT];
// Down and up have no effect in this game; they stay in the set so action
// indices line up with the usual twelve-action layout.
const COMPLEX: [Buttons; 12] = [
    NOOP, RIGHT, RIGHT_A, RIGHT_B, RIGHT_A_B, A, LEFT, LEFT_A, LEFT_B, LEFT_A_B, NOOP, NOOP,
];

/// Which button combinations the agent may press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionSet {
    RightOnly,
    #[default]
    Simple,
    Complex,
}

impl ActionSet {
    pub fn buttons(&self) -> &'static [Buttons] {
        match self {
            ActionSet::RightOnly => &RIGHT_ONLY,
            ActionSet::Simple => &SIMPLE,
            ActionSet::Complex => &COMPLEX,
        }
    }

    pub fn len(&self) -> usize {
        self.buttons().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buttons().is_empty()
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActionSet::RightOnly => "right_only",
            ActionSet::Simple => "simple",
            ActionSet::Complex => "complex",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "right_only" | "right" => Some(ActionSet::RightOnly),
            "simple" => Some(ActionSet::Simple),
            "complex" => Some(ActionSet::Complex),
            _ => None,
        }
    }
}
