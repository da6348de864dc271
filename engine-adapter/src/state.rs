//! The lifecycle states an [`crate::adapter::EngineProcessAdapter`] moves
//! through, per the component design's state machine.

/// `Spawning -> Ready -> Busy -> Ready -> ... -> Dead`. `Dead` is terminal:
/// once reached, every subsequent command resolves immediately with
/// [`crate::error::Error::DeadEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpaState {
    Spawning,
    Ready,
    Busy,
    Dead,
}

impl EpaState {
    pub fn is_dead(self) -> bool {
        matches!(self, EpaState::Dead)
    }
}
