use std::fmt;

/// Playback classification of the watched receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    Playing,
    Idle,
}

impl PlaybackState {
    pub fn from_streaming(streaming: bool) -> Self {
        if streaming {
            PlaybackState::Playing
        } else {
            PlaybackState::Idle
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Playing => f.write_str("PLAYING"),
            PlaybackState::Idle => f.write_str("IDLE"),
        }
    }
}

/// What the caller should do after an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    /// First observation after startup found a session already playing.
    FireInitialPlaying,
    FireTransition(PlaybackState),
}

impl Action {
    /// The webhook to fire, if any.
    pub fn target(self) -> Option<PlaybackState> {
        match self {
            Action::None => None,
            Action::FireInitialPlaying => Some(PlaybackState::Playing),
            Action::FireTransition(state) => Some(state),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum TrackerState {
    #[default]
    Uninitialized,
    Tracking(PlaybackState),
}

/// Turns a stream of classifications into edge-triggered actions.
///
/// The first observation only fires when it is `Playing`: a restart during
/// playback re-announces the session, while a restart during idle stays
/// silent so edge-driven automations do not see a fabricated idle event.
#[derive(Debug, Default)]
pub struct TransitionTracker {
    state: TrackerState,
}

impl TransitionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, new_state: PlaybackState) -> Action {
        match self.state {
            TrackerState::Uninitialized => {
                self.state = TrackerState::Tracking(new_state);
                match new_state {
                    PlaybackState::Playing => Action::FireInitialPlaying,
                    PlaybackState::Idle => Action::None,
                }
            }
            TrackerState::Tracking(current) if current == new_state => Action::None,
            TrackerState::Tracking(_) => {
                self.state = TrackerState::Tracking(new_state);
                Action::FireTransition(new_state)
            }
        }
    }

    /// Last reported classification; `None` until the first observation.
    pub fn last_state(&self) -> Option<PlaybackState> {
        match self.state {
            TrackerState::Uninitialized => None,
            TrackerState::Tracking(state) => Some(state),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.state != TrackerState::Uninitialized
    }
}
