use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::domain::{Job, JobId, SwipeDirection};
use super::gesture::{CardFeedback, GestureDecision, GestureInterpreter};

/// Lifecycle of a swipe session. `Ready` and `Exhausted` derive from the stack size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Loading,
    Ready,
    Exhausted,
}

/// One committed decision, kept for undo.
#[derive(Debug, Clone, PartialEq)]
pub struct SwipeEntry {
    pub job: Job,
    pub direction: SwipeDirection,
}

/// Transition notices delivered to registered observers.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Initialized {
        size: usize,
    },
    Dragged {
        job_id: JobId,
        feedback: CardFeedback,
        preview: Option<SwipeDirection>,
    },
    SnappedBack {
        job_id: JobId,
    },
    Committed {
        job_id: JobId,
        direction: SwipeDirection,
        remaining: usize,
    },
    Settled {
        direction: SwipeDirection,
    },
    Undone {
        job_id: JobId,
        direction: SwipeDirection,
        application_retained: bool,
    },
}

/// Callback registration for UIs and telemetry that track the session.
pub trait SessionObserver: Send + Sync {
    fn on_event(&self, event: &SessionEvent);
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("session has not been initialized with a feed")]
    NotReady,
    #[error("no jobs left to swipe")]
    Exhausted,
    #[error("a swipe is still animating out; settle it first")]
    CommitInFlight,
    #[error("nothing to undo")]
    NothingToUndo,
}

/// Result of a committed swipe.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitOutcome {
    pub job: Job,
    pub direction: SwipeDirection,
    pub remaining: usize,
}

impl CommitOutcome {
    /// Right swipes hand the job to the application recorder.
    pub fn applies(&self) -> bool {
        self.direction == SwipeDirection::Right
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseOutcome {
    Committed(CommitOutcome),
    SnappedBack,
}

/// Result of an undo. The persisted application of a right swipe is never withdrawn;
/// `application_retained` tells the caller when that happened.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoOutcome {
    pub job: Job,
    pub direction: SwipeDirection,
    pub application_retained: bool,
}

/// In-memory deck of remaining jobs plus the history needed to undo.
///
/// The front of `stack` is the top card. After `initialize`, every `commit` moves one
/// job from `stack` to `history` and every `undo` moves one back, so their combined
/// length stays equal to the feed size.
#[derive(Clone)]
pub struct SwipeSession {
    initialized: bool,
    stack: VecDeque<Job>,
    history: Vec<SwipeEntry>,
    pending_direction: Option<SwipeDirection>,
    drag_offset: f32,
    interpreter: GestureInterpreter,
    observers: Vec<Arc<dyn SessionObserver>>,
}

impl fmt::Debug for SwipeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwipeSession")
            .field("state", &self.state())
            .field("stack", &self.stack.len())
            .field("history", &self.history.len())
            .field("pending_direction", &self.pending_direction)
            .field("drag_offset", &self.drag_offset)
            .finish_non_exhaustive()
    }
}

impl Default for SwipeSession {
    fn default() -> Self {
        Self::new(GestureInterpreter::default())
    }
}

impl SwipeSession {
    /// New session in the `Loading` state.
    pub fn new(interpreter: GestureInterpreter) -> Self {
        Self {
            initialized: false,
            stack: VecDeque::new(),
            history: Vec::new(),
            pending_direction: None,
            drag_offset: 0.0,
            interpreter,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Arc<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    /// Load the feed, discarding any previous deck and history.
    pub fn initialize(&mut self, jobs: Vec<Job>) {
        self.stack = jobs.into();
        self.history.clear();
        self.pending_direction = None;
        self.drag_offset = 0.0;
        self.initialized = true;

        debug!(size = self.stack.len(), "swipe session initialized");
        self.emit(SessionEvent::Initialized {
            size: self.stack.len(),
        });
    }

    pub fn state(&self) -> SessionState {
        if !self.initialized {
            SessionState::Loading
        } else if self.stack.is_empty() {
            SessionState::Exhausted
        } else {
            SessionState::Ready
        }
    }

    pub fn top(&self) -> Option<&Job> {
        self.stack.front()
    }

    pub fn stack(&self) -> &VecDeque<Job> {
        &self.stack
    }

    pub fn history(&self) -> &[SwipeEntry] {
        &self.history
    }

    pub fn remaining(&self) -> usize {
        self.stack.len()
    }

    /// Size of the feed the session was initialized with.
    pub fn total(&self) -> usize {
        self.stack.len() + self.history.len()
    }

    pub fn pending_direction(&self) -> Option<SwipeDirection> {
        self.pending_direction
    }

    pub fn drag_offset(&self) -> f32 {
        self.drag_offset
    }

    pub fn is_commit_in_flight(&self) -> bool {
        self.pending_direction.is_some()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn interpreter(&self) -> &GestureInterpreter {
        &self.interpreter
    }

    /// Track the pointer over the top card.
    pub fn drag(&mut self, offset_x: f32) -> Result<CardFeedback, SessionError> {
        self.ensure_swipeable()?;

        let feedback = CardFeedback::from_offset(offset_x);
        self.drag_offset = feedback.offset_x;
        let preview = self.interpreter.preview(self.drag_offset);

        if let Some(job) = self.stack.front() {
            let event = SessionEvent::Dragged {
                job_id: job.id.clone(),
                feedback,
                preview,
            };
            self.emit(event);
        }
        Ok(feedback)
    }

    /// Release the pointer: commit if the gesture crossed a threshold, otherwise snap back.
    pub fn release(&mut self, velocity_x: f32) -> Result<ReleaseOutcome, SessionError> {
        self.ensure_swipeable()?;

        let decision = self.interpreter.interpret(self.drag_offset, velocity_x);
        self.drag_offset = 0.0;

        match decision {
            GestureDecision::SnapBack => {
                if let Some(job) = self.stack.front() {
                    let event = SessionEvent::SnappedBack {
                        job_id: job.id.clone(),
                    };
                    self.emit(event);
                }
                Ok(ReleaseOutcome::SnappedBack)
            }
            GestureDecision::CommitRight => self
                .commit(SwipeDirection::Right)
                .map(ReleaseOutcome::Committed),
            GestureDecision::CommitLeft => self
                .commit(SwipeDirection::Left)
                .map(ReleaseOutcome::Committed),
        }
    }

    /// Move the top job into history. The pop and push happen together; the card's
    /// exit stays in flight until `settle`, blocking further commits.
    pub fn commit(&mut self, direction: SwipeDirection) -> Result<CommitOutcome, SessionError> {
        self.ensure_swipeable()?;

        let job = self.stack.pop_front().ok_or(SessionError::Exhausted)?;
        self.history.push(SwipeEntry {
            job: job.clone(),
            direction,
        });
        self.pending_direction = Some(direction);
        self.drag_offset = 0.0;

        let remaining = self.stack.len();
        debug!(job_id = %job.id, direction = direction.label(), remaining, "swipe committed");
        self.emit(SessionEvent::Committed {
            job_id: job.id.clone(),
            direction,
            remaining,
        });

        Ok(CommitOutcome {
            job,
            direction,
            remaining,
        })
    }

    /// Mark the exit animation of the last commit as finished.
    pub fn settle(&mut self) -> Option<SwipeDirection> {
        let settled = self.pending_direction.take();
        if let Some(direction) = settled {
            self.emit(SessionEvent::Settled { direction });
        }
        settled
    }

    /// Put the most recently swiped job back on top. Cancels an in-flight exit.
    pub fn undo(&mut self) -> Result<UndoOutcome, SessionError> {
        let SwipeEntry { job, direction } = self.history.pop().ok_or(SessionError::NothingToUndo)?;
        self.stack.push_front(job.clone());
        self.pending_direction = None;
        self.drag_offset = 0.0;

        let application_retained = direction == SwipeDirection::Right;
        debug!(job_id = %job.id, direction = direction.label(), application_retained, "swipe undone");
        self.emit(SessionEvent::Undone {
            job_id: job.id.clone(),
            direction,
            application_retained,
        });

        Ok(UndoOutcome {
            job,
            direction,
            application_retained,
        })
    }

    fn ensure_swipeable(&self) -> Result<(), SessionError> {
        match self.state() {
            SessionState::Loading => Err(SessionError::NotReady),
            SessionState::Exhausted => Err(SessionError::Exhausted),
            SessionState::Ready if self.pending_direction.is_some() => {
                Err(SessionError::CommitInFlight)
            }
            SessionState::Ready => Ok(()),
        }
    }

    fn emit(&self, event: SessionEvent) {
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }
}
