//! Homework lifecycle states and the rules for moving between them.
//!
//! An item is either `Active` (in the worklist) or `Archived` (completed).
//! Both states are reachable from each other; removal is the only terminal
//! step and is allowed from either state, so it is not modelled here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::homework::{Homework, HomeworkPatch};

/// Where a homework item currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HomeworkState {
  Active,
  Archived,
}

/// A state-changing action requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Transition {
  Complete,
  Restore,
}

impl Transition {
  pub fn target(self) -> HomeworkState {
    match self {
      Self::Complete => HomeworkState::Archived,
      Self::Restore => HomeworkState::Active,
    }
  }
}

/// What the store has to do to carry out a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
  Apply(HomeworkPatch),
  /// Already in the target state; nothing is written.
  Unchanged,
}

/// Decide how `transition` applies to `hw`.
///
/// Repeating a transition is a no-op, so completing an archived item keeps
/// its original `completed_at`.
pub fn plan(hw: &Homework, transition: Transition, now: DateTime<Utc>) -> Step {
  if hw.state() == transition.target() {
    return Step::Unchanged;
  }
  match transition {
    Transition::Complete => Step::Apply(HomeworkPatch::complete(now)),
    Transition::Restore => Step::Apply(HomeworkPatch::restore()),
  }
}
