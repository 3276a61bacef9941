//! Change model for planning runs.
//!
//! This module models the computed deltas of a planning run and renders
//! them for presentation: one [`ChangeStep`] per resource, an ordered
//! [`ChangeOrder`] of steps, and the read-only [`Changes`] view adding
//! project and stack context.

mod action;
mod change;
mod order;
mod changes;

pub use action::ActionType;
pub use change::{
    ChangeStep, ChangeStepFilterFunc, create_change_step_filter, delete_change_step_filter,
    un_change_change_step_filter, update_change_step_filter,
};
pub use order::ChangeOrder;
pub use changes::{ChangeDocument, Changes};
