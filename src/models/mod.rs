// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod record;
pub mod user;

pub use record::{ActivityLevel, Goal, NewProgressRecord, ParseChoiceError, ProgressRecord, Sex};
pub use user::User;
