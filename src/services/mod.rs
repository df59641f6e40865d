// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod calculator;
pub mod records;
pub mod validation;

pub use calculator::MetabolicResult;
pub use records::RecordService;
