// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! NextShape: daily body-metric tracking
//!
//! This crate provides the backend API that stores one progress record per
//! user per day and derives BMI, BMR, TDEE and recommended calories from it.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::ProgressStore;
use services::RecordService;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn ProgressStore>,
    pub records: RecordService,
}

impl AppState {
    pub fn new(config: Config, db: Arc<dyn ProgressStore>) -> Self {
        let records = RecordService::new(db.clone());
        Self {
            config,
            db,
            records,
        }
    }
}
