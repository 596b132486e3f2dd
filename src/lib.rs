// SPDX-License-Identifier: MIT

//! Voltcast API: backend for the Voltcast renewable energy forecasting site.
//!
//! This crate provides account registration, login/logout with access and
//! refresh token issuance, the verification middleware in front of protected
//! routes, and the small supporting surface (geocoding passthrough, media
//! upload handoff).

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;
use services::{GeocodeClient, MediaStore, PasswordHasher, TokenIssuer};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub hasher: PasswordHasher,
    pub tokens: TokenIssuer,
    pub geocode: GeocodeClient,
    pub media: MediaStore,
}

impl AppState {
    /// Wire up all services from a loaded config and a database handle.
    pub fn new(config: Config, db: FirestoreDb) -> Self {
        let hasher = PasswordHasher::new(config.bcrypt_cost);
        let tokens = TokenIssuer::new(&config);
        let geocode = GeocodeClient::new(config.geocode_base_url.clone());
        let media = MediaStore::new(&config.upload_dir, &config.public_base_url);
        Self {
            config,
            db,
            hasher,
            tokens,
            geocode,
            media,
        }
    }
}
