// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod geocode;
pub mod media;
pub mod password;
pub mod tokens;

pub use geocode::GeocodeClient;
pub use media::MediaStore;
pub use password::PasswordHasher;
pub use tokens::{AccessClaims, RefreshClaims, TokenError, TokenIssuer};
