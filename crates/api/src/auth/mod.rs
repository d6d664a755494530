//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- JWT access-token generation and validation.
//! - [`accounts`] -- whether a token's subject still exists.

pub mod accounts;
pub mod jwt;
pub mod password;
