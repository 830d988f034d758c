//! Actionguard - Admin Action Rate Limiter
//!
//! This crate implements an escalating rate limiter and lockout guard for
//! sensitive administrative operations (login attempts, privilege changes,
//! bulk data exports). Repeated threshold breaches lock an actor out for
//! exponentially longer intervals, and every refusal is recorded in an
//! append-only violation ledger for audit review.

pub mod clock;
pub mod config;
pub mod error;
pub mod guard;
pub mod ledger;
