//! Persistence layer for video processing requests.
//!
//! The [`VideoRequestRepository`] trait is the seam the services depend on;
//! [`PgVideoRequestRepository`] is the Postgres implementation.

pub mod postgres;
pub mod repository;

pub use postgres::{PgVideoRequestRepository, MIGRATOR};
pub use repository::VideoRequestRepository;
