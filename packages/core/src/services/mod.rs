//! Business Services
//!
//! This module contains the business logic services:
//!
//! - `NodeService` - study hierarchy: create, browse, notes, mastery
//! - `SessionService` - practice sessions and per-topic summaries
//! - `FitnessService` - profile, weight log and workouts
//!
//! Services coordinate between the database layer and the HTTP handlers,
//! implementing business rules and mapping failures onto [`ServiceError`].

pub mod error;
pub mod fitness_service;
pub mod node_service;
pub mod session_aggregator;
pub mod session_service;

pub use error::{ServiceError, ServiceResult};
pub use fitness_service::FitnessService;
pub use node_service::NodeService;
pub use session_aggregator::summarize_sessions;
pub use session_service::SessionService;
