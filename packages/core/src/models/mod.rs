//! Data Models
//!
//! - [`node`] - Study hierarchy nodes and materialized path helpers
//! - [`session`] - Practice sessions and topic summaries
//! - [`fitness`] - Profiles, weight log and workouts

pub mod fitness;
pub mod node;
pub mod session;

pub use fitness::{
    clamp_limit, NewWorkout, Profile, ProfileUpdate, ProfileUpdateOutcome, WeightEntry, Workout,
    DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT,
};
pub use node::{
    decode_path, encode_path, normalize_path, parse_path_param, Node, NodeWithChildren,
    ValidationError,
};
pub use session::{NewSession, SessionRecord, TopicSummary};
