// src/tracking/mod.rs

mod assigner;
mod framing;
mod tracker;
mod types;
mod validator;

// Re-export public APIs
pub use assigner::{AssignerConfig, IdentityAssigner};
pub use framing::FrameAggregator;
pub use tracker::{TrackMaintainer, TrackUpdate, TrackerConfig};
pub use types::{FencerId, TrackedFencer, TrackingSession, ValidationResult};
pub use validator::{iou, GuardLineValidator};
