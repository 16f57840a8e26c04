//! Infrastructure layer: the authoritative store, its line codec, file
//! persistence, cross-entity coordination and configuration.

pub mod codec;
pub mod config;
pub mod coordinator;
pub mod persistence;
pub mod store;

pub use codec::{DecodeError, LineCodec};
pub use config::StoreConfig;
pub use coordinator::{IntegrityCoordinator, Registrant, Registration};
pub use persistence::{DataFiles, LoadReport, SkippedLine};
pub use store::{ConservationViolation, EntityStore};
