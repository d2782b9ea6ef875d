//! Index registration, mapping generation and provisioning

pub mod manager;
pub mod mapping;
pub mod pipeline;
pub mod projector;
pub mod registry;

pub use manager::{IndexManager, IndexState, PollSettings, SemanticPipeline};
pub use projector::{JsonProjector, Projector};
pub use registry::{IndexRegistration, IndexRegistry, IndexRegistryBuilder};
