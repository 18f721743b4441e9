//! Harp cloud driver abstraction
//!
//! This crate provides the seam between the lifecycle engine and cloud
//! providers: the request context, the `ResourceDriver` trait and its
//! registry, and the `CloudMutator` dispatch layer that resolves attribute
//! references and normalizes provider results.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              harp-runtime engine              │
//! └─────────────────┬────────────────────────────┘
//!                   │ create/destroy per node
//! ┌─────────────────▼────────────────────────────┐
//! │                harp-cloud                     │
//! │  ┌────────────────────────────────────────┐  │
//! │  │ CloudMutator: resolve refs, dispatch,   │  │
//! │  │ normalize, timeout, mock synthesis      │  │
//! │  └────────────────────────────────────────┘  │
//! │  ┌────────────────────────────────────────┐  │
//! │  │ DriverRegistry: kind → ResourceDriver   │  │
//! │  └────────────────────────────────────────┘  │
//! └───────┬──────────────────────────────────────┘
//!         │
//! ┌───────▼────────┐
//! │ harp-cloud-aws │  drivers + alias tables
//! └────────────────┘
//! ```

pub mod context;
pub mod driver;
pub mod error;
pub mod mutator;

// Re-exports
pub use context::{
    CredentialProfiles, Credentials, ProviderFamily, RequestContext, ResumeMode,
    DEFAULT_CALL_TIMEOUT,
};
pub use driver::{
    to_provider_params, DestroyStatus, DriverOutput, DriverRegistry, ProviderApi, ResourceDriver,
    HARP_NAMESPACE,
};
pub use error::{CloudError, Result};
pub use mutator::{CloudMutator, NodeResult, ProducedOutputs};
