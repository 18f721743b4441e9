//! Standard AWS-flavoured drivers for the Harp runtime
//!
//! Each resource kind is an `AwsDriver` table entry: provider operation
//! names, the response field carrying the assigned id, and an alias table
//! isolating EC2 vocabulary from declaration vocabulary. The wire protocol
//! lives behind the `ProviderApi` trait supplied by the embedder.

pub mod driver;
pub mod resources;

// Re-exports
pub use driver::AwsDriver;
pub use resources::{
    compute_instance, elastic_ip, internet_gateway, security_group, standard_registry, vpc,
    vpc_gateway_attachment, volume,
};
