//! Standard resource kind catalog
//!
//! Alias tables map declaration vocabulary to EC2 request vocabulary, one
//! direction only. `keeps` names the response fields captured into a node's
//! output map alongside the assigned id.

use crate::driver::AwsDriver;
use harp_cloud::{DriverRegistry, Result};
use std::sync::Arc;

pub fn vpc() -> AwsDriver {
    AwsDriver {
        kind: "Std::Vpc",
        id_prefix: "vpc-",
        create_op: "CreateVpc",
        destroy_op: "DeleteVpc",
        id_field: Some("VpcId"),
        destroy_id_field: Some("VpcId"),
        aliases: &[
            ("cidr_block", "CidrBlock"),
            ("instance_tenancy", "InstanceTenancy"),
        ],
        keeps: &[("CidrBlock", "cidr_block"), ("State", "state")],
    }
}

pub fn internet_gateway() -> AwsDriver {
    AwsDriver {
        kind: "Std::InternetGateway",
        id_prefix: "igw-",
        create_op: "CreateInternetGateway",
        destroy_op: "DeleteInternetGateway",
        id_field: Some("InternetGatewayId"),
        destroy_id_field: Some("InternetGatewayId"),
        aliases: &[],
        keeps: &[],
    }
}

/// Attachments carry no provider id of their own; the driver derives a
/// synthetic one and detaches using the recorded vpc/gateway ids.
pub fn vpc_gateway_attachment() -> AwsDriver {
    AwsDriver {
        kind: "Std::VpcGatewayAttachment",
        id_prefix: "attach-",
        create_op: "AttachInternetGateway",
        destroy_op: "DetachInternetGateway",
        id_field: None,
        destroy_id_field: None,
        aliases: &[
            ("vpc_id", "VpcId"),
            ("internet_gateway_id", "InternetGatewayId"),
        ],
        keeps: &[],
    }
}

pub fn compute_instance() -> AwsDriver {
    AwsDriver {
        kind: "Std::ComputeInstance",
        id_prefix: "i-",
        create_op: "RunInstances",
        destroy_op: "TerminateInstances",
        id_field: Some("InstanceId"),
        destroy_id_field: Some("InstanceId"),
        aliases: &[
            ("image_id", "ImageId"),
            ("instance_type", "InstanceType"),
            ("key_name", "KeyName"),
            ("user_data", "UserData"),
            ("security_groups", "SecurityGroups"),
            ("availability_zone", "AvailabilityZone"),
            ("subnet_id", "SubnetId"),
        ],
        keeps: &[
            ("PrivateIpAddress", "private_ip"),
            ("PublicIpAddress", "public_ip"),
            ("State", "state"),
        ],
    }
}

pub fn elastic_ip() -> AwsDriver {
    AwsDriver {
        kind: "Std::ElasticIP",
        id_prefix: "eipalloc-",
        create_op: "AllocateAddress",
        destroy_op: "ReleaseAddress",
        id_field: Some("AllocationId"),
        destroy_id_field: Some("AllocationId"),
        aliases: &[("domain", "Domain")],
        keeps: &[("PublicIp", "public_ip")],
    }
}

pub fn security_group() -> AwsDriver {
    AwsDriver {
        kind: "Std::SecurityGroup",
        id_prefix: "sg-",
        create_op: "CreateSecurityGroup",
        destroy_op: "DeleteSecurityGroup",
        id_field: Some("GroupId"),
        destroy_id_field: Some("GroupId"),
        aliases: &[
            ("name", "GroupName"),
            ("description", "GroupDescription"),
            ("vpc_id", "VpcId"),
        ],
        keeps: &[],
    }
}

pub fn volume() -> AwsDriver {
    AwsDriver {
        kind: "Std::Volume",
        id_prefix: "vol-",
        create_op: "CreateVolume",
        destroy_op: "DeleteVolume",
        id_field: Some("VolumeId"),
        destroy_id_field: Some("VolumeId"),
        aliases: &[
            ("size", "Size"),
            ("availability_zone", "AvailabilityZone"),
            ("volume_type", "VolumeType"),
        ],
        keeps: &[("Size", "size"), ("AvailabilityZone", "availability_zone")],
    }
}

/// Registry with the full standard driver set. Duplicate kinds are a
/// startup configuration error surfaced to the embedder.
pub fn standard_registry() -> Result<DriverRegistry> {
    let mut registry = DriverRegistry::new();
    registry.register(Arc::new(vpc()))?;
    registry.register(Arc::new(internet_gateway()))?;
    registry.register(Arc::new(vpc_gateway_attachment()))?;
    registry.register(Arc::new(compute_instance()))?;
    registry.register(Arc::new(elastic_ip()))?;
    registry.register(Arc::new(security_group()))?;
    registry.register(Arc::new(volume()))?;
    Ok(registry)
}
