use std::fmt;

/// A named slot in a manifest template, written `${NAME}`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Placeholder {
    DeploymentName,
    User,
    Tag,
    Replicas,
    ContainerImage,
    ContainerName,
    Cpus,
    MemoryG,
    Username,
    Password,
    Cluster,
    Namespace,
}

impl Placeholder {
    pub const ALL: [Self; 12] = [
        Self::DeploymentName,
        Self::User,
        Self::Tag,
        Self::Replicas,
        Self::ContainerImage,
        Self::ContainerName,
        Self::Cpus,
        Self::MemoryG,
        Self::Username,
        Self::Password,
        Self::Cluster,
        Self::Namespace,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DeploymentName => "DEPLOYMENTNAME",
            Self::User => "USER",
            Self::Tag => "TAG",
            Self::Replicas => "REPLICAS",
            Self::ContainerImage => "CONTAINERIMAGE",
            Self::ContainerName => "CONTAINERNAME",
            Self::Cpus => "CPUS",
            Self::MemoryG => "MEMORYG",
            Self::Username => "USERNAME",
            Self::Password => "PASSWORD",
            Self::Cluster => "CLUSTER",
            Self::Namespace => "NAMESPACE",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|placeholder| placeholder.name() == name)
    }

    /// The kind of value this placeholder accepts.
    #[must_use]
    pub const fn expected_kind(self) -> ValueKind {
        match self {
            Self::Replicas => ValueKind::Count,
            Self::Cpus => ValueKind::Cpu,
            Self::MemoryG => ValueKind::Memory,
            _ => ValueKind::Text,
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}


#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueKind {
    Text,
    Count,
    Cpu,
    Memory,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let val = match self {
            Self::Text => "text",
            Self::Count => "non-negative integer",
            Self::Cpu => "CPU quantity",
            Self::Memory => "memory quantity in GB",
        };
        f.write_str(val)
    }
}
