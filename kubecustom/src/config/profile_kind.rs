use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// The closed set of compute configurations kubecustom knows how to deploy.
/// Each kind ships its own deployment and secret templates.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileKind {
    QcaPsi4,
    QcaXtb,
    QcaAni,
    QcaOpenmm,
}

impl ProfileKind {
    pub const ALL: [Self; 4] = [Self::QcaPsi4, Self::QcaXtb, Self::QcaAni, Self::QcaOpenmm];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QcaPsi4 => "qca-psi4",
            Self::QcaXtb => "qca-xtb",
            Self::QcaAni => "qca-ani",
            Self::QcaOpenmm => "qca-openmm",
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ProfileKind {
    type Err = ParseProfileKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ParseProfileKindError::Invalid { value: value.to_string() })
    }
}

#[derive(Debug, Snafu)]
pub enum ParseProfileKindError {
    #[snafu(display(
        "'{value}' is not a supported configuration, expected one of qca-psi4, qca-xtb, qca-ani, \
         qca-openmm"
    ))]
    Invalid { value: String },
}
