//! Species and prescription registries.
//!
//! Both registries assign dense, run-stable indices. Every per-species and
//! per-prescription array in the crate is sized from an [`IndexSpace`] taken
//! from these registries.
use crate::error::{AccountingError, Result};
use crate::types::{PrescriptionId, SpeciesId};

/// Ordered species names; position is the [`SpeciesId`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpeciesRegistry {
    names: Vec<String>,
}

impl SpeciesRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, species: SpeciesId) -> Option<&str> {
        self.names.get(species.index()).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Display names of the prescriptions defined for the run; position is the
/// [`PrescriptionId`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrescriptionRegistry {
    names: Vec<String>,
}

impl PrescriptionRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, prescription: PrescriptionId) -> Result<&str> {
        self.names
            .get(prescription.index())
            .map(String::as_str)
            .ok_or(AccountingError::PrescriptionOutOfRange {
                prescription,
                count: self.len(),
            })
    }

    /// Looks a prescription up by display name.
    pub fn find(&self, name: &str) -> Option<PrescriptionId> {
        self.names
            .iter()
            .position(|candidate| candidate == name)
            .map(|index| PrescriptionId(index as u16))
    }
}

/// Sizes of the two dense index spaces (`S` species, `P` prescriptions).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexSpace {
    pub species: usize,
    pub prescriptions: usize,
}

impl IndexSpace {
    pub fn new(species: &SpeciesRegistry, prescriptions: &PrescriptionRegistry) -> Self {
        Self {
            species: species.len(),
            prescriptions: prescriptions.len(),
        }
    }
}
