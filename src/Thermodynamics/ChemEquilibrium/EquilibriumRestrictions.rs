//! Species that do not take part in the equilibrium calculation. Their amounts stay as in the
//! initial state and their elements are removed from the mass balance.
use super::EquilibriumSpecs::EquilibriumError;
use crate::Thermodynamics::ChemicalSystem::ChemicalSystem;

#[derive(Debug, Clone)]
pub struct EquilibriumRestrictions<'a> {
    system: &'a ChemicalSystem,
    inert: Vec<bool>,
}

impl<'a> EquilibriumRestrictions<'a> {
    pub fn new(system: &'a ChemicalSystem) -> Self {
        Self {
            system,
            inert: vec![false; system.num_species()],
        }
    }

    pub fn cannot_react(&mut self, species: &str) -> Result<(), EquilibriumError> {
        let i = self.system.species_index(species)?;
        self.inert[i] = true;
        Ok(())
    }

    /// all species of the phase
    pub fn cannot_react_phase(&mut self, phase: &str) -> Result<(), EquilibriumError> {
        let k = self.system.phase_index(phase)?;
        for i in self.system.phases()[k].species_range.clone() {
            self.inert[i] = true;
        }
        Ok(())
    }

    pub fn can_react(&mut self, species: &str) -> Result<(), EquilibriumError> {
        let i = self.system.species_index(species)?;
        self.inert[i] = false;
        Ok(())
    }

    pub fn is_inert(&self, i: usize) -> bool {
        self.inert[i]
    }

    pub fn inert_species(&self) -> Vec<&str> {
        self.system
            .species()
            .iter()
            .zip(self.inert.iter())
            .filter(|(_, inert)| **inert)
            .map(|(s, _)| s.name())
            .collect()
    }

    pub(crate) fn system(&self) -> &'a ChemicalSystem {
        self.system
    }
}
