//! # Aqueous properties
//!
//! pH, ionic strength, molalities and saturation indices of the aqueous phase of a chemical
//! properties snapshot.
//!
//! Saturation indices use element potentials y (per RT) fitted to the aqueous species present in the
//! solution, mu_k / RT = sum_e A_ek y_e, by least squares. For any mineral or gas k (in the system or
//! not) the saturation index is
//!
//! SI_k = (sum_e A_ek y_e - G0_k / RT) / ln(10)
//!
//! which is log10 of the ratio of the reaction quotient to the equilibrium constant of the dissolution
//! reaction of k into the aqueous species. A species containing an element that no aqueous species
//! present carries has a zero reaction quotient and SI = -inf.
use super::ActivityModels::WATER_MOLAR_MASS;
use super::ChemicalProps::ChemicalProps;
use super::ChemicalSystem::SystemError;
use super::DBhandlers::Species::Species;
use super::DBhandlers::thermo_api::R;
use log::warn;
use nalgebra::{DMatrix, DVector};
use prettytable::{Table, row};
use std::f64::consts::LN_10;
use std::ops::Range;

const SVD_EPS: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct AqueousProps<'p> {
    props: &'p ChemicalProps<'p>,
    range: Range<usize>,
    solvent: usize,
    molalities: Vec<f64>,
    ionic_strength: f64,
    element_potentials: DVector<f64>,
    /// elements without any aqueous species present
    missing_elements: Vec<bool>,
}

impl<'p> AqueousProps<'p> {
    pub fn new(props: &'p ChemicalProps<'p>) -> Result<Self, SystemError> {
        let system = props.system();
        let k = system.aqueous_phase().ok_or(SystemError::NoAqueousPhase)?;
        let phase = &system.phases()[k];
        let range = phase.species_range.clone();
        let solvent = range.start + phase.model.solvent().ok_or(SystemError::NoAqueousPhase)?;
        let n = props.species_amounts();
        let kg_water = n[solvent] * WATER_MOLAR_MASS;
        if kg_water <= 0.0 {
            return Err(SystemError::InvalidValue {
                what: "amount of solvent water".to_string(),
                value: n[solvent],
            });
        }
        let molalities: Vec<f64> = range
            .clone()
            .map(|i| if i == solvent { 0.0 } else { n[i] / kg_water })
            .collect();
        let ionic_strength = 0.5
            * range
                .clone()
                .zip(molalities.iter())
                .map(|(i, m)| {
                    let z = system.species()[i].charge();
                    z * z * m
                })
                .sum::<f64>();

        // mu/RT = A^T y over aqueous species with finite activities
        let rt = R * props.temperature();
        let mu = props.chemical_potentials();
        let present: Vec<usize> = range.clone().filter(|&i| n[i] > 0.0).collect();
        let a = system.formula_matrix();
        let nc = system.num_components();
        let mut m = DMatrix::zeros(present.len(), nc);
        let mut rhs = DVector::zeros(present.len());
        for (row, &i) in present.iter().enumerate() {
            for c in 0..nc {
                m[(row, c)] = a[(c, i)];
            }
            rhs[row] = mu[i] / rt;
        }
        let missing_elements: Vec<bool> = (0..nc)
            .map(|c| c < system.num_elements() && present.iter().all(|&i| a[(c, i)] == 0.0))
            .collect();
        let element_potentials = if present.is_empty() {
            warn!("aqueous phase is empty, element potentials set to zero");
            DVector::zeros(nc)
        } else {
            m.svd(true, true)
                .solve(&rhs, SVD_EPS)
                .map_err(|e| SystemError::InvalidValue {
                    what: format!("element potentials ({})", e),
                    value: f64::NAN,
                })?
        };
        Ok(Self {
            props,
            range,
            solvent,
            molalities,
            ionic_strength,
            element_potentials,
            missing_elements,
        })
    }

    #[allow(non_snake_case)]
    pub fn pH(&self) -> Result<f64, SystemError> {
        Ok(-self.props.species_ln_activity("H+")? / LN_10)
    }

    /// mol/kg
    pub fn ionic_strength(&self) -> f64 {
        self.ionic_strength
    }

    /// kg of solvent water
    pub fn solvent_mass(&self) -> f64 {
        self.props.species_amounts()[self.solvent] * WATER_MOLAR_MASS
    }

    /// (species, mol/kg) for every solute
    pub fn molalities(&self) -> Vec<(&str, f64)> {
        let species = self.props.system().species();
        self.range
            .clone()
            .zip(self.molalities.iter())
            .filter(|(i, _)| *i != self.solvent)
            .map(|(i, m)| (species[i].name(), *m))
            .collect()
    }

    pub fn species_molality(&self, name: &str) -> Result<f64, SystemError> {
        let i = self.props.system().species_index(name)?;
        if !self.range.contains(&i) || i == self.solvent {
            return Err(SystemError::SpeciesNotFound(name.to_string()));
        }
        Ok(self.molalities[i - self.range.start])
    }

    /// total molality of an element over the solutes, mol/kg
    pub fn element_molality(&self, element: &str) -> Result<f64, SystemError> {
        let system = self.props.system();
        let row = system.element_index(element)?;
        let a = system.formula_matrix();
        Ok(self
            .range
            .clone()
            .zip(self.molalities.iter())
            .map(|(i, m)| a[(row, i)] * m)
            .sum())
    }

    /// element and charge potentials per RT in the order of the formula matrix rows
    pub fn element_potentials(&self) -> &DVector<f64> {
        &self.element_potentials
    }

    /// saturation index of any species of the database
    pub fn saturation_index_of(&self, species: &Species) -> Result<f64, SystemError> {
        let t = self.props.temperature();
        let p = self.props.pressure();
        let column = self.props.system().formula_vector(species)?;
        if column
            .iter()
            .zip(&self.missing_elements)
            .any(|(coef, missing)| *missing && *coef != 0.0)
        {
            return Ok(f64::NEG_INFINITY);
        }
        let g0 = species.standard_props(t, p)?.G0;
        Ok((column.dot(&self.element_potentials) - g0 / (R * t)) / LN_10)
    }

    /// saturation index of a species of the system
    pub fn saturation_index(&self, name: &str) -> Result<f64, SystemError> {
        let system = self.props.system();
        let i = system.species_index(name)?;
        self.saturation_index_of(&system.species()[i])
    }

    /// saturation indices of all species outside the aqueous phase
    pub fn saturation_indices(&self) -> Result<Vec<(String, f64)>, SystemError> {
        let system = self.props.system();
        system
            .species()
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.range.contains(i))
            .map(|(_, s)| Ok((s.name().to_string(), self.saturation_index_of(s)?)))
            .collect()
    }

    pub fn pretty_print(&self) {
        println!("___________________AQUEOUS PROPERTIES________________________");
        let mut table = Table::new();
        table.add_row(row!["Property", "Value", "Unit"]);
        if let Ok(ph) = self.pH() {
            table.add_row(row!["pH", format!("{:.4}", ph), "-"]);
        }
        table.add_row(row!["Ionic strength", format!("{:.6e}", self.ionic_strength), "mol/kg"]);
        table.add_row(row!["Solvent mass", format!("{:.6e}", self.solvent_mass()), "kg"]);
        for element in self.props.system().elements() {
            if let Ok(m) = self.element_molality(element) {
                table.add_row(row![format!("Element molality {}", element), format!("{:.6e}", m), "mol/kg"]);
            }
        }
        table.printstd();
        let mut si = Table::new();
        si.add_row(row!["Species", "Molality, mol/kg", "Saturation index"]);
        for (name, m) in self.molalities() {
            si.add_row(row![name, format!("{:.6e}", m), "-"]);
        }
        match self.saturation_indices() {
            Ok(indices) => {
                for (name, value) in indices {
                    si.add_row(row![name, "-", format!("{:.4}", value)]);
                }
            }
            Err(e) => warn!("saturation indices unavailable: {}", e),
        }
        si.printstd();
    }
}
