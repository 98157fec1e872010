//! # Chemical system
//!
//! Ordered phases, each with its ordered species and activity model. The system derives the list of
//! elements (alphabetical) and the formula matrix A with rows = elements + electric charge ("Z") and
//! columns = species, so that b = A n gives element amounts and the charge of a composition n.
//! The system is immutable once constructed.
use super::ActivityModels::{ActivityEnum, ActivityError, ActivityModel, ActivityModelKind};
use super::DBhandlers::Database::{Database, DatabaseError};
use super::DBhandlers::Species::{AggregateState, Species};
use super::DBhandlers::thermo_api::ThermoError;
use log::info;
use nalgebra::{DMatrix, DVector};
use prettytable::{Cell, Row, Table};
use std::collections::{BTreeSet, HashMap};
use std::ops::Range;
use thiserror::Error;

/// row name of the electric charge in the formula matrix
pub const CHARGE_ROW: &str = "Z";

#[derive(Debug, Error)]
pub enum SystemError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("phase '{phase}': {source}")]
    Activity {
        phase: String,
        source: ActivityError,
    },
    #[error(transparent)]
    Thermo(#[from] ThermoError),
    #[error("phase '{0}' has no species")]
    EmptyPhase(String),
    #[error("species '{0}' appears in more than one phase")]
    DuplicateSpecies(String),
    #[error("phase name '{0}' is used twice")]
    DuplicatePhase(String),
    #[error("species '{0}' is not in the chemical system")]
    SpeciesNotFound(String),
    #[error("phase '{0}' is not in the chemical system")]
    PhaseNotFound(String),
    #[error("element '{0}' is not in the chemical system")]
    ElementNotFound(String),
    #[error("unknown unit '{0}'")]
    UnknownUnit(String),
    #[error("invalid value {value} of {what}")]
    InvalidValue { what: String, value: f64 },
    #[error("the chemical system has no aqueous phase")]
    NoAqueousPhase,
    #[error("species '{0}' is not a gas")]
    NotAGas(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    Aqueous,
    Gaseous,
    Liquid,
    SolidSolution,
    /// pure condensed phase of one species
    Mineral,
}

impl PhaseKind {
    pub fn default_model(&self) -> ActivityModelKind {
        match self {
            PhaseKind::Aqueous => ActivityModelKind::AqueousIdeal,
            PhaseKind::Gaseous => ActivityModelKind::IdealGas,
            PhaseKind::Liquid | PhaseKind::SolidSolution => ActivityModelKind::IdealSolution,
            PhaseKind::Mineral => ActivityModelKind::Pure,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Selection {
    Names(Vec<String>),
    Elements(Vec<String>),
}

/// description of a phase: its species (by name or by elements) and activity model
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSpec {
    pub name: String,
    pub kind: PhaseKind,
    selection: Selection,
    pub model: Option<ActivityModelKind>,
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl PhaseSpec {
    pub fn new(name: &str, kind: PhaseKind, species: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            kind,
            selection: Selection::Names(to_strings(species)),
            model: None,
        }
    }
    pub fn aqueous(species: &[&str]) -> Self {
        Self::new("AqueousPhase", PhaseKind::Aqueous, species)
    }
    /// all aqueous species of the database made of these elements
    pub fn aqueous_with_elements(elements: &[&str]) -> Self {
        Self {
            name: "AqueousPhase".to_string(),
            kind: PhaseKind::Aqueous,
            selection: Selection::Elements(to_strings(elements)),
            model: None,
        }
    }
    pub fn gaseous(species: &[&str]) -> Self {
        Self::new("GaseousPhase", PhaseKind::Gaseous, species)
    }
    /// all gases of the database made of these elements
    pub fn gaseous_with_elements(elements: &[&str]) -> Self {
        Self {
            name: "GaseousPhase".to_string(),
            kind: PhaseKind::Gaseous,
            selection: Selection::Elements(to_strings(elements)),
            model: None,
        }
    }
    pub fn liquid(name: &str, species: &[&str]) -> Self {
        Self::new(name, PhaseKind::Liquid, species)
    }
    pub fn solid_solution(name: &str, species: &[&str]) -> Self {
        Self::new(name, PhaseKind::SolidSolution, species)
    }
    /// pure phase named after its only species
    pub fn mineral(species: &str) -> Self {
        Self::new(species, PhaseKind::Mineral, &[species])
    }
    /// one pure phase per species
    pub fn minerals(species: &[&str]) -> Vec<Self> {
        species.iter().map(|s| Self::mineral(s)).collect()
    }
    pub fn with_model(mut self, model: ActivityModelKind) -> Self {
        self.model = Some(model);
        self
    }
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    fn select(&self, db: &Database) -> Result<Vec<Species>, SystemError> {
        match &self.selection {
            Selection::Names(names) => {
                let names: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
                Ok(db.species_list(&names)?)
            }
            Selection::Elements(elements) => {
                let elements: Vec<&str> = elements.iter().map(|s| s.as_str()).collect();
                let state = match self.kind {
                    PhaseKind::Aqueous => Some(AggregateState::Aqueous),
                    PhaseKind::Gaseous => Some(AggregateState::Gas),
                    PhaseKind::Liquid => Some(AggregateState::Liquid),
                    PhaseKind::SolidSolution | PhaseKind::Mineral => Some(AggregateState::Solid),
                };
                Ok(db.species_with_elements(&elements, state)?)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Phase {
    pub name: String,
    pub kind: PhaseKind,
    /// positions of the phase species in the system
    pub species_range: Range<usize>,
    pub model: ActivityEnum,
}

#[derive(Debug, Clone)]
pub struct ChemicalSystem {
    species: Vec<Species>,
    phases: Vec<Phase>,
    phase_of_species: Vec<usize>,
    elements: Vec<String>,
    formula_matrix: DMatrix<f64>,
    species_index: HashMap<String, usize>,
}

impl ChemicalSystem {
    pub fn new(db: &Database, phase_specs: Vec<PhaseSpec>) -> Result<Self, SystemError> {
        let mut species: Vec<Species> = Vec::new();
        let mut phases: Vec<Phase> = Vec::new();
        let mut phase_of_species = Vec::new();
        let mut species_index = HashMap::new();
        for spec in phase_specs {
            if phases.iter().any(|p| p.name == spec.name) {
                return Err(SystemError::DuplicatePhase(spec.name));
            }
            let selected = spec.select(db)?;
            if selected.is_empty() {
                return Err(SystemError::EmptyPhase(spec.name));
            }
            let model_kind = spec.model.clone().unwrap_or(spec.kind.default_model());
            let model = model_kind
                .build(&selected)
                .map_err(|e| SystemError::Activity {
                    phase: spec.name.clone(),
                    source: e,
                })?;
            let start = species.len();
            for s in selected {
                if species_index.contains_key(s.name()) {
                    return Err(SystemError::DuplicateSpecies(s.name().to_string()));
                }
                species_index.insert(s.name().to_string(), species.len());
                phase_of_species.push(phases.len());
                species.push(s);
            }
            phases.push(Phase {
                name: spec.name,
                kind: spec.kind,
                species_range: start..species.len(),
                model,
            });
        }
        let elements: Vec<String> = species
            .iter()
            .flat_map(|s| s.elements().keys().cloned())
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect();
        let mut formula_matrix = DMatrix::zeros(elements.len() + 1, species.len());
        for (j, s) in species.iter().enumerate() {
            for (i, element) in elements.iter().enumerate() {
                formula_matrix[(i, j)] = s.element_coefficient(element);
            }
            formula_matrix[(elements.len(), j)] = s.charge();
        }
        info!(
            "chemical system: {} phases, {} species, elements {:?}",
            phases.len(),
            species.len(),
            elements
        );
        Ok(Self {
            species,
            phases,
            phase_of_species,
            elements,
            formula_matrix,
            species_index,
        })
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }
    pub fn species_names(&self) -> Vec<&str> {
        self.species.iter().map(|s| s.name()).collect()
    }
    pub fn num_species(&self) -> usize {
        self.species.len()
    }
    pub fn species_index(&self, name: &str) -> Result<usize, SystemError> {
        self.species_index
            .get(name)
            .copied()
            .ok_or_else(|| SystemError::SpeciesNotFound(name.to_string()))
    }
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }
    pub fn phase_index(&self, name: &str) -> Result<usize, SystemError> {
        self.phases
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| SystemError::PhaseNotFound(name.to_string()))
    }
    /// phase containing the species at position i
    pub fn phase_of_species(&self, i: usize) -> usize {
        self.phase_of_species[i]
    }
    pub fn aqueous_phase(&self) -> Option<usize> {
        self.phases.iter().position(|p| p.kind == PhaseKind::Aqueous)
    }
    pub fn elements(&self) -> &[String] {
        &self.elements
    }
    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }
    /// elements + charge
    pub fn num_components(&self) -> usize {
        self.elements.len() + 1
    }
    /// row of the element in the formula matrix; "Z" is the charge row
    pub fn element_index(&self, element: &str) -> Result<usize, SystemError> {
        if element == CHARGE_ROW {
            return Ok(self.elements.len());
        }
        self.elements
            .iter()
            .position(|e| e == element)
            .ok_or_else(|| SystemError::ElementNotFound(element.to_string()))
    }
    pub fn formula_matrix(&self) -> &DMatrix<f64> {
        &self.formula_matrix
    }
    /// elements and charge of any species (in the system or not) as a column of the formula matrix
    pub fn formula_vector(&self, species: &Species) -> Result<DVector<f64>, SystemError> {
        let mut column = DVector::zeros(self.num_components());
        for (element, count) in species.elements() {
            column[self.element_index(element)?] = *count;
        }
        column[self.elements.len()] = species.charge();
        Ok(column)
    }
    /// b = A n
    pub fn element_amounts(&self, n: &[f64]) -> DVector<f64> {
        &self.formula_matrix * DVector::from_column_slice(n)
    }

    pub fn print_formula_matrix(&self) {
        let mut table = Table::new();
        let mut header = vec![Cell::new("")];
        header.extend(self.species.iter().map(|s| Cell::new(s.name())));
        table.add_row(Row::new(header));
        let row_names = self
            .elements
            .iter()
            .map(|e| e.as_str())
            .chain(std::iter::once(CHARGE_ROW));
        for (i, name) in row_names.enumerate() {
            let mut row = vec![Cell::new(name)];
            row.extend(
                (0..self.species.len()).map(|j| Cell::new(&self.formula_matrix[(i, j)].to_string())),
            );
            table.add_row(Row::new(row));
        }
        println!("___________________ELEMENT COMPOSITION MATRIX________________________");
        table.printstd();
    }

    pub fn print_phases(&self) {
        let mut table = Table::new();
        table.add_row(Row::new(vec![
            Cell::new("Phase"),
            Cell::new("Activity model"),
            Cell::new("Species"),
        ]));
        for phase in &self.phases {
            let names: Vec<&str> = self.species[phase.species_range.clone()]
                .iter()
                .map(|s| s.name())
                .collect();
            table.add_row(Row::new(vec![
                Cell::new(&phase.name),
                Cell::new(phase.model.model_name()),
                Cell::new(&names.join(", ")),
            ]));
        }
        println!("___________________PHASES________________________");
        table.printstd();
    }
}
