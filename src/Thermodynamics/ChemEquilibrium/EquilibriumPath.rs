//! # Equilibrium path
//!
//! Solves a sequence of equilibrium problems with the same specifications, each one starting from
//! the equilibrium state of the previous point. The requested properties of every point are
//! collected in a [`PathTable`].
//!
//! A point that fails to converge gets NaN in every column; the next point starts from the last
//! converged state.
use super::EquilibriumConditions::EquilibriumConditions;
use super::EquilibriumRestrictions::EquilibriumRestrictions;
use super::EquilibriumSolver::{EquilibriumResult, EquilibriumSolver};
use super::EquilibriumSpecs::EquilibriumError;
use crate::Thermodynamics::ChemicalProps::ChemicalProps;
use crate::Thermodynamics::ChemicalState::ChemicalState;
use log::{info, warn};
use prettytable::{Cell, Row, Table};

/// column of a path table
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, PartialEq)]
pub enum PathProperty {
    Temperature,
    Pressure,
    Volume,
    Enthalpy,
    Entropy,
    GibbsEnergy,
    InternalEnergy,
    HeatCapacity,
    pH,
    IonicStrength,
    SpeciesAmount(String),
    SpeciesActivity(String),
    SpeciesMolality(String),
    ElementAmount(String),
    PhaseAmount(String),
    SaturationIndex(String),
    TitrantAmount(String),
}

impl PathProperty {
    pub fn label(&self) -> String {
        match self {
            PathProperty::Temperature => "T, K".to_string(),
            PathProperty::Pressure => "P, Pa".to_string(),
            PathProperty::Volume => "V, m3".to_string(),
            PathProperty::Enthalpy => "H, J".to_string(),
            PathProperty::Entropy => "S, J/K".to_string(),
            PathProperty::GibbsEnergy => "G, J".to_string(),
            PathProperty::InternalEnergy => "U, J".to_string(),
            PathProperty::HeatCapacity => "Cp, J/K".to_string(),
            PathProperty::pH => "pH".to_string(),
            PathProperty::IonicStrength => "I, mol/kg".to_string(),
            PathProperty::SpeciesAmount(s) => format!("n[{}]", s),
            PathProperty::SpeciesActivity(s) => format!("a[{}]", s),
            PathProperty::SpeciesMolality(s) => format!("m[{}]", s),
            PathProperty::ElementAmount(e) => format!("b[{}]", e),
            PathProperty::PhaseAmount(p) => format!("amount[{}]", p),
            PathProperty::SaturationIndex(s) => format!("SI[{}]", s),
            PathProperty::TitrantAmount(t) => format!("q[{}]", t),
        }
    }

    fn evaluate(
        &self,
        props: &ChemicalProps,
        result: &EquilibriumResult,
    ) -> Result<f64, EquilibriumError> {
        let value = match self {
            PathProperty::Temperature => props.temperature(),
            PathProperty::Pressure => props.pressure(),
            PathProperty::Volume => props.volume(),
            PathProperty::Enthalpy => props.enthalpy(),
            PathProperty::Entropy => props.entropy(),
            PathProperty::GibbsEnergy => props.gibbs_energy(),
            PathProperty::InternalEnergy => props.internal_energy(),
            PathProperty::HeatCapacity => props.heat_capacity_cp(),
            PathProperty::pH => props.aqueous()?.pH()?,
            PathProperty::IonicStrength => props.aqueous()?.ionic_strength(),
            PathProperty::SpeciesAmount(s) => props.species_amount(s)?,
            PathProperty::SpeciesActivity(s) => props.species_activity(s)?,
            PathProperty::SpeciesMolality(s) => props.aqueous()?.species_molality(s)?,
            PathProperty::ElementAmount(e) => props.element_amount(e)?,
            PathProperty::PhaseAmount(p) => props.phase_amount(p)?,
            PathProperty::SaturationIndex(s) => props.aqueous()?.saturation_index(s)?,
            PathProperty::TitrantAmount(t) => result
                .titrant_amount(t)
                .ok_or_else(|| EquilibriumError::UnknownInput(format!("q[{}]", t)))?,
        };
        Ok(value)
    }
}

/// values of the path properties, one row per point
#[derive(Debug, Clone)]
pub struct PathTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub results: Vec<EquilibriumResult>,
}

impl PathTable {
    pub fn column(&self, label: &str) -> Option<Vec<f64>> {
        let j = self.columns.iter().position(|c| c == label)?;
        Some(self.rows.iter().map(|row| row[j]).collect())
    }

    pub fn num_failed(&self) -> usize {
        self.results.iter().filter(|r| !r.succeeded).count()
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.add_row(Row::new(self.columns.iter().map(|c| Cell::new(c)).collect()));
        for row in &self.rows {
            table.add_row(Row::new(
                row.iter().map(|v| Cell::new(&format!("{:.6e}", v))).collect(),
            ));
        }
        table
    }

    pub fn pretty_print(&self) {
        println!("___________________EQUILIBRIUM PATH________________________");
        self.to_table().printstd();
    }
}

pub struct EquilibriumPath<'s, 'a> {
    solver: &'s EquilibriumSolver<'a>,
    restrictions: Option<&'s EquilibriumRestrictions<'a>>,
    properties: Vec<PathProperty>,
}

impl<'s, 'a> EquilibriumPath<'s, 'a> {
    pub fn new(solver: &'s EquilibriumSolver<'a>, properties: Vec<PathProperty>) -> Self {
        Self {
            solver,
            restrictions: None,
            properties,
        }
    }

    pub fn with_restrictions(mut self, restrictions: &'s EquilibriumRestrictions<'a>) -> Self {
        self.restrictions = Some(restrictions);
        self
    }

    /// Solves every point in turn. The state ends at the last converged point.
    /// Setup errors (missing inputs, foreign state) abort the whole path.
    pub fn run(
        &self,
        state: &mut ChemicalState<'a>,
        points: &[EquilibriumConditions],
    ) -> Result<PathTable, EquilibriumError> {
        let mut table = PathTable {
            columns: self.properties.iter().map(|p| p.label()).collect(),
            rows: Vec::with_capacity(points.len()),
            results: Vec::with_capacity(points.len()),
        };
        for (k, conditions) in points.iter().enumerate() {
            let result = self
                .solver
                .solve_with_restrictions(state, conditions, self.restrictions)?;
            let row = if result.succeeded {
                let props = state.props()?;
                self.properties
                    .iter()
                    .map(|p| p.evaluate(&props, &result))
                    .collect::<Result<Vec<f64>, _>>()?
            } else {
                warn!("path point {} did not converge: {}", k, result.message);
                vec![f64::NAN; self.properties.len()]
            };
            table.rows.push(row);
            table.results.push(result);
        }
        info!(
            "equilibrium path: {} points, {} failed",
            points.len(),
            table.num_failed()
        );
        Ok(table)
    }

    /// `base` with its temperature replaced by each of `temperatures` (K)
    pub fn temperature_sweep(
        &self,
        state: &mut ChemicalState<'a>,
        base: &EquilibriumConditions,
        temperatures: &[f64],
    ) -> Result<PathTable, EquilibriumError> {
        self.sweep(state, base, "T", temperatures)
    }

    /// `base` with the input `input` replaced by each of `values`
    pub fn sweep(
        &self,
        state: &mut ChemicalState<'a>,
        base: &EquilibriumConditions,
        input: &str,
        values: &[f64],
    ) -> Result<PathTable, EquilibriumError> {
        let points = values
            .iter()
            .map(|v| {
                let mut conditions = base.clone();
                conditions.set(input, *v)?;
                Ok(conditions)
            })
            .collect::<Result<Vec<_>, EquilibriumError>>()?;
        self.run(state, &points)
    }
}
