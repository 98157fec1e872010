//! # Equilibrium specifications
//!
//! Which properties of the equilibrium state are prescribed. Temperature and pressure are inputs when
//! `temperature()`/`pressure()` are called, otherwise they are unknowns. Every other specification
//! adds one equation (a constraint) and one input. A constraint that can not be satisfied by a closed
//! system opens it to a titrant whose amount becomes an unknown:
//!
//! | method | input | equation residual | titrant |
//! |---|---|---|---|
//! | `volume()` | V | (V - V*)/V* | |
//! | `internal_energy()` | U | (U - U*)/(R T n) | |
//! | `enthalpy()` | H | (H - H*)/(R T n) | |
//! | `entropy()` | S | (S - S*)/(R n) | |
//! | `gibbs_energy()` | G | (G - G*)/(R T n) | |
//! | `helmholtz_energy()` | A | (A - A*)/(R T n) | |
//! | `pH()` | pH | pH - pH* | H+ |
//! | `activity(s)` | activity[s] | ln a - ln a* | s |
//! | `fugacity(g)` | fugacity[g] | ln f - ln f* | g |
//! | `chemical_potential(s)` | mu[s] | (mu - mu*)/(R T) | s |
//! | `phase_amount(p)` | amount[p] | (n_p - n_p*)/n_p* | |
//!
//! Custom equations come from closures or from symbolic expressions of the property names
//! T, P, V, U, H, S, G, A, pH, IS, n and b<element> (element amounts, bZ for charge).
use crate::Thermodynamics::ChemicalProps::ChemicalProps;
use crate::Thermodynamics::ChemicalSystem::{ChemicalSystem, SystemError};
use crate::Thermodynamics::DBhandlers::thermo_api::R;
use crate::Thermodynamics::molmass::{FormulaError, parse_formula};
use RustedSciThe::symbolic::symbolic_engine::Expr;
use log::info;
use nalgebra::DVector;
use std::f64::consts::LN_10;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EquilibriumError {
    #[error(transparent)]
    System(#[from] SystemError),
    #[error(transparent)]
    Formula(#[from] FormulaError),
    #[error("input '{0}' is not declared in the equilibrium specifications")]
    UnknownInput(String),
    #[error("no value given for input '{0}'")]
    MissingInput(String),
    #[error("input '{0}' is declared twice")]
    DuplicateInput(String),
    #[error("unknown variable '{variable}' in expression '{expression}'")]
    UnknownVariable { expression: String, variable: String },
    #[error("{equations} equations for {unknowns} unknowns (T, P and titrant amounts)")]
    DegreesOfFreedom { equations: usize, unknowns: usize },
    #[error("conditions were created for other specifications")]
    MismatchedConditions,
    #[error("the chemical state belongs to another chemical system")]
    ForeignState,
    #[error("the equilibrium problem is infeasible: {0}")]
    Infeasible(String),
    #[error("invalid value {value} of {what}")]
    InvalidValue { what: String, value: f64 },
}

/// residual of a custom equation from the properties and the input value
pub type ConstraintFn = Rc<dyn Fn(&ChemicalProps, f64) -> f64>;
/// compiled symbolic expression taking variable values in declaration order
pub type ExprFn = Rc<dyn Fn(Vec<f64>) -> f64>;

/// variables available to expression constraints besides element amounts
pub const EXPRESSION_VARIABLES: [&str; 11] =
    ["T", "P", "V", "U", "H", "S", "G", "A", "pH", "IS", "n"];

#[derive(Clone)]
pub enum ConstraintKind {
    Volume,
    InternalEnergy,
    Enthalpy,
    Entropy,
    GibbsEnergy,
    HelmholtzEnergy,
    PH { h_index: usize },
    Activity { index: usize },
    Fugacity { index: usize },
    ChemicalPotential { index: usize },
    PhaseAmount { phase: usize },
    Custom(ConstraintFn),
    Expression {
        source: String,
        variables: Vec<String>,
        f: ExprFn,
    },
}

impl fmt::Debug for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConstraintKind::Custom(_) => write!(f, "Custom(<closure>)"),
            ConstraintKind::Expression { source, .. } => write!(f, "Expression({})", source),
            ConstraintKind::PH { h_index } => write!(f, "PH({})", h_index),
            ConstraintKind::Activity { index } => write!(f, "Activity({})", index),
            ConstraintKind::Fugacity { index } => write!(f, "Fugacity({})", index),
            ConstraintKind::ChemicalPotential { index } => write!(f, "ChemicalPotential({})", index),
            ConstraintKind::PhaseAmount { phase } => write!(f, "PhaseAmount({})", phase),
            ConstraintKind::Volume => write!(f, "Volume"),
            ConstraintKind::InternalEnergy => write!(f, "InternalEnergy"),
            ConstraintKind::Enthalpy => write!(f, "Enthalpy"),
            ConstraintKind::Entropy => write!(f, "Entropy"),
            ConstraintKind::GibbsEnergy => write!(f, "GibbsEnergy"),
            ConstraintKind::HelmholtzEnergy => write!(f, "HelmholtzEnergy"),
        }
    }
}

/// one equation of the equilibrium problem tied to the input of the same name
#[derive(Debug, Clone)]
pub struct EquilibriumConstraint {
    pub input: String,
    pub kind: ConstraintKind,
}

// value of a variable of an expression constraint
fn expression_variable(props: &ChemicalProps, name: &str, input: &str, value: f64) -> f64 {
    if name == input {
        return value;
    }
    match name {
        "T" => props.temperature(),
        "P" => props.pressure(),
        "V" => props.volume(),
        "U" => props.internal_energy(),
        "H" => props.enthalpy(),
        "S" => props.entropy(),
        "G" => props.gibbs_energy(),
        "A" => props.helmholtz_energy(),
        "n" => props.amount(),
        "pH" => props
            .species_ln_activity("H+")
            .map(|ln_a| -ln_a / LN_10)
            .unwrap_or(f64::NAN),
        "IS" => props
            .aqueous()
            .map(|aq| aq.ionic_strength())
            .unwrap_or(f64::NAN),
        element => element
            .strip_prefix('b')
            .and_then(|e| props.element_amount(e).ok())
            .unwrap_or(f64::NAN),
    }
}

impl EquilibriumConstraint {
    /// scaled residual of the equation for the input value
    pub fn residual(&self, props: &ChemicalProps, value: f64) -> f64 {
        let t = props.temperature();
        let rt = R * t;
        let n = props.amount();
        match &self.kind {
            ConstraintKind::Volume => (props.volume() - value) / value,
            ConstraintKind::InternalEnergy => (props.internal_energy() - value) / (rt * n),
            ConstraintKind::Enthalpy => (props.enthalpy() - value) / (rt * n),
            ConstraintKind::Entropy => (props.entropy() - value) / (R * n),
            ConstraintKind::GibbsEnergy => (props.gibbs_energy() - value) / (rt * n),
            ConstraintKind::HelmholtzEnergy => (props.helmholtz_energy() - value) / (rt * n),
            ConstraintKind::PH { h_index } => -props.ln_activities()[*h_index] / LN_10 - value,
            ConstraintKind::Activity { index } | ConstraintKind::Fugacity { index } => {
                props.ln_activities()[*index] - value.ln()
            }
            ConstraintKind::ChemicalPotential { index } => {
                let g0 = props.standard_props()[*index].G0;
                (g0 + rt * props.ln_activities()[*index] - value) / rt
            }
            ConstraintKind::PhaseAmount { phase } => {
                let range = props.system().phases()[*phase].species_range.clone();
                let amount: f64 = props.species_amounts()[range].iter().sum();
                (amount - value) / value.max(1e-10)
            }
            ConstraintKind::Custom(f) => f(props, value),
            ConstraintKind::Expression { variables, f, .. } => {
                let args = variables
                    .iter()
                    .map(|v| expression_variable(props, v, &self.input, value))
                    .collect();
                f(args)
            }
        }
    }
}

/// substance the system is open to
#[derive(Debug, Clone, PartialEq)]
pub struct Titrant {
    pub name: String,
    /// elements and charge in the order of the formula matrix rows
    pub formula: DVector<f64>,
}

#[derive(Debug, Clone)]
pub struct EquilibriumSpecs<'a> {
    system: &'a ChemicalSystem,
    temperature_input: bool,
    pressure_input: bool,
    constraints: Vec<EquilibriumConstraint>,
    titrants: Vec<Titrant>,
}

impl<'a> EquilibriumSpecs<'a> {
    /// nothing prescribed: T and P unknown
    pub fn new(system: &'a ChemicalSystem) -> Self {
        Self {
            system,
            temperature_input: false,
            pressure_input: false,
            constraints: Vec::new(),
            titrants: Vec::new(),
        }
    }

    /// fixed temperature and pressure
    #[allow(non_snake_case)]
    pub fn TP(system: &'a ChemicalSystem) -> Self {
        let mut specs = Self::new(system);
        specs.temperature();
        specs.pressure();
        specs
    }

    /// fixed enthalpy and pressure, unknown temperature
    #[allow(non_snake_case)]
    pub fn HP(system: &'a ChemicalSystem) -> Self {
        let mut specs = Self::new(system);
        specs.pressure();
        specs.enthalpy();
        specs
    }

    /// fixed temperature and volume, unknown pressure
    #[allow(non_snake_case)]
    pub fn TV(system: &'a ChemicalSystem) -> Self {
        let mut specs = Self::new(system);
        specs.temperature();
        specs.volume();
        specs
    }

    /// fixed internal energy and volume, unknown temperature and pressure
    #[allow(non_snake_case)]
    pub fn UV(system: &'a ChemicalSystem) -> Self {
        let mut specs = Self::new(system);
        specs.internal_energy();
        specs.volume();
        specs
    }

    pub fn system(&self) -> &'a ChemicalSystem {
        self.system
    }

    pub fn temperature(&mut self) {
        self.temperature_input = true;
    }
    pub fn pressure(&mut self) {
        self.pressure_input = true;
    }

    fn push(&mut self, input: String, kind: ConstraintKind) -> Result<(), EquilibriumError> {
        if input == "T" || input == "P" || self.constraints.iter().any(|c| c.input == input) {
            return Err(EquilibriumError::DuplicateInput(input));
        }
        self.constraints.push(EquilibriumConstraint { input, kind });
        Ok(())
    }

    // built-in property constraints can only be declared once, a second call is ignored
    fn push_property(&mut self, input: &str, kind: ConstraintKind) {
        if !self.constraints.iter().any(|c| c.input == input) {
            self.constraints.push(EquilibriumConstraint {
                input: input.to_string(),
                kind,
            });
        }
    }

    pub fn volume(&mut self) {
        self.push_property("V", ConstraintKind::Volume);
    }
    pub fn internal_energy(&mut self) {
        self.push_property("U", ConstraintKind::InternalEnergy);
    }
    pub fn enthalpy(&mut self) {
        self.push_property("H", ConstraintKind::Enthalpy);
    }
    pub fn entropy(&mut self) {
        self.push_property("S", ConstraintKind::Entropy);
    }
    pub fn gibbs_energy(&mut self) {
        self.push_property("G", ConstraintKind::GibbsEnergy);
    }
    pub fn helmholtz_energy(&mut self) {
        self.push_property("A", ConstraintKind::HelmholtzEnergy);
    }

    /// fixed pH, opens the system to H+
    #[allow(non_snake_case)]
    pub fn pH(&mut self) -> Result<(), EquilibriumError> {
        let h_index = self.system.species_index("H+")?;
        self.push("pH".to_string(), ConstraintKind::PH { h_index })?;
        self.open_to("H+")
    }

    /// fixed activity of a species, opens the system to it
    pub fn activity(&mut self, species: &str) -> Result<(), EquilibriumError> {
        let index = self.system.species_index(species)?;
        self.push(activity_input(species), ConstraintKind::Activity { index })?;
        self.open_to(species)
    }

    /// fixed fugacity (bar) of a gas, opens the system to it
    pub fn fugacity(&mut self, gas: &str) -> Result<(), EquilibriumError> {
        let index = self.system.species_index(gas)?;
        let phase = &self.system.phases()[self.system.phase_of_species(index)];
        if !phase.model.is_gas() {
            return Err(SystemError::NotAGas(gas.to_string()).into());
        }
        self.push(fugacity_input(gas), ConstraintKind::Fugacity { index })?;
        self.open_to(gas)
    }

    /// fixed chemical potential (J/mol) of a species, opens the system to it
    pub fn chemical_potential(&mut self, species: &str) -> Result<(), EquilibriumError> {
        let index = self.system.species_index(species)?;
        self.push(
            chemical_potential_input(species),
            ConstraintKind::ChemicalPotential { index },
        )?;
        self.open_to(species)
    }

    /// fixed total amount of a phase
    pub fn phase_amount(&mut self, phase: &str) -> Result<(), EquilibriumError> {
        let index = self.system.phase_index(phase)?;
        self.push(phase_amount_input(phase), ConstraintKind::PhaseAmount { phase: index })
    }

    /// custom equation f(props, input) = 0, with `input` set in the conditions
    pub fn add_constraint<F>(&mut self, input: &str, f: F) -> Result<(), EquilibriumError>
    where
        F: Fn(&ChemicalProps, f64) -> f64 + 'static,
    {
        self.push(input.to_string(), ConstraintKind::Custom(Rc::new(f)))
    }

    /// custom equation expression = 0; the expression may use `input` as a variable
    /// # Examples
    /// ```
    /// use EquiThe::Thermodynamics::ChemicalSystem::{ChemicalSystem, PhaseSpec};
    /// use EquiThe::Thermodynamics::ChemEquilibrium::EquilibriumSpecs::EquilibriumSpecs;
    /// use EquiThe::Thermodynamics::DBhandlers::Database::Database;
    /// let db = Database::built_in().unwrap();
    /// let system = ChemicalSystem::new(&db, vec![PhaseSpec::gaseous(&["N2(g)", "O2(g)"])]).unwrap();
    /// let mut specs = EquilibriumSpecs::new(&system);
    /// specs.temperature();
    /// specs.add_constraint_expr("Vfix", "V/Vfix - 1").unwrap();
    /// assert_eq!(specs.inputs(), vec!["T", "Vfix"]);
    /// ```
    pub fn add_constraint_expr(&mut self, input: &str, expression: &str) -> Result<(), EquilibriumError> {
        let expr = Expr::parse_expression(expression);
        let variables = expr.all_arguments_are_variables();
        for v in &variables {
            let known = v == input
                || EXPRESSION_VARIABLES.contains(&v.as_str())
                || v
                    .strip_prefix('b')
                    .is_some_and(|e| self.system.element_index(e).is_ok());
            if !known {
                return Err(EquilibriumError::UnknownVariable {
                    expression: expression.to_string(),
                    variable: v.clone(),
                });
            }
        }
        let names: Vec<&str> = variables.iter().map(|s| s.as_str()).collect();
        let compiled = expr.lambdify_owned(names);
        let f: ExprFn = Rc::new(move |args: Vec<f64>| compiled(args));
        info!("constraint {} = 0 with variables {:?}", expression, variables);
        self.push(
            input.to_string(),
            ConstraintKind::Expression {
                source: expression.to_string(),
                variables,
                f,
            },
        )
    }

    /// Opens the system to a species of the system or to a substance given by its formula.
    /// Opening twice to the same titrant has no effect.
    pub fn open_to(&mut self, titrant: &str) -> Result<(), EquilibriumError> {
        if self.titrants.iter().any(|t| t.name == titrant) {
            return Ok(());
        }
        let formula = match self.system.species_index(titrant) {
            Ok(i) => self.system.formula_vector(&self.system.species()[i])?,
            Err(_) => {
                let parsed = parse_formula(titrant, None)?;
                let mut column = DVector::zeros(self.system.num_components());
                for (element, count) in &parsed.elements {
                    column[self.system.element_index(element)?] = *count;
                }
                column[self.system.num_elements()] = parsed.charge;
                column
            }
        };
        self.titrants.push(Titrant {
            name: titrant.to_string(),
            formula,
        });
        Ok(())
    }

    pub fn is_temperature_input(&self) -> bool {
        self.temperature_input
    }
    pub fn is_pressure_input(&self) -> bool {
        self.pressure_input
    }
    pub fn constraints(&self) -> &[EquilibriumConstraint] {
        &self.constraints
    }
    pub fn titrants(&self) -> &[Titrant] {
        &self.titrants
    }

    /// names of all inputs: "T", "P" when prescribed, then one per constraint
    pub fn inputs(&self) -> Vec<&str> {
        let mut inputs = Vec::new();
        if self.temperature_input {
            inputs.push("T");
        }
        if self.pressure_input {
            inputs.push("P");
        }
        inputs.extend(self.constraints.iter().map(|c| c.input.as_str()));
        inputs
    }

    /// unknown T, P and titrant amounts
    pub fn num_controls(&self) -> usize {
        usize::from(!self.temperature_input)
            + usize::from(!self.pressure_input)
            + self.titrants.len()
    }

    /// equations must match the controls they determine
    pub fn check_degrees_of_freedom(&self) -> Result<(), EquilibriumError> {
        let equations = self.constraints.len();
        let unknowns = self.num_controls();
        if equations != unknowns {
            return Err(EquilibriumError::DegreesOfFreedom {
                equations,
                unknowns,
            });
        }
        Ok(())
    }
}

pub fn activity_input(species: &str) -> String {
    format!("activity[{}]", species)
}
pub fn fugacity_input(gas: &str) -> String {
    format!("fugacity[{}]", gas)
}
pub fn chemical_potential_input(species: &str) -> String {
    format!("mu[{}]", species)
}
pub fn phase_amount_input(phase: &str) -> String {
    format!("amount[{}]", phase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Thermodynamics::ChemicalSystem::PhaseSpec;
    use crate::Thermodynamics::DBhandlers::Database::Database;
    use approx::assert_relative_eq;

    fn system() -> ChemicalSystem {
        let db = Database::built_in().unwrap();
        ChemicalSystem::new(
            &db,
            vec![
                PhaseSpec::aqueous(&["H2O(aq)", "H+", "OH-", "CO2(aq)", "HCO3-", "CO3-2", "Na+", "Cl-"]),
                PhaseSpec::gaseous(&["CO2(g)", "H2O(g)"]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_inputs_and_titrants() {
        let system = system();
        let mut specs = EquilibriumSpecs::TP(&system);
        specs.pH().unwrap();
        specs.fugacity("CO2(g)").unwrap();
        assert_eq!(specs.inputs(), vec!["T", "P", "pH", "fugacity[CO2(g)]"]);
        let names: Vec<&str> = specs.titrants().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["H+", "CO2(g)"]);
        assert_eq!(specs.num_controls(), 2);
        assert!(specs.check_degrees_of_freedom().is_ok());
        // H+ carries one hydrogen and one unit of charge
        let h = system.element_index("H").unwrap();
        let z = system.element_index("Z").unwrap();
        assert_relative_eq!(specs.titrants()[0].formula[h], 1.0);
        assert_relative_eq!(specs.titrants()[0].formula[z], 1.0);
    }

    #[test]
    fn test_degrees_of_freedom() {
        let system = system();
        let mut specs = EquilibriumSpecs::new(&system);
        specs.temperature();
        assert!(matches!(
            specs.check_degrees_of_freedom(),
            Err(EquilibriumError::DegreesOfFreedom {
                equations: 0,
                unknowns: 1
            })
        ));
        specs.volume();
        specs.volume();
        assert_eq!(specs.constraints().len(), 1);
        assert!(specs.check_degrees_of_freedom().is_ok());
        let mut specs = EquilibriumSpecs::TP(&system);
        specs.enthalpy();
        assert!(specs.check_degrees_of_freedom().is_err());
    }

    #[test]
    fn test_open_to_formula() {
        let system = system();
        let mut specs = EquilibriumSpecs::TP(&system);
        specs.open_to("NaCl").unwrap();
        specs.open_to("NaCl").unwrap();
        assert_eq!(specs.titrants().len(), 1);
        let na = system.element_index("Na").unwrap();
        assert_relative_eq!(specs.titrants()[0].formula[na], 1.0);
        assert!(matches!(
            specs.open_to("CaCO3"),
            Err(EquilibriumError::System(SystemError::ElementNotFound(_)))
        ));
    }

    #[test]
    fn test_invalid_declarations() {
        let system = system();
        let mut specs = EquilibriumSpecs::TP(&system);
        assert!(matches!(
            specs.fugacity("CO2(aq)"),
            Err(EquilibriumError::System(SystemError::NotAGas(_)))
        ));
        assert!(specs.activity("Calcite").is_err());
        specs.add_constraint("x", |props, x| props.amount() - x).unwrap();
        assert!(matches!(
            specs.add_constraint("x", |_, _| 0.0),
            Err(EquilibriumError::DuplicateInput(_))
        ));
        assert!(matches!(
            specs.add_constraint_expr("y", "Q*y - 1"),
            Err(EquilibriumError::UnknownVariable { .. })
        ));
        assert!(matches!(
            specs.add_constraint("T", |_, _| 0.0),
            Err(EquilibriumError::DuplicateInput(_))
        ));
    }
}
