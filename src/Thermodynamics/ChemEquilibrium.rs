/// values of the inputs of an equilibrium problem: T, P, pH, fixed volume, etc.
pub mod EquilibriumConditions;
/// residuals and Jacobian of the Gibbs energy minimization equations
pub mod EquilibriumEquations;
/// tables of results, specifications and species amounts
pub mod EquilibriumOutput;
/// sequences of equilibrium calculations with warm start
/// # Examples
/// ```
/// use EquiThe::Thermodynamics::ChemEquilibrium::EquilibriumPath::{EquilibriumPath, PathProperty};
/// use EquiThe::Thermodynamics::ChemEquilibrium::EquilibriumSolver::EquilibriumSolver;
/// use EquiThe::Thermodynamics::ChemEquilibrium::EquilibriumSpecs::EquilibriumSpecs;
/// use EquiThe::Thermodynamics::ChemicalState::ChemicalState;
/// use EquiThe::Thermodynamics::ChemicalSystem::{ChemicalSystem, PhaseSpec};
/// use EquiThe::Thermodynamics::DBhandlers::Database::Database;
/// let db = Database::built_in().unwrap();
/// let system = ChemicalSystem::new(&db, vec![PhaseSpec::aqueous(&["H2O(aq)", "H+", "OH-"])]).unwrap();
/// let mut state = ChemicalState::new(&system);
/// state.set_species_mass("H2O(aq)", 1.0, "kg").unwrap();
/// let solver = EquilibriumSolver::new(&EquilibriumSpecs::TP(&system)).unwrap();
/// let path = EquilibriumPath::new(&solver, vec![PathProperty::Temperature, PathProperty::pH]);
/// let mut base = solver.conditions();
/// base.pressure(1.0, "bar").unwrap();
/// let table = path.temperature_sweep(&mut state, &base, &[298.15, 323.15, 348.15]).unwrap();
/// let ph = table.column("pH").unwrap();
/// assert!(ph[2] < ph[0]);
/// table.pretty_print();
/// ```
pub mod EquilibriumPath;
/// species excluded from the equilibrium calculation
pub mod EquilibriumRestrictions;
/// damped Newton solver of the equilibrium equations
/// # Examples
/// calcite in contact with pure water at 25 C and 1 bar
/// ```
/// use EquiThe::Thermodynamics::ChemEquilibrium::EquilibriumSolver::EquilibriumSolver;
/// use EquiThe::Thermodynamics::ChemEquilibrium::EquilibriumSpecs::EquilibriumSpecs;
/// use EquiThe::Thermodynamics::ChemicalState::ChemicalState;
/// use EquiThe::Thermodynamics::ChemicalSystem::{ChemicalSystem, PhaseSpec};
/// use EquiThe::Thermodynamics::DBhandlers::Database::Database;
/// let db = Database::built_in().unwrap();
/// let system = ChemicalSystem::new(
///     &db,
///     vec![
///         PhaseSpec::aqueous(&["H2O(aq)", "H+", "OH-", "CO2(aq)", "HCO3-", "CO3-2", "Ca+2"]),
///         PhaseSpec::mineral("Calcite"),
///     ],
/// )
/// .unwrap();
/// let mut state = ChemicalState::new(&system);
/// state.set_temperature(25.0, "C").unwrap();
/// state.set_pressure(1.0, "bar").unwrap();
/// state.set_species_mass("H2O(aq)", 1.0, "kg").unwrap();
/// state.set_species_amount("Calcite", 1.0, "mol").unwrap();
/// let specs = EquilibriumSpecs::TP(&system);
/// let solver = EquilibriumSolver::new(&specs).unwrap();
/// let result = solver.solve(&mut state).unwrap();
/// assert!(result.succeeded);
/// let props = state.props().unwrap();
/// let aqueous = props.aqueous().unwrap();
/// println!("pH = {}", aqueous.pH().unwrap());
/// assert!(aqueous.saturation_index("Calcite").unwrap().abs() < 1e-4);
/// ```
/// fixed pH: the system is opened to H+
/// ```
/// use EquiThe::Thermodynamics::ChemEquilibrium::EquilibriumSolver::EquilibriumSolver;
/// use EquiThe::Thermodynamics::ChemEquilibrium::EquilibriumSpecs::EquilibriumSpecs;
/// use EquiThe::Thermodynamics::ChemicalState::ChemicalState;
/// use EquiThe::Thermodynamics::ChemicalSystem::{ChemicalSystem, PhaseSpec};
/// use EquiThe::Thermodynamics::DBhandlers::Database::Database;
/// let db = Database::built_in().unwrap();
/// let system = ChemicalSystem::new(
///     &db,
///     vec![PhaseSpec::aqueous(&["H2O(aq)", "H+", "OH-", "CO2(aq)", "HCO3-", "CO3-2"])],
/// )
/// .unwrap();
/// let mut state = ChemicalState::new(&system);
/// state.set_species_mass("H2O(aq)", 1.0, "kg").unwrap();
/// state.set_species_amount("CO2(aq)", 0.01, "mol").unwrap();
/// let mut specs = EquilibriumSpecs::TP(&system);
/// specs.pH().unwrap();
/// let solver = EquilibriumSolver::new(&specs).unwrap();
/// let mut conditions = solver.conditions();
/// conditions.temperature(25.0, "C").unwrap();
/// conditions.pressure(1.0, "bar").unwrap();
/// conditions.pH(9.0).unwrap();
/// let result = solver.solve_with(&mut state, &conditions).unwrap();
/// assert!(result.succeeded);
/// println!("H+ added: {} mol", result.titrant_amount("H+").unwrap());
/// ```
pub mod EquilibriumSolver;
/// which properties of the equilibrium state are prescribed
pub mod EquilibriumSpecs;
mod EquilibriumSolver_tests;
