/// activity models of gaseous, aqueous, liquid and solid phases
pub mod ActivityModels;
/// properties of the aqueous phase: pH, molalities, ionic strength, saturation indices
pub mod AqueousProps;
#[allow(non_snake_case)]
/// parametric chemical equilibrium: specifications, conditions, solver, paths
pub mod ChemEquilibrium;
/// thermodynamic properties of a chemical state
/// # Examples
/// ```
/// use EquiThe::Thermodynamics::ChemicalState::ChemicalState;
/// use EquiThe::Thermodynamics::ChemicalSystem::{ChemicalSystem, PhaseSpec};
/// use EquiThe::Thermodynamics::DBhandlers::Database::Database;
/// let db = Database::built_in().unwrap();
/// let system = ChemicalSystem::new(&db, vec![PhaseSpec::gaseous(&["N2(g)", "O2(g)"])]).unwrap();
/// let mut state = ChemicalState::new(&system);
/// state.set_temperature(500.0, "K").unwrap();
/// state.set_species_amount("N2(g)", 0.79, "mol").unwrap();
/// state.set_species_amount("O2(g)", 0.21, "mol").unwrap();
/// let props = state.props().unwrap();
/// // ideal gas: V = nRT/P
/// let v = props.volume();
/// assert!((v - 8.314462618 * 500.0 / 1e5).abs() < 1e-9);
/// println!("H = {} J, S = {} J/K", props.enthalpy(), props.entropy());
/// ```
pub mod ChemicalProps;
/// temperature, pressure and species amounts
pub mod ChemicalState;
/// phases, species and the formula matrix of a chemical system
/// # Examples
/// ```
/// use EquiThe::Thermodynamics::ChemicalSystem::{ChemicalSystem, PhaseSpec};
/// use EquiThe::Thermodynamics::DBhandlers::Database::Database;
/// let db = Database::built_in().unwrap();
/// let system = ChemicalSystem::new(
///     &db,
///     vec![
///         PhaseSpec::aqueous(&["H2O(aq)", "H+", "OH-", "Na+", "Cl-"]),
///         PhaseSpec::mineral("Halite"),
///     ],
/// )
/// .unwrap();
/// assert_eq!(system.num_species(), 6);
/// assert_eq!(system.elements(), &["Cl", "H", "Na", "O"]);
/// system.print_formula_matrix();
/// ```
pub mod ChemicalSystem;
#[allow(non_snake_case)]
/// database of species and standard thermodynamic models
pub mod DBhandlers;
/// chemical formulas: parsing, element composition and molar masses
pub mod molmass;
