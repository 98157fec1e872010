use crate::Thermodynamics::ChemEquilibrium::EquilibriumOutput::{
    print_comparison, print_species_amounts,
};
use crate::Thermodynamics::ChemEquilibrium::EquilibriumPath::{EquilibriumPath, PathProperty};
use crate::Thermodynamics::ChemEquilibrium::EquilibriumRestrictions::EquilibriumRestrictions;
use crate::Thermodynamics::ChemEquilibrium::EquilibriumSolver::{
    EquilibriumOptions, EquilibriumSolver,
};
use crate::Thermodynamics::ChemEquilibrium::EquilibriumSpecs::EquilibriumSpecs;
use crate::Thermodynamics::ChemicalState::ChemicalState;
use crate::Thermodynamics::ChemicalSystem::{ChemicalSystem, PhaseSpec};
use crate::Thermodynamics::DBhandlers::Database::Database;

const CARBONATE: [&str; 7] = ["H2O(aq)", "H+", "OH-", "CO2(aq)", "HCO3-", "CO3-2", "Ca+2"];

pub fn equilibrium_examples(task: usize) {
    let db = Database::from_config().unwrap();
    match task {
        0 => {
            // CO2 dissolved in water at 25 C and 1 bar
            let system =
                ChemicalSystem::new(&db, vec![PhaseSpec::aqueous(&CARBONATE[..6])]).unwrap();
            let mut state = ChemicalState::new(&system);
            state.set_temperature(25.0, "C").unwrap();
            state.set_pressure(1.0, "bar").unwrap();
            state.set_species_mass("H2O(aq)", 1.0, "kg").unwrap();
            state.set_species_amount("CO2(aq)", 10.0, "mmol").unwrap();
            let initial = state.clone();

            let specs = EquilibriumSpecs::TP(&system);
            specs.pretty_print();
            let solver = EquilibriumSolver::new(&specs).unwrap();
            let result = solver.solve(&mut state).unwrap();
            result.pretty_print(&system);
            print_comparison(&initial, &state);
            let props = state.props().unwrap();
            props.aqueous().unwrap().pretty_print();
        }
        1 => {
            // calcite dissolving in pure water, then the same with calcite kept inert
            let system = ChemicalSystem::new(
                &db,
                vec![PhaseSpec::aqueous(&CARBONATE), PhaseSpec::mineral("Calcite")],
            )
            .unwrap();
            let mut state = ChemicalState::new(&system);
            state.set_species_mass("H2O(aq)", 1.0, "kg").unwrap();
            state.set_species_amount("Calcite", 1.0, "mol").unwrap();
            state.set_species_amount("CO2(aq)", 1.0, "mmol").unwrap();
            let mut inert_state = state.clone();

            let specs = EquilibriumSpecs::TP(&system);
            let solver = EquilibriumSolver::new(&specs).unwrap();
            let result = solver.solve(&mut state).unwrap();
            result.pretty_print(&system);
            print_species_amounts(&state, 1e-12);
            let props = state.props().unwrap();
            let aqueous = props.aqueous().unwrap();
            println!(
                "pH = {:.4}, SI(Calcite) = {:.3e}",
                aqueous.pH().unwrap(),
                aqueous.saturation_index("Calcite").unwrap()
            );

            let mut restrictions = EquilibriumRestrictions::new(&system);
            restrictions.cannot_react("Calcite").unwrap();
            let result = solver
                .solve_with_restrictions(&mut inert_state, &solver.conditions(), Some(&restrictions))
                .unwrap();
            result.pretty_print(&system);
            print_species_amounts(&inert_state, 1e-12);
        }
        2 => {
            // carbonate solution titrated to pH 8.5; the amount of H+ removed is an unknown
            let system =
                ChemicalSystem::new(&db, vec![PhaseSpec::aqueous(&CARBONATE[..6])]).unwrap();
            let mut state = ChemicalState::new(&system);
            state.set_species_mass("H2O(aq)", 1.0, "kg").unwrap();
            state.set_species_amount("CO2(aq)", 0.1, "mol").unwrap();

            let mut specs = EquilibriumSpecs::TP(&system);
            specs.pH().unwrap();
            specs.pretty_print();
            let solver = EquilibriumSolver::new(&specs).unwrap();
            let mut conditions = solver.conditions();
            conditions.temperature(25.0, "C").unwrap();
            conditions.pressure(1.0, "bar").unwrap();
            conditions.pH(8.5).unwrap();
            conditions.pretty_print();
            let result = solver.solve_with(&mut state, &conditions).unwrap();
            result.pretty_print(&system);
            print_species_amounts(&state, 1e-12);
        }
        3 => {
            // adiabatic flame of methane in air at 1 bar
            let system = ChemicalSystem::new(
                &db,
                vec![PhaseSpec::gaseous(&[
                    "CH4(g)", "O2(g)", "N2(g)", "CO2(g)", "H2O(g)", "CO(g)", "H2(g)",
                ])],
            )
            .unwrap();
            let mut state = ChemicalState::new(&system);
            state.set_species_amount("CH4(g)", 1.0, "mol").unwrap();
            state.set_species_amount("O2(g)", 2.0, "mol").unwrap();
            state.set_species_amount("N2(g)", 7.52, "mol").unwrap();
            let h0 = state.props().unwrap().enthalpy();
            state.set_temperature(2000.0, "K").unwrap();

            let specs = EquilibriumSpecs::HP(&system);
            let solver = EquilibriumSolver::new(&specs).unwrap();
            let mut conditions = solver.conditions();
            conditions.pressure(1.0, "bar").unwrap();
            conditions.enthalpy(h0, "J").unwrap();
            let result = solver.solve_with(&mut state, &conditions).unwrap();
            result.pretty_print(&system);
            println!("adiabatic flame temperature {:.1} K", state.temperature());
            print_species_amounts(&state, 1e-8);
        }
        4 => {
            // hydrogen burning in a closed rigid vessel: fixed internal energy and volume
            let system = ChemicalSystem::new(
                &db,
                vec![PhaseSpec::gaseous(&["H2(g)", "O2(g)", "H2O(g)", "N2(g)"])],
            )
            .unwrap();
            let mut state = ChemicalState::new(&system);
            state.set_species_amount("H2(g)", 2.0, "mol").unwrap();
            state.set_species_amount("O2(g)", 1.0, "mol").unwrap();
            state.set_species_amount("N2(g)", 3.76, "mol").unwrap();
            let props = state.props().unwrap();
            let (u0, v0) = (props.internal_energy(), props.volume());
            state.set_temperature(2500.0, "K").unwrap();
            state.set_pressure(5.0, "bar").unwrap();

            let specs = EquilibriumSpecs::UV(&system);
            let solver = EquilibriumSolver::new(&specs).unwrap();
            let mut conditions = solver.conditions();
            conditions.internal_energy(u0, "J").unwrap();
            conditions.volume(v0, "m3").unwrap();
            let result = solver.solve_with(&mut state, &conditions).unwrap();
            result.pretty_print(&system);
            println!(
                "T = {:.1} K, P = {:.3} bar",
                state.temperature(),
                state.pressure() / 1e5
            );
        }
        5 => {
            // pressure from a symbolic equation of the volume
            let system =
                ChemicalSystem::new(&db, vec![PhaseSpec::gaseous(&["N2(g)", "O2(g)"])]).unwrap();
            let mut state = ChemicalState::new(&system);
            state.set_species_amount("N2(g)", 0.79, "mol").unwrap();
            state.set_species_amount("O2(g)", 0.21, "mol").unwrap();

            let mut specs = EquilibriumSpecs::new(&system);
            specs.temperature();
            specs.add_constraint_expr("Vfix", "V/Vfix - 1").unwrap();
            specs.pretty_print();
            let solver = EquilibriumSolver::new(&specs).unwrap();
            let mut conditions = solver.conditions();
            conditions.temperature(350.0, "K").unwrap();
            conditions.set("Vfix", 0.01).unwrap();
            let result = solver.solve_with(&mut state, &conditions).unwrap();
            result.pretty_print(&system);
        }
        6 => {
            // calcite solubility from 25 to 90 C
            let system = ChemicalSystem::new(
                &db,
                vec![PhaseSpec::aqueous(&CARBONATE), PhaseSpec::mineral("Calcite")],
            )
            .unwrap();
            let mut state = ChemicalState::new(&system);
            state.set_species_mass("H2O(aq)", 1.0, "kg").unwrap();
            state.set_species_amount("Calcite", 1.0, "mol").unwrap();

            let specs = EquilibriumSpecs::TP(&system);
            let options = EquilibriumOptions {
                max_iterations: 200,
                ..EquilibriumOptions::default()
            };
            let solver = EquilibriumSolver::new(&specs).unwrap().with_options(options);
            let path = EquilibriumPath::new(
                &solver,
                vec![
                    PathProperty::Temperature,
                    PathProperty::pH,
                    PathProperty::SpeciesMolality("Ca+2".to_string()),
                    PathProperty::SpeciesAmount("Calcite".to_string()),
                    PathProperty::IonicStrength,
                ],
            );
            let mut base = solver.conditions();
            base.pressure(1.0, "bar").unwrap();
            let temperatures: Vec<f64> = (0..8).map(|k| 298.15 + 10.0 * k as f64).collect();
            let table = path
                .temperature_sweep(&mut state, &base, &temperatures)
                .unwrap();
            table.pretty_print();
        }
        _ => println!("Invalid task number"),
    }
}
