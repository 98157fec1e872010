#[cfg(test)]
mod tests {
    use crate::Thermodynamics::ChemEquilibrium::EquilibriumConditions::EquilibriumConditions;
    use crate::Thermodynamics::ChemEquilibrium::EquilibriumRestrictions::EquilibriumRestrictions;
    use crate::Thermodynamics::ChemEquilibrium::EquilibriumSolver::{
        EquilibriumOptions, EquilibriumSolver,
    };
    use crate::Thermodynamics::ChemEquilibrium::EquilibriumSpecs::{
        EquilibriumError, EquilibriumSpecs,
    };
    use crate::Thermodynamics::ChemicalProps::ChemicalProps;
    use crate::Thermodynamics::ChemicalState::ChemicalState;
    use crate::Thermodynamics::ChemicalSystem::{ChemicalSystem, PhaseSpec};
    use crate::Thermodynamics::DBhandlers::Database::Database;
    use crate::Thermodynamics::DBhandlers::thermo_api::log10_k;
    use approx::assert_relative_eq;
    use std::f64::consts::LN_10;

    const CARBONATE: [&str; 6] = ["H2O(aq)", "H+", "OH-", "CO2(aq)", "HCO3-", "CO3-2"];

    fn db() -> Database {
        Database::built_in().unwrap()
    }

    /// log10 K of a reaction given as (species, coefficient), products positive
    fn log_k(db: &Database, reaction: &[(&str, f64)], t: f64) -> f64 {
        let species: Vec<_> = reaction
            .iter()
            .map(|(name, nu)| (*nu, db.species(name).unwrap()))
            .collect();
        let terms: Vec<_> = species.iter().map(|(nu, s)| (*nu, s.thermo())).collect();
        log10_k(&terms, t, 1e5).unwrap()
    }

    /// log10 of the activity product of the reaction
    fn log_q(props: &ChemicalProps, reaction: &[(&str, f64)]) -> f64 {
        reaction
            .iter()
            .map(|(name, nu)| nu * props.species_ln_activity(name).unwrap())
            .sum::<f64>()
            / LN_10
    }

    #[test]
    fn test_pure_water() {
        let db = db();
        let system =
            ChemicalSystem::new(&db, vec![PhaseSpec::aqueous(&["H2O(aq)", "H+", "OH-"])]).unwrap();
        let mut state = ChemicalState::new(&system);
        state.set_species_mass("H2O(aq)", 1.0, "kg").unwrap();
        let b0 = state.element_amounts();

        let specs = EquilibriumSpecs::TP(&system);
        let solver = EquilibriumSolver::new(&specs).unwrap();
        let result = solver.solve(&mut state).unwrap();
        assert!(result.succeeded, "{}", result.message);
        assert!(result.residual < 1e-8);

        let props = state.props().unwrap();
        let aq = props.aqueous().unwrap();
        assert_relative_eq!(aq.pH().unwrap(), 7.0, epsilon = 0.02);
        assert_relative_eq!(
            props.species_amount("H+").unwrap(),
            props.species_amount("OH-").unwrap(),
            max_relative = 1e-6
        );
        let b = state.element_amounts();
        for i in 0..b.len() {
            assert_relative_eq!(b[i], b0[i], epsilon = 1e-9, max_relative = 1e-10);
        }
    }

    #[test]
    fn test_equilibrium_minimizes_gibbs_energy() {
        let db = db();
        let system =
            ChemicalSystem::new(&db, vec![PhaseSpec::aqueous(&["H2O(aq)", "H+", "OH-"])]).unwrap();
        let mut state = ChemicalState::new(&system);
        state.set_species_mass("H2O(aq)", 1.0, "kg").unwrap();
        let solver = EquilibriumSolver::new(&EquilibriumSpecs::TP(&system)).unwrap();
        assert!(solver.solve(&mut state).unwrap().succeeded);
        let g_eq = state.props().unwrap().gibbs_energy();
        // H2O = H+ + OH- shifted either way keeps the element amounts
        for delta in [5e-8, -5e-8] {
            let mut n = state.species_amounts().to_vec();
            n[0] -= delta;
            n[1] += delta;
            n[2] += delta;
            let g = ChemicalProps::compute(&system, state.temperature(), state.pressure(), n)
                .unwrap()
                .gibbs_energy();
            assert!(g > g_eq);
        }
    }

    #[test]
    fn test_carbonate_speciation() {
        let db = db();
        let system = ChemicalSystem::new(&db, vec![PhaseSpec::aqueous(&CARBONATE)]).unwrap();
        let mut state = ChemicalState::new(&system);
        state.set_temperature(25.0, "C").unwrap();
        state.set_species_mass("H2O(aq)", 1.0, "kg").unwrap();
        state.set_species_amount("CO2(aq)", 10.0, "mmol").unwrap();
        let b0 = state.element_amounts();

        let solver = EquilibriumSolver::new(&EquilibriumSpecs::TP(&system)).unwrap();
        let result = solver.solve(&mut state).unwrap();
        assert!(result.succeeded, "{}", result.message);

        let props = state.props().unwrap();
        let t = state.temperature();
        for reaction in [
            vec![("CO2(aq)", -1.0), ("H2O(aq)", -1.0), ("HCO3-", 1.0), ("H+", 1.0)],
            vec![("HCO3-", -1.0), ("CO3-2", 1.0), ("H+", 1.0)],
            vec![("H2O(aq)", -1.0), ("H+", 1.0), ("OH-", 1.0)],
        ] {
            assert_relative_eq!(log_q(&props, &reaction), log_k(&db, &reaction, t), epsilon = 1e-6);
        }
        // weak acid: pH between 4 and 5
        let ph = props.aqueous().unwrap().pH().unwrap();
        assert!(ph > 3.5 && ph < 5.0, "pH = {}", ph);
        let b = state.element_amounts();
        for i in 0..b.len() {
            assert_relative_eq!(b[i], b0[i], epsilon = 1e-9, max_relative = 1e-10);
        }
        assert_relative_eq!(props.charge(), 0.0, epsilon = 1e-9);
    }

    fn calcite_system(db: &Database) -> ChemicalSystem {
        ChemicalSystem::new(
            db,
            vec![
                PhaseSpec::aqueous(&["H2O(aq)", "H+", "OH-", "CO2(aq)", "HCO3-", "CO3-2", "Ca+2"]),
                PhaseSpec::mineral("Calcite"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_calcite_dissolution() {
        let db = db();
        let system = calcite_system(&db);
        let mut state = ChemicalState::new(&system);
        state.set_species_mass("H2O(aq)", 1.0, "kg").unwrap();
        state.set_species_amount("Calcite", 1.0, "mol").unwrap();

        let solver = EquilibriumSolver::new(&EquilibriumSpecs::TP(&system)).unwrap();
        let result = solver.solve(&mut state).unwrap();
        assert!(result.succeeded, "{}", result.message);

        let props = state.props().unwrap();
        let dissolution = [("Calcite", -1.0), ("Ca+2", 1.0), ("CO3-2", 1.0)];
        assert_relative_eq!(
            log_q(&props, &dissolution),
            log_k(&db, &dissolution, 298.15),
            epsilon = 1e-6
        );
        let aq = props.aqueous().unwrap();
        assert_relative_eq!(aq.saturation_index("Calcite").unwrap(), 0.0, epsilon = 1e-5);
        assert!(aq.pH().unwrap() > 8.0);
        // a little calcite dissolves, calcium is conserved
        let dissolved = 1.0 - state.species_amount("Calcite").unwrap();
        assert!(dissolved > 0.0 && dissolved < 1e-2);
        assert_relative_eq!(state.element_amount("Ca").unwrap(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_fixed_ph_with_titrant() {
        let db = db();
        let system = ChemicalSystem::new(&db, vec![PhaseSpec::aqueous(&CARBONATE)]).unwrap();
        let mut state = ChemicalState::new(&system);
        state.set_species_mass("H2O(aq)", 1.0, "kg").unwrap();
        state.set_species_amount("CO2(aq)", 10.0, "mmol").unwrap();
        let b0 = state.element_amounts();

        let mut specs = EquilibriumSpecs::TP(&system);
        specs.pH().unwrap();
        let solver = EquilibriumSolver::new(&specs).unwrap();
        let mut conditions = solver.conditions();
        conditions.temperature(25.0, "C").unwrap();
        conditions.pressure(1.0, "bar").unwrap();
        conditions.pH(8.0).unwrap();
        let result = solver.solve_with(&mut state, &conditions).unwrap();
        assert!(result.succeeded, "{}", result.message);

        let props = state.props().unwrap();
        assert_relative_eq!(props.aqueous().unwrap().pH().unwrap(), 8.0, epsilon = 1e-8);
        // H+ was removed: the hydrogen and charge balances account for it
        let q = result.titrant_amount("H+").unwrap();
        assert!(q < 0.0);
        let h = system.element_index("H").unwrap();
        let c = system.element_index("C").unwrap();
        let b = state.element_amounts();
        assert_relative_eq!(b[h], b0[h] + q, epsilon = 1e-9, max_relative = 1e-10);
        assert_relative_eq!(b[c], b0[c], epsilon = 1e-12);
        assert_relative_eq!(props.charge(), q, epsilon = 1e-10);
    }

    #[test]
    fn test_fixed_fugacity_opens_system() {
        let db = db();
        let system = ChemicalSystem::new(
            &db,
            vec![
                PhaseSpec::aqueous(&CARBONATE),
                PhaseSpec::gaseous(&["CO2(g)", "N2(g)"]),
            ],
        )
        .unwrap();
        let mut state = ChemicalState::new(&system);
        state.set_species_mass("H2O(aq)", 1.0, "kg").unwrap();
        state.set_species_amount("N2(g)", 1.0, "mol").unwrap();

        let mut specs = EquilibriumSpecs::TP(&system);
        specs.fugacity("CO2(g)").unwrap();
        let solver = EquilibriumSolver::new(&specs).unwrap();
        let mut conditions = solver.conditions();
        conditions.temperature(25.0, "C").unwrap();
        conditions.pressure(1.0, "bar").unwrap();
        conditions.fugacity("CO2(g)", 0.5, "bar").unwrap();
        let result = solver.solve_with(&mut state, &conditions).unwrap();
        assert!(result.succeeded, "{}", result.message);

        let props = state.props().unwrap();
        assert_relative_eq!(props.fugacity("CO2(g)").unwrap(), 0.5, max_relative = 1e-8);
        let henry = [("CO2(g)", -1.0), ("CO2(aq)", 1.0)];
        assert_relative_eq!(log_q(&props, &henry), log_k(&db, &henry, 298.15), epsilon = 1e-6);
        // one mole in the gas next to one mole of N2, the rest dissolved
        let q = result.titrant_amount("CO2(g)").unwrap();
        assert!(q > 1.0 && q < 1.1, "q = {}", q);
        assert_relative_eq!(state.element_amount("C").unwrap(), q, max_relative = 1e-9);
    }

    #[test]
    fn test_fixed_activity() {
        let db = db();
        let system = ChemicalSystem::new(&db, vec![PhaseSpec::aqueous(&CARBONATE)]).unwrap();
        let mut state = ChemicalState::new(&system);
        state.set_species_mass("H2O(aq)", 1.0, "kg").unwrap();
        let mut specs = EquilibriumSpecs::TP(&system);
        specs.activity("CO2(aq)").unwrap();
        let solver = EquilibriumSolver::new(&specs).unwrap();
        let mut conditions = solver.conditions();
        conditions.activity("CO2(aq)", 1e-3).unwrap();
        let result = solver.solve_with(&mut state, &conditions).unwrap();
        assert!(result.succeeded, "{}", result.message);
        let props = state.props().unwrap();
        assert_relative_eq!(props.species_activity("CO2(aq)").unwrap(), 1e-3, max_relative = 1e-8);
        assert!(result.titrant_amount("CO2(aq)").unwrap() > 1e-3);
    }

    #[test]
    fn test_titrant_supplies_absent_element() {
        let db = db();
        let system = ChemicalSystem::new(&db, vec![PhaseSpec::aqueous(&CARBONATE)]).unwrap();
        let mut state = ChemicalState::new(&system);
        state.set_species_mass("H2O(aq)", 1.0, "kg").unwrap();
        // no carbon at all until the titrant brings it
        assert_eq!(state.element_amount("C").unwrap(), 0.0);
        let mut specs = EquilibriumSpecs::TP(&system);
        specs.activity("CO2(aq)").unwrap();
        let solver = EquilibriumSolver::new(&specs).unwrap();
        let mut conditions = solver.conditions();
        conditions.temperature(25.0, "C").unwrap();
        conditions.pressure(1.0, "bar").unwrap();
        conditions.activity("CO2(aq)", 1e-2).unwrap();
        let result = solver.solve_with(&mut state, &conditions).unwrap();
        assert!(result.succeeded, "{}", result.message);

        let props = state.props().unwrap();
        assert_relative_eq!(props.species_activity("CO2(aq)").unwrap(), 1e-2, max_relative = 1e-8);
        let q = result.titrant_amount("CO2(aq)").unwrap();
        assert!(q > 1e-2 && q < 1.1e-2, "q = {}", q);
        assert_relative_eq!(state.element_amount("C").unwrap(), q, max_relative = 1e-10);
        assert!(props.charge().abs() < 1e-15, "charge = {:e}", props.charge());
        let ph = props.aqueous().unwrap().pH().unwrap();
        assert!(ph > 3.5 && ph < 5.0, "pH = {}", ph);
    }

    #[test]
    fn test_charge_is_conserved() {
        let db = db();
        for species in [&CARBONATE[..3], &CARBONATE[..]] {
            let system = ChemicalSystem::new(&db, vec![PhaseSpec::aqueous(species)]).unwrap();
            let mut state = ChemicalState::new(&system);
            state.set_species_mass("H2O(aq)", 1.0, "kg").unwrap();
            if species.len() > 3 {
                state.set_species_amount("CO2(aq)", 10.0, "mmol").unwrap();
            }
            assert_eq!(state.charge(), 0.0);
            let solver = EquilibriumSolver::new(&EquilibriumSpecs::TP(&system)).unwrap();
            let result = solver.solve(&mut state).unwrap();
            assert!(result.succeeded, "{}", result.message);
            assert!(state.charge().abs() < 1e-15, "charge = {:e}", state.charge());
        }

        // pure water: H+ and OH- balance each other
        let system =
            ChemicalSystem::new(&db, vec![PhaseSpec::aqueous(&CARBONATE[..3])]).unwrap();
        let mut state = ChemicalState::new(&system);
        state.set_species_mass("H2O(aq)", 1.0, "kg").unwrap();
        let solver = EquilibriumSolver::new(&EquilibriumSpecs::TP(&system)).unwrap();
        assert!(solver.solve(&mut state).unwrap().succeeded);
        assert_relative_eq!(
            state.species_amount("H+").unwrap(),
            state.species_amount("OH-").unwrap(),
            max_relative = 1e-8
        );
    }

    #[test]
    fn test_internal_energy_and_volume_recover_state() {
        let db = db();
        let system =
            ChemicalSystem::new(&db, vec![PhaseSpec::gaseous(&["N2(g)", "O2(g)"])]).unwrap();
        let mut state = ChemicalState::new(&system);
        state.set_temperature(300.0, "K").unwrap();
        state.set_pressure(1.0, "bar").unwrap();
        state.set_species_amount("N2(g)", 0.79, "mol").unwrap();
        state.set_species_amount("O2(g)", 0.21, "mol").unwrap();
        let props = state.props().unwrap();
        let (u0, v0) = (props.internal_energy(), props.volume());
        // start away from the answer in both T and P
        state.set_temperature(450.0, "K").unwrap();
        state.set_pressure(3.0, "bar").unwrap();

        let specs = EquilibriumSpecs::UV(&system);
        let solver = EquilibriumSolver::new(&specs).unwrap();
        let mut conditions = solver.conditions();
        conditions.internal_energy(u0, "J").unwrap();
        conditions.volume(v0, "m3").unwrap();
        let result = solver.solve_with(&mut state, &conditions).unwrap();
        assert!(result.succeeded, "{}", result.message);
        assert_relative_eq!(state.temperature(), 300.0, max_relative = 1e-6);
        assert_relative_eq!(state.pressure(), 1e5, max_relative = 1e-6);
        assert_relative_eq!(result.temperature, state.temperature());
        let props = state.props().unwrap();
        assert_relative_eq!(props.volume(), v0, max_relative = 1e-8);
        assert_relative_eq!(props.internal_energy(), u0, max_relative = 1e-6, epsilon = 1e-3);
    }

    #[test]
    fn test_inert_phase_keeps_amounts() {
        let db = db();
        let system = ChemicalSystem::new(
            &db,
            vec![
                PhaseSpec::aqueous(&CARBONATE),
                PhaseSpec::gaseous(&["CO2(g)", "N2(g)"]),
            ],
        )
        .unwrap();
        let mut state = ChemicalState::new(&system);
        state.set_temperature(25.0, "C").unwrap();
        state.set_species_mass("H2O(aq)", 1.0, "kg").unwrap();
        state.set_species_amount("CO2(g)", 1.0, "mol").unwrap();
        state.set_species_amount("N2(g)", 1.0, "mol").unwrap();
        let mut reacting = state.clone();
        let solver = EquilibriumSolver::new(&EquilibriumSpecs::TP(&system)).unwrap();

        let mut restrictions = EquilibriumRestrictions::new(&system);
        restrictions.cannot_react_phase("GaseousPhase").unwrap();
        assert_eq!(restrictions.inert_species(), vec!["CO2(g)", "N2(g)"]);
        let result = solver
            .solve_with_restrictions(&mut state, &solver.conditions(), Some(&restrictions))
            .unwrap();
        assert!(result.succeeded, "{}", result.message);
        assert_eq!(state.species_amount("CO2(g)").unwrap(), 1.0);
        assert_eq!(state.species_amount("N2(g)").unwrap(), 1.0);
        // the gas holds all the carbon, nothing dissolves
        assert_eq!(state.species_amount("CO2(aq)").unwrap(), 0.0);
        let ph = state.props().unwrap().aqueous().unwrap().pH().unwrap();
        assert_relative_eq!(ph, 7.0, epsilon = 0.02);
        assert!(restrictions.cannot_react_phase("NoSuchPhase").is_err());

        // without the restriction part of the CO2 dissolves
        let result = solver.solve(&mut reacting).unwrap();
        assert!(result.succeeded, "{}", result.message);
        assert!(reacting.species_amount("CO2(g)").unwrap() < 1.0);
        assert!(reacting.species_amount("CO2(aq)").unwrap() > 0.0);
    }

    #[test]
    fn test_fixed_volume_unknown_pressure() {
        let db = db();
        let system =
            ChemicalSystem::new(&db, vec![PhaseSpec::gaseous(&["N2(g)", "O2(g)"])]).unwrap();
        let mut state = ChemicalState::new(&system);
        state.set_species_amount("N2(g)", 0.79, "mol").unwrap();
        state.set_species_amount("O2(g)", 0.21, "mol").unwrap();

        let specs = EquilibriumSpecs::TV(&system);
        let solver = EquilibriumSolver::new(&specs).unwrap();
        let mut conditions = solver.conditions();
        conditions.temperature(300.0, "K").unwrap();
        conditions.volume(10.0, "L").unwrap();
        let result = solver.solve_with(&mut state, &conditions).unwrap();
        assert!(result.succeeded, "{}", result.message);
        let expected = 8.314462618 * 300.0 / 0.01;
        assert_relative_eq!(result.pressure, expected, max_relative = 1e-7);
        assert_relative_eq!(state.pressure(), expected, max_relative = 1e-7);
        assert_relative_eq!(state.species_amount("O2(g)").unwrap(), 0.21, max_relative = 1e-8);
    }

    #[test]
    fn test_expression_constraint() {
        let db = db();
        let system =
            ChemicalSystem::new(&db, vec![PhaseSpec::gaseous(&["N2(g)", "O2(g)"])]).unwrap();
        let mut state = ChemicalState::new(&system);
        state.set_species_amount("N2(g)", 1.0, "mol").unwrap();

        let mut specs = EquilibriumSpecs::new(&system);
        specs.temperature();
        specs.add_constraint_expr("Vfix", "V/Vfix - 1").unwrap();
        let solver = EquilibriumSolver::new(&specs).unwrap();
        let mut conditions = solver.conditions();
        conditions.temperature(400.0, "K").unwrap();
        conditions.set("Vfix", 0.02).unwrap();
        let result = solver.solve_with(&mut state, &conditions).unwrap();
        assert!(result.succeeded, "{}", result.message);
        assert_relative_eq!(
            state.pressure(),
            8.314462618 * 400.0 / 0.02,
            max_relative = 1e-7
        );
    }

    #[test]
    fn test_closure_constraint() {
        let db = db();
        let system =
            ChemicalSystem::new(&db, vec![PhaseSpec::gaseous(&["N2(g)", "O2(g)"])]).unwrap();
        let mut state = ChemicalState::new(&system);
        state.set_species_amount("N2(g)", 1.0, "mol").unwrap();
        state.set_species_amount("O2(g)", 1.0, "mol").unwrap();

        // pressure from a prescribed fugacity of O2
        let mut specs = EquilibriumSpecs::new(&system);
        specs.temperature();
        let o2 = system.species_index("O2(g)").unwrap();
        specs
            .add_constraint("fO2", move |props, f| props.ln_activities()[o2] - f.ln())
            .unwrap();
        let solver = EquilibriumSolver::new(&specs).unwrap();
        let mut conditions = solver.conditions();
        conditions.temperature(350.0, "K").unwrap();
        conditions.set("fO2", 3.0).unwrap();
        let result = solver.solve_with(&mut state, &conditions).unwrap();
        assert!(result.succeeded, "{}", result.message);
        // x(O2) = 0.5, so P = 6 bar
        assert_relative_eq!(state.pressure(), 6e5, max_relative = 1e-7);
    }

    #[test]
    fn test_adiabatic_combustion() {
        let db = db();
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
        let b0 = state.element_amounts();
        // start the temperature iterations near the flame
        state.set_temperature(2000.0, "K").unwrap();

        let specs = EquilibriumSpecs::HP(&system);
        let solver = EquilibriumSolver::new(&specs).unwrap();
        let mut conditions = solver.conditions();
        conditions.pressure(1.0, "bar").unwrap();
        conditions.enthalpy(h0, "J").unwrap();
        let result = solver.solve_with(&mut state, &conditions).unwrap();
        assert!(result.succeeded, "{}", result.message);

        let t = state.temperature();
        assert!(t > 2000.0 && t < 2500.0, "T = {}", t);
        let props = state.props().unwrap();
        assert_relative_eq!(props.enthalpy(), h0, max_relative = 1e-6, epsilon = 1e-3);
        assert!(state.species_amount("CH4(g)").unwrap() < 1e-6);
        assert!(state.species_amount("CO2(g)").unwrap() > 0.8);
        let b = state.element_amounts();
        for i in 0..b.len() {
            assert_relative_eq!(b[i], b0[i], epsilon = 1e-9, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_restrictions_keep_inert_amounts() {
        let db = db();
        let system = calcite_system(&db);
        let mut state = ChemicalState::new(&system);
        state.set_species_mass("H2O(aq)", 1.0, "kg").unwrap();
        state.set_species_amount("CO2(aq)", 0.01, "mol").unwrap();
        state.set_species_amount("Calcite", 1.0, "mol").unwrap();

        let specs = EquilibriumSpecs::TP(&system);
        let solver = EquilibriumSolver::new(&specs).unwrap();
        let mut restrictions = EquilibriumRestrictions::new(&system);
        restrictions.cannot_react("Calcite").unwrap();
        let result = solver
            .solve_with_restrictions(&mut state, &solver.conditions(), Some(&restrictions))
            .unwrap();
        assert!(result.succeeded, "{}", result.message);
        assert_eq!(state.species_amount("Calcite").unwrap(), 1.0);
        // calcium lives only in the inert mineral
        assert_eq!(state.species_amount("Ca+2").unwrap(), 0.0);
        let ph = state.props().unwrap().aqueous().unwrap().pH().unwrap();
        assert!(ph < 5.0);
    }

    #[test]
    fn test_failure_leaves_state_untouched() {
        let db = db();
        let system = calcite_system(&db);
        let mut state = ChemicalState::new(&system);
        state.set_species_mass("H2O(aq)", 1.0, "kg").unwrap();
        state.set_species_amount("Calcite", 1.0, "mol").unwrap();
        let before = state.species_amounts().to_vec();

        let options = EquilibriumOptions {
            max_iterations: 1,
            ..EquilibriumOptions::default()
        };
        let solver = EquilibriumSolver::new(&EquilibriumSpecs::TP(&system))
            .unwrap()
            .with_options(options);
        let result = solver.solve(&mut state).unwrap();
        assert!(!result.succeeded);
        assert_eq!(result.iterations, 1);
        assert!(!result.message.is_empty());
        assert_eq!(state.species_amounts(), before.as_slice());
    }

    #[test]
    fn test_setup_errors() {
        let db = db();
        let system = ChemicalSystem::new(&db, vec![PhaseSpec::aqueous(&CARBONATE)]).unwrap();
        let mut state = ChemicalState::new(&system);
        state.set_species_mass("H2O(aq)", 1.0, "kg").unwrap();

        let mut specs = EquilibriumSpecs::new(&system);
        specs.temperature();
        assert!(matches!(
            EquilibriumSolver::new(&specs),
            Err(EquilibriumError::DegreesOfFreedom { .. })
        ));

        let mut specs = EquilibriumSpecs::TP(&system);
        specs.pH().unwrap();
        let solver = EquilibriumSolver::new(&specs).unwrap();
        assert!(matches!(
            solver.solve(&mut state),
            Err(EquilibriumError::MissingInput(input)) if input == "pH"
        ));

        let other = EquilibriumSpecs::TP(&system);
        let conditions = EquilibriumConditions::new(&other);
        assert!(matches!(
            solver.solve_with(&mut state, &conditions),
            Err(EquilibriumError::MismatchedConditions)
        ));

        let other_system = ChemicalSystem::new(&db, vec![PhaseSpec::aqueous(&CARBONATE)]).unwrap();
        let mut foreign = ChemicalState::new(&other_system);
        foreign.set_species_mass("H2O(aq)", 1.0, "kg").unwrap();
        let solver = EquilibriumSolver::new(&EquilibriumSpecs::TP(&system)).unwrap();
        assert!(matches!(
            solver.solve(&mut foreign),
            Err(EquilibriumError::ForeignState)
        ));
    }
}
