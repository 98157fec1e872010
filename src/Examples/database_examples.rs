use crate::Thermodynamics::ChemicalSystem::{ChemicalSystem, PhaseSpec};
use crate::Thermodynamics::DBhandlers::Database::Database;
use crate::Thermodynamics::DBhandlers::Species::AggregateState;
use crate::Thermodynamics::DBhandlers::thermo_api::log10_k;
use crate::Utils::load_from_file::LoadData;
use prettytable::{Table, row};

pub fn database_examples(task: usize) {
    match task {
        0 => {
            // the built-in database: all species, then a selection by elements
            let db = Database::built_in().unwrap();
            db.print_species_table();
            let carbonates = db
                .species_with_elements(&["Ca", "C", "O", "H"], Some(AggregateState::Aqueous))
                .unwrap();
            println!("aqueous species of Ca-C-O-H:");
            for s in &carbonates {
                println!("  {} (M = {:.4} g/mol, charge {})", s.name(), s.molar_mass(), s.charge());
            }
            // standard properties of water vapour over temperature
            let water = db.species("H2O(g)").unwrap();
            let mut table = Table::new();
            table.add_row(row!["T, K", "G0, J/mol", "H0, J/mol", "S0, J/mol/K", "Cp0, J/mol/K"]);
            for t in [298.15, 500.0, 1000.0, 2000.0] {
                let p = water.standard_props(t, 1e5).unwrap();
                table.add_row(row![t, p.G0, p.H0, p.S0, p.Cp0]);
            }
            table.printstd();
            // equilibrium constant of calcite dissolution
            let terms = [
                (-1.0, db.species("Calcite").unwrap()),
                (1.0, db.species("Ca+2").unwrap()),
                (1.0, db.species("CO3-2").unwrap()),
            ];
            let terms: Vec<_> = terms.iter().map(|(nu, s)| (*nu, s.thermo())).collect();
            for t in [298.15, 323.15, 348.15] {
                println!("log10 Ksp(Calcite) at {} K = {:.4}", t, log10_k(&terms, t, 1e5).unwrap());
            }
        }
        1 => {
            // phases from a list of species stored in a text file
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("species.txt");
            std::fs::write(&path, "SPECIES LIST\nH2O(aq), H+, OH-\nNa+, Cl-\n").unwrap();
            let names = LoadData::new(path.to_string_lossy().to_string())
                .load_species_list()
                .unwrap();
            let names: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
            let db = Database::built_in().unwrap();
            let system = ChemicalSystem::new(
                &db,
                vec![PhaseSpec::aqueous(&names), PhaseSpec::mineral("Halite")],
            )
            .unwrap();
            system.print_phases();
            system.print_formula_matrix();
        }
        _ => println!("Invalid task number"),
    }
}
