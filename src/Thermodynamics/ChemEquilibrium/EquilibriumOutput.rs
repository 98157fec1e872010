use super::EquilibriumConditions::EquilibriumConditions;
use super::EquilibriumSolver::EquilibriumResult;
use super::EquilibriumSpecs::EquilibriumSpecs;
use crate::Thermodynamics::ChemicalState::ChemicalState;
use crate::Thermodynamics::ChemicalSystem::ChemicalSystem;
use prettytable::{Table, row};

////////////////////////INPUT/OUTPUT////////////////////////////////////////////////////////

impl EquilibriumResult {
    /// Prints the convergence summary, titrant amounts and element potentials
    pub fn pretty_print(&self, system: &ChemicalSystem) {
        println!("___________________EQUILIBRIUM RESULT________________________");
        let mut table = Table::new();
        table.add_row(row!["succeeded", self.succeeded]);
        table.add_row(row!["iterations", self.iterations]);
        table.add_row(row!["max residual", format!("{:.3e}", self.residual)]);
        table.add_row(row!["message", self.message]);
        if self.succeeded {
            table.add_row(row!["T, K", format!("{:.3}", self.temperature)]);
            table.add_row(row!["P, Pa", format!("{:.1}", self.pressure)]);
        }
        table.printstd();
        if !self.titrant_amounts.is_empty() {
            let mut table = Table::new();
            table.add_row(row!["Titrant", "Amount added, mol"]);
            for (name, q) in &self.titrant_amounts {
                table.add_row(row![name, format!("{:.6e}", q)]);
            }
            table.printstd();
        }
        if self.element_potentials.len() == system.num_components() {
            let mut table = Table::new();
            table.add_row(row!["Element", "Potential / RT"]);
            for (j, element) in system.elements().iter().enumerate() {
                table.add_row(row![element, format!("{:.6}", self.element_potentials[j])]);
            }
            table.add_row(row!["Z", format!("{:.6}", self.element_potentials[system.num_elements()])]);
            table.printstd();
        }
    }
}

impl EquilibriumSpecs<'_> {
    /// Prints inputs, unknowns and titrants
    pub fn pretty_print(&self) {
        println!("___________________EQUILIBRIUM SPECIFICATIONS________________________");
        let mut table = Table::new();
        table.add_row(row!["Inputs", self.inputs().join(", ")]);
        let mut unknowns = Vec::new();
        if !self.is_temperature_input() {
            unknowns.push("T".to_string());
        }
        if !self.is_pressure_input() {
            unknowns.push("P".to_string());
        }
        unknowns.extend(self.titrants().iter().map(|t| format!("q[{}]", t.name)));
        table.add_row(row!["Unknowns", unknowns.join(", ")]);
        for c in self.constraints() {
            table.add_row(row![format!("equation for {}", c.input), format!("{:?}", c.kind)]);
        }
        table.printstd();
    }
}

impl EquilibriumConditions {
    pub fn pretty_print(&self) {
        let mut table = Table::new();
        table.add_row(row!["Input", "Value"]);
        for input in self.inputs() {
            let value = self
                .value(input)
                .map(|v| format!("{:.6e}", v))
                .unwrap_or_else(|| "from state".to_string());
            table.add_row(row![input, value]);
        }
        table.printstd();
    }
}

/// species with an amount above `threshold` (mol), largest first
pub fn species_table(state: &ChemicalState, threshold: f64) -> Table {
    let system = state.system();
    let mut rows: Vec<(usize, f64)> = state
        .species_amounts()
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, n)| *n > threshold)
        .collect();
    rows.sort_by(|a, b| b.1.total_cmp(&a.1));
    let mut table = Table::new();
    table.add_row(row!["Species", "Phase", "Amount, mol"]);
    for (i, n) in rows {
        let phase = &system.phases()[system.phase_of_species(i)].name;
        table.add_row(row![system.species()[i].name(), phase, format!("{:.6e}", n)]);
    }
    table
}

pub fn print_species_amounts(state: &ChemicalState, threshold: f64) {
    println!(
        "___________________SPECIES AT T = {:.2} K, P = {:.1} Pa________________________",
        state.temperature(),
        state.pressure()
    );
    species_table(state, threshold).printstd();
}

/// initial and final amounts side by side
pub fn print_comparison(initial: &ChemicalState, equilibrium: &ChemicalState) {
    let mut table = Table::new();
    table.add_row(row!["Species", "Initial, mol", "Equilibrium, mol", "Change, mol"]);
    let n0 = initial.species_amounts();
    let n = equilibrium.species_amounts();
    for (i, s) in equilibrium.system().species().iter().enumerate() {
        table.add_row(row![
            s.name(),
            format!("{:.6e}", n0[i]),
            format!("{:.6e}", n[i]),
            format!("{:.3e}", n[i] - n0[i])
        ]);
    }
    table.printstd();
}
