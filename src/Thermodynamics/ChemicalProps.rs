//! # Chemical properties
//!
//! Thermodynamic properties of a composition n of a chemical system at (T, P): standard properties of
//! every species, activity coefficients and activities from the phase models, chemical potentials
//! mu_i = G0_i + R T ln a_i, and the extensive properties of the whole system
//!
//! G = sum n_i mu_i, H = sum n_i H_i, S = sum n_i S_i, U = H - P V, A = U - T S
//!
//! where partial molar enthalpy and entropy include the temperature dependence of activities:
//! H_i = H0_i - R T^2 d(ln a_i)/dT, S_i = S0_i - R ln a_i - R T d(ln a_i)/dT.
//! Species with zero amount contribute nothing to the sums. A phase with zero total amount is evaluated
//! at a uniform composition so that the chemical potentials of its species stay finite.
use super::ActivityModels::{ActivityModel, ActivityProps};
use super::AqueousProps::AqueousProps;
use super::ChemicalSystem::{ChemicalSystem, SystemError};
use super::DBhandlers::thermo_api::{R, StandardProps, check_state};
use log::debug;
use nalgebra::DVector;
use prettytable::{Table, row};

/// relative temperature increment of the activity derivatives
const DT_REL: f64 = 1e-5;

#[derive(Debug, Clone)]
pub struct ChemicalProps<'a> {
    system: &'a ChemicalSystem,
    temperature: f64,
    pressure: f64,
    n: Vec<f64>,
    standard: Vec<StandardProps>,
    ln_g: Vec<f64>,
    ln_a: Vec<f64>,
    dln_a_dt: Vec<f64>,
}

fn phase_activities(
    system: &ChemicalSystem,
    phase: usize,
    t: f64,
    p: f64,
    n: &[f64],
) -> ActivityProps {
    let ph = &system.phases()[phase];
    let n_phase = &n[ph.species_range.clone()];
    let total: f64 = n_phase.iter().sum();
    if total > 0.0 {
        ph.model.activity_props(t, p, n_phase)
    } else {
        ph.model.activity_props(t, p, &vec![1.0; n_phase.len()])
    }
}

impl<'a> ChemicalProps<'a> {
    pub fn compute(
        system: &'a ChemicalSystem,
        t: f64,
        p: f64,
        n: Vec<f64>,
    ) -> Result<Self, SystemError> {
        check_state(t, p)?;
        if n.len() != system.num_species() {
            return Err(SystemError::InvalidValue {
                what: "length of amounts vector".to_string(),
                value: n.len() as f64,
            });
        }
        let standard = system
            .species()
            .iter()
            .map(|s| s.standard_props(t, p))
            .collect::<Result<Vec<_>, _>>()?;
        let ns = system.num_species();
        let mut ln_g = vec![0.0; ns];
        let mut ln_a = vec![0.0; ns];
        let mut dln_a_dt = vec![0.0; ns];
        let dt = DT_REL * t;
        for (k, phase) in system.phases().iter().enumerate() {
            let range = phase.species_range.clone();
            let act = phase_activities(system, k, t, p, &n);
            let up = phase_activities(system, k, t + dt, p, &n);
            let down = phase_activities(system, k, t - dt, p, &n);
            for (local, i) in range.enumerate() {
                ln_g[i] = act.ln_g[local];
                ln_a[i] = act.ln_a[local];
                let d = (up.ln_a[local] - down.ln_a[local]) / (2.0 * dt);
                dln_a_dt[i] = if d.is_finite() { d } else { 0.0 };
            }
        }
        debug!("chemical props at T = {} K, P = {} Pa computed", t, p);
        Ok(Self {
            system,
            temperature: t,
            pressure: p,
            n,
            standard,
            ln_g,
            ln_a,
            dln_a_dt,
        })
    }

    pub fn system(&self) -> &'a ChemicalSystem {
        self.system
    }
    pub fn temperature(&self) -> f64 {
        self.temperature
    }
    pub fn pressure(&self) -> f64 {
        self.pressure
    }
    pub fn species_amounts(&self) -> &[f64] {
        &self.n
    }
    pub fn species_amount(&self, name: &str) -> Result<f64, SystemError> {
        Ok(self.n[self.system.species_index(name)?])
    }
    pub fn amount(&self) -> f64 {
        self.n.iter().sum()
    }
    pub fn standard_props(&self) -> &[StandardProps] {
        &self.standard
    }
    pub fn ln_activity_coefficients(&self) -> &[f64] {
        &self.ln_g
    }
    pub fn ln_activities(&self) -> &[f64] {
        &self.ln_a
    }

    pub fn species_ln_activity(&self, name: &str) -> Result<f64, SystemError> {
        Ok(self.ln_a[self.system.species_index(name)?])
    }

    pub fn species_activity(&self, name: &str) -> Result<f64, SystemError> {
        Ok(self.species_ln_activity(name)?.exp())
    }

    /// J/mol
    pub fn chemical_potentials(&self) -> Vec<f64> {
        let rt = R * self.temperature;
        self.standard
            .iter()
            .zip(self.ln_a.iter())
            .map(|(s, ln_a)| s.G0 + rt * ln_a)
            .collect()
    }

    pub fn species_chemical_potential(&self, name: &str) -> Result<f64, SystemError> {
        let i = self.system.species_index(name)?;
        Ok(self.standard[i].G0 + R * self.temperature * self.ln_a[i])
    }

    /// mole fractions inside each phase
    pub fn mole_fractions(&self) -> Vec<f64> {
        let mut x = vec![0.0; self.n.len()];
        for phase in self.system.phases() {
            let range = phase.species_range.clone();
            let total: f64 = self.n[range.clone()].iter().sum();
            if total > 0.0 {
                for i in range {
                    x[i] = self.n[i] / total;
                }
            }
        }
        x
    }

    /// mol
    pub fn phase_amount(&self, phase: &str) -> Result<f64, SystemError> {
        let k = self.system.phase_index(phase)?;
        Ok(self.phase_amount_at(k))
    }

    fn phase_amount_at(&self, k: usize) -> f64 {
        self.n[self.system.phases()[k].species_range.clone()]
            .iter()
            .sum()
    }

    /// kg
    pub fn phase_mass(&self, phase: &str) -> Result<f64, SystemError> {
        let k = self.system.phase_index(phase)?;
        Ok(self.system.phases()[k]
            .species_range
            .clone()
            .map(|i| self.n[i] * self.system.species()[i].molar_mass())
            .sum())
    }

    /// m3
    pub fn phase_volume(&self, phase: &str) -> Result<f64, SystemError> {
        let k = self.system.phase_index(phase)?;
        Ok(self.phase_volume_at(k))
    }

    // ideal gas volume for gaseous phases, sum of standard volumes otherwise
    fn phase_volume_at(&self, k: usize) -> f64 {
        let phase = &self.system.phases()[k];
        if phase.model.is_gas() {
            self.phase_amount_at(k) * R * self.temperature / self.pressure
        } else {
            phase
                .species_range
                .clone()
                .map(|i| self.n[i] * self.standard[i].V0)
                .sum()
        }
    }

    // sum over species with nonzero amounts
    fn sum_present(&self, f: impl Fn(usize) -> f64) -> f64 {
        (0..self.n.len())
            .filter(|&i| self.n[i] > 0.0)
            .map(|i| self.n[i] * f(i))
            .sum()
    }

    /// J
    pub fn gibbs_energy(&self) -> f64 {
        let rt = R * self.temperature;
        self.sum_present(|i| self.standard[i].G0 + rt * self.ln_a[i])
    }

    /// J
    pub fn enthalpy(&self) -> f64 {
        let t = self.temperature;
        self.sum_present(|i| self.standard[i].H0 - R * t * t * self.dln_a_dt[i])
    }

    /// J/K
    pub fn entropy(&self) -> f64 {
        let t = self.temperature;
        self.sum_present(|i| self.standard[i].S0 - R * self.ln_a[i] - R * t * self.dln_a_dt[i])
    }

    /// m3
    pub fn volume(&self) -> f64 {
        (0..self.system.phases().len())
            .map(|k| self.phase_volume_at(k))
            .sum()
    }

    /// J
    pub fn internal_energy(&self) -> f64 {
        self.enthalpy() - self.pressure * self.volume()
    }

    /// J
    pub fn helmholtz_energy(&self) -> f64 {
        self.internal_energy() - self.temperature * self.entropy()
    }

    /// J/K, sum of standard heat capacities
    pub fn heat_capacity_cp(&self) -> f64 {
        self.sum_present(|i| self.standard[i].Cp0)
    }

    pub fn element_amounts(&self) -> DVector<f64> {
        self.system.element_amounts(&self.n)
    }

    pub fn element_amount(&self, element: &str) -> Result<f64, SystemError> {
        let row = self.system.element_index(element)?;
        Ok(self.element_amounts()[row])
    }

    pub fn charge(&self) -> f64 {
        self.element_amounts()[self.system.num_elements()]
    }

    /// fugacity of a species of an ideal gas phase, bar
    pub fn fugacity(&self, name: &str) -> Result<f64, SystemError> {
        let i = self.system.species_index(name)?;
        let phase = &self.system.phases()[self.system.phase_of_species(i)];
        if !phase.model.is_gas() {
            return Err(SystemError::NotAGas(name.to_string()));
        }
        Ok(self.ln_a[i].exp())
    }

    /// properties of the aqueous phase
    pub fn aqueous(&self) -> Result<AqueousProps<'_>, SystemError> {
        AqueousProps::new(self)
    }

    pub fn pretty_print(&self) {
        println!(
            "___________________CHEMICAL PROPERTIES: T = {:.2} K, P = {:.1} Pa________________________",
            self.temperature, self.pressure
        );
        let mut table = Table::new();
        table.add_row(row!["Property", "Value", "Unit"]);
        table.add_row(row!["Temperature", format!("{:.4}", self.temperature), "K"]);
        table.add_row(row!["Pressure", format!("{:.4}", self.pressure), "Pa"]);
        table.add_row(row!["Volume", format!("{:.6e}", self.volume()), "m3"]);
        table.add_row(row!["Gibbs energy", format!("{:.6e}", self.gibbs_energy()), "J"]);
        table.add_row(row!["Enthalpy", format!("{:.6e}", self.enthalpy()), "J"]);
        table.add_row(row!["Entropy", format!("{:.6e}", self.entropy()), "J/K"]);
        table.add_row(row!["Internal energy", format!("{:.6e}", self.internal_energy()), "J"]);
        table.add_row(row!["Helmholtz energy", format!("{:.6e}", self.helmholtz_energy()), "J"]);
        table.add_row(row!["Heat capacity Cp", format!("{:.6e}", self.heat_capacity_cp()), "J/K"]);
        table.printstd();

        let mut species = Table::new();
        species.add_row(row!["Species", "Amount, mol", "Mole fraction", "ln(gamma)", "Activity", "mu, J/mol"]);
        let x = self.mole_fractions();
        let mu = self.chemical_potentials();
        for (i, s) in self.system.species().iter().enumerate() {
            species.add_row(row![
                s.name(),
                format!("{:.6e}", self.n[i]),
                format!("{:.6e}", x[i]),
                format!("{:.4}", self.ln_g[i]),
                format!("{:.6e}", self.ln_a[i].exp()),
                format!("{:.2}", mu[i])
            ]);
        }
        species.printstd();
    }
}
