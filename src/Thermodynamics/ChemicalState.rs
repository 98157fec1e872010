//! Temperature, pressure and species amounts of one chemical system.
//! The state is owned by the caller; the equilibrium solver updates it in place.
use super::ChemicalProps::ChemicalProps;
use super::ChemicalSystem::{ChemicalSystem, SystemError};
use nalgebra::DVector;
use prettytable::{Table, row};

/// temperature in K from a value in "K", "C" (or "degC") or "F"
pub fn temperature_in_kelvin(value: f64, unit: &str) -> Result<f64, SystemError> {
    match unit {
        "K" => Ok(value),
        "C" | "degC" | "°C" => Ok(value + 273.15),
        "F" | "degF" => Ok((value - 32.0) * 5.0 / 9.0 + 273.15),
        _ => Err(SystemError::UnknownUnit(unit.to_string())),
    }
}

/// pressure in Pa from "Pa", "kPa", "MPa", "bar", "atm" or "psi"
pub fn pressure_in_pascal(value: f64, unit: &str) -> Result<f64, SystemError> {
    let factor = match unit {
        "Pa" => 1.0,
        "kPa" => 1e3,
        "MPa" => 1e6,
        "bar" => 1e5,
        "atm" => 101325.0,
        "psi" => 6894.757293168,
        _ => return Err(SystemError::UnknownUnit(unit.to_string())),
    };
    Ok(value * factor)
}

/// amount in mol from "mol", "mmol", "umol" or "kmol"
pub fn amount_in_mol(value: f64, unit: &str) -> Result<f64, SystemError> {
    let factor = match unit {
        "mol" => 1.0,
        "mmol" => 1e-3,
        "umol" | "µmol" => 1e-6,
        "kmol" => 1e3,
        _ => return Err(SystemError::UnknownUnit(unit.to_string())),
    };
    Ok(value * factor)
}

/// mass in kg from "kg", "g", "mg" or "ug"
pub fn mass_in_kg(value: f64, unit: &str) -> Result<f64, SystemError> {
    let factor = match unit {
        "kg" => 1.0,
        "g" => 1e-3,
        "mg" => 1e-6,
        "ug" | "µg" => 1e-9,
        _ => return Err(SystemError::UnknownUnit(unit.to_string())),
    };
    Ok(value * factor)
}

fn check_amount(what: &str, value: f64) -> Result<f64, SystemError> {
    if !value.is_finite() || value < 0.0 {
        return Err(SystemError::InvalidValue {
            what: what.to_string(),
            value,
        });
    }
    Ok(value)
}

#[derive(Debug, Clone)]
pub struct ChemicalState<'a> {
    system: &'a ChemicalSystem,
    temperature: f64,
    pressure: f64,
    n: Vec<f64>,
}

impl<'a> ChemicalState<'a> {
    /// 25 C, 1 bar, all amounts zero
    pub fn new(system: &'a ChemicalSystem) -> Self {
        Self {
            system,
            temperature: 298.15,
            pressure: 1e5,
            n: vec![0.0; system.num_species()],
        }
    }

    pub fn system(&self) -> &'a ChemicalSystem {
        self.system
    }

    /// K
    pub fn temperature(&self) -> f64 {
        self.temperature
    }
    /// Pa
    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    pub fn set_temperature(&mut self, value: f64, unit: &str) -> Result<(), SystemError> {
        let t = temperature_in_kelvin(value, unit)?;
        if !(t.is_finite() && t > 0.0) {
            return Err(SystemError::InvalidValue {
                what: "temperature".to_string(),
                value: t,
            });
        }
        self.temperature = t;
        Ok(())
    }

    pub fn set_pressure(&mut self, value: f64, unit: &str) -> Result<(), SystemError> {
        let p = pressure_in_pascal(value, unit)?;
        if !(p.is_finite() && p > 0.0) {
            return Err(SystemError::InvalidValue {
                what: "pressure".to_string(),
                value: p,
            });
        }
        self.pressure = p;
        Ok(())
    }

    pub fn set_species_amount(
        &mut self,
        name: &str,
        value: f64,
        unit: &str,
    ) -> Result<(), SystemError> {
        let i = self.system.species_index(name)?;
        self.n[i] = check_amount(name, amount_in_mol(value, unit)?)?;
        Ok(())
    }

    pub fn add_species_amount(
        &mut self,
        name: &str,
        value: f64,
        unit: &str,
    ) -> Result<(), SystemError> {
        let i = self.system.species_index(name)?;
        self.n[i] = check_amount(name, self.n[i] + amount_in_mol(value, unit)?)?;
        Ok(())
    }

    /// amount from mass and the molar mass of the species
    pub fn set_species_mass(&mut self, name: &str, value: f64, unit: &str) -> Result<(), SystemError> {
        let i = self.system.species_index(name)?;
        let molar_mass = self.system.species()[i].molar_mass();
        self.n[i] = check_amount(name, mass_in_kg(value, unit)? / molar_mass)?;
        Ok(())
    }

    pub fn add_species_mass(&mut self, name: &str, value: f64, unit: &str) -> Result<(), SystemError> {
        let i = self.system.species_index(name)?;
        let molar_mass = self.system.species()[i].molar_mass();
        self.n[i] = check_amount(name, self.n[i] + mass_in_kg(value, unit)? / molar_mass)?;
        Ok(())
    }

    /// mol
    pub fn species_amount(&self, name: &str) -> Result<f64, SystemError> {
        Ok(self.n[self.system.species_index(name)?])
    }

    /// kg
    pub fn species_mass(&self, name: &str) -> Result<f64, SystemError> {
        let i = self.system.species_index(name)?;
        Ok(self.n[i] * self.system.species()[i].molar_mass())
    }

    pub fn species_amounts(&self) -> &[f64] {
        &self.n
    }

    pub fn set_species_amounts(&mut self, n: &[f64]) -> Result<(), SystemError> {
        if n.len() != self.n.len() {
            return Err(SystemError::InvalidValue {
                what: "length of amounts vector".to_string(),
                value: n.len() as f64,
            });
        }
        for (i, value) in n.iter().enumerate() {
            check_amount(self.system.species()[i].name(), *value)?;
        }
        self.n.copy_from_slice(n);
        Ok(())
    }

    /// multiplies all species amounts by the factor
    pub fn scale_amounts(&mut self, factor: f64) -> Result<(), SystemError> {
        check_amount("scaling factor", factor)?;
        self.n.iter_mut().for_each(|ni| *ni *= factor);
        Ok(())
    }

    /// multiplies amounts of the phase species so that the phase has the given total amount
    pub fn scale_phase_amount(
        &mut self,
        phase: &str,
        value: f64,
        unit: &str,
    ) -> Result<(), SystemError> {
        let p = self.system.phase_index(phase)?;
        let target = check_amount(phase, amount_in_mol(value, unit)?)?;
        let range = self.system.phases()[p].species_range.clone();
        let current: f64 = self.n[range.clone()].iter().sum();
        if current <= 0.0 {
            return Err(SystemError::InvalidValue {
                what: format!("amount of phase {}", phase),
                value: current,
            });
        }
        self.n[range]
            .iter_mut()
            .for_each(|ni| *ni *= target / current);
        Ok(())
    }

    /// mol
    pub fn phase_amount(&self, phase: &str) -> Result<f64, SystemError> {
        let p = self.system.phase_index(phase)?;
        Ok(self.n[self.system.phases()[p].species_range.clone()]
            .iter()
            .sum())
    }

    /// amounts of elements and electric charge b = A n
    pub fn element_amounts(&self) -> DVector<f64> {
        self.system.element_amounts(&self.n)
    }

    /// amount of the element (or "Z" for the charge)
    pub fn element_amount(&self, element: &str) -> Result<f64, SystemError> {
        let row = self.system.element_index(element)?;
        Ok(self.element_amounts()[row])
    }

    pub fn charge(&self) -> f64 {
        self.element_amounts()[self.system.num_elements()]
    }

    /// thermodynamic properties of the state
    pub fn props(&self) -> Result<ChemicalProps<'a>, SystemError> {
        ChemicalProps::compute(self.system, self.temperature, self.pressure, self.n.clone())
    }

    /// solver entry: replaces all conditions at once
    pub(crate) fn update(&mut self, t: f64, p: f64, n: &[f64]) {
        self.temperature = t;
        self.pressure = p;
        self.n.copy_from_slice(n);
    }

    pub fn pretty_print(&self) {
        println!(
            "___________________CHEMICAL STATE: T = {:.2} K, P = {:.1} Pa________________________",
            self.temperature, self.pressure
        );
        let mut table = Table::new();
        table.add_row(row!["Species", "Phase", "Amount, mol", "Mass, kg"]);
        for (i, s) in self.system.species().iter().enumerate() {
            let phase = &self.system.phases()[self.system.phase_of_species(i)].name;
            table.add_row(row![
                s.name(),
                phase,
                format!("{:.6e}", self.n[i]),
                format!("{:.6e}", self.n[i] * s.molar_mass())
            ]);
        }
        table.printstd();
    }
}
