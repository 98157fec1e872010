//! Values of the inputs declared by one [`EquilibriumSpecs`] instance.
use super::EquilibriumSpecs::{
    EquilibriumError, EquilibriumSpecs, activity_input, chemical_potential_input, fugacity_input,
    phase_amount_input,
};
use crate::Thermodynamics::ChemicalState::{amount_in_mol, pressure_in_pascal, temperature_in_kelvin};
use crate::Thermodynamics::ChemicalSystem::SystemError;
use nalgebra::DVector;

fn energy_in_joule(value: f64, unit: &str) -> Result<f64, SystemError> {
    match unit {
        "J" => Ok(value),
        "kJ" => Ok(value * 1e3),
        "MJ" => Ok(value * 1e6),
        "cal" => Ok(value * 4.184),
        "kcal" => Ok(value * 4184.0),
        _ => Err(SystemError::UnknownUnit(unit.to_string())),
    }
}

fn volume_in_m3(value: f64, unit: &str) -> Result<f64, SystemError> {
    match unit {
        "m3" => Ok(value),
        "L" | "dm3" => Ok(value * 1e-3),
        "mL" | "cm3" => Ok(value * 1e-6),
        _ => Err(SystemError::UnknownUnit(unit.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquilibriumConditions {
    inputs: Vec<String>,
    values: Vec<Option<f64>>,
    initial_element_amounts: Option<DVector<f64>>,
    temperature_bounds: (f64, f64),
    pressure_bounds: (f64, f64),
}

impl EquilibriumConditions {
    pub fn new(specs: &EquilibriumSpecs) -> Self {
        let inputs: Vec<String> = specs.inputs().iter().map(|s| s.to_string()).collect();
        Self {
            values: vec![None; inputs.len()],
            inputs,
            initial_element_amounts: None,
            temperature_bounds: (1.0, 1e4),
            pressure_bounds: (1.0, 1e10),
        }
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Sets a declared input by name, SI units. Temperature, pressure, volume, activities,
    /// fugacities and phase amounts must be positive.
    pub fn set(&mut self, input: &str, value: f64) -> Result<(), EquilibriumError> {
        if !value.is_finite() || (must_be_positive(input) && value <= 0.0) {
            return Err(EquilibriumError::InvalidValue {
                what: input.to_string(),
                value,
            });
        }
        let i = self
            .inputs
            .iter()
            .position(|name| name == input)
            .ok_or_else(|| EquilibriumError::UnknownInput(input.to_string()))?;
        self.values[i] = Some(value);
        Ok(())
    }

    /// value of an input, `MissingInput` when it was never set
    pub fn get(&self, input: &str) -> Result<f64, EquilibriumError> {
        let i = self
            .inputs
            .iter()
            .position(|name| name == input)
            .ok_or_else(|| EquilibriumError::UnknownInput(input.to_string()))?;
        self.values[i].ok_or_else(|| EquilibriumError::MissingInput(input.to_string()))
    }

    /// value of an input if declared and set
    pub fn value(&self, input: &str) -> Option<f64> {
        self.get(input).ok()
    }

    pub fn temperature(&mut self, value: f64, unit: &str) -> Result<(), EquilibriumError> {
        self.set("T", temperature_in_kelvin(value, unit)?)
    }
    pub fn pressure(&mut self, value: f64, unit: &str) -> Result<(), EquilibriumError> {
        self.set("P", pressure_in_pascal(value, unit)?)
    }
    pub fn volume(&mut self, value: f64, unit: &str) -> Result<(), EquilibriumError> {
        self.set("V", volume_in_m3(value, unit)?)
    }
    pub fn internal_energy(&mut self, value: f64, unit: &str) -> Result<(), EquilibriumError> {
        self.set("U", energy_in_joule(value, unit)?)
    }
    pub fn enthalpy(&mut self, value: f64, unit: &str) -> Result<(), EquilibriumError> {
        self.set("H", energy_in_joule(value, unit)?)
    }
    /// J/K or kJ/K
    pub fn entropy(&mut self, value: f64, unit: &str) -> Result<(), EquilibriumError> {
        let unit = unit.strip_suffix("/K").unwrap_or(unit);
        self.set("S", energy_in_joule(value, unit)?)
    }
    pub fn gibbs_energy(&mut self, value: f64, unit: &str) -> Result<(), EquilibriumError> {
        self.set("G", energy_in_joule(value, unit)?)
    }
    pub fn helmholtz_energy(&mut self, value: f64, unit: &str) -> Result<(), EquilibriumError> {
        self.set("A", energy_in_joule(value, unit)?)
    }
    #[allow(non_snake_case)]
    pub fn pH(&mut self, value: f64) -> Result<(), EquilibriumError> {
        self.set("pH", value)
    }
    pub fn activity(&mut self, species: &str, value: f64) -> Result<(), EquilibriumError> {
        self.set(&activity_input(species), value)
    }
    /// value in the unit of pressure given, stored in bar
    pub fn fugacity(&mut self, gas: &str, value: f64, unit: &str) -> Result<(), EquilibriumError> {
        self.set(&fugacity_input(gas), pressure_in_pascal(value, unit)? / 1e5)
    }
    /// J/mol or kJ/mol
    pub fn chemical_potential(&mut self, species: &str, value: f64, unit: &str) -> Result<(), EquilibriumError> {
        let unit = unit.strip_suffix("/mol").unwrap_or(unit);
        self.set(&chemical_potential_input(species), energy_in_joule(value, unit)?)
    }
    pub fn phase_amount(&mut self, phase: &str, value: f64, unit: &str) -> Result<(), EquilibriumError> {
        self.set(&phase_amount_input(phase), amount_in_mol(value, unit)?)
    }

    /// element and charge amounts used instead of those of the initial state
    pub fn set_initial_element_amounts(&mut self, b: DVector<f64>) {
        self.initial_element_amounts = Some(b);
    }
    pub fn initial_element_amounts(&self) -> Option<&DVector<f64>> {
        self.initial_element_amounts.as_ref()
    }

    /// bounds of an unknown temperature, K
    pub fn set_temperature_bounds(&mut self, lower: f64, upper: f64) -> Result<(), EquilibriumError> {
        self.temperature_bounds = check_bounds("temperature", lower, upper)?;
        Ok(())
    }
    /// bounds of an unknown pressure, Pa
    pub fn set_pressure_bounds(&mut self, lower: f64, upper: f64) -> Result<(), EquilibriumError> {
        self.pressure_bounds = check_bounds("pressure", lower, upper)?;
        Ok(())
    }
    pub fn temperature_bounds(&self) -> (f64, f64) {
        self.temperature_bounds
    }
    pub fn pressure_bounds(&self) -> (f64, f64) {
        self.pressure_bounds
    }
}

// inputs that enter the residuals through a logarithm or as a divisor
fn must_be_positive(input: &str) -> bool {
    matches!(input, "T" | "P" | "V")
        || ["activity[", "fugacity[", "amount["]
            .iter()
            .any(|prefix| input.starts_with(prefix))
}

fn check_bounds(what: &str, lower: f64, upper: f64) -> Result<(f64, f64), EquilibriumError> {
    if !(lower > 0.0 && upper > lower && upper.is_finite()) {
        return Err(EquilibriumError::InvalidValue {
            what: format!("{} bounds ({}, {})", what, lower, upper),
            value: upper - lower,
        });
    }
    Ok((lower, upper))
}
