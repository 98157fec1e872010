use super::Database::DatabaseError;
use super::thermo_api::{
    StandardProps, StandardThermoModel, T0, ThermoEnum, ThermoError, element_entropy,
};
use log::warn;
use crate::Thermodynamics::molmass::{molar_mass_of_elements, parse_formula};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AggregateState {
    Aqueous,
    Gas,
    Liquid,
    Solid,
    #[default]
    Undefined,
}

impl AggregateState {
    /// guess from the suffix of the species name: "(aq)", "(g)", "(l)", "(s)", "(cr)"
    pub fn from_name(name: &str) -> Self {
        let lower = name.trim().to_lowercase();
        if lower.ends_with("(aq)") {
            AggregateState::Aqueous
        } else if lower.ends_with("(g)") {
            AggregateState::Gas
        } else if lower.ends_with("(l)") {
            AggregateState::Liquid
        } else if lower.ends_with("(s)") || lower.ends_with("(cr)") || lower.ends_with("(c)") {
            AggregateState::Solid
        } else {
            AggregateState::Undefined
        }
    }
}

impl fmt::Display for AggregateState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            AggregateState::Aqueous => "aqueous",
            AggregateState::Gas => "gas",
            AggregateState::Liquid => "liquid",
            AggregateState::Solid => "solid",
            AggregateState::Undefined => "undefined",
        };
        write!(f, "{}", s)
    }
}

/// species entry as written in a database document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesRecord {
    pub name: String,
    /// chemical formula; the name is parsed when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default)]
    pub aggregate_state: AggregateState,
    /// effective ion size for Debye-Huckel models, Angstrom
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ion_size: Option<f64>,
    pub thermo: ThermoEnum,
}

// absolute Gibbs energy -> apparent Gibbs energy of formation
fn apparent_shift(name: &str, elements: &BTreeMap<String, f64>) -> f64 {
    elements
        .iter()
        .map(|(element, count)| match element_entropy(element) {
            Some(s) => T0 * s * count,
            None => {
                warn!("no reference entropy of element {} in species {}", element, name);
                0.0
            }
        })
        .sum()
}

/// chemical species with its composition and standard thermodynamic model
#[derive(Debug, Clone)]
pub struct Species {
    name: String,
    formula: String,
    elements: BTreeMap<String, f64>,
    charge: f64,
    aggregate_state: AggregateState,
    molar_mass: f64,
    ion_size: Option<f64>,
    thermo: ThermoEnum,
}

impl Species {
    /// builds a species from a database record: parses formula, infers aggregate state and validates the model
    pub fn from_record(record: SpeciesRecord) -> Result<Self, DatabaseError> {
        let formula = record.formula.clone().unwrap_or_else(|| record.name.clone());
        let parsed = parse_formula(&formula, None).map_err(|e| DatabaseError::Formula {
            species: record.name.clone(),
            source: e,
        })?;
        record
            .thermo
            .validate()
            .map_err(|e| DatabaseError::Thermo {
                species: record.name.clone(),
                source: e,
            })?;
        let aggregate_state = match record.aggregate_state {
            AggregateState::Undefined => {
                let from_name = AggregateState::from_name(&record.name);
                if from_name == AggregateState::Undefined && parsed.charge != 0.0 {
                    AggregateState::Aqueous
                } else {
                    from_name
                }
            }
            state => state,
        };
        let molar_mass = molar_mass_of_elements(&parsed.elements) / 1000.0;
        let mut thermo = record.thermo;
        if let ThermoEnum::NASA7(nasa) = &mut thermo {
            nasa.apparent_shift = apparent_shift(&record.name, &parsed.elements);
        }
        Ok(Self {
            name: record.name,
            formula,
            elements: parsed.elements,
            charge: parsed.charge,
            aggregate_state,
            molar_mass,
            ion_size: record.ion_size,
            thermo,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn formula(&self) -> &str {
        &self.formula
    }
    pub fn elements(&self) -> &BTreeMap<String, f64> {
        &self.elements
    }
    /// number of atoms of the element in the formula
    pub fn element_coefficient(&self, element: &str) -> f64 {
        self.elements.get(element).copied().unwrap_or(0.0)
    }
    pub fn charge(&self) -> f64 {
        self.charge
    }
    pub fn aggregate_state(&self) -> AggregateState {
        self.aggregate_state
    }
    /// kg/mol
    pub fn molar_mass(&self) -> f64 {
        self.molar_mass
    }
    pub fn ion_size(&self) -> Option<f64> {
        self.ion_size
    }
    pub fn thermo(&self) -> &ThermoEnum {
        &self.thermo
    }
    pub(crate) fn thermo_mut(&mut self) -> &mut ThermoEnum {
        &mut self.thermo
    }
    pub fn standard_props(&self, t: f64, p: f64) -> Result<StandardProps, ThermoError> {
        self.thermo.standard_props(t, p)
    }
    /// neutral H2O in the aqueous state
    pub fn is_water(&self) -> bool {
        self.charge == 0.0
            && self.elements.len() == 2
            && self.element_coefficient("H") == 2.0
            && self.element_coefficient("O") == 1.0
            && matches!(
                self.aggregate_state,
                AggregateState::Aqueous | AggregateState::Liquid
            )
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} [{}], {}, charge {}, M = {:.4} g/mol, model {}",
            self.name,
            self.formula,
            self.aggregate_state,
            self.charge,
            self.molar_mass * 1000.0,
            self.thermo.model_name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Thermodynamics::DBhandlers::MaierKelleyData::MaierKelleyData;
    use approx::assert_relative_eq;

    fn record(name: &str, state: AggregateState) -> SpeciesRecord {
        SpeciesRecord {
            name: name.to_string(),
            formula: None,
            aggregate_state: state,
            ion_size: None,
            thermo: ThermoEnum::MaierKelley(MaierKelleyData::const_cp(0.0, 0.0, 0.0, 0.0, 0.0)),
        }
    }

    #[test]
    fn test_from_record() {
        let species = Species::from_record(record("HCO3-", AggregateState::Undefined)).unwrap();
        assert_eq!(species.charge(), -1.0);
        assert_eq!(species.aggregate_state(), AggregateState::Aqueous);
        assert_relative_eq!(species.molar_mass(), 0.061016, epsilon = 1e-5);

        let species = Species::from_record(record("CO2(g)", AggregateState::Undefined)).unwrap();
        assert_eq!(species.aggregate_state(), AggregateState::Gas);
        assert_eq!(species.element_coefficient("O"), 2.0);

        let species = Species::from_record(record("H2O(aq)", AggregateState::Undefined)).unwrap();
        assert!(species.is_water());

        let mut calcite = record("Calcite", AggregateState::Solid);
        calcite.formula = Some("CaCO3".to_string());
        let species = Species::from_record(calcite).unwrap();
        assert_eq!(species.formula(), "CaCO3");
        assert!(!species.is_water());
    }

    #[test]
    fn test_bad_formula() {
        let result = Species::from_record(record("Calcite", AggregateState::Solid));
        assert!(matches!(result, Err(DatabaseError::Formula { .. })));
    }

    #[test]
    fn test_record_serde() {
        let json = r#"{"name": "Na+", "ion_size": 4.0,
            "thermo": {"model": "ConstCp", "dG": -261905.0, "dH": -240120.0, "S": 59.0, "Cp": 46.4}}"#;
        let record: SpeciesRecord = serde_json::from_str(json).unwrap();
        let species = Species::from_record(record).unwrap();
        assert_eq!(species.ion_size(), Some(4.0));
        assert_eq!(species.thermo().model_name(), "MaierKelley");
        assert_relative_eq!(
            species.standard_props(298.15, 1e5).unwrap().G0,
            -261905.0,
            epsilon = 1e-9
        );
    }
}
