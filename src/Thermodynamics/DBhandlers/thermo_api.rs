use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::MaierKelleyData::MaierKelleyData;
use super::NASAdata::NASAdata;
use super::ReactionData::ReactionData;

/// universal gas constant, J/(mol K)
pub const R: f64 = 8.314462618;
/// reference temperature, K
pub const T0: f64 = 298.15;
/// reference pressure, Pa
pub const P0: f64 = 1e5;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ThermoError {
    #[error("No coefficients found for temperature {temperature} K. Valid range: {range}")]
    NoCoefficientsFound { temperature: f64, range: String },
    #[error("Invalid temperature range in coefficient data")]
    InvalidTemperatureRange,
    #[error("Invalid parameters of thermodynamic model: {0}")]
    InvalidParameters(String),
    #[error("Reaction model of species '{0}' was not resolved against a database")]
    UnresolvedReaction(String),
    #[error("Invalid state: T = {temperature} K, P = {pressure} Pa")]
    InvalidState { temperature: f64, pressure: f64 },
}

/// standard molar properties of a species at (T, P), SI units
#[allow(non_snake_case)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StandardProps {
    /// standard Gibbs energy, J/mol
    pub G0: f64,
    /// standard enthalpy, J/mol
    pub H0: f64,
    /// standard entropy, J/(mol K)
    pub S0: f64,
    /// standard isobaric heat capacity, J/(mol K)
    pub Cp0: f64,
    /// standard molar volume, m3/mol
    pub V0: f64,
}

impl StandardProps {
    /// linear combination sum(coef * props)
    pub fn combine(terms: &[(f64, StandardProps)]) -> StandardProps {
        terms
            .iter()
            .fold(StandardProps::default(), |acc, (nu, p)| StandardProps {
                G0: acc.G0 + nu * p.G0,
                H0: acc.H0 + nu * p.H0,
                S0: acc.S0 + nu * p.S0,
                Cp0: acc.Cp0 + nu * p.Cp0,
                V0: acc.V0 + nu * p.V0,
            })
    }
}

pub(crate) fn check_state(t: f64, p: f64) -> Result<(), ThermoError> {
    if !(t.is_finite() && t > 0.0 && p.is_finite() && p > 0.0) {
        return Err(ThermoError::InvalidState {
            temperature: t,
            pressure: p,
        });
    }
    Ok(())
}

/// common interface of the standard thermodynamic models of species
#[enum_dispatch]
pub trait StandardThermoModel {
    /// standard properties at temperature t (K) and pressure p (Pa)
    fn standard_props(&self, t: f64, p: f64) -> Result<StandardProps, ThermoError>;
    /// name of the model as written in database documents
    fn model_name(&self) -> &'static str;
    /// validity interval of temperature if the model has one
    fn temperature_range(&self) -> Option<(f64, f64)>;
    /// checks the parameters right after deserialization
    fn validate(&self) -> Result<(), ThermoError>;
}

/// closed set of standard thermodynamic models
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "model")]
#[enum_dispatch(StandardThermoModel)]
pub enum ThermoEnum {
    #[serde(alias = "NASA", alias = "nasa7")]
    NASA7(NASAdata),
    #[serde(alias = "ConstCp", alias = "HKF_const")]
    MaierKelley(MaierKelleyData),
    #[serde(alias = "FormationReaction")]
    Reaction(ReactionData),
}

impl ThermoEnum {
    /// species that must be resolved before this model can be evaluated
    pub fn dependencies(&self) -> Vec<String> {
        match self {
            ThermoEnum::Reaction(r) => r.reactants.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }
}

/// Gibbs energy per RT, the quantity entering equilibrium equations
pub fn g0_over_rt(model: &ThermoEnum, t: f64, p: f64) -> Result<f64, ThermoError> {
    Ok(model.standard_props(t, p)?.G0 / (R * t))
}

/// log10 of the equilibrium constant of the reaction sum(nu_i * species_i) = 0
pub fn log10_k(terms: &[(f64, &ThermoEnum)], t: f64, p: f64) -> Result<f64, ThermoError> {
    let mut dg = 0.0;
    for (nu, model) in terms {
        dg += nu * model.standard_props(t, p)?.G0;
    }
    Ok(-dg / (R * t * std::f64::consts::LN_10))
}

/// standard entropy of an element in its reference state per atom, J/(mol K)
pub fn element_entropy(symbol: &str) -> Option<f64> {
    let s = match symbol {
        "H" => 65.34,
        "He" => 126.15,
        "Li" => 29.12,
        "Be" => 9.50,
        "B" => 5.90,
        "C" => 5.74,
        "N" => 95.805,
        "O" => 102.575,
        "F" => 101.40,
        "Ne" => 146.33,
        "Na" => 51.30,
        "Mg" => 32.67,
        "Al" => 28.30,
        "Si" => 18.81,
        "P" => 41.09,
        "S" => 32.05,
        "Cl" => 111.54,
        "Ar" => 154.85,
        "K" => 64.68,
        "Ca" => 41.59,
        "Ti" => 30.72,
        "Cr" => 23.62,
        "Mn" => 32.01,
        "Fe" => 27.28,
        "Co" => 30.04,
        "Ni" => 29.87,
        "Cu" => 33.15,
        "Zn" => 41.63,
        "Br" => 76.11,
        "Ag" => 42.55,
        "I" => 58.07,
        "Xe" => 169.68,
        "Ba" => 62.42,
        "Hg" => 75.90,
        "Pb" => 64.80,
        _ => return None,
    };
    Some(s)
}
