//! Species defined through a formation reaction from other species of the database:
//! product = sum(nu_i * reactant_i), with K = a(product) / prod(a(reactant_i)^nu_i).
//!
//! log K(T) is either
//! * van't Hoff: log K(Tr) - dH / (R ln10) (1/T - 1/Tr), or
//! * analytic: A1 + A2 T + A3/T + A4 log10(T) + A5/T^2 + A6 T^2.
//!
//! The standard properties of the reactants are taken from their own models,
//! which are attached by the database when the species is fetched.
use super::thermo_api::{
    R, StandardProps, StandardThermoModel, T0, ThermoEnum, ThermoError, check_state,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::LN_10;

fn default_tr() -> f64 {
    T0
}

#[allow(non_snake_case)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionData {
    /// reactant name -> stoichiometric coefficient (negative for species on the product side)
    pub reactants: BTreeMap<String, f64>,
    /// log10 K at Tr
    #[serde(default)]
    pub log_k: f64,
    /// enthalpy of reaction, J/mol
    #[serde(default)]
    pub delta_h: f64,
    /// coefficients A1..A6 of the analytic expression of log K
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytic: Option<[f64; 6]>,
    #[serde(default = "default_tr")]
    pub Tr: f64,
    /// models of reactants, attached by the database
    #[serde(skip)]
    pub resolved: Option<Vec<(f64, ThermoEnum)>>,
}

impl ReactionData {
    pub fn new(reactants: &[(&str, f64)], log_k: f64, delta_h: f64) -> Self {
        Self {
            reactants: reactants
                .iter()
                .map(|(name, nu)| (name.to_string(), *nu))
                .collect(),
            log_k,
            delta_h,
            analytic: None,
            Tr: T0,
            resolved: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// attaches models of reactants in the order of `reactants`
    pub fn resolve(&mut self, models: Vec<(f64, ThermoEnum)>) {
        self.resolved = Some(models);
    }

    /// log10 K of the formation reaction at temperature t
    pub fn log_k_at(&self, t: f64) -> f64 {
        match self.analytic {
            Some([a1, a2, a3, a4, a5, a6]) => {
                a1 + a2 * t + a3 / t + a4 * t.log10() + a5 / t.powi(2) + a6 * t.powi(2)
            }
            None => self.log_k - self.delta_h / (R * LN_10) * (1.0 / t - 1.0 / self.Tr),
        }
    }

    /// enthalpy of reaction at temperature t, J/mol
    pub fn delta_h_at(&self, t: f64) -> f64 {
        match self.analytic {
            Some([_, a2, a3, a4, a5, a6]) => {
                R * LN_10
                    * (a2 * t.powi(2) - a3 + a4 * t / LN_10 - 2.0 * a5 / t
                        + 2.0 * a6 * t.powi(3))
            }
            None => self.delta_h,
        }
    }

    fn delta_cp_at(&self, t: f64) -> f64 {
        match self.analytic {
            Some([_, a2, _, a4, a5, a6]) => {
                R * LN_10 * (2.0 * a2 * t + a4 / LN_10 + 2.0 * a5 / t.powi(2) + 6.0 * a6 * t.powi(2))
            }
            None => 0.0,
        }
    }
}

impl StandardThermoModel for ReactionData {
    fn standard_props(&self, t: f64, p: f64) -> Result<StandardProps, ThermoError> {
        check_state(t, p)?;
        let Some(models) = &self.resolved else {
            let names: Vec<&str> = self.reactants.keys().map(|s| s.as_str()).collect();
            return Err(ThermoError::UnresolvedReaction(names.join(" + ")));
        };
        let mut terms = Vec::with_capacity(models.len());
        for (nu, model) in models {
            terms.push((*nu, model.standard_props(t, p)?));
        }
        let sum = StandardProps::combine(&terms);
        let log_k = self.log_k_at(t);
        let dh = self.delta_h_at(t);
        let dg = -R * t * LN_10 * log_k;
        Ok(StandardProps {
            G0: sum.G0 + dg,
            H0: sum.H0 + dh,
            S0: sum.S0 + (dh - dg) / t,
            Cp0: sum.Cp0 + self.delta_cp_at(t),
            V0: sum.V0,
        })
    }

    fn model_name(&self) -> &'static str {
        "Reaction"
    }

    fn temperature_range(&self) -> Option<(f64, f64)> {
        let models = self.resolved.as_ref()?;
        models
            .iter()
            .filter_map(|(_, m)| m.temperature_range())
            .reduce(|(lo1, hi1), (lo2, hi2)| (lo1.max(lo2), hi1.min(hi2)))
    }

    fn validate(&self) -> Result<(), ThermoError> {
        if self.reactants.is_empty() {
            return Err(ThermoError::InvalidParameters(
                "formation reaction without reactants".to_string(),
            ));
        }
        if self.reactants.values().any(|nu| !nu.is_finite() || *nu == 0.0) {
            return Err(ThermoError::InvalidParameters(
                "stoichiometric coefficients must be finite and nonzero".to_string(),
            ));
        }
        if !(self.log_k.is_finite() && self.delta_h.is_finite()) {
            return Err(ThermoError::InvalidParameters(
                "log_k and delta_h must be finite".to_string(),
            ));
        }
        Ok(())
    }
}
