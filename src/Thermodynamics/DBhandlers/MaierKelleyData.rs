//! Standard properties from reference values and the Maier-Kelley heat capacity
//! Cp = a + b T + c / T^2.
//!
//! Gibbs energy and enthalpy follow the apparent (Benson-Helgeson) convention:
//! G(T, P) = dG0 - S0 (T - Tr) + int(Cp dT) - T int(Cp/T dT) + V (P - Pr)
//! H(T, P) = dH0 + int(Cp dT) + V (P - Pr)
use super::thermo_api::{P0, StandardProps, StandardThermoModel, T0, ThermoError, check_state};
use serde::{Deserialize, Serialize};

fn default_tr() -> f64 {
    T0
}

#[allow(non_snake_case)]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaierKelleyData {
    /// apparent Gibbs energy of formation at Tr, J/mol
    pub dG: f64,
    /// enthalpy of formation at Tr, J/mol
    pub dH: f64,
    /// third-law entropy at Tr, J/(mol K)
    pub S: f64,
    /// [a, b, c] of Cp = a + b T + c/T^2; one number means constant Cp
    #[serde(default, deserialize_with = "deserialize_cp")]
    pub Cp: [f64; 3],
    /// molar volume, m3/mol
    #[serde(default)]
    pub V: f64,
    #[serde(default = "default_tr")]
    pub Tr: f64,
}

fn deserialize_cp<'de, D>(deserializer: D) -> Result<[f64; 3], D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum CpInput {
        Constant(f64),
        Coefficients(Vec<f64>),
    }
    match CpInput::deserialize(deserializer)? {
        CpInput::Constant(a) => Ok([a, 0.0, 0.0]),
        CpInput::Coefficients(v) => {
            if v.is_empty() || v.len() > 3 {
                return Err(serde::de::Error::custom(
                    "Cp must be a number or a list of 1 to 3 coefficients",
                ));
            }
            let mut cp = [0.0; 3];
            cp[..v.len()].copy_from_slice(&v);
            Ok(cp)
        }
    }
}

impl MaierKelleyData {
    /// constant heat capacity model
    #[allow(non_snake_case)]
    pub fn const_cp(dG: f64, dH: f64, S: f64, Cp: f64, V: f64) -> Self {
        Self {
            dG,
            dH,
            S,
            Cp: [Cp, 0.0, 0.0],
            V,
            Tr: T0,
        }
    }

    fn cp_integrals(&self, t: f64) -> (f64, f64, f64) {
        let [a, b, c] = self.Cp;
        let tr = self.Tr;
        let cp = a + b * t + c / t.powi(2);
        let int_cp = a * (t - tr) + b / 2.0 * (t.powi(2) - tr.powi(2)) - c * (1.0 / t - 1.0 / tr);
        let int_cp_t =
            a * (t / tr).ln() + b * (t - tr) - c / 2.0 * (1.0 / t.powi(2) - 1.0 / tr.powi(2));
        (cp, int_cp, int_cp_t)
    }
}

impl StandardThermoModel for MaierKelleyData {
    fn standard_props(&self, t: f64, p: f64) -> Result<StandardProps, ThermoError> {
        check_state(t, p)?;
        let (cp, int_cp, int_cp_t) = self.cp_integrals(t);
        let pv = self.V * (p - P0);
        let g = self.dG - self.S * (t - self.Tr) + int_cp - t * int_cp_t + pv;
        let h = self.dH + int_cp + pv;
        Ok(StandardProps {
            G0: g,
            H0: h,
            S0: self.S + int_cp_t,
            Cp0: cp,
            V0: self.V,
        })
    }

    fn model_name(&self) -> &'static str {
        "MaierKelley"
    }

    fn temperature_range(&self) -> Option<(f64, f64)> {
        None
    }

    fn validate(&self) -> Result<(), ThermoError> {
        let values = [self.dG, self.dH, self.S, self.V, self.Tr];
        if values.iter().chain(self.Cp.iter()).any(|x| !x.is_finite()) || self.Tr <= 0.0 {
            return Err(ThermoError::InvalidParameters(
                "MaierKelley parameters must be finite and Tr positive".to_string(),
            ));
        }
        if self.V < 0.0 {
            return Err(ThermoError::InvalidParameters(
                "molar volume can not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
