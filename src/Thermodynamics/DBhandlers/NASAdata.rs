//! NASA 7-coefficient polynomials of standard thermodynamic properties.
//!
//! Coefficients are stored as a flat vector exactly as in NASA-format libraries:
//! temperature bounds first, then 7 coefficients per temperature interval.
//! * 9 numbers: `[T1, T2, a1..a7]`
//! * 17 numbers: `[T1, T2, T3, a1..a7 (T1..T2), a1..a7 (T2..T3)]`
//! * 25 numbers: `[T1, T2, T3, T4, a1..a7, a1..a7, a1..a7]`
//!
//! Cp/R = a1 + a2 T + a3 T^2 + a4 T^3 + a5 T^4
//! H/RT = a1 + a2 T/2 + a3 T^2/3 + a4 T^3/4 + a5 T^4/5 + a6/T
//! S/R  = a1 ln T + a2 T + a3 T^2/2 + a4 T^3/3 + a5 T^4/4 + a7
//!
//! The polynomials give absolute Gibbs energy G = H - T S. Species of the database
//! set `apparent_shift = Tr * sum(S_elements)` so that G is reported in the apparent
//! convention shared with the other models.
use super::thermo_api::{R, StandardProps, StandardThermoModel, ThermoError, check_state};
use serde::{Deserialize, Serialize};

pub(crate) fn Cp(t: f64, a: f64, b: f64, c: f64, d: f64, e: f64) -> f64 {
    R * (a + b * t + c * t.powi(2) + d * t.powi(3) + e * t.powi(4))
}
pub(crate) fn dh(t: f64, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> f64 {
    R * t
        * (a + b * t / 2.0
            + c * t.powi(2) / 3.0
            + d * t.powi(3) / 4.0
            + e * t.powi(4) / 5.0
            + f / t)
}
pub(crate) fn ds(t: f64, a: f64, b: f64, c: f64, d: f64, e: f64, g: f64) -> f64 {
    R * (a * t.ln() + b * t + c * t.powi(2) / 2.0 + d * t.powi(3) / 3.0 + e * t.powi(4) / 4.0 + g)
}

pub type Coeffs = (f64, f64, f64, f64, f64, f64, f64);

#[allow(non_snake_case)]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NASAdata {
    /// temperature bounds and NASA format 7 coefficients
    pub Cp: Vec<f64>,
    /// added to G, J/mol
    #[serde(skip)]
    pub apparent_shift: f64,
}

impl NASAdata {
    pub fn new(Cp: Vec<f64>) -> Self {
        Self {
            Cp,
            apparent_shift: 0.0,
        }
    }

    fn extract_coefficients_(c_data: &[f64], t: f64) -> Result<Coeffs, ThermoError> {
        let get_range_str = |temps: &[f64]| {
            temps
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(" - ")
        };
        let block = |start: usize| -> Coeffs {
            (
                c_data[start],
                c_data[start + 1],
                c_data[start + 2],
                c_data[start + 3],
                c_data[start + 4],
                c_data[start + 5],
                c_data[start + 6],
            )
        };

        match c_data.len() {
            25 => {
                let (t1, t2, t3, t4) = (c_data[0], c_data[1], c_data[2], c_data[3]);
                if t1 <= t && t <= t2 {
                    Ok(block(4))
                } else if t2 < t && t <= t3 {
                    Ok(block(11))
                } else if t3 < t && t <= t4 {
                    Ok(block(18))
                } else {
                    Err(ThermoError::NoCoefficientsFound {
                        temperature: t,
                        range: get_range_str(&[t1, t2, t3, t4]),
                    })
                }
            }
            17 => {
                let (t1, t2, t3) = (c_data[0], c_data[1], c_data[2]);
                if t1 <= t && t <= t2 {
                    Ok(block(3))
                } else if t2 < t && t <= t3 {
                    Ok(block(10))
                } else {
                    Err(ThermoError::NoCoefficientsFound {
                        temperature: t,
                        range: get_range_str(&[t1, t2, t3]),
                    })
                }
            }
            9 => {
                let (t1, t2) = (c_data[0], c_data[1]);
                if t1 <= t && t <= t2 {
                    Ok(block(2))
                } else {
                    Err(ThermoError::NoCoefficientsFound {
                        temperature: t,
                        range: get_range_str(&[t1, t2]),
                    })
                }
            }
            _ => Err(ThermoError::InvalidTemperatureRange),
        }
    }

    /// get the 7 constants of NASA7 format for concrete temperature
    pub fn extract_coefficients(&self, t: f64) -> Result<Coeffs, ThermoError> {
        Self::extract_coefficients_(&self.Cp, t)
    }
}

impl StandardThermoModel for NASAdata {
    fn standard_props(&self, t: f64, p: f64) -> Result<StandardProps, ThermoError> {
        check_state(t, p)?;
        let (a, b, c, d, e, f, g) = self.extract_coefficients(t)?;
        let h = dh(t, a, b, c, d, e, f);
        let s = ds(t, a, b, c, d, e, g);
        Ok(StandardProps {
            G0: h - t * s + self.apparent_shift,
            H0: h,
            S0: s,
            Cp0: Cp(t, a, b, c, d, e),
            V0: 0.0,
        })
    }

    fn model_name(&self) -> &'static str {
        "NASA7"
    }

    fn temperature_range(&self) -> Option<(f64, f64)> {
        let bounds = match self.Cp.len() {
            25 => 4,
            17 => 3,
            9 => 2,
            _ => return None,
        };
        Some((self.Cp[0], self.Cp[bounds - 1]))
    }

    fn validate(&self) -> Result<(), ThermoError> {
        let bounds = match self.Cp.len() {
            25 => 4,
            17 => 3,
            9 => 2,
            _ => return Err(ThermoError::InvalidTemperatureRange),
        };
        let temps = &self.Cp[..bounds];
        if temps.windows(2).any(|w| w[0] >= w[1]) || temps[0] <= 0.0 {
            return Err(ThermoError::InvalidTemperatureRange);
        }
        if self.Cp.iter().any(|x| !x.is_finite()) {
            return Err(ThermoError::InvalidParameters(
                "NASA7 coefficients must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn water_vapor() -> NASAdata {
        NASAdata::new(vec![
            200.0,
            1000.0,
            3500.0,
            4.19864056,
            -2.0364341e-3,
            6.52040211e-6,
            -5.48797062e-9,
            1.77197817e-12,
            -30293.7267,
            -0.849032208,
            3.03399249,
            2.17691804e-3,
            -1.64072518e-7,
            -9.7041987e-11,
            1.68200992e-14,
            -30004.2971,
            4.9667701,
        ])
    }

    #[test]
    fn test_extract_coefficients() {
        let nasa_data = NASAdata::new(vec![300.0, 1000.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(
            nasa_data.extract_coefficients(500.0).unwrap(),
            (1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0)
        );
        let two_ranges = water_vapor();
        assert_relative_eq!(two_ranges.extract_coefficients(1500.0).unwrap().0, 3.03399249);
        assert_relative_eq!(two_ranges.extract_coefficients(300.0).unwrap().0, 4.19864056);
    }

    #[test]
    fn test_extract_coefficients_out_of_range() {
        let nasa_data = NASAdata::new(vec![300.0, 1000.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let result = nasa_data.extract_coefficients(1500.0);
        assert!(matches!(
            result,
            Err(ThermoError::NoCoefficientsFound {
                temperature: 1500.0,
                ..
            })
        ));
        let broken = NASAdata::new(vec![300.0, 1000.0, 1.0]);
        assert_eq!(
            broken.extract_coefficients(500.0),
            Err(ThermoError::InvalidTemperatureRange)
        );
        assert!(broken.validate().is_err());
    }

    #[test]
    fn test_water_vapor_reference_values() {
        let h2o = water_vapor();
        let props = h2o.standard_props(298.15, 1e5).unwrap();
        // enthalpy of formation -241.826 kJ/mol, entropy 188.8 J/mol/K
        assert_relative_eq!(props.H0, -241_826.0, epsilon = 500.0);
        assert_relative_eq!(props.S0, 188.8, epsilon = 0.5);
        assert_relative_eq!(props.Cp0, 33.6, epsilon = 0.3);
        assert_relative_eq!(props.G0, props.H0 - 298.15 * props.S0, epsilon = 1e-6);
        assert_eq!(h2o.temperature_range(), Some((200.0, 3500.0)));
        assert!(h2o.validate().is_ok());
    }

    #[test]
    fn test_functions_consistency() {
        // dH/dT = Cp and dS/dT = Cp/T
        let (a, b, c, d, e, f, g) = water_vapor().extract_coefficients(700.0).unwrap();
        let t = 700.0;
        let dt = 1e-3;
        let dhdt = (dh(t + dt, a, b, c, d, e, f) - dh(t - dt, a, b, c, d, e, f)) / (2.0 * dt);
        let dsdt = (ds(t + dt, a, b, c, d, e, g) - ds(t - dt, a, b, c, d, e, g)) / (2.0 * dt);
        assert_relative_eq!(dhdt, Cp(t, a, b, c, d, e), epsilon = 1e-4);
        assert_relative_eq!(dsdt, Cp(t, a, b, c, d, e) / t, epsilon = 1e-6);
    }

    #[test]
    fn test_serde() {
        let json = r#"{"Cp": [300.0, 1000.0, 3.5, 0.0, 0.0, 0.0, 0.0, -1000.0, 4.0]}"#;
        let nasa: NASAdata = serde_json::from_str(json).unwrap();
        assert_eq!(nasa.Cp.len(), 9);
        let props = nasa.standard_props(500.0, 1e5).unwrap();
        assert_relative_eq!(props.Cp0, 3.5 * R, epsilon = 1e-9);
    }
}
