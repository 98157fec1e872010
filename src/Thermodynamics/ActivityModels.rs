//! # Activity models of phases
//!
//! Every phase of a chemical system carries one activity model. A model is built once for the
//! species of the phase (charges, solvent position, ion sizes are captured at that moment) and then
//! evaluates ln(gamma) and ln(a) of all species of the phase from temperature, pressure and amounts.
//!
//! Standard states:
//! * gases: ideal gas at P0 = 1 bar, ln a = ln x + ln(P/P0)
//! * solutions and melts: pure species, ln a = ln(gamma x)
//! * aqueous solutes: ideal 1 mol/kg solution, ln a = ln(gamma m); solvent water: ln a = ln x_w
//! * pure condensed phases: ln a = 0
use super::DBhandlers::Species::Species;
use super::DBhandlers::thermo_api::P0;
use enum_dispatch::enum_dispatch;
use std::f64::consts::LN_10;
use thiserror::Error;

/// molar mass of water, kg/mol
pub const WATER_MOLAR_MASS: f64 = 0.018015268;
/// ion size used by Debye-Huckel model when database gives none, Angstrom
pub const DEFAULT_ION_SIZE: f64 = 4.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActivityError {
    #[error("aqueous phase has no solvent water (neutral H2O species)")]
    NoSolvent,
    #[error("pure phase must contain exactly one species, found {0}")]
    NotPure(usize),
    #[error("phase has no species")]
    EmptyPhase,
}

/// ln(gamma) and ln(a) of the species of one phase
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActivityProps {
    pub ln_g: Vec<f64>,
    pub ln_a: Vec<f64>,
}

impl ActivityProps {
    fn zeros(len: usize) -> Self {
        Self {
            ln_g: vec![0.0; len],
            ln_a: vec![0.0; len],
        }
    }
}

/// Density of liquid water, g/cm3, from temperature in K (Thiesen equation, 0..100 C)
pub fn water_density(t: f64) -> f64 {
    let tc = t - 273.15;
    1.0 - (tc + 288.9414) / (508929.2 * (tc + 68.12963)) * (tc - 3.9863).powi(2)
}

/// Relative permittivity of liquid water (Malmberg and Maryott, 0..100 C)
pub fn water_relative_permittivity(t: f64) -> f64 {
    let tc = t - 273.15;
    87.74 - 0.40008 * tc + 9.398e-4 * tc.powi(2) - 1.41e-6 * tc.powi(3)
}

/// Debye-Huckel A parameter, (kg/mol)^0.5; 0.5108 at 25 C
pub fn debye_huckel_a(t: f64) -> f64 {
    let rho = water_density(t);
    let eps = water_relative_permittivity(t);
    1.82483e6 * rho.sqrt() / (eps * t).powf(1.5)
}

/// Debye-Huckel B parameter, (kg/mol)^0.5 / Angstrom; 0.3287 at 25 C
pub fn debye_huckel_b(t: f64) -> f64 {
    let rho = water_density(t);
    let eps = water_relative_permittivity(t);
    50.29 * rho.sqrt() / (eps * t).sqrt()
}

/// I = 1/2 sum(z^2 m)
pub fn ionic_strength(charges: &[f64], molalities: &[f64]) -> f64 {
    0.5 * charges
        .iter()
        .zip(molalities)
        .map(|(z, m)| z * z * m)
        .sum::<f64>()
}

#[enum_dispatch]
pub trait ActivityModel {
    /// activity coefficients and activities for amounts n of the phase species
    fn activity_props(&self, t: f64, p: f64, n: &[f64]) -> ActivityProps;
    fn model_name(&self) -> &'static str;
}

fn ln_mole_fractions(n: &[f64]) -> Vec<f64> {
    let total: f64 = n.iter().sum();
    let ln_total = total.ln();
    n.iter().map(|ni| ni.ln() - ln_total).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdealGasModel;

impl ActivityModel for IdealGasModel {
    fn activity_props(&self, _t: f64, p: f64, n: &[f64]) -> ActivityProps {
        let ln_p = (p / P0).ln();
        ActivityProps {
            ln_g: vec![0.0; n.len()],
            ln_a: ln_mole_fractions(n).into_iter().map(|x| x + ln_p).collect(),
        }
    }
    fn model_name(&self) -> &'static str {
        "IdealGas"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdealSolutionModel;

impl ActivityModel for IdealSolutionModel {
    fn activity_props(&self, _t: f64, _p: f64, n: &[f64]) -> ActivityProps {
        ActivityProps {
            ln_g: vec![0.0; n.len()],
            ln_a: ln_mole_fractions(n),
        }
    }
    fn model_name(&self) -> &'static str {
        "IdealSolution"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PureModel;

impl ActivityModel for PureModel {
    fn activity_props(&self, _t: f64, _p: f64, n: &[f64]) -> ActivityProps {
        ActivityProps::zeros(n.len())
    }
    fn model_name(&self) -> &'static str {
        "Pure"
    }
}

/// species data of an aqueous phase shared by all aqueous models
#[derive(Debug, Clone, PartialEq)]
pub struct AqueousMixture {
    pub solvent: usize,
    pub charges: Vec<f64>,
    pub ion_sizes: Vec<f64>,
}

impl AqueousMixture {
    pub fn new(species: &[Species]) -> Result<Self, ActivityError> {
        if species.is_empty() {
            return Err(ActivityError::EmptyPhase);
        }
        let solvent = species
            .iter()
            .position(|s| s.is_water())
            .ok_or(ActivityError::NoSolvent)?;
        Ok(Self {
            solvent,
            charges: species.iter().map(|s| s.charge()).collect(),
            ion_sizes: species
                .iter()
                .map(|s| s.ion_size().unwrap_or(DEFAULT_ION_SIZE))
                .collect(),
        })
    }

    /// molalities of all species (solvent gets 1/Mw) and the ionic strength
    pub fn molalities(&self, n: &[f64]) -> (Vec<f64>, f64) {
        let kg_water = n[self.solvent] * WATER_MOLAR_MASS;
        let m: Vec<f64> = n
            .iter()
            .enumerate()
            .map(|(i, ni)| {
                if i == self.solvent {
                    1.0 / WATER_MOLAR_MASS
                } else {
                    ni / kg_water
                }
            })
            .collect();
        let mut charges = self.charges.clone();
        charges[self.solvent] = 0.0;
        let is = ionic_strength(&charges, &m);
        (m, is)
    }

    // ln a = ln(gamma) + ln(m) for solutes, ln x for the solvent
    fn assemble(&self, n: &[f64], ln_g: Vec<f64>, m: &[f64]) -> ActivityProps {
        let ln_x = ln_mole_fractions(n);
        let ln_a = (0..n.len())
            .map(|i| {
                if i == self.solvent {
                    ln_x[i]
                } else {
                    ln_g[i] + m[i].ln()
                }
            })
            .collect();
        ActivityProps { ln_g, ln_a }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AqueousIdealModel {
    pub mixture: AqueousMixture,
}

impl ActivityModel for AqueousIdealModel {
    fn activity_props(&self, _t: f64, _p: f64, n: &[f64]) -> ActivityProps {
        let (m, _) = self.mixture.molalities(n);
        self.mixture.assemble(n, vec![0.0; n.len()], &m)
    }
    fn model_name(&self) -> &'static str {
        "AqueousIdeal"
    }
}

/// log10(gamma) = -A z^2 (sqrt(I) / (1 + sqrt(I)) - 0.3 I)
#[derive(Debug, Clone, PartialEq)]
pub struct DaviesModel {
    pub mixture: AqueousMixture,
}

impl ActivityModel for DaviesModel {
    fn activity_props(&self, t: f64, _p: f64, n: &[f64]) -> ActivityProps {
        let (m, is) = self.mixture.molalities(n);
        let a = debye_huckel_a(t);
        let sqrt_i = is.sqrt();
        let ln_g = self
            .mixture
            .charges
            .iter()
            .enumerate()
            .map(|(i, z)| {
                if i == self.mixture.solvent {
                    0.0
                } else {
                    -a * z * z * (sqrt_i / (1.0 + sqrt_i) - 0.3 * is) * LN_10
                }
            })
            .collect();
        self.mixture.assemble(n, ln_g, &m)
    }
    fn model_name(&self) -> &'static str {
        "Davies"
    }
}

/// ions: log10(gamma) = -A z^2 sqrt(I) / (1 + B a sqrt(I)) + bdot I,
/// neutral solutes: log10(gamma) = b_neutral I
#[derive(Debug, Clone, PartialEq)]
pub struct DebyeHuckelModel {
    pub mixture: AqueousMixture,
    pub bdot: f64,
    pub b_neutral: f64,
}

impl ActivityModel for DebyeHuckelModel {
    fn activity_props(&self, t: f64, _p: f64, n: &[f64]) -> ActivityProps {
        let (m, is) = self.mixture.molalities(n);
        let a = debye_huckel_a(t);
        let b = debye_huckel_b(t);
        let sqrt_i = is.sqrt();
        let ln_g = (0..n.len())
            .map(|i| {
                let z = self.mixture.charges[i];
                if i == self.mixture.solvent {
                    0.0
                } else if z == 0.0 {
                    self.b_neutral * is * LN_10
                } else {
                    let size = self.mixture.ion_sizes[i];
                    (-a * z * z * sqrt_i / (1.0 + b * size * sqrt_i) + self.bdot * is) * LN_10
                }
            })
            .collect();
        self.mixture.assemble(n, ln_g, &m)
    }
    fn model_name(&self) -> &'static str {
        "DebyeHuckel"
    }
}

/// closed set of activity models
#[derive(Debug, Clone, PartialEq)]
#[enum_dispatch(ActivityModel)]
pub enum ActivityEnum {
    IdealGas(IdealGasModel),
    IdealSolution(IdealSolutionModel),
    AqueousIdeal(AqueousIdealModel),
    Davies(DaviesModel),
    DebyeHuckel(DebyeHuckelModel),
    Pure(PureModel),
}

impl ActivityEnum {
    /// position of the solvent water for aqueous models
    pub fn solvent(&self) -> Option<usize> {
        match self {
            ActivityEnum::AqueousIdeal(m) => Some(m.mixture.solvent),
            ActivityEnum::Davies(m) => Some(m.mixture.solvent),
            ActivityEnum::DebyeHuckel(m) => Some(m.mixture.solvent),
            _ => None,
        }
    }
    pub fn is_gas(&self) -> bool {
        matches!(self, ActivityEnum::IdealGas(_))
    }
}

/// choice of activity model made before the species of the phase are known
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityModelKind {
    IdealGas,
    IdealSolution,
    AqueousIdeal,
    Davies,
    DebyeHuckel { bdot: f64, b_neutral: f64 },
    Pure,
}

impl ActivityModelKind {
    /// Debye-Huckel with bdot = 0.041 and b_neutral = 0.1
    pub fn debye_huckel() -> Self {
        ActivityModelKind::DebyeHuckel {
            bdot: 0.041,
            b_neutral: 0.1,
        }
    }

    pub fn build(&self, species: &[Species]) -> Result<ActivityEnum, ActivityError> {
        if species.is_empty() {
            return Err(ActivityError::EmptyPhase);
        }
        let model = match self {
            ActivityModelKind::IdealGas => ActivityEnum::IdealGas(IdealGasModel),
            ActivityModelKind::IdealSolution => ActivityEnum::IdealSolution(IdealSolutionModel),
            ActivityModelKind::AqueousIdeal => ActivityEnum::AqueousIdeal(AqueousIdealModel {
                mixture: AqueousMixture::new(species)?,
            }),
            ActivityModelKind::Davies => ActivityEnum::Davies(DaviesModel {
                mixture: AqueousMixture::new(species)?,
            }),
            ActivityModelKind::DebyeHuckel { bdot, b_neutral } => {
                ActivityEnum::DebyeHuckel(DebyeHuckelModel {
                    mixture: AqueousMixture::new(species)?,
                    bdot: *bdot,
                    b_neutral: *b_neutral,
                })
            }
            ActivityModelKind::Pure => {
                if species.len() != 1 {
                    return Err(ActivityError::NotPure(species.len()));
                }
                ActivityEnum::Pure(PureModel)
            }
        };
        Ok(model)
    }
}
