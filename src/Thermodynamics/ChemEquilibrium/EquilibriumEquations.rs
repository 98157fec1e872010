//! # Equations of the equilibrium problem
//!
//! Gibbs energy minimization with a log barrier. The unknowns are
//!
//! x = [ w | y | T | ln P | q ]
//!
//! w_i = ln n_i for the reactive species, y the potentials (per RT) of the independent element and
//! charge rows, T and ln P when they are not inputs, q the titrant amounts. The residuals are
//!
//! - optimality: mu_i / RT - tau / n_i - sum_r A_ri y_r = 0 for every reactive species
//! - conservation: (sum_i A_ri n_i - sum_k C_rk q_k - b_r) / s_r = 0 for every independent row r
//! - one scaled residual per declared constraint
//!
//! where b are the element amounts not held by inert species and s_r the largest of |b_r|, the
//! amount of the row carried by the species and the amount supplied by titrants, evaluated at x.
//! The charge row is kept in preference to the element rows it depends on, so that electroneutrality
//! is resolved relative to the amounts of the ions themselves.
//! Species containing an element that is absent from b and from every titrant are fixed at zero.
use super::EquilibriumConditions::EquilibriumConditions;
use super::EquilibriumRestrictions::EquilibriumRestrictions;
use super::EquilibriumSpecs::{EquilibriumConstraint, EquilibriumError, EquilibriumSpecs};
use crate::Thermodynamics::ChemicalProps::ChemicalProps;
use crate::Thermodynamics::ChemicalState::ChemicalState;
use crate::Thermodynamics::ChemicalSystem::{ChemicalSystem, SystemError};
use crate::Thermodynamics::DBhandlers::thermo_api::R;
use log::{debug, info};
use nalgebra::{DMatrix, DVector};

/// finite difference step for ln(n) and ln(P)
const H_LOG: f64 = 1e-6;
/// relative finite difference step for T
const H_T: f64 = 1e-6;
/// relative threshold of linear independence of balance rows
const RANK_TOL: f64 = 1e-10;
/// smallest scale of a balance row, mol
const SCALE_FLOOR: f64 = 1e-14;

/// term of the row scale that is the largest
#[derive(Debug, Clone, Copy, PartialEq)]
enum ScaleTerm {
    Initial,
    Species,
    Titrants,
}

/// unscaled residual of one balance row, its scale and where the scale comes from
#[derive(Debug, Clone, Copy)]
struct Balance {
    excess: f64,
    scale: f64,
    term: ScaleTerm,
}

// rows of the matrix kept by Gram-Schmidt orthogonalization in the given order
fn independent_rows(rows: &[DVector<f64>]) -> Vec<usize> {
    let mut basis: Vec<DVector<f64>> = Vec::new();
    let mut kept = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let norm = row.norm();
        if norm == 0.0 {
            continue;
        }
        let mut v = row.clone();
        for e in &basis {
            let proj = v.dot(e);
            v -= e * proj;
        }
        let residual = v.norm();
        if residual > RANK_TOL * norm {
            basis.push(v / residual);
            kept.push(i);
        }
    }
    kept
}

/// layout and data of one equilibrium calculation
pub(crate) struct EquilibriumProblem<'a> {
    system: &'a ChemicalSystem,
    constraints: Vec<EquilibriumConstraint>,
    targets: Vec<f64>,
    /// reactive species in the order of w
    reactive: Vec<usize>,
    /// amounts of non-reactive species (inert or excluded), zero at reactive positions
    fixed: Vec<f64>,
    /// independent rows of the formula matrix
    rows: Vec<usize>,
    a: DMatrix<f64>,
    c: DMatrix<f64>,
    b: DVector<f64>,
    temperature: Option<f64>,
    pressure: Option<f64>,
    temperature_bounds: (f64, f64),
    pressure_bounds: (f64, f64),
    epsilon: f64,
    titrant_names: Vec<String>,
}

impl<'a> EquilibriumProblem<'a> {
    pub(crate) fn new(
        specs: &EquilibriumSpecs<'a>,
        conditions: &EquilibriumConditions,
        restrictions: Option<&EquilibriumRestrictions>,
        state: &ChemicalState<'a>,
        epsilon: f64,
        amount_floor: f64,
    ) -> Result<(Self, DVector<f64>), EquilibriumError> {
        let system = specs.system();
        if !std::ptr::eq(system, state.system()) {
            return Err(EquilibriumError::ForeignState);
        }
        if let Some(r) = restrictions {
            if !std::ptr::eq(system, r.system()) {
                return Err(EquilibriumError::ForeignState);
            }
        }
        let declared: Vec<&str> = conditions.inputs().iter().map(|s| s.as_str()).collect();
        if declared != specs.inputs() {
            return Err(EquilibriumError::MismatchedConditions);
        }

        let temperature = if specs.is_temperature_input() {
            Some(conditions.value("T").unwrap_or(state.temperature()))
        } else {
            None
        };
        let pressure = if specs.is_pressure_input() {
            Some(conditions.value("P").unwrap_or(state.pressure()))
        } else {
            None
        };
        let targets = specs
            .constraints()
            .iter()
            .map(|c| conditions.get(&c.input))
            .collect::<Result<Vec<f64>, EquilibriumError>>()?;

        let ns = system.num_species();
        let nc = system.num_components();
        let ne = system.num_elements();
        let a_full = system.formula_matrix();
        let n0 = state.species_amounts();
        let inert: Vec<bool> = (0..ns)
            .map(|i| restrictions.is_some_and(|r| r.is_inert(i)))
            .collect();

        let mut b_full = match conditions.initial_element_amounts() {
            Some(b) => {
                if b.len() != nc {
                    return Err(EquilibriumError::InvalidValue {
                        what: "length of initial element amounts".to_string(),
                        value: b.len() as f64,
                    });
                }
                b.clone()
            }
            None => system.element_amounts(n0),
        };
        let mut fixed = vec![0.0; ns];
        for i in (0..ns).filter(|&i| inert[i]) {
            fixed[i] = n0[i];
            for r in 0..nc {
                b_full[r] -= a_full[(r, i)] * n0[i];
            }
        }

        let titrants = specs.titrants();
        let c_full = DMatrix::from_fn(nc, titrants.len(), |r, k| titrants[k].formula[r]);

        // elements nobody can supply
        let absent: Vec<usize> = (0..ne)
            .filter(|&e| b_full[e].abs() < 1e-20 && c_full.row(e).iter().all(|v| *v == 0.0))
            .collect();
        let reactive: Vec<usize> = (0..ns)
            .filter(|&i| !inert[i] && absent.iter().all(|&e| a_full[(e, i)] == 0.0))
            .collect();
        if reactive.is_empty() {
            return Err(EquilibriumError::Infeasible(
                "no species can react".to_string(),
            ));
        }
        if !absent.is_empty() {
            let names: Vec<&str> = absent.iter().map(|&e| system.elements()[e].as_str()).collect();
            debug!("elements {:?} are absent, their species are fixed at zero", names);
        }

        let row_vectors: Vec<DVector<f64>> = (0..nc)
            .map(|r| {
                DVector::from_iterator(
                    reactive.len() + titrants.len(),
                    reactive
                        .iter()
                        .map(|&i| a_full[(r, i)])
                        .chain(c_full.row(r).iter().copied()),
                )
            })
            .collect();
        for (r, v) in row_vectors.iter().enumerate() {
            if v.norm() == 0.0 && b_full[r].abs() > 1e-14 * b_full.amax().max(1.0) {
                let name = if r < ne { system.elements()[r].as_str() } else { "charge" };
                return Err(EquilibriumError::Infeasible(format!(
                    "{} = {} can not be carried by any reactive species",
                    name, b_full[r]
                )));
            }
        }
        // charge row first: it is the one resolved when it depends on the element rows
        let order: Vec<usize> = (ne..nc).chain(0..ne).collect();
        let ordered: Vec<DVector<f64>> = order.iter().map(|&r| row_vectors[r].clone()).collect();
        let rows: Vec<usize> = independent_rows(&ordered)
            .into_iter()
            .map(|i| order[i])
            .collect();

        let a = DMatrix::from_fn(rows.len(), reactive.len(), |r, k| a_full[(rows[r], reactive[k])]);
        let c = DMatrix::from_fn(rows.len(), titrants.len(), |r, k| c_full[(rows[r], k)]);
        let b = DVector::from_fn(rows.len(), |r, _| b_full[rows[r]]);

        let n_init: Vec<f64> = reactive.iter().map(|&i| n0[i].max(amount_floor)).collect();

        let problem = Self {
            system,
            constraints: specs.constraints().to_vec(),
            targets,
            reactive,
            fixed,
            rows,
            a,
            c,
            b,
            temperature,
            pressure,
            temperature_bounds: conditions.temperature_bounds(),
            pressure_bounds: conditions.pressure_bounds(),
            epsilon,
            titrant_names: titrants.iter().map(|t| t.name.clone()).collect(),
        };
        info!(
            "equilibrium problem: {} reactive species, {} balance rows, {} constraints, {} unknowns",
            problem.reactive.len(),
            problem.rows.len(),
            problem.constraints.len(),
            problem.num_unknowns()
        );
        let x0 = problem.initial_guess(&n_init, state)?;
        Ok((problem, x0))
    }

    fn nw(&self) -> usize {
        self.reactive.len()
    }
    fn ny(&self) -> usize {
        self.rows.len()
    }
    fn t_index(&self) -> Option<usize> {
        self.temperature.is_none().then(|| self.nw() + self.ny())
    }
    fn p_index(&self) -> Option<usize> {
        self.pressure
            .is_none()
            .then(|| self.nw() + self.ny() + usize::from(self.temperature.is_none()))
    }
    fn q_start(&self) -> usize {
        self.nw()
            + self.ny()
            + usize::from(self.temperature.is_none())
            + usize::from(self.pressure.is_none())
    }
    pub(crate) fn num_unknowns(&self) -> usize {
        self.q_start() + self.c.ncols()
    }

    fn initial_guess(&self, n_init: &[f64], state: &ChemicalState) -> Result<DVector<f64>, EquilibriumError> {
        let mut x = DVector::zeros(self.num_unknowns());
        for (k, n) in n_init.iter().enumerate() {
            x[k] = n.ln();
        }
        if let Some(it) = self.t_index() {
            x[it] = state
                .temperature()
                .clamp(self.temperature_bounds.0, self.temperature_bounds.1);
        }
        if let Some(ip) = self.p_index() {
            x[ip] = state
                .pressure()
                .clamp(self.pressure_bounds.0, self.pressure_bounds.1)
                .ln();
        }
        // y from the least squares fit of A^T y to the optimality terms at y = 0
        let f = self.residual(&x)?;
        let rhs = f.rows(0, self.nw()).into_owned();
        let at = self.a.transpose();
        if self.ny() > 0 {
            let y = at
                .svd(true, true)
                .solve(&rhs, 1e-12)
                .map_err(|e| EquilibriumError::Infeasible(format!("initial element potentials: {}", e)))?;
            for r in 0..self.ny() {
                x[self.nw() + r] = y[r];
            }
        }
        Ok(x)
    }

    pub(crate) fn temperature_of(&self, x: &DVector<f64>) -> f64 {
        match self.t_index() {
            Some(it) => x[it],
            None => self.temperature.unwrap_or_default(),
        }
    }

    pub(crate) fn pressure_of(&self, x: &DVector<f64>) -> f64 {
        match self.p_index() {
            Some(ip) => x[ip].exp(),
            None => self.pressure.unwrap_or_default(),
        }
    }

    /// amounts of all species of the system
    pub(crate) fn amounts_of(&self, x: &DVector<f64>) -> Vec<f64> {
        let mut n = self.fixed.clone();
        for (k, &i) in self.reactive.iter().enumerate() {
            n[i] = x[k].exp();
        }
        n
    }

    pub(crate) fn titrant_amounts_of(&self, x: &DVector<f64>) -> Vec<(String, f64)> {
        self.titrant_names
            .iter()
            .enumerate()
            .map(|(k, name)| (name.clone(), x[self.q_start() + k]))
            .collect()
    }

    /// potentials of all element and charge rows, zero for dependent rows
    pub(crate) fn element_potentials_of(&self, x: &DVector<f64>) -> DVector<f64> {
        let mut y = DVector::zeros(self.system.num_components());
        for (r, &row) in self.rows.iter().enumerate() {
            y[row] = x[self.nw() + r];
        }
        y
    }

    fn props_at(&self, x: &DVector<f64>) -> Result<ChemicalProps<'a>, SystemError> {
        ChemicalProps::compute(
            self.system,
            self.temperature_of(x),
            self.pressure_of(x),
            self.amounts_of(x),
        )
    }

    fn balances(&self, x: &DVector<f64>) -> Vec<Balance> {
        let q = x.rows(self.q_start(), self.c.ncols());
        (0..self.ny())
            .map(|r| {
                let (mut an, mut carried) = (0.0, 0.0);
                for k in 0..self.nw() {
                    let n = x[k].exp();
                    an += self.a[(r, k)] * n;
                    carried += self.a[(r, k)].abs() * n;
                }
                let (mut cq, mut supplied) = (0.0, 0.0);
                for k in 0..self.c.ncols() {
                    cq += self.c[(r, k)] * q[k];
                    supplied += self.c[(r, k)].abs() * q[k].abs();
                }
                let (mut scale, mut term) = (self.b[r].abs().max(SCALE_FLOOR), ScaleTerm::Initial);
                if carried > scale {
                    (scale, term) = (carried, ScaleTerm::Species);
                }
                if supplied > scale {
                    (scale, term) = (supplied, ScaleTerm::Titrants);
                }
                Balance {
                    excess: an - cq - self.b[r],
                    scale,
                    term,
                }
            })
            .collect()
    }

    /// largest relative violation of the element and charge balances in the residual vector
    pub(crate) fn balance_error(&self, f: &DVector<f64>) -> f64 {
        f.rows(self.nw(), self.ny()).iter().fold(0.0, |m, v| m.max(v.abs()))
    }

    pub(crate) fn residual(&self, x: &DVector<f64>) -> Result<DVector<f64>, SystemError> {
        let props = self.props_at(x)?;
        let rt = R * props.temperature();
        let (nw, ny) = (self.nw(), self.ny());
        let mut f = DVector::zeros(self.num_unknowns());
        let mu = props.chemical_potentials();
        let y = x.rows(nw, ny);
        for (k, &i) in self.reactive.iter().enumerate() {
            let n = x[k].exp();
            let ay: f64 = (0..ny).map(|r| self.a[(r, k)] * y[r]).sum();
            f[k] = mu[i] / rt - self.epsilon / n - ay;
        }
        for (r, balance) in self.balances(x).iter().enumerate() {
            f[nw + r] = balance.excess / balance.scale;
        }
        for (j, (constraint, target)) in self.constraints.iter().zip(&self.targets).enumerate() {
            f[nw + ny + j] = constraint.residual(&props, *target);
        }
        Ok(f)
    }

    /// finite differences in w, T and ln P; exact columns for y and q and for the balance rows,
    /// including the derivative of the row scale
    pub(crate) fn jacobian(&self, x: &DVector<f64>, f: &DVector<f64>) -> Result<DMatrix<f64>, SystemError> {
        let m = self.num_unknowns();
        let nw = self.nw();
        let mut jac = DMatrix::zeros(m, m);
        let mut fd_columns: Vec<(usize, f64)> = (0..nw).map(|k| (k, H_LOG)).collect();
        if let Some(it) = self.t_index() {
            fd_columns.push((it, H_T * x[it]));
        }
        if let Some(ip) = self.p_index() {
            fd_columns.push((ip, H_LOG));
        }
        let mut xp = x.clone();
        for (col, h) in fd_columns {
            xp[col] = x[col] + h;
            let fp = self.residual(&xp)?;
            xp[col] = x[col];
            for row in 0..m {
                jac[(row, col)] = (fp[row] - f[row]) / h;
            }
        }
        let q_start = self.q_start();
        for (r, balance) in self.balances(x).iter().enumerate() {
            let Balance { excess, scale, term } = *balance;
            let curvature = excess / (scale * scale);
            for k in 0..nw {
                let a = self.a[(r, k)];
                let n = x[k].exp();
                let d_scale = if term == ScaleTerm::Species { a.abs() * n } else { 0.0 };
                jac[(k, nw + r)] = -a;
                jac[(nw + r, k)] = a * n / scale - curvature * d_scale;
            }
            for k in 0..self.c.ncols() {
                let c = self.c[(r, k)];
                let d_scale = if term == ScaleTerm::Titrants {
                    c.abs() * x[q_start + k].signum()
                } else {
                    0.0
                };
                jac[(nw + r, q_start + k)] = -c / scale - curvature * d_scale;
            }
        }
        Ok(jac)
    }

    /// Newton step scaled as a whole so that no ln(n) or ln(P) changes by more than `max_log_step`
    /// and T by more than a quarter of its value
    pub(crate) fn limit_step(&self, x: &DVector<f64>, dx: &DVector<f64>, max_log_step: f64) -> DVector<f64> {
        let mut factor: f64 = 1.0;
        let largest = dx.rows(0, self.nw()).amax();
        if largest > max_log_step {
            factor = factor.min(max_log_step / largest);
        }
        if let Some(it) = self.t_index() {
            let limit = 0.25 * x[it];
            if dx[it].abs() > limit {
                factor = factor.min(limit / dx[it].abs());
            }
        }
        if let Some(ip) = self.p_index() {
            if dx[ip].abs() > max_log_step {
                factor = factor.min(max_log_step / dx[ip].abs());
            }
        }
        dx * factor
    }

    /// keeps T and P inside their bounds
    pub(crate) fn clamp(&self, x: &mut DVector<f64>) {
        if let Some(it) = self.t_index() {
            x[it] = x[it].clamp(self.temperature_bounds.0, self.temperature_bounds.1);
        }
        if let Some(ip) = self.p_index() {
            x[ip] = x[ip].clamp(self.pressure_bounds.0.ln(), self.pressure_bounds.1.ln());
        }
    }
}
