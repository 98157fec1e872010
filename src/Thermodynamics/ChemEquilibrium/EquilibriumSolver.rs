//! # Equilibrium solver
//!
//! Damped Newton iterations on the equations of [`EquilibriumProblem`]:
//! 1) Jacobian by finite differences (exact for the linear parts)
//! 2) linear step by LU decomposition, SVD pseudo-inverse when LU fails
//! 3) step scaled so that ln(n) changes by at most `max_log_step` and T by at most 25 %
//! 4) backtracking line search on the euclidean norm of the residual (up to 12 halvings),
//!    a step whose residual can not be evaluated counts as rejected
//!
//! Converged when the largest scaled residual is below `tolerance` and every element and charge
//! balance holds to `BALANCE_TOLERANCE` relative to the amounts in its row. The state is written
//! only on success.
use super::EquilibriumConditions::EquilibriumConditions;
use super::EquilibriumEquations::EquilibriumProblem;
use super::EquilibriumRestrictions::EquilibriumRestrictions;
use super::EquilibriumSpecs::{EquilibriumError, EquilibriumSpecs};
use crate::Thermodynamics::ChemicalState::ChemicalState;
use crate::library_manager::with_library_manager;
use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};

const MAX_HALVINGS: usize = 12;
const ARMIJO: f64 = 1e-4;
const SVD_EPS: f64 = 1e-12;
/// relative violation of an element or charge balance accepted at convergence
const BALANCE_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct EquilibriumOptions {
    pub tolerance: f64,
    pub max_iterations: usize,
    /// log-barrier parameter tau
    pub epsilon: f64,
    pub max_log_step: f64,
    /// initial amount of species that start at zero
    pub amount_floor: f64,
    pub line_search: bool,
}

impl EquilibriumOptions {
    /// options stored in the configuration file
    pub fn from_config() -> Self {
        with_library_manager(|manager| {
            let d = manager.solver_defaults();
            Self {
                tolerance: d.tolerance,
                max_iterations: d.max_iterations,
                epsilon: d.epsilon,
                max_log_step: d.max_log_step,
                amount_floor: d.amount_floor,
                line_search: d.line_search,
            }
        })
    }
}

impl Default for EquilibriumOptions {
    fn default() -> Self {
        Self::from_config()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquilibriumResult {
    pub succeeded: bool,
    pub iterations: usize,
    /// largest scaled residual at the last iterate
    pub residual: f64,
    pub message: String,
    /// mol added to the system (negative when removed)
    pub titrant_amounts: Vec<(String, f64)>,
    /// per RT, in the order of the formula matrix rows
    pub element_potentials: DVector<f64>,
    pub temperature: f64,
    pub pressure: f64,
}

impl EquilibriumResult {
    fn failure(message: String, iterations: usize, residual: f64) -> Self {
        warn!("equilibrium calculation failed: {}", message);
        Self {
            succeeded: false,
            iterations,
            residual,
            message,
            titrant_amounts: Vec::new(),
            element_potentials: DVector::zeros(0),
            temperature: f64::NAN,
            pressure: f64::NAN,
        }
    }

    pub fn titrant_amount(&self, name: &str) -> Option<f64> {
        self.titrant_amounts
            .iter()
            .find(|(t, _)| t == name)
            .map(|(_, q)| *q)
    }
}

fn solve_linear(jac: DMatrix<f64>, rhs: &DVector<f64>) -> Option<DVector<f64>> {
    if let Some(dx) = jac.clone().lu().solve(rhs) {
        if dx.iter().all(|v| v.is_finite()) {
            return Some(dx);
        }
    }
    debug!("LU failed, using SVD");
    jac.svd(true, true)
        .solve(rhs, SVD_EPS)
        .ok()
        .filter(|dx| dx.iter().all(|v| v.is_finite()))
}

fn is_finite(f: &DVector<f64>) -> bool {
    f.iter().all(|v| v.is_finite())
}

#[derive(Debug, Clone)]
pub struct EquilibriumSolver<'a> {
    specs: EquilibriumSpecs<'a>,
    options: EquilibriumOptions,
}

impl<'a> EquilibriumSolver<'a> {
    /// rejects specifications whose equations do not match their unknowns
    pub fn new(specs: &EquilibriumSpecs<'a>) -> Result<Self, EquilibriumError> {
        specs.check_degrees_of_freedom()?;
        Ok(Self {
            specs: specs.clone(),
            options: EquilibriumOptions::default(),
        })
    }

    pub fn with_options(mut self, options: EquilibriumOptions) -> Self {
        self.options = options;
        self
    }
    pub fn set_options(&mut self, options: EquilibriumOptions) {
        self.options = options;
    }
    pub fn options(&self) -> &EquilibriumOptions {
        &self.options
    }
    pub fn specs(&self) -> &EquilibriumSpecs<'a> {
        &self.specs
    }

    /// empty conditions for the inputs of this solver
    pub fn conditions(&self) -> EquilibriumConditions {
        EquilibriumConditions::new(&self.specs)
    }

    /// equilibrium at the temperature and pressure of the state
    pub fn solve(&self, state: &mut ChemicalState<'a>) -> Result<EquilibriumResult, EquilibriumError> {
        self.solve_with_restrictions(state, &self.conditions(), None)
    }

    pub fn solve_with(
        &self,
        state: &mut ChemicalState<'a>,
        conditions: &EquilibriumConditions,
    ) -> Result<EquilibriumResult, EquilibriumError> {
        self.solve_with_restrictions(state, conditions, None)
    }

    /// Returns Err for an ill-posed problem; a problem that is well posed but does not converge gives
    /// Ok with `succeeded == false` and leaves the state untouched.
    pub fn solve_with_restrictions(
        &self,
        state: &mut ChemicalState<'a>,
        conditions: &EquilibriumConditions,
        restrictions: Option<&EquilibriumRestrictions>,
    ) -> Result<EquilibriumResult, EquilibriumError> {
        let opts = &self.options;
        let (problem, mut x) = match EquilibriumProblem::new(
            &self.specs,
            conditions,
            restrictions,
            state,
            opts.epsilon,
            opts.amount_floor,
        ) {
            Ok(p) => p,
            Err(EquilibriumError::System(e)) => {
                return Ok(EquilibriumResult::failure(
                    format!("initial guess can not be evaluated: {}", e),
                    0,
                    f64::INFINITY,
                ));
            }
            Err(e) => return Err(e),
        };
        let mut f = match problem.residual(&x) {
            Ok(f) if is_finite(&f) => f,
            _ => {
                return Ok(EquilibriumResult::failure(
                    "residual at the initial guess is not finite".to_string(),
                    0,
                    f64::INFINITY,
                ));
            }
        };

        let converged = |f: &DVector<f64>| {
            f.amax() < opts.tolerance && problem.balance_error(f) < BALANCE_TOLERANCE
        };
        let mut iterations = 0;
        while iterations < opts.max_iterations {
            let error = f.amax();
            debug!(
                "iteration {}: max residual {:e}, balance {:e}",
                iterations,
                error,
                problem.balance_error(&f)
            );
            if converged(&f) {
                break;
            }
            iterations += 1;
            let jac = match problem.jacobian(&x, &f) {
                Ok(jac) => jac,
                Err(e) => {
                    return Ok(EquilibriumResult::failure(
                        format!("jacobian: {}", e),
                        iterations,
                        error,
                    ));
                }
            };
            let Some(dx) = solve_linear(jac, &(-&f)) else {
                return Ok(EquilibriumResult::failure(
                    "singular jacobian".to_string(),
                    iterations,
                    error,
                ));
            };
            let dx = problem.limit_step(&x, &dx, opts.max_log_step);

            let norm0 = f.norm();
            let mut alpha = 1.0;
            let mut accepted = None;
            // the evaluable trial with the smallest residual
            let mut fallback: Option<(DVector<f64>, DVector<f64>)> = None;
            for _ in 0..=MAX_HALVINGS {
                let mut trial = &x + &dx * alpha;
                problem.clamp(&mut trial);
                if let Ok(ft) = problem.residual(&trial) {
                    if is_finite(&ft) {
                        if !opts.line_search || ft.norm() <= (1.0 - ARMIJO * alpha) * norm0 {
                            accepted = Some((trial, ft));
                            break;
                        }
                        if fallback.as_ref().is_none_or(|(_, best)| ft.norm() < best.norm()) {
                            fallback = Some((trial, ft));
                        }
                    }
                }
                alpha *= 0.5;
            }
            match accepted.or(fallback) {
                Some((trial, ft)) => {
                    x = trial;
                    f = ft;
                }
                None => {
                    return Ok(EquilibriumResult::failure(
                        "no step along the Newton direction can be evaluated".to_string(),
                        iterations,
                        error,
                    ));
                }
            }
        }

        let residual = f.amax();
        if !converged(&f) {
            return Ok(EquilibriumResult::failure(
                format!(
                    "no convergence after {} iterations, max residual {:e}, balance {:e}",
                    iterations,
                    residual,
                    problem.balance_error(&f)
                ),
                iterations,
                residual,
            ));
        }

        let t = problem.temperature_of(&x);
        let p = problem.pressure_of(&x);
        state.update(t, p, &problem.amounts_of(&x));
        info!(
            "equilibrium converged in {} iterations: T = {:.3} K, P = {:.1} Pa",
            iterations, t, p
        );
        Ok(EquilibriumResult {
            succeeded: true,
            iterations,
            residual,
            message: "converged".to_string(),
            titrant_amounts: problem.titrant_amounts_of(&x),
            element_potentials: problem.element_potentials_of(&x),
            temperature: t,
            pressure: p,
        })
    }
}
