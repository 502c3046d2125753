//! Operator-splitting (ADMM) iteration for convex QPs.

use mpc_core::{ConId, VarId};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{SolverError, SolverResult};
use crate::problem::QpData;

/// Step size floor used for rows without any finite bound.
const RHO_MIN: f64 = 1e-6;
/// Step size multiplier for equality rows.
const RHO_EQ_SCALE: f64 = 1e3;

/// Iteration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QpSettings {
    /// ADMM step size
    pub rho: f64,
    /// Proximal regularization on x
    pub sigma: f64,
    /// Over-relaxation factor in (0, 2)
    pub alpha: f64,
    /// Absolute tolerance for primal/dual residuals
    pub eps_abs: f64,
    /// Relative tolerance for primal/dual residuals
    pub eps_rel: f64,
    /// Tolerance for the infeasibility certificates
    pub eps_infeasible: f64,
    /// Maximum iterations
    pub max_iterations: usize,
}

impl Default for QpSettings {
    fn default() -> Self {
        Self {
            rho: 0.1,
            sigma: 1e-6,
            alpha: 1.6,
            eps_abs: 1e-6,
            eps_rel: 1e-6,
            eps_infeasible: 1e-4,
            max_iterations: 20_000,
        }
    }
}

/// Outcome of the iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QpStatus {
    Optimal,
    PrimalInfeasible,
    DualInfeasible,
    MaxIterations,
}

/// Primal and dual values keyed by the identifiers of the structure.
#[derive(Debug, Clone)]
pub struct QpSolution {
    pub status: QpStatus,
    /// Primal values, indexed by `VarId`
    pub x: Vec<f64>,
    /// Multipliers of the constraint rows, indexed by `ConId`
    pub duals: Vec<f64>,
    pub objective: f64,
    pub iterations: usize,
    pub primal_residual: f64,
    pub dual_residual: f64,
}

impl QpSolution {
    pub fn value(&self, var: VarId) -> f64 {
        self.x[var.slot()]
    }

    pub fn values(&self, vars: &[VarId]) -> Vec<f64> {
        vars.iter().map(|v| self.value(*v)).collect()
    }

    pub fn dual(&self, con: ConId) -> f64 {
        self.duals[con.slot()]
    }

    /// Turn any non-optimal status into the matching error.
    pub fn into_result(self) -> SolverResult<Self> {
        match self.status {
            QpStatus::Optimal => Ok(self),
            QpStatus::PrimalInfeasible => Err(SolverError::Infeasible {
                what: "infeasibility certificate found".to_string(),
            }),
            QpStatus::DualInfeasible => Err(SolverError::Unbounded),
            QpStatus::MaxIterations => Err(SolverError::MaxIterations {
                iterations: self.iterations,
                primal_residual: self.primal_residual,
                dual_residual: self.dual_residual,
            }),
        }
    }
}

/// Solve and require an optimal status.
pub fn solve(data: &QpData<'_>, settings: &QpSettings) -> SolverResult<QpSolution> {
    iterate(data, settings)?.into_result()
}

/// Run the iteration and report whatever status it ends with.
///
/// Errors are limited to malformed numeric data (non-finite values, inverted
/// bounds) and a failed factorization.
pub fn iterate(data: &QpData<'_>, settings: &QpSettings) -> SolverResult<QpSolution> {
    validate(data)?;
    let structure = data.structure();
    let n = structure.n_vars();
    let m = structure.n_constraints();

    // Stacked constraint matrix: rows first, then one identity row per variable.
    let mut a = DMatrix::<f64>::zeros(m + n, n);
    for r in 0..m {
        for (k, j) in structure.row_terms(r).enumerate() {
            a[(r, j)] = data.coefficients[r][k];
        }
    }
    for j in 0..n {
        a[(m + j, j)] = 1.0;
    }
    let at = a.transpose();

    let mut p = DMatrix::<f64>::zeros(n, n);
    for ((i, j), v) in structure.hessian_pattern().zip(&data.hessian) {
        p[(i, j)] = *v;
        p[(j, i)] = *v;
    }
    let q = DVector::from_column_slice(&data.q);
    let l = DVector::from_iterator(m + n, data.row_lo.iter().chain(&data.lb).copied());
    let u = DVector::from_iterator(m + n, data.row_hi.iter().chain(&data.ub).copied());

    let rho = DVector::from_iterator(
        m + n,
        l.iter().zip(u.iter()).map(|(lo, hi)| {
            if lo == hi {
                settings.rho * RHO_EQ_SCALE
            } else if lo.is_infinite() && hi.is_infinite() {
                RHO_MIN
            } else {
                settings.rho
            }
        }),
    );

    let kkt = &p
        + DMatrix::<f64>::identity(n, n) * settings.sigma
        + &at * DMatrix::from_diagonal(&rho) * &a;
    let chol = kkt.cholesky().ok_or_else(|| SolverError::Numeric {
        what: "KKT matrix is not positive definite (is P convex?)".to_string(),
    })?;

    let mut x = DVector::<f64>::zeros(n);
    let mut z = DVector::<f64>::zeros(m + n);
    let mut y = DVector::<f64>::zeros(m + n);
    let alpha = settings.alpha;

    let mut status = QpStatus::MaxIterations;
    let mut primal_residual = f64::INFINITY;
    let mut dual_residual = f64::INFINITY;
    let mut iterations = 0;

    for iter in 1..=settings.max_iterations {
        iterations = iter;

        let rhs = &x * settings.sigma - &q + &at * (rho.component_mul(&z) - &y);
        let x_tilde = chol.solve(&rhs);
        let z_tilde = &a * &x_tilde;

        let x_next = &x_tilde * alpha + &x * (1.0 - alpha);
        let z_hat = &z_tilde * alpha + &z * (1.0 - alpha);
        let z_next = project(&(&z_hat + y.component_div(&rho)), &l, &u);
        let y_next = &y + rho.component_mul(&(&z_hat - &z_next));

        let delta_x = &x_next - &x;
        let delta_y = &y_next - &y;
        x = x_next;
        z = z_next;
        y = y_next;

        let ax = &a * &x;
        let px = &p * &x;
        let aty = &at * &y;
        primal_residual = (&ax - &z).amax();
        dual_residual = (&px + &q + &aty).amax();

        let eps_primal = settings.eps_abs + settings.eps_rel * ax.amax().max(z.amax());
        let eps_dual = settings.eps_abs
            + settings.eps_rel * px.amax().max(aty.amax()).max(q.amax());
        if primal_residual <= eps_primal && dual_residual <= eps_dual {
            status = QpStatus::Optimal;
            break;
        }

        if primal_infeasible(&delta_y, &at, &l, &u, settings.eps_infeasible) {
            status = QpStatus::PrimalInfeasible;
            break;
        }
        if dual_infeasible(&delta_x, &p, &q, &a, &l, &u, settings.eps_infeasible) {
            status = QpStatus::DualInfeasible;
            break;
        }
    }

    let objective = 0.5 * x.dot(&(&p * &x)) + q.dot(&x);
    tracing::debug!(
        ?status,
        iterations,
        objective,
        primal_residual,
        dual_residual,
        "qp iteration finished"
    );

    Ok(QpSolution {
        status,
        x: x.iter().copied().collect(),
        duals: y.rows(0, m).iter().copied().collect(),
        objective,
        iterations,
        primal_residual,
        dual_residual,
    })
}

fn validate(data: &QpData<'_>) -> SolverResult<()> {
    let structure = data.structure();
    let non_finite = |what: &str| SolverError::Numeric {
        what: format!("non-finite {what}"),
    };
    if data.q.iter().any(|v| !v.is_finite()) {
        return Err(non_finite("linear cost"));
    }
    if data.hessian.iter().any(|v| !v.is_finite()) {
        return Err(non_finite("Hessian entry"));
    }
    if data.coefficients.iter().flatten().any(|v| !v.is_finite()) {
        return Err(non_finite("constraint coefficient"));
    }
    for (i, (lo, hi)) in data.lb.iter().zip(&data.ub).enumerate() {
        check_bounds(*lo, *hi, || format!("variable `{}`", structure.var_name_at(i)))?;
    }
    for (r, (lo, hi)) in data.row_lo.iter().zip(&data.row_hi).enumerate() {
        check_bounds(*lo, *hi, || {
            format!("constraint `{}`", structure.constraint_name_at(r))
        })?;
    }
    Ok(())
}

fn check_bounds(lo: f64, hi: f64, name: impl Fn() -> String) -> SolverResult<()> {
    if lo.is_nan() || hi.is_nan() {
        return Err(SolverError::Numeric {
            what: format!("NaN bound on {}", name()),
        });
    }
    if lo > hi || lo == f64::INFINITY || hi == f64::NEG_INFINITY {
        return Err(SolverError::Infeasible {
            what: format!("{} has bounds [{lo}, {hi}]", name()),
        });
    }
    Ok(())
}

fn project(v: &DVector<f64>, l: &DVector<f64>, u: &DVector<f64>) -> DVector<f64> {
    DVector::from_iterator(
        v.len(),
        v.iter()
            .zip(l.iter().zip(u.iter()))
            .map(|(x, (lo, hi))| x.max(*lo).min(*hi)),
    )
}

fn primal_infeasible(
    delta_y: &DVector<f64>,
    at: &DMatrix<f64>,
    l: &DVector<f64>,
    u: &DVector<f64>,
    eps: f64,
) -> bool {
    let norm = delta_y.amax();
    if norm <= eps {
        return false;
    }
    if (at * delta_y).amax() > eps * norm {
        return false;
    }
    let support: f64 = delta_y
        .iter()
        .zip(l.iter().zip(u.iter()))
        .map(|(dy, (lo, hi))| {
            if *dy > 0.0 {
                hi * dy
            } else if *dy < 0.0 {
                lo * dy
            } else {
                0.0
            }
        })
        .sum();
    support < -eps * norm
}

fn dual_infeasible(
    delta_x: &DVector<f64>,
    p: &DMatrix<f64>,
    q: &DVector<f64>,
    a: &DMatrix<f64>,
    l: &DVector<f64>,
    u: &DVector<f64>,
    eps: f64,
) -> bool {
    let norm = delta_x.amax();
    if norm <= eps {
        return false;
    }
    if (p * delta_x).amax() > eps * norm || q.dot(delta_x) > -eps * norm {
        return false;
    }
    let tol = eps * norm;
    (a * delta_x)
        .iter()
        .zip(l.iter().zip(u.iter()))
        .all(|(ad, (lo, hi))| {
            (hi.is_infinite() || *ad <= tol) && (lo.is_infinite() || *ad >= -tol)
        })
}
