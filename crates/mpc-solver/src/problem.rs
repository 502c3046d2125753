//! Problem structure (built once) and per-solve numeric data.

use std::collections::HashMap;

use mpc_core::{ConId, Id, VarId};

use crate::error::{SolverError, SolverResult};

/// One linear constraint row: the variables it touches and their default
/// coefficients.
#[derive(Debug, Clone)]
struct RowSpec {
    name: String,
    terms: Vec<(VarId, f64)>,
}

/// Incrementally declares variables, constraint rows and Hessian entries.
#[derive(Debug, Default)]
pub struct QpBuilder {
    var_names: Vec<String>,
    rows: Vec<RowSpec>,
    hessian: Vec<((VarId, VarId), f64)>,
}

impl QpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable(&mut self, name: impl Into<String>) -> VarId {
        let id = Id::from_index(self.var_names.len() as u32);
        self.var_names.push(name.into());
        id
    }

    /// Add `count` variables named `prefix[0]`, `prefix[1]`, ...
    pub fn add_variables(&mut self, prefix: &str, count: usize) -> Vec<VarId> {
        (0..count)
            .map(|i| self.add_variable(format!("{prefix}[{i}]")))
            .collect()
    }

    /// Declare a constraint row `l ≤ Σ a_j x_j ≤ u`.
    ///
    /// The coefficients given here are defaults; any of them may be replaced
    /// per solve with [`QpData::set_coefficient`]. Variables not listed can
    /// never enter this row.
    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        terms: &[(VarId, f64)],
    ) -> SolverResult<ConId> {
        let name = name.into();
        if terms.is_empty() {
            return Err(SolverError::ProblemSetup {
                what: format!("constraint `{name}` has no terms"),
            });
        }
        for (k, (var, _)) in terms.iter().enumerate() {
            self.check_var(*var)?;
            if terms[..k].iter().any(|(other, _)| other == var) {
                return Err(SolverError::ProblemSetup {
                    what: format!("constraint `{name}` lists variable {var} twice"),
                });
            }
        }
        let id = Id::from_index(self.rows.len() as u32);
        self.rows.push(RowSpec {
            name,
            terms: terms.to_vec(),
        });
        Ok(id)
    }

    /// Declare the Hessian entry `P[i][j] = P[j][i] = value`.
    ///
    /// A diagonal entry `P[i][i] = w` contributes `½ w x_i²` to the objective.
    pub fn add_quadratic(&mut self, i: VarId, j: VarId, value: f64) -> SolverResult<()> {
        self.check_var(i)?;
        self.check_var(j)?;
        let key = (i.min(j), i.max(j));
        if self.hessian.iter().any(|(k, _)| *k == key) {
            return Err(SolverError::ProblemSetup {
                what: format!("Hessian entry ({i}, {j}) declared twice"),
            });
        }
        self.hessian.push((key, value));
        Ok(())
    }

    pub fn build(self) -> SolverResult<QpStructure> {
        if self.var_names.is_empty() {
            return Err(SolverError::ProblemSetup {
                what: "problem has no variables".to_string(),
            });
        }
        let mut coefficient_slots = HashMap::new();
        for (r, row) in self.rows.iter().enumerate() {
            for (k, (var, _)) in row.terms.iter().enumerate() {
                coefficient_slots.insert((r, var.slot()), k);
            }
        }
        let hessian_slots = self
            .hessian
            .iter()
            .enumerate()
            .map(|(k, ((i, j), _))| ((i.slot(), j.slot()), k))
            .collect();
        Ok(QpStructure {
            var_names: self.var_names,
            rows: self.rows,
            hessian: self.hessian,
            coefficient_slots,
            hessian_slots,
        })
    }

    fn check_var(&self, var: VarId) -> SolverResult<()> {
        if var.slot() < self.var_names.len() {
            Ok(())
        } else {
            Err(SolverError::ProblemSetup {
                what: format!("unknown variable {var}"),
            })
        }
    }
}

/// Immutable problem topology: variable set, constraint rows and their
/// sparsity, Hessian sparsity.
#[derive(Debug, Clone)]
pub struct QpStructure {
    var_names: Vec<String>,
    rows: Vec<RowSpec>,
    hessian: Vec<((VarId, VarId), f64)>,
    coefficient_slots: HashMap<(usize, usize), usize>,
    hessian_slots: HashMap<(usize, usize), usize>,
}

impl QpStructure {
    pub fn n_vars(&self) -> usize {
        self.var_names.len()
    }

    pub fn n_constraints(&self) -> usize {
        self.rows.len()
    }

    pub fn var_name(&self, var: VarId) -> &str {
        &self.var_names[var.slot()]
    }

    pub fn constraint_name(&self, con: ConId) -> &str {
        &self.rows[con.slot()].name
    }

    pub fn variable(&self, name: &str) -> Option<VarId> {
        self.var_names
            .iter()
            .position(|n| n == name)
            .map(|i| Id::from_index(i as u32))
    }

    pub fn constraint(&self, name: &str) -> Option<ConId> {
        self.rows
            .iter()
            .position(|r| r.name == name)
            .map(|i| Id::from_index(i as u32))
    }

    /// Fresh numeric data: zero linear cost, free variables, equality rows
    /// with zero right-hand side and the declared default coefficients.
    pub fn data(&self) -> QpData<'_> {
        let n = self.n_vars();
        let m = self.n_constraints();
        QpData {
            structure: self,
            q: vec![0.0; n],
            lb: vec![f64::NEG_INFINITY; n],
            ub: vec![f64::INFINITY; n],
            row_lo: vec![0.0; m],
            row_hi: vec![0.0; m],
            coefficients: self
                .rows
                .iter()
                .map(|r| r.terms.iter().map(|(_, a)| *a).collect())
                .collect(),
            hessian: self.hessian.iter().map(|(_, v)| *v).collect(),
        }
    }

    pub(crate) fn var_name_at(&self, slot: usize) -> &str {
        &self.var_names[slot]
    }

    pub(crate) fn constraint_name_at(&self, row: usize) -> &str {
        &self.rows[row].name
    }

    pub(crate) fn row_terms(&self, row: usize) -> impl Iterator<Item = usize> + '_ {
        self.rows[row].terms.iter().map(|(v, _)| v.slot())
    }

    pub(crate) fn hessian_pattern(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.hessian.iter().map(|((i, j), _)| (i.slot(), j.slot()))
    }
}

/// Numeric values for one solve of a [`QpStructure`].
#[derive(Debug, Clone)]
pub struct QpData<'s> {
    structure: &'s QpStructure,
    pub(crate) q: Vec<f64>,
    pub(crate) lb: Vec<f64>,
    pub(crate) ub: Vec<f64>,
    pub(crate) row_lo: Vec<f64>,
    pub(crate) row_hi: Vec<f64>,
    pub(crate) coefficients: Vec<Vec<f64>>,
    pub(crate) hessian: Vec<f64>,
}

impl<'s> QpData<'s> {
    pub fn structure(&self) -> &'s QpStructure {
        self.structure
    }

    pub fn set_cost(&mut self, var: VarId, cost: f64) -> SolverResult<()> {
        let i = self.var_slot(var)?;
        self.q[i] = cost;
        Ok(())
    }

    pub fn set_bounds(&mut self, var: VarId, lower: f64, upper: f64) -> SolverResult<()> {
        let i = self.var_slot(var)?;
        self.lb[i] = lower;
        self.ub[i] = upper;
        Ok(())
    }

    /// Pin a variable to a single value.
    pub fn fix(&mut self, var: VarId, value: f64) -> SolverResult<()> {
        self.set_bounds(var, value, value)
    }

    pub fn set_row_bounds(&mut self, con: ConId, lower: f64, upper: f64) -> SolverResult<()> {
        let r = self.con_slot(con)?;
        self.row_lo[r] = lower;
        self.row_hi[r] = upper;
        Ok(())
    }

    /// Turn a row into the equality `Σ a_j x_j = rhs`.
    pub fn set_rhs(&mut self, con: ConId, rhs: f64) -> SolverResult<()> {
        self.set_row_bounds(con, rhs, rhs)
    }

    /// Replace a coefficient declared at build time.
    pub fn set_coefficient(&mut self, con: ConId, var: VarId, value: f64) -> SolverResult<()> {
        let r = self.con_slot(con)?;
        let i = self.var_slot(var)?;
        let k = self
            .structure
            .coefficient_slots
            .get(&(r, i))
            .ok_or_else(|| SolverError::ProblemSetup {
                what: format!(
                    "variable `{}` is not part of constraint `{}`",
                    self.structure.var_names[i], self.structure.rows[r].name
                ),
            })?;
        self.coefficients[r][*k] = value;
        Ok(())
    }

    /// Replace a Hessian entry declared at build time.
    pub fn set_quadratic(&mut self, i: VarId, j: VarId, value: f64) -> SolverResult<()> {
        let (a, b) = (self.var_slot(i.min(j))?, self.var_slot(i.max(j))?);
        let k = self
            .structure
            .hessian_slots
            .get(&(a, b))
            .ok_or_else(|| SolverError::ProblemSetup {
                what: format!("Hessian entry ({i}, {j}) was not declared"),
            })?;
        self.hessian[*k] = value;
        Ok(())
    }

    fn var_slot(&self, var: VarId) -> SolverResult<usize> {
        if var.slot() < self.structure.n_vars() {
            Ok(var.slot())
        } else {
            Err(SolverError::ProblemSetup {
                what: format!("unknown variable {var}"),
            })
        }
    }

    fn con_slot(&self, con: ConId) -> SolverResult<usize> {
        if con.slot() < self.structure.n_constraints() {
            Ok(con.slot())
        } else {
            Err(SolverError::ProblemSetup {
                what: format!("unknown constraint {con}"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_duplicate_terms() {
        let mut b = QpBuilder::new();
        let x = b.add_variable("x");
        assert!(b.add_constraint("c", &[(x, 1.0), (x, 2.0)]).is_err());
        assert!(b.add_constraint("empty", &[]).is_err());
    }

    #[test]
    fn builder_rejects_foreign_variable() {
        let mut other = QpBuilder::new();
        other.add_variable("a");
        let foreign = other.add_variable("b");

        let mut b = QpBuilder::new();
        b.add_variable("x");
        assert!(b.add_constraint("c", &[(foreign, 1.0)]).is_err());
        assert!(QpBuilder::new().build().is_err());
    }

    #[test]
    fn coefficient_outside_pattern_rejected() {
        let mut b = QpBuilder::new();
        let xs = b.add_variables("x", 2);
        let c = b.add_constraint("c", &[(xs[0], 1.0)]).unwrap();
        let structure = b.build().unwrap();

        let mut data = structure.data();
        assert!(data.set_coefficient(c, xs[0], 3.0).is_ok());
        assert!(data.set_coefficient(c, xs[1], 3.0).is_err());
        assert!(data.set_quadratic(xs[0], xs[1], 1.0).is_err());
    }

    #[test]
    fn names_resolve_to_ids() {
        let mut b = QpBuilder::new();
        let xs = b.add_variables("u", 3);
        let c = b.add_constraint("dyn[0]", &[(xs[1], 1.0)]).unwrap();
        let structure = b.build().unwrap();
        assert_eq!(structure.variable("u[1]"), Some(xs[1]));
        assert_eq!(structure.constraint("dyn[0]"), Some(c));
        assert_eq!(structure.var_name(xs[2]), "u[2]");
        assert_eq!(structure.constraint_name(c), "dyn[0]");
    }
}
