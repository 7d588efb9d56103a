//! Bayesian networks as collections of conditional probability tables.
//!
//! A Bayesian network is a directed acyclic graph where:
//! - Nodes are discrete random variables
//! - Edges represent conditional dependencies
//! - Each node has a conditional distribution given its parents
//!
//! The joint factorizes as `P(X₁, ..., Xₙ) = ∏ᵢ P(Xᵢ | parents(Xᵢ))`.

use rand::Rng;

use crate::dag::Dag;
use crate::dist::{self, Dist};
use crate::error::ProbError;
use crate::kernel::Kernel;

/// A factor P(variable | parents) stored as a CPT.
#[derive(Debug, Clone, PartialEq)]
pub struct Factor {
    /// The variable this factor defines.
    pub variable: usize,
    /// Parent variables (conditioning variables).
    pub parents: Vec<usize>,
    /// Number of states for this variable.
    pub n_states: usize,
    /// Number of states for each parent.
    pub parent_states: Vec<usize>,
    /// Rows indexed by the encoded parent configuration.
    pub cpt: Kernel,
}

impl Factor {
    /// Create a factor, checking that the CPT has one row per parent
    /// configuration and one column per state.
    pub fn new(
        variable: usize,
        parents: Vec<usize>,
        n_states: usize,
        parent_states: Vec<usize>,
        cpt: Kernel,
    ) -> Result<Self, ProbError> {
        if parents.len() != parent_states.len() {
            return Err(ProbError::ShapeMismatch {
                expected: parents.len(),
                got: parent_states.len(),
            });
        }

        let n_parent_configs: usize = parent_states.iter().product();
        if cpt.n_inputs != n_parent_configs {
            return Err(ProbError::ShapeMismatch {
                expected: n_parent_configs,
                got: cpt.n_inputs,
            });
        }
        if cpt.n_outputs != n_states {
            return Err(ProbError::ShapeMismatch {
                expected: n_states,
                got: cpt.n_outputs,
            });
        }

        Ok(Self {
            variable,
            parents,
            n_states,
            parent_states,
            cpt,
        })
    }

    /// A root factor (no parents).
    pub fn prior(variable: usize, dist: &Dist) -> Self {
        Self {
            variable,
            parents: vec![],
            n_states: dist.p.len(),
            parent_states: vec![],
            cpt: Kernel::constant(1, dist),
        }
    }

    /// Decode a parent configuration index into individual values.
    pub fn decode_parents(&self, mut idx: usize) -> Vec<usize> {
        let mut values = vec![0; self.parent_states.len()];
        for i in (0..self.parent_states.len()).rev() {
            values[i] = idx % self.parent_states[i];
            idx /= self.parent_states[i];
        }
        values
    }

    /// P(variable = state | full assignment), reading parent values from it.
    pub fn prob_in(&self, assignment: &[usize]) -> f64 {
        let row = self.row_in(assignment);
        self.cpt.k[row][assignment[self.variable]]
    }

    /// CPT row selected by a full assignment.
    pub fn row_in(&self, assignment: &[usize]) -> usize {
        let mut idx = 0;
        for (i, &p) in self.parents.iter().enumerate() {
            idx = idx * self.parent_states[i] + assignment[p];
        }
        idx
    }
}

/// Row-major encoding shared by CPT rows and count tables.
pub fn encode_row_major(states: &[usize], values: &[usize]) -> usize {
    let mut idx = 0;
    for (&s, &v) in states.iter().zip(values) {
        idx = idx * s + v;
    }
    idx
}

/// A Bayesian network represented as a collection of factors.
#[derive(Debug, Clone, PartialEq)]
pub struct BayesNet {
    /// Number of variables in the network.
    pub n_vars: usize,
    /// Number of states for each variable.
    pub var_states: Vec<usize>,
    /// Factors defining the network (one per variable once complete).
    pub factors: Vec<Factor>,
    /// Variable names.
    pub var_names: Vec<String>,
}

impl BayesNet {
    /// Create an empty network over variables with the given state counts.
    pub fn new(var_states: Vec<usize>) -> Self {
        let n_vars = var_states.len();
        Self {
            n_vars,
            var_states,
            factors: Vec::new(),
            var_names: (0..n_vars).map(|i| format!("X{}", i)).collect(),
        }
    }

    /// Add a factor to the network.
    pub fn add_factor(&mut self, factor: Factor) -> Result<(), ProbError> {
        if factor.variable >= self.n_vars {
            return Err(ProbError::IndexOutOfBounds {
                index: factor.variable,
                size: self.n_vars,
            });
        }
        for &p in &factor.parents {
            if p >= self.n_vars {
                return Err(ProbError::IndexOutOfBounds {
                    index: p,
                    size: self.n_vars,
                });
            }
        }
        if factor.n_states != self.var_states[factor.variable] {
            return Err(ProbError::ShapeMismatch {
                expected: self.var_states[factor.variable],
                got: factor.n_states,
            });
        }

        self.factors.push(factor);
        Ok(())
    }

    /// Add a prior (root node) to the network.
    pub fn add_prior(&mut self, variable: usize, dist: &Dist) -> Result<(), ProbError> {
        let expected = *self
            .var_states
            .get(variable)
            .ok_or(ProbError::IndexOutOfBounds {
                index: variable,
                size: self.n_vars,
            })?;
        if dist.p.len() != expected {
            return Err(ProbError::ShapeMismatch {
                expected,
                got: dist.p.len(),
            });
        }
        self.add_factor(Factor::prior(variable, dist))
    }

    /// Add a conditional P(child | parents) to the network.
    pub fn add_conditional(
        &mut self,
        child: usize,
        parents: Vec<usize>,
        cpt: Kernel,
    ) -> Result<(), ProbError> {
        if child >= self.n_vars {
            return Err(ProbError::IndexOutOfBounds {
                index: child,
                size: self.n_vars,
            });
        }
        let mut parent_states = Vec::with_capacity(parents.len());
        for &p in &parents {
            let s = *self.var_states.get(p).ok_or(ProbError::IndexOutOfBounds {
                index: p,
                size: self.n_vars,
            })?;
            parent_states.push(s);
        }
        let factor = Factor::new(child, parents, self.var_states[child], parent_states, cpt)?;
        self.add_factor(factor)
    }

    /// The graph induced by the factors' parent sets.
    pub fn structure(&self) -> Result<Dag, ProbError> {
        let mut dag = Dag::empty(self.n_vars);
        for f in &self.factors {
            for &p in &f.parents {
                dag.add_edge(p, f.variable)?;
            }
        }
        Ok(dag)
    }

    /// The factor for `variable`, if present.
    pub fn factor(&self, variable: usize) -> Option<&Factor> {
        self.factors.iter().find(|f| f.variable == variable)
    }

    /// Joint probability P(X₁=x₁, ..., Xₙ=xₙ).
    pub fn joint_prob(&self, assignment: &[usize]) -> f64 {
        if assignment.len() != self.n_vars {
            return 0.0;
        }
        self.factors.iter().map(|f| f.prob_in(assignment)).product()
    }

    /// The full joint distribution as a flattened vector.
    ///
    /// The index encodes the assignment: idx = x₀ + x₁*s₀ + x₂*s₀*s₁ + ...
    pub fn full_joint(&self) -> JointDist {
        let mut joint = JointDist {
            var_states: self.var_states.clone(),
            probs: Vec::new(),
        };
        let total: usize = self.var_states.iter().product();
        joint.probs = (0..total)
            .map(|idx| self.joint_prob(&joint.decode(idx)))
            .collect();
        joint
    }

    /// Variables ordered so that every parent precedes its children.
    pub fn ancestral_order(&self) -> Result<Vec<usize>, ProbError> {
        self.structure()?.topological_order()
    }

    /// Draw one joint sample by ancestral sampling.
    pub fn sample<R: Rng + ?Sized>(&self, order: &[usize], rng: &mut R) -> Vec<usize> {
        let mut assignment = vec![0; self.n_vars];
        for &var in order {
            if let Some(f) = self.factor(var) {
                let row = &f.cpt.k[f.row_in(&assignment)];
                let state = dist::sample_index(row, rng.gen());
                assignment[var] = state;
            }
        }
        assignment
    }

    /// Draw `n` independent joint samples.
    pub fn sample_n<R: Rng + ?Sized>(
        &self,
        n: usize,
        rng: &mut R,
    ) -> Result<Vec<Vec<usize>>, ProbError> {
        let order = self.ancestral_order()?;
        Ok((0..n).map(|_| self.sample(&order, rng)).collect())
    }

}

/// A joint distribution over several discrete variables.
#[derive(Debug, Clone, PartialEq)]
pub struct JointDist {
    /// Number of states for each variable.
    pub var_states: Vec<usize>,
    /// Flattened probability vector.
    pub probs: Vec<f64>,
}

impl JointDist {
    /// Encode an assignment into an index (first variable varies fastest).
    pub fn encode(&self, assignment: &[usize]) -> usize {
        let mut idx = 0;
        let mut multiplier = 1;
        for (i, &val) in assignment.iter().enumerate() {
            idx += val * multiplier;
            multiplier *= self.var_states[i];
        }
        idx
    }

    /// Decode an index into an assignment.
    pub fn decode(&self, mut idx: usize) -> Vec<usize> {
        let mut assignment = vec![0; self.var_states.len()];
        for (i, val) in assignment.iter_mut().enumerate() {
            *val = idx % self.var_states[i];
            idx /= self.var_states[i];
        }
        assignment
    }

    /// Shannon entropy of the joint (nats).
    pub fn entropy(&self) -> f64 {
        dist::entropy(&self.probs)
    }

    /// `D_KL(self || other)` over the same variables.
    pub fn kl_divergence(&self, other: &JointDist) -> Result<f64, ProbError> {
        if self.var_states != other.var_states {
            return Err(ProbError::ShapeMismatch {
                expected: self.probs.len(),
                got: other.probs.len(),
            });
        }
        dist::kl_divergence(&self.probs, &other.probs)
    }

}
