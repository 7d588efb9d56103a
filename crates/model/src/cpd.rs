//! Templated Bayesian-network structure model.
//!
//! The state is a node ordering plus edges that only point forward in that
//! ordering, so every reachable graph is acyclic without a cycle check.
//! Two symmetric moves walk the space:
//!
//! - **flip**: toggle the edge between two nodes (earlier → later)
//! - **swap**: exchange two adjacent nodes in the ordering, reversing the
//!   edge between them if there is one
//!
//! The energy combines a template prior with the K2 marginal likelihood:
//!
//! ```text
//! E(G) = w · Σᵢ≠ⱼ |Aᵢⱼ − Tᵢⱼ| − log P(D | G)
//! ```

use rand::Rng;
use samcnet_prob::{BayesNet, Dag, JointDist, Template};
use samcnet_samc::SamcTarget;

use crate::error::ModelError;
use crate::score::Counts;

/// Default cap on the number of parents of any node.
pub const DEFAULT_MAX_PARENTS: usize = 4;

/// Largest joint state space the statistics will enumerate.
pub const MAX_JOINT_STATES: usize = 1 << 20;

/// Index of the entropy component in [`BayesNetCpd::statistics`].
pub const ENTROPY: usize = 0;
/// Index of the KL-divergence component in [`BayesNetCpd::statistics`].
pub const KLD: usize = 1;

#[derive(Debug, Clone, PartialEq)]
enum Move {
    Flip { from: usize, to: usize },
    Swap { pos: usize, reversed: bool },
}

#[derive(Debug, Clone, PartialEq)]
struct Undo {
    mv: Move,
    scores: Vec<(usize, f64)>,
    penalty: f64,
}

/// A Bayesian network whose structure is sampled and whose CPTs are the
/// posterior means given the data.
#[derive(Debug, Clone)]
pub struct BayesNetCpd {
    states: Vec<usize>,
    data: Vec<Vec<usize>>,
    template: Template,
    priorweight: f64,
    max_parents: usize,
    order: Vec<usize>,
    adj: Vec<Vec<bool>>,
    node_scores: Vec<f64>,
    penalty: f64,
    ground: JointDist,
    gold: Option<BayesNet>,
    undo: Option<Undo>,
}

impl BayesNetCpd {
    /// A sampled model starting from the empty graph, compared against the
    /// reference joint of `ground`.
    pub fn new(
        states: Vec<usize>,
        data: Vec<Vec<usize>>,
        template: Template,
        ground: &BayesNetCpd,
        priorweight: f64,
    ) -> Result<Self, ModelError> {
        let n = states.len();
        Self::build(
            states,
            data,
            template,
            ground.reference_joint().clone(),
            priorweight,
            Dag::empty(n),
        )
    }

    /// A model frozen at the structure and CPTs of the true network.
    ///
    /// Its reference joint is the true joint, so its KL statistic is zero.
    pub fn gold(
        states: Vec<usize>,
        data: Vec<Vec<usize>>,
        template: Template,
        joint: &BayesNet,
        priorweight: f64,
    ) -> Result<Self, ModelError> {
        if joint.var_states != states {
            return Err(ModelError::GroundMismatch {
                ground: joint.var_states.clone(),
                model: states,
            });
        }
        check_joint_size(&states)?;
        let structure = joint.structure()?;
        let mut model = Self::build(
            states,
            data,
            template,
            joint.full_joint(),
            priorweight,
            structure,
        )?;
        model.gold = Some(joint.clone());
        Ok(model)
    }

    fn build(
        states: Vec<usize>,
        data: Vec<Vec<usize>>,
        template: Template,
        ground: JointDist,
        priorweight: f64,
        structure: Dag,
    ) -> Result<Self, ModelError> {
        let n = states.len();
        validate(&states, &data, &template)?;
        check_joint_size(&states)?;
        if !(priorweight >= 0.0 && priorweight.is_finite()) {
            return Err(ModelError::InvalidPriorWeight {
                weight: priorweight,
            });
        }
        if ground.var_states != states {
            return Err(ModelError::GroundMismatch {
                ground: ground.var_states,
                model: states,
            });
        }

        let order = structure.topological_order()?;
        let mut adj = vec![vec![false; n]; n];
        for (from, to) in structure.edges() {
            adj[from][to] = true;
        }

        let mut model = Self {
            states,
            data,
            template,
            priorweight,
            max_parents: DEFAULT_MAX_PARENTS,
            order,
            adj,
            node_scores: vec![0.0; n],
            penalty: 0.0,
            ground,
            gold: None,
            undo: None,
        };
        for node in 0..n {
            model.node_scores[node] = model.local_energy(node);
        }
        model.penalty = model.template_penalty();
        Ok(model)
    }

    /// Limit the in-degree proposals may create.
    pub fn with_max_parents(mut self, max_parents: usize) -> Self {
        self.max_parents = max_parents.max(1);
        self
    }

    /// Number of variables.
    pub fn n_vars(&self) -> usize {
        self.states.len()
    }

    pub fn states(&self) -> &[usize] {
        &self.states
    }

    /// Whether this is a frozen ground-truth model.
    pub fn is_gold(&self) -> bool {
        self.gold.is_some()
    }

    /// The joint other models are compared against.
    pub fn reference_joint(&self) -> &JointDist {
        &self.ground
    }

    /// Current node ordering.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Parents of `node` in ascending index order.
    pub fn parents(&self, node: usize) -> Vec<usize> {
        (0..self.n_vars()).filter(|&p| self.adj[p][node]).collect()
    }

    pub fn edge_count(&self) -> usize {
        self.adj.iter().flatten().filter(|&&e| e).count()
    }

    /// Current structure as a DAG.
    pub fn structure(&self) -> Result<Dag, ModelError> {
        let edges: Vec<(usize, usize)> = self
            .order
            .iter()
            .flat_map(|&to| self.parents(to).into_iter().map(move |from| (from, to)))
            .collect();
        Ok(Dag::from_edges(self.n_vars(), &edges)?)
    }

    /// Negative K2 log marginal likelihood of `node` given its parents.
    fn local_energy(&self, node: usize) -> f64 {
        -Counts::tabulate(&self.data, &self.states, node, &self.parents(node))
            .log_marginal_likelihood()
    }

    fn template_penalty(&self) -> f64 {
        let n = self.n_vars();
        let mut total = 0.0;
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    total += self.mismatch(i, j);
                }
            }
        }
        total
    }

    fn mismatch(&self, i: usize, j: usize) -> f64 {
        let a = if self.adj[i][j] { 1.0 } else { 0.0 };
        (a - self.template[i][j]).abs()
    }

    /// Prior part of the energy.
    pub fn prior_energy(&self) -> f64 {
        self.priorweight * self.penalty
    }

    /// Negative log marginal likelihood of the data.
    pub fn likelihood_energy(&self) -> f64 {
        self.node_scores.iter().sum()
    }

    /// The network with posterior-mean CPTs for the current structure, or
    /// the true network for a gold model.
    pub fn network(&self) -> Result<BayesNet, ModelError> {
        if let Some(gold) = &self.gold {
            return Ok(gold.clone());
        }
        let mut net = BayesNet::new(self.states.clone());
        for node in 0..self.n_vars() {
            let parents = self.parents(node);
            let cpt = Counts::tabulate(&self.data, &self.states, node, &parents).posterior_mean()?;
            net.add_conditional(node, parents, cpt)?;
        }
        Ok(net)
    }

    /// Joint distribution of [`Self::network`].
    pub fn joint(&self) -> Result<JointDist, ModelError> {
        if self.gold.is_some() {
            return Ok(self.ground.clone());
        }
        Ok(self.network()?.full_joint())
    }

    /// Shannon entropy of the model joint (nats).
    pub fn entropy(&self) -> Result<f64, ModelError> {
        Ok(self.joint()?.entropy())
    }

    /// `KL(ground || model)`.
    pub fn kld(&self) -> Result<f64, ModelError> {
        Ok(self.ground.kl_divergence(&self.joint()?)?)
    }

    fn apply_flip(&mut self, from: usize, to: usize) {
        self.penalty -= self.mismatch(from, to);
        self.adj[from][to] = !self.adj[from][to];
        self.penalty += self.mismatch(from, to);
        self.node_scores[to] = self.local_energy(to);
    }

    fn apply_swap(&mut self, pos: usize) -> bool {
        let (u, v) = (self.order[pos], self.order[pos + 1]);
        self.order.swap(pos, pos + 1);
        if !self.adj[u][v] {
            return false;
        }
        self.penalty -= self.mismatch(u, v) + self.mismatch(v, u);
        self.adj[u][v] = false;
        self.adj[v][u] = true;
        self.penalty += self.mismatch(u, v) + self.mismatch(v, u);
        self.node_scores[u] = self.local_energy(u);
        self.node_scores[v] = self.local_energy(v);
        true
    }

    fn propose_flip<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Move> {
        let n = self.n_vars();
        let a = rng.gen_range(0..n);
        let mut b = rng.gen_range(0..n - 1);
        if b >= a {
            b += 1;
        }
        let (from, to) = (self.order[a.min(b)], self.order[a.max(b)]);
        if !self.adj[from][to] && self.parents(to).len() >= self.max_parents {
            return None;
        }
        self.apply_flip(from, to);
        Some(Move::Flip { from, to })
    }

    fn propose_swap<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Move> {
        let pos = rng.gen_range(0..self.n_vars() - 1);
        let (u, v) = (self.order[pos], self.order[pos + 1]);
        if self.adj[u][v] && self.parents(u).len() >= self.max_parents {
            return None;
        }
        let reversed = self.apply_swap(pos);
        Some(Move::Swap { pos, reversed })
    }
}

impl SamcTarget for BayesNetCpd {
    fn propose<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.undo = None;
        if self.gold.is_some() || self.n_vars() < 2 {
            return;
        }
        let scores = self.node_scores.clone();
        let penalty = self.penalty;
        let mv = if rng.gen_bool(0.5) {
            self.propose_flip(rng)
        } else {
            self.propose_swap(rng)
        };
        self.undo = mv.map(|mv| Undo {
            mv,
            scores: scores.into_iter().enumerate().collect(),
            penalty,
        });
    }

    fn reject(&mut self) {
        let Some(undo) = self.undo.take() else {
            return;
        };
        match undo.mv {
            Move::Flip { from, to } => self.adj[from][to] = !self.adj[from][to],
            Move::Swap { pos, reversed } => {
                let (v, u) = (self.order[pos], self.order[pos + 1]);
                self.order.swap(pos, pos + 1);
                if reversed {
                    self.adj[v][u] = false;
                    self.adj[u][v] = true;
                }
            }
        }
        for (node, score) in undo.scores {
            self.node_scores[node] = score;
        }
        self.penalty = undo.penalty;
    }

    fn energy(&self) -> f64 {
        self.prior_energy() + self.likelihood_energy()
    }

    /// `[entropy, kld]` of the current model; NaN if the joint cannot be built.
    fn statistics(&self) -> Vec<f64> {
        match (self.entropy(), self.kld()) {
            (Ok(h), Ok(kl)) => vec![h, kl],
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "could not compute model statistics");
                vec![f64::NAN, f64::NAN]
            }
        }
    }
}

fn validate(states: &[usize], data: &[Vec<usize>], template: &Template) -> Result<(), ModelError> {
    let n = states.len();
    if n == 0 {
        return Err(ModelError::NoVariables);
    }
    if let Some(variable) = states.iter().position(|&s| s == 0) {
        return Err(ModelError::EmptyStateSpace { variable });
    }
    if template.len() != n {
        return Err(ModelError::TemplateShape {
            expected: n,
            got: template.len(),
        });
    }
    if let Some(row) = template.iter().find(|row| row.len() != n) {
        return Err(ModelError::TemplateShape {
            expected: n,
            got: row.len(),
        });
    }
    for (r, obs) in data.iter().enumerate() {
        if obs.len() != n {
            return Err(ModelError::DataShape {
                row: r,
                expected: n,
                got: obs.len(),
            });
        }
        for (variable, (&value, &s)) in obs.iter().zip(states).enumerate() {
            if value >= s {
                return Err(ModelError::DataOutOfRange {
                    row: r,
                    variable,
                    value,
                    states: s,
                });
            }
        }
    }
    Ok(())
}

fn check_joint_size(states: &[usize]) -> Result<(), ModelError> {
    let size = states
        .iter()
        .try_fold(1usize, |acc, &s| acc.checked_mul(s))
        .unwrap_or(usize::MAX);
    if size > MAX_JOINT_STATES {
        return Err(ModelError::JointTooLarge {
            size,
            limit: MAX_JOINT_STATES,
        });
    }
    Ok(())
}
