//! Synthetic ground-truth networks, observations and structure templates.
//!
//! Every function here draws only from the `rng` it is handed, so a seeded
//! generator reproduces the same graph, data and template.

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::bayesnet::BayesNet;
use crate::dag::Dag;
use crate::dist::Dist;
use crate::error::ProbError;
use crate::kernel::Kernel;

/// Flip probability applied to the output of a noisy logic gate.
pub const LOGIC_NOISE: f64 = 0.1;

/// Prior adjacency weights: `template[i][j]` is the belief in edge `i -> j`.
pub type Template = Vec<Vec<f64>>;

/// How conditional probability tables of the ground network are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataMethod {
    /// Each child is a noisy AND / OR / XOR of its parents.
    #[default]
    NoisyLogic,
    /// Each CPT row is a flat Dirichlet draw.
    Dirichlet,
}

impl fmt::Display for DataMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataMethod::NoisyLogic => write!(f, "noisylogic"),
            DataMethod::Dirichlet => write!(f, "dirichlet"),
        }
    }
}

impl FromStr for DataMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "noisylogic" => Ok(DataMethod::NoisyLogic),
            "dirichlet" => Ok(DataMethod::Dirichlet),
            other => Err(format!(
                "unknown data method '{other}' (expected noisylogic or dirichlet)"
            )),
        }
    }
}

/// Boolean gate used by the noisy-logic generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
    Xor,
}

impl LogicOp {
    const ALL: [LogicOp; 3] = [LogicOp::And, LogicOp::Or, LogicOp::Xor];

    /// Evaluate the gate on binary parent values.
    pub fn eval(self, inputs: &[usize]) -> bool {
        match self {
            LogicOp::And => inputs.iter().all(|&v| v == 1),
            LogicOp::Or => inputs.iter().any(|&v| v == 1),
            LogicOp::Xor => inputs.iter().filter(|&&v| v == 1).count() % 2 == 1,
        }
    }
}

/// Output of [`generate_data`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedData {
    /// One row per observation, one column per variable.
    pub data: Vec<Vec<usize>>,
    /// Number of states of each variable.
    pub states: Vec<usize>,
    /// The ground-truth network the data was drawn from.
    pub joint: BayesNet,
}

/// The hourglass graph: the first half of the nodes feed the middle node,
/// which feeds every remaining node.
///
/// ```text
///   0   1   2
///    ↘  ↓  ↙
///       3
///    ↙  ↓  ↘
///   4   5   6
/// ```
pub fn hourglass_graph(n: usize) -> Result<Dag, ProbError> {
    if n < 3 {
        return Err(ProbError::InvalidGraph {
            reason: format!("hourglass graph needs at least 3 nodes, got {n}"),
        });
    }
    let middle = n / 2;
    let mut edges: Vec<(usize, usize)> = (0..middle).map(|i| (i, middle)).collect();
    edges.extend((middle + 1..n).map(|j| (middle, j)));
    Dag::from_edges(n, &edges)
}

/// A random DAG: a random node order where each forward pair is joined with
/// probability `density`.
pub fn random_dag<R: Rng + ?Sized>(n: usize, density: f64, rng: &mut R) -> Result<Dag, ProbError> {
    if !(0.0..=1.0).contains(&density) {
        return Err(ProbError::InvalidGraph {
            reason: format!("edge density must lie in [0, 1], got {density}"),
        });
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let mut dag = Dag::empty(n);
    for i in 0..n {
        for j in i + 1..n {
            if rng.gen_bool(density) {
                dag.add_edge(order[i], order[j])?;
            }
        }
    }
    Ok(dag)
}

/// Build a binary ground network on `dag` and draw `numdata` observations from it.
pub fn generate_data<R: Rng + ?Sized>(
    dag: &Dag,
    numdata: usize,
    method: DataMethod,
    rng: &mut R,
) -> Result<GeneratedData, ProbError> {
    let n = dag.node_count();
    let states = vec![2; n];
    let mut joint = BayesNet::new(states.clone());

    for node in 0..n {
        let parents = dag.parents(node);
        if parents.is_empty() {
            let root = match method {
                DataMethod::NoisyLogic => Dist::bernoulli(rng.gen_range(0.1..0.9))?,
                DataMethod::Dirichlet => Dist::dirichlet(2, 1.0, rng)?,
            };
            joint.add_prior(node, &root)?;
            continue;
        }

        let n_configs = 1usize << parents.len();
        let cpt = match method {
            DataMethod::NoisyLogic => {
                let op = LogicOp::ALL[rng.gen_range(0..LogicOp::ALL.len())];
                let rows = (0..n_configs)
                    .map(|config| {
                        // Row-major decoding: the first parent is the most significant bit.
                        let values: Vec<usize> = (0..parents.len())
                            .map(|k| (config >> (parents.len() - 1 - k)) & 1)
                            .collect();
                        if op.eval(&values) {
                            vec![LOGIC_NOISE, 1.0 - LOGIC_NOISE]
                        } else {
                            vec![1.0 - LOGIC_NOISE, LOGIC_NOISE]
                        }
                    })
                    .collect();
                Kernel::new(rows)?
            }
            DataMethod::Dirichlet => Kernel::dirichlet(n_configs, 2, 1.0, rng)?,
        };
        joint.add_conditional(node, parents, cpt)?;
    }

    let data = joint.sample_n(numdata, rng)?;
    tracing::debug!(
        nodes = n,
        edges = dag.edge_count(),
        observations = data.len(),
        %method,
        "generated ground network and data"
    );

    Ok(GeneratedData {
        data,
        states,
        joint,
    })
}

/// Reveal a random subset of `numtemplate` ground edges as a template.
///
/// If the graph has fewer edges than requested, every edge is revealed.
pub fn sample_template<R: Rng + ?Sized>(dag: &Dag, numtemplate: usize, rng: &mut R) -> Template {
    let n = dag.node_count();
    let edges = dag.edges();
    let k = numtemplate.min(edges.len());

    let mut template = vec![vec![0.0; n]; n];
    for &(from, to) in edges.choose_multiple(rng, k) {
        template[from][to] = 1.0;
    }
    template
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_hourglass_shape() {
        let g = hourglass_graph(7).unwrap();
        assert_eq!(g.edge_count(), 6);
        assert_eq!(g.parents(3), vec![0, 1, 2]);
        assert_eq!(g.children(3), vec![4, 5, 6]);
        assert!(hourglass_graph(2).is_err());
    }

    #[test]
    fn test_hourglass_even() {
        let g = hourglass_graph(4).unwrap();
        assert_eq!(g.parents(2), vec![0, 1]);
        assert_eq!(g.children(2), vec![3]);
    }

    #[test]
    fn test_logic_ops() {
        assert!(LogicOp::And.eval(&[1, 1]));
        assert!(!LogicOp::And.eval(&[1, 0]));
        assert!(LogicOp::Or.eval(&[0, 1]));
        assert!(LogicOp::Xor.eval(&[1, 0, 0]));
        assert!(!LogicOp::Xor.eval(&[1, 1]));
    }

    #[test]
    fn test_noisylogic_rows_are_noisy_gates() {
        let g = hourglass_graph(5).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let out = generate_data(&g, 10, DataMethod::NoisyLogic, &mut rng).unwrap();
        let middle = out.joint.factor(2).unwrap();
        assert_eq!(middle.cpt.n_inputs, 4);
        for row in &middle.cpt.k {
            assert!((row[0] - 0.9).abs() < 1e-12 || (row[0] - 0.1).abs() < 1e-12);
        }
        assert_eq!(out.data.len(), 10);
        assert!(out.data.iter().all(|row| row.len() == 5 && row.iter().all(|&v| v < 2)));
        assert_eq!(out.joint.structure().unwrap(), g);
    }

    #[test]
    fn test_dirichlet_method() {
        let g = hourglass_graph(5).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let out = generate_data(&g, 3, DataMethod::Dirichlet, &mut rng).unwrap();
        let sum: f64 = out.joint.full_joint().probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_template_is_subset_of_ground() {
        let g = hourglass_graph(7).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let t = sample_template(&g, 5, &mut rng);
        let revealed: Vec<(usize, usize)> = (0..7)
            .flat_map(|i| (0..7).map(move |j| (i, j)))
            .filter(|&(i, j)| t[i][j] == 1.0)
            .collect();
        assert_eq!(revealed.len(), 5);
        assert!(revealed.iter().all(|&(i, j)| g.has_edge(i, j)));

        let all = sample_template(&g, 100, &mut rng);
        assert_eq!(all, g.adjacency());
    }

    #[test]
    fn test_random_dag_is_acyclic() {
        let mut rng = StdRng::seed_from_u64(9);
        let g = random_dag(8, 0.5, &mut rng).unwrap();
        assert!(g.is_acyclic());
        assert!(random_dag(3, 1.5, &mut rng).is_err());
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("NoisyLogic".parse::<DataMethod>(), Ok(DataMethod::NoisyLogic));
        assert_eq!("dirichlet".parse::<DataMethod>(), Ok(DataMethod::Dirichlet));
        assert!("gauss".parse::<DataMethod>().is_err());
    }
}
