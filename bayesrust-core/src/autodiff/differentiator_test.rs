use super::*;
use crate::graph::Graph;
use crate::tensor::{ones, Tensor};
use crate::types::DType;
use approx::assert_relative_eq;

/// A latent standard-normal vertex holding `value`.
fn latent(graph: &mut Graph, value: Tensor) -> VertexId {
    let id = graph.gaussian(Tensor::zeros(value.shape()), 1.0).unwrap();
    graph.set_value(id, value).unwrap();
    id
}

#[test]
fn test_product_plus_sum() {
    let mut graph = Graph::new();
    let a = latent(&mut graph, Tensor::scalar(2.0));
    let b = latent(&mut graph, Tensor::scalar(-3.0));
    let c = latent(&mut graph, Tensor::new(vec![1.0, 2.0, 3.0], vec![3]).unwrap());
    let ab = graph.mul(a, b).unwrap();
    let sc = graph.sum(c).unwrap();
    let f = graph.add(ab, sc).unwrap();

    let dual = Differentiator::calculate_dual(&graph, f).unwrap();
    assert_relative_eq!(dual.value().scalar_value().unwrap(), 0.0);
    assert_eq!(dual.partial(a).unwrap().scalar_value().unwrap(), -3.0);
    assert_eq!(dual.partial(b).unwrap().scalar_value().unwrap(), 2.0);
    assert!(dual.partial(c).unwrap().all_close(&ones(&[3]), 1e-12));
}

#[test]
fn test_vector_product_partial_is_diagonal() {
    let mut graph = Graph::new();
    let a = latent(&mut graph, Tensor::new(vec![1.0, 2.0], vec![2]).unwrap());
    let b = latent(&mut graph, Tensor::new(vec![5.0, 7.0], vec![2]).unwrap());
    let f = graph.mul(a, b).unwrap();

    let dual = Differentiator::calculate_dual(&graph, f).unwrap();
    let df_da = dual.partial(a).unwrap();
    assert_eq!(df_da.shape(), &[2, 2]);
    assert_eq!(df_da.data(), &[5.0, 0.0, 0.0, 7.0]);
}

#[test]
fn test_observed_and_constant_leaves_have_no_partials() {
    let mut graph = Graph::new();
    let a = latent(&mut graph, Tensor::scalar(1.5));
    let o = graph.gaussian(0.0, 1.0).unwrap();
    graph.observe(o, Tensor::scalar(4.0)).unwrap();
    let k = graph.constant(Tensor::scalar(10.0));
    let ao = graph.mul(a, o).unwrap();
    let f = graph.add(ao, k).unwrap();

    let dual = Differentiator::calculate_dual(&graph, f).unwrap();
    assert_eq!(dual.partials().len(), 1);
    assert_eq!(dual.partial(a).unwrap().scalar_value().unwrap(), 4.0);
}

#[test]
fn test_probabilistic_vertex_stops_traversal() {
    let mut graph = Graph::new();
    let mu = latent(&mut graph, Tensor::scalar(0.5));
    let x = graph.gaussian(mu, 1.0).unwrap();
    graph.set_value(x, Tensor::scalar(1.0)).unwrap();

    let dual = Differentiator::calculate_dual(&graph, x).unwrap();
    assert_eq!(dual.partials().keys().copied().collect::<Vec<_>>(), vec![x]);
}

#[test]
fn test_cast_is_not_differentiable() {
    let mut graph = Graph::new();
    let a = latent(&mut graph, Tensor::scalar(1.0));
    let cast = graph.cast(a, DType::F64).unwrap();
    let f = graph.exp(cast).unwrap();

    let err = Differentiator::calculate_dual(&graph, f).unwrap_err();
    assert!(matches!(
        err,
        BayesRustError::UnsupportedDifferentiation { vertex, .. } if vertex == cast
    ));
}

#[test]
fn test_boolean_predicate_is_skipped() {
    let mut graph = Graph::new();
    let a = latent(&mut graph, Tensor::scalar(3.0));
    let zero = graph.constant(Tensor::scalar(0.0));
    let positive = graph.greater_than(a, zero).unwrap();
    let neg_a = graph.neg(a).unwrap();
    let abs = graph.if_then_else(positive, a, neg_a).unwrap();

    let dual = Differentiator::calculate_dual(&graph, abs).unwrap();
    assert_eq!(dual.partial(a).unwrap().scalar_value().unwrap(), 1.0);
}

#[test]
fn test_partials_of_fills_zeros() {
    let mut graph = Graph::new();
    let a = latent(&mut graph, Tensor::scalar(2.0));
    let b = latent(&mut graph, Tensor::new(vec![1.0, 1.0], vec![2]).unwrap());
    let f = graph.exp(a).unwrap();

    let partials = Differentiator::partials_of(&graph, f, &[a, b]).unwrap();
    assert_relative_eq!(partials[&a].scalar_value().unwrap(), 2.0f64.exp());
    assert_eq!(partials[&b].shape(), &[2]);
    assert_eq!(partials[&b].data(), &[0.0, 0.0]);
}

#[test]
fn test_long_chain_does_not_recurse() {
    let mut graph = Graph::new();
    let a = latent(&mut graph, Tensor::scalar(1.0));
    let one = graph.constant(Tensor::scalar(1.0));
    let mut head = a;
    for _ in 0..20_000 {
        head = graph.add(head, one).unwrap();
    }
    let dual = Differentiator::calculate_dual(&graph, head).unwrap();
    assert_eq!(dual.value().scalar_value().unwrap(), 20_001.0);
    assert_eq!(dual.partial(a).unwrap().scalar_value().unwrap(), 1.0);
}

#[test]
fn test_cached_dual_is_invalidated_by_new_value() {
    let mut graph = Graph::new();
    let a = latent(&mut graph, Tensor::scalar(2.0));
    let f = graph.mul(a, a).unwrap();
    assert_eq!(graph.dual_number(f).unwrap().partial(a).unwrap().scalar_value().unwrap(), 4.0);

    graph.set_and_cascade(a, Tensor::scalar(5.0)).unwrap();
    let dual = graph.dual_number(f).unwrap();
    assert_eq!(dual.value().scalar_value().unwrap(), 25.0);
    assert_eq!(dual.partial(a).unwrap().scalar_value().unwrap(), 10.0);
}

#[test]
fn test_d_log_prob_through_deterministic_parent() {
    // x ~ N(2m, 1): dlogp/dx = -(x - 2m), dlogp/dm = 2 (x - 2m)
    let mut graph = Graph::new();
    let m = latent(&mut graph, Tensor::scalar(0.25));
    let two = graph.constant(Tensor::scalar(2.0));
    let mu = graph.mul(two, m).unwrap();
    let x = graph.gaussian(mu, 1.0).unwrap();
    graph.set_value(x, Tensor::scalar(1.5)).unwrap();

    let gradient = graph.d_log_prob(x).unwrap();
    assert_eq!(gradient.len(), 2);
    assert_relative_eq!(gradient[&x].scalar_value().unwrap(), -1.0, max_relative = 1e-12);
    assert_relative_eq!(gradient[&m].scalar_value().unwrap(), 2.0, max_relative = 1e-12);
}

#[test]
fn test_d_log_prob_sums_broadcast_parameter() {
    // Three draws sharing one scalar mean.
    let mut graph = Graph::new();
    let mu = latent(&mut graph, Tensor::scalar(0.0));
    let mu_v = graph.reshape(mu, vec![1]).unwrap();
    let sigma = graph.constant(Tensor::ones(&[3]));
    let x = graph
        .add_probabilistic(crate::graph::DistributionKind::Gaussian { mu: mu_v, sigma }, None)
        .unwrap();
    graph.observe(x, Tensor::new(vec![1.0, 2.0, 3.0], vec![3]).unwrap()).unwrap();

    let gradient = graph.d_log_prob(x).unwrap();
    assert_eq!(gradient.len(), 1);
    assert_relative_eq!(gradient[&mu].scalar_value().unwrap(), 6.0, max_relative = 1e-12);
}
