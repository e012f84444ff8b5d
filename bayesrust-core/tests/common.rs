use bayesrust_core::{Graph, Tensor, VertexId};

#[allow(dead_code)]
pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A standard-normal vertex set to `value`.
#[allow(dead_code)]
pub(crate) fn latent_gaussian(graph: &mut Graph, value: Tensor) -> VertexId {
    let id = graph
        .gaussian(Tensor::zeros(value.shape()), 1.0)
        .expect("standard normal vertex");
    graph.set_value(id, value).expect("value of matching shape");
    id
}
