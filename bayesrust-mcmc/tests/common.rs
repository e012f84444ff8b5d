use bayesrust_core::{BayesianNetwork, RandomSource};

#[allow(dead_code)]
pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Draws every latent vertex from its prior, in topological order.
#[allow(dead_code)]
pub(crate) fn forward_sample(network: &mut BayesianNetwork, rng: &mut RandomSource) {
    let latent = network.latent_vertices().to_vec();
    for id in latent {
        let value = network.graph().sample(id, rng).expect("prior draw");
        network.set_and_cascade(id, value).expect("value of matching shape");
    }
}
