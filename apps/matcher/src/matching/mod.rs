// Match report pipeline: registry load, criteria form, bulk analysis,
// correlation, classification and view-model assembly.
// All scoring service traffic goes through scoring_client.

pub mod batch;
pub mod classifier;
pub mod correlator;
pub mod criteria;
pub mod handlers;
pub mod presenter;
pub mod registry;
pub mod session;

#[cfg(test)]
pub mod testing;
