//! Oblivious transfer used to generate the correlated randomness of the
//! [`TripleProvider`](crate::triple_provider::TripleProvider).

pub mod alsz;
pub mod chou_orlandi;
pub mod utils;
