//! Reference collaborators for the logbench harness.
//!
//! - [`GithubLogParser`]: reads GitHub Actions job logs
//! - [`LcsDiffer`]: LCS alignment under the equality or similarity metric
//! - [`BagDiffer`]: order-insensitive membership diff
//! - [`DrainLogParser`], [`DrainDiffer`]: Drain template mining

pub mod bag;
pub mod drain;
pub mod github;
pub mod lcs;
pub mod similarity;

use std::sync::Arc;

use logbench_core::{DiffOptions, DifferFactory, LogDiffer, TokenCache, Variant};

pub use bag::BagDiffer;
pub use drain::{
    drain_parser_factory, Drain, DrainConfig, DrainDiffer, DrainLogParser, LogCluster, WILDCARD,
};
pub use github::{clean_line, parse_content, GithubLogParser};
pub use lcs::LcsDiffer;
pub use similarity::{is_rewrite, qgram_similarity, token_similarity};

/// Name of the similarity-metric LCS variant.
pub const SEED_VARIANT: &str = "seed";
/// Name of the equality-metric LCS variant.
pub const LCS_VARIANT: &str = "lcs";
/// Name of the bag-of-lines variant.
pub const BAG_VARIANT: &str = "bag";
/// Name of the Drain-cluster LCS variant.
pub const DRAINSIM_VARIANT: &str = "drainsim";

/// The two variants compared by default: `seed` then `lcs`.
///
/// `seed` is rebuilt for every comparison around the shared `cache`; `lcs`
/// only compares values and is shared.
pub fn reference_variants(cache: &Arc<TokenCache>) -> Vec<Variant> {
    let seed_cache = Arc::clone(cache);
    let factory: DifferFactory =
        Arc::new(move || Arc::new(LcsDiffer::new(Arc::clone(&seed_cache))) as Arc<dyn LogDiffer>);
    vec![
        Variant::fresh(SEED_VARIANT, factory, DiffOptions::default()),
        Variant::shared(
            LCS_VARIANT,
            Arc::new(LcsDiffer::new(Arc::clone(cache))),
            DiffOptions::equality(),
        ),
    ]
}

pub fn bag_variant() -> Variant {
    Variant::shared(BAG_VARIANT, Arc::new(BagDiffer), DiffOptions::equality())
}

/// LCS over Drain clusters. The differ trains its own miner per comparison,
/// so one instance is shared.
pub fn drain_variant() -> Variant {
    Variant::shared(
        DRAINSIM_VARIANT,
        Arc::new(DrainDiffer::default()),
        DiffOptions::default(),
    )
}
