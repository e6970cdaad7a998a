//! Naming and labelling of run requests.

use hookline_core::id::truncate;
use hookline_core::integration::IntegrationConfig;
use hookline_core::run::{LABEL_CONFIG, LABEL_RUN_ID, RunMeta};
use hookline_core::RunId;
use std::collections::BTreeMap;

/// Characters of the commit SHA and run ID kept in a run name.
const NAME_PART_LEN: usize = 5;

/// `<config>-<sha prefix>-<id prefix>`.
///
/// Names are not guaranteed unique; the sink rejects collisions.
pub fn run_name(config: &str, sha: &str, id: &RunId) -> String {
    format!(
        "{}-{}-{}",
        config,
        truncate(sha, NAME_PART_LEN),
        id.prefix(NAME_PART_LEN)
    )
}

/// Object metadata for a run of `config` built from commit `sha`.
pub fn generate_meta(config: &IntegrationConfig, sha: &str, id: &RunId) -> RunMeta {
    let labels = BTreeMap::from([
        (LABEL_CONFIG.to_string(), config.name.clone()),
        (LABEL_RUN_ID.to_string(), id.to_string()),
    ]);

    RunMeta {
        name: run_name(&config.name, sha, id),
        namespace: config.namespace.clone(),
        labels,
    }
}
