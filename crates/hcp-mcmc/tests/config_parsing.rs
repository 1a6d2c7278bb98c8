use std::path::PathBuf;

use hcp_core::HcpError;
use hcp_mcmc::{DeathRule, RunConfig};

#[test]
fn empty_document_uses_defaults() {
    let config = RunConfig::from_yaml_str("{}").unwrap();
    assert_eq!(config, RunConfig::default());
    assert_eq!(config.iterations, 1_000_000_000);
    assert_eq!(config.max_num_groups, 64);
    assert_eq!(config.initial_num_groups, 2);
    assert_eq!(config.saved_data_name, "data");
    assert_eq!(config.snapshots.burn_in, 10_000_000);
    assert_eq!(config.snapshots.thinning, 1500);
    assert_eq!(config.moves.death_rule, DeathRule::RemoveBranch);
}

#[test]
fn legacy_parameter_file_loads() {
    let legacy = "\
max_itr: 5000
max_num_groups: 8
initial_num_groups: 3
gml_path: networks/karate.gml
initial_group_config: 1 3 7 5
saved_data_name: karate
save_directory: out/
";
    let config = RunConfig::from_yaml_str(legacy).unwrap();
    assert_eq!(config.iterations, 5000);
    assert_eq!(config.max_num_groups, 8);
    assert_eq!(config.initial_num_groups, 3);
    assert_eq!(config.gml_path, Some(PathBuf::from("networks/karate.gml")));
    assert_eq!(config.initial_group_config, Some(vec![1, 3, 7, 5]));
    assert_eq!(config.saved_data_name, "karate");
    assert_eq!(config.save_directory, Some(PathBuf::from("out/")));
}

#[test]
fn structured_document_loads() {
    let yaml = "\
iterations: 100
initial_group_config: [1, 3]
snapshots:
  burn_in: 10
  thinning: 5
checkpoint:
  interval: 2
moves:
  death_rule: immediate
seed_policy:
  master_seed: 42
  label: smoke
";
    let config = RunConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.initial_group_config, Some(vec![1, 3]));
    assert_eq!(config.snapshots.thinning, 5);
    assert_eq!(config.checkpoint.interval, 2);
    assert_eq!(config.checkpoint.max_to_keep, 4);
    assert_eq!(config.moves.death_rule, DeathRule::Immediate);
    assert_eq!(config.seed_policy.master_seed, 42);
    assert_eq!(config.seed_policy.label.as_deref(), Some("smoke"));
}

#[test]
fn single_mask_and_bad_tokens() {
    let config = RunConfig::from_yaml_str("initial_group_config: 1").unwrap();
    assert_eq!(config.initial_group_config, Some(vec![1]));
    let err = RunConfig::from_yaml_str("initial_group_config: 1 x 3").unwrap_err();
    assert_eq!(err.info().code, "config-parse");
}

fn code_of(config: RunConfig) -> String {
    match config.validate() {
        Err(HcpError::Config(info)) => info.code,
        other => panic!("expected a config error, got {other:?}"),
    }
}

#[test]
fn validation_rejects_out_of_range_values() {
    let base = RunConfig::default();
    assert_eq!(
        code_of(RunConfig {
            iterations: 0,
            ..base.clone()
        }),
        "invalid-iterations"
    );
    assert_eq!(
        code_of(RunConfig {
            max_num_groups: 65,
            ..base.clone()
        }),
        "invalid-max-groups"
    );
    assert_eq!(
        code_of(RunConfig {
            initial_num_groups: 0,
            ..base.clone()
        }),
        "invalid-initial-groups"
    );
    assert_eq!(
        code_of(RunConfig {
            epoch_length: 0,
            ..base.clone()
        }),
        "invalid-epoch-length"
    );
    let mut thinning = base.clone();
    thinning.snapshots.thinning = 0;
    assert_eq!(code_of(thinning), "invalid-thinning");
}

#[test]
fn initial_groups_above_ceiling_are_clamped() {
    let config = RunConfig {
        max_num_groups: 4,
        initial_num_groups: 9,
        ..RunConfig::default()
    };
    assert_eq!(config.validate().unwrap().initial_num_groups, 2);

    let config = RunConfig {
        max_num_groups: 1,
        initial_num_groups: 3,
        ..RunConfig::default()
    };
    assert_eq!(config.validate().unwrap().initial_num_groups, 1);
}

#[test]
fn missing_graph_is_reported() {
    let err = RunConfig::default().graph_path().unwrap_err();
    assert_eq!(err.info().code, "missing-graph");
}
