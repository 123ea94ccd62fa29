#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;

use spanstats_agent::config::{self, SamplerConfig, Settings, SinkConfig};
use spanstats_core::error::ErrorCode;
use spanstats_core::trace::Sampler;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |k: &str| map.get(k).cloned()
}

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
exporter:
  interval_secz: 10 # typo should fail
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.exporter.interval_secs, 60);
    assert_eq!(cfg.exporter.linger_secs, 70);
    assert_eq!(cfg.exporter.sink, SinkConfig::Log);
    assert!(cfg.exporter.client_views);
    assert_eq!(cfg.driver.iterations, 3);
    assert_eq!(cfg.trace.sampler, SamplerConfig::Probability { ratio: 1e-4 });
    assert!(cfg.ops.listen.is_none());
}

#[test]
fn full_config_parses() {
    let ok = r#"
version: 1
project_id: demo-project
exporter:
  interval_secs: 5
  linger_secs: 6
  sink: { kind: file, path: "/tmp/telemetry.jsonl" }
  client_views: false
trace:
  sampler: { kind: always }
driver:
  iterations: 5
  simulated_latency_ms: 3
ops:
  listen: "127.0.0.1:9464"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.project_id.as_deref(), Some("demo-project"));
    assert!(matches!(cfg.exporter.sink, SinkConfig::File { .. }));
    assert_eq!(cfg.trace.sampler.to_sampler().unwrap(), Sampler::AlwaysSample);
    assert_eq!(cfg.driver.iterations, 5);
}

#[test]
fn range_checks_fail() {
    let cases = [
        "version: 2\n",
        "version: 1\nexporter: { interval_secs: 0 }\n",
        "version: 1\nexporter: { interval_secs: 60, linger_secs: 30 }\n",
        "version: 1\ntrace: { sampler: { kind: probability, ratio: 1.5 } }\n",
        "version: 1\ndriver: { iterations: 0 }\n",
        "version: 1\nops: { listen: \"not-an-addr\" }\n",
    ];
    for c in cases {
        let err = config::load_from_str(c).expect_err(c);
        assert_eq!(err.code(), ErrorCode::BadConfig, "case: {c}");
    }
}

#[test]
fn missing_instance_or_database_fails_fast() {
    let cfg = || config::load_from_str("version: 1\nproject_id: p\n").unwrap();

    let err = Settings::resolve(cfg(), env(&[("DATABASE_ID", "db")])).unwrap_err();
    assert_eq!(err.code(), ErrorCode::MissingConfig);
    assert!(err.to_string().contains("INSTANCE_ID"));
    assert!(err.is_startup_fatal());

    let err = Settings::resolve(cfg(), env(&[("INSTANCE_ID", "inst"), ("DATABASE_ID", "  ")])).unwrap_err();
    assert!(err.to_string().contains("DATABASE_ID"));
}

#[test]
fn project_id_prefers_environment() {
    let cfg = || config::load_from_str("version: 1\nproject_id: from-file\n").unwrap();
    let base = [("INSTANCE_ID", "inst"), ("DATABASE_ID", "db")];

    let s = Settings::resolve(cfg(), env(&base)).unwrap();
    assert_eq!(s.project_id(), "from-file");

    let mut with_env = base.to_vec();
    with_env.push(("GCLOUD_PROJECT", "from-env"));
    let s = Settings::resolve(cfg(), env(&with_env)).unwrap();
    assert_eq!(s.project_id(), "from-env");
    assert_eq!(
        s.database.to_string(),
        "projects/from-env/instances/inst/databases/db"
    );
}

#[test]
fn missing_project_is_reported() {
    let cfg = config::load_from_str("version: 1\n").unwrap();
    let err = Settings::resolve(cfg, env(&[("INSTANCE_ID", "i"), ("DATABASE_ID", "d")])).unwrap_err();
    assert_eq!(err.code(), ErrorCode::MissingConfig);
}
