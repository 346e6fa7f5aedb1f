//! End-to-end scenario runs against configured models.

use satsim_common::{ChannelType, LinkKey, MacAddress, SimTime};
use satsim_fading::FadingError;
use satsim_frame::{BbFrameConf, BbFrameType, ModCod};
use satsim_model::SimConfig;
use satsim_runner::{fill_frames, RunnerError, SampleRecord, Scenario, ScenarioRunner};
use satsim_trace::{TraceError, TraceKind};
use std::fs;
use std::path::Path;

fn write_trace(root: &Path, kind: TraceKind, key: &LinkKey, body: &str) {
    let path = kind.file_path(root, key);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn fading_values(records: &[SampleRecord]) -> Vec<f64> {
    records
        .iter()
        .filter_map(|r| match r {
            SampleRecord::Fading { fading_db, .. } => Some(*fading_db),
            SampleRecord::Interference { .. } => None,
        })
        .collect()
}

#[test]
fn test_markov_logic_is_reproducible_per_seed() {
    let model = SimConfig::default().build().unwrap();

    let mut first = ScenarioRunner::new(&model, &Scenario::markov_logic()).unwrap();
    first.run().unwrap();
    let mut second = ScenarioRunner::new(&model, &Scenario::markov_logic()).unwrap();
    second.run().unwrap();

    assert_eq!(first.records().len(), 8);
    assert_eq!(first.records(), second.records());
    for value in fading_values(first.records()) {
        assert!(value.is_finite());
    }

    let key = Scenario::markov_logic().links[0];
    let state = first.fading().state(&key).unwrap();
    assert_eq!(state.last_update, SimTime::from_millis(200));
}

#[test]
fn test_scenario_file_with_traces() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("traces");
    let ut = LinkKey::new(MacAddress::from_index(1), ChannelType::ForwardUser);
    let gw = LinkKey::new(MacAddress::from_index(2), ChannelType::ReturnFeeder);

    write_trace(&root, TraceKind::Fading, &ut, "0.0 -1.0\n0.1 -2.0\n");
    write_trace(&root, TraceKind::Fading, &gw, "0.0 -5.0\n0.1 -6.0\n");
    write_trace(&root, TraceKind::Interference, &ut, "0.0 1e-20 2e-18\n");
    write_trace(&root, TraceKind::Interference, &gw, "0.0 3e-20 4e-18\n");

    let config_path = dir.path().join("sim.yaml");
    fs::write(
        &config_path,
        format!(
            "seed: 3\nfading:\n  mode: trace\ntrace:\n  root: {}\n",
            root.display()
        ),
    )
    .unwrap();

    let scenario_path = dir.path().join("scenario.yaml");
    fs::write(
        &scenario_path,
        r#"
links:
  - { address: "00:00:00:00:00:01", channel: FORWARD_USER_CH }
  - { address: "00:00:00:00:00:02", channel: RETURN_FEEDER_CH }
events:
  - { event: get_fading, at_ms: 10 }
  - { event: get_interference, at_ms: 10 }
  - { event: get_fading, at_ms: 20 }
"#,
    )
    .unwrap();

    let model = SimConfig::from_file(&config_path).unwrap().build().unwrap();
    let scenario = Scenario::from_file(&scenario_path).unwrap();
    let mut runner = ScenarioRunner::new(&model, &scenario).unwrap();
    assert_eq!(runner.run().unwrap(), 3);

    // Rows are consumed per link in file order.
    assert_eq!(fading_values(runner.records()), vec![-1.0, -5.0, -2.0, -6.0]);
    let densities: Vec<f64> = runner
        .records()
        .iter()
        .filter_map(|r| match r {
            SampleRecord::Interference { density, .. } => Some(*density),
            SampleRecord::Fading { .. } => None,
        })
        .collect();
    assert_eq!(densities, vec![1e-20, 3e-20]);

    // Trace-driven samples carry no Markov state.
    assert!(runner.records().iter().all(|r| match r {
        SampleRecord::Fading { state, .. } => state.is_none(),
        SampleRecord::Interference { .. } => true,
    }));
}

#[test]
fn test_exhausted_trace_stops_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let key = LinkKey::new(MacAddress::default(), ChannelType::ForwardUser);
    write_trace(dir.path(), TraceKind::Fading, &key, "0.0 -1.0\n");

    let yaml = format!("fading:\n  mode: trace\ntrace:\n  root: {}\n", dir.path().display());
    let model = SimConfig::from_yaml_str(&yaml).unwrap().build().unwrap();
    let scenario = Scenario::from_yaml_str(
        "events:\n  - { event: get_fading, at_ms: 1 }\n  - { event: get_fading, at_ms: 2 }\n",
    )
    .unwrap();

    let mut runner = ScenarioRunner::new(&model, &scenario).unwrap();
    let err = runner.run().unwrap_err();
    assert!(matches!(
        err,
        RunnerError::Fading(FadingError::Trace(TraceError::SourceExhausted { rows: 1, .. }))
    ));
    assert_eq!(runner.records().len(), 1);
}

#[test]
fn test_missing_scenario_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Scenario::from_file(dir.path().join("absent.yaml")),
        Err(RunnerError::Io { .. })
    ));
}

#[test]
fn test_dvb_s2_frame_fill() {
    let conf = BbFrameConf::dvb_s2(25e6, true).unwrap();
    let fills = fill_frames(&conf, 188, &[BbFrameType::Short, BbFrameType::Normal]).unwrap();

    // 9/10 has no short frame.
    assert_eq!(fills.len(), 52);
    assert!(!fills
        .iter()
        .any(|f| f.modcod == ModCod::Qpsk9_10 && f.frame_type == BbFrameType::Short));

    for fill in &fills {
        assert!(fill.space_left_bytes < 188);
        assert_eq!(fill.used_bytes, fill.packets as u32 * 188);
        assert_eq!(fill.used_bytes + fill.space_left_bytes, fill.capacity_bytes);
    }

    // QPSK 1/4 short: (3072 - 80) / 8 = 374 bytes, one 188-byte packet.
    let qpsk_quarter = fills
        .iter()
        .find(|f| f.modcod == ModCod::Qpsk1_4 && f.frame_type == BbFrameType::Short)
        .unwrap();
    assert_eq!(qpsk_quarter.capacity_bytes, 374);
    assert_eq!(qpsk_quarter.packets, 1);
}
