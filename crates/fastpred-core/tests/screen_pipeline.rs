// crates/fastpred-core/tests/screen_pipeline.rs

use std::io::Write;

use fastpred_core::reader::FingerprintReader;
use fastpred_core::record::{write_query_record, write_reference_record};
use fastpred_core::screen::screen_parallel_lists;
use fastpred_core::{
    screen_path, screen_reader, Fingerprint, QueryTask, ScreenConfig, ScreenError, ThresholdPolicy,
};

fn fp(bytes: &[u8]) -> Fingerprint {
    Fingerprint::from_bytes(bytes.to_vec()).unwrap()
}

fn query_stream(records: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    for (id, bytes) in records {
        write_query_record(&mut out, id, &fp(bytes)).unwrap();
    }
    out
}

fn collection(records: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    for (id, bytes) in records {
        write_reference_record(&mut out, id, &fp(bytes)).unwrap();
    }
    out
}

fn tasks(collections: Vec<Vec<u8>>, thresholds: &[f64]) -> Vec<QueryTask> {
    QueryTask::pair(collections, thresholds).unwrap()
}

#[test]
fn half_overlap_scenario_scores_one_half() {
    let q = query_stream(&[("Q", &[0b1111_0000])]);
    let t = tasks(vec![collection(&[("M1", &[0b1100_0000])])], &[]);
    let out = screen_reader(FingerprintReader::new(q.as_slice()), &t, &ScreenConfig::default()).unwrap();
    assert_eq!(out.iterations, 1);
    assert_eq!(out.result.get("M1"), Some(&[0.5][..]));
}

#[test]
fn raw_mode_tracks_only_ids_hit_in_first_iteration() {
    let q = query_stream(&[("Q", &[0xF0]), ("Q", &[0xF0])]);
    let t = tasks(
        vec![
            collection(&[("M1", &[0xC0])]),
            collection(&[("M1", &[0xF0]), ("M2", &[0xF0])]),
        ],
        &[],
    );
    let out = screen_reader(FingerprintReader::new(q.as_slice()), &t, &ScreenConfig::default()).unwrap();
    assert_eq!(out.result.get("M1"), Some(&[0.5, 1.0][..]));
    assert!(!out.result.contains("M2"));
}

#[test]
fn normalized_mode_keeps_ids_hit_in_every_iteration() {
    let q = query_stream(&[("Q", &[0xFF]), ("Q", &[0xFF])]);
    let t = tasks(
        vec![
            collection(&[("A", &[0xFF]), ("B", &[0x0F]), ("C", &[0x03])]),
            collection(&[("A", &[0xFE]), ("C", &[0x01]), ("D", &[0xF0])]),
        ],
        &[],
    );
    let out = screen_reader(FingerprintReader::new(q.as_slice()), &t, &ScreenConfig::normalized(0.0)).unwrap();
    assert_eq!(out.result.len(), 2);
    for id in ["A", "C"] {
        let series = out.result.get(id).unwrap();
        assert_eq!(series.len(), out.iterations + 1, "{id}");
        let mean = (series[0] + series[1]) / 2.0;
        assert!((series[2] - mean).abs() < 1e-12);
    }
    assert!(out.result.get("A").unwrap()[2] > 0.0);
    assert_eq!(out.discarded, 2);
}

#[test]
fn single_hit_normalization_yields_nan_not_error() {
    let q = query_stream(&[("Q", &[0xF0])]);
    let t = tasks(vec![collection(&[("M1", &[0xC0])])], &[]);
    let out = screen_reader(FingerprintReader::new(q.as_slice()), &t, &ScreenConfig::normalized(0.8)).unwrap();
    let series = out.result.get("M1").unwrap();
    assert_eq!(series.len(), 2);
    assert!(series[0].is_nan());
    assert!(series[1].is_nan());
}

#[test]
fn all_zero_fingerprints_score_nan_and_survive_thresholds() {
    let q = query_stream(&[("Q", &[0x00])]);
    let t = tasks(vec![collection(&[("Z", &[0x00]), ("M", &[0xFF])])], &[0.5]);
    let out = screen_reader(FingerprintReader::new(q.as_slice()), &t, &ScreenConfig::default()).unwrap();
    assert!(out.result.get("Z").unwrap()[0].is_nan());
    assert!(!out.result.contains("M"));
}

#[test]
fn threshold_policy_decides_which_cutoff_applies() {
    let q = query_stream(&[("Q", &[0xFF]), ("Q", &[0xFF])]);
    let collections = vec![
        collection(&[("A", &[0xFF])]),
        collection(&[("A", &[0xFC])]), // 6/8 = 0.75
    ];
    let t = tasks(collections, &[0.5, 0.8]);

    let per = ScreenConfig::default();
    let out = screen_reader(FingerprintReader::new(q.as_slice()), &t, &per).unwrap();
    assert!(!out.result.contains("A"), "0.75 < 0.8 in iteration 1");
    assert_eq!(out.removed, 1);

    let first = ScreenConfig { threshold_policy: ThresholdPolicy::FirstOnly, ..ScreenConfig::default() };
    let out = screen_reader(FingerprintReader::new(q.as_slice()), &t, &first).unwrap();
    assert_eq!(out.result.get("A"), Some(&[1.0, 0.75][..]));
}

#[test]
fn mismatched_collection_fails_fast() {
    let q = query_stream(&[("Q", &[0xFF, 0x00])]);
    let t = tasks(vec![collection(&[("A", &[0xFF]), ("B", &[0x01])])], &[]);
    let err = screen_reader(FingerprintReader::new(q.as_slice()), &t, &ScreenConfig::default()).unwrap_err();
    assert!(matches!(err, ScreenError::LayoutMismatch(_)), "{err:?}");
}

#[test]
fn more_queries_than_collections_is_an_argument_error() {
    let q = query_stream(&[("Q", &[0xFF]), ("Q", &[0xFF])]);
    let t = tasks(vec![collection(&[("A", &[0xFF])])], &[]);
    let err = screen_reader(FingerprintReader::new(q.as_slice()), &t, &ScreenConfig::default()).unwrap_err();
    assert!(matches!(err, ScreenError::Argument(_)), "{err:?}");
}

#[test]
fn surplus_collections_are_ignored() {
    let q = query_stream(&[("Q", &[0xFF])]);
    let t = tasks(
        vec![collection(&[("A", &[0xFF])]), collection(&[("A", &[0x00])])],
        &[0.5, 0.5],
    );
    let out = screen_reader(FingerprintReader::new(q.as_slice()), &t, &ScreenConfig::default()).unwrap();
    assert_eq!(out.iterations, 1);
    assert_eq!(out.result.get("A"), Some(&[1.0][..]));
}

#[test]
fn truncated_query_stream_is_reported() {
    let mut q = query_stream(&[("Q", &[0xFF, 0x0F])]);
    q.truncate(q.len() - 1);
    let t = tasks(vec![collection(&[("A", &[0xFF, 0x00])])], &[]);
    let err = screen_reader(FingerprintReader::new(q.as_slice()), &t, &ScreenConfig::default()).unwrap_err();
    assert!(matches!(err, ScreenError::TruncatedRecord(_)), "{err:?}");
}

#[test]
fn missing_query_file_is_a_file_open_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.qbfp");
    let err = screen_path(&path, &[], &ScreenConfig::default()).unwrap_err();
    assert!(matches!(err, ScreenError::FileOpen { .. }), "{err:?}");
}

#[test]
fn parallel_list_call_shape_matches_task_api() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(&query_stream(&[("Q", &[0xF0]), ("Q", &[0xF0])])).unwrap();
    f.flush().unwrap();

    let refs = vec![
        collection(&[("M1", &[0xC0]), ("M2", &[0xF0])]),
        collection(&[("M1", &[0xF0]), ("M2", &[0x80])]),
    ];
    let result = screen_parallel_lists(f.path(), refs.clone(), &[0.4, 0.4], 0.0, false).unwrap();
    assert_eq!(result.get("M1"), Some(&[0.5, 1.0][..]));
    assert!(!result.contains("M2"), "0.25 < 0.4 in iteration 1");

    let err = screen_parallel_lists(f.path(), refs, &[0.4], 0.0, false).unwrap_err();
    assert!(matches!(err, ScreenError::Argument(_)));
}
