use std::fs;
use std::path::{Path, PathBuf};
use jtlstats_cli::{run, summarize, Args, CliError, OutputFormat};
use jtlstats_common::{Dimension, JtlStatsError, KeyValue};
use tempfile::TempDir;

const HEADER: &str = "timeStamp,elapsed,label,responseCode,responseMessage,threadName,dataType,success,failureMessage,bytes,sentBytes,grpThreads,allThreads,URL,Latency,IdleTime,Connect";

fn sample_line(ts: u64, elapsed: u32, label: &str, code: &str, ok: bool, bytes: u64, sent: u64, latency: u32) -> String {
    format!("{ts},{elapsed},{label},{code},OK,Thread Group 1-1,text,{ok},,{bytes},{sent},1,1,http://localhost/x,{latency},0,1")
}

fn write_jtl(dir: &TempDir, lines: &[String]) -> PathBuf {
    let path = dir.path().join("run.jtl");
    let mut text = String::from(HEADER);
    text.push('\n');
    for l in lines {
        text.push_str(l);
        text.push('\n');
    }
    fs::write(&path, text).unwrap();
    path
}

fn args(jtl: &Path) -> Args {
    Args {
        jtl_file: jtl.to_path_buf(),
        output: None,
        timestamp_dir: None,
        moving_tps: false,
        format: OutputFormat::Csv,
    }
}

fn realistic_run() -> Vec<String> {
    vec![
        sample_line(1665666163199, 120, "GET /login", "200", true, 2048, 0, 40),
        sample_line(1665666163450, 95, "POST /cart", "201", true, 512, 256, 30),
        "garbage,row".to_string(),
        sample_line(1665666164010, 300, "GET /login", "503", false, 128, 0, 290),
        sample_line(1665666166900, 80, "POST /cart", "201", true, 512, 256, 25),
        sample_line(1665666167001, 110, "GET /login", "200", true, 2048, 0, 35),
    ]
}

#[test]
fn test_full_run_writes_report_and_timestamps() {
    let dir = tempfile::tempdir().unwrap();
    let jtl = write_jtl(&dir, &realistic_run());
    let out = dir.path().join("summary.csv");

    let mut a = args(&jtl);
    a.output = Some(out.clone());
    a.timestamp_dir = Some(dir.path().to_path_buf());
    a.moving_tps = true;
    run(&a).expect("run failed");

    let report = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    // header, aggregate, 2 labels, 3 codes, 3 response sizes, 2 request sizes
    assert_eq!(lines.len(), 12);
    assert!(lines[0].ends_with("Moving TPS 95th Percentile"));
    assert!(lines[1].starts_with("Aggregate,,5,1,"));
    assert!(lines[2].starts_with("method+uripath,GET /login,3,1,"));
    assert!(lines[3].starts_with("method+uripath,POST /cart,2,0,"));
    assert!(lines[4].starts_with("responseCode,200,2,0,"));
    assert!(lines[6].starts_with("responseCode,503,1,1,"));
    assert!(lines[7].starts_with("responseSizeInBytes,2048,2,0,"));
    assert!(lines[11].starts_with("requestBodyInBytes,256,2,0,"));
    assert!(lines[2..].iter().all(|l| l.ends_with(",-,-,-,-,-,-,-,-")));

    assert_eq!(fs::read_to_string(dir.path().join("start.ts")).unwrap(), "1665666163");
    assert_eq!(fs::read_to_string(dir.path().join("end.ts")).unwrap(), "1665666167");
}

#[test]
fn test_summary_counts_and_moving_rate() {
    let dir = tempfile::tempdir().unwrap();
    let jtl = write_jtl(&dir, &realistic_run());
    let mut a = args(&jtl);
    a.moving_tps = true;
    let s = summarize(&a).unwrap();

    assert_eq!(s.rejected_rows().len(), 1);
    assert_eq!(s.rejected_rows()[0].line_number, 4);

    let agg = s.aggregate_summary().unwrap();
    assert_eq!(agg.total_count, 5);
    assert_eq!(agg.failed_count, 1);
    assert_eq!(agg.ttlb.unwrap().max, 300.0);
    assert_eq!(agg.ttfb.unwrap().min, 25.0);

    // seconds 163..=167 → [2, 1, 0, 1, 1]
    let moving = s.moving_rate_stats().unwrap();
    assert_eq!(moving.mean, 1.0);
    assert_eq!(moving.min, 0.0);
    assert_eq!(moving.max, 2.0);
    assert_eq!(moving.median, 1.0);

    for d in Dimension::ALL {
        let sum: u64 = s.summaries_for_dimension(d).unwrap().iter().map(|r| r.total_count).sum();
        assert_eq!(sum, agg.total_count);
    }
    let sizes: Vec<&KeyValue> = s
        .summaries_for_dimension(Dimension::ResponseBytes)
        .unwrap()
        .iter()
        .filter_map(|r| r.key.as_ref())
        .collect();
    assert_eq!(sizes, vec![&KeyValue::Bytes(2048), &KeyValue::Bytes(512), &KeyValue::Bytes(128)]);
}

#[test]
fn test_repeated_runs_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let jtl = write_jtl(&dir, &realistic_run());
    let first = dir.path().join("a.csv");
    let second = dir.path().join("b.csv");

    let mut a = args(&jtl);
    a.moving_tps = true;
    a.output = Some(first.clone());
    run(&a).unwrap();
    a.output = Some(second.clone());
    run(&a).unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn test_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let jtl = write_jtl(&dir, &realistic_run());
    let out = dir.path().join("summary.json");
    let mut a = args(&jtl);
    a.output = Some(out.clone());
    a.format = OutputFormat::Json;
    run(&a).unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(value["aggregate"]["total_count"], 5);
    assert_eq!(value["rejected_rows"], 1);
    assert_eq!(value["dimensions"]["responseCode"].as_array().unwrap().len(), 3);
    assert!(value["aggregate"]["moving_rate"].is_null());
}

#[test]
fn test_all_rows_rejected_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let jtl = write_jtl(&dir, &["bad".to_string(), "also,bad".to_string()]);
    let err = run(&args(&jtl)).unwrap_err();
    assert!(matches!(err, CliError::Summary(JtlStatsError::NoRecords)));
}

#[test]
fn test_missing_required_column_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.jtl");
    fs::write(&path, "timeStamp,elapsed,label,success\n1000,1,GET /a,true\n").unwrap();
    let err = run(&args(&path)).unwrap_err();
    assert!(matches!(err, CliError::Summary(JtlStatsError::MissingColumn(ref c)) if c == "responseCode"));
}

#[test]
fn test_missing_source_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = run(&args(&dir.path().join("absent.jtl"))).unwrap_err();
    assert!(matches!(err, CliError::Open { .. }));
    assert!(err.to_string().starts_with("on attempt to read ("));
}

#[test]
fn test_single_timestamp_prints_dash_for_overall_rate() {
    let dir = tempfile::tempdir().unwrap();
    let jtl = write_jtl(&dir, &[
        sample_line(5000, 10, "GET /a", "200", true, 1, 0, 5),
        sample_line(5000, 20, "GET /a", "200", true, 1, 0, 5),
    ]);
    let out = dir.path().join("summary.csv");
    let mut a = args(&jtl);
    a.output = Some(out.clone());
    run(&a).unwrap();

    let report = fs::read_to_string(&out).unwrap();
    let aggregate = report.lines().nth(1).unwrap();
    assert!(aggregate.starts_with("Aggregate,,2,0,"));
    assert!(aggregate.ends_with(",-"));
}
