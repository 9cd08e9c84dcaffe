use std::fs;
use std::process::Command;

#[test]
fn generates_chart_from_flights_csv() {
    let output_dir = tempfile::tempdir().unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_bubblechart"))
        .args([
            "--input",
            "tests/fixtures/flights.csv",
            "--output",
            output_dir.path().to_str().unwrap(),
        ])
        .status()
        .expect("Failed to execute bubblechart");

    assert!(status.success(), "bubblechart exited with error");

    let index_path = output_dir.path().join("index.html");
    assert!(index_path.exists(), "index.html was not generated");

    let html = fs::read_to_string(&index_path).expect("Failed to read index.html");

    assert!(html.contains("<title>Bubble Chart</title>"), "Missing default title");
    assert_eq!(html.matches("<circle").count(), 20, "One circle per usable row");
    assert!(html.contains("1 rows skipped"), "Missing skipped row count");
    assert!(html.contains("id=\"frames\""), "Missing animation frames");
    assert!(html.contains("\"city\":\"Atlanta\""), "Missing tooltip data");
}

#[test]
fn generate_subcommand_writes_every_format_with_config() {
    let output_dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_bubblechart"))
        .args([
            "generate",
            "-i",
            "tests/fixtures/flights.csv",
            "-o",
            output_dir.path().to_str().unwrap(),
            "-c",
            "tests/fixtures/chart.yaml",
            "-f",
            "html,svg,json",
        ])
        .output()
        .expect("Failed to execute bubblechart");

    assert!(output.status.success(), "bubblechart exited with error");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Generated 'Busiest Airports' (20 bubbles"));

    let svg = fs::read_to_string(output_dir.path().join("chart.svg")).unwrap();
    assert!(svg.contains("stroke-width=\"1.5\""));

    let json = fs::read_to_string(output_dir.path().join("chart.json")).unwrap();
    let chart: serde_json::Value = serde_json::from_str(&json).unwrap();
    let bubbles = chart["bubbles"].as_array().unwrap();
    assert_eq!(bubbles.len(), 20);
    assert_eq!(bubbles[0]["id"], "ATL", "Largest bubble comes first");
    assert_eq!(chart["legend"][0]["category"], "US");
}

#[test]
fn seeded_runs_are_identical() {
    let run = || {
        let dir = tempfile::tempdir().unwrap();
        let status = Command::new(env!("CARGO_BIN_EXE_bubblechart"))
            .args([
                "generate",
                "-i",
                "tests/fixtures/flights.csv",
                "-o",
                dir.path().to_str().unwrap(),
                "-f",
                "json",
                "--seed",
                "3",
            ])
            .status()
            .expect("Failed to execute bubblechart");
        assert!(status.success());
        fs::read_to_string(dir.path().join("chart.json")).unwrap()
    };

    assert_eq!(run(), run());
}

#[test]
fn unknown_format_fails() {
    let output_dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_bubblechart"))
        .args([
            "generate",
            "-i",
            "tests/fixtures/flights.csv",
            "-o",
            output_dir.path().to_str().unwrap(),
            "-f",
            "png",
        ])
        .output()
        .expect("Failed to execute bubblechart");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unsupported format: png"));
}
