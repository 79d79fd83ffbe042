use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const BORNINFO: &str = "\
# epsilon_infinity
2.5 0 0
0 2.5 0
0 0 2.5
# Na
1.1 0 0
0 1.1 0
0 0 1.1
# Cl
-1.1 0 0
0 -1.1 0
0 0 -1.1
";

fn rock_salt_deck(dielec: bool, born_info: Option<&str>) -> Value {
    let k = 0.05;
    let mut force_constants = vec![vec![0.0; 6]; 6];
    for alpha in 0..3 {
        force_constants[alpha][alpha] = k;
        force_constants[3 + alpha][3 + alpha] = k;
        force_constants[alpha][3 + alpha] = -k;
        force_constants[3 + alpha][alpha] = -k;
    }
    let mut deck = json!({
        "prefix": "nacl",
        "dielec": dielec,
        "dos": { "emin": 0.0, "emax": 200.0, "deltaE": 5.0 },
        "lattice": [[0.0, 5.3, 5.3], [5.3, 0.0, 5.3], [5.3, 5.3, 0.0]],
        "atoms": [
            { "element": "Na", "mass": 22.98977 },
            { "element": "Cl", "mass": 35.453 }
        ],
        "forceConstants": force_constants,
    });
    if let Some(born_info) = born_info {
        deck["bornInfo"] = json!(born_info);
    }
    deck
}

fn stage(temp: &TempDir, deck: &Value) -> PathBuf {
    fs::write(temp.path().join("BORNINFO"), BORNINFO).expect("BORNINFO staged");
    let path = temp.path().join("dielec.json");
    fs::write(
        &path,
        serde_json::to_string_pretty(deck).expect("deck serializes"),
    )
    .expect("deck staged");
    path
}

const LAUNCHER_VARIABLES: [&str; 3] = ["OMPI_COMM_WORLD_SIZE", "PMI_SIZE", "MV2_COMM_WORLD_SIZE"];

fn run_cli(args: &[&str], deck: &Path, output_dir: &Path) -> Output {
    run_cli_with_env(args, deck, output_dir, &[])
}

fn run_cli_with_env(
    args: &[&str],
    deck: &Path,
    output_dir: &Path,
    env: &[(&str, &str)],
) -> Output {
    let binary_path = env!("CARGO_BIN_EXE_dielec-rs");
    let mut command = Command::new(binary_path);
    command
        .args(args)
        .arg("--input")
        .arg(deck)
        .arg("--output-dir")
        .arg(output_dir)
        .env_remove("RUST_LOG");
    for name in LAUNCHER_VARIABLES {
        command.env_remove(name);
    }
    command
        .envs(env.iter().copied())
        .output()
        .expect("dielec-rs should launch")
}

fn data_rows(path: &Path) -> Vec<Vec<f64>> {
    fs::read_to_string(path)
        .expect("artifact readable")
        .lines()
        .filter(|line| !line.starts_with('#'))
        .map(|line| {
            line.split_whitespace()
                .map(|token| token.parse::<f64>().expect("numeric column"))
                .collect()
        })
        .collect()
}

#[test]
fn dielec_command_writes_symmetric_tensor_rows() {
    let temp = TempDir::new().expect("tempdir should be created");
    let deck = stage(&temp, &rock_salt_deck(true, Some("BORNINFO")));
    let output_dir = temp.path().join("out");

    let output = run_cli(&["dielec"], &deck, &output_dir);
    assert!(
        output.status.success(),
        "command should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("DIELEC completed (1 artifacts)."));

    let rows = data_rows(&output_dir.join("nacl.dielec"));
    assert_eq!(rows.len(), 40);
    for row in &rows {
        assert_eq!(row.len(), 10);
        let tensor = &row[1..];
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(tensor[3 * i + j], tensor[3 * j + i]);
            }
        }
        assert!(tensor[0] > 0.0, "below the TO resonance the response is positive");
    }
}

#[cfg(not(feature = "mpi-support"))]
#[test]
fn mpi_launch_without_mpi_support_is_a_configuration_error() {
    let temp = TempDir::new().expect("tempdir should be created");
    let deck = stage(&temp, &rock_salt_deck(true, Some("BORNINFO")));
    let output_dir = temp.path().join("out");

    let output = run_cli_with_env(
        &["dielec"],
        &deck,
        &output_dir,
        &[("OMPI_COMM_WORLD_SIZE", "2")],
    );
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: [INPUT.MPI_SUPPORT]"), "stderr: {stderr}");
    assert!(!output_dir.join("nacl.dielec").exists());
}

#[test]
fn single_rank_launch_runs_serially() {
    let temp = TempDir::new().expect("tempdir should be created");
    let deck = stage(&temp, &rock_salt_deck(true, Some("BORNINFO")));
    let output_dir = temp.path().join("out");

    let output = run_cli_with_env(&["dielec"], &deck, &output_dir, &[("PMI_SIZE", "1")]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(data_rows(&output_dir.join("nacl.dielec")).len(), 40);
}

#[test]
fn zmode_refuses_an_mpi_launch() {
    let temp = TempDir::new().expect("tempdir should be created");
    let deck = stage(&temp, &rock_salt_deck(false, Some("BORNINFO")));

    let output = run_cli_with_env(
        &["zmode"],
        &deck,
        temp.path(),
        &[("OMPI_COMM_WORLD_SIZE", "4")],
    );
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("INPUT.CLI_USAGE"));
}

#[test]
fn non_positive_grid_step_is_a_precondition_violation() {
    let temp = TempDir::new().expect("tempdir should be created");
    let mut deck = rock_salt_deck(true, Some("BORNINFO"));
    deck["dos"]["deltaE"] = json!(0.0);
    let deck = stage(&temp, &deck);

    let output = run_cli(&["dielec"], &deck, temp.path());
    assert_eq!(output.status.code(), Some(6));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: [INPUT.DIELEC_GRID]"), "stderr: {stderr}");
    assert!(stderr.contains("FATAL EXIT CODE: 6"));
}

#[test]
fn missing_borninfo_is_fatal_with_input_exit_code() {
    let temp = TempDir::new().expect("tempdir should be created");
    let deck = stage(&temp, &rock_salt_deck(true, None));

    let output = run_cli(&["dielec"], &deck, temp.path());
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: [INPUT.DIELEC_BORNINFO]"), "stderr: {stderr}");
    assert!(stderr.contains("BORNINFO must be set when DIELEC = 1."));
    assert!(stderr.contains("FATAL EXIT CODE: 2"));
}

#[test]
fn zmode_command_writes_one_row_per_mode() {
    let temp = TempDir::new().expect("tempdir should be created");
    let deck = stage(&temp, &rock_salt_deck(false, Some("BORNINFO")));
    let output_dir = temp.path().join("out");

    let output = run_cli(&["zmode"], &deck, &output_dir);
    assert!(
        output.status.success(),
        "command should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let rows = data_rows(&output_dir.join("nacl.zmode"));
    assert_eq!(rows.len(), 6);
    assert!(rows.iter().all(|row| row.len() == 8));
}

#[test]
fn usage_errors_exit_with_input_code() {
    let temp = TempDir::new().expect("tempdir should be created");
    let deck = stage(&temp, &rock_salt_deck(true, Some("BORNINFO")));

    let output = run_cli(&["dielec", "--processes", "2"], &deck, temp.path());
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("INPUT.CLI_USAGE"));

    let output = run_cli(&["dielec"], &temp.path().join("absent.json"), temp.path());
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("IO.CLI"));
}
