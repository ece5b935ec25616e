use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Nothing listens on the discard port
const UNREACHABLE_URL: &str = "http://127.0.0.1:9";

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }

    fn history_path(&self) -> PathBuf {
        self.xdg_data.join("docquery/history.json")
    }

    fn seed_history(&self, questions: &[&str]) {
        let entries: Vec<_> = questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                serde_json::json!({
                    "id": format!("seed-{i}"),
                    "question": q,
                    "timestamp": 1_700_000_000_000i64 - i as i64 * 60_000,
                })
            })
            .collect();
        let path = self.history_path();
        fs::create_dir_all(path.parent().expect("missing history parent"))
            .expect("failed to create data dir");
        fs::write(&path, serde_json::to_string(&entries).expect("serialize history"))
            .expect("failed to seed history");
    }

    fn read_history(&self) -> Vec<serde_json::Value> {
        let text = fs::read_to_string(self.history_path()).expect("failed to read history");
        serde_json::from_str(&text).expect("history is not JSON")
    }
}

fn run_ask(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("docquery-ask"));

    Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env_remove("DOCQUERY_API_URL")
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("failed to execute docquery-ask: {e}"))
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn assert_success(args: &[&str], output: &Output) {
    assert!(
        output.status.success(),
        "docquery-ask {:?} failed\nstatus: {:?}\nstdout:\n{}\nstderr:\n{}",
        args,
        output.status.code(),
        stdout(output),
        stderr(output)
    );
}

#[test]
fn history_lists_seeded_questions_newest_first() {
    let env = CliTestEnv::new();
    env.seed_history(&["What color was the vehicle?", "Who was the witness?"]);

    let args = ["history"];
    let output = run_ask(&env, &args);
    assert_success(&args, &output);

    let out = stdout(&output);
    let first = out
        .find("What color was the vehicle?")
        .expect("newest question missing");
    let second = out.find("Who was the witness?").expect("older question missing");
    assert!(first < second, "history out of order:\n{out}");
}

#[test]
fn history_json_output() {
    let env = CliTestEnv::new();
    env.seed_history(&["Where did it happen?"]);

    let args = ["history", "--json"];
    let output = run_ask(&env, &args);
    assert_success(&args, &output);

    let entries: Vec<serde_json::Value> =
        serde_json::from_slice(&output.stdout).expect("stdout is not JSON");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["question"], "Where did it happen?");
}

#[test]
fn history_clear_empties_the_file() {
    let env = CliTestEnv::new();
    env.seed_history(&["one", "two", "three"]);

    let args = ["history", "--clear"];
    let output = run_ask(&env, &args);
    assert_success(&args, &output);

    assert!(env.read_history().is_empty());

    let output = run_ask(&env, &["history"]);
    assert!(stdout(&output).contains("No recent searches"));
}

#[test]
fn blank_question_fails_without_touching_history() {
    let env = CliTestEnv::new();
    env.seed_history(&["earlier question"]);

    let output = run_ask(&env, &["--api-url", UNREACHABLE_URL, "ask", "   "]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("must not be empty"));
    let history = env.read_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["question"], "earlier question");
}

#[test]
fn unreachable_backend_fails_but_records_question() {
    let env = CliTestEnv::new();

    let output = run_ask(
        &env,
        &["--api-url", UNREACHABLE_URL, "ask", "What", "color", "was", "the", "vehicle?"],
    );

    assert!(!output.status.success());
    assert!(
        stderr(&output).contains("Cannot reach the answer service"),
        "unexpected stderr:\n{}",
        stderr(&output)
    );

    let history = env.read_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["question"], "What color was the vehicle?");
}

#[test]
fn env_var_selects_backend() {
    let env = CliTestEnv::new();

    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("docquery-ask"));
    let output = Command::new(bin_path)
        .args(["stats"])
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env("DOCQUERY_API_URL", UNREACHABLE_URL)
        .output()
        .expect("failed to execute docquery-ask");

    assert!(!output.status.success());
    assert!(stderr(&output).contains("127.0.0.1:9"));
}

#[test]
fn invalid_config_is_rejected() {
    let env = CliTestEnv::new();
    let config_dir = env.xdg_config.join("docquery");
    fs::create_dir_all(&config_dir).expect("failed to create config dir");
    fs::write(config_dir.join("config.toml"), "[history]\ncap = 0\n")
        .expect("failed to write config");

    let output = run_ask(&env, &["history"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("history.cap"));
}
