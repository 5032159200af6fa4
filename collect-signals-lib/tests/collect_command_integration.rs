//! Integration tests for the `collect-signals` command, with the GitHub API served by wiremock.

use camino::{Utf8Path, Utf8PathBuf};
use collect_signals_lib::Host;
use std::fs;
use std::io::Write;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JOB_TIME: &str = "2024-05-06T07:08:09Z";
const JOB_DIR: &str = "2024.05.06/070809";

/// Test host that captures output to in-memory buffers.
#[derive(Default)]
struct TestHost {
    output_buf: Vec<u8>,
    error_buf: Vec<u8>,
    exit_code: Option<i32>,
}

impl TestHost {
    fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output_buf).into_owned()
    }

    fn error_str(&self) -> String {
        String::from_utf8_lossy(&self.error_buf).into_owned()
    }
}

impl Host for TestHost {
    fn output(&mut self) -> impl Write {
        &mut self.output_buf
    }

    fn error(&mut self) -> impl Write {
        &mut self.error_buf
    }

    fn exit(&mut self, code: i32) {
        self.exit_code = Some(code);
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    root: Utf8PathBuf,
    server: MockServer,
}

impl Fixture {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/octo/alpha"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "html_url": "https://github.com/octo/alpha",
                "language": "Rust",
                "stargazers_count": 120,
                "forks_count": 7,
                "subscribers_count": 5,
                "open_issues_count": 3,
                "archived": false,
                "created_at": "2020-01-01T00:00:00Z",
                "pushed_at": "2024-04-01T00:00:00Z"
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/repos/octo/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/repos/octo/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/search/commits"))
            .and(query_param("per_page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "total_count": 42 })))
            .mount(&server)
            .await;

        fs::write(root.join("config.toml"), "max_attempts = 2\n").unwrap();

        Self { _dir: dir, root, server }
    }

    fn write_input(&self, lines: &[&str]) -> Utf8PathBuf {
        let path = self.root.join("repos.txt");
        fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    fn path(&self, relative: &str) -> Utf8PathBuf {
        self.root.join(relative)
    }

    async fn run(&self, host: &mut TestHost, input: &Utf8Path, extra: &[&str]) -> collect_signals_lib::Result<()> {
        let uri = self.server.uri();
        let config = self.path("config.toml");
        let state = self.path("state.json");
        let output = self.path("signals");
        let raw = self.path("signals-raw");

        let mut args = vec![
            "collect-signals",
            "--config",
            config.as_str(),
            "--github-api-url",
            uri.as_str(),
            "--state-file",
            state.as_str(),
            "--output-dir",
            output.as_str(),
            "--raw-output-dir",
            raw.as_str(),
            "--job-time",
            JOB_TIME,
            "--color",
            "never",
        ];
        args.extend_from_slice(extra);
        args.push(input.as_str());

        collect_signals_lib::run(host, args, &CancellationToken::new()).await
    }
}

#[tokio::test]
async fn test_collects_shard_and_skips_uncollectable() {
    let fixture = Fixture::new().await;
    let input = fixture.write_input(&["https://github.com/octo/alpha", "", "  https://github.com/octo/gone  "]);

    let mut host = TestHost::default();
    fixture.run(&mut host, &input, &[]).await.unwrap();

    assert_eq!(host.exit_code, None);
    let summary = host.output_str();
    assert!(summary.contains("1 repositories collected, 1 skipped as uncollectable"), "{summary}");

    let csv = fs::read_to_string(fixture.path("signals").join(JOB_DIR).join("shard-0000000.csv")).unwrap();
    let mut lines = csv.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("repo.url,repo.language,repo.stars"), "{header}");
    assert!(header.ends_with("github_mentions.mention_count,default_score"), "{header}");

    let row = lines.next().unwrap();
    assert!(row.starts_with("https://github.com/octo/alpha,Rust,120,7,5,3,false,"), "{row}");
    assert!(row.contains(",42,"), "{row}");
    assert!(lines.next().is_none());

    let raw = fs::read_to_string(fixture.path("signals-raw").join(JOB_DIR).join("shard-0000000.json")).unwrap();
    assert_eq!(raw.lines().count(), 1);
    let raw_row: serde_json::Value = serde_json::from_str(raw.trim()).unwrap();
    assert_eq!(raw_row["repo"], "https://github.com/octo/alpha");
    assert_eq!(raw_row["signals"]["github_mentions"]["mention_count"], 42);
    assert!(raw_row["signals"].get("default_score").is_none());

    for dest in ["signals", "signals-raw"] {
        let marker = fs::read_to_string(fixture.path(dest).join(JOB_DIR).join(".shard_metadata")).unwrap();
        let marker: serde_json::Value = serde_json::from_str(&marker).unwrap();
        assert_eq!(marker["shard_count"], 1);
    }

    assert!(!fixture.path("state.json").exists());
}

#[tokio::test]
async fn test_score_column_can_be_renamed_or_disabled() {
    let fixture = Fixture::new().await;
    let input = fixture.write_input(&["https://github.com/octo/alpha"]);

    let mut host = TestHost::default();
    fixture
        .run(&mut host, &input, &["--scoring-column", "criticality"])
        .await
        .unwrap();
    let csv = fs::read_to_string(fixture.path("signals").join(JOB_DIR).join("shard-0000000.csv")).unwrap();
    assert!(csv.lines().next().unwrap().ends_with(",criticality"));

    fs::remove_dir_all(fixture.path("signals")).unwrap();

    let mut host = TestHost::default();
    fixture.run(&mut host, &input, &["--scoring-disable"]).await.unwrap();
    let csv = fs::read_to_string(fixture.path("signals").join(JOB_DIR).join("shard-0000000.csv")).unwrap();
    assert!(csv.lines().next().unwrap().ends_with(",github_mentions.mention_count"));
}

#[tokio::test]
async fn test_failing_source_exhausts_attempts() {
    let fixture = Fixture::new().await;
    let input = fixture.write_input(&["https://github.com/octo/alpha", "https://github.com/octo/broken"]);

    let mut host = TestHost::default();
    let _ = fixture.run(&mut host, &input, &[]).await.unwrap_err();

    assert_eq!(host.exit_code, Some(1));
    let error = host.error_str();
    assert!(error.contains("shard 0 did not complete after 2 attempts"), "{error}");
    assert!(error.contains("octo/broken"), "{error}");

    assert!(!fixture.path("signals").join(JOB_DIR).join("shard-0000000.csv").exists());
    let state: serde_json::Value = serde_json::from_str(&fs::read_to_string(fixture.path("state.json")).unwrap()).unwrap();
    assert_eq!(state["shard"], 0);
    assert_eq!(state["attempt"], 2);
}

#[tokio::test]
async fn test_lenient_mode_fills_empty_signals() {
    let fixture = Fixture::new().await;
    let input = fixture.write_input(&["https://github.com/octo/broken"]);

    let mut host = TestHost::default();
    fixture.run(&mut host, &input, &["--lenient"]).await.unwrap();

    let csv = fs::read_to_string(fixture.path("signals").join(JOB_DIR).join("shard-0000000.csv")).unwrap();
    let row = csv.lines().nth(1).unwrap();
    assert!(row.starts_with(",,,,,,,,,,,42,"), "{row}");
}

#[tokio::test]
async fn test_bad_input_line_fails_the_job() {
    let fixture = Fixture::new().await;
    let input = fixture.write_input(&["https://github.com/octo/alpha", "not a url"]);

    let mut host = TestHost::default();
    let _ = fixture.run(&mut host, &input, &[]).await.unwrap_err();

    assert_eq!(host.exit_code, Some(1));
    assert!(host.error_str().contains("line 2"), "{}", host.error_str());
}

#[tokio::test]
async fn test_missing_input_file_fails_before_any_work() {
    let fixture = Fixture::new().await;

    let mut host = TestHost::default();
    let missing = fixture.path("missing.txt");
    let _ = fixture.run(&mut host, &missing, &[]).await.unwrap_err();

    assert_eq!(host.exit_code, Some(1));
    assert!(host.error_str().contains("missing.txt"));
    assert!(!fixture.path("signals").exists());
}
