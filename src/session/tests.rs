//! Tests for environment sessions.

use super::*;
use crate::resolver::ResolvedContext;
use crate::test_support::{FakeContext, FakeResolver, LOCAL_PATH, RELEASE_PATH, create_config_root};
use chrono::TimeZone;

const PROFILES: &str = r#"
maya:
  packages:
    python: "3.9"
    maya: "2024"
    usd: ""
houdini:
  packages:
    houdini: "20.0"
    nuke: ""
shell:
  packages: {}
"#;

fn profiles() -> Configuration {
    Configuration::from_yaml(PROFILES).unwrap()
}

fn options() -> SessionOptions {
    SessionOptions {
        config: Some(profiles()),
        ..Default::default()
    }
}

fn launch() -> LaunchContext {
    LaunchContext::new("/nonexistent/config")
}

fn session(profile: &str, options: SessionOptions) -> EnvironmentSession<FakeContext> {
    EnvironmentSession::new(profile, options, &FakeResolver::new(), &launch()).unwrap()
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn test_resolves_profile_requests() {
    let resolver = FakeResolver::new();
    let session = EnvironmentSession::new("maya", options(), &resolver, &launch()).unwrap();

    assert_eq!(session.profile(), "maya");
    assert_eq!(session.state(), SessionState::Resolved);
    assert_eq!(session.requests(), ["python-3.9", "maya-2024", "usd"]);
    assert_eq!(session.package_paths(), [PathBuf::from(RELEASE_PATH)]);
    assert_eq!(
        session.context().resolved_packages(),
        ["python-3.9", "maya-2024", "usd-23.5"]
    );

    let calls = resolver.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].requests, ["python-3.9", "maya-2024", "usd"]);
    assert_eq!(calls[0].timestamp, None);
}

#[test]
fn test_local_and_extra_package_paths() {
    let session = session(
        "maya",
        SessionOptions {
            use_local_packages: true,
            extra_package_paths: vec![PathBuf::from("/extra/a"), PathBuf::from("/extra/b")],
            ..options()
        },
    );

    assert_eq!(
        session.package_paths(),
        [
            PathBuf::from(LOCAL_PATH),
            PathBuf::from(RELEASE_PATH),
            PathBuf::from("/extra/a"),
            PathBuf::from("/extra/b"),
        ]
    );
}

#[test]
fn test_explicit_timestamp_wins_over_settings() {
    let mut config = profiles();
    let settings = Configuration::from_yaml("_resolve_settings:\n  timestamp: 1600000000\n").unwrap();
    config = crate::config::apply_override(&config, &settings);

    let resolver = FakeResolver::new();
    let explicit = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    EnvironmentSession::new(
        "maya",
        SessionOptions {
            resolve_timestamp: Some(explicit),
            config: Some(config.clone()),
            ..Default::default()
        },
        &resolver,
        &launch(),
    )
    .unwrap();
    EnvironmentSession::new(
        "maya",
        SessionOptions {
            config: Some(config),
            ..Default::default()
        },
        &resolver,
        &launch(),
    )
    .unwrap();

    let calls = resolver.calls();
    assert_eq!(calls[0].timestamp, Some(explicit));
    assert_eq!(
        calls[1].timestamp.map(|t| t.timestamp()),
        Some(1_600_000_000)
    );
}

#[test]
fn test_unknown_profile() {
    let err = EnvironmentSession::new("nuke", options(), &FakeResolver::new(), &launch())
        .unwrap_err();
    assert!(matches!(err, LaunchError::UnknownProfile { .. }));
}

#[test]
fn test_resolution_failure_carries_diagnostics() {
    let err = EnvironmentSession::new("houdini", options(), &FakeResolver::new(), &launch())
        .unwrap_err();

    match &err {
        LaunchError::EnvironmentResolution {
            requests,
            diagnostics,
        } => {
            assert_eq!(requests, &vec!["houdini-20.0".to_string(), "nuke".to_string()]);
            assert!(diagnostics.contains("package family not found: nuke"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_empty_profile_resolves_empty_request() {
    let session = session("shell", options());
    assert!(session.requests().is_empty());
    assert!(session.context().resolved_packages().is_empty());
}

#[test]
fn test_config_resolved_from_launch_context() {
    let root = create_config_root(&[
        ("_base.yml", PROFILES),
        ("testjob.yml", "maya:\n  packages:\n    maya: '2025'\n"),
        ("testjob_fx.yml", "maya:\n  packages:\n    usd: __exclude__\n"),
    ]);
    let launch = LaunchContext {
        project: Some("testjob".to_string()),
        department: Some("fx".to_string()),
        ..LaunchContext::new(root.path())
    };

    let session =
        EnvironmentSession::new("maya", SessionOptions::default(), &FakeResolver::new(), &launch)
            .unwrap();

    assert_eq!(session.requests(), ["python-3.9", "maya-2025"]);
    assert!(session.config().contains_profile("houdini"));
}

#[test]
fn test_missing_config_root_fails_before_resolving() {
    let resolver = FakeResolver::new();
    let err = EnvironmentSession::new("maya", SessionOptions::default(), &resolver, &launch())
        .unwrap_err();

    assert!(matches!(err, LaunchError::BaseConfigNotFound(_)));
    assert!(resolver.calls().is_empty());
}

// ============================================================================
// Patching
// ============================================================================

#[test]
fn test_patch_re_resolves_and_replaces_context() {
    let resolver = FakeResolver::new();
    let launch = LaunchContext {
        testing_packages_path: Some(PathBuf::from("/packages/testing")),
        ..launch()
    };

    let session = EnvironmentSession::new(
        "maya",
        SessionOptions {
            patch_packages: vec!["maya-2025.0".to_string(), "red_tools".to_string()],
            ..options()
        },
        &resolver,
        &launch,
    )
    .unwrap();

    assert_eq!(session.state(), SessionState::PatchResolved);
    assert_eq!(
        session.requests(),
        ["python==3.9", "maya-2025.0", "usd==23.5", "red_tools"]
    );
    assert_eq!(
        session.package_paths(),
        [
            PathBuf::from(LOCAL_PATH),
            PathBuf::from("/packages/testing"),
            PathBuf::from(RELEASE_PATH),
        ]
    );
    assert_eq!(
        session.context().resolved_packages(),
        ["python-3.9", "maya-2025.0", "usd-23.5", "red_tools-1.0"]
    );

    let calls = resolver.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].requests, ["python-3.9", "maya-2024", "usd"]);
    assert_eq!(calls[1].requests, session.requests());
    assert_eq!(calls[1].timestamp, None);
}

#[test]
fn test_patch_does_not_duplicate_local_path() {
    let session = session(
        "maya",
        SessionOptions {
            use_local_packages: true,
            patch_packages: vec!["python-3.10".to_string()],
            ..options()
        },
    );

    assert_eq!(
        session.package_paths(),
        [PathBuf::from(LOCAL_PATH), PathBuf::from(RELEASE_PATH)]
    );
}

#[test]
fn test_unsatisfiable_patch_fails() {
    let err = EnvironmentSession::new(
        "maya",
        SessionOptions {
            patch_packages: vec!["katana-7".to_string()],
            ..options()
        },
        &FakeResolver::new(),
        &launch(),
    )
    .unwrap_err();

    match err {
        LaunchError::EnvironmentResolution { requests, .. } => {
            assert_eq!(requests.last().map(String::as_str), Some("katana-7"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_strict_patch_removal_of_missing_package_fails() {
    let err = EnvironmentSession::new(
        "maya",
        SessionOptions {
            patch_packages: vec!["^houdini".to_string()],
            ..options()
        },
        &FakeResolver::new(),
        &launch(),
    )
    .unwrap_err();

    assert!(matches!(err, LaunchError::Resolver(_)));
}

// ============================================================================
// Running commands
// ============================================================================

#[cfg(unix)]
mod run {
    use super::*;

    #[test]
    fn test_run_captures_combined_output_in_order() {
        let session = session("maya", options());

        let result = session
            .run(["sh", "-c", "echo one; echo two 1>&2; echo three"], None)
            .unwrap();

        assert_eq!(result.return_code, 0);
        assert!(result.is_success());
        assert_eq!(result.captured_output, "one\ntwo\nthree\n");
        assert_eq!(result.command, ["sh", "-c", "echo one; echo two 1>&2; echo three"]);
    }

    #[test]
    fn test_run_streams_and_captures_the_same_text() {
        let session = session("maya", options());
        let mut streamed: Vec<u8> = Vec::new();

        let result = session
            .run("sh -c 'for i in 1 2 3 4 5; do echo line $i; done'", Some(&mut streamed))
            .unwrap();

        assert_eq!(result.return_code, 0);
        assert_eq!(
            result.captured_output,
            "line 1\nline 2\nline 3\nline 4\nline 5\n"
        );
        assert_eq!(String::from_utf8(streamed).unwrap(), result.captured_output);
    }

    #[test]
    fn test_run_passes_through_exit_code() {
        let session = session("maya", options());

        let result = session.run("sh -c 'echo failing; exit 3'", None).unwrap();

        assert_eq!(result.return_code, 3);
        assert!(!result.is_success());
        assert_eq!(result.captured_output, "failing\n");
    }

    #[test]
    fn test_run_replaces_invalid_utf8() {
        let session = session("maya", options());

        let result = session
            .run(["sh", "-c", "printf 'ok\\377\\n'"], None)
            .unwrap();

        assert_eq!(result.return_code, 0);
        assert_eq!(result.captured_output, "ok\u{FFFD}\n");
    }

    #[test]
    fn test_run_keeps_output_without_trailing_newline() {
        let session = session("maya", options());

        let result = session.run(["printf", "no newline"], None).unwrap();

        assert_eq!(result.captured_output, "no newline");
    }

    #[test]
    fn test_run_uses_parent_environment() {
        let session = session("maya", options());
        assert!(session.parent_environ().contains_key(std::ffi::OsStr::new("PATH")));

        let result = session.run("sh -c 'test -n \"$PATH\"'", None).unwrap();
        assert_eq!(result.return_code, 0);
    }

    #[test]
    fn test_run_unknown_command_fails() {
        let session = session("maya", options());

        let err = session.run("nonexistent_command_xyz_123", None).unwrap_err();

        assert!(matches!(err, LaunchError::Command(_)));
        assert!(err.to_string().contains("failed to execute"));
    }

    #[test]
    fn test_run_failing_stream_still_captures() {
        struct BrokenStream;
        impl std::io::Write for BrokenStream {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let session = session("maya", options());
        let mut stream = BrokenStream;

        let result = session
            .run(["sh", "-c", "echo a; echo b"], Some(&mut stream))
            .unwrap();

        assert_eq!(result.captured_output, "a\nb\n");
    }

    #[test]
    fn test_popen_does_not_wait() {
        use std::io::Read;

        let session = session("maya", options());

        let mut process = session.popen(["sh", "-c", "echo started"]).unwrap();
        let mut output = String::new();
        process.output.read_to_string(&mut output).unwrap();
        let status = process.child.wait().unwrap();

        assert!(status.success());
        assert_eq!(output, "started\n");
        assert_eq!(process.command, ["sh", "-c", "echo started"]);
    }
}
