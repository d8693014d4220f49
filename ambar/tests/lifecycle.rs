//! Integration tests for the deployment lifecycle against in-memory
//! collaborators.

use ambar::lifecycle::{Action, DeploymentStatus, Outcome};
use ambar::{AmbarError, ConfigSource, InstallLock, InstallOptions, WaitPolicy};
use ambar_test_utils::{
    CONFIG_URL, FakeKernel, RuntimeCall, RuntimeOp, TEMPLATE, TEMPLATE_URL, TestDeployment,
};
use std::net::Ipv4Addr;
use std::time::Duration;

fn fast_poll() -> WaitPolicy {
    WaitPolicy::Poll {
        timeout: Duration::from_millis(200),
        interval: Duration::from_millis(5),
    }
}

fn remote_install() -> InstallOptions {
    InstallOptions {
        source: ConfigSource::Remote(CONFIG_URL.to_string()),
        detected_address: Ipv4Addr::new(192, 168, 1, 42),
    }
}

fn persisted_json(ctx: &TestDeployment) -> serde_json::Value {
    let text = std::fs::read_to_string(ctx.layout().config_path()).unwrap();
    serde_json::from_str(&text).unwrap()
}

fn descriptor(ctx: &TestDeployment) -> String {
    std::fs::read_to_string(ctx.layout().descriptor_path()).unwrap()
}

fn nothing_written(ctx: &TestDeployment) -> bool {
    !ctx.layout().config_path().exists()
        && !ctx.layout().template_path().exists()
        && !ctx.layout().descriptor_path().exists()
}

// ============================================================================
// INSTALL
// ============================================================================

#[tokio::test]
async fn install_persists_renders_pulls_and_tunes() {
    let ctx = TestDeployment::new();
    assert_eq!(ctx.deployment.status(), DeploymentStatus::Absent);

    let report = ctx.install_defaults().await.unwrap();
    assert_eq!(report.action, Action::Install);
    assert_eq!(report.outcome, Outcome::Completed);
    assert_eq!(report.status, DeploymentStatus::Configured);
    assert_eq!(ctx.deployment.status(), DeploymentStatus::Configured);

    let asked = ctx.prompter.asked();
    assert_eq!(asked.len(), 2);
    assert!(asked[0].starts_with("Assigning 192.168.1.42 ip address to Ambar"));
    assert!(asked[1].starts_with("Assigning 80 port address to Ambar"));

    let config = persisted_json(&ctx);
    assert_eq!(config["fe"]["external"]["host"], "192.168.1.42");
    assert_eq!(config["api"]["external"]["host"], "192.168.1.42");
    assert_eq!(
        config["api"]["external"]["public_uri"],
        "http://192.168.1.42:8080"
    );

    assert_eq!(
        std::fs::read_to_string(ctx.layout().template_path()).unwrap(),
        TEMPLATE
    );
    let rendered = descriptor(&ctx);
    assert!(rendered.contains("- \"8080:8080\""));
    assert!(rendered.contains("- \"80:80\""));
    assert!(rendered.contains("api=http://192.168.1.42:8080"));
    assert!(rendered.contains("mode=ce"));

    assert_eq!(
        ctx.runtime.calls(),
        vec![
            RuntimeCall::PullImage("ambar/ambar-crawler:latest".into()),
            RuntimeCall::PullImage("ambar/ambar-pipeline:latest".into()),
            RuntimeCall::ComposePull,
        ]
    );

    let persisted = ctx.kernel.persisted();
    for key in [
        "vm.max_map_count",
        "net.ipv4.ip_local_port_range",
        "net.ipv4.tcp_fin_timeout",
        "net.core.somaxconn",
        "net.core.netdev_max_backlog",
        "net.ipv4.tcp_max_syn_backlog",
    ] {
        assert!(persisted.contains(key), "{key} not persisted");
    }
    assert!(ctx.kernel.live().is_empty());
}

#[tokio::test]
async fn install_aborts_on_invalid_host_without_writing() {
    let ctx = TestDeployment::new();
    ctx.prompter.push_answers(&["not-an-ip"]);

    let err = ctx.deployment.install(remote_install()).await.unwrap_err();
    assert!(matches!(err, AmbarError::InvalidArgument(_)));
    assert!(err.to_string().contains("not-an-ip is not a valid ipv4 address"));

    assert!(nothing_written(&ctx));
    assert!(ctx.runtime.calls().is_empty());
    assert_eq!(ctx.prompter.asked().len(), 1);
    assert_eq!(ctx.deployment.status(), DeploymentStatus::Absent);
}

#[tokio::test]
async fn install_aborts_on_invalid_port_without_writing() {
    let ctx = TestDeployment::new();
    ctx.prompter.push_answers(&["y", "70000"]);

    let err = ctx.deployment.install(remote_install()).await.unwrap_err();
    assert!(matches!(err, AmbarError::InvalidArgument(_)));
    assert!(nothing_written(&ctx));
}

#[tokio::test]
async fn install_with_custom_host_and_shared_port() {
    let ctx = TestDeployment::new();
    ctx.prompter.push_answers(&["10.0.0.5", "9000"]);

    ctx.deployment.install(remote_install()).await.unwrap();

    let config = persisted_json(&ctx);
    assert_eq!(config["fe"]["external"]["port"], "9000");
    assert_eq!(config["api"]["external"]["port"], "9000");
    assert_eq!(config["fe"]["external"]["public_uri"], "http://10.0.0.5:9000");

    let rendered = descriptor(&ctx);
    assert!(rendered.contains("- \"9000:80\""), "{rendered}");
    assert!(!rendered.contains("9000:9000"), "{rendered}");
}

#[tokio::test]
async fn install_preserves_unknown_config_keys() {
    let ctx = TestDeployment::new();
    let mut config: serde_json::Value =
        serde_json::from_str(&ambar_test_utils::sample_config(&ctx.data_path)).unwrap();
    config["uiLang"] = "en".into();
    config["api"]["rabbitHost"] = "amqp://rabbit".into();
    ctx.fetcher.serve(CONFIG_URL, &config.to_string());

    ctx.install_defaults().await.unwrap();

    let persisted = persisted_json(&ctx);
    assert_eq!(persisted["uiLang"], "en");
    assert_eq!(persisted["api"]["rabbitHost"], "amqp://rabbit");
    assert_eq!(persisted["api"]["pipelineCount"], 1);
}

#[tokio::test]
async fn install_fails_before_prompting_when_config_unreachable() {
    let ctx = TestDeployment::new();
    ctx.fetcher.unserve(CONFIG_URL);

    let err = ctx.install_defaults().await.unwrap_err();
    assert!(matches!(err, AmbarError::ConfigUnavailable(_)));
    assert!(ctx.prompter.asked().is_empty());
    assert!(nothing_written(&ctx));
}

#[tokio::test]
async fn install_fails_before_prompting_when_template_unreachable() {
    let ctx = TestDeployment::new();
    ctx.fetcher.unserve(TEMPLATE_URL);

    let err = ctx.install_defaults().await.unwrap_err();
    assert!(matches!(err, AmbarError::Fetch { .. }));
    assert!(ctx.prompter.asked().is_empty());
    assert!(nothing_written(&ctx));
}

#[tokio::test]
async fn install_from_local_config() {
    let ctx = TestDeployment::new();
    std::fs::create_dir_all(&ctx.home).unwrap();
    std::fs::write(
        ctx.layout().config_path(),
        ambar_test_utils::sample_config(&ctx.data_path),
    )
    .unwrap();
    ctx.fetcher.unserve(CONFIG_URL);
    ctx.prompter.push_answers(&["y", "y"]);

    ctx.deployment
        .install(InstallOptions {
            source: ConfigSource::Local,
            detected_address: Ipv4Addr::LOCALHOST,
        })
        .await
        .unwrap();

    assert_eq!(ctx.fetcher.fetched(), vec![TEMPLATE_URL.to_string()]);
    assert_eq!(
        persisted_json(&ctx)["fe"]["external"]["public_uri"],
        "http://127.0.0.1:80"
    );
}

#[tokio::test]
async fn install_fails_when_persistent_tuning_fails() {
    let ctx = TestDeployment::new();
    ctx.kernel.fail_persist(true);

    let err = ctx.install_defaults().await.unwrap_err();
    assert!(matches!(err, AmbarError::Tuning(_)));
}

#[tokio::test]
async fn persistent_tuning_keeps_existing_values() {
    let ctx = TestDeployment::with_kernel(FakeKernel::with_persisted("vm.max_map_count=65530\n"));

    ctx.install_defaults().await.unwrap();

    let persisted = ctx.kernel.persisted();
    assert!(persisted.contains("vm.max_map_count=65530"));
    assert!(!persisted.contains("vm.max_map_count=262144"));
    assert!(persisted.contains("net.core.somaxconn=1024"));
}

#[tokio::test]
async fn persistent_tuning_twice_equals_once() {
    let kernel = FakeKernel::new();
    let first = ambar::tuning::apply_persistent(&kernel).await.unwrap();
    let once = kernel.persisted();
    let second = ambar::tuning::apply_persistent(&kernel).await.unwrap();

    assert_eq!(first.len(), 6);
    assert!(second.is_empty());
    assert_eq!(kernel.persisted(), once);
}

// ============================================================================
// START
// ============================================================================

#[tokio::test]
async fn start_requires_install() {
    let ctx = TestDeployment::new();
    let err = ctx.deployment.start(WaitPolicy::Skip).await.unwrap_err();
    assert!(matches!(err, AmbarError::ConfigInvalid(_)));
    assert!(ctx.runtime.calls().is_empty());
}

#[tokio::test]
async fn every_action_but_install_is_refused_when_absent() {
    let ctx = TestDeployment::new();

    let results = [
        (Action::Start, ctx.deployment.start(WaitPolicy::Skip).await),
        (Action::Stop, ctx.deployment.stop().await),
        (Action::Restart, ctx.deployment.restart(WaitPolicy::Skip).await),
        (Action::Update, ctx.deployment.update(WaitPolicy::Skip).await),
        (Action::Reset, ctx.deployment.reset().await),
        (Action::Uninstall, ctx.deployment.uninstall().await),
    ];
    for (action, result) in results {
        let err = result.unwrap_err();
        assert!(matches!(err, AmbarError::ConfigInvalid(_)), "{action}: {err}");
        assert!(err.to_string().contains(&format!("cannot {action}")), "{err}");
    }

    assert!(ctx.runtime.calls().is_empty());
    assert!(ctx.prompter.asked().is_empty());
    assert!(ctx.fetcher.fetched().is_empty());
    assert_eq!(ctx.deployment.status(), DeploymentStatus::Absent);
}

#[tokio::test]
async fn start_tunes_renders_and_brings_services_up() {
    let ctx = TestDeployment::new();
    ctx.install_defaults().await.unwrap();
    std::fs::remove_file(ctx.layout().descriptor_path()).unwrap();

    let report = ctx.deployment.start(fast_poll()).await.unwrap();
    assert_eq!(report.status, DeploymentStatus::Running);
    assert_eq!(report.frontend.as_deref(), Some("http://192.168.1.42:80"));
    assert!(report.warnings.is_empty());

    assert_eq!(ctx.kernel.live().len(), 6);
    assert!(ctx.layout().descriptor_path().exists());
    assert_eq!(ctx.runtime.calls().last(), Some(&RuntimeCall::ComposeUp));
    assert_eq!(ctx.probe.checks(), 1);
}

#[tokio::test]
async fn start_aborts_before_compose_up_when_live_tuning_fails() {
    let ctx = TestDeployment::new();
    ctx.install_defaults().await.unwrap();
    ctx.kernel.fail_live(true);

    let err = ctx.deployment.start(WaitPolicy::Skip).await.unwrap_err();
    assert!(matches!(err, AmbarError::Tuning(_)));
    assert!(!ctx.runtime.calls().contains(&RuntimeCall::ComposeUp));
}

#[tokio::test]
async fn start_keeps_previous_descriptor_when_render_fails() {
    let ctx = TestDeployment::new();
    ctx.install_defaults().await.unwrap();
    let before = descriptor(&ctx);
    std::fs::write(
        ctx.layout().template_path(),
        "pages=${OCR_PDF_MAX_PAGE_COUNT}\n",
    )
    .unwrap();

    let err = ctx.deployment.start(WaitPolicy::Skip).await.unwrap_err();
    match err {
        AmbarError::KeyMissing { placeholder, .. } => {
            assert_eq!(placeholder, "OCR_PDF_MAX_PAGE_COUNT")
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(descriptor(&ctx), before);
    assert!(!ctx.runtime.calls().contains(&RuntimeCall::ComposeUp));
}

#[tokio::test]
async fn start_without_wait_skips_probe() {
    let ctx = TestDeployment::new();
    ctx.install_defaults().await.unwrap();

    ctx.deployment.start(WaitPolicy::Skip).await.unwrap();
    assert_eq!(ctx.probe.checks(), 0);
}

#[tokio::test]
async fn start_polls_until_frontend_answers() {
    let ctx = TestDeployment::new();
    ctx.install_defaults().await.unwrap();
    ctx.probe.set_ready_after(3);

    ctx.deployment.start(fast_poll()).await.unwrap();
    assert_eq!(ctx.probe.checks(), 3);
}

#[tokio::test]
async fn start_times_out_when_frontend_never_answers() {
    let ctx = TestDeployment::new();
    ctx.install_defaults().await.unwrap();
    ctx.probe.set_ready_after(0);

    let err = ctx
        .deployment
        .start(WaitPolicy::Poll {
            timeout: Duration::from_millis(30),
            interval: Duration::from_millis(5),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AmbarError::Timeout(_)));
    assert!(ctx.runtime.calls().contains(&RuntimeCall::ComposeUp));
}

#[tokio::test]
async fn concurrent_invocation_is_rejected() {
    let ctx = TestDeployment::new();
    ctx.install_defaults().await.unwrap();

    let _held = InstallLock::acquire(&ctx.home).unwrap();
    let err = ctx.deployment.start(WaitPolicy::Skip).await.unwrap_err();
    assert!(err.to_string().contains("Another ambar invocation"));
}

// ============================================================================
// STOP / RESTART / UPDATE
// ============================================================================

#[tokio::test]
async fn stop_without_containers_still_runs_compose_down() {
    let ctx = TestDeployment::new();
    ctx.install_defaults().await.unwrap();

    let report = ctx.deployment.stop().await.unwrap();
    assert_eq!(report.status, DeploymentStatus::Stopped);
    assert!(report.warnings.is_empty());

    let calls = ctx.runtime.calls();
    assert!(calls.contains(&RuntimeCall::ListByAncestor("ambar/ambar-crawler".into())));
    assert!(calls.contains(&RuntimeCall::ListByAncestor("ambar/ambar-pipeline".into())));
    assert_eq!(calls.last(), Some(&RuntimeCall::ComposeDown));
}

#[tokio::test]
async fn stop_removes_crawlers_then_pipelines() {
    let ctx = TestDeployment::new();
    ctx.install_defaults().await.unwrap();
    ctx.runtime.add_containers("ambar/ambar-crawler", &["c1", "c2"]);
    ctx.runtime.add_containers("ambar/ambar-pipeline", &["p1"]);

    ctx.deployment.stop().await.unwrap();

    assert_eq!(ctx.runtime.running_containers(), 0);
    let removals: Vec<_> = ctx
        .runtime
        .calls()
        .into_iter()
        .filter(|c| matches!(c, RuntimeCall::Remove(_)))
        .collect();
    assert_eq!(
        removals,
        vec![
            RuntimeCall::Remove(vec!["c1".into(), "c2".into()]),
            RuntimeCall::Remove(vec!["p1".into()]),
        ]
    );
}

#[tokio::test]
async fn stop_reports_failures_as_warnings() {
    let ctx = TestDeployment::new();
    ctx.install_defaults().await.unwrap();
    ctx.runtime.fail_on(RuntimeOp::ListByAncestor);
    ctx.runtime.fail_on(RuntimeOp::ComposeDown);

    let report = ctx.deployment.stop().await.unwrap();
    assert_eq!(report.outcome, Outcome::Completed);
    assert_eq!(report.warnings.len(), 3);
    assert_eq!(report.warnings[2].step, "compose down");
    assert_eq!(ctx.runtime.calls().last(), Some(&RuntimeCall::ComposeDown));
}

#[tokio::test]
async fn restart_stops_before_starting() {
    let ctx = TestDeployment::new();
    ctx.install_defaults().await.unwrap();

    let report = ctx.deployment.restart(WaitPolicy::Skip).await.unwrap();
    assert_eq!(report.action, Action::Restart);
    assert_eq!(report.status, DeploymentStatus::Running);

    let calls = ctx.runtime.calls();
    let down = calls.iter().position(|c| *c == RuntimeCall::ComposeDown);
    let up = calls.iter().position(|c| *c == RuntimeCall::ComposeUp);
    assert!(down.unwrap() < up.unwrap());
}

#[tokio::test]
async fn update_fetches_latest_template() {
    let ctx = TestDeployment::new();
    ctx.install_defaults().await.unwrap();
    ctx.fetcher
        .serve(TEMPLATE_URL, "image: ${DOCKER_REPO_URL}/ambar-webapi:next\n");

    let report = ctx.deployment.update(WaitPolicy::Skip).await.unwrap();
    assert_eq!(report.status, DeploymentStatus::Running);
    assert_eq!(descriptor(&ctx), "image: ambar/ambar-webapi:next\n");

    let calls = ctx.runtime.calls();
    let pulls = calls
        .iter()
        .filter(|c| matches!(c, RuntimeCall::PullImage(_)))
        .count();
    assert_eq!(pulls, 4);
    assert_eq!(calls.last(), Some(&RuntimeCall::ComposeUp));
}

#[tokio::test]
async fn update_fetch_failure_is_fatal() {
    let ctx = TestDeployment::new();
    ctx.install_defaults().await.unwrap();
    let before = descriptor(&ctx);
    ctx.fetcher.unserve(TEMPLATE_URL);

    let err = ctx.deployment.update(WaitPolicy::Skip).await.unwrap_err();
    assert!(matches!(err, AmbarError::Fetch { .. }));
    assert_eq!(
        std::fs::read_to_string(ctx.layout().template_path()).unwrap(),
        TEMPLATE
    );
    assert_eq!(descriptor(&ctx), before);
    assert!(!ctx.runtime.calls().contains(&RuntimeCall::ComposeUp));
}

// ============================================================================
// RESET / UNINSTALL
// ============================================================================

fn seed_data(ctx: &TestDeployment) {
    std::fs::create_dir_all(ctx.data_path.join("es")).unwrap();
    std::fs::write(ctx.data_path.join("es/segment"), "data").unwrap();
}

#[tokio::test]
async fn reset_removes_data_and_keeps_config() {
    let ctx = TestDeployment::new();
    ctx.install_defaults().await.unwrap();
    seed_data(&ctx);
    ctx.prompter.push_answers(&["Y"]);

    let report = ctx.deployment.reset().await.unwrap();
    assert_eq!(report.outcome, Outcome::Completed);
    assert_eq!(report.status, DeploymentStatus::Configured);

    let asked = ctx.prompter.asked();
    assert!(asked.last().unwrap().contains(&ctx.data_path.display().to_string()));
    assert!(!ctx.data_path.exists());
    assert!(ctx.layout().config_path().exists());
    assert!(ctx.runtime.calls().contains(&RuntimeCall::ComposeDown));
}

#[tokio::test]
async fn declined_reset_changes_nothing() {
    let ctx = TestDeployment::new();
    ctx.install_defaults().await.unwrap();
    seed_data(&ctx);
    ctx.prompter.push_answers(&["n"]);

    let report = ctx.deployment.reset().await.unwrap();
    assert!(report.is_cancelled());
    assert!(ctx.data_path.join("es/segment").exists());
    assert!(!ctx.runtime.calls().contains(&RuntimeCall::ComposeDown));
}

#[tokio::test]
async fn uninstall_removes_everything() {
    let ctx = TestDeployment::new();
    ctx.install_defaults().await.unwrap();
    seed_data(&ctx);
    ctx.prompter.push_answers(&["y"]);

    let report = ctx.deployment.uninstall().await.unwrap();
    assert_eq!(report.status, DeploymentStatus::Absent);
    assert!(
        ctx.prompter
            .asked()
            .last()
            .unwrap()
            .starts_with("Ambar will be uninstalled")
    );

    assert!(!ctx.data_path.exists());
    assert!(nothing_written(&ctx));
    assert_eq!(ctx.deployment.status(), DeploymentStatus::Absent);
}

#[tokio::test]
async fn declined_uninstall_keeps_install() {
    let ctx = TestDeployment::new();
    ctx.install_defaults().await.unwrap();
    ctx.prompter.push_answers(&["no"]);

    let report = ctx.deployment.uninstall().await.unwrap();
    assert_eq!(report.outcome, Outcome::Cancelled);
    assert_eq!(report.status, DeploymentStatus::Configured);
    assert!(ctx.layout().config_path().exists());
}
