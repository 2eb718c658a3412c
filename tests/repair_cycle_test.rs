// Validation/repair cycle: attempt bound, auth short-circuit, eventual success

use std::sync::Arc;

use docwright::config::constants::{DEFAULT_MAX_TEST_RUNS, REAUTH_HINT};
use docwright::document::{
    RepairCycle, Section, SectionKind, SectionState, ValidationOutcome, VALIDATED_AT_KEY,
    VALIDATION_ATTEMPTS_KEY,
};
use docwright::store::Artifact;
use docwright::testing::{workbench, ScriptedConsole, ScriptedGenerator, ScriptedValidator};

const GENERIC: &str = "Error: step 3 returned exit status 1";
const EXPIRED: &str = "ERROR: AADSTS70043: The refresh token has expired due to inactivity.";

struct Fixture {
    _dir: tempfile::TempDir,
    generator: Arc<ScriptedGenerator>,
    validator: Arc<ScriptedValidator>,
    console: Arc<ScriptedConsole>,
    bench: docwright::Workbench,
}

fn fixture(validator: ScriptedValidator) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let generator = Arc::new(ScriptedGenerator::new(Vec::<String>::new()));
    let validator = Arc::new(validator);
    let console = Arc::new(ScriptedConsole::new(Vec::<String>::new()));
    let bench = workbench(
        dir.path(),
        generator.clone(),
        validator.clone(),
        console.clone(),
    );
    bench
        .store
        .save("Doc", Artifact::Section(SectionKind::Deployment), "## Deployment\n```bash\naz group create\n```")
        .unwrap();
    Fixture {
        _dir: dir,
        generator,
        validator,
        console,
        bench,
    }
}

#[tokio::test]
async fn test_always_failing_validator_uses_whole_budget() {
    let f = fixture(ScriptedValidator::always_fail(GENERIC));
    let mut section = Section::new(SectionKind::Deployment);

    let passed = RepairCycle::new(&f.bench)
        .run(&mut section, "Doc", true)
        .await
        .unwrap();

    assert!(!passed);
    assert!(!section.passed);
    assert_eq!(f.validator.attempts(), DEFAULT_MAX_TEST_RUNS);
    assert_eq!(section.error_log.len(), DEFAULT_MAX_TEST_RUNS);
    assert!(section.error_log.iter().all(|e| e.message == GENERIC));
    assert_eq!(section.state(), SectionState::Abandoned);

    // Every failure went back to the backend as a repair request
    assert_eq!(f.generator.call_count(), DEFAULT_MAX_TEST_RUNS);
    for message in f.generator.user_messages() {
        assert!(message.contains("Fix this error, thrown when executing the document."));
        assert!(message.contains(GENERIC));
    }
}

#[tokio::test]
async fn test_custom_budget_is_respected() {
    let mut f = fixture(ScriptedValidator::always_fail(GENERIC));
    f.bench.max_attempts = 3;
    let mut section = Section::new(SectionKind::Deployment);

    RepairCycle::new(&f.bench)
        .run(&mut section, "Doc", true)
        .await
        .unwrap();

    assert_eq!(f.validator.attempts(), 3);
    assert_eq!(section.error_log.len(), 3);
}

#[tokio::test]
async fn test_expired_credential_stops_at_that_attempt() {
    let k = 3;
    let f = fixture(ScriptedValidator::new(
        vec![
            ValidationOutcome::failed("", GENERIC),
            ValidationOutcome::failed("", GENERIC),
            ValidationOutcome::failed("", EXPIRED),
        ],
        ValidationOutcome::passed("ok"),
    ));
    let mut section = Section::new(SectionKind::Deployment);

    let passed = RepairCycle::new(&f.bench)
        .run(&mut section, "Doc", true)
        .await
        .unwrap();

    assert!(!passed);
    assert_eq!(f.validator.attempts(), k);
    assert_eq!(section.error_log.len(), k);
    // No repair after the credential failure
    assert_eq!(f.generator.call_count(), k - 1);
    assert!(f.console.errors().iter().any(|e| e == REAUTH_HINT));
}

#[tokio::test]
async fn test_expired_credential_on_first_attempt() {
    let f = fixture(ScriptedValidator::always_fail(EXPIRED));
    let mut section = Section::new(SectionKind::Deployment);

    let passed = RepairCycle::new(&f.bench)
        .run(&mut section, "Doc", true)
        .await
        .unwrap();

    assert!(!passed);
    assert_eq!(f.validator.attempts(), 1);
    assert_eq!(section.error_log.len(), 1);
    assert_eq!(f.generator.call_count(), 0);
}

#[tokio::test]
async fn test_eventual_success_after_k_attempts() {
    for k in [1, 4, DEFAULT_MAX_TEST_RUNS] {
        let f = fixture(ScriptedValidator::pass_after(k - 1, GENERIC));
        let mut section = Section::new(SectionKind::Deployment);

        let passed = RepairCycle::new(&f.bench)
            .run(&mut section, "Doc", true)
            .await
            .unwrap();

        assert!(passed, "k = {}", k);
        assert_eq!(f.validator.attempts(), k);
        assert_eq!(
            section.meta_data.get(VALIDATION_ATTEMPTS_KEY),
            Some(&k.to_string())
        );
        assert!(section.meta_data.contains_key(VALIDATED_AT_KEY));
        assert_eq!(section.error_log.len(), k - 1);
        assert_eq!(section.state(), SectionState::Passed);
    }
}

#[tokio::test]
async fn test_repair_rewrites_the_validated_file() {
    let f = fixture(ScriptedValidator::pass_after(1, GENERIC));
    let mut section = Section::new(SectionKind::Deployment);

    RepairCycle::new(&f.bench)
        .run(&mut section, "Doc", true)
        .await
        .unwrap();

    let path = f
        .bench
        .store
        .artifact_path("Doc", Artifact::Section(SectionKind::Deployment));
    assert!(f.validator.paths().iter().all(|p| p == &path));
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "generated 1",
        "the repaired content replaces the failing content"
    );
}

#[tokio::test]
async fn test_fresh_cycle_clears_previous_log() {
    let f = fixture(ScriptedValidator::pass_after(2, GENERIC));
    let mut section = Section::new(SectionKind::Deployment);
    let cycle = RepairCycle::new(&f.bench);

    cycle.run(&mut section, "Doc", true).await.unwrap();
    assert_eq!(section.error_log.len(), 2);

    // The script is exhausted, so the second cycle passes straight away
    cycle.run(&mut section, "Doc", true).await.unwrap();
    assert!(section.error_log.is_empty());
    assert!(section.passed);
}

#[tokio::test]
async fn test_interactive_repair_appends_user_guidance() {
    let dir = tempfile::tempdir().unwrap();
    let generator = Arc::new(ScriptedGenerator::new(Vec::<String>::new()));
    let console = Arc::new(ScriptedConsole::new(["use eastus instead"]));
    let bench = workbench(
        dir.path(),
        generator.clone(),
        Arc::new(ScriptedValidator::pass_after(1, GENERIC)),
        console,
    );
    bench
        .store
        .save("Doc", Artifact::Section(SectionKind::Deployment), "broken")
        .unwrap();

    let mut section = Section::new(SectionKind::Deployment);
    assert!(RepairCycle::new(&bench)
        .run(&mut section, "Doc", false)
        .await
        .unwrap());

    let request = &generator.user_messages()[0];
    assert!(request.contains(GENERIC));
    assert!(request.contains("use eastus instead"));
}
