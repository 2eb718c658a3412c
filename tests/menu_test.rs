// Menu-driven generation and backlog bookkeeping

use std::sync::Arc;

use docwright::cli::run_menu;
use docwright::ideas::{Bucket, IdeaBacklog};
use docwright::testing::{workbench, ScriptedConsole, ScriptedGenerator, ScriptedValidator};

#[tokio::test]
async fn test_candidate_that_passes_moves_to_passed() {
    let dir = tempfile::tempdir().unwrap();
    let backlog = IdeaBacklog::open(dir.path().join("ideas")).unwrap();
    backlog.add_candidate("Create a VM", "Linux VM").unwrap();

    let console = Arc::new(ScriptedConsole::new(["1", "3"]));
    let bench = workbench(
        dir.path(),
        Arc::new(ScriptedGenerator::new(Vec::<String>::new())),
        Arc::new(ScriptedValidator::always_pass()),
        console.clone(),
    );

    run_menu(&bench, &backlog).await.unwrap();

    assert!(backlog.entries(Bucket::Candidates).unwrap().is_empty());
    let passed = backlog.entries(Bucket::Passed).unwrap();
    assert_eq!(passed.len(), 1);
    assert!(passed[0].tests_passed);
    assert_eq!(
        passed[0].filename.as_deref(),
        Some(bench.store.markdown_path("Create a VM").to_string_lossy().as_ref())
    );
    // Automatic generation asks nothing beyond the two menu prompts
    assert_eq!(console.questions().len(), 2);
}

#[tokio::test]
async fn test_candidate_that_fails_moves_to_failed_and_opens_markdown() {
    let dir = tempfile::tempdir().unwrap();
    let backlog = IdeaBacklog::open(dir.path().join("ideas")).unwrap();
    backlog.add_candidate("Create a VM", "Linux VM").unwrap();

    let console = Arc::new(ScriptedConsole::new(["1"]));
    let bench = workbench(
        dir.path(),
        Arc::new(ScriptedGenerator::new(Vec::<String>::new())),
        Arc::new(ScriptedValidator::always_fail("exit status 1")),
        console.clone(),
    );

    // Empty answer after the run exits the menu
    run_menu(&bench, &backlog).await.unwrap();

    let failed = backlog.entries(Bucket::Failed).unwrap();
    assert_eq!(failed.len(), 1);
    assert!(!failed[0].tests_passed);
    assert_eq!(
        console.opened(),
        vec![bench.store.markdown_path("Create a VM")]
    );
}

#[tokio::test]
async fn test_declined_candidate_is_recorded_as_failed() {
    let dir = tempfile::tempdir().unwrap();
    let backlog = IdeaBacklog::open(dir.path().join("ideas")).unwrap();
    backlog.add_candidate("Blocked", "d").unwrap();

    let console = Arc::new(ScriptedConsole::new(["1"]));
    let bench = workbench(
        dir.path(),
        Arc::new(ScriptedGenerator::declining()),
        Arc::new(ScriptedValidator::always_pass()),
        console.clone(),
    );

    run_menu(&bench, &backlog).await.unwrap();

    assert_eq!(backlog.entries(Bucket::Failed).unwrap().len(), 1);
    assert!(!console.errors().is_empty());
}

#[tokio::test]
async fn test_add_candidate_through_menu() {
    let dir = tempfile::tempdir().unwrap();
    let backlog = IdeaBacklog::open(dir.path().join("ideas")).unwrap();

    // Empty backlog: 1 = list, 2 = add, 3 = exit
    let console = Arc::new(ScriptedConsole::new(["2", "New idea", "Its description", "3"]));
    let bench = workbench(
        dir.path(),
        Arc::new(ScriptedGenerator::new(Vec::<String>::new())),
        Arc::new(ScriptedValidator::always_pass()),
        console,
    );

    run_menu(&bench, &backlog).await.unwrap();

    let candidates = backlog.entries(Bucket::Candidates).unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].title, "New idea");
    assert_eq!(candidates[0].description, "Its description");
}

#[tokio::test]
async fn test_invalid_choice_warns_and_reprompts() {
    let dir = tempfile::tempdir().unwrap();
    let backlog = IdeaBacklog::open(dir.path().join("ideas")).unwrap();

    let console = Arc::new(ScriptedConsole::new(["seven", "42", "3"]));
    let bench = workbench(
        dir.path(),
        Arc::new(ScriptedGenerator::new(Vec::<String>::new())),
        Arc::new(ScriptedValidator::always_pass()),
        console.clone(),
    );

    run_menu(&bench, &backlog).await.unwrap();
    assert_eq!(console.questions().len(), 3);
}
