// Numbered idea-backlog menu
//
// Candidates are generated automatically; failed entries are regenerated
// interactively, which reuses the stored sections and reopens the edit loop
// and the repair cycle.

use anyhow::Result;

use crate::document::{Document, Workbench};
use crate::ideas::{Bucket, IdeaBacklog, IdeaEntry};

/// What a menu number selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Candidate(usize),
    Failed(usize),
    ListGenerated,
    AddCandidate,
    Exit,
}

/// One numbered menu line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub number: usize,
    pub label: String,
    pub choice: MenuChoice,
}

/// Number every entry, then the fixed actions. Numbers are distinct and start at 1.
pub fn menu_items(candidates: &[IdeaEntry], failed: &[IdeaEntry], passed: usize) -> Vec<MenuItem> {
    let entry_label = |e: &IdeaEntry| format!("{}\n\t{}", e.title, e.description);

    let mut items: Vec<MenuItem> = Vec::new();
    let mut push = |label: String, choice: MenuChoice| {
        items.push(MenuItem {
            number: items.len() + 1,
            label,
            choice,
        });
    };

    for (i, entry) in candidates.iter().enumerate() {
        push(entry_label(entry), MenuChoice::Candidate(i));
    }
    for (i, entry) in failed.iter().enumerate() {
        push(entry_label(entry), MenuChoice::Failed(i));
    }
    push(
        format!("List {} generated documents", passed),
        MenuChoice::ListGenerated,
    );
    push("Add a candidate document.".to_string(), MenuChoice::AddCandidate);
    push("Exit".to_string(), MenuChoice::Exit);
    items
}

/// Map user input to a choice; `None` for anything that isn't a listed number
pub fn parse_choice(input: &str, items: &[MenuItem]) -> Option<MenuChoice> {
    let number: usize = input.trim().trim_end_matches('.').parse().ok()?;
    items
        .iter()
        .find(|item| item.number == number)
        .map(|item| item.choice)
}

fn render(bench: &Workbench, items: &[MenuItem]) {
    let console = bench.console.as_ref();
    console.info("Menu:");

    let mut heading = None;
    for item in items {
        let section = match item.choice {
            MenuChoice::Candidate(_) => Some("Generate a document from the ideas list:"),
            MenuChoice::Failed(_) => Some("Edit a document that failed tests:"),
            _ => None,
        };
        if section.is_some() && section != heading {
            if let Some(text) = section {
                console.info(text);
            }
            heading = section;
        }
        console.info(&format!("{}. {}", item.number, item.label));
    }
}

/// Run the menu until the user exits (an empty answer also exits)
pub async fn run_menu(bench: &Workbench, backlog: &IdeaBacklog) -> Result<()> {
    loop {
        let candidates = backlog.entries(Bucket::Candidates)?;
        let failed = backlog.entries(Bucket::Failed)?;
        let passed = backlog.entries(Bucket::Passed)?;
        let items = menu_items(&candidates, &failed, passed.len());
        render(bench, &items);

        let answer = bench.console.ask("Enter your choice:")?;
        if answer.trim().is_empty() {
            return Ok(());
        }
        let Some(choice) = parse_choice(&answer, &items) else {
            bench
                .console
                .warning("Invalid choice. Please enter one of the listed numbers.");
            continue;
        };

        match choice {
            MenuChoice::Exit => return Ok(()),
            MenuChoice::AddCandidate => {
                let title = bench.console.ask("Enter title:")?;
                let description = bench.console.ask("Enter description:")?;
                if title.trim().is_empty() {
                    bench.console.warning("A candidate needs a title.");
                    continue;
                }
                backlog.add_candidate(title.trim(), description.trim())?;
                bench.console.info("Entry added successfully.");
            }
            MenuChoice::ListGenerated => {
                bench.console.title("Generated documents", 2);
                if passed.is_empty() {
                    bench.console.say("No generated documents available.");
                } else {
                    for (i, entry) in passed.iter().enumerate() {
                        bench.console.say(&format!(
                            "{}. {}\n\t{}",
                            i + 1,
                            entry.title,
                            entry.filename.as_deref().unwrap_or_default()
                        ));
                    }
                }
                bench.console.ask("Press Enter to continue...")?;
            }
            MenuChoice::Candidate(index) => {
                generate_entry(bench, backlog, Bucket::Candidates, index, &candidates[index], true)
                    .await?;
            }
            MenuChoice::Failed(index) => {
                generate_entry(bench, backlog, Bucket::Failed, index, &failed[index], false)
                    .await?;
            }
        }
    }
}

/// Generate the document for one backlog entry and record where it ended up
pub async fn generate_entry(
    bench: &Workbench,
    backlog: &IdeaBacklog,
    bucket: Bucket,
    index: usize,
    entry: &IdeaEntry,
    auto: bool,
) -> Result<bool> {
    bench
        .console
        .info(&format!("Generating document for: {}", entry.title));

    let mut document = Document::new(
        Some(entry.title.clone()),
        Some(entry.description.clone()),
        None,
        auto,
    );
    let passed = match document.generate(bench).await {
        Ok(()) => document.all_tests_passed(),
        Err(e) => {
            tracing::error!("Generation of '{}' failed: {:#}", entry.title, e);
            bench.console.error(&format!("{:#}", e));
            false
        }
    };

    let markdown = bench.store.markdown_path(document.title());
    backlog.record_outcome(bucket, index, &markdown, passed)?;

    if passed {
        bench
            .console
            .success("Document generated and tested successfully.");
    } else {
        bench.console.warning("Document generated, but tests failed.");
        if auto && markdown.exists() {
            bench.console.info("Opening document for editing...");
            bench.console.open_for_editing(&markdown)?;
        }
    }
    Ok(passed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(titles: &[&str]) -> Vec<IdeaEntry> {
        titles.iter().map(|t| IdeaEntry::new(*t, "d")).collect()
    }

    #[test]
    fn test_numbers_are_distinct_and_sequential() {
        let items = menu_items(&entries(&["A", "B"]), &entries(&["C"]), 4);
        let numbers: Vec<_> = items.iter().map(|i| i.number).collect();
        assert_eq!(numbers, [1, 2, 3, 4, 5, 6]);
        assert_eq!(items[2].choice, MenuChoice::Failed(0));
        assert_eq!(items[3].choice, MenuChoice::ListGenerated);
        assert_eq!(items[3].label, "List 4 generated documents");
        assert_eq!(items[4].choice, MenuChoice::AddCandidate);
        assert_eq!(items[5].choice, MenuChoice::Exit);
    }

    #[test]
    fn test_empty_backlog_has_only_actions() {
        let items = menu_items(&[], &[], 0);
        assert_eq!(items.len(), 3);
        assert_eq!(parse_choice("3", &items), Some(MenuChoice::Exit));
    }

    #[test]
    fn test_parse_choice() {
        let items = menu_items(&entries(&["A"]), &[], 0);
        assert_eq!(parse_choice(" 1 ", &items), Some(MenuChoice::Candidate(0)));
        assert_eq!(parse_choice("2.", &items), Some(MenuChoice::ListGenerated));
        assert_eq!(parse_choice("0", &items), None);
        assert_eq!(parse_choice("9", &items), None);
        assert_eq!(parse_choice("one", &items), None);
    }
}
