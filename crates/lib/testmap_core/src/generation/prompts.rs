//! Prompt templates and reply parsing for the generation capability.

use crate::store::SimilarityMatch;

/// Prompt asking for a one-paragraph description of a UI regression test.
pub fn describe_test(source: &str) -> String {
    format!(
        "Analyze the following automated UI regression test and write a concise description \
         of the functionality it verifies. Do not explain which framework or libraries it uses, \
         and ignore logging and screenshot capture.\n\
         Example: \"Probabilities.cs - Includes 4 tests - Verifies that inserting, updating and \
         deleting records in the probabilities grid works and that generating defaults works.\"\n\n\
         {source}"
    )
}

/// Prompt drafting a new test scenario for an uncovered issue report.
pub fn new_test_for_issue(issue_type: &str, title: &str, description: &str) -> String {
    format!(
        "You are a QA engineer. The following {issue_type} is not covered by any existing \
         automated test.\n\
         Title: {title}\n\
         Description: {description}\n\n\
         Describe a concise automated test that should be created for it: its purpose, \
         the key steps, and the assertions needed to verify the behavior."
    )
}

/// Prompt drafting a new test scenario placed in a known module/application.
pub fn new_test_for_module(issue: &str, module: &str, app_name: Option<&str>) -> String {
    let location = match app_name {
        Some(app) if !app.trim().is_empty() => {
            format!("the '{module}' module of the '{app}' application")
        }
        _ => format!("the '{module}' module"),
    };
    format!(
        "You are a QA engineer. Given a bug or feature request, describe a concise automated \
         test that should be created in {location}. Focus on the test's purpose, key steps, \
         and the assertions needed to verify the behavior.\n\n\
         Request: {issue}\n\n\
         Start with: \"A new test should be created for {location} that verifies ...\""
    )
}

/// Numbered-choice prompt asking the model to pick the best candidate or `None`.
pub fn rank_candidates(
    issue_type: &str,
    title: &str,
    description: &str,
    candidates: &[SimilarityMatch],
) -> String {
    let list = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                "{}. {} (Module={}, App={}, Similarity={:.2})",
                i + 1,
                c.test_name,
                c.module,
                c.app,
                c.similarity
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a QA assistant. Given the reported issue and the existing test cases below, \
         choose the single test case number that best matches the issue, or reply 'None' if \
         no existing test applies.\n\n\
         Type: {issue_type}\n\
         Title: {title}\n\
         Description: {description}\n\n\
         Existing Tests:\n\
         {list}\n\n\
         Respond with the test number (1-{count}) or 'None', followed by a brief justification.",
        count = candidates.len()
    )
}

/// Interpret a ranking reply.
///
/// Returns the zero-based index of the chosen candidate, or `None` when the
/// reply declines (`None ...`), names no number, or names one outside
/// `1..=count`.
pub fn parse_choice(reply: &str, count: usize) -> Option<usize> {
    let first_line = reply
        .lines()
        .map(|l| l.trim_start_matches(|c: char| c == '*' || c == '#' || c.is_whitespace()))
        .find(|l| !l.is_empty())?;

    if first_line.to_ascii_lowercase().starts_with("none") {
        return None;
    }

    let digits: String = first_line
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    let choice: usize = digits.parse().ok()?;
    (1..=count).contains(&choice).then(|| choice - 1)
}
