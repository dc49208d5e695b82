//! Plain-text rendering of an [`Answer`].
use std::fmt::Write;

use crate::answer::Answer;

const RULE_WIDTH: usize = 60;

fn heading(out: &mut String, title: &str) {
    let rule = "=".repeat(RULE_WIDTH);
    let _ = writeln!(out, "{rule}\n{title}\n{rule}");
}

/// Render the answer followed by its sources, split by origin.
#[must_use]
pub fn render(answer: &Answer) -> String {
    let mut out = String::new();

    heading(&mut out, "Answer");
    let _ = writeln!(out, "\n{}\n", answer.answer.trim_end());

    heading(&mut out, "Sources Used");

    if !answer.has_sources() {
        out.push_str("(No specific sources cited)\n");
        return out;
    }

    if !answer.official.is_empty() {
        out.push_str("\nOfficial Documentation:\n");
        let mut n = 0;
        for url in answer.official.iter().filter_map(|s| s.url.as_deref()) {
            n += 1;
            let _ = writeln!(out, "  [{n}] {url}");
        }
        let unlinked = answer.official.iter().filter(|s| s.url.is_none()).count();
        if unlinked > 0 {
            let plural = if unlinked == 1 { "" } else { "s" };
            let _ = writeln!(out, "  {unlinked} document{plural} from MCP search");
        }
    }

    if !answer.web.is_empty() {
        out.push_str("\nWeb Sources (may include outdated information):\n");
        for (i, url) in answer.web.iter().filter_map(|s| s.url.as_deref()).enumerate() {
            let _ = writeln!(out, "  [{}] {url}", i + 1);
        }
        out.push_str("\n  Note: Web results may reference deprecated features.\n");
        out.push_str("  Always verify against official documentation.\n");
    }

    out
}
