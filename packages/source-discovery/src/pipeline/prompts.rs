//! Prompt templates for source triage.

use crate::types::race::RaceMetadata;
use crate::types::source::Source;

/// Longest title embedded in a prompt line, in bytes.
const MAX_TITLE_LEN: usize = 160;

/// Longest URL embedded in a prompt line, in bytes.
const MAX_URL_LEN: usize = 300;

const TRIAGE_INSTRUCTIONS: &str = r#"You are triaging candidate information sources for an electoral race.
For each numbered source, decide whether it helps a voter research this race.

Return JSON: {"items": [{"i": <number>, "keep": <bool>, "priority": <0.0-1.0>, "category": "<category>", "official": <bool>, "notes": <string or null>}]}

Rules:
- "i" is the number shown in brackets. Annotate every source exactly once.
- "category" is one of: campaign, gov, news, social, blog, spam, other.
- "official" is true ONLY for a candidate's own campaign website (not news about them, not their government office page, not a social profile).
- "priority" is how useful the source is for understanding the candidates and their positions in this race.
- "keep" is false for spam, unrelated pages, and pages about a different race or a different person with the same name.
"#;

/// Build the triage prompt for one batch.
///
/// Sources are numbered from 0 in batch order; the model refers back to
/// them by that number.
pub fn build_triage_prompt(race: Option<&RaceMetadata>, batch: &[Source]) -> String {
    let mut prompt = String::from(TRIAGE_INSTRUCTIONS);

    prompt.push_str("\n## Race\n\n");
    match race {
        Some(race) => {
            prompt.push_str(&format!("State: {}\n", race.state_name()));
            prompt.push_str(&format!("Office: {}\n", race.office_label()));
            prompt.push_str(&format!("Year: {}\n", race.year));
            if let Some(district) = &race.district {
                prompt.push_str(&format!("District: {}\n", district));
            }
            if !race.candidates.is_empty() {
                prompt.push_str(&format!("Candidates: {}\n", race.candidates.join(", ")));
            }
        }
        None => prompt.push_str("Unknown\n"),
    }

    prompt.push_str("\n## Sources\n\n");
    for (i, source) in batch.iter().enumerate() {
        let title = source.title.as_deref().unwrap_or("(untitled)");
        prompt.push_str(&format!(
            "[{}] {} | {}\n",
            i,
            truncate(&source.url, MAX_URL_LEN),
            truncate(title, MAX_TITLE_LEN),
        ));
    }

    prompt
}

fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
