// FormRelay - Content response parser
//
// Deterministic, infallible text segmentation. The first line is always the
// title; what happens to the rest depends on the content kind.

use super::{workout, ContentKind, Metadata, ParsedContent, Section};

/// Average reading speed used for the story reading-time estimate.
const WORDS_PER_MINUTE: usize = 200;

pub const INGREDIENTS: &str = "Ingredients";
pub const INSTRUCTIONS: &str = "Instructions";
pub const TIPS: &str = "Tips for Extra Love";

/// Parse upstream result text for display. Never fails.
pub fn parse(kind: ContentKind, text: &str) -> ParsedContent {
    match kind {
        ContentKind::Story => parse_story(text),
        ContentKind::Food => parse_food(text),
        ContentKind::Business => parse_document(text),
        ContentKind::Workout => parse_workout(text),
    }
}

/// Split off the trimmed first line; the remaining lines are returned untouched.
fn split_title(text: &str) -> (String, Vec<&str>) {
    let mut lines = text.split('\n');
    let title = lines.next().unwrap_or_default().trim().to_string();
    (title, lines.collect())
}

fn body_text(lines: &[&str]) -> String {
    lines.join("\n").trim().to_string()
}

fn narrative(title: String, body: String, metadata: Metadata) -> ParsedContent {
    let sections = if body.is_empty() {
        Vec::new()
    } else {
        vec![Section::Paragraph(body)]
    };
    ParsedContent {
        title,
        sections,
        metadata,
    }
}

fn parse_story(text: &str) -> ParsedContent {
    let (title, lines) = split_title(text);
    let body = body_text(&lines);
    let metadata = Metadata {
        reading_time_minutes: Some(reading_time_minutes(&body)),
        ..Metadata::default()
    };
    narrative(title, body, metadata)
}

fn parse_document(text: &str) -> ParsedContent {
    let (title, lines) = split_title(text);
    let body = body_text(&lines);
    narrative(title, body, Metadata::default())
}

/// Minutes to read `body`, rounded up. An empty body still counts as one minute.
pub fn reading_time_minutes(body: &str) -> usize {
    let words = body.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}

// ---------------------------------------------------------------------------
// Recipes
// ---------------------------------------------------------------------------

/// The three recipe lists a food result is reduced to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipe {
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub tips: Vec<String>,
}

/// Heading-marker scanner.
///
/// State is the currently open section plus every section seen so far, in
/// first-seen order. A heading line (`#...`) opens a section named by the line
/// with its first `#` removed; seeing the same name again restarts that
/// section. Non-blank lines are trimmed and appended to the open section.
/// Lines before the first heading, and lines under an empty heading, are
/// dropped.
#[derive(Debug, Default)]
pub struct SectionScanner {
    current: Option<usize>,
    sections: Vec<(String, Vec<String>)>,
}

impl SectionScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, line: &str) {
        if let Some(rest) = line.strip_prefix('#') {
            self.open(rest.trim());
            return;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }
        if let Some(idx) = self.current {
            self.sections[idx].1.push(trimmed.to_string());
        }
    }

    fn open(&mut self, name: &str) {
        let idx = match self.sections.iter().position(|(n, _)| n == name) {
            Some(idx) => {
                self.sections[idx].1.clear();
                idx
            }
            None => {
                self.sections.push((name.to_string(), Vec::new()));
                self.sections.len() - 1
            }
        };
        self.current = if name.is_empty() { None } else { Some(idx) };
    }

    /// Lines collected under `name` (exact, case-sensitive).
    #[cfg(test)]
    pub(crate) fn section(&self, name: &str) -> Option<&[String]> {
        self.sections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, items)| items.as_slice())
    }

    /// Section names in first-seen order.
    #[cfg(test)]
    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(n, _)| n.as_str())
    }

    pub fn take(&mut self, name: &str) -> Vec<String> {
        self.sections
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, items)| std::mem::take(items))
            .unwrap_or_default()
    }
}

/// Parse a recipe into its title and the three named lists.
pub fn parse_recipe(text: &str) -> (String, Recipe) {
    let (title, lines) = split_title(text);

    let mut scanner = SectionScanner::new();
    for line in lines {
        scanner.feed(line);
    }

    let recipe = Recipe {
        ingredients: scanner.take(INGREDIENTS),
        instructions: scanner.take(INSTRUCTIONS),
        tips: scanner.take(TIPS),
    };
    (title, recipe)
}

fn parse_food(text: &str) -> ParsedContent {
    let (title, recipe) = parse_recipe(text);
    let metadata = Metadata {
        ingredient_count: Some(recipe.ingredients.len()),
        ..Metadata::default()
    };

    ParsedContent {
        title,
        sections: vec![
            Section::Heading("Ingredients".to_string()),
            Section::BulletList(recipe.ingredients),
            Section::Heading("Instructions".to_string()),
            Section::NumberedList(recipe.instructions),
            Section::Heading("Tips".to_string()),
            Section::BulletList(recipe.tips),
        ],
        metadata,
    }
}

// ---------------------------------------------------------------------------
// Workout plans
// ---------------------------------------------------------------------------

fn parse_workout(text: &str) -> ParsedContent {
    let markdown = workout::normalize(text);
    let (first, lines) = split_title(&markdown);
    let title = first.trim_start_matches('#').trim().to_string();
    let body = body_text(&lines);
    narrative(title, body, Metadata::default())
}
