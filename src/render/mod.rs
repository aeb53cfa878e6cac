// FormRelay - Section renderer
//
// Pure mapping from parsed content to display blocks. No I/O, no hidden state:
// rendering the same content twice yields identical blocks.

pub mod html;
pub mod markup;

use crate::content::{ParsedContent, Section};
use serde::Serialize;

pub use html::to_html;
pub use markup::{classify_line, Line, LineKind, Span};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayBlock {
    Heading { level: u8, text: String },
    UnorderedList { items: Vec<String> },
    OrderedList { items: Vec<NumberedItem> },
    Paragraph { lines: Vec<Line> },
}

/// An ordered-list entry. `number` is positional, never taken from the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumberedItem {
    pub number: usize,
    pub text: String,
}

/// Render parsed content into display blocks, title first.
pub fn render(content: &ParsedContent) -> Vec<DisplayBlock> {
    let mut blocks = Vec::with_capacity(content.sections.len() + 1);

    if !content.title.is_empty() {
        blocks.push(DisplayBlock::Heading {
            level: 1,
            text: content.title.clone(),
        });
    }

    blocks.extend(content.sections.iter().map(render_section));
    blocks
}

fn render_section(section: &Section) -> DisplayBlock {
    match section {
        Section::Heading(text) => DisplayBlock::Heading {
            level: 2,
            text: text.clone(),
        },
        Section::BulletList(items) => DisplayBlock::UnorderedList {
            items: items.clone(),
        },
        Section::NumberedList(items) => DisplayBlock::OrderedList {
            items: items
                .iter()
                .enumerate()
                .map(|(i, text)| NumberedItem {
                    number: i + 1,
                    text: text.clone(),
                })
                .collect(),
        },
        Section::Paragraph(text) => DisplayBlock::Paragraph {
            lines: text.split('\n').map(classify_line).collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{parse, ContentKind};

    #[test]
    fn test_food_blocks() {
        let parsed = parse(
            ContentKind::Food,
            "Omelette\n#Ingredients\nEgg\n#Instructions\n3. Whisk\n1. Cook",
        );
        let blocks = render(&parsed);

        assert_eq!(
            blocks[0],
            DisplayBlock::Heading {
                level: 1,
                text: "Omelette".into()
            }
        );
        assert_eq!(
            blocks[2],
            DisplayBlock::UnorderedList {
                items: vec!["Egg".into()]
            }
        );
        assert_eq!(
            blocks[4],
            DisplayBlock::OrderedList {
                items: vec![
                    NumberedItem {
                        number: 1,
                        text: "3. Whisk".into()
                    },
                    NumberedItem {
                        number: 2,
                        text: "1. Cook".into()
                    },
                ]
            }
        );
        assert_eq!(blocks[6], DisplayBlock::UnorderedList { items: vec![] });
    }

    #[test]
    fn test_bullet_order_and_duplicates_kept() {
        let content = ParsedContent {
            title: String::new(),
            sections: vec![Section::BulletList(vec!["b".into(), "a".into(), "b".into()])],
            ..Default::default()
        };
        assert_eq!(
            render(&content),
            vec![DisplayBlock::UnorderedList {
                items: vec!["b".into(), "a".into(), "b".into()]
            }]
        );
    }

    #[test]
    fn test_paragraph_keeps_every_line() {
        let parsed = parse(ContentKind::Story, "Tale\nOne\n\nTwo");
        let blocks = render(&parsed);
        let DisplayBlock::Paragraph { lines } = &blocks[1] else {
            panic!("expected paragraph, got {:?}", blocks[1]);
        };
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["One", "", "Two"]);
        assert_eq!(lines[1].kind, LineKind::Break);
    }

    #[test]
    fn test_render_is_idempotent() {
        let text = "Plan\n# Goals\n- **Grow** fast\n1. Hire\n\nDone";
        for kind in ContentKind::ALL {
            let first = render(&parse(kind, text));
            let second = render(&parse(kind, text));
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_empty_title_has_no_heading() {
        let blocks = render(&parse(ContentKind::Business, ""));
        assert!(blocks.is_empty());
    }
}
