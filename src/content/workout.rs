// FormRelay - Workout plan normalization
//
// The workout engine sometimes answers with a JSON document instead of prose.
// Such documents are flattened into markdown before parsing.

use serde_json::Value;

/// Return `text` as markdown: JSON objects are converted, anything else passes through.
pub fn normalize(text: &str) -> String {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
            return to_markdown(&value);
        }
    }
    text.to_string()
}

/// JavaScript-style truthiness: null, false, 0 and "" are absent.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Convert a workout document into markdown.
///
/// Recognized keys: `title`, `description`, `details` (string or map),
/// `exercises` (string, or list of strings / exercise objects), `notes`
/// (string or list) and `cooldown`.
pub fn to_markdown(doc: &Value) -> String {
    let mut md = String::new();

    if let Some(title) = present(doc.get("title")) {
        md.push_str(&format!("# {}\n\n", display(title)));
    }

    if let Some(description) = present(doc.get("description")) {
        md.push_str(&format!("{}\n\n", display(description)));
    }

    if let Some(details) = present(doc.get("details")) {
        md.push_str("## Workout Details\n\n");
        match details {
            Value::Object(map) => {
                for (key, value) in map {
                    md.push_str(&format!("- **{}**: {}\n", key, display(value)));
                }
                md.push('\n');
            }
            other => md.push_str(&format!("{}\n\n", display(other))),
        }
    }

    if let Some(exercises) = present(doc.get("exercises")) {
        md.push_str("## Exercises\n\n");
        match exercises {
            Value::Array(items) => {
                for (i, exercise) in items.iter().enumerate() {
                    push_exercise(&mut md, i + 1, exercise);
                }
            }
            Value::String(s) => md.push_str(&format!("{}\n\n", s)),
            _ => {}
        }
    }

    if let Some(notes) = present(doc.get("notes")) {
        md.push_str("## Additional Notes\n\n");
        match notes {
            Value::Array(items) => {
                for note in items {
                    md.push_str(&format!("- {}\n", display(note)));
                }
            }
            other => md.push_str(&format!("{}\n", display(other))),
        }
        md.push('\n');
    }

    if let Some(cooldown) = present(doc.get("cooldown")) {
        md.push_str(&format!("## Cool Down\n\n{}\n\n", display(cooldown)));
    }

    md
}

fn push_exercise(md: &mut String, number: usize, exercise: &Value) {
    if let Value::String(s) = exercise {
        md.push_str(&format!("{}. {}\n", number, s));
        return;
    }

    let name = present(exercise.get("name"))
        .map(display)
        .unwrap_or_else(|| "Exercise".to_string());
    md.push_str(&format!("### {}. {}\n", number, name));

    for (key, label) in [
        ("sets", "Sets"),
        ("reps", "Reps"),
        ("duration", "Duration"),
        ("description", "Description"),
    ] {
        if let Some(v) = present(exercise.get(key)) {
            md.push_str(&format!("- {}: {}\n", label, display(v)));
        }
    }
    md.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(normalize("Leg Day\nSquats"), "Leg Day\nSquats");
        assert_eq!(normalize("{not json"), "{not json");
    }

    #[test]
    fn test_full_document() {
        let doc = json!({
            "title": "Upper Body",
            "description": "Push and pull.",
            "details": {"difficulty": "hard"},
            "exercises": [
                "Warm up",
                {"name": "Push-ups", "sets": 3, "reps": 12},
                {"duration": "1 min"}
            ],
            "notes": ["Hydrate", "Rest"],
            "cooldown": "Stretch"
        });

        let md = to_markdown(&doc);
        assert_eq!(
            md,
            "# Upper Body\n\n\
             Push and pull.\n\n\
             ## Workout Details\n\n- **difficulty**: hard\n\n\
             ## Exercises\n\n\
             1. Warm up\n\
             ### 2. Push-ups\n- Sets: 3\n- Reps: 12\n\n\
             ### 3. Exercise\n- Duration: 1 min\n\n\
             ## Additional Notes\n\n- Hydrate\n- Rest\n\n\
             ## Cool Down\n\nStretch\n\n"
        );
    }

    #[test]
    fn test_falsy_fields_are_skipped() {
        let doc = json!({"title": "", "description": null, "notes": "Go slow", "cooldown": 0});
        assert_eq!(to_markdown(&doc), "## Additional Notes\n\nGo slow\n\n");
    }

    #[test]
    fn test_string_details_and_exercises() {
        let doc = json!({"details": "45 minutes", "exercises": "Run 5k"});
        assert_eq!(
            to_markdown(&doc),
            "## Workout Details\n\n45 minutes\n\n## Exercises\n\nRun 5k\n\n"
        );
    }
}
