//! Record templates
//!
//! Templates are plain record text with `{NUMBER}`, `{TITLE}` and `{DATE}`
//! placeholders. `adrman init` writes the short and long template for the
//! configured language into the records directory.

/// Short and long template of one language
#[derive(Debug, Clone, Copy)]
pub struct TemplateSet {
    pub short: &'static str,
    pub long: &'static str,
}

/// File name of the short template inside the records directory.
pub const SHORT_TEMPLATE_FILE: &str = "template-short.md";

/// File name of the long template inside the records directory.
pub const LONG_TEMPLATE_FILE: &str = "template-long.md";

const SHORT_EN: &str = r#"# {NUMBER}. {TITLE}

Date: {DATE}

## Status

{DATE} Proposed

## Context

What is the issue that we're seeing that is motivating this decision or change?

## Decision

What is the change that we're proposing and/or doing?

## Consequences

What becomes easier or more difficult to do because of this change?
"#;

const LONG_EN: &str = r#"# {NUMBER}. {TITLE}

Date: {DATE}

## Status

{DATE} Proposed

## Context and Problem Statement

Describe the context and problem statement, e.g., in free form using two to
three sentences. You may want to articulate the problem in form of a question.

## Decision Drivers

* driver 1, e.g., a force, facing concern, ...
* driver 2, e.g., a force, facing concern, ...

## Considered Options

* option 1
* option 2
* option 3

## Decision Outcome

Chosen option: "option 1", because justification, e.g., only option which
meets k.o. criterion decision driver | which resolves force | ... | comes out
best (see below).

### Positive Consequences

* e.g., improvement of quality attribute satisfaction, follow-up decisions
  required, ...

### Negative Consequences

* e.g., compromising quality attribute, follow-up decisions required, ...

## Pros and Cons of the Options

### option 1

* Good, because argument a
* Bad, because argument b

### option 2

* Good, because argument a
* Bad, because argument b

## Links

* Link type, link to record
"#;

const SHORT_DE: &str = r#"# {NUMBER}. {TITLE}

Datum: {DATE}

## Status

{DATE} Proposed

## Kontext

Welches Problem motiviert diese Entscheidung oder Änderung?

## Entscheidung

Welche Änderung schlagen wir vor oder setzen wir um?

## Konsequenzen

Was wird durch diese Änderung einfacher oder schwieriger?
"#;

const LONG_DE: &str = r#"# {NUMBER}. {TITLE}

Datum: {DATE}

## Status

{DATE} Proposed

## Kontext und Problemstellung

Beschreibung des Kontexts und der Problemstellung in zwei bis drei Sätzen,
gerne auch in Form einer Frage.

## Entscheidungskriterien

* Kriterium 1
* Kriterium 2

## Betrachtete Optionen

* Option 1
* Option 2

## Entscheidung

Gewählte Option: "Option 1", weil Begründung.

### Positive Konsequenzen

* ...

### Negative Konsequenzen

* ...

## Links

* Art der Verknüpfung, Link zum Record
"#;

/// Text of the first record created by `adrman init`.
pub const FIRST_RECORD: &str = r#"# {NUMBER}. {TITLE}

Date: {DATE}

## Status

{DATE} Accepted

## Context

We need to record the architectural decisions made on this project.

## Decision

We will use Architecture Decision Records, as described by Michael Nygard in
this article: http://thinkrelevance.com/blog/2011/11/15/documenting-architecture-decisions

## Consequences

See Michael Nygard's article, linked above.
"#;

/// Title of the first record.
pub const FIRST_RECORD_TITLE: &str = "Record architecture decisions";

/// Templates for `language`, falling back to English.
pub fn for_language(language: &str) -> TemplateSet {
    match language.to_ascii_lowercase().as_str() {
        "de" => TemplateSet {
            short: SHORT_DE,
            long: LONG_DE,
        },
        _ => TemplateSet {
            short: SHORT_EN,
            long: LONG_EN,
        },
    }
}

/// Whether templates exist for `language` (otherwise English is used).
pub fn is_supported_language(language: &str) -> bool {
    matches!(language.to_ascii_lowercase().as_str(), "en" | "de")
}

/// Values substituted into a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVars<'a> {
    pub number: &'a str,
    pub title: &'a str,
    pub date: &'a str,
}

/// Replace every placeholder in `template`.
///
/// Both `{NUMBER}` and the older `{{.NUMBER}}` spelling are understood.
pub fn render(template: &str, vars: &TemplateVars<'_>) -> String {
    [
        ("NUMBER", vars.number),
        ("TITLE", vars.title),
        ("DATE", vars.date),
    ]
    .iter()
    .fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{{.{}}}}}", name), value)
            .replace(&format!("{{{}}}", name), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{extract_heading_info, read_status_entries};

    fn vars() -> TemplateVars<'static> {
        TemplateVars {
            number: "0003",
            title: "Use widgets",
            date: "2023-06-15",
        }
    }

    #[test]
    fn test_render_replaces_all_placeholders() {
        let text = render(SHORT_EN, &vars());
        assert!(!text.contains('{'));
        assert!(text.starts_with("# 0003. Use widgets\n"));
        assert!(text.contains("2023-06-15 Proposed"));
    }

    #[test]
    fn test_render_legacy_placeholders() {
        let text = render("# {{.NUMBER}}. {{.TITLE}}\n\n{{.DATE}}", &vars());
        assert_eq!(text, "# 0003. Use widgets\n\n2023-06-15");
    }

    #[test]
    fn test_every_template_yields_a_parsable_record() {
        for lang in ["en", "de"] {
            let set = for_language(lang);
            for template in [set.short, set.long, FIRST_RECORD] {
                let text = render(template, &vars());
                let info = extract_heading_info(&text).unwrap();
                assert_eq!(info.index, 3);
                assert_eq!(info.title, "Use widgets");
                assert_eq!(read_status_entries(&text).unwrap().len(), 1);
            }
        }
    }

    #[test]
    fn test_unknown_language_falls_back_to_english() {
        assert!(!is_supported_language("fr"));
        assert_eq!(for_language("fr").short, SHORT_EN);
        assert_eq!(for_language("DE").short, SHORT_DE);
    }
}
