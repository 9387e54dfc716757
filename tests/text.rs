//! Tests for variable interpolation and link rendering.
use ahash::AHashMap;
use chatflow::prelude::*;
use chatflow::text::{self, RichSegment, Segment, Template};

fn store(pairs: &[(&str, &str)]) -> VariableStore {
    let mut store = VariableStore::new();
    for (name, value) in pairs {
        store.set(name, *value);
    }
    store
}

#[test]
fn test_segments_cover_the_input_exactly() {
    let samples = [
        "",
        "plain text",
        "Hello {{name}}!",
        "{{a}}{{b}}",
        "see [docs](docs.rs) and {{ x }}",
        "{{ unclosed",
        "{{{x}}}",
        "[no url]() {{}} [](empty)",
        "émoji 🎉 {{ nom }} [lien](exemple.fr)",
    ];
    for sample in samples {
        let joined: String = text::parse(sample).iter().map(Segment::raw).collect();
        assert_eq!(joined, sample, "segments do not cover {:?}", sample);
    }
}

#[test]
fn test_render_substitutes_known_and_blanks_unknown() {
    let alice = store(&[("name", "Alice")]);
    assert_eq!(text::render("Hello {{name}}", &alice, &text::no_overrides()), "Hello Alice");
    assert_eq!(
        text::render("Hello {{name}}", &VariableStore::new(), &text::no_overrides()),
        "Hello "
    );
}

#[test]
fn test_overrides_take_precedence() {
    let base = store(&[("name", "Alice"), ("city", "Paris")]);
    let mut overrides = AHashMap::new();
    overrides.insert("name".to_string(), "Bob".to_string());
    assert_eq!(
        text::render("{{name}} from {{city}}", &base, &overrides),
        "Bob from Paris"
    );
}

#[test]
fn test_case_insensitive_fallback_prefers_exact_match() {
    let values = store(&[("Name", "upper"), ("name", "lower")]);
    assert_eq!(text::render_plain("{{name}}", &values), "lower");
    assert_eq!(text::render_plain("{{Name}}", &values), "upper");
    assert_eq!(text::render_plain("{{NAME}}", &values), "upper");
}

#[test]
fn test_case_insensitive_fallback_folds_non_ascii_names() {
    let values = store(&[("ñame", "Bob"), ("endereço", "Rua A"), ("Straße", "x")]);
    assert_eq!(text::render_plain("{{Ñame}}", &values), "Bob");
    assert_eq!(text::render_plain("{{ENDEREÇO}}", &values), "Rua A");
    assert_eq!(text::render_plain("{{straße}}", &values), "x");

    let mut overrides = AHashMap::new();
    overrides.insert("Ação".to_string(), "ok".to_string());
    assert_eq!(text::render("{{AÇÃO}}", &VariableStore::new(), &overrides), "ok");
}

#[test]
fn test_links_are_kept_verbatim_in_plain_rendering() {
    let values = store(&[("who", "you")]);
    assert_eq!(
        text::render_plain("Hi {{who}}, see [site](example.com)", &values),
        "Hi you, see [site](example.com)"
    );
}

#[test]
fn test_rich_rendering_normalizes_link_urls() {
    let values = store(&[("who", "you")]);
    let segments = text::render_rich(
        "Hi {{who}}, see [site](example.com) or [x](https://x.com)",
        &values,
    );
    assert_eq!(
        segments,
        vec![
            RichSegment::Text {
                text: "Hi you, see ".to_string()
            },
            RichSegment::Link {
                label: "site".to_string(),
                url: "https://example.com".to_string()
            },
            RichSegment::Text {
                text: " or ".to_string()
            },
            RichSegment::Link {
                label: "x".to_string(),
                url: "https://x.com".to_string()
            },
        ]
    );
}

#[test]
fn test_normalize_url() {
    assert_eq!(text::normalize_url("example.com"), "https://example.com");
    assert_eq!(text::normalize_url("http://example.com"), "http://example.com");
    assert_eq!(text::normalize_url("HTTPS://Example.com"), "HTTPS://Example.com");
}

#[test]
fn test_template_lists_variable_names() {
    let template = Template::parse("{{ first }} and [l](u) {{second}} {{first}}");
    assert_eq!(template.variable_names(), vec!["first", "second", "first"]);
}
