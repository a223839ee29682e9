//! Tag classification
//!
//! Maps an annotation's attached tag values to a presentation label.
//! Multiple tags on one annotation are an unresolved conflict that
//! requires human review, so they always classify as the `"ambiguous"`
//! sentinel — never resolved by priority or recency.

use annev_common::model::{Annotation, Vocabulary};

/// Sentinel label for annotations carrying more than one tag
pub const AMBIGUOUS_LABEL: &str = "ambiguous";

/// Body purpose marking a tag (as opposed to e.g. `"commenting"`)
const TAGGING_PURPOSE: &str = "tagging";

/// Classify an annotation by its tagging bodies
///
/// - no tag values → `None`
/// - one value present in the vocabulary → that label
/// - one value not in the vocabulary → `None`
/// - two or more values → [`AMBIGUOUS_LABEL`], regardless of which
pub fn classify(annotation: &Annotation, vocabulary: &Vocabulary) -> Option<String> {
    let tags: Vec<&str> = annotation
        .body
        .iter()
        .filter(|body| body.purpose.as_deref() == Some(TAGGING_PURPOSE))
        .map(|body| body.value.as_str())
        .collect();

    match tags.as_slice() {
        [] => None,
        [tag] => vocabulary
            .contains_label(tag)
            .then(|| (*tag).to_string()),
        _ => Some(AMBIGUOUS_LABEL.to_string()),
    }
}

/// The editor-formatter view of [`classify`]
///
/// The editor applies the returned string as a CSS class on the
/// rendered span, so labels come back as `tag-<label>` and the
/// no-label case is the empty string.
pub fn css_class(annotation: &Annotation, vocabulary: &Vocabulary) -> String {
    classify(annotation, vocabulary)
        .map(|label| format!("tag-{label}"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use annev_common::model::{Body, Target};

    fn annotation_with_bodies(bodies: Vec<Body>) -> Annotation {
        Annotation {
            context: None,
            id: "#a1".to_string(),
            kind: "Annotation".to_string(),
            motivation: None,
            generated: None,
            generator: None,
            body: bodies,
            target: Target::default(),
        }
    }

    #[test]
    fn test_no_tagging_bodies_yields_no_label() {
        let vocab = Vocabulary::builtin();

        let untagged = annotation_with_bodies(vec![]);
        assert_eq!(classify(&untagged, vocab), None);

        // A comment is not a tag
        let commented =
            annotation_with_bodies(vec![Body::textual("commenting", "hard to read")]);
        assert_eq!(classify(&commented, vocab), None);
        assert_eq!(css_class(&commented, vocab), "");
    }

    #[test]
    fn test_single_vocabulary_tag_yields_that_label() {
        let vocab = Vocabulary::builtin();
        let tagged = annotation_with_bodies(vec![Body::textual("tagging", "person")]);

        assert_eq!(classify(&tagged, vocab).as_deref(), Some("person"));
        assert_eq!(css_class(&tagged, vocab), "tag-person");
    }

    #[test]
    fn test_single_unknown_tag_yields_no_label() {
        let vocab = Vocabulary::builtin();
        let tagged = annotation_with_bodies(vec![Body::textual("tagging", "dragon")]);

        assert_eq!(classify(&tagged, vocab), None);
        assert_eq!(css_class(&tagged, vocab), "");
    }

    #[test]
    fn test_multiple_tags_are_always_ambiguous() {
        let vocab = Vocabulary::builtin();

        // Two known tags
        let known = annotation_with_bodies(vec![
            Body::textual("tagging", "person"),
            Body::textual("tagging", "occupation"),
        ]);
        assert_eq!(classify(&known, vocab).as_deref(), Some(AMBIGUOUS_LABEL));
        assert_eq!(css_class(&known, vocab), "tag-ambiguous");

        // Even when none of the tags is in the vocabulary
        let unknown = annotation_with_bodies(vec![
            Body::textual("tagging", "dragon"),
            Body::textual("tagging", "unicorn"),
        ]);
        assert_eq!(classify(&unknown, vocab).as_deref(), Some(AMBIGUOUS_LABEL));

        // Comments in between don't change the count
        let mixed = annotation_with_bodies(vec![
            Body::textual("tagging", "person"),
            Body::textual("commenting", "see margin"),
            Body::textual("tagging", "firstname"),
        ]);
        assert_eq!(classify(&mixed, vocab).as_deref(), Some(AMBIGUOUS_LABEL));
    }
}
