use datarest_types::ETag;

// ── Creation ─────────────────────────────────────────────────────

#[test]
fn surrounds_value_with_quotes_on_display() {
    assert_eq!(ETag::from_value(5).to_string(), "\"5\"");
    assert_eq!(ETag::from_value(5).to_header_value().as_deref(), Some("\"5\""));
}

#[test]
fn strips_leading_and_trailing_quotes() {
    assert_eq!(ETag::from_value("\"1\"").value(), Some("1"));
    assert_eq!(ETag::from_value("\"1\""), ETag::from_value("1"));
}

#[test]
fn strips_weak_prefix() {
    assert_eq!(ETag::from_value("W/\"7\""), ETag::from_value(7));
}

#[test]
fn optional_none_is_sentinel() {
    let tag = ETag::from_optional(None::<i64>);
    assert!(tag.is_none());
    assert_eq!(tag, ETag::NONE);
}

#[test]
fn sentinel_has_no_header_value() {
    assert_eq!(ETag::NONE.to_header_value(), None);
    assert_eq!(ETag::NONE.to_string(), "");
}

// ── Header matching ──────────────────────────────────────────────

#[test]
fn matches_single_quoted_tag() {
    assert!(ETag::from_value(5).matches_header("\"5\""));
    assert!(!ETag::from_value(6).matches_header("\"5\""));
}

#[test]
fn matches_any_tag_in_list() {
    let tag = ETag::from_value(3);
    assert!(tag.matches_header("\"1\", \"2\", \"3\""));
    assert!(!tag.matches_header("\"1\", \"2\""));
}

#[test]
fn wildcard_matches_real_tag() {
    assert!(ETag::from_value(1).matches_header("*"));
}

#[test]
fn sentinel_never_matches() {
    assert!(!ETag::NONE.matches_header("*"));
    assert!(!ETag::NONE.matches_header("\"\""));
}
