use datarest_types::{Link, Links, PageMetadata, NEXT_REL, SELF_REL};
use pretty_assertions::assert_eq;

// ── Link ─────────────────────────────────────────────────────────

#[test]
fn self_link_has_self_rel() {
    let link = Link::self_link("http://localhost/people/1");
    assert!(link.is_self());
    assert_eq!(link.rel(), SELF_REL);
}

#[test]
fn slash_appends_single_separator() {
    let link = Link::self_link("http://localhost/people/1/");
    assert_eq!(link.slash("/dept").href(), "http://localhost/people/1/dept");
    assert_eq!(link.slash("dept").rel(), SELF_REL);
}

#[test]
fn with_rel_keeps_href() {
    let link = Link::self_link("/people/1").with_rel("people.Person.dept");
    assert_eq!(link.href(), "/people/1");
    assert_eq!(link.rel(), "people.Person.dept");
}

#[test]
fn displays_header_form() {
    let link = Link::new("/people?page=2", NEXT_REL);
    assert_eq!(link.to_string(), "</people?page=2>;rel=\"next\"");
}

// ── Links ────────────────────────────────────────────────────────

#[test]
fn lookup_by_rel() {
    let links = Links::new()
        .and(Link::self_link("/people/1"))
        .and(Link::new("/people/1/dept", "people.Person.dept"));

    assert!(links.has_link("people.Person.dept"));
    assert!(!links.has_link("people.Person.manager"));
    assert_eq!(links.self_link().map(Link::href), Some("/people/1"));
    assert_eq!(links.len(), 2);
}

#[test]
fn repeated_rels_are_kept_in_order() {
    let links: Links = vec![
        Link::new("/depts/1", "members"),
        Link::new("/depts/2", "members"),
        Link::self_link("/people"),
    ]
    .into_iter()
    .collect();

    let hrefs: Vec<&str> = links.all("members").map(Link::href).collect();
    assert_eq!(hrefs, vec!["/depts/1", "/depts/2"]);
    assert_eq!(links.rels(), vec!["members", "self"]);
}

#[test]
fn serializes_as_plain_array() {
    let links = Links::new().and(Link::self_link("/a"));
    let json = serde_json::to_value(&links).unwrap();
    assert_eq!(json, serde_json::json!([{"href": "/a", "rel": "self"}]));
}

// ── PageMetadata ─────────────────────────────────────────────────

#[test]
fn page_neighbours() {
    let first = PageMetadata::new(20, 0, 45, 3);
    assert!(!first.has_previous());
    assert!(first.has_next());

    let last = PageMetadata::new(20, 2, 45, 3);
    assert!(last.has_previous());
    assert!(!last.has_next());
}

#[test]
fn last_representable_page_has_no_next() {
    let page = PageMetadata::new(1, u64::MAX, u64::MAX, u64::MAX);
    assert!(page.has_previous());
    assert!(!page.has_next());
}

#[test]
fn page_serializes_camel_case() {
    let page = PageMetadata::new(20, 1, 45, 3);
    let json = serde_json::to_value(page).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"size": 20, "totalElements": 45, "totalPages": 3, "number": 1})
    );
}
