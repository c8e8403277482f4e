mod common;

use common::{
    BASE, ann, assembler, assembler_with, context, dept, dept_excerpts, exposing_ids, people,
};
use datarest_hal::{
    Embedded, HalError, Pagination, Representation, RepresentationShape, ResourceAssembler,
};
use datarest_model::{Instance, PropertyExcerpts, Value};
use datarest_types::PageMetadata;
use pretty_assertions::assert_eq;
use serde_json::json;

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn assembler_is_send_and_sync() {
    assert_send_sync::<ResourceAssembler>();
}

// ── Self links ───────────────────────────────────────────────────

#[test]
fn self_link_uses_collection_path_and_id() {
    let resource = assembler().to_full(&context(), &ann()).unwrap();
    assert_eq!(resource.self_link().unwrap().href(), format!("{BASE}/people/1"));
    assert_eq!(resource.links().all("self").count(), 1);
}

#[test]
fn self_link_is_stable_across_calls() {
    let assembler = assembler();
    let first = assembler.to_full(&context(), &ann()).unwrap();
    let second = assembler.to_summary(&context(), &ann()).unwrap();
    assert_eq!(first.self_link(), second.self_link());
}

#[test]
fn null_identifier_is_not_found() {
    let orphan = Instance::new("Person").with("name", "Ann");
    let err = assembler().to_full(&context(), &orphan).unwrap_err();
    assert!(matches!(err, HalError::ResourceNotFound(_)));
}

#[test]
fn unknown_and_unexported_types_are_not_found() {
    let assembler = assembler();
    let err = assembler
        .to_full(&context(), &Instance::new("Ghost").with("id", 1))
        .unwrap_err();
    assert!(matches!(err, HalError::ResourceNotFound(_)));

    let err = assembler
        .to_full(&context(), &Instance::new("Vault").with("id", 1))
        .unwrap_err();
    assert!(matches!(err, HalError::ResourceNotFound(_)));
}

// ── Content ──────────────────────────────────────────────────────

#[test]
fn full_content_hides_ids_and_non_exported_properties() {
    let person = ann().with("password", "hunter2").with("createdBy", "admin");
    let resource = assembler().to_full(&context(), &person).unwrap();

    assert_eq!(
        resource.content(),
        &json!({
            "version": 5,
            "modified": null,
            "name": "Ann",
            "createdBy": "admin",
        })
    );
}

#[test]
fn expose_ids_includes_identifier() {
    let resource = exposing_ids(assembler()).to_full(&context(), &ann()).unwrap();
    assert_eq!(resource.content()["id"], json!(1));
}

#[test]
fn scenario_person_with_linked_dept() {
    let resource = assembler().to_full(&context(), &ann()).unwrap();

    assert_eq!(resource.links().rels(), vec!["self", "people.Person.dept"]);
    assert_eq!(
        resource.links().get("people.Person.dept").unwrap().href(),
        format!("{BASE}/people/1/dept")
    );
    assert!(resource.embedded().is_empty());
}

#[test]
fn scenario_person_with_embedded_dept() {
    let resource = assembler_with(dept_excerpts())
        .to_full(&context(), &ann())
        .unwrap();

    assert_eq!(resource.links().rels(), vec!["self"]);
    let Some(Embedded::One(dept)) = resource.embedded().get("people.Person.dept") else {
        panic!("dept should be embedded");
    };
    assert_eq!(dept.content(), &json!({"id": 9, "name": "Eng"}));
}

#[test]
fn embedding_does_not_depend_on_owner_shape() {
    let assembler = assembler_with(dept_excerpts());
    let full = assembler.to_full(&context(), &ann()).unwrap();
    let summary = assembler.to_summary(&context(), &ann()).unwrap();
    assert_eq!(full.embedded(), summary.embedded());
}

#[test]
fn summary_uses_projection_when_registered() {
    let projector = PropertyExcerpts::new().with("Person", &["name"]);
    let resource = assembler_with(projector).to_summary(&context(), &ann()).unwrap();
    assert_eq!(resource.content(), &json!({"name": "Ann"}));
}

#[test]
fn summary_without_projection_matches_full() {
    let assembler = assembler();
    let full = assembler.to_full(&context(), &ann()).unwrap();
    let summary = assembler.to_summary(&context(), &ann()).unwrap();
    assert_eq!(full, summary);
}

#[test]
fn full_is_untruncated_even_with_projection() {
    let projector = PropertyExcerpts::new().with("Person", &["name"]);
    let resource = assembler_with(projector).to_full(&context(), &ann()).unwrap();
    assert_eq!(resource.content()["version"], json!(5));
}

// ── Shapes ───────────────────────────────────────────────────────

#[test]
fn compact_shape_lists_self_then_targets() {
    let person = ann().with(
        "friends",
        people(vec![Instance::new("Person").with("id", 2)]),
    );
    let representation = assembler()
        .to_representation(&context(), &person, RepresentationShape::Compact)
        .unwrap();

    assert_eq!(
        representation.to_body(),
        format!("{BASE}/people/1\n{BASE}/depts/9\n{BASE}/people/2")
    );
}

#[test]
fn schema_shape_describes_exported_properties() {
    let representation = assembler()
        .to_representation(&context(), &ann(), RepresentationShape::Schema)
        .unwrap();
    let Representation::Schema(schema) = representation else {
        panic!("expected schema");
    };

    assert_eq!(schema["title"], json!("Person"));
    assert_eq!(schema["properties"]["name"], json!({"type": "string"}));
    assert_eq!(schema["properties"]["version"]["readOnly"], json!(true));
    assert_eq!(
        schema["properties"]["friends"],
        json!({"type": "array", "items": {"type": "string", "format": "uri"}})
    );
    assert!(schema["properties"].get("password").is_none());
    assert!(schema["properties"].get("vault").is_none());
    assert!(schema["properties"].get("id").is_none());
}

#[test]
fn shapes_from_media_types() {
    assert_eq!(RepresentationShape::from_media_type("text/uri-list"), RepresentationShape::Compact);
    assert_eq!(
        RepresentationShape::from_media_type("application/schema+json; charset=utf-8"),
        RepresentationShape::Schema
    );
    assert_eq!(RepresentationShape::from_media_type("application/hal+json"), RepresentationShape::Full);
    assert_eq!(RepresentationShape::from_media_type("*/*"), RepresentationShape::Full);
}

// ── Collections ──────────────────────────────────────────────────

#[test]
fn empty_collection_is_explicit() {
    let collection = assembler()
        .to_collection(&context(), "Person", &[], None)
        .unwrap();

    assert!(collection.is_empty());
    assert_eq!(collection.rel(), "people");
    assert_eq!(collection.links().self_link().unwrap().href(), format!("{BASE}/people"));
    assert_eq!(
        collection.to_hal(),
        json!({
            "_embedded": {"people": []},
            "_links": {"self": {"href": format!("{BASE}/people")}},
        })
    );
}

#[test]
fn collection_items_are_summaries() {
    let projector = PropertyExcerpts::new().with("Person", &["name"]);
    let bob = Instance::new("Person").with("id", 2).with("name", "Bob");
    let collection = assembler_with(projector)
        .to_collection(&context(), "Person", &[ann(), bob], None)
        .unwrap();

    let names: Vec<_> = collection.items().iter().map(|r| r.content().clone()).collect();
    assert_eq!(names, vec![json!({"name": "Ann"}), json!({"name": "Bob"})]);
}

#[test]
fn pagination_is_attached_as_given() {
    let pagination = Pagination::new(PageMetadata::new(20, 1, 45, 3))
        .with_prev(format!("{BASE}/people?page=0"))
        .with_next(format!("{BASE}/people?page=2"));

    let collection = assembler()
        .to_collection(&context(), "Person", &[ann()], Some(pagination))
        .unwrap();

    assert_eq!(collection.links().rels(), vec!["self", "prev", "next"]);
    assert_eq!(
        collection.to_hal()["page"],
        json!({"size": 20, "totalElements": 45, "totalPages": 3, "number": 1})
    );
}

// ── HAL rendering ────────────────────────────────────────────────

#[test]
fn hal_flattens_content_and_groups_links() {
    let resource = assembler_with(dept_excerpts())
        .to_full(&context(), &ann())
        .unwrap();

    assert_eq!(
        resource.to_hal(),
        json!({
            "version": 5,
            "modified": null,
            "name": "Ann",
            "createdBy": null,
            "_embedded": {
                "people.Person.dept": {
                    "id": 9,
                    "name": "Eng",
                    "_links": {"self": {"href": format!("{BASE}/depts/9")}},
                },
            },
            "_links": {"self": {"href": format!("{BASE}/people/1")}},
        })
    );
}

#[test]
fn map_association_embeds_keyed_object() {
    let person = ann().with(
        "roles",
        Value::Map(vec![(Value::from("lead"), Value::entity(dept(10, "Ops")))]),
    );
    let resource = assembler_with(dept_excerpts())
        .to_full(&context(), &person)
        .unwrap();

    assert_eq!(
        resource.to_hal()["_embedded"]["people.Person.roles"]["lead"]["name"],
        json!("Ops")
    );
}
