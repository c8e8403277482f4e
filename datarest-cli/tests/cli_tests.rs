use datarest_cli::{DataRest, DatarestConfig, Preconditions, Response};
use datarest_hal::RepresentationShape;
use datarest_model::EntityRegistry;
use datarest_patch::PatchStrategy;
use datarest_types::HttpDate;
use pretty_assertions::assert_eq;
use serde_json::{Value as Json, json};
use std::path::Path;
use tempfile::TempDir;

const BASE: &str = "http://localhost:8080";

const METADATA: &str = r#"{
    "entities": [
        {
            "name": "Person",
            "collection_path": "people",
            "id_property": "id",
            "version_property": "version",
            "last_modified_property": "modified",
            "properties": [
                {"name": "id", "value_type": "integer"},
                {"name": "version", "value_type": "integer"},
                {"name": "modified", "value_type": "date_time"},
                {"name": "name", "value_type": "text"},
                {"name": "dept", "target": "Dept"},
                {"name": "friends", "target": "Person", "cardinality": "collection"}
            ]
        },
        {
            "name": "Dept",
            "collection_path": "depts",
            "id_property": "id",
            "properties": [
                {"name": "id", "value_type": "integer"},
                {"name": "name", "value_type": "text"}
            ]
        }
    ]
}"#;

fn data() -> Json {
    json!({
        "Person": [
            {
                "id": 1,
                "version": 0,
                "modified": "2024-01-02T03:04:05Z",
                "name": "Ann",
                "dept": "/depts/9",
                "friends": ["/people/2"]
            },
            {"id": 2, "version": 4, "name": "Bob", "dept": "/depts/9"},
            {"id": 3, "version": 0, "name": "Cy"}
        ],
        "Dept": [{"id": 9, "name": "Eng"}]
    })
}

fn service_with(config: DatarestConfig) -> DataRest {
    let registry = EntityRegistry::from_json(METADATA).unwrap();
    DataRest::new(config, registry, &data()).unwrap()
}

fn service() -> DataRest {
    service_with(DatarestConfig::default())
}

fn body(response: &Response) -> Json {
    serde_json::from_str(&response.body).unwrap()
}

fn no_conditions() -> Preconditions {
    Preconditions::default()
}

// ── Loading ──────────────────────────────────────────────────────

#[test]
fn loads_every_record() {
    assert_eq!(service().dataset().len(), 4);
}

#[test]
fn associations_resolve_across_records() {
    let service = service();
    let response = service.show("/people/1", RepresentationShape::Compact, &no_conditions());

    assert_eq!(response.status, 200);
    assert_eq!(
        response.body,
        [
            format!("{BASE}/people/1"),
            format!("{BASE}/depts/9"),
            format!("{BASE}/people/2"),
        ]
        .join("\n")
    );
}

#[test]
fn unknown_entity_type_in_data_is_rejected() {
    let registry = EntityRegistry::from_json(METADATA).unwrap();
    let result = DataRest::new(DatarestConfig::default(), registry, &json!({"Ghost": []}));
    assert!(result.is_err());
}

#[test]
fn dangling_association_uri_is_rejected() {
    let registry = EntityRegistry::from_json(METADATA).unwrap();
    let data = json!({"Person": [{"id": 1, "name": "Ann", "dept": "/depts/404"}]});
    assert!(DataRest::new(DatarestConfig::default(), registry, &data).is_err());
}

#[test]
fn open_reads_files_from_disk() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("datarest.toml");
    let metadata = temp.path().join("entities.json");
    let data_file = temp.path().join("data.json");
    std::fs::write(&config, "base_uri = \"https://api.example.com/\"\n").unwrap();
    std::fs::write(&metadata, METADATA).unwrap();
    std::fs::write(&data_file, data().to_string()).unwrap();

    let service = DataRest::open(&config, &metadata, &data_file).unwrap();
    let response = service.show("/people/3", RepresentationShape::Full, &no_conditions());

    assert_eq!(
        body(&response)["_links"]["self"]["href"],
        json!("https://api.example.com/people/3")
    );
}

#[test]
fn open_without_config_uses_defaults() {
    let temp = TempDir::new().unwrap();
    let metadata = temp.path().join("entities.json");
    let data_file = temp.path().join("data.json");
    std::fs::write(&metadata, METADATA).unwrap();
    std::fs::write(&data_file, data().to_string()).unwrap();

    let service = DataRest::open(&temp.path().join("missing.toml"), &metadata, &data_file).unwrap();
    assert_eq!(service.config(), &DatarestConfig::default());
}

#[test]
fn open_fails_on_missing_data_file() {
    let temp = TempDir::new().unwrap();
    let metadata = temp.path().join("entities.json");
    std::fs::write(&metadata, METADATA).unwrap();

    let result = DataRest::open(
        Path::new("/nonexistent/datarest.toml"),
        &metadata,
        &temp.path().join("data.json"),
    );
    assert!(result.is_err());
}

// ── Show ─────────────────────────────────────────────────────────

#[test]
fn show_renders_hal_with_validators() {
    let response = service().show("/people/1", RepresentationShape::Full, &no_conditions());

    assert_eq!(response.status, 200);
    assert_eq!(response.header_value("Content-Type"), Some("application/hal+json"));
    assert_eq!(response.header_value("ETag"), Some("\"0\""));
    assert_eq!(
        response.header_value("Last-Modified"),
        Some("Tue, 02 Jan 2024 03:04:05 GMT")
    );

    let hal = body(&response);
    assert_eq!(hal["name"], json!("Ann"));
    assert!(hal.get("id").is_none());
    assert_eq!(
        hal["_links"]["people.Person.dept"]["href"],
        json!(format!("{BASE}/people/1/dept"))
    );
}

#[test]
fn excerpts_from_config_embed_targets() {
    let mut config = DatarestConfig::default();
    config.excerpts.insert("Dept".into(), vec!["name".into()]);

    let response = service_with(config).show("/people/1", RepresentationShape::Full, &no_conditions());
    let hal = body(&response);

    assert_eq!(hal["_embedded"]["people.Person.dept"]["name"], json!("Eng"));
}

#[test]
fn matching_if_none_match_is_not_modified() {
    let preconditions = Preconditions {
        if_none_match: Some("\"0\"".into()),
        ..Preconditions::default()
    };
    let response = service().show("/people/1", RepresentationShape::Full, &preconditions);

    assert_eq!(response.status, 304);
    assert!(response.body.is_empty());
    assert_eq!(response.header_value("ETag"), Some("\"0\""));
}

#[test]
fn if_modified_since_compares_whole_seconds() {
    let unchanged = Preconditions {
        if_modified_since: Some(HttpDate::parse("Tue, 02 Jan 2024 03:04:05 GMT").unwrap()),
        ..Preconditions::default()
    };
    let earlier = Preconditions {
        if_modified_since: Some(HttpDate::parse("Tue, 02 Jan 2024 03:04:04 GMT").unwrap()),
        ..Preconditions::default()
    };

    let service = service();
    assert_eq!(service.show("/people/1", RepresentationShape::Full, &unchanged).status, 304);
    assert_eq!(service.show("/people/1", RepresentationShape::Full, &earlier).status, 200);
}

#[test]
fn missing_item_is_not_found() {
    let service = service();
    assert_eq!(service.show("/people/99", RepresentationShape::Full, &no_conditions()).status, 404);
    assert_eq!(service.show("/ghosts/1", RepresentationShape::Full, &no_conditions()).status, 404);
    assert_eq!(service.show("/people", RepresentationShape::Full, &no_conditions()).status, 400);
}

#[test]
fn schema_describes_entity_type() {
    let response = service().schema("people");
    assert_eq!(response.header_value("Content-Type"), Some("application/schema+json"));

    let schema = body(&response);
    assert_eq!(schema["title"], json!("Person"));
    assert_eq!(schema["properties"]["dept"]["format"], json!("uri"));
}

// ── List ─────────────────────────────────────────────────────────

#[test]
fn unpaged_list_contains_every_item() {
    let hal = body(&service().list("people", None));

    assert_eq!(hal["_embedded"]["people"].as_array().unwrap().len(), 3);
    assert_eq!(hal["_links"]["self"]["href"], json!(format!("{BASE}/people")));
    assert!(hal.get("page").is_none());
}

#[test]
fn paged_list_links_neighbours() {
    let hal = body(&service().list("people", Some((1, 1))));

    let items = hal["_embedded"]["people"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], json!("Bob"));
    assert_eq!(
        hal["page"],
        json!({"size": 1, "totalElements": 3, "totalPages": 3, "number": 1})
    );
    assert_eq!(hal["_links"]["prev"]["href"], json!(format!("{BASE}/people?page=0&size=1")));
    assert_eq!(hal["_links"]["next"]["href"], json!(format!("{BASE}/people?page=2&size=1")));
}

#[test]
fn page_past_the_end_is_empty() {
    let hal = body(&service().list("people", Some((5, 2))));
    assert_eq!(hal["_embedded"]["people"], json!([]));
    assert!(hal["_links"].get("next").is_none());
}

#[test]
fn huge_page_number_does_not_overflow() {
    let response = service().list("people", Some((u64::MAX, 2)));
    assert_eq!(response.status, 200);

    let hal = body(&response);
    assert_eq!(hal["_embedded"]["people"], json!([]));
    assert!(hal["_links"].get("next").is_none());
    assert_eq!(
        hal["_links"]["prev"]["href"],
        json!(format!("{BASE}/people?page={}&size=2", u64::MAX - 1))
    );
}

#[test]
fn zero_page_size_is_rejected() {
    assert_eq!(service().list("people", Some((0, 0))).status, 400);
}

// ── Update ───────────────────────────────────────────────────────

#[test]
fn merge_patch_updates_and_bumps_version() {
    let mut service = service();
    let response = service.update(
        "/people/1",
        PatchStrategy::MergePatch,
        &json!({"name": "Anna"}),
        &no_conditions(),
    );

    assert_eq!(response.status, 200);
    assert_eq!(response.header_value("ETag"), Some("\"1\""));
    assert_eq!(body(&response)["name"], json!("Anna"));

    let reread = service.show("/people/1", RepresentationShape::Full, &no_conditions());
    assert_eq!(body(&reread)["name"], json!("Anna"));
}

#[test]
fn json_patch_replaces_association() {
    let mut service = service();
    let response = service.update(
        "/people/2",
        PatchStrategy::JsonPatch,
        &json!([{"op": "replace", "path": "/friends", "value": ["/people/3"]}]),
        &no_conditions(),
    );
    assert_eq!(response.status, 200);

    let compact = service.show("/people/2", RepresentationShape::Compact, &no_conditions());
    assert!(compact.body.ends_with(&format!("{BASE}/people/3")));
}

#[test]
fn failed_test_operation_conflicts() {
    let mut service = service();
    let response = service.update(
        "/people/1",
        PatchStrategy::JsonPatch,
        &json!([{"op": "test", "path": "/name", "value": "Zed"}]),
        &no_conditions(),
    );
    assert_eq!(response.status, 409);
}

#[test]
fn stale_if_match_fails_precondition() {
    let mut service = service();
    let preconditions = Preconditions {
        if_match: Some("\"7\"".into()),
        ..Preconditions::default()
    };
    let response = service.update(
        "/people/1",
        PatchStrategy::MergePatch,
        &json!({"name": "Anna"}),
        &preconditions,
    );

    assert_eq!(response.status, 412);
    let reread = service.show("/people/1", RepresentationShape::Full, &no_conditions());
    assert_eq!(body(&reread)["name"], json!("Ann"));
}

#[test]
fn invalid_payload_is_a_bad_request() {
    let mut service = service();
    let unknown = service.update(
        "/people/1",
        PatchStrategy::MergePatch,
        &json!({"nickname": "A"}),
        &no_conditions(),
    );
    let unresolvable = service.update(
        "/people/1",
        PatchStrategy::MergePatch,
        &json!({"dept": "/depts/404"}),
        &no_conditions(),
    );

    assert_eq!(unknown.status, 400);
    assert_eq!(unresolvable.status, 400);
}

#[test]
fn put_to_new_item_creates_it() {
    let mut service = service();
    let response = service.update(
        "/people/7",
        PatchStrategy::Put,
        &json!({"name": "Dee", "dept": "/depts/9"}),
        &no_conditions(),
    );

    assert_eq!(response.status, 201);
    assert_eq!(response.header_value("Location"), Some("http://localhost:8080/people/7"));
    assert_eq!(service.dataset().len(), 5);

    let shown = service.show("/people/7", RepresentationShape::Full, &no_conditions());
    assert_eq!(body(&shown)["name"], json!("Dee"));
}

#[test]
fn put_keeps_server_owned_properties() {
    let mut service = service();
    let response = service.update(
        "/people/2",
        PatchStrategy::Put,
        &json!({"id": 50, "version": 50, "name": "Robert"}),
        &no_conditions(),
    );

    assert_eq!(response.status, 200);
    assert_eq!(response.header_value("ETag"), Some("\"5\""));
    assert!(service.show("/people/50", RepresentationShape::Full, &no_conditions()).status == 404);
}

#[test]
fn saved_target_is_seen_by_referencing_items() {
    let mut config = DatarestConfig::default();
    config.excerpts.insert("Dept".into(), vec!["name".into()]);
    let mut service = service_with(config);

    let response = service.update(
        "/depts/9",
        PatchStrategy::MergePatch,
        &json!({"name": "Ops"}),
        &no_conditions(),
    );
    assert_eq!(response.status, 200);

    for uri in ["/people/1", "/people/2"] {
        let hal = body(&service.show(uri, RepresentationShape::Full, &no_conditions()));
        assert_eq!(hal["_embedded"]["people.Person.dept"]["name"], json!("Ops"));
    }
}

#[test]
fn saved_item_refreshes_collection_references() {
    let mut service = service();
    let response = service.update(
        "/people/2",
        PatchStrategy::MergePatch,
        &json!({"name": "Robert"}),
        &no_conditions(),
    );
    assert_eq!(response.status, 200);

    let ann = service
        .dataset()
        .all("Person")
        .iter()
        .find(|p| p.get_i64("id") == Some(1))
        .unwrap();
    let friends = ann.value("friends").as_list().unwrap();
    assert_eq!(friends[0].as_entity().unwrap().get_str("name"), Some("Robert"));
}

#[test]
fn patch_to_missing_item_is_not_found() {
    let mut service = service();
    let response = service.update(
        "/people/99",
        PatchStrategy::MergePatch,
        &json!({"name": "Nobody"}),
        &no_conditions(),
    );
    assert_eq!(response.status, 404);
}
