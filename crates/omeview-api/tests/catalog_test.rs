#![allow(clippy::unwrap_used)]
// Integration tests for `CatalogApi` using wiremock: session establishment,
// authentication outcomes, listings, orphaned-image population, and ROIs.

use std::sync::Arc;

use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use omeview_api::entities::{
    AnnotationBody, EntityKind, EntityList, EntityRef, SearchQuery,
};
use omeview_api::{
    CatalogApi, CredentialProvider, Credentials, Error, LoadMonitor, LoginOutcome, RequestSender,
    TransportConfig,
};

const SCHEMA: &str = "http://www.openmicroscopy.org/Schemas/OME/2016-06";

// ── Helpers ─────────────────────────────────────────────────────────

fn endpoint_map(base: &str) -> Value {
    json!({
        "url:experimenters": format!("{base}/api/v0/m/experimenters/"),
        "url:experimentergroups": format!("{base}/api/v0/m/experimentergroups/"),
        "url:projects": format!("{base}/api/v0/m/projects/"),
        "url:datasets": format!("{base}/api/v0/m/datasets/"),
        "url:images": format!("{base}/api/v0/m/images/"),
        "url:screens": format!("{base}/api/v0/m/screens/"),
        "url:plates": format!("{base}/api/v0/m/plates/"),
        "url:plateacquisitions": format!("{base}/api/v0/m/plateacquisitions/"),
        "url:token": format!("{base}/api/v0/token/"),
        "url:servers": format!("{base}/api/v0/servers/"),
        "url:login": format!("{base}/api/v0/login/"),
    })
}

async fn mount_discovery(server: &MockServer) {
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "url:base": format!("{base}/api/v0/") }]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v0/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(endpoint_map(&base)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v0/servers/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": 1, "host": "omero.example.org", "port": 4064 }]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v0/token/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": "csrf-token-1" })),
        )
        .mount(server)
        .await;
}

async fn connect(server: &MockServer, monitor: Arc<LoadMonitor>) -> CatalogApi {
    let sender = Arc::new(RequestSender::new(&TransportConfig::default()).unwrap());
    let host = Url::parse(&server.uri()).unwrap();
    CatalogApi::connect(sender, monitor, host, 2).await.unwrap()
}

fn project_json(id: i64, name: &str) -> Value {
    json!({
        "@type": format!("{SCHEMA}#Project"),
        "@id": id,
        "Name": name,
        "omero:childCount": 1
    })
}

fn dataset_json(id: i64, name: &str) -> Value {
    json!({
        "@type": format!("{SCHEMA}#Dataset"),
        "@id": id,
        "Name": name,
        "omero:childCount": 0
    })
}

fn image_json(id: i64, name: &str) -> Value {
    json!({
        "@type": format!("{SCHEMA}#Image"),
        "@id": id,
        "Name": name
    })
}

fn envelope(data: Vec<Value>) -> Value {
    let total = data.len();
    json!({ "data": data, "meta": { "limit": 200, "totalCount": total } })
}

struct Prompt(Option<Credentials>);

impl CredentialProvider for Prompt {
    fn request_credentials(&self) -> Option<Credentials> {
        self.0.clone()
    }
}

fn no_prompt() -> Prompt {
    Prompt(None)
}

fn credentials(username: &str, password: &str) -> Credentials {
    Credentials {
        username: username.into(),
        password: password.to_string().into(),
    }
}

// ── Session establishment ───────────────────────────────────────────

#[tokio::test]
async fn connect_reads_server_and_token() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;

    let api = connect(&server, Arc::new(LoadMonitor::new())).await;

    assert_eq!(api.server_id(), 1);
    assert_eq!(api.server_port(), 4064);
    assert_eq!(api.token(), "csrf-token-1");
}

#[tokio::test]
async fn connect_fails_when_endpoint_map_is_incomplete() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "url:base": format!("{base}/api/v0/") }]
        })))
        .mount(&server)
        .await;
    let mut incomplete = endpoint_map(&base);
    incomplete.as_object_mut().unwrap().remove("url:token");
    Mock::given(method("GET"))
        .and(path("/api/v0/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(incomplete))
        .mount(&server)
        .await;

    let sender = Arc::new(RequestSender::new(&TransportConfig::default()).unwrap());
    let host = Url::parse(&server.uri()).unwrap();
    let result = CatalogApi::connect(sender, Arc::new(LoadMonitor::new()), host, 16).await;

    match result {
        Err(Error::MissingEndpoint { key }) => assert_eq!(key, "url:token"),
        other => panic!("expected a missing-endpoint error, got {other:?}"),
    }
}

#[tokio::test]
async fn connect_fails_against_an_unreachable_server() {
    let server = MockServer::start().await;
    // No mocks mounted at all.
    let sender = Arc::new(RequestSender::new(&TransportConfig::default()).unwrap());
    let host = Url::parse(&server.uri()).unwrap();

    let result = CatalogApi::connect(sender, Arc::new(LoadMonitor::new()), host, 16).await;
    assert!(result.is_err());
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn login_with_valid_credentials_succeeds_and_rotates_token() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "url:base": format!("{base}/api/v0/") }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v0/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(endpoint_map(&base)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v0/servers/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": 1, "host": "omero.example.org", "port": 4064 }]
        })))
        .mount(&server)
        .await;
    let initial_token = Mock::given(method("GET"))
        .and(path("/api/v0/token/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": "csrf-token-1" })),
        )
        .mount_as_scoped(&server)
        .await;

    let api = connect(&server, Arc::new(LoadMonitor::new())).await;

    // The session cookie changes on login, so the server mints a new token.
    drop(initial_token);
    Mock::given(method("GET"))
        .and(path("/api/v0/token/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": "csrf-token-2" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v0/login/"))
        .and(header("X-CSRFToken", "csrf-token-1"))
        .and(body_string_contains("server=1"))
        .and(body_string_contains("username=jdoe"))
        .and(body_string_contains("password=p%40ss"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "eventContext": { "userId": 5, "userName": "jdoe", "groupId": 3 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = api
        .login(Some(credentials("jdoe", "p@ss")), &no_prompt())
        .await;

    let LoginOutcome::Success(details) = outcome else {
        panic!("expected a successful login, got {outcome:?}");
    };
    assert_eq!(details.user_id, Some(5));
    assert_eq!(details.username.as_deref(), Some("jdoe"));
    assert_eq!(api.token(), "csrf-token-2");
}

#[tokio::test]
async fn login_with_wrong_credentials_fails() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v0/login/"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let api = connect(&server, Arc::new(LoadMonitor::new())).await;
    let outcome = api
        .login(Some(credentials("jdoe", "wrong")), &no_prompt())
        .await;

    assert!(matches!(outcome, LoginOutcome::Failed));
}

#[tokio::test]
async fn declined_credential_prompt_cancels_without_a_request() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v0/login/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let api = connect(&server, Arc::new(LoadMonitor::new())).await;
    let outcome = api.login(None, &no_prompt()).await;

    assert!(matches!(outcome, LoginOutcome::Cancelled));
}

#[tokio::test]
async fn reachable_projects_endpoint_allows_skipping_authentication() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v0/m/projects/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![])))
        .mount(&server)
        .await;

    let api = connect(&server, Arc::new(LoadMonitor::new())).await;
    assert!(api.can_skip_authentication().await);
}

// ── Listings ────────────────────────────────────────────────────────

#[tokio::test]
async fn projects_listing_balances_the_loading_counter() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v0/m/projects/"))
        .and(query_param("childCount", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![
            project_json(1, "plants"),
            project_json(2, "minerals"),
        ])))
        .mount(&server)
        .await;

    let monitor = Arc::new(LoadMonitor::new());
    let api = connect(&server, Arc::clone(&monitor)).await;
    let loading = monitor.entities_loading();

    let projects = api.projects().await;

    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0].name.as_deref(), Some("plants"));
    assert_eq!(*loading.borrow(), 0);
}

#[tokio::test]
async fn failed_listing_is_empty_and_keeps_the_counter_balanced() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    // No datasets mock: the listing request 404s.

    let monitor = Arc::new(LoadMonitor::new());
    let api = connect(&server, Arc::clone(&monitor)).await;

    let datasets = api.datasets(7).await;

    assert!(datasets.is_empty());
    assert_eq!(*monitor.entities_loading().borrow(), 0);
}

#[tokio::test]
async fn datasets_listing_is_scoped_to_the_project() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v0/m/projects/7/datasets/"))
        .and(query_param("childCount", "true"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(vec![dataset_json(51, "slides")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = connect(&server, Arc::new(LoadMonitor::new())).await;
    let datasets = api.datasets(7).await;

    assert_eq!(datasets.len(), 1);
    assert_eq!(datasets[0].id, 51);
}

#[tokio::test]
async fn orphaned_datasets_use_the_orphaned_filter() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v0/m/datasets/"))
        .and(query_param("orphaned", "true"))
        .and(query_param("childCount", "true"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(vec![dataset_json(60, "loose")])),
        )
        .mount(&server)
        .await;

    let api = connect(&server, Arc::new(LoadMonitor::new())).await;
    let datasets = api.orphaned_datasets().await;

    assert_eq!(datasets.len(), 1);
    assert_eq!(datasets[0].name.as_deref(), Some("loose"));
}

#[tokio::test]
async fn single_image_fetch_unwraps_the_data_member() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v0/m/images/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "@type": format!("{SCHEMA}#Image"),
                "@id": 9,
                "Name": "scan.tiff",
                "Pixels": {
                    "SizeX": 512, "SizeY": 256, "SizeZ": 1, "SizeC": 3, "SizeT": 1,
                    "Type": { "value": "uint8" }
                }
            }
        })))
        .mount(&server)
        .await;

    let api = connect(&server, Arc::new(LoadMonitor::new())).await;

    let image = api.image(9).await.unwrap();
    assert_eq!(image.dimensions(), Some([512, 256, 1, 3, 1]));
    assert!(api.image(10).await.is_none());
}

#[tokio::test]
async fn groups_resolve_their_owners() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_discovery(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v0/m/experimentergroups/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![json!({
            "@id": 3,
            "Name": "lab",
            "url:experimenters": format!("{base}/api/v0/m/experimentergroups/3/experimenters/")
        })])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v0/m/experimentergroups/3/experimenters/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![json!({
            "@id": 12, "FirstName": "Ada", "LastName": "Lovelace"
        })])))
        .mount(&server)
        .await;

    let api = connect(&server, Arc::new(LoadMonitor::new())).await;
    let groups = api.groups().await;

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].owners.len(), 1);
    assert_eq!(groups[0].owners[0].full_name(), "Ada Lovelace");
}

// ── Orphaned images ─────────────────────────────────────────────────

#[tokio::test]
async fn orphaned_population_streams_batches_and_counts_failures() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;

    Mock::given(method("GET"))
        .and(path("/webclient/api/images/"))
        .and(query_param("orphaned", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "images": [
                { "id": 1 }, { "id": 2 }, { "id": 3 }, { "id": 4 }, { "id": 5 }
            ]
        })))
        .mount(&server)
        .await;
    for id in [1, 2, 4, 5] {
        Mock::given(method("GET"))
            .and(path(format!("/api/v0/m/images/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": image_json(id, &format!("orphan-{id}"))
            })))
            .mount(&server)
            .await;
    }
    // Image 3's detail fetch fails; it still counts as attempted.
    Mock::given(method("GET"))
        .and(path("/api/v0/m/images/3"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let monitor = Arc::new(LoadMonitor::new());
    // Batch size 2: ids are fetched as {1,2}, {3,4}, {5}.
    let api = connect(&server, Arc::clone(&monitor)).await;

    assert_eq!(api.orphaned_image_count().await, 5);

    let target = EntityList::new();
    let loaded = monitor.orphaned_images_loaded();
    let loading = monitor.orphaned_images_loading();

    api.populate_orphaned_images(&target).await;

    assert_eq!(target.len(), 4);
    assert_eq!(*loaded.borrow(), 5);
    assert!(!*loading.borrow());
}

// ── ROIs ────────────────────────────────────────────────────────────

#[tokio::test]
async fn rois_are_flattened_with_their_annotation_id() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v0/m/rois/"))
        .and(query_param("image", "9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![
            json!({
                "@id": 100,
                "shapes": [
                    {
                        "@type": format!("{SCHEMA}#Rectangle"),
                        "@id": 1000, "X": 0.0, "Y": 0.0, "Width": 5.0, "Height": 5.0
                    },
                    // Unsupported shape kind, skipped with a warning.
                    { "@type": format!("{SCHEMA}#Mask"), "@id": 1001 }
                ]
            }),
            json!({
                "@id": 101,
                "shapes": [{
                    "@type": format!("{SCHEMA}#Ellipse"),
                    "@id": 1002, "X": 1.0, "Y": 1.0, "RadiusX": 2.0, "RadiusY": 2.0
                }]
            }),
        ])))
        .mount(&server)
        .await;

    let api = connect(&server, Arc::new(LoadMonitor::new())).await;
    let shapes = api.rois(9).await;

    assert_eq!(shapes.len(), 2);
    assert_eq!(shapes[0].roi_id, Some(100));
    assert_eq!(shapes[1].roi_id, Some(101));
}

#[tokio::test]
async fn write_rois_posts_with_the_session_token() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    Mock::given(method("POST"))
        .and(path("/iviewer/persist_rois/"))
        .and(header("X-CSRFToken", "csrf-token-1"))
        .and(body_string_contains("\"imageId\":9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ids": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let api = connect(&server, Arc::new(LoadMonitor::new())).await;
    assert!(api.write_rois(9, &[], &[]).await);
}

#[tokio::test]
async fn write_rois_reports_an_error_body_as_failure() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    Mock::given(method("POST"))
        .and(path("/iviewer/persist_rois/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "error": "not allowed" })),
        )
        .mount(&server)
        .await;

    let api = connect(&server, Arc::new(LoadMonitor::new())).await;
    assert!(!api.write_rois(9, &[], &[]).await);
}

#[tokio::test]
async fn write_rois_ignores_error_text_inside_shape_payloads() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    // A shape's text echoed back in the response legitimately contains the
    // word "error"; only a top-level `error` member means failure.
    Mock::given(method("POST"))
        .and(path("/iviewer/persist_rois/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ids": [1000],
            "new": [{ "Text": "error bars, replicate 3" }]
        })))
        .mount(&server)
        .await;

    let api = connect(&server, Arc::new(LoadMonitor::new())).await;
    assert!(api.write_rois(9, &[], &[]).await);
}

// ── Annotations & search ────────────────────────────────────────────

#[tokio::test]
async fn annotations_are_listed_with_their_experimenters() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    Mock::given(method("GET"))
        .and(path("/webclient/api/annotations/"))
        .and(query_param("image", "9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "annotations": [
                { "id": 1, "class": "CommentAnnotationI", "textValue": "checked",
                  "owner": { "id": 3 } },
                // Unsupported class, skipped with a warning.
                { "id": 2, "class": "XmlAnnotationI", "textValue": "<a/>" },
                { "id": 3, "class": "MapAnnotationI", "values": [["stain", "DAPI"]] }
            ],
            "experimenters": [
                { "id": 3, "firstName": "Ada", "lastName": "Lovelace" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = connect(&server, Arc::new(LoadMonitor::new())).await;
    let group = api
        .annotations(EntityRef {
            kind: EntityKind::Image,
            id: 9,
        })
        .await
        .unwrap();

    assert_eq!(group.annotations.len(), 2);
    assert!(matches!(
        &group.annotations[0].body,
        AnnotationBody::Comment { text: Some(text) } if text == "checked"
    ));
    let owner = group.annotations[0].owner.unwrap();
    assert_eq!(group.experimenter(owner.id).unwrap().full_name(), "Ada Lovelace");
}

#[tokio::test]
async fn orphaned_folder_annotations_skip_the_network() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    Mock::given(method("GET"))
        .and(path("/webclient/api/annotations/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let api = connect(&server, Arc::new(LoadMonitor::new())).await;
    let group = api
        .annotations(EntityRef {
            kind: EntityKind::OrphanedFolder,
            id: 0,
        })
        .await;
    assert!(group.is_none());
}

#[tokio::test]
async fn search_scrapes_the_result_table() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    Mock::given(method("GET"))
        .and(path("/webclient/load_searching/form/"))
        .and(query_param("query", "tumor"))
        .and(query_param("ownedBy", "-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<table><tbody>
            <tr id="image-251" class="row">
                <td class="desc"><a>scan.tiff</a></td>
                <td class="date">2024-03-01 10:15:00</td>
                <td class="group">lab-a</td>
                <td><a href="/webclient/?show=image-251">open</a></td>
            </tr>
            </tbody></table>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let api = connect(&server, Arc::new(LoadMonitor::new())).await;
    let results = api.search(&SearchQuery::new("tumor")).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].kind, "image");
    assert_eq!(results[0].id, 251);
    assert_eq!(results[0].name, "scan.tiff");
    assert!(
        results[0]
            .link
            .as_ref()
            .unwrap()
            .as_str()
            .ends_with("/webclient/?show=image-251")
    );
}

#[tokio::test]
async fn failed_search_is_empty() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;

    let api = connect(&server, Arc::new(LoadMonitor::new())).await;
    assert!(api.search(&SearchQuery::new("anything")).await.is_empty());
}
