//! End-to-end reconciliation scenarios across client and reconciler.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(clippy::indexing_slicing)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use metakube_client::{
    ApiError, ApiOperation, ClientConfig, ConfigResolver, HttpClientFactory,
    InMemoryClientFactory, InMemoryProjectsApi, Project as ApiProject, StaticConfigResolver,
};
use metakube_reconciler::{
    CancellationToken, ConditionReason, ConditionType, Error, PassContext, Project,
    ProjectParameters, ReconcileAction, Reconciler, ReconcilerBuilder, ResourceEnvelope, Stage,
};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn env(value: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("env".to_string(), value.to_string())])
}

fn resolver(endpoint: &str) -> Arc<dyn ConfigResolver> {
    Arc::new(StaticConfigResolver::new().with_config(
        "default",
        ClientConfig::new(Url::parse(endpoint).unwrap(), "t0k"),
    ))
}

fn in_memory(api: &Arc<InMemoryProjectsApi>) -> Reconciler<InMemoryClientFactory> {
    ReconcilerBuilder::new(InMemoryClientFactory::new(Arc::clone(api)))
        .with_resolver(resolver("https://metakube.example.com"))
        .build()
        .unwrap()
}

fn proj_a() -> Project {
    Project::new(
        "proj-a",
        ProjectParameters {
            name: "proj-a".to_string(),
            labels: Some(env("prod")),
            users: vec!["ops@example.com".to_string()],
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn create_then_observe_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/projects"))
        .and(header("authorization", "Bearer t0k"))
        .and(body_json(json!({
            "name": "proj-a",
            "labels": {"env": "prod"},
            "users": ["ops@example.com"]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "p-123",
            "name": "proj-a",
            "labels": {"env": "prod"},
            "status": "Active"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/p-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p-123",
            "name": "proj-a",
            "labels": {"env": "prod"},
            "status": "Active",
            "creationTimestamp": "2024-05-01T10:00:00Z",
            "clustersNumber": 2
        })))
        .mount(&server)
        .await;

    let reconciler = ReconcilerBuilder::new(HttpClientFactory::new().unwrap())
        .with_resolver(resolver(&server.uri()))
        .build()
        .unwrap();
    let mut cr = proj_a();
    let ctx = PassContext::new();

    let created = reconciler.reconcile(&mut cr, &ctx).await.unwrap();
    assert_eq!(created.action, ReconcileAction::Create);
    assert_eq!(cr.external_name(), Some("p-123"));

    let observed = reconciler.reconcile(&mut cr, &ctx).await.unwrap();
    assert!(observed.converged());
    assert!(observed.observation.resource_exists);
    assert!(observed.observation.resource_up_to_date);
    assert_eq!(cr.status.at_provider.id, "p-123");
    assert_eq!(cr.status.at_provider.clusters_number, 2);
    assert_eq!(cr.status.at_provider.creation_time, "2024-05-01T10:00:00.000Z");
    assert_eq!(
        cr.status.condition(ConditionType::Ready).map(|c| c.reason),
        Some(ConditionReason::Available)
    );
}

#[tokio::test]
async fn describe_failure_is_wrapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/p-123"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let reconciler = ReconcilerBuilder::new(HttpClientFactory::new().unwrap())
        .with_resolver(resolver(&server.uri()))
        .build()
        .unwrap();
    let mut cr = proj_a();
    cr.set_external_name("p-123");
    let before = cr.status.at_provider.clone();

    let err = reconciler
        .reconcile(&mut cr, &PassContext::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Describe(ApiError::Status { status: 503, .. })));
    assert_eq!(
        err.to_string(),
        "cannot describe Project: API returned 503: maintenance"
    );
    assert_eq!(cr.status.at_provider, before);
    let synced = cr.status.condition(ConditionType::Synced).unwrap();
    assert_eq!(synced.reason, ConditionReason::ReconcileError);
    assert_eq!(synced.message, err.to_string());
}

#[tokio::test]
async fn label_drift_is_corrected_by_update() {
    let api = Arc::new(InMemoryProjectsApi::new());
    api.insert(ApiProject {
        id: "p-7".to_string(),
        name: "proj-a".to_string(),
        labels: env("stage"),
        status: "Active".to_string(),
        ..Default::default()
    })
    .await;
    let reconciler = in_memory(&api);
    let mut cr = proj_a();
    cr.set_external_name("p-7");
    let ctx = PassContext::new();

    let result = reconciler.reconcile(&mut cr, &ctx).await.unwrap();

    assert_eq!(result.action, ReconcileAction::Update);
    assert!(!result.observation.resource_up_to_date);
    assert_eq!(api.last_update().await.unwrap().labels, env("prod"));

    let next = reconciler.reconcile(&mut cr, &ctx).await.unwrap();
    assert!(next.converged());
}

#[tokio::test]
async fn unset_labels_are_late_initialized_not_updated() {
    let api = Arc::new(InMemoryProjectsApi::new());
    api.insert(ApiProject {
        id: "p-7".to_string(),
        name: "proj-a".to_string(),
        labels: env("stage"),
        ..Default::default()
    })
    .await;
    let reconciler = in_memory(&api);
    let mut cr = proj_a();
    cr.spec.for_provider.labels = None;
    cr.set_external_name("p-7");

    let result = reconciler
        .reconcile(&mut cr, &PassContext::new())
        .await
        .unwrap();

    assert!(result.converged());
    assert!(result.observation.resource_late_initialized);
    assert_eq!(cr.spec.for_provider.labels, Some(env("stage")));
    assert_eq!(api.calls(ApiOperation::Update).await, 0);
}

#[tokio::test]
async fn vanished_project_is_recreated_with_new_identity() {
    let api = Arc::new(InMemoryProjectsApi::new().with_id_start(40));
    let reconciler = in_memory(&api);
    let mut cr = proj_a();
    cr.set_external_name("p-9");

    let result = reconciler
        .reconcile(&mut cr, &PassContext::new())
        .await
        .unwrap();

    assert_eq!(result.action, ReconcileAction::Create);
    assert!(!result.observation.resource_exists);
    assert_eq!(cr.external_name(), Some("p-40"));
}

#[tokio::test]
async fn delete_lifecycle() {
    let api = Arc::new(InMemoryProjectsApi::new());
    let reconciler = in_memory(&api);
    let mut cr = proj_a();
    let ctx = PassContext::new();
    reconciler.reconcile(&mut cr, &ctx).await.unwrap();
    reconciler.reconcile(&mut cr, &ctx).await.unwrap();
    assert!(!cr.status.at_provider.is_empty());

    cr.request_deletion();
    let deleting = reconciler.reconcile(&mut cr, &ctx).await.unwrap();
    assert_eq!(deleting.action, ReconcileAction::Delete);
    assert!(cr.status.at_provider.is_empty());
    assert_eq!(
        cr.status.condition(ConditionType::Ready).map(|c| c.reason),
        Some(ConditionReason::Deleting)
    );

    let gone = reconciler.reconcile(&mut cr, &ctx).await.unwrap();
    assert_eq!(gone.action, ReconcileAction::None);
    assert!(gone.deleted);
    assert_eq!(api.calls(ApiOperation::Delete).await, 1);
}

#[tokio::test]
async fn delete_without_identity_is_not_attempted() {
    let api = Arc::new(InMemoryProjectsApi::new());
    let reconciler = in_memory(&api);
    let connector = reconciler.connector();
    let mut cr = proj_a();
    cr.request_deletion();
    let ctx = PassContext::new();

    let external = connector.connect(&cr, &ctx).await.unwrap();
    let err = external.delete(&mut cr).await.unwrap_err();

    assert!(matches!(
        err,
        Error::ExternalNameNotSet {
            stage: Stage::Delete
        }
    ));
    assert_eq!(api.calls(ApiOperation::Delete).await, 0);

    // A full pass sees no external project and has nothing to delete.
    let result = reconciler.reconcile(&mut cr, &ctx).await.unwrap();
    assert_eq!(result.action, ReconcileAction::None);
    assert!(result.deleted);
}

#[tokio::test]
async fn cancellation_aborts_in_flight_pass() {
    let api = Arc::new(InMemoryProjectsApi::new().with_latency(Duration::from_secs(30)));
    let reconciler = in_memory(&api);
    let mut cr = proj_a();
    let token = CancellationToken::new();
    let ctx = PassContext::new().with_cancellation(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });
    let err = reconciler.reconcile(&mut cr, &ctx).await.unwrap_err();
    canceller.await.unwrap();

    assert!(matches!(
        err,
        Error::Cancelled {
            stage: Stage::Create
        }
    ));
    assert_eq!(cr.external_name(), None);
}

#[tokio::test]
async fn reconcile_all_handles_every_record() {
    let api = Arc::new(InMemoryProjectsApi::new());
    let reconciler = ReconcilerBuilder::new(InMemoryClientFactory::new(Arc::clone(&api)))
        .with_resolver(resolver("https://metakube.example.com"))
        .max_concurrent(3)
        .build()
        .unwrap();
    let mut records: Vec<Project> = (0..12)
        .map(|i| {
            Project::new(
                format!("proj-{i}"),
                ProjectParameters {
                    name: format!("proj-{i}"),
                    ..Default::default()
                },
            )
        })
        .collect();
    records[5] = records[5].clone().with_provider_config("missing");

    let results = reconciler
        .reconcile_all(&mut records, &PassContext::new())
        .await;

    assert_eq!(results.len(), 12);
    assert_eq!(results[5].0, "proj-5");
    assert!(matches!(results[5].1, Err(Error::ConfigResolution(_))));
    assert_eq!(results.iter().filter(|(_, r)| r.is_ok()).count(), 11);
    assert_eq!(api.len().await, 11);
    assert!(
        records
            .iter()
            .enumerate()
            .all(|(i, cr)| (i == 5) == cr.external_name().is_none())
    );
}

#[tokio::test]
async fn record_from_yaml_reconciles() {
    let yaml = r"
apiVersion: projects.metakube.crossplane.io/v1alpha1
kind: Project
metadata:
  name: proj-a
spec:
  forProvider:
    name: proj-a
    labels:
      env: prod
";
    let envelope: ResourceEnvelope = metakube_core::document::from_yaml_str(yaml).unwrap();
    let mut cr = Project::try_from(envelope).unwrap();
    let api = Arc::new(InMemoryProjectsApi::new());

    let result = in_memory(&api)
        .reconcile(&mut cr, &PassContext::new())
        .await
        .unwrap();

    assert_eq!(result.action, ReconcileAction::Create);
    assert_eq!(
        api.project("p-1").await.map(|p| p.labels),
        Some(env("prod"))
    );
}
