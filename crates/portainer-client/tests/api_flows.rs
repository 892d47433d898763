use portainer_client::{
    ClientConfig, ContainerState, Credentials, EnvironmentFilter, Portainer, PortainerError,
    ReqwestTransport, TransportError,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";

fn environment_body(containers: Value) -> Value {
    json!({
        "Id": 1,
        "Name": "local",
        "Type": 1,
        "URL": "unix:///var/run/docker.sock",
        "GroupId": 1,
        "PublicURL": "",
        "Status": 1,
        "Snapshots": [{"DockerSnapshotRaw": {"Containers": containers}}]
    })
}

fn container_body(id: &str, name: &str, state: &str) -> Value {
    json!({
        "Id": id,
        "Names": [format!("/{}", name)],
        "Image": "nginx:latest",
        "ImageID": "sha256:aaa",
        "State": state,
        "Status": "Up 2 hours",
        "Created": 1700000000
    })
}

async fn mount_login(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .and(body_json(json!({"username": "admin", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jwt": TOKEN})))
        .expect(expected)
        .mount(server)
        .await;
}

fn client_for(server: &MockServer) -> Portainer {
    let address = server.address();
    let config = ClientConfig::new(&address.ip().to_string(), address.port(), "admin", "secret")
        .with_timeout(5);
    Portainer::new(&config).unwrap()
}

#[tokio::test]
async fn test_login_and_bearer_header() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/endpoints"))
        .and(header("Authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([environment_body(json!([]))])))
        .expect(1)
        .mount(&server)
        .await;

    let portainer = client_for(&server);
    assert!(portainer.login().await.unwrap());

    let environments = portainer
        .load_environments(&EnvironmentFilter::default())
        .await
        .unwrap();
    assert_eq!(environments.len(), 1);
    assert_eq!(environments[0].name(), "local");
}

#[tokio::test]
async fn test_login_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(json!({"message": "Invalid credentials", "details": "Unauthorized"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).login().await.unwrap_err();
    match err {
        PortainerError::Api(api) => {
            assert_eq!(api.path, "auth");
            assert_eq!(api.status, 422);
            assert_eq!(api.message.as_deref(), Some("Invalid credentials"));
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_environment_filter_query() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/endpoints"))
        .and(query_param("limit", "5"))
        .and(query_param("groupIds[]", "1"))
        .and(query_param("groupIds[]", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let portainer = client_for(&server);
    portainer.login().await.unwrap();

    let filter = EnvironmentFilter::new().with_limit(5).with_group_ids(vec![1, 2]);
    assert!(portainer.load_environments(&filter).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_persistent_401_relogs_in_once() {
    let server = MockServer::start().await;
    // Initial login plus exactly one re-login
    mount_login(&server, 2).await;
    Mock::given(method("GET"))
        .and(path("/api/endpoints"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthorized"})))
        .expect(2)
        .mount(&server)
        .await;

    let portainer = client_for(&server);
    portainer.login().await.unwrap();

    let err = portainer
        .load_environments(&EnvironmentFilter::default())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn test_expired_token_is_renewed_transparently() {
    let server = MockServer::start().await;
    mount_login(&server, 2).await;
    Mock::given(method("GET"))
        .and(path("/api/endpoints/1"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/endpoints/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(environment_body(json!([]))))
        .expect(1)
        .mount(&server)
        .await;

    let portainer = client_for(&server);
    portainer.login().await.unwrap();

    let environment = portainer.environment(1).await.unwrap();
    assert_eq!(environment.id(), 1);
}

#[tokio::test]
async fn test_refresh_keeps_container_handles() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/endpoints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([environment_body(json!([
            container_body("a1", "web", "running"),
            container_body("b1", "worker", "running"),
        ]))])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/endpoints/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(environment_body(json!([
            container_body("a2", "web", "exited"),
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let portainer = client_for(&server);
    portainer.login().await.unwrap();

    let mut environments = portainer
        .load_environments(&EnvironmentFilter::default())
        .await
        .unwrap();
    let environment = &mut environments[0];
    let web = environment.container("web").unwrap();

    environment.refresh().await.unwrap();

    assert!(Arc::ptr_eq(&web, &environment.container("web").unwrap()));
    assert_eq!(web.id(), "a2");
    assert_eq!(web.state(), ContainerState::Exited);
    assert_eq!(environment.container_names(), vec!["web"]);
}

#[tokio::test]
async fn test_container_operations() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/endpoints/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(environment_body(json!([
            container_body("a1", "web", "running"),
        ]))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/docker/1/containers/a1/image_status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Status": "outdated", "Message": ""})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/endpoints/1/docker/containers/a1/stats"))
        .and(query_param("stream", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"memory_stats": {"usage": 1024}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/docker/1/containers/a1/recreate"))
        .and(body_json(json!({"PullImage": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"Id": "b2", "State": {"Status": "running"}, "Name": "/web"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/endpoints/1/docker/containers/b2/restart"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let portainer = client_for(&server);
    portainer.login().await.unwrap();
    let environment = portainer.environment(1).await.unwrap();
    let web = environment.container("web").unwrap();

    assert_eq!(web.get_image_status().await.unwrap(), "outdated");
    assert_eq!(web.image_status().as_deref(), Some("outdated"));

    let stats = web.get_stats().await.unwrap();
    assert_eq!(stats["memory_stats"]["usage"], 1024);
    assert_eq!(web.stats(), Some(stats));

    let recreated = web.recreate(true).await.unwrap();
    assert_eq!(recreated["Name"], "/web");
    assert_eq!(web.id(), "b2");
    assert_eq!(web.state(), ContainerState::Running);
    assert_eq!(web.name(), "web");

    web.restart().await.unwrap();
}

#[tokio::test]
async fn test_stop_requires_no_content() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/endpoints/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(environment_body(json!([
            container_body("a1", "web", "exited"),
        ]))))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/endpoints/1/docker/containers/a1/stop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "already stopped"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/endpoints/1/docker/containers/a1/start"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such container"))
        .expect(1)
        .mount(&server)
        .await;

    let portainer = client_for(&server);
    portainer.login().await.unwrap();
    let web = portainer.environment(1).await.unwrap().container("web").unwrap();

    match web.stop().await.unwrap_err() {
        PortainerError::Api(api) => {
            assert_eq!(api.status, 200);
            assert_eq!(api.message.as_deref(), Some("already stopped"));
            assert_eq!(api.details, None);
        }
        other => panic!("expected API error, got {:?}", other),
    }

    match web.start().await.unwrap_err() {
        PortainerError::Api(api) => {
            assert_eq!(api.status, 404);
            assert_eq!(api.message.as_deref(), Some("no such container"));
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"jwt": TOKEN}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(Duration::from_millis(200), false).unwrap();
    let portainer = Portainer::with_transport(
        Credentials::new("admin", "secret", &format!("{}/api", server.uri())),
        Arc::new(transport),
    );

    let err = portainer.login().await.unwrap_err();
    assert!(matches!(err, PortainerError::Transport(TransportError::Timeout(_))));
    assert!(!portainer.session().is_authenticated().await);
}

#[tokio::test]
async fn test_raw_get_returns_non_json_bodies() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/system/version"))
        .respond_with(ResponseTemplate::new(200).set_body_string("2.19.4"))
        .mount(&server)
        .await;

    let portainer = client_for(&server);
    portainer.login().await.unwrap();

    let response = portainer.get("system/version", None).await.unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, portainer_client::ResponseBody::Text("2.19.4".to_string()));
}
