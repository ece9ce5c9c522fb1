#[cfg(test)]
mod tests {
    use crate::error::{CouchError, ErrorKind};
    use crate::server::ServerManager;
    use couchmanager_common::config::CouchDbConfig;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_DB: &str = "testing111222";

    async fn mount_welcome(mock_server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "couchdb": "Welcome",
                "version": "3.3.3",
                "uuid": "e3a5b2c1"
            })))
            .mount(mock_server)
            .await;
    }

    async fn mount_server_down(mock_server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "error": "service_unavailable",
                "reason": "maintenance"
            })))
            .mount(mock_server)
            .await;
    }

    #[tokio::test]
    async fn test_is_server_running() {
        let mock_server = MockServer::start().await;
        mount_welcome(&mock_server).await;

        let manager = ServerManager::new(&mock_server.uri()).unwrap();
        assert!(manager.is_server_running().await);
    }

    #[tokio::test]
    async fn test_is_server_running_folds_errors() {
        let mock_server = MockServer::start().await;
        mount_server_down(&mock_server).await;

        let manager = ServerManager::new(&mock_server.uri()).unwrap();
        assert!(!manager.is_server_running().await);
    }

    #[tokio::test]
    async fn test_is_server_running_no_listener() {
        let uri = {
            let mock_server = MockServer::start().await;
            mock_server.uri()
        };

        let manager = ServerManager::new(&uri).unwrap();
        assert!(!manager.is_server_running().await);
    }

    #[tokio::test]
    async fn test_get_server_information() {
        let mock_server = MockServer::start().await;
        mount_welcome(&mock_server).await;

        let manager = ServerManager::new(&mock_server.uri()).unwrap();
        let info = manager.get_server_information().await.unwrap();

        assert_eq!(info.couchdb, "Welcome");
        assert_eq!(info.version, "3.3.3");
    }

    #[tokio::test]
    async fn test_get_server_information_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "unauthorized",
                "reason": "Name or password is incorrect."
            })))
            .mount(&mock_server)
            .await;

        let manager = ServerManager::new(&mock_server.uri()).unwrap();
        let err = manager.get_server_information().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RequestFailed);
        assert_eq!(err.reason(), Some("Name or password is incorrect."));
        assert!(err.to_string().starts_with("Error getting server information. Error:"));
        assert!(err.to_string().contains("401 Unauthorized"));
    }

    #[tokio::test]
    async fn test_database_lifecycle() {
        let mock_server = MockServer::start().await;
        mount_welcome(&mock_server).await;

        Mock::given(method("PUT"))
            .and(path(format!("/{}", TEST_DB)))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("/{}", TEST_DB)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "db_name": TEST_DB,
                "doc_count": 0,
                "doc_del_count": 0,
                "update_seq": "0-abc"
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("DELETE"))
            .and(path(format!("/{}", TEST_DB)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let manager = ServerManager::new(&mock_server.uri()).unwrap();

        assert!(manager.create_database(TEST_DB).await.unwrap());
        assert!(manager.database_exist(TEST_DB).await.unwrap());
        assert!(manager.destroy_database(TEST_DB).await.unwrap());
    }

    #[tokio::test]
    async fn test_database_exist_false_for_unknown_name() {
        let mock_server = MockServer::start().await;
        mount_welcome(&mock_server).await;

        Mock::given(method("GET"))
            .and(path("/never_created"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": "not_found",
                "reason": "Database does not exist."
            })))
            .mount(&mock_server)
            .await;

        let manager = ServerManager::new(&mock_server.uri()).unwrap();
        assert!(!manager.database_exist("never_created").await.unwrap());
    }

    #[tokio::test]
    async fn test_database_ops_fail_fast_when_server_down() {
        let mock_server = MockServer::start().await;
        mount_server_down(&mock_server).await;

        // Nothing past the liveness check may be requested.
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"ok": true})))
            .expect(0)
            .mount(&mock_server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(0)
            .mount(&mock_server)
            .await;

        let manager = ServerManager::new(&mock_server.uri()).unwrap();

        let err = manager.database_exist(TEST_DB).await.unwrap_err();
        assert!(matches!(err, CouchError::ServerUnreachable));
        assert_eq!(err.to_string(), "The server is not reachable.");

        let err = manager.create_database(TEST_DB).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServerUnreachable);

        let err = manager.destroy_database(TEST_DB).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServerUnreachable);
    }

    #[tokio::test]
    async fn test_create_database_conflict() {
        let mock_server = MockServer::start().await;
        mount_welcome(&mock_server).await;

        Mock::given(method("PUT"))
            .and(path(format!("/{}", TEST_DB)))
            .respond_with(ResponseTemplate::new(412).set_body_json(json!({
                "error": "file_exists",
                "reason": "The database could not be created, the file already exists."
            })))
            .mount(&mock_server)
            .await;

        let manager = ServerManager::new(&mock_server.uri()).unwrap();
        let err = manager.create_database(TEST_DB).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RequestFailed);
        assert!(err
            .to_string()
            .starts_with(&format!("Error creating database {}. Error:", TEST_DB)));
        assert!(matches!(err.root(), CouchError::Api { error, .. } if error == "file_exists"));
    }

    #[tokio::test]
    async fn test_destroy_database_missing() {
        let mock_server = MockServer::start().await;
        mount_welcome(&mock_server).await;

        Mock::given(method("DELETE"))
            .and(path("/ghost"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": "not_found",
                "reason": "Database does not exist."
            })))
            .mount(&mock_server)
            .await;

        let manager = ServerManager::new(&mock_server.uri()).unwrap();
        let err = manager.destroy_database("ghost").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().starts_with("Error deleting the database ghost. Error:"));
    }

    #[tokio::test]
    async fn test_configured_credentials_are_sent() {
        let mock_server = MockServer::start().await;

        // "admin:secret" in base64
        Mock::given(method("GET"))
            .and(path("/"))
            .and(header("Authorization", "Basic YWRtaW46c2VjcmV0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "couchdb": "Welcome",
                "version": "3.3.3"
            })))
            .mount(&mock_server)
            .await;

        let config = CouchDbConfig {
            server_url: mock_server.uri(),
            username: Some("admin".to_string()),
            password: Some("secret".to_string()),
            ..CouchDbConfig::default()
        };

        let manager = ServerManager::from_config(&config).unwrap();
        assert!(manager.is_server_running().await);
    }
}
