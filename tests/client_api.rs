// ClickUp HTTP client against a mock server.
use clicknote::client::{ApiError, ClickUpClient, TaskSource};
use clicknote::model::NewTask;
use mockito::{Matcher, Server};

const TASKS_BODY: &str = r##"{
    "tasks": [
        {
            "id": "1",
            "name": "Fix bug",
            "status": {"status": "open", "type": "open"},
            "date_created": "1700000000000",
            "creator": {"id": 183, "username": "alice"},
            "assignees": [{"id": 7, "username": "bob"}],
            "priority": {"id": "2", "priority": "high", "color": "#ffcc00"},
            "url": "https://app.clickup.com/t/1"
        },
        {
            "id": "2",
            "name": "Write docs",
            "status": {"status": "in progress"},
            "date_created": "1700000100000",
            "creator": {"id": 183, "username": "alice"},
            "assignees": [],
            "priority": null
        }
    ],
    "last_page": true
}"##;

fn page(n: u32) -> Matcher {
    Matcher::UrlEncoded("page".to_string(), n.to_string())
}

#[tokio::test]
async fn test_get_tasks_sends_token_and_decodes() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/list/900123456789/task")
        .match_query(page(0))
        .match_header("authorization", "pk_test_token")
        .match_header("user-agent", Matcher::Regex("^clicknote/".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TASKS_BODY)
        .create_async()
        .await;

    let client = ClickUpClient::new(&server.url(), "pk_test_token", 5).unwrap();
    let tasks = client.get_tasks("900123456789").await.unwrap();

    mock.assert_async().await;
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].name, "Fix bug");
    assert_eq!(tasks[0].assignees[0].display_name(), "bob");
    assert_eq!(tasks[0].priority.as_ref().unwrap().label(), "High");
    assert_eq!(tasks[1].status.status, "in progress");
}

#[tokio::test]
async fn test_get_tasks_follows_pages() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", "/list/9/task")
        .match_query(page(0))
        .with_body(
            r#"{"tasks": [{"id": "a", "name": "A", "status": {"status": "open"},
                "date_created": "1", "creator": {"id": 1}}], "last_page": false}"#,
        )
        .create_async()
        .await;
    let second = server
        .mock("GET", "/list/9/task")
        .match_query(page(1))
        .with_body(
            r#"{"tasks": [{"id": "b", "name": "B", "status": {"status": "open"},
                "date_created": "2", "creator": {"id": 1}}], "last_page": true}"#,
        )
        .create_async()
        .await;

    let client = ClickUpClient::new(&server.url(), "pk", 5).unwrap();
    let tasks = TaskSource::get_tasks(&client, "9").await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
    let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn test_clickup_error_body_becomes_api_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/list/9/task")
        .match_query(page(0))
        .with_status(401)
        .with_body(r#"{"err": "Token invalid", "ECODE": "OAUTH_025"}"#)
        .create_async()
        .await;

    let client = ClickUpClient::new(&server.url(), "bad", 5).unwrap();
    let err = client.get_tasks("9").await.unwrap_err();

    assert_eq!(
        err,
        ApiError::Api {
            status: 401,
            message: "Token invalid (OAUTH_025)".to_string()
        }
    );
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_server_error_without_body_is_remote() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/list/9/task")
        .match_query(page(0))
        .with_status(502)
        .create_async()
        .await;

    let client = ClickUpClient::new(&server.url(), "pk", 5).unwrap();
    let err = client.get_tasks("9").await.unwrap_err();

    assert!(matches!(err, ApiError::Remote { .. }), "{:?}", err);
}

#[tokio::test]
async fn test_wrong_shape_is_malformed() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/list/9/task")
        .match_query(page(0))
        .with_body(r#"{"tasks": [{"id": "1", "name": "no status"}]}"#)
        .create_async()
        .await;

    let client = ClickUpClient::new(&server.url(), "pk", 5).unwrap();
    let err = client.get_tasks("9").await.unwrap_err();

    assert!(matches!(err, ApiError::MalformedResponse { .. }), "{:?}", err);
}

#[tokio::test]
async fn test_unreachable_server_is_remote() {
    // Bind then drop to get a port nothing listens on.
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let client = ClickUpClient::new(&format!("http://127.0.0.1:{}", port), "pk", 5).unwrap();

    let err = client.get_tasks("9").await.unwrap_err();

    assert!(matches!(err, ApiError::Remote { .. }), "{:?}", err);
}

#[tokio::test]
async fn test_create_task_posts_selection() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/list/42/task")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "name": "Fix login",
            "description": "",
            "assignees": [],
            "priority": 3
        })))
        .with_status(200)
        .with_body(r#"{"id": "abc", "name": "Fix login", "url": "https://app.clickup.com/t/abc"}"#)
        .create_async()
        .await;

    let client = ClickUpClient::new(&server.url(), "pk", 5).unwrap();
    let created = client
        .create_task("42", &NewTask::from_selection("Fix login"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(created.id, "abc");
    assert_eq!(
        created.to_markdown_link(),
        " [task](https://app.clickup.com/t/abc)"
    );
}

#[tokio::test]
async fn test_create_task_err_with_ok_status() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/list/42/task")
        .with_status(200)
        .with_body(r#"{"err": "List not found"}"#)
        .create_async()
        .await;

    let client = ClickUpClient::new(&server.url(), "pk", 5).unwrap();
    let err = client
        .create_task("42", &NewTask::from_selection("x"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ApiError::Api {
            status: 200,
            message: "List not found".to_string()
        }
    );
}

#[tokio::test]
async fn test_user_teams_spaces_lists() {
    let mut server = Server::new_async().await;
    let _user = server
        .mock("GET", "/user")
        .with_body(r#"{"user": {"id": 183, "username": "alice", "email": "a@example.com"}}"#)
        .create_async()
        .await;
    let _teams = server
        .mock("GET", "/team")
        .with_body(r#"{"teams": [{"id": "t1", "name": "Acme", "members": []}]}"#)
        .create_async()
        .await;
    let _spaces = server
        .mock("GET", "/team/t1/space")
        .with_body(r#"{"spaces": [{"id": "s1", "name": "Engineering"}]}"#)
        .create_async()
        .await;
    let _lists = server
        .mock("GET", "/space/s1/list")
        .with_body(r#"{"lists": [{"id": "900", "name": "Sprint", "task_count": 4}]}"#)
        .create_async()
        .await;

    let client = ClickUpClient::new(&server.url(), "pk", 5).unwrap();

    let user = client.get_authorized_user().await.unwrap();
    assert_eq!(user.display_name(), "alice");
    let teams = client.get_teams().await.unwrap();
    assert_eq!(teams[0].name, "Acme");
    let spaces = client.get_spaces("t1").await.unwrap();
    assert_eq!(spaces[0].id, "s1");
    let lists = client.get_lists("s1").await.unwrap();
    assert_eq!(lists[0].task_count, Some(4));
}
