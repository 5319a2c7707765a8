//! Integration tests using wiremock to simulate HTTP servers and the mock
//! transport to simulate timeouts.

use ferrapi::mock::{MockResponse, MockTransport};
use ferrapi::{
    ApiEvent, ApiHandler, ApiMethod, ApiStatus, BearerTokenAuthenticator, CancellationToken,
    Error, HandlerConfiguration,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct TestData {
    id: u32,
    name: String,
}

fn handler_for(server: &MockServer) -> ApiHandler {
    ApiHandler::builder()
        .base_address(server.uri())
        .unwrap()
        .resource_path("api")
        .resource("Users")
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_successful_get_request() {
    let mock_server = MockServer::start().await;

    let response_data = TestData {
        id: 10,
        name: "Test".to_string(),
    };

    Mock::given(method("GET"))
        .and(path("/api/Users/10"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(&response_data)
                .insert_header("x-custom-header", "custom-value"),
        )
        .mount(&mock_server)
        .await;

    let handler = handler_for(&mock_server);
    let response = handler
        .request()
        .get()
        .with_parameter(10)
        .responds_with::<TestData>()
        .execute()
        .await
        .unwrap();

    assert!(response.was_successful);
    assert_eq!(response.status, ApiStatus::Ok);
    assert_eq!(response.data, Some(response_data));
    assert!(response.message.is_none());
    assert!(response.error.is_none());
    assert_eq!(response.attempts, 1);
    assert!(!response.was_retried());
    assert_eq!(response.header("x-custom-header"), Some("custom-value"));
}

#[tokio::test]
async fn test_successful_post_request() {
    let mock_server = MockServer::start().await;

    let request_data = TestData {
        id: 0,
        name: "New".to_string(),
    };
    let response_data = TestData {
        id: 1,
        name: "New".to_string(),
    };

    Mock::given(method("POST"))
        .and(path("/api/Users"))
        .and(header("content-type", "application/json"))
        .and(body_json(&request_data))
        .respond_with(ResponseTemplate::new(201).set_body_json(&response_data))
        .expect(1)
        .mount(&mock_server)
        .await;

    let handler = handler_for(&mock_server);
    let response = handler
        .request()
        .post()
        .with_content(&request_data)
        .unwrap()
        .responds_with::<TestData>()
        .execute()
        .await
        .unwrap();

    assert_eq!(response.status, ApiStatus::Created);
    assert_eq!(response.data, Some(response_data));
}

#[tokio::test]
async fn test_endpoint_template_and_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/Users/42/Classes"))
        .and(query_param("GivenName", "John"))
        .and(query_param("LastName", "Smith"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<TestData>::new()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let handler = handler_for(&mock_server);
    let response = handler
        .request()
        .get()
        .against_resource("{0}/Classes")
        .with_parameter(42)
        .with_query("GivenName", "John")
        .with_query("LastName", "Smith")
        .responds_with::<Vec<TestData>>()
        .execute()
        .await
        .unwrap();

    assert!(response.was_successful);
    assert_eq!(response.data, Some(Vec::new()));
}

#[tokio::test]
async fn test_failure_envelope_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/Users/7"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({ "message": "User 7 does not exist" })),
        )
        .mount(&mock_server)
        .await;

    let handler = handler_for(&mock_server);
    let response = handler
        .request()
        .get()
        .with_parameter(7)
        .responds_with::<TestData>()
        .execute()
        .await
        .unwrap();

    assert!(!response.was_successful);
    assert_eq!(response.status, ApiStatus::NotFound);
    assert_eq!(response.message.as_deref(), Some("User 7 does not exist"));
    assert!(response.data.is_none());
}

#[tokio::test]
async fn test_failure_plain_text_and_empty_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/Users/1"))
        .respond_with(ResponseTemplate::new(400).set_body_string("  Bad request\n"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/Users/2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let handler = handler_for(&mock_server);

    let response = handler.request().get().with_parameter(1).execute().await.unwrap();
    assert_eq!(response.status, ApiStatus::BadRequest);
    assert_eq!(response.message.as_deref(), Some("  Bad request\n"));

    let response = handler.request().get().with_parameter(2).execute().await.unwrap();
    assert_eq!(response.status, ApiStatus::InternalServerError);
    assert_eq!(response.message.as_deref(), Some(""));
}

#[tokio::test]
async fn test_deserialization_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/Users"))
        .respond_with(ResponseTemplate::new(200).set_body_string("invalid json"))
        .mount(&mock_server)
        .await;

    let handler = handler_for(&mock_server);
    let response = handler
        .request()
        .get()
        .responds_with::<TestData>()
        .execute()
        .await
        .unwrap();

    assert!(!response.was_successful);
    assert_eq!(response.status, ApiStatus::Ok);
    match response.error {
        Some(Error::DeserializationFailed {
            raw_response,
            status,
            ..
        }) => {
            assert_eq!(raw_response, "invalid json");
            assert_eq!(status, ApiStatus::Ok);
        }
        other => panic!("Expected DeserializationFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_other_2xx_is_not_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/Users"))
        .respond_with(ResponseTemplate::new(206).set_body_string("partial"))
        .mount(&mock_server)
        .await;

    let handler = handler_for(&mock_server);
    let response = handler.request().get().execute().await.unwrap();

    assert!(!response.was_successful);
    assert_eq!(response.status, ApiStatus::PartialContent);
}

#[tokio::test]
async fn test_stream_response_is_copied_verbatim() {
    let mock_server = MockServer::start().await;
    let payload = vec![0u8, 159, 146, 150, 255];

    Mock::given(method("GET"))
        .and(path("/api/Users/avatar"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
        .mount(&mock_server)
        .await;

    let handler = handler_for(&mock_server);
    let response = handler
        .request()
        .get()
        .against_resource("avatar")
        .responds_with_stream()
        .execute()
        .await
        .unwrap();

    assert!(response.was_successful);
    assert_eq!(response.data.as_deref(), Some(payload.as_slice()));
}

#[tokio::test]
async fn test_default_and_authorization_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/Users"))
        .and(header("accept", "application/json"))
        .and(header("x-tenant", "acme"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let handler = ApiHandler::builder()
        .base_address(mock_server.uri())
        .unwrap()
        .resource_path("api")
        .resource("Users")
        .default_header("x-tenant", "acme")
        .unwrap()
        .authenticator(BearerTokenAuthenticator::new("secret-token"))
        .build()
        .unwrap();

    let response = handler.request().get().execute().await.unwrap();
    assert!(response.was_successful);
    assert_eq!(response.status, ApiStatus::NoContent);
}

#[tokio::test]
async fn test_cached_client_serves_several_calls() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/Users/3"))
        .respond_with(ResponseTemplate::new(202))
        .expect(2)
        .mount(&mock_server)
        .await;

    let handler = ApiHandler::builder()
        .base_address(mock_server.uri())
        .unwrap()
        .resource_path("api")
        .resource("Users")
        .cache_client(true)
        .build()
        .unwrap();

    for _ in 0..2 {
        let response = handler.request().delete().with_parameter(3).execute().await.unwrap();
        assert_eq!(response.status, ApiStatus::Accepted);
    }
}

#[tokio::test]
async fn test_slow_server_times_out_after_retry_budget() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/Users"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let handler = ApiHandler::builder()
        .base_address(mock_server.uri())
        .unwrap()
        .resource_path("api")
        .resource("Users")
        .timeout(Duration::from_millis(100))
        .retry_attempts(2)
        .build()
        .unwrap();

    let response = handler.request().get().execute().await.unwrap();

    assert!(!response.was_successful);
    assert_eq!(response.status, ApiStatus::TimedOut);
    assert!(matches!(
        response.error,
        Some(Error::RetriesExhausted { attempts: 2 })
    ));
}

#[tokio::test]
async fn test_retry_exhaustion_arithmetic() {
    for (retry_attempts, expected_attempts) in [(0, 1), (1, 1), (3, 3), (6, 6)] {
        let mock = Arc::new(MockTransport::new().on(
            ApiMethod::Get,
            "api/Users",
            MockResponse::timeout(),
        ));

        let handler = ApiHandler::builder()
            .base_address("http://localhost")
            .unwrap()
            .resource_path("api")
            .resource("Users")
            .retry_attempts(retry_attempts)
            .throw_exceptions(true)
            .mock(mock.clone())
            .build()
            .unwrap();

        let result = handler.request().get().execute().await;

        match result {
            Err(Error::RetriesExhausted { attempts }) => assert_eq!(attempts, expected_attempts),
            other => panic!("Expected RetriesExhausted, got {:?}", other),
        }
        assert_eq!(mock.calls(), expected_attempts);
    }
}

#[tokio::test]
async fn test_timeout_then_success() {
    let mock = Arc::new(MockTransport::new().on_sequence(
        ApiMethod::Get,
        "api/Users/5",
        [
            MockResponse::timeout(),
            MockResponse::json(200, &TestData { id: 5, name: "Late".to_string() }).unwrap(),
        ],
    ));
    let handler = ApiHandler::builder()
        .base_address("http://localhost")
        .unwrap()
        .resource_path("api")
        .resource("Users")
        .retry_attempts(3)
        .mock(mock.clone())
        .build()
        .unwrap();
    let mut events = handler.subscribe();

    let response = handler
        .request()
        .get()
        .with_parameter(5)
        .responds_with::<TestData>()
        .execute()
        .await
        .unwrap();

    assert!(response.was_successful);
    assert_eq!(response.status, ApiStatus::Ok);
    assert_eq!(response.attempts, 2);
    assert!(response.was_retried());
    assert_eq!(response.data.map(|data| data.name), Some("Late".to_string()));
    assert_eq!(mock.calls(), 2);

    let request_id = response.request_id;
    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }
    assert_eq!(received.len(), 4);
    assert!(matches!(received[0], ApiEvent::RequestStarted { .. }));
    assert_eq!(
        received[1],
        ApiEvent::Retry {
            request_id,
            attempt: 1
        }
    );
    assert!(matches!(received[2], ApiEvent::RequestStarted { .. }));
    assert_eq!(
        received[3],
        ApiEvent::ResponseReceived {
            request_id,
            status: ApiStatus::Ok,
            attempts: 2
        }
    );
}

#[tokio::test]
async fn test_mocked_handler_runs_authenticator() {
    let mock = Arc::new(MockTransport::new().on(
        ApiMethod::Get,
        "Users",
        MockResponse::status(200),
    ));
    let build = |throw_exceptions| {
        ApiHandler::builder()
            .base_address("http://localhost")
            .unwrap()
            .resource("Users")
            .authenticator(BearerTokenAuthenticator::new(""))
            .throw_exceptions(throw_exceptions)
            .mock(mock.clone())
            .build()
            .unwrap()
    };

    let result = build(true).request().get().execute().await;
    assert!(matches!(result, Err(Error::Authentication(_))));

    let response = build(false).request().get().execute().await.unwrap();
    assert!(!response.was_successful);
    assert_eq!(response.status, ApiStatus::None);
    assert!(matches!(response.error, Some(Error::Authentication(_))));
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn test_retry_events_carry_request_identity() {
    let mock = Arc::new(MockTransport::new().on(
        ApiMethod::Get,
        "api/Users",
        MockResponse::timeout(),
    ));
    let handler = ApiHandler::builder()
        .base_address("http://localhost")
        .unwrap()
        .resource_path("api")
        .resource("Users")
        .retry_attempts(3)
        .mock(mock)
        .build()
        .unwrap();
    let mut events = handler.subscribe();

    let response = handler.request().get().execute().await.unwrap();
    assert_eq!(response.status, ApiStatus::TimedOut);

    let mut retries = Vec::new();
    let mut started = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            ApiEvent::RequestStarted { .. } => started += 1,
            ApiEvent::Retry {
                request_id,
                attempt,
            } => retries.push((request_id, attempt)),
            _ => {}
        }
    }

    assert_eq!(started, 3);
    assert_eq!(
        retries,
        vec![(response.request_id, 1), (response.request_id, 2)]
    );
}

#[tokio::test]
async fn test_throw_exceptions_toggle() {
    // Nothing listens on port 1, so the connection is refused.
    let build = |throw_exceptions| {
        ApiHandler::builder()
            .base_address("http://127.0.0.1:1")
            .unwrap()
            .resource("Users")
            .throw_exceptions(throw_exceptions)
            .build()
            .unwrap()
    };

    let response = build(false).request().get().execute().await.unwrap();
    assert!(!response.was_successful);
    assert_eq!(response.status, ApiStatus::None);
    assert!(matches!(response.error, Some(Error::Network(_))));

    let result = build(true).request().get().execute().await;
    assert!(matches!(result, Err(Error::Network(_))));
}

#[tokio::test]
async fn test_unmocked_route_is_an_empty_response() {
    let handler = ApiHandler::builder()
        .base_address("http://localhost")
        .unwrap()
        .resource("Users")
        .mock(Arc::new(MockTransport::new()))
        .build()
        .unwrap();

    let response = handler.request().get().execute().await.unwrap();
    assert_eq!(response.status, ApiStatus::None);
    assert_eq!(
        response.message.as_deref(),
        Some("Received an Empty Http Response")
    );
}

#[tokio::test]
async fn test_cancellation_aborts_mock_delay() {
    let mock = Arc::new(MockTransport::new().on(
        ApiMethod::Get,
        "Users",
        MockResponse::status(200).delay(Duration::from_secs(30)),
    ));
    let handler = ApiHandler::builder()
        .base_address("http://localhost")
        .unwrap()
        .resource("Users")
        .mock(mock)
        .build()
        .unwrap();

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let response = tokio::time::timeout(
        Duration::from_secs(5),
        handler.request().get().execute_with_cancellation(token),
    )
    .await
    .expect("cancellation should abort the delayed attempt")
    .unwrap();

    assert_eq!(response.status, ApiStatus::None);
    assert!(matches!(response.error, Some(Error::Cancelled)));
}

#[tokio::test]
async fn test_dispose_twice_publishes_once() {
    let handler = ApiHandler::builder()
        .base_address("http://localhost")
        .unwrap()
        .build()
        .unwrap();
    let mut events = handler.subscribe();

    handler.dispose();
    handler.dispose();

    assert_eq!(events.try_recv().unwrap(), ApiEvent::Disposed);
    assert!(events.try_recv().is_err());

    let result = handler.request().get().execute().await;
    assert!(matches!(result, Err(Error::Disposed)));
}

#[tokio::test]
async fn test_handler_from_configuration() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/Users"))
        .and(header("x-api-version", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<TestData>::new()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let configuration: HandlerConfiguration = serde_json::from_value(serde_json::json!({
        "baseAddress": mock_server.uri(),
        "resourcePath": "/v2/",
        "resource": "Users",
        "timeoutSeconds": 5,
        "headers": { "x-api-version": "2" }
    }))
    .unwrap();

    let handler = ApiHandler::builder()
        .configuration(&configuration)
        .unwrap()
        .build()
        .unwrap();

    let response = handler
        .request()
        .get()
        .responds_with::<Vec<TestData>>()
        .execute()
        .await
        .unwrap();
    assert!(response.was_successful);
}

#[tokio::test]
async fn test_multiple_parameters_require_template() {
    let handler = ApiHandler::builder()
        .base_address("http://localhost")
        .unwrap()
        .resource("Users")
        .throw_exceptions(true)
        .mock(Arc::new(MockTransport::new()))
        .build()
        .unwrap();

    let result = handler
        .request()
        .get()
        .with_parameters([1, 2])
        .execute()
        .await;
    assert!(matches!(result, Err(Error::InvalidArgument(_))));

    let result = handler
        .request()
        .get()
        .against_resource("{0}")
        .with_parameters([1, 2])
        .execute()
        .await;
    assert!(matches!(result, Err(Error::Format(_))));
}
