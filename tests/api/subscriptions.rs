use std::collections::HashMap;

use license_registry::domain::subscriber::Subscriber;
use license_registry::routes::MessageBody;

use crate::helpers::TestApp;

#[tokio::test]
async fn subscribe_returns_201_when_body_is_valid() {
    let test_app = TestApp::spawn_app().await;
    let body = HashMap::from([("email", "subscriber@test.com")]);

    let response = test_app.post_subscription(body).await;

    assert_eq!(201, response.status().as_u16());

    let body: MessageBody = response.json().await.unwrap();

    assert_eq!(body.message, "Subscription created successfully!");
}

#[tokio::test]
async fn subscribe_persists_the_new_subscriber() {
    let test_app = TestApp::spawn_app().await;
    let body = HashMap::from([("email", "test@test.com")]);

    test_app.post_subscription(body).await;

    let new_subscriber: Subscriber =
        sqlx::query_as("SELECT id, email, created_at FROM subscribers;")
            .fetch_one(&test_app.db_pool)
            .await
            .expect("Query to fetch subscribers failed.");

    assert_eq!(new_subscriber.email, "test@test.com");
}

#[tokio::test]
async fn subscribe_returns_400_when_email_is_missing_or_invalid() {
    let test_app = TestApp::spawn_app().await;

    // This is a common practice and it is called table-driven tests. In this case, it simulates different kind of possible request bodies
    // where API should return 400.
    let test_cases: Vec<(HashMap<&str, &str>, &str)> = vec![
        (HashMap::from([]), "missing body parameters"),
        (HashMap::from([("email", "")]), "empty email"),
        (HashMap::from([("email", "test.com")]), "invalid email"),
    ];

    for (invalid_body, error_message) in test_cases {
        let response = test_app.post_subscription(invalid_body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 status when payload was {}",
            error_message
        );
    }
}

#[tokio::test]
async fn subscribing_the_same_email_twice_fails_and_keeps_a_single_subscriber() {
    let test_app = TestApp::spawn_app().await;

    let first = test_app
        .post_subscription(HashMap::from([("email", "twice@test.com")]))
        .await;
    let second = test_app
        .post_subscription(HashMap::from([("email", "twice@test.com")]))
        .await;

    assert_eq!(201, first.status().as_u16());
    assert_eq!(500, second.status().as_u16());

    let body: MessageBody = second.json().await.unwrap();

    assert_eq!(body.message, "Internal Server Error");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscribers WHERE email = $1")
        .bind("twice@test.com")
        .fetch_one(&test_app.db_pool)
        .await
        .expect("Failed to count subscribers.");

    assert_eq!(count, 1);
}

#[tokio::test]
async fn list_subscribers_returns_the_most_recent_subscriber_first() {
    let test_app = TestApp::spawn_app().await;

    test_app
        .post_subscription(HashMap::from([("email", "first@test.com")]))
        .await;
    test_app
        .post_subscription(HashMap::from([("email", "second@test.com")]))
        .await;

    let response = test_app.get_subscribers().await;

    assert_eq!(200, response.status().as_u16());

    let subscribers: Vec<Subscriber> = response.json().await.unwrap();
    let emails: Vec<&str> = subscribers
        .iter()
        .map(|subscriber| subscriber.email.as_str())
        .collect();

    assert_eq!(emails, vec!["second@test.com", "first@test.com"]);
}

#[tokio::test]
async fn list_subscribers_returns_an_empty_array_when_there_are_no_subscribers() {
    let test_app = TestApp::spawn_app().await;

    let subscribers: Vec<Subscriber> = test_app.get_subscribers().await.json().await.unwrap();

    assert!(subscribers.is_empty());
}
