use once_cell::sync::Lazy;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use sqlx::{migrate, Connection, Executor, PgConnection, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use license_registry::{
    config::{get_configuration, DatabaseSettings},
    startup::{get_connection_db_pool, Application},
    telemetry::{get_subscriber, init_subscriber},
};

// The subscriber can be installed only once, so every test shares it. Logs are printed only
// when TEST_LOG is set (eg: TEST_LOG=true cargo test | bunyan)
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = String::from("info");
    let subscriber_name = String::from("test");

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
    pub api_client: reqwest::Client,
}

/// Form fields sent by the license application page.
pub fn license_fields(email: &str) -> HashMap<&'static str, String> {
    HashMap::from([
        ("name", String::from("A")),
        ("email", String::from(email)),
        ("id", String::from("1")),
        ("vehicleNo", String::from("V1")),
        ("chessNo", String::from("C1")),
        ("presentAddress", String::from("Dhaka")),
        ("permanentAddress", String::from("Sylhet")),
    ])
}

pub fn license_form(
    fields: &HashMap<&'static str, String>,
    attachments: &[(&'static str, Vec<u8>)],
) -> Form {
    let mut form = Form::new();

    for (name, value) in fields {
        form = form.text(*name, value.clone());
    }

    for (name, content) in attachments {
        let part = Part::bytes(content.clone()).file_name(format!("{}.png", name));

        form = form.part(*name, part);
    }

    form
}

pub fn photo_bytes() -> Vec<u8> {
    vec![0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0xff]
}

pub fn nid_copy_bytes() -> Vec<u8> {
    vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10, 0x4a, 0x46, 0x49, 0x46]
}

impl TestApp {
    pub async fn spawn_app() -> TestApp {
        Lazy::force(&TRACING);

        let mut config = get_configuration().expect("Missing configuration file.");
        let db_test_name = format!("db_{}", Uuid::new_v4().to_string().replace('-', "_"));

        // We are using port 0 as way to define a different port per each test. Port 0 is a special case that operating systems
        // take into account: when port is 0, the OS will search for the first available port
        config.set_app_port(0);

        let db_pool = configure_db(&mut config.database, db_test_name).await;

        let application = Application::build(config.clone())
            .await
            .expect("Failed to build application.");

        let address = format!("http://127.0.0.1:{}", application.get_port());

        tokio::spawn(application.run_until_stop());

        TestApp {
            address,
            db_pool,
            api_client: reqwest::Client::new(),
        }
    }

    pub async fn post_license(&self, form: Form) -> Response {
        self.api_client
            .post(&format!("{}/api/submit-license", self.address))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Submits a complete application for `email`.
    pub async fn submit_license_for(&self, email: &str) -> Response {
        let form = license_form(
            &license_fields(email),
            &[("photo", photo_bytes()), ("nidCopy", nid_copy_bytes())],
        );

        self.post_license(form).await
    }

    pub async fn get_licenses(&self) -> Response {
        self.get(&format!("{}/api/licenses", self.address)).await
    }

    pub async fn get_license(&self, id: &str) -> Response {
        self.get(&format!("{}/api/licenses/{}", self.address, id))
            .await
    }

    pub async fn get_licenses_by_email(&self, email: &str) -> Response {
        self.get(&format!("{}/api/licenses/email/{}", self.address, email))
            .await
    }

    pub async fn post_subscription(&self, body: HashMap<&str, &str>) -> Response {
        self.api_client
            .post(&format!("{}/api/subscribe", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_subscribers(&self) -> Response {
        self.get(&format!("{}/api/subscribers", self.address)).await
    }

    async fn get(&self, url: &str) -> Response {
        self.api_client
            .get(url)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

async fn configure_db(db_config: &mut DatabaseSettings, db_test_name: String) -> PgPool {
    // Create database
    let mut connection = PgConnection::connect_with(&db_config.get_server_options())
        .await
        .expect("Failed to connect to Postgres.");

    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, db_test_name))
        .await
        .expect("Failed to create database.");

    connection
        .close()
        .await
        .expect("Failed to close connection.");

    // Execute migrations
    db_config.set_name(db_test_name);

    let db_pool = get_connection_db_pool(db_config);

    migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run migrations.");

    db_pool
}
