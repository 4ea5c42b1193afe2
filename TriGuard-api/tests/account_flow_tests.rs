// End-to-end tests over the real services and an in-memory SQLite database

use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use regex::Regex;
use serde_json::{json, Value};
use tower::ServiceExt;

use triguard_api::{create_app, AppState};
use triguard_data::database::create_in_memory_pool;
use triguard_data::repository::SqliteAccountMapper;
use triguard_domain::auth::{JwtConfig, TokenManager};
use triguard_domain::config::VerificationConfig;
use triguard_domain::health::HealthService;
use triguard_domain::messaging::{CodeMessage, CodeSender, DeliveryError};
use triguard_domain::services::{create_default_blood_pressure_service, AccountService};

/// Keeps every delivered message so tests can read the codes back
#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<(String, CodeMessage)>>,
}

impl RecordingSender {
    fn last_code_for(&self, recipient: &str) -> String {
        let pattern = Regex::new(r"\d{6}").unwrap();
        let sent = self.sent.lock().unwrap();
        let (_, message) = sent
            .iter()
            .rev()
            .find(|(to, _)| to == recipient)
            .expect("a message for the recipient");
        pattern.find(&message.body).unwrap().as_str().to_string()
    }
}

#[async_trait]
impl CodeSender for RecordingSender {
    async fn send_email(&self, email: &str, message: &CodeMessage) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push((email.to_string(), message.clone()));
        Ok(())
    }

    async fn send_sms(&self, phone: &str, message: &CodeMessage) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push((phone.to_string(), message.clone()));
        Ok(())
    }
}

fn from_peer(mut request: Request<Body>, ip: &str) -> Request<Body> {
    let ip: IpAddr = ip.parse().unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::new(ip, 52000)));
    request
}

struct TestServer {
    router: Router,
    sender: Arc<RecordingSender>,
}

impl TestServer {
    fn start() -> Self {
        let pool = create_in_memory_pool().unwrap();
        let sender = Arc::new(RecordingSender::default());

        let accounts = AccountService::new(
            Arc::new(SqliteAccountMapper::new(pool.clone())),
            sender.clone(),
            VerificationConfig::default(),
        );

        let state = AppState {
            account_service: Arc::new(accounts),
            blood_pressure_service: Arc::new(create_default_blood_pressure_service(pool.clone())),
            health_service: Arc::new(HealthService::new(pool)),
            token_manager: Arc::new(TokenManager::new(JwtConfig {
                secret: "integration_test_secret".to_string(),
                issuer: "triguard-test".to_string(),
                expiration_hours: 1,
            })),
            trusted_proxies: Default::default(),
        };

        Self {
            router: create_app(state),
            sender,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response: Response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    /// GET as if the connection came from `ip`
    async fn get(&self, uri: &str, ip: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(from_peer(builder.body(Body::empty()).unwrap(), ip)).await
    }

    async fn post(&self, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    async fn register(&self, email: &str, username: &str, password: &str, ip: &str) {
        let uri = format!("/api/auth/email-code?email={}&type=register", email);
        let (status, _) = self.get(&uri, ip, None).await;
        assert_eq!(status, StatusCode::OK);

        let code = self.sender.last_code_for(email);
        let (status, body) = self
            .post(
                "/api/auth/email-register",
                json!({"email": email, "code": code, "username": username, "password": password}),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .post("/api/auth/login", json!({"username": username, "password": password}), None)
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["data"]["token"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_register_and_login() {
    let server = TestServer::start();
    server.register("alice@example.com", "alice", "secret1", "10.0.0.1").await;

    let (_, body) = server
        .post("/api/auth/login", json!({"username": "alice@example.com", "password": "secret1"}), None)
        .await;
    assert_eq!(body["code"], 200);
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["role"], "user");

    let (status, body) = server
        .post("/api/auth/login", json!({"username": "alice", "password": "wrong-one"}), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"code": 400, "msg": "用户名或密码错误", "data": null}));
}

#[tokio::test]
async fn test_registration_rules() {
    let server = TestServer::start();
    server.register("alice@example.com", "alice", "secret1", "10.0.0.1").await;

    // Registered address cannot ask for another registration code
    let (_, body) = server
        .get("/api/auth/email-code?email=alice@example.com&type=register", "10.0.0.2", None)
        .await;
    assert_eq!(body, json!({"code": 400, "msg": "该邮箱已注册", "data": null}));

    // Unknown address cannot ask for a reset code
    let (_, body) = server
        .get("/api/auth/email-code?email=bob@example.com&type=reset", "10.0.0.3", None)
        .await;
    assert_eq!(body, json!({"code": 400, "msg": "邮箱未注册", "data": null}));

    // Registering without a code
    let (_, body) = server
        .post(
            "/api/auth/email-register",
            json!({"email": "carol@example.com", "code": "123456", "username": "carol", "password": "secret1"}),
            None,
        )
        .await;
    assert_eq!(body, json!({"code": 400, "msg": "请先获取验证码", "data": null}));

    // Taken username
    server
        .get("/api/auth/email-code?email=dave@example.com&type=register", "10.0.0.4", None)
        .await;
    let code = server.sender.last_code_for("dave@example.com");
    let (_, body) = server
        .post(
            "/api/auth/email-register",
            json!({"email": "dave@example.com", "code": code, "username": "alice", "password": "secret1"}),
            None,
        )
        .await;
    assert_eq!(
        body,
        json!({"code": 400, "msg": "该用户名已被他人使用，请重新更换", "data": null})
    );
}

#[tokio::test]
async fn test_code_requests_are_rate_limited_per_ip() {
    let server = TestServer::start();

    let (_, body) = server
        .get("/api/auth/email-code?email=a@example.com&type=register", "10.0.0.9", None)
        .await;
    assert_eq!(body["code"], 200);

    let (_, body) = server
        .get("/api/auth/email-code?email=b@example.com&type=register", "10.0.0.9", None)
        .await;
    assert_eq!(body, json!({"code": 400, "msg": "请求频繁，请稍后再试", "data": null}));

    let (_, body) = server
        .get("/api/auth/email-code?email=b@example.com&type=register", "10.0.0.10", None)
        .await;
    assert_eq!(body["code"], 200);
}

#[tokio::test]
async fn test_forwarded_header_does_not_escape_the_limit() {
    let server = TestServer::start();

    let mut admitted = 0;
    for i in 1..=5 {
        let request = Request::builder()
            .uri(format!("/api/auth/email-code?email=user{}@example.com&type=register", i))
            .header("x-forwarded-for", format!("6.6.6.{}", i))
            .body(Body::empty())
            .unwrap();
        let (_, body) = server.send(from_peer(request, "1.2.3.4")).await;
        if body["code"] == 200 {
            admitted += 1;
        } else {
            assert_eq!(body["msg"], "请求频繁，请稍后再试");
        }
    }

    assert_eq!(admitted, 1);
}

#[tokio::test]
async fn test_reset_code_is_discarded_after_wrong_guesses() {
    let server = TestServer::start();
    server.register("hal@example.com", "hal", "secret1", "10.0.5.1").await;

    let (_, body) = server
        .get("/api/auth/email-code?email=hal@example.com&type=reset", "10.0.5.2", None)
        .await;
    assert_eq!(body["code"], 200);
    let code = server.sender.last_code_for("hal@example.com");
    let real: u32 = code.parse().unwrap();

    for offset in 1..=VerificationConfig::default().max_attempts {
        let guess = format!("{:06}", (real + offset) % 1_000_000);
        let (status, body) = server
            .post("/api/auth/reset-confirm", json!({"email": "hal@example.com", "code": guess}), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["msg"], "验证码错误，请重新输入");
    }

    let (status, body) = server
        .post(
            "/api/auth/reset-password",
            json!({"email": "hal@example.com", "code": code, "password": "hijacked1"}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "请先获取验证码");

    server.login("hal", "secret1").await;
}

#[tokio::test]
async fn test_password_reset() {
    let server = TestServer::start();
    server.register("erin@example.com", "erin", "secret1", "10.0.1.1").await;

    server
        .get("/api/auth/email-code?email=erin@example.com&type=reset", "10.0.1.2", None)
        .await;
    let code = server.sender.last_code_for("erin@example.com");

    let (_, body) = server
        .post("/api/auth/reset-confirm", json!({"email": "erin@example.com", "code": "000000"}), None)
        .await;
    if code != "000000" {
        assert_eq!(body, json!({"code": 400, "msg": "验证码错误，请重新输入", "data": null}));
    }

    let (_, body) = server
        .post("/api/auth/reset-confirm", json!({"email": "erin@example.com", "code": code}), None)
        .await;
    assert_eq!(body, json!({"code": 200, "msg": null, "data": null}));

    let (_, body) = server
        .post(
            "/api/auth/reset-password",
            json!({"email": "erin@example.com", "code": code, "password": "changed1"}),
            None,
        )
        .await;
    assert_eq!(body, json!({"code": 200, "msg": null, "data": null}));

    // The code is consumed by a successful reset
    let (_, body) = server
        .post(
            "/api/auth/reset-password",
            json!({"email": "erin@example.com", "code": code, "password": "changed2"}),
            None,
        )
        .await;
    assert_eq!(body, json!({"code": 400, "msg": "请先获取验证码", "data": null}));

    server.login("erin", "changed1").await;
}

#[tokio::test]
async fn test_blood_pressure_lifecycle() {
    let server = TestServer::start();
    server.register("fay@example.com", "fay", "secret1", "10.0.2.1").await;
    server.register("gus@example.com", "gus", "secret1", "10.0.2.2").await;
    let fay = server.login("fay", "secret1").await;
    let gus = server.login("gus", "secret1").await;

    let (status, body) = server
        .post(
            "/api/blood-pressure/create",
            json!({"systolic": 142, "diastolic": 91, "pulse": 77, "date": "2024-05-20", "time": "21:10"}),
            Some(&fay),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["category"], "Hypertension Stage 2");
    let id = body["data"]["id"].as_i64().unwrap();

    server
        .post(
            "/api/blood-pressure/create",
            json!({"systolic": 119, "diastolic": 75, "date": "2024-05-20", "time": "06:40", "notes": "morning"}),
            Some(&fay),
        )
        .await;

    let (_, body) = server.get("/api/blood-pressure/get?date=2024-05-20", "10.0.2.1", Some(&fay)).await;
    let times: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["time"].as_str().unwrap())
        .collect();
    assert_eq!(times, vec!["06:40", "21:10"]);

    // Another account sees nothing and cannot touch the records
    let (_, body) = server.get("/api/blood-pressure/get?date=2024-05-20", "10.0.2.2", Some(&gus)).await;
    assert_eq!(body["data"], json!([]));

    let (_, body) = server
        .post(
            "/api/blood-pressure/update",
            json!({"id": id, "systolic": 120, "diastolic": 80, "date": "2024-05-20", "time": "21:10"}),
            Some(&gus),
        )
        .await;
    assert_eq!(body, json!({"code": 400, "msg": "血压记录不存在", "data": null}));

    let uri = format!("/api/blood-pressure/delete?id={}", id);
    let (_, body) = server.get(&uri, "10.0.2.2", Some(&gus)).await;
    assert_eq!(body, json!({"code": 400, "msg": "血压记录不存在", "data": null}));

    // The owner can
    let (_, body) = server
        .post(
            "/api/blood-pressure/update",
            json!({"id": id, "systolic": 128, "diastolic": 79, "date": "2024-05-20", "time": "21:15"}),
            Some(&fay),
        )
        .await;
    assert_eq!(body, json!({"code": 200, "msg": null, "data": null}));

    let (_, body) = server.get(&uri, "10.0.2.1", Some(&fay)).await;
    assert_eq!(body, json!({"code": 200, "msg": null, "data": null}));

    let (_, body) = server.get("/api/blood-pressure/get?date=2024-05-20", "10.0.2.1", Some(&fay)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let server = TestServer::start();
    server.register("hal@example.com", "hal", "secret1", "10.0.3.1").await;
    let token = server.login("hal", "secret1").await;

    let (status, _) = server.get("/api/blood-pressure/get?date=2024-05-20", "10.0.3.1", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = server.get("/api/auth/logout", "10.0.3.1", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = server.get("/api/blood-pressure/get?date=2024-05-20", "10.0.3.1", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"code": 401, "msg": "未登录或登录已失效", "data": null}));
}

#[tokio::test]
async fn test_health_reports_database() {
    let server = TestServer::start();

    let (status, body) = server.get("/health", "10.0.4.1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], "ok");
}
