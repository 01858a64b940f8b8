use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use super::form::{check_ranges, PredictForm};
use super::render::{render_page, Outcome};
use crate::core::config::{PageConfig, ThresholdConfig};
use crate::core::error::RiskError;
use crate::core::types::{PatientInput, RiskResult};
use crate::risk::RiskEvaluator;

#[derive(Clone)]
pub struct AppState {
    pub evaluator: Arc<RiskEvaluator>,
    pub page: Arc<PageConfig>,
}

impl AppState {
    pub fn new(evaluator: RiskEvaluator, page: PageConfig) -> Self {
        Self {
            evaluator: Arc::new(evaluator),
            page: Arc::new(page),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    model_kind: String,
    probabilistic: bool,
    scaler: Option<String>,
    format: String,
    fingerprint: String,
    thresholds: ThresholdConfig,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// JSON 接口的错误响应
struct ApiError(RiskError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.0.log("接口请求失败");
        let status = match &self.0 {
            RiskError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            error: self.0.user_friendly_message(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict_form))
        .route("/api/predict", post(predict_api))
        .route("/api/health", get(health))
        .with_state(state)
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// 绑定地址并运行，Ctrl-C 时优雅退出
pub async fn serve(addr: &str, state: AppState) -> Result<(), RiskError> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| RiskError::Server(format!("无效的监听地址 {}: {}", addr, e)))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| RiskError::Server(format!("绑定 {} 失败: {}", addr, e)))?;

    log::info!("🚀 服务已启动: http://{}", addr);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| RiskError::Server(e.to_string()))?;
    log::info!("服务已停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("监听退出信号失败: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("收到退出信号，正在关闭服务");
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_page(&state.page, &PatientInput::default(), None))
}

/// 表单提交：出错时仍返回页面，表单保持可用
async fn predict_form(
    State(state): State<AppState>,
    Form(form): Form<PredictForm>,
) -> Html<String> {
    let (input, outcome) = match form.parse() {
        Ok(input) => {
            let outcome = match state.evaluator.evaluate(&input) {
                Ok(result) => Outcome::Prediction(result),
                Err(e) => Outcome::Failure(e.user_friendly_message()),
            };
            (input, outcome)
        }
        Err(e) => {
            e.log("表单校验失败");
            (form.best_effort(), Outcome::Failure(e.user_friendly_message()))
        }
    };
    Html(render_page(&state.page, &input, Some(&outcome)))
}

async fn predict_api(
    State(state): State<AppState>,
    payload: Result<Json<PatientInput>, JsonRejection>,
) -> Result<Json<RiskResult>, ApiError> {
    // 请求体解析失败也按输入无效处理，统一返回 JSON 错误
    let Json(input) = payload.map_err(|rejection| {
        ApiError(RiskError::Validation {
            field: "request body".to_string(),
            reason: rejection.body_text(),
        })
    })?;
    check_ranges(&input).map_err(ApiError)?;
    let result = state.evaluator.evaluate(&input).map_err(ApiError)?;
    Ok(Json(result))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let model = state.evaluator.model();
    Json(HealthResponse {
        status: "ok".to_string(),
        model_kind: model.classifier.kind().to_string(),
        probabilistic: model.classifier.is_probabilistic(),
        scaler: model.scaler_kind().map(str::to_string),
        format: model.format.to_string(),
        fingerprint: model.fingerprint.clone(),
        thresholds: *state.evaluator.thresholds(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ThresholdConfig;
    use crate::core::types::ClassLabel;
    use crate::model::{
        Classifier, LabelClassifier, LinearSvm, LoadedModel, LogisticRegression, ModelError,
    };
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use tower::ServiceExt;

    struct AlwaysFails;

    impl LabelClassifier for AlwaysFails {
        fn kind(&self) -> &'static str {
            "always_fails"
        }
        fn n_features(&self) -> usize {
            5
        }
        fn predict(&self, _features: &[f64]) -> Result<ClassLabel, ModelError> {
            Err(ModelError::NonFiniteOutput)
        }
    }

    fn state_with(classifier: Classifier) -> AppState {
        let model = Arc::new(LoadedModel::from_parts(classifier, None));
        AppState::new(
            RiskEvaluator::new(model, ThresholdConfig::default()),
            PageConfig::default(),
        )
    }

    /// glucose 权重为正，其余为 0：glucose=100 时 p = sigmoid(0) = 0.5
    fn logistic_state() -> AppState {
        state_with(Classifier::Probabilistic(Box::new(LogisticRegression::new(
            vec![0.05, 0.0, 0.0, 0.0, 0.0],
            -5.0,
        ))))
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn form_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn json_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn index_serves_form() {
        let app = router(logistic_state());
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(r#"<form class="input-card" method="post" action="/predict">"#));
        assert!(html.contains(">Predict</button>"));
    }

    #[tokio::test]
    async fn form_submission_renders_result() {
        let app = router(logistic_state());
        let response = app
            .oneshot(form_request(
                "glucose=100&blood_pressure=80&insulin=80&bmi=25.0&age=30",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Patient is <strong>Pre-Diabetic</strong> (50.00% risk)"));
        assert!(html.contains("Patient Health Metrics"));
    }

    #[tokio::test]
    async fn invalid_form_value_keeps_form_usable() {
        let app = router(logistic_state());
        let response = app
            .oneshot(form_request("glucose=abc&age=40"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Invalid input for Glucose Level"));
        assert!(html.contains(r#"name="age" min="1" max="120" step="1" value="40""#));
    }

    #[tokio::test]
    async fn inference_error_is_shown_on_page() {
        let app = router(state_with(Classifier::LabelOnly(Box::new(AlwaysFails))));
        let response = app.oneshot(form_request("glucose=120")).await.unwrap();
        let html = body_text(response).await;
        assert!(html.contains("Error during prediction:"));
        assert!(html.contains(">Predict</button>"));
    }

    #[tokio::test]
    async fn api_returns_label_only_result() {
        let app = router(state_with(Classifier::LabelOnly(Box::new(LinearSvm::new(
            vec![1.0, 0.0, 0.0, 0.0, 0.0],
            -50.0,
        )))));
        let response = app
            .oneshot(json_request(
                "/api/predict",
                r#"{"glucose": 100, "blood_pressure": 80, "insulin": 80, "bmi": 25.0, "age": 30}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(value["category"], "Diabetic");
        assert_eq!(value["position"], 1.0);
        assert!(value["probability"].is_null());
    }

    #[tokio::test]
    async fn api_rejects_out_of_range_input() {
        let app = router(logistic_state());
        let response = app
            .oneshot(json_request(
                "/api/predict",
                r#"{"glucose": 400, "blood_pressure": 80, "insulin": 80, "bmi": 25.0, "age": 30}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn api_inference_error_is_500() {
        let app = router(state_with(Classifier::LabelOnly(Box::new(AlwaysFails))));
        let response = app
            .oneshot(json_request(
                "/api/predict",
                r#"{"glucose": 100, "blood_pressure": 80, "insulin": 80, "bmi": 25.0, "age": 30}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let value: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(value["error"]
            .as_str()
            .unwrap()
            .starts_with("Error during prediction"));
    }

    #[tokio::test]
    async fn health_reports_model() {
        let app = router(logistic_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(value["model_kind"], "logistic_regression");
        assert_eq!(value["probabilistic"], true);
        assert!(value["scaler"].is_null());
        assert_eq!(value["format"], "json");
        assert_eq!(value["thresholds"]["pre_diabetic"], 0.4);
        assert_eq!(value["thresholds"]["diabetic"], 0.6);
    }

    #[tokio::test]
    async fn api_malformed_json_is_422_with_json_body() {
        let app = router(logistic_state());
        let response = app
            .oneshot(json_request("/api/predict", "{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let value: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(value["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid input for request body"));
    }

    #[tokio::test]
    async fn api_missing_field_is_422_with_json_body() {
        let app = router(logistic_state());
        let response = app
            .oneshot(json_request("/api/predict", r#"{"glucose": 100}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let value: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(value["error"].as_str().unwrap().contains("blood_pressure"));
    }
}
