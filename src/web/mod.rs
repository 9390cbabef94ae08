// ==========================================
// 测试结果导入系统 - HTTP 上传接口
// ==========================================
// 路由:
// - POST /api/import/excel     multipart 字段 "file"
// - GET  /api/import/batches   最近导入批次（?limit=N）
// - GET  /health
// 状态码: 成功 200 / 文件或行校验错误 400（纯文本）/ 存储错误 500（纯文本）
// ==========================================

use crate::api::{ApiError, ImportApi, ImportApiResponse};
use crate::domain::test_result::ImportBatch;
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// multipart 边界与字段头的额外开销
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub api: Arc<ImportApi>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, self.to_string()).into_response()
    }
}

/// 构建路由（上传上限从配置读取）
pub async fn build_router(api: Arc<ImportApi>) -> Result<Router, ApiError> {
    let max_upload_bytes = api.max_upload_bytes().await?;

    Ok(Router::new()
        .route("/api/import/excel", post(upload_test_results))
        .route("/api/import/batches", get(list_batches))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(
            max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { api }))
}

/// 启动 HTTP 服务
pub async fn serve(api: Arc<ImportApi>, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(api).await?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "上传服务已启动");
    axum::serve(listener, app).await?;
    Ok(())
}

/// 上传测试结果文件
///
/// 缺少 file 字段或内容为空均返回 "File is empty"；
/// 请求体超出上限与导入器的大小检查返回同一条 400 文本
async fn upload_test_results(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImportApiResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::InvalidInput(e.body_text()))?;
    let mut upload: Option<(Option<String>, Vec<u8>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(multipart_error(&state, e).await),
        };

        if field.name() == Some("file") {
            let file_name = field.file_name().map(|s| s.to_string());
            let data = match field.bytes().await {
                Ok(data) => data,
                Err(e) => return Err(multipart_error(&state, e).await),
            };
            upload = Some((file_name, data.to_vec()));
        }
    }

    let (file_name, bytes) = upload.unwrap_or_default();

    match state.api.import_upload(file_name.clone(), bytes).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            if e.is_client_error() {
                warn!(file = ?file_name, error = %e, "上传被拒绝");
            } else {
                error!(file = ?file_name, error = %e, "上传导入失败");
            }
            Err(e)
        }
    }
}

/// multipart 读取失败 → 400 纯文本
async fn multipart_error(state: &AppState, err: MultipartError) -> ApiError {
    if err.status() != StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::InvalidInput(err.body_text());
    }

    warn!(error = %err, "上传内容超出大小上限");
    match state.api.max_upload_bytes().await {
        Ok(max) => ApiError::InvalidInput(format!(
            "File exceeds maximum upload size of {} bytes",
            max
        )),
        Err(e) => e,
    }
}

#[derive(Debug, Deserialize)]
struct BatchQuery {
    limit: Option<usize>,
}

async fn list_batches(
    State(state): State<AppState>,
    Query(query): Query<BatchQuery>,
) -> Result<Json<Vec<ImportBatch>>, ApiError> {
    let limit = query.limit.unwrap_or(20).min(500);
    let api = state.api.clone();
    let batches = tokio::task::spawn_blocking(move || api.recent_batches(limit))
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))??;
    Ok(Json(batches))
}

async fn health() -> &'static str {
    "ok"
}
