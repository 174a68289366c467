use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{
    error::{ApiError, Result},
    models::{ScrapeResponse, UrlQuery},
    services::{export::Download, pipeline::ScrapeOutcome},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/scrape", get(scrape))
        .route("/export-csv", get(export_csv))
        .route("/generate-report", get(generate_report))
}

async fn scrape(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<ScrapeResponse>> {
    let raw = required_url(query)?;
    let outcome = run_bounded(&state, &raw).await?;
    Ok(Json(scrape_response(outcome)))
}

async fn export_csv(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UrlQuery>,
) -> Result<Response> {
    let raw = required_url(query)?;
    let outcome = run_bounded(&state, &raw).await?;

    let download = state
        .exporter
        .export_csv(outcome.report())
        .await
        .map_err(|e| {
            error!(url = %raw, error = %e, "csv export failed");
            e
        })?;

    Ok(attachment("text/csv; charset=utf-8", download))
}

async fn generate_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UrlQuery>,
) -> Result<Response> {
    let raw = required_url(query)?;
    let outcome = run_bounded(&state, &raw).await?;

    let download = state
        .exporter
        .export_pdf(outcome.report().clone())
        .await
        .map_err(|e| {
            error!(url = %raw, error = %e, "pdf report failed");
            e
        })?;

    Ok(attachment("application/pdf", download))
}

fn required_url(query: UrlQuery) -> Result<String> {
    query
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or(ApiError::MissingUrl)
}

/// Runs the pipeline under the whole-request deadline. Past the deadline the
/// caller still gets a degraded report with synthesized numbers.
async fn run_bounded(state: &AppState, raw: &str) -> Result<ScrapeOutcome> {
    let request_id = Uuid::new_v4();
    let limit = Duration::from_secs(state.config.request_timeout);

    let result = tokio::time::timeout(limit, state.pipeline.analyze(raw))
        .instrument(info_span!("analyze", %request_id, url = %raw))
        .await;

    match result {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(e)) => {
            if e.is_invalid_input() {
                debug!(url = %raw, "rejected input");
            } else {
                warn!(url = %raw, error = %e, "analysis failed");
            }
            Err(e)
        }
        Err(_) => {
            warn!(url = %raw, limit_secs = limit.as_secs(), "analysis timed out, answering with placeholder metrics");
            Ok(ScrapeOutcome::Degraded {
                report: state.pipeline.placeholder_report(raw)?,
                reason: ApiError::Timeout.to_string(),
            })
        }
    }
}

fn scrape_response(outcome: ScrapeOutcome) -> ScrapeResponse {
    let cached = outcome.is_cached();
    let (report, error) = match outcome {
        ScrapeOutcome::Fresh(report) | ScrapeOutcome::Cached(report) => (report, None),
        ScrapeOutcome::Degraded { report, reason } => (
            report,
            Some(format!("Analysis completed with limited data: {}", reason)),
        ),
    };

    ScrapeResponse {
        status: true,
        data: vec![report.analysis.clone()],
        metrics: report.metrics.clone(),
        analytics: Some(report.analytics.clone()),
        error,
        cached,
        server_status: "online",
    }
}

fn attachment(content_type: &'static str, download: Download) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", download.filename),
            ),
        ],
        download.body,
    )
        .into_response()
}
