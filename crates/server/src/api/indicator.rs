use axum::Json;
use kds_core::{Indicator, StationStatus};
use serde::{Deserialize, Serialize};

/// Arbitrary (station, status) pairs to render.
///
/// `tickets` may be omitted or null; both render an empty indicator.
#[derive(Debug, Default, Deserialize)]
pub struct IndicatorBody {
    #[serde(default)]
    pub tickets: Option<Vec<StationStatus>>,
}

#[derive(Debug, Serialize)]
pub struct IndicatorResponse {
    #[serde(flatten)]
    pub indicator: Indicator,
    /// Glyph rendering for terminals and logs.
    pub text: String,
}

/// Render station dots without touching the store.
pub async fn render_indicator(Json(body): Json<IndicatorBody>) -> Json<IndicatorResponse> {
    let indicator = Indicator::render(body.tickets.as_deref());
    let text = indicator.render_text();
    Json(IndicatorResponse { indicator, text })
}
