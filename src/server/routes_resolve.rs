use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use reelid_common::{Error, ImdbId};

use crate::metadata::provider::{EpisodeRecord, MediaRecord};
use crate::resolver::ResolutionResult;
use crate::server::AppContext;

/// `POST /` — resolve a batch of raw names.
pub async fn resolve_batch(
    State(ctx): State<AppContext>,
    Json(names): Json<Vec<String>>,
) -> Json<Vec<ResolutionResult>> {
    Json(ctx.resolver.resolve_batch(&names).await)
}

/// `POST /full` — like `POST /`, with the full cached record embedded in
/// each successful result.
pub async fn resolve_batch_full(
    State(ctx): State<AppContext>,
    Json(names): Json<Vec<String>>,
) -> Json<Vec<Value>> {
    let results = ctx.resolver.resolve_batch(&names).await;

    let mut enriched = Vec::with_capacity(results.len());
    for result in results {
        enriched.push(embed_record(&ctx, result).await);
    }

    Json(enriched)
}

/// Attach the full record to one successful result. A record fetch failure
/// downgrades the item to an error result rather than poisoning the batch.
async fn embed_record(ctx: &AppContext, result: ResolutionResult) -> Value {
    let Some(id) = result.imdb_id else {
        return serde_json::to_value(&result).unwrap_or_default();
    };

    match ctx.records.record(id).await {
        Ok(record) => {
            let mut value = serde_json::to_value(&result).unwrap_or_default();
            if let Some(map) = value.as_object_mut() {
                map.insert(
                    "record".to_string(),
                    serde_json::to_value(&record).unwrap_or_default(),
                );
            }
            value
        }
        Err(e) => {
            tracing::warn!(id = %id, error = %e, "failed to embed full record");
            let failed = ResolutionResult {
                input_hash: result.input_hash,
                error: Some(format!("resolved to {id} but the record fetch failed: {e}")),
                ..Default::default()
            };
            serde_json::to_value(&failed).unwrap_or_default()
        }
    }
}

/// `GET /identifier/:id` — cached-through full record.
pub async fn get_record(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<MediaRecord>, (StatusCode, String)> {
    let id = parse_identifier(&id)?;
    let record = ctx.records.record(id).await.map_err(into_response)?;
    Ok(Json(record))
}

/// `GET /identifier/:id/:season/:episode` — one episode's detail blob.
pub async fn get_episode(
    State(ctx): State<AppContext>,
    Path((id, season, episode)): Path<(String, u32, u32)>,
) -> Result<Json<EpisodeRecord>, (StatusCode, String)> {
    let id = parse_identifier(&id)?;
    let record = ctx
        .episodes
        .episode(id, season, episode)
        .await
        .map_err(into_response)?;
    Ok(Json(record))
}

fn parse_identifier(raw: &str) -> Result<ImdbId, (StatusCode, String)> {
    ImdbId::parse(raw).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
}

fn into_response(e: Error) -> (StatusCode, String) {
    let status = match &e {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::Backend(_) => StatusCode::BAD_GATEWAY,
        Error::DataIntegrity(_)
        | Error::Storage(_)
        | Error::Io(_)
        | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}
