use actix_web::{http::header, web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use serde_json::json;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::{auth::vendor_validator, notifier::QueueEvent, state::AppState};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/events")
            .wrap(HttpAuthentication::basic(vendor_validator))
            .route(web::get().to(stream_events)),
    );
}

async fn stream_events(state: web::Data<AppState>) -> HttpResponse {
    event_stream(&state, None)
}

/// Events for one salon, for customer views of that salon's queue.
pub async fn stream_salon_events(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    event_stream(&state, Some(path.into_inner()))
}

fn event_stream(state: &AppState, salon_id: Option<String>) -> HttpResponse {
    let Some(rx) = state.events.subscribe() else {
        return HttpResponse::ServiceUnavailable()
            .json(json!({ "error": "Real-time updates are disabled" }));
    };

    // Lagged receivers drop the frames they missed; clients refetch on the next event.
    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let event = result.ok()?;
        if salon_id.as_deref().is_some_and(|id| id != event.salon_id()) {
            return None;
        }
        Some(Ok::<web::Bytes, actix_web::Error>(event_to_bytes(&event)))
    });

    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(stream)
}

fn event_to_bytes(event: &QueueEvent) -> web::Bytes {
    let payload = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    web::Bytes::from(format!("event: {}\ndata: {}\n\n", event.name(), payload))
}
