use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{basic_validator, vendor_validator, AuthUser},
    error::{Result, ServiceError},
    queue::Requester,
    routes::events::stream_salon_events,
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinBody {
    salon_id: Option<String>,
    service: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CancelBody {
    id: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    #[serde(default)]
    status: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/queue")
            .service(
                web::resource("/join")
                    .wrap(HttpAuthentication::basic(basic_validator))
                    .route(web::post().to(join)),
            )
            .service(
                web::resource("/join/{salon_id}")
                    .wrap(HttpAuthentication::basic(basic_validator))
                    .route(web::post().to(join_salon)),
            )
            .service(
                web::resource("/mine/current")
                    .wrap(HttpAuthentication::basic(basic_validator))
                    .route(web::get().to(my_current)),
            )
            .service(
                web::resource("/cancel")
                    .wrap(HttpAuthentication::basic(basic_validator))
                    .route(web::post().to(cancel)),
            )
            .service(
                web::resource("/{id}/status")
                    .wrap(HttpAuthentication::basic(vendor_validator))
                    .route(web::patch().to(update_status)),
            )
            .service(web::resource("/{salon_id}/events").route(web::get().to(stream_salon_events)))
            .service(web::resource("/{salon_id}").route(web::get().to(view_queue))),
    );
}

async fn join(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    body: web::Json<JoinBody>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    let salon_id = body
        .salon_id
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ServiceError::BadRequest("salonId required".to_string()))?;

    let entry = state
        .queue_service()
        .join(&Requester::from(&*auth), &salon_id, body.service.as_deref())
        .await?;
    Ok(HttpResponse::Created().json(entry))
}

async fn join_salon(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    body: Option<web::Json<JoinBody>>,
) -> Result<HttpResponse> {
    let salon_id = path.into_inner();
    let body = body.map(web::Json::into_inner).unwrap_or_default();

    let entry = state
        .queue_service()
        .join(&Requester::from(&*auth), &salon_id, body.service.as_deref())
        .await?;
    Ok(HttpResponse::Created().json(entry))
}

async fn my_current(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
) -> Result<HttpResponse> {
    let entry = state.queue_service().current_for_user(&auth.id).await?;
    Ok(HttpResponse::Ok().json(entry))
}

async fn cancel(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    body: Option<web::Json<CancelBody>>,
) -> Result<HttpResponse> {
    let body = body.map(web::Json::into_inner).unwrap_or_default();
    let id = body.id.as_deref().filter(|value| !value.trim().is_empty());

    state
        .queue_service()
        .cancel(id, &Requester::from(&*auth), body.reason.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

async fn update_status(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    body: web::Json<StatusBody>,
) -> Result<HttpResponse> {
    let entry_id = path.into_inner();
    let entry = state
        .queue_service()
        .set_status(&entry_id, &Requester::from(&*auth), &body.status)
        .await?;
    Ok(HttpResponse::Ok().json(entry))
}

async fn view_queue(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let salon_id = path.into_inner();
    let entries = state.queue_service().salon_queue(&salon_id).await?;
    Ok(HttpResponse::Ok().json(entries))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};
    use actix_web_httpauth::headers::authorization::{Authorization, Basic};
    use serde_json::Value;

    use super::*;
    use crate::{
        db::{create_user, NewUser},
        models::{ROLE_CUSTOMER, ROLE_VENDOR},
        salons,
        testing::Fixture,
    };

    const PASSWORD: &str = "pw";

    fn basic(username: &str) -> Authorization<Basic> {
        Authorization::from(Basic::new(username.to_string(), Some(PASSWORD.to_string())))
    }

    async fn login_user(fx: &Fixture, username: &str, role: &str) -> String {
        create_user(
            &fx.db,
            NewUser {
                username,
                display_name: username,
                phone: Some("555-0100"),
                role,
                password: PASSWORD,
            },
        )
        .await
        .unwrap()
        .id
    }

    #[actix_web::test]
    async fn join_view_update_and_cancel_over_http() {
        let fx = Fixture::new().await;
        let owner_id = login_user(&fx, "owner", ROLE_VENDOR).await;
        let salon = salons::create(&fx.db, "Owner Salon", &owner_id, None, None).await.unwrap();
        login_user(&fx, "alice", ROLE_CUSTOMER).await;
        login_user(&fx, "bob", ROLE_CUSTOMER).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(fx.state()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/queue/join")
            .insert_header(basic("alice"))
            .set_json(json!({ "salonId": salon.id, "service": "Haircut" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let alice_entry: Value = test::read_body_json(resp).await;
        assert_eq!(alice_entry["position"], 1);
        assert_eq!(alice_entry["estimatedWaitTime"], 0);
        assert_eq!(alice_entry["status"], "pending");

        let req = test::TestRequest::post()
            .uri(&format!("/api/queue/join/{}", salon.id))
            .insert_header(basic("bob"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let bob_entry: Value = test::read_body_json(resp).await;
        assert_eq!(bob_entry["position"], 2);
        assert_eq!(bob_entry["estimatedWaitTime"], 15);

        let req = test::TestRequest::post()
            .uri(&format!("/api/queue/join/{}", fx.salon_id))
            .insert_header(basic("alice"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], crate::error::ACTIVE_BOOKING_MESSAGE);

        let req = test::TestRequest::get()
            .uri(&format!("/api/queue/{}", salon.id))
            .to_request();
        let queue: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(queue.as_array().unwrap().len(), 2);
        assert_eq!(queue[0]["userName"], "alice");
        assert_eq!(queue[0]["userPhone"], "555-0100");

        let entry_id = alice_entry["id"].as_str().unwrap();
        let req = test::TestRequest::patch()
            .uri(&format!("/api/queue/{entry_id}/status"))
            .insert_header(basic("owner"))
            .set_json(json!({ "status": "checked-in" }))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["status"], "checked-in");
        assert!(updated["checkinTime"].is_string());

        let req = test::TestRequest::get()
            .uri("/api/queue/mine/current")
            .insert_header(basic("bob"))
            .to_request();
        let mine: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(mine["salonName"], "Owner Salon");
        assert_eq!(mine["nowServingPosition"], 1);
        assert_eq!(mine["peopleAhead"], 1);

        let req = test::TestRequest::post()
            .uri("/api/queue/cancel")
            .insert_header(basic("bob"))
            .set_json(json!({ "reason": "Too far" }))
            .to_request();
        let ack: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ack, json!({ "ok": true }));

        let req = test::TestRequest::get()
            .uri("/api/queue/mine/current")
            .insert_header(basic("bob"))
            .to_request();
        let mine: Value = test::call_and_read_body_json(&app, req).await;
        assert!(mine.is_null());
    }

    #[actix_web::test]
    async fn status_endpoint_rejects_bad_input() {
        let fx = Fixture::new().await;
        let owner_id = login_user(&fx, "owner", ROLE_VENDOR).await;
        let salon = salons::create(&fx.db, "Owner Salon", &owner_id, None, None).await.unwrap();
        login_user(&fx, "intruder", ROLE_VENDOR).await;
        login_user(&fx, "alice", ROLE_CUSTOMER).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(fx.state()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri(&format!("/api/queue/join/{}", salon.id))
            .insert_header(basic("alice"))
            .to_request();
        let entry: Value = test::call_and_read_body_json(&app, req).await;
        let uri = format!("/api/queue/{}/status", entry["id"].as_str().unwrap());

        let cases = [
            ("owner", json!({ "status": "waiting" }), StatusCode::BAD_REQUEST),
            ("intruder", json!({ "status": "accepted" }), StatusCode::FORBIDDEN),
            ("alice", json!({ "status": "accepted" }), StatusCode::FORBIDDEN),
            ("owner", json!({ "status": "completed" }), StatusCode::CONFLICT),
        ];
        for (user, body, expected) in cases {
            let req = test::TestRequest::patch()
                .uri(&uri)
                .insert_header(basic(user))
                .set_json(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected, "{user}");
        }

        let req = test::TestRequest::patch()
            .uri("/api/queue/missing/status")
            .insert_header(basic("owner"))
            .set_json(json!({ "status": "accepted" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn join_requires_credentials_and_salon() {
        let fx = Fixture::new().await;
        login_user(&fx, "alice", ROLE_CUSTOMER).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(fx.state()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/queue/join")
            .set_json(json!({ "salonId": fx.salon_id }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/api/queue/join")
            .insert_header(basic("alice"))
            .set_json(json!({ "service": "Haircut" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/queue/join")
            .insert_header(basic("alice"))
            .set_json(json!({ "salonId": "missing" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
