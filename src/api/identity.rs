use actix_web::{HttpResponse, web};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::identity::{IdentityProvider, NewIdentity};
use crate::models::{CreateIdentityRequest, UidResponse};

/// Create a sign-in account without touching the document store.
#[instrument(name = "create_identity", skip_all, fields(email = ?payload.email))]
pub async fn create_identity(
    identity: web::Data<dyn IdentityProvider>,
    payload: web::Json<CreateIdentityRequest>,
) -> Result<HttpResponse, AppError> {
    let CreateIdentityRequest { email, password } = payload.into_inner();

    let user = identity
        .create_user(NewIdentity {
            email,
            password,
            email_verified: false,
        })
        .await?;
    info!(uid = %user.uid, "Identity created");

    Ok(HttpResponse::Ok().json(UidResponse { uid: user.uid }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MemoryIdentityProvider;
    use crate::routes;
    use actix_web::{App, http::StatusCode, test};
    use serde_json::{Value, json};
    use std::sync::Arc;

    macro_rules! app {
        ($provider:expr) => {{
            let provider: Arc<dyn IdentityProvider> = $provider.clone();
            test::init_service(
                App::new()
                    .app_data(web::Data::from(provider))
                    .configure(routes::configure_identity),
            )
            .await
        }};
    }

    fn create(body: Value) -> test::TestRequest {
        test::TestRequest::post().uri("/create-user").set_json(body)
    }

    #[actix_web::test]
    async fn created_identity_uid_is_returned() {
        let provider = Arc::new(MemoryIdentityProvider::new());
        let app = app!(provider);

        let resp = test::call_service(
            &app,
            create(json!({"email": "jane@company.com", "password": "s3cret-pass"})).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;

        let uid = body["uid"].as_str().unwrap();
        let stored = provider.get_user(uid).await.unwrap().unwrap();
        assert_eq!(stored.email.as_deref(), Some("jane@company.com"));
        assert!(!stored.email_verified);
    }

    #[actix_web::test]
    async fn duplicate_email_is_a_server_error() {
        let provider = Arc::new(MemoryIdentityProvider::new());
        let app = app!(provider);
        let body = json!({"email": "jane@company.com", "password": "s3cret-pass"});

        let first = test::call_service(&app, create(body.clone()).to_request()).await;
        assert_eq!(first.status(), StatusCode::OK);

        let second = test::call_service(&app, create(body).to_request()).await;
        assert_eq!(second.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let error: Value = test::read_body_json(second).await;
        assert_eq!(
            error,
            json!({"error": "The email address is already in use by another account."})
        );
    }

    #[actix_web::test]
    async fn short_password_is_a_server_error() {
        let provider = Arc::new(MemoryIdentityProvider::new());
        let app = app!(provider);

        let resp = test::call_service(
            &app,
            create(json!({"email": "jane@company.com", "password": "12345"})).to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let error: Value = test::read_body_json(resp).await;
        assert_eq!(
            error,
            json!({"error": "The password must be a string with at least 6 characters."})
        );
    }

    #[actix_web::test]
    async fn malformed_body_is_a_bad_request() {
        let provider = Arc::new(MemoryIdentityProvider::new());
        let app = app!(provider);

        let req = test::TestRequest::post()
            .uri("/create-user")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let error: Value = test::read_body_json(resp).await;
        assert!(error["error"].is_string());
    }
}
