//! Session helpers keeping HTTP handlers free of framework-specific logic.
//!
//! The backend does not own authentication (a deployment concern); it only
//! reads a manage capability from the cookie session. [`grant_manage`] exists
//! for embedding applications and tests that establish the capability
//! themselves.
//!
//! [`grant_manage`]: SessionContext::grant_manage

use actix_session::Session;
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;

use crate::domain::Error;

pub(crate) const MANAGE_KEY: &str = "can_manage";

/// Newtype wrapper exposing capability checks over the Actix session.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the manage capability into the session cookie.
    ///
    /// # Errors
    ///
    /// Fails with an internal error when the session cannot be written.
    pub fn grant_manage(&self) -> Result<(), Error> {
        self.0
            .insert(MANAGE_KEY, true)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Whether the current actor carries the manage capability.
    ///
    /// # Errors
    ///
    /// Fails with an internal error when the session cannot be read.
    pub fn can_manage(&self) -> Result<bool, Error> {
        self.0
            .get::<bool>(MANAGE_KEY)
            .map(|flag| flag.unwrap_or(false))
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))
    }

    /// Require the manage capability or fail with `403 Forbidden`.
    ///
    /// # Errors
    ///
    /// Returns a forbidden error when the capability is absent.
    pub fn require_manage(&self) -> Result<(), Error> {
        if self.can_manage()? {
            Ok(())
        } else {
            Err(Error::forbidden(
                "You do not have permission to manage feedback entries",
            ))
        }
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App, HttpResponse};

    #[actix_web::test]
    async fn manage_capability_round_trips_through_the_cookie() {
        let app = test::init_service(
            App::new()
                .wrap(crate::inbound::http::test_utils::test_session_middleware())
                .route(
                    "/grant",
                    web::get().to(|session: SessionContext| async move {
                        session.grant_manage().map_err(crate::inbound::http::ApiError::from)?;
                        Ok::<_, crate::inbound::http::ApiError>(HttpResponse::Ok().finish())
                    }),
                )
                .route(
                    "/check",
                    web::get().to(|session: SessionContext| async move {
                        session
                            .require_manage()
                            .map_err(crate::inbound::http::ApiError::from)?;
                        Ok::<_, crate::inbound::http::ApiError>(HttpResponse::Ok().finish())
                    }),
                ),
        )
        .await;

        // Without the capability the check is refused.
        let denied =
            test::call_service(&app, test::TestRequest::get().uri("/check").to_request()).await;
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);

        let granted =
            test::call_service(&app, test::TestRequest::get().uri("/grant").to_request()).await;
        assert_eq!(granted.status(), StatusCode::OK);
        let cookie = granted
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie set")
            .into_owned();

        let allowed = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/check")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(allowed.status(), StatusCode::OK);
    }

    #[::core::prelude::v1::test]
    fn missing_capability_is_forbidden() {
        // The error itself carries the forbidden code; transport mapping is
        // covered in the error module.
        let error = Error::forbidden("You do not have permission to manage feedback entries");
        assert_eq!(error.code(), ErrorCode::Forbidden);
    }
}
