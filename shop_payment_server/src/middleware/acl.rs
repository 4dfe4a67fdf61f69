//! Access control list middleware for the shop payment server.
//! This middleware can be placed on any route or service inside the authenticated `/api` scope.
//!
//! It reads the claims that [`super::JwtMiddlewareService`] placed in the request extensions and checks the token's
//! role against the roles allowed on the route. If the role is one of them, the request will be allowed to continue.
//! Otherwise, a 403 Forbidden response will be returned.

use std::{future::Future, pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::future::{ok, Ready};
use log::warn;

use crate::{
    auth::{JwtClaims, Role},
    errors::{AuthError, ServerError},
};

pub struct AclMiddlewareFactory {
    allowed_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(allowed_roles: &[Role]) -> Self {
        AclMiddlewareFactory { allowed_roles: allowed_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AclMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { allowed_roles: self.allowed_roles.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    allowed_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let allowed_roles = self.allowed_roles.clone();
        Box::pin(async move {
            let role = req.extensions().get::<JwtClaims>().map(|c| c.role);
            match role {
                Some(role) if allowed_roles.contains(&role) => service.call(req).await,
                Some(role) => {
                    warn!("💻️ Role '{role}' tried to access {} without permission", req.path());
                    let allowed = allowed_roles.iter().map(Role::to_string).collect::<Vec<_>>().join(", ");
                    Err(ServerError::AuthenticationError(AuthError::InsufficientPermissions(format!(
                        "This route requires one of these roles: {allowed}"
                    )))
                    .into())
                },
                None => {
                    warn!("💻️ No JWT claims found in request extensions for {}", req.path());
                    Err(ServerError::AuthenticationError(AuthError::MissingToken).into())
                },
            }
        })
    }
}
