use async_trait::async_trait;
use gloo_net::http::{Request, RequestBuilder, Response};
use rewear_shared::{
    ChangePasswordRequest, ErrorBody, GoogleTokenRequest, LoginRequest, MessageResponse,
    NewProduct, PasswordResetRequest, Product, ProductCreated, ProfileEnvelope, RegisterRequest,
    SearchPlan, User, UserUpdate, WishlistCheck, WishlistEntry, WishlistPayload, WishlistRequest,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use web_sys::RequestCredentials;

use crate::config::AppConfig;
use crate::error::ApiError;

/// Everything the stores and views need from the two services.
///
/// Futures are not `Send`: they run on the browser event loop through
/// `spawn_local`. The trait object itself is shared through Leptos context,
/// which is why implementors are `Send + Sync`.
#[async_trait(?Send)]
pub trait Backend: Send + Sync {
    // ── Auth service ──

    /// `false` when the session cookie is missing or rejected.
    async fn check_authentication(&self) -> Result<bool, ApiError>;
    async fn login(&self, req: &LoginRequest) -> Result<MessageResponse, ApiError>;
    /// The service answers registration with a bare JSON string.
    async fn register(&self, req: &RegisterRequest) -> Result<String, ApiError>;
    async fn google_login(&self, req: &GoogleTokenRequest) -> Result<MessageResponse, ApiError>;
    async fn logout(&self) -> Result<MessageResponse, ApiError>;
    async fn profile(&self) -> Result<User, ApiError>;
    async fn update_profile(&self, update: &UserUpdate) -> Result<MessageResponse, ApiError>;
    async fn change_password(
        &self,
        req: &ChangePasswordRequest,
    ) -> Result<MessageResponse, ApiError>;
    async fn reset_password(&self, req: &PasswordResetRequest)
        -> Result<MessageResponse, ApiError>;

    // ── Product service ──

    async fn search(&self, plan: &SearchPlan) -> Result<Vec<Product>, ApiError>;

    async fn all_products(&self) -> Result<Vec<Product>, ApiError> {
        self.search(&SearchPlan::All).await
    }

    async fn product(&self, id: &str) -> Result<Product, ApiError>;
    /// Listings whose `owner_id` is `owner`, the creator's email.
    async fn products_by_user(&self, owner: &str) -> Result<Vec<Product>, ApiError>;
    async fn create_product(&self, product: &NewProduct) -> Result<ProductCreated, ApiError>;
    async fn update_product(
        &self,
        id: &str,
        product: &NewProduct,
    ) -> Result<MessageResponse, ApiError>;
    async fn delete_product(&self, id: &str) -> Result<MessageResponse, ApiError>;

    // ── Wishlist (product service) ──

    async fn wishlist(&self) -> Result<Vec<WishlistEntry>, ApiError>;
    async fn add_to_wishlist(&self, product_id: &str) -> Result<MessageResponse, ApiError>;
    async fn remove_from_wishlist(&self, product_id: &str) -> Result<MessageResponse, ApiError>;
    async fn in_wishlist(&self, product_id: &str) -> Result<bool, ApiError>;
}

#[derive(Debug, Clone, Copy)]
enum Service {
    Auth,
    Product,
}

/// HTTP implementation of [`Backend`]. Sessions ride on cookies, so every
/// request is sent with credentials.
#[derive(Debug, Clone)]
pub struct ApiClient {
    auth_base: String,
    product_base: String,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            auth_base: config.auth_api.clone(),
            product_base: config.product_api.clone(),
        }
    }

    fn url(&self, service: Service, path: &str) -> String {
        let base = match service {
            Service::Auth => &self.auth_base,
            Service::Product => &self.product_base,
        };
        format!("{base}{path}")
    }

    async fn get<T: DeserializeOwned>(&self, service: Service, path: &str) -> Result<T, ApiError> {
        let url = self.url(service, path);
        let req = Request::get(&url).credentials(RequestCredentials::Include);
        dispatch(req).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        service: Service,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(service, path);
        let req = Request::post(&url).credentials(RequestCredentials::Include);
        dispatch_json(req, body).await
    }

    async fn post_empty<T: DeserializeOwned>(
        &self,
        service: Service,
        path: &str,
    ) -> Result<T, ApiError> {
        let url = self.url(service, path);
        let req = Request::post(&url).credentials(RequestCredentials::Include);
        dispatch(req).await
    }

    async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        service: Service,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(service, path);
        let req = Request::put(&url).credentials(RequestCredentials::Include);
        dispatch_json(req, body).await
    }

    async fn delete<T: DeserializeOwned>(&self, service: Service, path: &str) -> Result<T, ApiError> {
        let url = self.url(service, path);
        let req = Request::delete(&url).credentials(RequestCredentials::Include);
        dispatch(req).await
    }
}

async fn dispatch<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ApiError> {
    let resp = req.send().await.map_err(|e| {
        tracing::error!(error = %e, "request could not be sent");
        ApiError::from(e)
    })?;
    read(resp).await
}

async fn dispatch_json<T: DeserializeOwned, B: Serialize>(
    req: RequestBuilder,
    body: &B,
) -> Result<T, ApiError> {
    let req = req.json(body).map_err(|e| ApiError::Encode(e.to_string()))?;
    let resp = req.send().await.map_err(|e| {
        tracing::error!(error = %e, "request could not be sent");
        ApiError::from(e)
    })?;
    read(resp).await
}

async fn read<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let status = resp.status();
    let ok = resp.ok();
    let text = resp.text().await?;
    if !ok {
        tracing::warn!(status, url = %resp.url(), "request rejected");
    }
    decode_body(status, ok, &text)
}

/// Turns a response body into `T`, or into the server's `detail` message for
/// non-2xx statuses.
fn decode_body<T: DeserializeOwned>(status: u16, ok: bool, text: &str) -> Result<T, ApiError> {
    if !ok {
        let detail = serde_json::from_str::<ErrorBody>(text)
            .ok()
            .and_then(|body| body.message());
        return Err(ApiError::http(status, detail));
    }
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}

fn segment(id: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(id)
}

#[async_trait(?Send)]
impl Backend for ApiClient {
    async fn check_authentication(&self) -> Result<bool, ApiError> {
        match self
            .post_empty::<MessageResponse>(Service::Auth, "/checkAuthentication")
            .await
        {
            Ok(_) => Ok(true),
            Err(ApiError::Http { status: 401, .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn login(&self, req: &LoginRequest) -> Result<MessageResponse, ApiError> {
        self.post(Service::Auth, "/user/login", req).await
    }

    async fn register(&self, req: &RegisterRequest) -> Result<String, ApiError> {
        self.post(Service::Auth, "/user", req).await
    }

    async fn google_login(&self, req: &GoogleTokenRequest) -> Result<MessageResponse, ApiError> {
        self.post(Service::Auth, "/auth/google/token", req).await
    }

    async fn logout(&self) -> Result<MessageResponse, ApiError> {
        self.post_empty(Service::Auth, "/user/logout").await
    }

    async fn profile(&self) -> Result<User, ApiError> {
        let envelope: ProfileEnvelope = self.get(Service::Auth, "/user/me").await?;
        Ok(envelope.into_user())
    }

    async fn update_profile(&self, update: &UserUpdate) -> Result<MessageResponse, ApiError> {
        self.put(Service::Auth, "/user/update", update).await
    }

    async fn change_password(
        &self,
        req: &ChangePasswordRequest,
    ) -> Result<MessageResponse, ApiError> {
        self.put(Service::Auth, "/user/change-password", req).await
    }

    async fn reset_password(
        &self,
        req: &PasswordResetRequest,
    ) -> Result<MessageResponse, ApiError> {
        self.put(Service::Auth, "/user/password-reset", req).await
    }

    async fn search(&self, plan: &SearchPlan) -> Result<Vec<Product>, ApiError> {
        self.get(Service::Product, &plan.path()).await
    }

    async fn product(&self, id: &str) -> Result<Product, ApiError> {
        self.get(Service::Product, &format!("/product/{}", segment(id)))
            .await
    }

    async fn products_by_user(&self, owner: &str) -> Result<Vec<Product>, ApiError> {
        self.get(Service::Product, &format!("/product/user/{}", segment(owner)))
            .await
    }

    async fn create_product(&self, product: &NewProduct) -> Result<ProductCreated, ApiError> {
        self.post(Service::Product, "/product", product).await
    }

    async fn update_product(
        &self,
        id: &str,
        product: &NewProduct,
    ) -> Result<MessageResponse, ApiError> {
        self.put(Service::Product, &format!("/product/{}", segment(id)), product)
            .await
    }

    async fn delete_product(&self, id: &str) -> Result<MessageResponse, ApiError> {
        self.delete(Service::Product, &format!("/product/{}", segment(id)))
            .await
    }

    async fn wishlist(&self) -> Result<Vec<WishlistEntry>, ApiError> {
        let payload: WishlistPayload = self.get(Service::Product, "/wishlist").await?;
        Ok(payload.into_entries())
    }

    async fn add_to_wishlist(&self, product_id: &str) -> Result<MessageResponse, ApiError> {
        let body = WishlistRequest {
            product_id: product_id.to_string(),
        };
        self.post(Service::Product, "/wishlist/add", &body).await
    }

    async fn remove_from_wishlist(&self, product_id: &str) -> Result<MessageResponse, ApiError> {
        let body = WishlistRequest {
            product_id: product_id.to_string(),
        };
        self.post(Service::Product, "/wishlist/remove", &body).await
    }

    async fn in_wishlist(&self, product_id: &str) -> Result<bool, ApiError> {
        let check: WishlistCheck = self
            .get(Service::Product, &format!("/wishlist/check/{}", segment(product_id)))
            .await?;
        Ok(check.in_wishlist)
    }
}

/// In-memory stand-in for both services, used by the store tests.
#[cfg(test)]
pub(crate) mod fake {
    use std::sync::Mutex;

    use rewear_shared::messages;

    use super::*;

    #[derive(Debug, Default)]
    pub(crate) struct FakeState {
        /// The account behind the session cookie, if any.
        pub session: Option<User>,
        /// The account `login`/`register` will sign into.
        pub account: Option<User>,
        pub products: Vec<Product>,
        pub wishlist: Vec<String>,
        /// Every backend method fails with a network error.
        pub offline: bool,
        /// Replaces the success message of the next call that answers with one.
        pub reply: Option<String>,
        pub calls: Vec<String>,
    }

    #[derive(Debug, Default)]
    pub(crate) struct FakeBackend {
        state: Mutex<FakeState>,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_account(self, user: User) -> Self {
            self.update(|s| s.account = Some(user));
            self
        }

        pub fn with_session(self, user: User) -> Self {
            self.update(|s| {
                s.account = Some(user.clone());
                s.session = Some(user);
            });
            self
        }

        pub fn with_products(self, products: Vec<Product>) -> Self {
            self.update(|s| s.products = products);
            self
        }

        pub fn update<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
            f(&mut self.state.lock().unwrap())
        }

        pub fn calls(&self) -> Vec<String> {
            self.update(|s| s.calls.clone())
        }

        fn enter(&self, call: &str) -> Result<(), ApiError> {
            self.update(|s| {
                s.calls.push(call.to_string());
                if s.offline {
                    Err(ApiError::Network("Failed to fetch".into()))
                } else {
                    Ok(())
                }
            })
        }

        fn signed_in(&self) -> Result<User, ApiError> {
            self.update(|s| s.session.clone())
                .ok_or_else(|| ApiError::http(401, Some("Not authenticated".into())))
        }

        fn reply(&self, text: &str) -> String {
            self.update(|s| s.reply.take()).unwrap_or_else(|| text.to_string())
        }

        fn message(&self, text: &str) -> MessageResponse {
            MessageResponse {
                message: self.reply(text),
                ..MessageResponse::default()
            }
        }
    }

    #[async_trait(?Send)]
    impl Backend for FakeBackend {
        async fn check_authentication(&self) -> Result<bool, ApiError> {
            self.enter("check_authentication")?;
            Ok(self.update(|s| s.session.is_some()))
        }

        async fn login(&self, req: &LoginRequest) -> Result<MessageResponse, ApiError> {
            self.enter("login")?;
            let account = self
                .update(|s| s.account.clone())
                .filter(|u| u.email == req.email && req.password == "hunter22")
                .ok_or_else(|| ApiError::http(400, Some("Invalid Password".into())))?;
            self.update(|s| s.session = Some(account));
            Ok(self.message(messages::LOGIN_SUCCESSFUL))
        }

        async fn register(&self, _req: &RegisterRequest) -> Result<String, ApiError> {
            self.enter("register")?;
            self.update(|s| s.session = s.account.clone());
            Ok(self.reply(messages::REGISTERED))
        }

        async fn google_login(
            &self,
            _req: &GoogleTokenRequest,
        ) -> Result<MessageResponse, ApiError> {
            self.enter("google_login")?;
            let account = self.update(|s| {
                s.session = s.account.clone();
                s.account.clone()
            });
            Ok(MessageResponse {
                user: account,
                ..self.message(messages::GOOGLE_LOGIN_SUCCESSFUL)
            })
        }

        async fn logout(&self) -> Result<MessageResponse, ApiError> {
            self.enter("logout")?;
            self.update(|s| s.session = None);
            Ok(self.message("Logged out successfully"))
        }

        async fn profile(&self) -> Result<User, ApiError> {
            self.enter("profile")?;
            self.signed_in()
        }

        async fn update_profile(&self, update: &UserUpdate) -> Result<MessageResponse, ApiError> {
            self.enter("update_profile")?;
            let mut user = self.signed_in()?;
            if let Some(name) = &update.name {
                user.name = Some(name.clone());
            }
            if let Some(location) = &update.location {
                user.location = Some(location.clone());
            }
            self.update(|s| s.session = Some(user.clone()));
            Ok(MessageResponse {
                user: Some(user),
                ..self.message(messages::PROFILE_UPDATED)
            })
        }

        async fn change_password(
            &self,
            req: &ChangePasswordRequest,
        ) -> Result<MessageResponse, ApiError> {
            self.enter("change_password")?;
            self.signed_in()?;
            if req.old_password != "hunter22" {
                return Err(ApiError::http(400, Some("Old password is incorrect".into())));
            }
            Ok(self.message(messages::PASSWORD_CHANGED))
        }

        async fn reset_password(
            &self,
            _req: &PasswordResetRequest,
        ) -> Result<MessageResponse, ApiError> {
            self.enter("reset_password")?;
            Ok(self.message(messages::PASSWORD_RESET))
        }

        async fn search(&self, plan: &SearchPlan) -> Result<Vec<Product>, ApiError> {
            self.enter(&format!("search {}", plan.path()))?;
            Ok(self.update(|s| s.products.clone()))
        }

        async fn product(&self, id: &str) -> Result<Product, ApiError> {
            self.enter("product")?;
            self.update(|s| s.products.iter().find(|p| p.id == id).cloned())
                .ok_or_else(|| ApiError::http(404, Some("Product not found".into())))
        }

        async fn products_by_user(&self, owner: &str) -> Result<Vec<Product>, ApiError> {
            self.enter("products_by_user")?;
            Ok(self.update(|s| {
                s.products
                    .iter()
                    .filter(|p| p.owner_id.as_deref() == Some(owner))
                    .cloned()
                    .collect()
            }))
        }

        async fn create_product(&self, product: &NewProduct) -> Result<ProductCreated, ApiError> {
            self.enter("create_product")?;
            let owner = self.signed_in()?;
            let created: Product = serde_json::from_value(serde_json::json!({
                "_id": format!("p{}", self.update(|s| s.products.len() + 1)),
                "title": product.title,
                "price": product.price,
                "images": product.images,
                "owner_id": owner.email,
            }))
            .map_err(|e| ApiError::Decode(e.to_string()))?;
            self.update(|s| s.products.push(created.clone()));
            Ok(ProductCreated {
                message: messages::PRODUCT_ADDED.to_string(),
                product: created,
            })
        }

        async fn update_product(
            &self,
            id: &str,
            _product: &NewProduct,
        ) -> Result<MessageResponse, ApiError> {
            self.enter("update_product")?;
            Ok(MessageResponse {
                product_id: Some(id.to_string()),
                ..self.message("Product updated successfully")
            })
        }

        async fn delete_product(&self, id: &str) -> Result<MessageResponse, ApiError> {
            self.enter("delete_product")?;
            self.update(|s| s.products.retain(|p| p.id != id));
            Ok(self.message(messages::PRODUCT_DELETED))
        }

        async fn wishlist(&self) -> Result<Vec<WishlistEntry>, ApiError> {
            self.enter("wishlist")?;
            self.signed_in()?;
            let payload = self.update(|s| {
                let products: Vec<&Product> = s
                    .wishlist
                    .iter()
                    .filter_map(|id| s.products.iter().find(|p| &p.id == id))
                    .collect();
                serde_json::to_value(products)
            });
            let payload: WishlistPayload = payload
                .and_then(serde_json::from_value)
                .map_err(|e| ApiError::Decode(e.to_string()))?;
            Ok(payload.into_entries())
        }

        async fn add_to_wishlist(&self, product_id: &str) -> Result<MessageResponse, ApiError> {
            self.enter("add_to_wishlist")?;
            self.signed_in()?;
            self.update(|s| {
                if !s.wishlist.iter().any(|id| id == product_id) {
                    s.wishlist.push(product_id.to_string());
                }
            });
            Ok(self.message("Added to wishlist"))
        }

        async fn remove_from_wishlist(
            &self,
            product_id: &str,
        ) -> Result<MessageResponse, ApiError> {
            self.enter("remove_from_wishlist")?;
            self.signed_in()?;
            self.update(|s| s.wishlist.retain(|id| id != product_id));
            Ok(self.message("Removed from wishlist"))
        }

        async fn in_wishlist(&self, product_id: &str) -> Result<bool, ApiError> {
            self.enter("in_wishlist")?;
            Ok(self.update(|s| s.wishlist.iter().any(|id| id == product_id)))
        }
    }

    pub(crate) fn user(id: &str, email: &str) -> User {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "email": email,
            "name": "Sarah Johnson",
            "role": "user",
            "swaps": 25,
        }))
        .unwrap()
    }

    pub(crate) fn product(id: &str, title: &str, price: f64) -> Product {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "title": title,
            "price": price,
            "images": [format!("https://img.rewear.dev/{id}.jpg")],
            "condition": "Good",
            "size": "M",
            "owner": "Emma K.",
            "owner_id": "u-emma",
        }))
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use rewear_shared::{SearchFilters, User};

    use super::*;

    #[test]
    fn error_detail_is_surfaced() {
        let err = decode_body::<User>(400, false, r#"{"detail":"Email already registered"}"#)
            .unwrap_err();
        assert_eq!(err.to_string(), "Email already registered");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn error_without_detail_reports_the_status() {
        let err = decode_body::<User>(500, false, "<html>bad gateway</html>").unwrap_err();
        assert_eq!(err.to_string(), "HTTP error! status: 500");
    }

    #[test]
    fn unexpected_success_body_is_a_decode_error() {
        let err = decode_body::<Vec<Product>>(200, true, r#"{"items":[]}"#).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn register_reply_is_a_bare_string() {
        let reply: String =
            decode_body(200, true, r#""Thank You! Succesfully Completed ""#).unwrap();
        assert_eq!(reply, rewear_shared::messages::REGISTERED);
    }

    #[test]
    fn urls_join_service_base_and_path() {
        let client = ApiClient::new(&AppConfig::default());
        let filters = SearchFilters {
            brand: Some("Levi's".into()),
            ..SearchFilters::default()
        };
        assert_eq!(
            client.url(Service::Product, &filters.plan().path()),
            "http://localhost:8002/product/advanced-search?brand=Levi%27s"
        );
        assert_eq!(
            client.url(Service::Auth, "/user/me"),
            "http://localhost:8001/user/me"
        );
        assert_eq!(segment("a b/c"), "a%20b%2Fc");
    }
}
