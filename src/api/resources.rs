use crate::api::{client::ApiClient, errors::ApiError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr};
use tracing::instrument;

/// Entities are displayed as the server sends them.
pub type Entity = Value;

pub const REGISTER_NEW_TRUCK_PATH: &str = "/trucks/register-new-truck";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Contractors,
    Factories,
    Gates,
    Trucks,
}

impl Resource {
    pub const ALL: [Self; 5] = [
        Self::Users,
        Self::Contractors,
        Self::Factories,
        Self::Gates,
        Self::Trucks,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Contractors => "contractors",
            Self::Factories => "factories",
            Self::Gates => "gates",
            Self::Trucks => "trucks",
        }
    }

    #[must_use]
    pub fn path(self) -> String {
        format!("/{}", self.name())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|resource| resource.name() == value)
            .ok_or_else(|| format!("unknown resource: {value}"))
    }
}

/// `data` payload of the gate kiosk registration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TruckRegistration {
    pub truck: Entity,
    pub contractor: Entity,
    pub factory: Entity,
}

/// CRUD calls for one collection. Methods take the handle by value, so their
/// futures borrow only the [`ApiClient`].
#[derive(Clone, Copy, Debug)]
pub struct ResourceClient<'a> {
    client: &'a ApiClient,
    resource: Resource,
}

impl ResourceClient<'_> {
    #[must_use]
    pub const fn resource(self) -> Resource {
        self.resource
    }

    /// # Errors
    /// Returns any [`ApiError`] from the client.
    #[instrument(skip(self), fields(resource = %self.resource))]
    pub async fn list(self) -> Result<Vec<Entity>, ApiError> {
        self.client.get(&self.resource.path()).await
    }

    /// # Errors
    /// Returns any [`ApiError`] from the client.
    #[instrument(skip(self), fields(resource = %self.resource))]
    pub async fn list_with_query(self, query: &[(String, String)]) -> Result<Vec<Entity>, ApiError> {
        self.client
            .get_with_query(&self.resource.path(), query)
            .await
    }

    /// # Errors
    /// Returns any [`ApiError`] from the client.
    #[instrument(skip_all, fields(resource = %self.resource))]
    pub async fn create(self, body: &Entity) -> Result<Entity, ApiError> {
        self.client.post(&self.resource.path(), body).await
    }

    /// # Errors
    /// Returns [`ApiError::Serialization`] for an unusable id, otherwise any
    /// [`ApiError`] from the client.
    #[instrument(skip(self, body), fields(resource = %self.resource))]
    pub async fn update(self, id: &str, body: &Entity) -> Result<Entity, ApiError> {
        let path = self.item_path(id)?;
        self.client.put(&path, body).await
    }

    /// # Errors
    /// Returns [`ApiError::Serialization`] for an unusable id, otherwise any
    /// [`ApiError`] from the client.
    #[instrument(skip(self), fields(resource = %self.resource))]
    pub async fn delete(self, id: &str) -> Result<Entity, ApiError> {
        let path = self.item_path(id)?;
        self.client.delete(&path).await
    }

    fn item_path(self, id: &str) -> Result<String, ApiError> {
        Ok(format!("{}/{}", self.resource.path(), validate_id(id)?))
    }
}

impl ApiClient {
    #[must_use]
    pub const fn resource(&self, resource: Resource) -> ResourceClient<'_> {
        ResourceClient {
            client: self,
            resource,
        }
    }

    /// Kiosk registration used by gate staff; works with or without a session.
    ///
    /// # Errors
    /// Returns any [`ApiError`] from the client.
    #[instrument(skip_all)]
    pub async fn register_new_truck(&self, body: &Entity) -> Result<TruckRegistration, ApiError> {
        self.post(REGISTER_NEW_TRUCK_PATH, body).await
    }

    /// # Errors
    /// Returns [`ApiError::Serialization`] for an unusable id, otherwise any
    /// [`ApiError`] from the client.
    #[instrument(skip(self, body))]
    pub async fn update_user_password(&self, id: &str, body: &Entity) -> Result<Entity, ApiError> {
        let path = format!("/users/{}/password", validate_id(id)?);
        self.put(&path, body).await
    }
}

/// Ids are interpolated into the path, so only URL-safe characters pass.
fn validate_id(id: &str) -> Result<&str, ApiError> {
    let id = id.trim();
    if !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(id)
    } else {
        Err(ApiError::Serialization(format!("Invalid resource id: {id:?}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{
        api::client::{CredentialSource, UnauthorizedHandler},
        config::AppConfig,
        session::types::Credential,
    };
    use serde_json::json;
    use std::{net::TcpListener, sync::Arc};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    struct Token;

    impl CredentialSource for Token {
        fn credential(&self) -> Option<Credential> {
            Some(Credential::new("tok-A"))
        }
    }

    struct Ignore;

    impl UnauthorizedHandler for Ignore {
        fn on_unauthorized(&self) {}
    }

    fn client(uri: &str) -> ApiClient {
        ApiClient::new(&AppConfig::new(uri).unwrap(), Arc::new(Token), Arc::new(Ignore)).unwrap()
    }

    #[test]
    fn resource_names_parse() {
        assert_eq!("Gates".parse::<Resource>().unwrap(), Resource::Gates);
        assert_eq!(Resource::Contractors.path(), "/contractors");
        assert!("stats".parse::<Resource>().is_err());
    }

    #[test]
    fn validate_id_rejects_path_characters() {
        assert_eq!(validate_id(" 64f1c2ab ").unwrap(), "64f1c2ab");
        assert!(validate_id("").is_err());
        assert!(validate_id("../users").is_err());
        assert!(validate_id("a/b").is_err());
    }

    #[tokio::test]
    async fn crud_calls_hit_resource_paths() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/factories"))
            .and(header("Authorization", "Bearer tok-A"))
            .and(body_json(json!({ "name": "Plant 2" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": { "_id": "f2", "name": "Plant 2" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/api/factories/f2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "_id": "f2", "name": "Plant Two" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/api/factories/f2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "_id": "f2" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&format!("{}/api", server.uri()));
        let factories = client.resource(Resource::Factories);

        let created = factories.create(&json!({ "name": "Plant 2" })).await.unwrap();
        assert_eq!(factories.resource(), Resource::Factories);
        assert_eq!(created["_id"], "f2");

        let updated = factories
            .update("f2", &json!({ "name": "Plant Two" }))
            .await
            .unwrap();
        assert_eq!(updated["name"], "Plant Two");

        let deleted = factories.delete("f2").await.unwrap();
        assert_eq!(deleted["_id"], "f2");
    }

    #[tokio::test]
    async fn calls_on_temporary_clients_can_run_concurrently() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;

        for (collection, name) in [("/gates", "North"), ("/contractors", "Acme")] {
            Mock::given(method("GET"))
                .and(path(collection))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "data": [{ "name": name }]
                })))
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = client(&server.uri());
        let (gates, contractors) = tokio::join!(
            client.resource(Resource::Gates).list(),
            client.resource(Resource::Contractors).list(),
        );

        assert_eq!(gates.unwrap()[0]["name"], "North");
        assert_eq!(contractors.unwrap()[0]["name"], "Acme");
    }

    #[tokio::test]
    async fn register_new_truck_decodes_registration() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(REGISTER_NEW_TRUCK_PATH))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": {
                    "truck": { "plate": "ABC-123" },
                    "contractor": { "name": "Acme" },
                    "factory": { "name": "Plant 1" }
                }
            })))
            .mount(&server)
            .await;

        let registration = client(&server.uri())
            .register_new_truck(&json!({ "plate": "ABC-123" }))
            .await
            .unwrap();

        assert_eq!(registration.truck["plate"], "ABC-123");
        assert_eq!(registration.contractor["name"], "Acme");
    }

    #[tokio::test]
    async fn update_user_password_uses_password_path() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/users/u1/password"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": { "_id": "u1" } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let updated = client(&server.uri())
            .update_user_password("u1", &json!({ "password": "n3w-secret" }))
            .await
            .unwrap();
        assert_eq!(updated["_id"], "u1");
    }
}
