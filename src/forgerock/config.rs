use serde::Deserialize;
use url::Url;

use super::ForgeRockError;

/// The API version AM expects for the callback protocol we speak.
pub const DEFAULT_API_VERSION: &str = "protocol=1.0,resource=2.1";

/// How the embedding application points us at its AM deployment.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoginConfig {
    /// The full URL of the `authenticate` endpoint.
    pub authenticate_url: Url,
    /// Which tree or service to run. Without one, AM uses the realm default.
    #[serde(default)]
    pub auth_index: Option<AuthIndex>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

/// ForgeRock documents that you may specify an auth index "type" and "value".
/// For example, the "service" type with a tree name.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AuthIndex {
    pub index_type: String,
    pub value: String,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

impl LoginConfig {
    pub fn new(authenticate_url: Url) -> Self {
        Self {
            authenticate_url,
            auth_index: None,
            api_version: default_api_version(),
        }
    }

    /// Builds the authenticate endpoint for a realm beneath the root realm,
    /// e.g. `https://login.example.com/am` and `customers` become
    /// `https://login.example.com/am/json/realms/root/realms/customers/authenticate`.
    ///
    /// An empty realm (or `/`) targets the root realm itself.
    pub fn for_realm(server: &str, realm: &str) -> Result<Self, ForgeRockError> {
        let mut url = Url::parse(server)?;
        let realm = realm.trim_matches('/');
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ForgeRockError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?;
            segments.pop_if_empty().extend(["json", "realms", "root"]);
            if !realm.is_empty() {
                segments.extend(["realms", realm]);
            }
            segments.push("authenticate");
        }
        Ok(Self::new(url))
    }

    pub fn with_auth_index(mut self, index_type: &str, value: &str) -> Self {
        self.auth_index = Some(AuthIndex {
            index_type: index_type.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// The endpoint with any auth index appended as query parameters.
    pub fn endpoint(&self) -> Url {
        let mut url = self.authenticate_url.clone();
        if let Some(index) = &self.auth_index {
            url.query_pairs_mut()
                .append_pair("authIndexType", &index.index_type)
                .append_pair("authIndexValue", &index.value);
        }
        url
    }
}
