//! Normalized identity extraction from OAuth2 provider attribute maps.
//!
//! Each supported provider returns user attributes under different keys;
//! this module maps them onto one shape. The provider set is a closed match,
//! unknown names fail with [`AuthError::UnsupportedProvider`].

use mt_identity_core::{AuthError, AuthResult};
use serde_json::Value;

/// Provider-reported identity, normalized across providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUserInfo {
    /// Provider-assigned stable user id.
    pub id: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Extract a [`ProviderUserInfo`] from a provider's raw attribute map.
pub fn extract(provider: &str, attributes: &Value) -> AuthResult<ProviderUserInfo> {
    match provider.to_ascii_lowercase().as_str() {
        "google" => Ok(google(attributes)),
        "facebook" => Ok(facebook(attributes)),
        "apple" => Ok(apple(attributes)),
        other => Err(AuthError::UnsupportedProvider(other.to_string())),
    }
}

fn google(attributes: &Value) -> ProviderUserInfo {
    ProviderUserInfo {
        // Google's v1 userinfo endpoint reports "id", newer ones "sub".
        id: str_field(attributes, "sub").or_else(|| str_field(attributes, "id")),
        email: str_field(attributes, "email"),
        first_name: str_field(attributes, "given_name"),
        last_name: str_field(attributes, "family_name"),
    }
}

fn facebook(attributes: &Value) -> ProviderUserInfo {
    ProviderUserInfo {
        id: str_field(attributes, "id"),
        email: str_field(attributes, "email"),
        first_name: str_field(attributes, "first_name"),
        last_name: str_field(attributes, "last_name"),
    }
}

fn apple(attributes: &Value) -> ProviderUserInfo {
    // Apple nests the name parts under a "name" object.
    let name = attributes.get("name");
    ProviderUserInfo {
        id: str_field(attributes, "sub"),
        email: str_field(attributes, "email"),
        first_name: name.and_then(|n| str_field(n, "firstName")),
        last_name: name.and_then(|n| str_field(n, "lastName")),
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(String::from)
}
