#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        ENV_ACCEPT_INVALID_CERTS, ENV_COURSE_ID, ENV_PASSWORD, ENV_SITE_BASE_URL, ENV_USERNAME,
    },
    error::CheckError,
};

/// Reads a non-blank environment variable.
fn read_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Parses a truthy/falsy flag value.
fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Connection settings for an edX LMS site.
///
/// Every field is optional so that environment, declaration file, and command
/// line can each fill in part of it; see [`SiteConfig::overlay`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Base url of the LMS, e.g. `http://192.168.33.10`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_base_url:        Option<String>,
    /// Staff username (the login email).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username:             Option<String>,
    /// Staff password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password:             Option<String>,
    /// Course id, e.g. `course-v1:edX+DemoX+Demo_Course`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id:            Option<String>,
    /// Skip TLS certificate verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_invalid_certs: Option<bool>,
}

impl SiteConfig {
    /// Reads settings from `EDXCUT_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            site_base_url:        read_env(ENV_SITE_BASE_URL),
            username:             read_env(ENV_USERNAME),
            password:             read_env(ENV_PASSWORD),
            course_id:            read_env(ENV_COURSE_ID),
            accept_invalid_certs: read_env(ENV_ACCEPT_INVALID_CERTS)
                .as_deref()
                .and_then(parse_flag),
        }
    }

    /// Returns these settings with every field `other` sets taking precedence.
    pub fn overlay(self, other: &SiteConfig) -> SiteConfig {
        SiteConfig {
            site_base_url:        other.site_base_url.clone().or(self.site_base_url),
            username:             other.username.clone().or(self.username),
            password:             other.password.clone().or(self.password),
            course_id:            other.course_id.clone().or(self.course_id),
            accept_invalid_certs: other.accept_invalid_certs.or(self.accept_invalid_certs),
        }
    }

    /// Returns a required field or a configuration error naming it.
    fn require<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str, CheckError> {
        field
            .as_deref()
            .ok_or_else(|| CheckError::configuration(format!("no {name} configured")))
    }

    /// The LMS base url, without a trailing slash.
    pub fn require_site_base_url(&self) -> Result<&str, CheckError> {
        Self::require(&self.site_base_url, "site_base_url").map(|url| url.trim_end_matches('/'))
    }

    /// The staff username.
    pub fn require_username(&self) -> Result<&str, CheckError> {
        Self::require(&self.username, "username")
    }

    /// The staff password.
    pub fn require_password(&self) -> Result<&str, CheckError> {
        Self::require(&self.password, "password")
    }

    /// The course id.
    pub fn require_course_id(&self) -> Result<&str, CheckError> {
        Self::require(&self.course_id, "course_id")
    }

    /// Whether TLS certificate verification is skipped.
    pub fn accept_invalid_certs(&self) -> bool {
        self.accept_invalid_certs.unwrap_or(false)
    }
}
