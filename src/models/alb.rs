//! ALB target group request/response models.
//!
//! These types define the JSON events an Application Load Balancer sends to a
//! Lambda target and the replies it expects back. See
//! <https://docs.aws.amazon.com/elasticloadbalancing/latest/application/lambda-functions.html>.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::utils::lift_single;

/// Query parameters or headers in multi-value shape.
pub type MultiValueMap = HashMap<String, Vec<String>>;

/// Treats an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Event delivered by ALB to the Lambda target.
///
/// ALB sends either the single-value or the multi-value variant of query
/// parameters and headers, depending on the target group's
/// `lambda.multi_value_headers.enabled` attribute.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AlbTargetGroupRequest {
    #[serde(
        rename = "httpMethod",
        alias = "method",
        default,
        deserialize_with = "null_as_default"
    )]
    pub http_method: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(alias = "query", default, skip_serializing_if = "Option::is_none")]
    pub query_string_parameters: Option<HashMap<String, String>>,
    #[serde(alias = "multiQuery", default, skip_serializing_if = "Option::is_none")]
    pub multi_value_query_string_parameters: Option<MultiValueMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(alias = "multiHeaders", default, skip_serializing_if = "Option::is_none")]
    pub multi_value_headers: Option<MultiValueMap>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(alias = "bodyEncoded", default, deserialize_with = "null_as_default")]
    pub is_base64_encoded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_context: Option<AlbRequestContext>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AlbRequestContext {
    #[serde(default)]
    pub elb: ElbContext,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ElbContext {
    #[serde(default)]
    pub target_group_arn: String,
}

/// Shape the reply headers must take, mirroring the inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderForm {
    #[default]
    Single,
    Multi,
}

/// Single- or multi-value parameters, resolved once from the two optional
/// event fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Params {
    Single(HashMap<String, String>),
    Multi(MultiValueMap),
}

impl Params {
    /// The multi-value form wins whenever it is present, even when empty.
    #[must_use]
    pub fn resolve(
        single: Option<HashMap<String, String>>,
        multi: Option<MultiValueMap>,
    ) -> Self {
        match multi {
            Some(multi) => Self::Multi(multi),
            None => Self::Single(single.unwrap_or_default()),
        }
    }

    /// Lifts single values into one-element sequences.
    #[must_use]
    pub fn into_multi(self) -> MultiValueMap {
        match self {
            Self::Single(single) => lift_single(single),
            Self::Multi(multi) => multi,
        }
    }
}

/// Event fields after the single/multi duality has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEvent {
    pub method: String,
    pub path: String,
    pub query: Params,
    pub headers: Params,
    pub body: String,
    pub body_encoded: bool,
}

impl AlbTargetGroupRequest {
    #[must_use]
    pub const fn header_form(&self) -> HeaderForm {
        if self.multi_value_headers.is_some() {
            HeaderForm::Multi
        } else {
            HeaderForm::Single
        }
    }

    #[must_use]
    pub fn target_group_arn(&self) -> Option<&str> {
        self.request_context
            .as_ref()
            .map(|ctx| ctx.elb.target_group_arn.as_str())
    }

    #[must_use]
    pub fn resolve(self) -> ResolvedEvent {
        ResolvedEvent {
            method: self.http_method,
            path: self.path,
            query: Params::resolve(
                self.query_string_parameters,
                self.multi_value_query_string_parameters,
            ),
            headers: Params::resolve(self.headers, self.multi_value_headers),
            body: self.body,
            body_encoded: self.is_base64_encoded,
        }
    }
}

/// Reply returned to ALB. Exactly one of `headers` / `multi_value_headers` is set.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AlbTargetGroupResponse {
    pub status_code: u16,
    pub status_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_value_headers: Option<MultiValueMap>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub is_base64_encoded: bool,
}
