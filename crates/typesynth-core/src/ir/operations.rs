use serde::Serialize;

use crate::parse::parameter::ParameterLocation;

use super::types::{NormalizedName, TypeExpr};

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Trace => "TRACE",
        }
    }
}

/// The resolved types an operation's signature needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationBinding {
    pub name: NormalizedName,
    pub method: HttpMethod,
    pub path: String,
    pub parameters: Vec<ParameterBinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<BodyBinding>,
    pub responses: Vec<ResponseBinding>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

impl OperationBinding {
    /// Every declared type name the binding mentions.
    pub fn referenced_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for param in &self.parameters {
            param.ty.collect_names(&mut out);
        }
        if let Some(ref body) = self.request_body {
            body.ty.collect_names(&mut out);
        }
        for response in &self.responses {
            if let Some(ref ty) = response.ty {
                ty.collect_names(&mut out);
            }
        }
        out
    }

    pub fn response(&self, status: &str) -> Option<&ResponseBinding> {
        self.responses.iter().find(|r| r.status == status)
    }
}

/// A resolved path/query/header/cookie parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterBinding {
    pub name: NormalizedName,
    pub location: ParameterLocation,
    pub ty: TypeExpr,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A resolved request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyBinding {
    pub content_type: String,
    pub ty: TypeExpr,
    pub required: bool,
}

/// A resolved response. `ty` is `None` when the response has no body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseBinding {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ty: Option<TypeExpr>,
    pub description: String,
}
