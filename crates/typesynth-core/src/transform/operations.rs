use indexmap::IndexMap;
use log::{debug, warn};

use crate::config::{NamingConfig, NamingStrategy};
use crate::diagnostics::{Diagnostic, escape_pointer, unescape_pointer};
use crate::error::SynthError;
use crate::ir::{
    BodyBinding, HttpMethod, OperationBinding, ParameterBinding, ResponseBinding, TypeExpr,
};
use crate::model::Lowerer;
use crate::parse::ComponentRef;
use crate::parse::components::Components;
use crate::parse::media_type::MediaType;
use crate::parse::operation::{Operation, PathItem};
use crate::parse::parameter::{Parameter, ParameterLocation};
use crate::parse::request_body::RequestBody;
use crate::parse::response::{Response, is_success_status};
use crate::parse::schema::SchemaOrRef;
use crate::parse::spec::{OasVersion, OpenApiSpec};

use super::name_normalizer::{normalize_name, route_to_name};
use super::synthesizer::{Scope, TypeSynthesizer};

/// How many `$ref` hops a parameter, body or response may take.
const MAX_REF_HOPS: usize = 8;

/// Resolve the parameter, body and response types of every operation.
///
/// An operation that cannot be bound is reported and left out; the others
/// are unaffected.
pub(crate) fn bind_operations(
    spec: &OpenApiSpec,
    synth: &mut TypeSynthesizer<'_>,
    naming: &NamingConfig,
) -> Vec<OperationBinding> {
    let empty = Components::default();
    let mut binder = OperationBinder {
        components: spec.components.as_ref().unwrap_or(&empty),
        version: spec.version(),
        naming,
        synth,
    };

    let mut out = Vec::new();
    for (path, item) in &spec.paths {
        binder.collect(path, item, &mut out);
    }
    out
}

struct OperationBinder<'s, 'a, 'b> {
    components: &'s Components,
    version: OasVersion,
    naming: &'s NamingConfig,
    synth: &'b mut TypeSynthesizer<'a>,
}

impl<'s> OperationBinder<'s, '_, '_> {
    fn collect(&mut self, path: &str, item: &'s PathItem, out: &mut Vec<OperationBinding>) {
        macro_rules! bind_op {
            ($method:expr, $op:expr) => {
                if let Some(ref op) = $op {
                    match self.bind($method, path, item, op) {
                        Ok(binding) => out.push(binding),
                        Err(err) => {
                            warn!("operation {} {path} not bound: {err}", $method.as_str());
                            self.synth.push_diagnostic(Diagnostic::from(&err));
                        }
                    }
                }
            };
        }

        bind_op!(HttpMethod::Get, item.get);
        bind_op!(HttpMethod::Post, item.post);
        bind_op!(HttpMethod::Put, item.put);
        bind_op!(HttpMethod::Delete, item.delete);
        bind_op!(HttpMethod::Patch, item.patch);
        bind_op!(HttpMethod::Options, item.options);
        bind_op!(HttpMethod::Head, item.head);
        bind_op!(HttpMethod::Trace, item.trace);
    }

    fn bind(
        &mut self,
        method: HttpMethod,
        path: &str,
        item: &'s PathItem,
        op: &'s Operation,
    ) -> Result<OperationBinding, SynthError> {
        let raw_name = match self.naming.strategy {
            NamingStrategy::UseOperationId => op
                .operation_id
                .clone()
                .unwrap_or_else(|| route_to_name(method.as_str(), path)),
            NamingStrategy::UseRouteBased => route_to_name(method.as_str(), path),
        };
        let name = self
            .naming
            .aliases
            .get(&raw_name)
            .cloned()
            .unwrap_or(raw_name);
        let name = normalize_name(&name);
        let base = name.pascal_case.clone();

        let path_ptr = format!("#/paths/{}", escape_pointer(path));
        let op_ptr = format!("{path_ptr}/{}", method.as_str().to_lowercase());
        debug!("binding operation `{name}` ({} {path})", method.as_str());

        // Operation-level parameters override path-level ones with the same name and location.
        let mut merged: IndexMap<(String, ParameterLocation), (&'s Parameter, String)> =
            IndexMap::new();
        let levels = [(&item.parameters, &path_ptr), (&op.parameters, &op_ptr)];
        for (params, ptr) in levels {
            for (i, param) in params.iter().enumerate() {
                let param_ptr = format!("{ptr}/parameters/{i}");
                let param = follow(&self.components.parameters, param, &param_ptr)?;
                let key = (param.name.clone(), param.location.clone());
                merged.insert(key, (param, param_ptr));
            }
        }

        let mut parameters = Vec::with_capacity(merged.len());
        for (param, ptr) in merged.into_values() {
            let param_name = normalize_name(&param.name);
            let ty = match param.typed_schema() {
                Some((suffix, schema)) => self.schema_type(
                    schema,
                    &format!("{base}{}Param", param_name.pascal_case),
                    &format!("{ptr}/{suffix}"),
                )?,
                None => TypeExpr::any(),
            };
            parameters.push(ParameterBinding {
                name: param_name,
                location: param.location.clone(),
                ty,
                required: param.required,
                description: param.description.clone(),
            });
        }

        let request_body = match op.request_body {
            Some(ref body) => {
                let body_ptr = format!("{op_ptr}/requestBody");
                let body = follow(&self.components.request_bodies, body, &body_ptr)?;
                self.bind_body(body, &format!("{base}Body"), &body_ptr)?
            }
            None => None,
        };

        let mut responses = Vec::with_capacity(op.responses.len());
        let mut seen_success = false;
        for (status, response) in &op.responses {
            let response_ptr = format!("{op_ptr}/responses/{}", escape_pointer(status));
            let response = follow(&self.components.responses, response, &response_ptr)?;
            let candidate = if is_success_status(status) && !seen_success {
                seen_success = true;
                format!("{base}Response")
            } else {
                format!("{base}{}Response", normalize_name(status).pascal_case)
            };
            responses.push(self.bind_response(status, response, &candidate, &response_ptr)?);
        }

        Ok(OperationBinding {
            name,
            method,
            path: path.to_string(),
            parameters,
            request_body,
            responses,
            deprecated: op.deprecated.unwrap_or(false),
        })
    }

    fn bind_body(
        &mut self,
        body: &'s RequestBody,
        candidate: &str,
        ptr: &str,
    ) -> Result<Option<BodyBinding>, SynthError> {
        let Some((content_type, media)) = body.media() else {
            return Ok(None);
        };
        let ty = self.media_type(media, candidate, ptr, content_type)?;
        Ok(Some(BodyBinding {
            content_type: content_type.clone(),
            ty,
            required: body.required,
        }))
    }

    fn bind_response(
        &mut self,
        status: &str,
        response: &'s Response,
        candidate: &str,
        ptr: &str,
    ) -> Result<ResponseBinding, SynthError> {
        let (content_type, ty) = match response.media() {
            Some((content_type, media)) => (
                Some(content_type.clone()),
                Some(self.media_type(media, candidate, ptr, content_type)?),
            ),
            None => (None, None),
        };
        Ok(ResponseBinding {
            status: status.to_string(),
            content_type,
            ty,
            description: response.description.clone(),
        })
    }

    fn media_type(
        &mut self,
        media: &MediaType,
        candidate: &str,
        ptr: &str,
        content_type: &str,
    ) -> Result<TypeExpr, SynthError> {
        match media.schema {
            Some(ref schema) => self.schema_type(
                schema,
                candidate,
                &format!("{ptr}/content/{}/schema", escape_pointer(content_type)),
            ),
            None => Ok(TypeExpr::any()),
        }
    }

    /// Lower an operation-level schema and resolve it against the components.
    fn schema_type(
        &mut self,
        schema: &SchemaOrRef,
        candidate: &str,
        ptr: &str,
    ) -> Result<TypeExpr, SynthError> {
        let mut diagnostics = Vec::new();
        let node = Lowerer::new(self.version, &mut diagnostics).lower(schema, ptr);
        for diagnostic in diagnostics {
            self.synth.push_diagnostic(diagnostic);
        }
        self.synth
            .type_expr(&node, &Scope::new(candidate, ptr), 0)
    }
}

/// Follow `$ref`s through `#/components/<section>/<name>` to an inline entry.
fn follow<'s, T: ComponentRef>(
    table: &'s IndexMap<String, T>,
    start: &'s T,
    ptr: &str,
) -> Result<&'s T::Target, SynthError> {
    let prefix = format!("#/components/{}/", T::SECTION);
    let mut current = start;
    for _ in 0..MAX_REF_HOPS {
        let ref_path = match current.split() {
            Ok(target) => return Ok(target),
            Err(ref_path) => ref_path,
        };
        current = ref_path
            .strip_prefix(&prefix)
            .map(unescape_pointer)
            .and_then(|name| table.get(&name))
            .ok_or_else(|| SynthError::UndefinedReference {
                path: ptr.to_string(),
                name: ref_path.to_string(),
            })?;
    }
    Err(too_many_hops(ptr))
}

fn too_many_hops(ptr: &str) -> SynthError {
    SynthError::CircularAlias {
        path: ptr.to_string(),
        name: ptr.to_string(),
    }
}
