//! Constraint and nullability normalization.
//!
//! OpenAPI 3.0 and 3.1 spell nullability and exclusive bounds differently.
//! Both spellings collapse into [`Constraints`] plus a single `nullable` flag
//! here, and constraints that cannot apply to the schema's base type are
//! dropped with a diagnostic instead of being carried along.

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::parse::schema::{ExclusiveBound, Schema};
use crate::parse::spec::OasVersion;

use super::node::{Bound, ConstraintTarget, Constraints};

/// Result of normalizing one raw schema's validation keywords.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedAttributes {
    pub constraints: Constraints,
    pub nullable: bool,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Clone, Copy)]
enum Side {
    Min,
    Max,
}

impl Side {
    fn keywords(self) -> (&'static str, &'static str) {
        match self {
            Side::Min => ("minimum", "exclusiveMinimum"),
            Side::Max => ("maximum", "exclusiveMaximum"),
        }
    }
}

/// Normalize the raw validation keywords of `raw` for a schema whose kind accepts `target`.
pub fn normalize(
    raw: &Schema,
    target: ConstraintTarget,
    version: OasVersion,
    path: &str,
) -> NormalizedAttributes {
    let mut diagnostics = Vec::new();
    let nullable = normalize_nullable(raw, version, path, &mut diagnostics);

    let mut constraints = Constraints {
        minimum: normalize_bound(
            raw.minimum,
            raw.exclusive_minimum,
            Side::Min,
            version,
            path,
            &mut diagnostics,
        ),
        maximum: normalize_bound(
            raw.maximum,
            raw.exclusive_maximum,
            Side::Max,
            version,
            path,
            &mut diagnostics,
        ),
        multiple_of: raw.multiple_of,
        min_length: raw.min_length,
        max_length: raw.max_length,
        pattern: raw.pattern.clone(),
        min_items: raw.min_items,
        max_items: raw.max_items,
        unique_items: raw.unique_items.unwrap_or(false),
    };

    drop_mismatched(&mut constraints, target, raw, path, &mut diagnostics);
    check_ranges(&constraints, path, &mut diagnostics);

    NormalizedAttributes {
        constraints,
        nullable,
        diagnostics,
    }
}

/// Collapse `nullable: true` and `type: [T, "null"]` into one flag. The 3.1 form wins.
fn normalize_nullable(
    raw: &Schema,
    version: OasVersion,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> bool {
    let type_form = raw.schema_type.as_ref().filter(|t| t.is_multi_form());

    if type_form.is_some() && version == OasVersion::V3_0 {
        diagnostics.push(Diagnostic::info(
            DiagnosticCode::VersionMismatch,
            path,
            "type arrays are an OpenAPI 3.1 feature; interpreting with 3.1 semantics",
        ));
    }
    if raw.nullable == Some(true) && version == OasVersion::V3_1 {
        diagnostics.push(Diagnostic::info(
            DiagnosticCode::VersionMismatch,
            path,
            "`nullable` is an OpenAPI 3.0 keyword; prefer a \"null\" entry in `type`",
        ));
    }

    match (raw.nullable, type_form) {
        (flag, Some(types)) => {
            let from_type = types.contains_null();
            if let Some(flag) = flag
                && flag != from_type
            {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::NullableConflict,
                    path,
                    format!(
                        "`nullable: {flag}` disagrees with the `type` keyword; using nullable = {from_type}"
                    ),
                ));
            }
            from_type
        }
        (Some(flag), None) => flag,
        (None, None) => false,
    }
}

fn normalize_bound(
    inclusive: Option<f64>,
    exclusive: Option<ExclusiveBound>,
    side: Side,
    version: OasVersion,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<Bound> {
    let (bound_kw, exclusive_kw) = side.keywords();
    match exclusive {
        None => inclusive.map(Bound::inclusive),
        Some(ExclusiveBound::Flag(flag)) => {
            if version == OasVersion::V3_1 {
                diagnostics.push(Diagnostic::info(
                    DiagnosticCode::VersionMismatch,
                    path,
                    format!("boolean `{exclusive_kw}` is OpenAPI 3.0 syntax"),
                ));
            }
            match inclusive {
                Some(bound) => Some(Bound {
                    bound,
                    exclusive: flag,
                }),
                None => {
                    if flag {
                        diagnostics.push(Diagnostic::warning(
                            DiagnosticCode::DanglingExclusiveFlag,
                            path,
                            format!("`{exclusive_kw}: true` without `{bound_kw}`; ignored"),
                        ));
                    }
                    None
                }
            }
        }
        Some(ExclusiveBound::Value(value)) => {
            if version == OasVersion::V3_0 {
                diagnostics.push(Diagnostic::info(
                    DiagnosticCode::VersionMismatch,
                    path,
                    format!("numeric `{exclusive_kw}` is OpenAPI 3.1 syntax"),
                ));
            }
            let exclusive = Bound::exclusive(value);
            Some(match inclusive {
                None => exclusive,
                Some(bound) => tighter(side, Bound::inclusive(bound), exclusive),
            })
        }
    }
}

/// Of an inclusive and an exclusive bound on the same side, the one that admits fewer values.
fn tighter(side: Side, inclusive: Bound, exclusive: Bound) -> Bound {
    let exclusive_wins = match side {
        Side::Min => exclusive.bound >= inclusive.bound,
        Side::Max => exclusive.bound <= inclusive.bound,
    };
    if exclusive_wins { exclusive } else { inclusive }
}

fn drop_mismatched(
    constraints: &mut Constraints,
    target: ConstraintTarget,
    raw: &Schema,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let kind = describe_type(raw);
    let mut report = |keywords: Vec<&str>| {
        for keyword in keywords {
            diagnostics.push(Diagnostic::warning(
                DiagnosticCode::ConstraintTypeMismatch,
                path,
                format!("`{keyword}` does not apply to {kind} schemas; dropped"),
            ));
        }
    };

    if !target.numeric && constraints.has_numeric() {
        let mut present = Vec::new();
        if constraints.minimum.is_some() {
            present.push("minimum");
        }
        if constraints.maximum.is_some() {
            present.push("maximum");
        }
        if constraints.multiple_of.is_some() {
            present.push("multipleOf");
        }
        report(present);
        constraints.minimum = None;
        constraints.maximum = None;
        constraints.multiple_of = None;
    }
    if !target.string && constraints.has_string() {
        let mut present = Vec::new();
        if constraints.min_length.is_some() {
            present.push("minLength");
        }
        if constraints.max_length.is_some() {
            present.push("maxLength");
        }
        if constraints.pattern.is_some() {
            present.push("pattern");
        }
        report(present);
        constraints.min_length = None;
        constraints.max_length = None;
        constraints.pattern = None;
    }
    if !target.array && constraints.has_array() {
        let mut present = Vec::new();
        if constraints.min_items.is_some() {
            present.push("minItems");
        }
        if constraints.max_items.is_some() {
            present.push("maxItems");
        }
        if constraints.unique_items {
            present.push("uniqueItems");
        }
        report(present);
        constraints.min_items = None;
        constraints.max_items = None;
        constraints.unique_items = false;
    }
}

fn describe_type(raw: &Schema) -> String {
    use crate::parse::schema::TypeSet;
    match &raw.schema_type {
        Some(TypeSet::Single(t)) => format!("{t:?}").to_lowercase(),
        Some(TypeSet::Multiple(types)) => types
            .iter()
            .map(|t| format!("{t:?}").to_lowercase())
            .collect::<Vec<_>>()
            .join("|"),
        None if !raw.properties.is_empty() => "object".to_string(),
        None => "untyped".to_string(),
    }
}

fn check_ranges(constraints: &Constraints, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let mut inverted = |what: &str| {
        diagnostics.push(Diagnostic::warning(
            DiagnosticCode::InvertedRange,
            path,
            format!("{what}: lower bound exceeds upper bound; no value can satisfy it"),
        ));
    };
    if let (Some(min), Some(max)) = (constraints.minimum, constraints.maximum)
        && (min.bound > max.bound
            || (min.bound == max.bound && (min.exclusive || max.exclusive)))
    {
        inverted("minimum/maximum");
    }
    if let (Some(min), Some(max)) = (constraints.min_length, constraints.max_length)
        && min > max
    {
        inverted("minLength/maxLength");
    }
    if let (Some(min), Some(max)) = (constraints.min_items, constraints.max_items)
        && min > max
    {
        inverted("minItems/maxItems");
    }
}
