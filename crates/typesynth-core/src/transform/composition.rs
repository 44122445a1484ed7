use indexmap::IndexMap;

use crate::error::CompositionError;
use crate::ir::{RecordField, RecordShape, TypeExpr, TypeKind, UnionDiscriminator, UnionShape};
use crate::model::{Bound, CompositionKind, Constraints};

/// What an `allOf` member contributes once its references are expanded.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberShape {
    Record(RecordShape),
    /// Property names a member requires without declaring them.
    Required(Vec<String>),
    /// `{}`: places no restriction and is skipped.
    Unconstrained,
    /// Any non-object type.
    Scalar(TypeExpr),
    /// A `oneOf` / `anyOf`.
    Union,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllOfMember {
    /// Position or name used in diagnostics.
    pub label: String,
    /// Emitted name when the member is a reference to a declared type.
    pub reference: Option<String>,
    pub shape: MemberShape,
}

/// Result of resolving a composition.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedComposition {
    Record(RecordShape),
    Alias(TypeExpr),
    Union(UnionShape),
}

/// A merged `allOf` plus the narrowing it could not express exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedAllOf {
    pub composition: ResolvedComposition,
    pub notes: Vec<MergeNote>,
}

/// Non-fatal observations made while intersecting members.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeNote {
    /// Two different patterns apply to a field; only the first is kept.
    PatternDropped {
        field: String,
        kept: String,
        dropped: String,
    },
    /// Two `multipleOf` values with no exact common multiple; the first is kept.
    MultipleOfDropped { field: String, kept: f64, dropped: f64 },
    /// The intersected bounds admit no value.
    EmptyRange { field: String },
    /// A required name that no member declares as a property.
    UnknownRequired { field: String },
}

/// Flatten the members of an `allOf` into a single shape.
///
/// A single referenced member reduces to an alias of it. Two or more members
/// must all be records; their fields merge in member order and shared fields
/// keep the intersection of their constraints. `equivalent` decides whether
/// two differently spelled field types describe the same values.
pub fn merge_all_of<F>(members: Vec<AllOfMember>, equivalent: F) -> Result<MergedAllOf, CompositionError>
where
    F: Fn(&TypeKind, &TypeKind) -> bool,
{
    if let Some(union) = members.iter().find(|m| m.shape == MemberShape::Union) {
        return Err(CompositionError::NestedUnionInIntersection {
            member: union.label.clone(),
        });
    }

    let mut required: Vec<String> = Vec::new();
    let mut members: Vec<AllOfMember> = members
        .into_iter()
        .filter(|m| match &m.shape {
            MemberShape::Required(names) => {
                for name in names {
                    if !required.contains(name) {
                        required.push(name.clone());
                    }
                }
                false
            }
            MemberShape::Unconstrained => false,
            _ => true,
        })
        .collect();

    let mut notes = Vec::new();
    let single_record = matches!(members.as_slice(), [m] if matches!(m.shape, MemberShape::Record(_)));
    if members.len() <= 1 && !(single_record && !required.is_empty()) {
        notes.extend(
            required
                .into_iter()
                .map(|field| MergeNote::UnknownRequired { field }),
        );
        let composition = match members.pop() {
            None => ResolvedComposition::Alias(TypeExpr::any()),
            Some(AllOfMember {
                reference: Some(name),
                ..
            }) => ResolvedComposition::Alias(TypeExpr::named(name)),
            Some(AllOfMember {
                shape: MemberShape::Record(record),
                ..
            }) => ResolvedComposition::Record(record),
            Some(AllOfMember {
                shape: MemberShape::Scalar(expr),
                ..
            }) => ResolvedComposition::Alias(expr),
            Some(_) => ResolvedComposition::Alias(TypeExpr::any()),
        };
        return Ok(MergedAllOf { composition, notes });
    }

    let mut fields: IndexMap<String, RecordField> = IndexMap::new();
    let mut additional: Option<TypeExpr> = None;

    for member in members {
        let record = match member.shape {
            MemberShape::Record(record) => record,
            _ => {
                return Err(CompositionError::NonObjectMember {
                    member: member.label,
                });
            }
        };

        for field in record.fields {
            match fields.get_mut(&field.name.original) {
                None => {
                    fields.insert(field.name.original.clone(), field);
                }
                Some(existing) => merge_field(existing, field, &equivalent, &mut notes)?,
            }
        }

        match (&additional, record.additional) {
            (None, Some(extra)) => additional = Some(extra),
            (Some(current), Some(extra))
                if *current != extra && !equivalent(&current.kind, &extra.kind) =>
            {
                return Err(CompositionError::AdditionalPropertiesConflict);
            }
            _ => {}
        }
    }

    for name in required {
        match fields.get_mut(&name) {
            Some(field) => field.required = true,
            None => notes.push(MergeNote::UnknownRequired { field: name }),
        }
    }

    Ok(MergedAllOf {
        composition: ResolvedComposition::Record(RecordShape {
            fields: fields.into_values().collect(),
            additional,
        }),
        notes,
    })
}

/// The same field declared by two members. Types must agree; constraints
/// intersect; the field is required if any member requires it.
fn merge_field<F>(
    existing: &mut RecordField,
    incoming: RecordField,
    equivalent: &F,
    notes: &mut Vec<MergeNote>,
) -> Result<(), CompositionError>
where
    F: Fn(&TypeKind, &TypeKind) -> bool,
{
    if existing.ty.kind != incoming.ty.kind && !equivalent(&existing.ty.kind, &incoming.ty.kind) {
        return Err(CompositionError::FieldConflict {
            field: incoming.name.original,
        });
    }
    let field = &incoming.name.original;
    let narrowed = intersect_constraints(field, &existing.ty.constraints, &incoming.ty.constraints, notes);
    if is_empty_range(&narrowed)
        && !is_empty_range(&existing.ty.constraints)
        && !is_empty_range(&incoming.ty.constraints)
    {
        notes.push(MergeNote::EmptyRange {
            field: field.clone(),
        });
    }
    existing.ty.constraints = narrowed;
    existing.ty.nullable &= incoming.ty.nullable;
    existing.required |= incoming.required;
    existing.deprecated |= incoming.deprecated;
    existing.read_only |= incoming.read_only;
    existing.write_only |= incoming.write_only;
    if existing.description.is_none() {
        existing.description = incoming.description;
    }
    Ok(())
}

/// Constraints a value must meet to satisfy both `a` and `b`.
fn intersect_constraints(
    field: &str,
    a: &Constraints,
    b: &Constraints,
    notes: &mut Vec<MergeNote>,
) -> Constraints {
    let multiple_of = match (a.multiple_of, b.multiple_of) {
        (Some(x), Some(y)) => match common_multiple(x, y) {
            Some(m) => Some(m),
            None => {
                notes.push(MergeNote::MultipleOfDropped {
                    field: field.to_string(),
                    kept: x,
                    dropped: y,
                });
                Some(x)
            }
        },
        (x, y) => x.or(y),
    };
    let pattern = match (&a.pattern, &b.pattern) {
        (Some(x), Some(y)) if x != y => {
            notes.push(MergeNote::PatternDropped {
                field: field.to_string(),
                kept: x.clone(),
                dropped: y.clone(),
            });
            Some(x.clone())
        }
        (x, y) => x.clone().or_else(|| y.clone()),
    };
    Constraints {
        minimum: tighter(a.minimum, b.minimum, |x, y| x > y),
        maximum: tighter(a.maximum, b.maximum, |x, y| x < y),
        multiple_of,
        min_length: narrow(a.min_length, b.min_length, u64::max),
        max_length: narrow(a.max_length, b.max_length, u64::min),
        pattern,
        min_items: narrow(a.min_items, b.min_items, u64::max),
        max_items: narrow(a.max_items, b.max_items, u64::min),
        unique_items: a.unique_items || b.unique_items,
    }
}

/// The stricter of two bounds; on equal values the exclusive one.
fn tighter(a: Option<Bound>, b: Option<Bound>, beyond: fn(f64, f64) -> bool) -> Option<Bound> {
    match (a, b) {
        (Some(x), Some(y)) if beyond(y.bound, x.bound) || (y.bound == x.bound && y.exclusive) => Some(y),
        (Some(x), _) => Some(x),
        (None, y) => y,
    }
}

fn narrow(a: Option<u64>, b: Option<u64>, pick: fn(u64, u64) -> u64) -> Option<u64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(pick(x, y)),
        (x, y) => x.or(y),
    }
}

/// Smallest value that is a multiple of both, when one can be computed exactly.
fn common_multiple(a: f64, b: f64) -> Option<f64> {
    if a == b {
        return Some(a);
    }
    let (low, high) = if a < b { (a, b) } else { (b, a) };
    if low > 0.0 && (high / low).fract() == 0.0 {
        return Some(high);
    }
    if a.fract() == 0.0 && b.fract() == 0.0 && a >= 1.0 && b >= 1.0 {
        let (x, y) = (a as u64, b as u64);
        return Some((x / gcd(x, y) * y) as f64);
    }
    None
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn is_empty_range(c: &Constraints) -> bool {
    let numeric = match (c.minimum, c.maximum) {
        (Some(min), Some(max)) => {
            min.bound > max.bound || (min.bound == max.bound && (min.exclusive || max.exclusive))
        }
        _ => false,
    };
    let inverted = |low: Option<u64>, high: Option<u64>| matches!((low, high), (Some(l), Some(h)) if l > h);
    numeric || inverted(c.min_length, c.max_length) || inverted(c.min_items, c.max_items)
}

/// Build a union from already-named members, in declaration order.
///
/// Duplicates collapse to their first occurrence. A single remaining member
/// becomes an alias of it.
pub fn union_of(
    kind: CompositionKind,
    members: Vec<String>,
    nullable: bool,
    discriminator: Option<UnionDiscriminator>,
) -> Result<ResolvedComposition, CompositionError> {
    let mut unique: Vec<String> = Vec::with_capacity(members.len());
    for member in members {
        if !unique.contains(&member) {
            unique.push(member);
        }
    }

    match unique.len() {
        0 => Err(CompositionError::EmptyUnion),
        1 if discriminator.is_none() => {
            let only = unique.remove(0);
            Ok(ResolvedComposition::Alias(
                TypeExpr::named(only).with_nullable(nullable),
            ))
        }
        _ => Ok(ResolvedComposition::Union(UnionShape {
            kind,
            members: unique,
            nullable,
            discriminator,
        })),
    }
}
