//! Documentation identifiers: encoding and decoding.
//!
//! Every declared type and member has a canonical textual identifier, the key
//! under which a documentation store files its fragment. The store prefixes
//! the identifier with a one-letter element-kind tag ([`IdKind`]):
//!
//! | Element | Example |
//! |---------|---------|
//! | type | `T:Acme.Collections.Map`2` |
//! | field | `F:Acme.Counter.count` |
//! | property / indexer | `P:Acme.Grid.Item(System.Int32,System.Int32)` |
//! | method / constructor / operator | `M:Acme.Shell.Execute(System.String@)` |
//! | event | `E:Acme.Shell.Exited` |
//!
//! # Grammar
//!
//! - Types: `Namespace.Name` or `EnclosingTypeId.Name`, then `` `N `` when the
//!   type declares `N > 0` generic parameters of its own.
//! - Members: canonical name (`#ctor`, `#cctor`, `op_*`, or the trailing
//!   segment of an explicit interface name), then ``` ``N ``` for generic
//!   methods, then `(p1,p2)` when there are parameters. By-reference
//!   parameters end in `@`. Conversion operators append `~ReturnType`.
//! - Type references: qualified name, `{a,b}` for type arguments, `[]`/`[,]`
//!   for arrays, `*` for pointers.
//! - Generic parameter uses: `` `i `` (type scope) or ``` ``i ``` (member
//!   scope), `i` being the declaration index. A use that matches no declaration
//!   in scope encodes as its raw name.
//!
//! Encoding is total: malformed input yields a deterministic string.

use std::fmt;

use crate::model::{GenericParamDecl, GenericParamScope, MemberDecl, MemberShape, TypeDecl, TypeRef};

// ============================================================================
// Element-Kind Tags
// ============================================================================

/// Element-kind tag of a store key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    Type,
    Field,
    Property,
    Method,
    Event,
}

impl IdKind {
    /// The one-letter tag.
    pub fn tag(&self) -> char {
        match self {
            IdKind::Type => 'T',
            IdKind::Field => 'F',
            IdKind::Property => 'P',
            IdKind::Method => 'M',
            IdKind::Event => 'E',
        }
    }

    /// Parse a one-letter tag.
    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'T' => Some(IdKind::Type),
            'F' => Some(IdKind::Field),
            'P' => Some(IdKind::Property),
            'M' => Some(IdKind::Method),
            'E' => Some(IdKind::Event),
            _ => None,
        }
    }
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Join a kind tag and an identifier: `T:Acme.Widget`.
pub fn qualified_id(kind: IdKind, id: &str) -> String {
    format!("{}:{}", kind.tag(), id)
}

/// Split an optional kind tag off a store key.
///
/// `"M:Acme.Run"` gives `(Some(Method), "Acme.Run")`; an untagged or
/// unknown-tagged key is returned whole with `None`.
pub fn split_qualified(key: &str) -> (Option<IdKind>, &str) {
    let mut chars = key.chars();
    if let (Some(tag), Some(':')) = (chars.next(), chars.next()) {
        if let Some(kind) = IdKind::from_tag(tag) {
            return (Some(kind), &key[2..]);
        }
    }
    (None, key)
}

// ============================================================================
// Generic Context
// ============================================================================

/// Generic parameter declarations visible while encoding a member.
#[derive(Debug, Clone, Default)]
pub struct GenericContext<'a> {
    /// Type-level declarations, innermost type first.
    type_level: Vec<&'a GenericParamDecl>,
    member_level: &'a [GenericParamDecl],
}

impl<'a> GenericContext<'a> {
    /// Create a context from type-level (innermost first) and member-level declarations.
    pub fn new(type_level: Vec<&'a GenericParamDecl>, member_level: &'a [GenericParamDecl]) -> Self {
        GenericContext {
            type_level,
            member_level,
        }
    }

    /// A context with only the given type's own parameters.
    pub fn for_type(decl: &'a TypeDecl) -> Self {
        GenericContext {
            type_level: decl.generic_params.iter().collect(),
            member_level: &[],
        }
    }

    /// This context with a member's own parameters added.
    pub fn with_member(&self, member_level: &'a [GenericParamDecl]) -> Self {
        GenericContext {
            type_level: self.type_level.clone(),
            member_level,
        }
    }

    /// Find the declaration a name refers to; member scope shadows type scope.
    pub fn lookup(&self, name: &str) -> Option<&'a GenericParamDecl> {
        self.member_level
            .iter()
            .find(|decl| decl.name == name)
            .or_else(|| self.type_level.iter().copied().find(|decl| decl.name == name))
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Identifier of a declared type, given its encloser's identifier.
pub fn type_id(decl: &TypeDecl, encloser_id: Option<&str>) -> String {
    let name = strip_arity(&decl.name);
    let mut id = match (encloser_id, decl.namespace.as_deref()) {
        (Some(outer), _) => format!("{}.{}", outer, name),
        (None, Some(ns)) if !ns.is_empty() => format!("{}.{}", ns, name),
        _ => name.to_string(),
    };
    if !decl.generic_params.is_empty() {
        id.push('`');
        id.push_str(&decl.generic_params.len().to_string());
    }
    id
}

/// Identifier of a member, relative to its declaring type.
///
/// `ctx` holds the type-level parameters in scope; the member's own generic
/// parameters are added here.
pub fn member_id<'a>(decl: &'a MemberDecl, ctx: &GenericContext<'a>) -> String {
    let mut id = member_name(decl);

    let generics = decl.shape.generic_params();
    let ctx = ctx.with_member(generics);
    if !generics.is_empty() {
        id.push_str("``");
        id.push_str(&generics.len().to_string());
    }

    let params = decl.shape.params();
    if !params.is_empty() {
        let encoded: Vec<String> = params
            .iter()
            .map(|param| {
                let mut ty = type_ref_id(&param.ty, &ctx);
                if param.by_ref {
                    ty.push('@');
                }
                ty
            })
            .collect();
        id.push('(');
        id.push_str(&encoded.join(","));
        id.push(')');
    }

    if is_conversion(&id) {
        if let Some(ret) = decl.shape.return_type() {
            id.push('~');
            id.push_str(&type_ref_id(ret, &ctx));
        }
    }
    id
}

/// Canonical name a member identifier starts from.
pub fn member_name(decl: &MemberDecl) -> String {
    match &decl.shape {
        MemberShape::Constructor { is_static, .. } => {
            if *is_static {
                "#cctor".to_string()
            } else {
                "#ctor".to_string()
            }
        }
        MemberShape::Operator { params, .. } => match operator_token(&decl.name, params.len()) {
            Some(token) => token.to_string(),
            None => trailing_segment(&decl.name).to_string(),
        },
        _ => trailing_segment(&decl.name).to_string(),
    }
}

/// Identifier of a type reference.
pub fn type_ref_id(ty: &TypeRef, ctx: &GenericContext<'_>) -> String {
    match ty {
        TypeRef::Named {
            namespace,
            name,
            args,
            declaring,
        } => {
            let mut id = match declaring {
                Some(outer) => format!("{}.{}", type_ref_id(outer, ctx), strip_arity(name)),
                None => qualified_name(namespace.as_deref(), strip_arity(name)),
            };
            if !args.is_empty() {
                let encoded: Vec<String> = args.iter().map(|arg| type_ref_id(arg, ctx)).collect();
                id.push('{');
                id.push_str(&encoded.join(","));
                id.push('}');
            }
            id
        }
        TypeRef::Array { element, rank } => {
            let mut id = type_ref_id(element, ctx);
            id.push_str(&array_suffix(*rank));
            id
        }
        TypeRef::Pointer { element } => {
            let mut id = type_ref_id(element, ctx);
            id.push('*');
            id
        }
        TypeRef::GenericParam { name } => generic_param_ref(name, ctx),
    }
}

/// Identifier of the generic definition a named reference points at.
///
/// `Acme.Map<String, Int32>` gives `` Acme.Map`2 ``, which is how the
/// referenced type is keyed in the graph. A declaring reference contributes
/// its own definition, so `Outer<Int32>.Inner` gives `` Acme.Outer`1.Inner ``.
/// Non-named references have none.
pub fn definition_id(ty: &TypeRef) -> Option<String> {
    match ty {
        TypeRef::Named {
            namespace,
            name,
            args,
            declaring,
        } => {
            let mut id = match declaring {
                Some(outer) => format!("{}.{}", definition_id(outer)?, strip_arity(name)),
                None => qualified_name(namespace.as_deref(), strip_arity(name)),
            };
            if !args.is_empty() {
                id.push('`');
                id.push_str(&args.len().to_string());
            }
            Some(id)
        }
        _ => None,
    }
}

/// A type identifier with the arity of every enclosing segment removed.
///
/// `` Acme.Outer`1.Inner `` becomes `Acme.Outer.Inner`, the dotted form a
/// reference uses when it cannot spell the encloser's arity. The last
/// segment keeps its own arity.
pub fn erase_encloser_arity(id: &str) -> String {
    match id.rsplit_once('.') {
        Some((enclosers, last)) => {
            let enclosers: Vec<&str> = enclosers.split('.').map(strip_arity).collect();
            format!("{}.{}", enclosers.join("."), last)
        }
        None => id.to_string(),
    }
}

/// Positional notation for a use of a generic parameter.
///
/// Array and pointer suffixes on the raw name are split off and reattached:
/// `T[]` with `T` declared first on the type encodes as `` `0[] ``.
pub fn generic_param_ref(raw: &str, ctx: &GenericContext<'_>) -> String {
    let split = raw.find(['[', '*', '&']).unwrap_or(raw.len());
    let (base, suffix) = raw.split_at(split);
    let suffix = suffix.replace('&', "@");
    match ctx.lookup(base) {
        Some(decl) => {
            let ticks = match decl.scope {
                GenericParamScope::Type => "`",
                GenericParamScope::Member => "``",
            };
            format!("{}{}{}", ticks, decl.index, suffix)
        }
        None => format!("{}{}", base, suffix),
    }
}

/// Runtime-reserved token for an operator given by symbol.
///
/// Names already in `op_*` form, and unknown symbols, give `None`.
/// `arity` disambiguates unary from binary `+` and `-`.
pub fn operator_token(name: &str, arity: usize) -> Option<&'static str> {
    let symbol = name.trim().strip_prefix("operator").unwrap_or(name).trim();
    let token = match (symbol, arity) {
        ("+", 1) => "op_UnaryPlus",
        ("-", 1) => "op_UnaryNegation",
        ("+", _) => "op_Addition",
        ("-", _) => "op_Subtraction",
        ("*", _) => "op_Multiply",
        ("/", _) => "op_Division",
        ("%", _) => "op_Modulus",
        ("&", _) => "op_BitwiseAnd",
        ("|", _) => "op_BitwiseOr",
        ("^", _) => "op_ExclusiveOr",
        ("<<", _) => "op_LeftShift",
        (">>", _) => "op_RightShift",
        ("==", _) => "op_Equality",
        ("!=", _) => "op_Inequality",
        ("<", _) => "op_LessThan",
        (">", _) => "op_GreaterThan",
        ("<=", _) => "op_LessThanOrEqual",
        (">=", _) => "op_GreaterThanOrEqual",
        ("!", _) => "op_LogicalNot",
        ("~", _) => "op_OnesComplement",
        ("++", _) => "op_Increment",
        ("--", _) => "op_Decrement",
        ("true", _) => "op_True",
        ("false", _) => "op_False",
        ("implicit", _) => "op_Implicit",
        ("explicit", _) => "op_Explicit",
        _ => return None,
    };
    Some(token)
}

fn is_conversion(id: &str) -> bool {
    id.starts_with("op_Implicit") || id.starts_with("op_Explicit")
}

fn qualified_name(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{}.{}", ns, name),
        _ => name.to_string(),
    }
}

fn array_suffix(rank: u32) -> String {
    let commas = rank.max(1) as usize - 1;
    format!("[{}]", ",".repeat(commas))
}

/// Drop a reflection-style `` `N `` arity suffix from a short name.
fn strip_arity(name: &str) -> &str {
    match name.rfind('`') {
        Some(pos) if name[pos + 1..].chars().all(|c| c.is_ascii_digit()) => &name[..pos],
        _ => name,
    }
}

/// Segment after the last top-level `.` (explicit interface implementations).
fn trailing_segment(name: &str) -> &str {
    let mut depth = 0usize;
    let mut start = 0;
    for (pos, c) in name.char_indices() {
        match c {
            '<' | '{' | '[' | '(' => depth += 1,
            '>' | '}' | ']' | ')' => depth = depth.saturating_sub(1),
            '.' if depth == 0 => start = pos + 1,
            _ => {}
        }
    }
    if start >= name.len() {
        name
    } else {
        &name[start..]
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// One decoded parameter of a member identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSignature {
    pub type_id: String,
    pub by_ref: bool,
}

/// A member identifier split into its parts.
///
/// Decoding is lossy with respect to display names (explicit interface
/// implementations keep only their trailing segment), and never fails.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemberSignature {
    pub name: String,
    pub generic_arity: usize,
    pub params: Vec<ParamSignature>,
    /// Conversion-operator return type (`~Type` suffix).
    pub return_type: Option<String>,
}

impl MemberSignature {
    /// Decode a member identifier (without kind tag or declaring type).
    pub fn parse(id: &str) -> Self {
        let (head, rest) = match id.find('(') {
            Some(open) => (&id[..open], &id[open..]),
            None => match id.find('~') {
                Some(tilde) => (&id[..tilde], &id[tilde..]),
                None => (id, ""),
            },
        };

        let (name, generic_arity) = match head.find("``") {
            Some(pos) => (&head[..pos], head[pos + 2..].parse().unwrap_or(0)),
            None => (head, 0),
        };

        let mut params = Vec::new();
        let mut tail = rest;
        if rest.starts_with('(') {
            let close = matching_close(rest).unwrap_or(rest.len());
            let inner = &rest[1..close.max(1)];
            params = split_top_level(inner)
                .into_iter()
                .filter(|p| !p.is_empty())
                .map(|p| match p.strip_suffix('@') {
                    Some(ty) => ParamSignature {
                        type_id: ty.to_string(),
                        by_ref: true,
                    },
                    None => ParamSignature {
                        type_id: p.to_string(),
                        by_ref: false,
                    },
                })
                .collect();
            tail = rest.get(close + 1..).unwrap_or("");
        }

        let return_type = tail
            .strip_prefix('~')
            .filter(|ret| !ret.is_empty())
            .map(str::to_string);

        MemberSignature {
            name: name.to_string(),
            generic_arity,
            params,
            return_type,
        }
    }
}

/// Split a fully qualified member identifier into (type id, member id).
///
/// `Acme.Shell.Execute(System.String)` gives `("Acme.Shell",
/// "Execute(System.String)")`. Returns `None` when there is no type part.
pub fn split_member_cref(id: &str) -> Option<(&str, &str)> {
    let limit = id.find(['(', '~']).unwrap_or(id.len());
    let mut depth = 0usize;
    let mut split = None;
    for (pos, c) in id[..limit].char_indices() {
        match c {
            '{' | '[' => depth += 1,
            '}' | ']' => depth = depth.saturating_sub(1),
            '.' if depth == 0 => split = Some(pos),
            _ => {}
        }
    }
    let pos = split?;
    let (ty, member) = (&id[..pos], &id[pos + 1..]);
    (!ty.is_empty() && !member.is_empty()).then_some((ty, member))
}

/// Index of the `)` matching the `(` at position 0.
fn matching_close(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (pos, c) in s.char_indices() {
        match c {
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && c == ')' {
                    return Some(pos);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on commas outside `{}` and `[]`.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (pos, c) in s.char_indices() {
        match c {
            '{' | '[' | '(' => depth += 1,
            '}' | ']' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..pos]);
                start = pos + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

// ============================================================================
// Tests
// ============================================================================
