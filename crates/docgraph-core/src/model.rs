//! Metadata model: declared types and members as supplied by a provider.
//!
//! These are the provider-facing data types. They carry no identifiers; the
//! [`ElementGraph`](crate::graph::ElementGraph) computes those when it is built.
//!
//! # Index References
//!
//! A nested type points at its declaring type with an index into the
//! provider's type list ([`TypeDecl::declaring_type`]). Base types and
//! interfaces are plain [`TypeRef`]s because they may name types outside the
//! analyzed set.
//!
//! # Member Shapes
//!
//! Members are a closed sum type ([`MemberShape`]) over the member kinds.
//! Shared capabilities (parameter list, member-level generic parameters,
//! return type) are exposed as accessors on the shape rather than through a
//! trait hierarchy.

use serde::{Deserialize, Serialize};

use crate::docid::IdKind;

// ============================================================================
// Enums
// ============================================================================

/// Kind of declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    #[default]
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
}

/// Kind of member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Field,
    Property,
    Indexer,
    Method,
    Constructor,
    Operator,
    Event,
}

impl MemberKind {
    /// Element-kind tag used when the member is keyed in a documentation store.
    pub fn id_kind(&self) -> IdKind {
        match self {
            MemberKind::Field => IdKind::Field,
            MemberKind::Property | MemberKind::Indexer => IdKind::Property,
            MemberKind::Method | MemberKind::Constructor | MemberKind::Operator => IdKind::Method,
            MemberKind::Event => IdKind::Event,
        }
    }
}

/// Scope a generic parameter was declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenericParamScope {
    /// Declared on a type.
    Type,
    /// Declared on a method.
    Member,
}

// ============================================================================
// Generic Parameters
// ============================================================================

/// A generic parameter declaration.
///
/// `index` is the zero-based position within the declaring scope's parameter
/// list, and is what identifiers encode (never the name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenericParamDecl {
    pub scope: GenericParamScope,
    pub index: usize,
    pub name: String,
}

impl GenericParamDecl {
    /// Create a new generic parameter declaration.
    pub fn new(scope: GenericParamScope, index: usize, name: impl Into<String>) -> Self {
        GenericParamDecl {
            scope,
            index,
            name: name.into(),
        }
    }

    /// Declare a type-level parameter.
    pub fn type_level(index: usize, name: impl Into<String>) -> Self {
        Self::new(GenericParamScope::Type, index, name)
    }

    /// Declare a method-level parameter.
    pub fn member_level(index: usize, name: impl Into<String>) -> Self {
        Self::new(GenericParamScope::Member, index, name)
    }

    /// Declare a full type-level parameter list from names, in order.
    pub fn type_list<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<Self> {
        names
            .into_iter()
            .enumerate()
            .map(|(index, name)| Self::type_level(index, name))
            .collect()
    }

    /// Declare a full method-level parameter list from names, in order.
    pub fn member_list<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<Self> {
        names
            .into_iter()
            .enumerate()
            .map(|(index, name)| Self::member_level(index, name))
            .collect()
    }
}

// ============================================================================
// Type References
// ============================================================================

/// A reference to a type, as used by parameters, return values, bases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeRef {
    /// A named type, optionally instantiated with type arguments.
    ///
    /// `name` is the short name without arity; nested types use dotted
    /// names (`Outer.Inner`), or name the enclosing type through
    /// `declaring`, which also carries the encloser's type arguments. With a
    /// `declaring` reference, `namespace` is ignored.
    Named {
        #[serde(default)]
        namespace: Option<String>,
        name: String,
        #[serde(default)]
        args: Vec<TypeRef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        declaring: Option<Box<TypeRef>>,
    },
    /// An array of `element` with the given rank.
    Array { element: Box<TypeRef>, rank: u32 },
    /// An unmanaged pointer to `element`.
    Pointer { element: Box<TypeRef> },
    /// A use of a generic parameter, by name.
    ///
    /// Reflection-style names with trailing array or pointer suffixes
    /// (`T[]`, `T*`) are accepted and encoded positionally.
    GenericParam { name: String },
}

impl TypeRef {
    /// A non-generic named type.
    pub fn named(namespace: &str, name: &str) -> Self {
        TypeRef::Named {
            namespace: (!namespace.is_empty()).then(|| namespace.to_string()),
            name: name.to_string(),
            args: Vec::new(),
            declaring: None,
        }
    }

    /// A generic named type instantiated with `args`.
    pub fn generic(namespace: &str, name: &str, args: Vec<TypeRef>) -> Self {
        TypeRef::Named {
            namespace: (!namespace.is_empty()).then(|| namespace.to_string()),
            name: name.to_string(),
            args,
            declaring: None,
        }
    }

    /// A type nested inside `declaring`, instantiated with `args`.
    pub fn nested(declaring: TypeRef, name: &str, args: Vec<TypeRef>) -> Self {
        TypeRef::Named {
            namespace: None,
            name: name.to_string(),
            args,
            declaring: Some(Box::new(declaring)),
        }
    }

    /// A single-dimensional array of `element`.
    pub fn array(element: TypeRef) -> Self {
        Self::array_of_rank(element, 1)
    }

    /// An array of `element` with `rank` dimensions.
    pub fn array_of_rank(element: TypeRef, rank: u32) -> Self {
        TypeRef::Array {
            element: Box::new(element),
            rank,
        }
    }

    /// A pointer to `element`.
    pub fn pointer(element: TypeRef) -> Self {
        TypeRef::Pointer {
            element: Box::new(element),
        }
    }

    /// A use of the generic parameter called `name`.
    pub fn param(name: &str) -> Self {
        TypeRef::GenericParam {
            name: name.to_string(),
        }
    }

    /// Shorthand for `System.String`.
    pub fn string() -> Self {
        Self::named("System", "String")
    }

    /// Shorthand for `System.Int32`.
    pub fn int32() -> Self {
        Self::named("System", "Int32")
    }
}

// ============================================================================
// Members
// ============================================================================

/// A method, constructor, operator, or indexer parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamDecl {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Passed by reference (`ref`/`out`/`in`).
    #[serde(default)]
    pub by_ref: bool,
}

impl ParamDecl {
    /// A by-value parameter.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        ParamDecl {
            name: name.into(),
            ty,
            by_ref: false,
        }
    }

    /// A by-reference parameter.
    pub fn by_ref(name: impl Into<String>, ty: TypeRef) -> Self {
        ParamDecl {
            name: name.into(),
            ty,
            by_ref: true,
        }
    }
}

/// Kind-specific data of a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemberShape {
    Field {
        #[serde(rename = "type")]
        field_type: TypeRef,
    },
    Property {
        #[serde(rename = "type")]
        property_type: TypeRef,
    },
    Indexer {
        #[serde(rename = "type")]
        property_type: TypeRef,
        params: Vec<ParamDecl>,
    },
    Method {
        #[serde(default)]
        params: Vec<ParamDecl>,
        #[serde(default)]
        generic_params: Vec<GenericParamDecl>,
        #[serde(default)]
        return_type: Option<TypeRef>,
    },
    Constructor {
        #[serde(default)]
        params: Vec<ParamDecl>,
        #[serde(default)]
        is_static: bool,
    },
    Operator {
        params: Vec<ParamDecl>,
        return_type: TypeRef,
    },
    Event {
        #[serde(rename = "type")]
        event_type: TypeRef,
    },
}

impl MemberShape {
    /// The member kind this shape belongs to.
    pub fn kind(&self) -> MemberKind {
        match self {
            MemberShape::Field { .. } => MemberKind::Field,
            MemberShape::Property { .. } => MemberKind::Property,
            MemberShape::Indexer { .. } => MemberKind::Indexer,
            MemberShape::Method { .. } => MemberKind::Method,
            MemberShape::Constructor { .. } => MemberKind::Constructor,
            MemberShape::Operator { .. } => MemberKind::Operator,
            MemberShape::Event { .. } => MemberKind::Event,
        }
    }

    /// Declared parameters; empty for fields, properties, and events.
    pub fn params(&self) -> &[ParamDecl] {
        match self {
            MemberShape::Indexer { params, .. }
            | MemberShape::Method { params, .. }
            | MemberShape::Constructor { params, .. }
            | MemberShape::Operator { params, .. } => params,
            MemberShape::Field { .. } | MemberShape::Property { .. } | MemberShape::Event { .. } => {
                &[]
            }
        }
    }

    /// Member-level generic parameters (methods only).
    pub fn generic_params(&self) -> &[GenericParamDecl] {
        match self {
            MemberShape::Method { generic_params, .. } => generic_params,
            _ => &[],
        }
    }

    /// Return type of methods and operators.
    pub fn return_type(&self) -> Option<&TypeRef> {
        match self {
            MemberShape::Method { return_type, .. } => return_type.as_ref(),
            MemberShape::Operator { return_type, .. } => Some(return_type),
            _ => None,
        }
    }

    /// Whether this member is keyed with a parenthesized parameter list.
    pub fn has_parameter_list(&self) -> bool {
        !self.params().is_empty()
    }
}

/// A declared member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDecl {
    /// Name used for identifier construction.
    ///
    /// Explicit interface implementations carry their qualified name here
    /// (`System.IDisposable.Dispose`); operators may use either the reserved
    /// token (`op_Addition`) or the symbol (`+`).
    pub name: String,
    /// Name shown to readers, when it differs from `name`.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Raw documentation fragment (XML content of a `<member>` element).
    #[serde(default)]
    pub docs: Option<String>,
    #[serde(flatten)]
    pub shape: MemberShape,
}

impl MemberDecl {
    /// Create a member from a name and shape.
    pub fn new(name: impl Into<String>, shape: MemberShape) -> Self {
        MemberDecl {
            name: name.into(),
            display_name: None,
            docs: None,
            shape,
        }
    }

    /// A field.
    pub fn field(name: impl Into<String>, field_type: TypeRef) -> Self {
        Self::new(name, MemberShape::Field { field_type })
    }

    /// A property.
    pub fn property(name: impl Into<String>, property_type: TypeRef) -> Self {
        Self::new(name, MemberShape::Property { property_type })
    }

    /// An indexer (keyed as the `Item` property).
    pub fn indexer(property_type: TypeRef, params: Vec<ParamDecl>) -> Self {
        Self::new(
            "Item",
            MemberShape::Indexer {
                property_type,
                params,
            },
        )
    }

    /// A non-generic method without a declared return type.
    pub fn method(name: impl Into<String>, params: Vec<ParamDecl>) -> Self {
        Self::new(
            name,
            MemberShape::Method {
                params,
                generic_params: Vec::new(),
                return_type: None,
            },
        )
    }

    /// A generic method.
    pub fn generic_method(
        name: impl Into<String>,
        generic_params: Vec<GenericParamDecl>,
        params: Vec<ParamDecl>,
    ) -> Self {
        Self::new(
            name,
            MemberShape::Method {
                params,
                generic_params,
                return_type: None,
            },
        )
    }

    /// An instance constructor.
    pub fn constructor(params: Vec<ParamDecl>) -> Self {
        Self::new(
            ".ctor",
            MemberShape::Constructor {
                params,
                is_static: false,
            },
        )
    }

    /// A static constructor.
    pub fn static_constructor() -> Self {
        Self::new(
            ".cctor",
            MemberShape::Constructor {
                params: Vec::new(),
                is_static: true,
            },
        )
    }

    /// An operator.
    pub fn operator(name: impl Into<String>, params: Vec<ParamDecl>, return_type: TypeRef) -> Self {
        Self::new(
            name,
            MemberShape::Operator {
                params,
                return_type,
            },
        )
    }

    /// An event.
    pub fn event(name: impl Into<String>, event_type: TypeRef) -> Self {
        Self::new(name, MemberShape::Event { event_type })
    }

    /// Attach a raw documentation fragment.
    pub fn with_docs(mut self, docs: impl Into<String>) -> Self {
        self.docs = Some(docs.into());
        self
    }

    /// Set the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Member kind.
    pub fn kind(&self) -> MemberKind {
        self.shape.kind()
    }
}

// ============================================================================
// Types
// ============================================================================

/// A declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    #[serde(default)]
    pub kind: TypeKind,
    /// Short name without generic arity.
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    /// Index of the declaring type in the provider's type list.
    #[serde(default)]
    pub declaring_type: Option<usize>,
    /// Generic parameters declared by this type itself (not its encloser).
    #[serde(default)]
    pub generic_params: Vec<GenericParamDecl>,
    #[serde(default)]
    pub base_type: Option<TypeRef>,
    /// Implemented interfaces in declaration order.
    #[serde(default)]
    pub interfaces: Vec<TypeRef>,
    #[serde(default)]
    pub members: Vec<MemberDecl>,
    /// Raw documentation fragment.
    #[serde(default)]
    pub docs: Option<String>,
}

impl TypeDecl {
    /// Create a type with no namespace, bases, or members.
    pub fn new(kind: TypeKind, name: impl Into<String>) -> Self {
        TypeDecl {
            kind,
            name: name.into(),
            namespace: None,
            declaring_type: None,
            generic_params: Vec::new(),
            base_type: None,
            interfaces: Vec::new(),
            members: Vec::new(),
            docs: None,
        }
    }

    /// A class in `namespace`.
    pub fn class(namespace: &str, name: impl Into<String>) -> Self {
        Self::new(TypeKind::Class, name).in_namespace(namespace)
    }

    /// An interface in `namespace`.
    pub fn interface(namespace: &str, name: impl Into<String>) -> Self {
        Self::new(TypeKind::Interface, name).in_namespace(namespace)
    }

    /// Set the namespace (empty means none).
    pub fn in_namespace(mut self, namespace: &str) -> Self {
        self.namespace = (!namespace.is_empty()).then(|| namespace.to_string());
        self
    }

    /// Nest this type inside the type at `index`.
    pub fn nested_in(mut self, index: usize) -> Self {
        self.declaring_type = Some(index);
        self
    }

    /// Declare type-level generic parameters by name.
    pub fn with_generic_params<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.generic_params = GenericParamDecl::type_list(names);
        self
    }

    /// Set the base type.
    pub fn with_base(mut self, base: TypeRef) -> Self {
        self.base_type = Some(base);
        self
    }

    /// Append an implemented interface.
    pub fn with_interface(mut self, interface: TypeRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Append a member.
    pub fn with_member(mut self, member: MemberDecl) -> Self {
        self.members.push(member);
        self
    }

    /// Attach a raw documentation fragment.
    pub fn with_docs(mut self, docs: impl Into<String>) -> Self {
        self.docs = Some(docs.into());
        self
    }

    /// A reference to this type, without type arguments.
    pub fn to_type_ref(&self) -> TypeRef {
        TypeRef::Named {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            args: Vec::new(),
            declaring: None,
        }
    }
}
