//! The syntax tree produced by [`parse()`](crate::parse).
//!
//! Type references are stored exactly as written. Resolving them, and checking for duplicate
//! names or field numbers, is left to consumers of the tree.

use std::fmt;

use indexmap::IndexMap;

/// The smallest field number that may be declared.
pub const FIELD_NUMBER_MIN: i32 = 1;
/// The largest field number that may be declared.
pub const FIELD_NUMBER_MAX: i32 = 536_870_911;

/// A parsed schema source file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schema {
    /// The package name, if declared.
    pub package: Option<String>,
    /// Imported files, in declaration order.
    pub imports: Vec<Import>,
    /// File-level options.
    pub options: Options,
    /// Top-level messages and `extend` blocks, in declaration order.
    pub messages: Vec<Message>,
    /// Top-level enums, in declaration order.
    pub enums: Vec<Enum>,
    /// Services, in declaration order.
    pub services: Vec<Service>,
}

/// An `import` statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Import {
    /// The imported path, exactly as written between the quotes.
    pub path: String,
    /// Whether the import was declared with the `public` modifier.
    pub public: bool,
}

/// The value assigned to an option.
#[derive(Clone, Debug, PartialEq)]
pub enum OptionValue {
    /// A quoted string. Escape sequences are kept as written.
    String(String),
    /// An integer literal.
    Int(Int),
    /// A floating point literal.
    Float(f64),
    /// `true` or `false`.
    Bool(bool),
    /// A bare identifier such as an enum value name, resolved later.
    Ident(String),
}

/// An integer option value.
///
/// Option values may use the full range of both `int64` and `uint64`, so the sign is stored
/// separately from the magnitude.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Int {
    /// Whether the literal was preceded by `-`.
    pub negative: bool,
    /// The magnitude of the literal.
    pub value: u64,
}

impl Int {
    /// Converts this value to an `i64`, if it is in range.
    pub fn as_i64(&self) -> Option<i64> {
        if self.negative {
            if self.value == i64::MIN.unsigned_abs() {
                Some(i64::MIN)
            } else {
                i64::try_from(self.value).ok().map(|value| -value)
            }
        } else {
            i64::try_from(self.value).ok()
        }
    }
}

impl fmt::Display for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-{}", self.value)
        } else {
            write!(f, "{}", self.value)
        }
    }
}

/// A mapping from option names to values.
///
/// Names of custom options keep their parentheses, e.g. `(foo.bar).baz`. Assigning an option that
/// is already present replaces its value without changing its position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Options {
    entries: IndexMap<String, OptionValue>,
}

impl Options {
    /// Sets the value of an option, returning the previous value if there was one.
    pub fn insert(&mut self, name: impl Into<String>, value: OptionValue) -> Option<OptionValue> {
        self.entries.insert(name.into(), value)
    }

    /// Gets the value of an option.
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.entries.get(name)
    }

    /// Returns `true` if an option with the given name is set.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterates over the options in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// The number of distinct options.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no options are set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, OptionValue)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, OptionValue)>>(iter: I) -> Self {
        let mut options = Options::default();
        for (name, value) in iter {
            options.insert(name, value);
        }
        options
    }
}

/// What a [`Message`] node was declared as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// A `message` declaration.
    Message,
    /// A legacy `group` field's body.
    Group,
    /// An `extend` block. The message name holds the extended type reference.
    Extend,
}

/// A message, group body or `extend` block.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// The message name. For `extend` blocks this is the extended type reference.
    pub name: String,
    /// How the message was declared.
    pub kind: MessageKind,
    /// Fields in declaration order.
    pub fields: Vec<Field>,
    /// Nested enums in declaration order.
    pub enums: Vec<Enum>,
    /// Nested messages, group bodies and `extend` blocks in declaration order.
    pub messages: Vec<Message>,
    /// Message options.
    pub options: Options,
    /// The declared extension range, if any. Both bounds are inclusive.
    pub extensions: Option<(i32, i32)>,
}

impl Message {
    pub(crate) fn new(name: impl Into<String>, kind: MessageKind) -> Self {
        Message {
            name: name.into(),
            kind,
            fields: Vec::new(),
            enums: Vec::new(),
            messages: Vec::new(),
            options: Options::default(),
            extensions: None,
        }
    }

    /// Returns `true` if this message is the body of a group field.
    pub fn is_group(&self) -> bool {
        self.kind == MessageKind::Group
    }

    /// For `extend` blocks, the type reference of the extended message.
    pub fn target_reference(&self) -> Option<&str> {
        match self.kind {
            MessageKind::Extend => Some(&self.name),
            MessageKind::Message | MessageKind::Group => None,
        }
    }
}

/// A field label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rule {
    /// `required`
    Required,
    /// `optional`
    Optional,
    /// `repeated`
    Repeated,
}

impl Rule {
    pub(crate) fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "required" => Some(Rule::Required),
            "optional" => Some(Rule::Optional),
            "repeated" => Some(Rule::Repeated),
            _ => None,
        }
    }

    /// The keyword this rule was declared with.
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Optional => "optional",
            Rule::Repeated => "repeated",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message field or extension field.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    /// The field label.
    pub rule: Rule,
    /// A scalar type keyword such as `int32`, or a type reference.
    pub ty: String,
    /// The field name. Group fields use the lower-cased group name.
    pub name: String,
    /// The field number.
    pub id: i32,
    /// Field options.
    pub options: Options,
    /// Whether this field was declared as a `group`. The group body is stored in the enclosing
    /// message's nested messages under the name given by `ty`.
    pub group: bool,
    /// For fields declared in an `extend` block, the extended type reference.
    pub extendee: Option<String>,
}

impl Field {
    /// Returns `true` if this field was declared in an `extend` block.
    pub fn is_extension(&self) -> bool {
        self.extendee.is_some()
    }
}

/// An enum declaration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Enum {
    /// The enum name.
    pub name: String,
    /// Values in declaration order.
    pub values: Vec<EnumValue>,
    /// Enum options.
    pub options: Options,
}

/// A single enum value.
///
/// Options attached to a value are checked for syntax but not recorded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumValue {
    /// The value name.
    pub name: String,
    /// The value number, which may be negative.
    pub id: i32,
}

/// A service declaration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Service {
    /// The service name.
    pub name: String,
    /// Service options.
    pub options: Options,
    /// Methods keyed by the keyword that introduced them, then by name, in declaration order.
    pub methods: IndexMap<String, IndexMap<String, Method>>,
}

impl Service {
    /// Gets a method by the keyword it was declared with and its name.
    pub fn method(&self, kind: &str, name: &str) -> Option<&Method> {
        self.methods.get(kind)?.get(name)
    }

    /// Iterates over the methods declared with the given keyword, such as `rpc`.
    pub fn methods_of_kind(&self, kind: &str) -> impl Iterator<Item = &Method> {
        self.methods
            .get(kind)
            .into_iter()
            .flat_map(|methods| methods.values())
    }

    /// Iterates over all methods, grouped by kind.
    pub fn all_methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.values().flat_map(|methods| methods.values())
    }

    /// Adds a method, replacing any earlier method with the same kind and name in place.
    pub(crate) fn add_method(&mut self, method: Method) {
        self.methods
            .entry(method.kind.clone())
            .or_default()
            .insert(method.name.clone(), method);
    }
}

/// A service method.
#[derive(Clone, Debug, PartialEq)]
pub struct Method {
    /// The keyword that introduced the method. Currently always `rpc`.
    pub kind: String,
    /// The method name.
    pub name: String,
    /// The request type reference.
    pub request: String,
    /// The response type reference.
    pub response: String,
    /// Method options.
    pub options: Options,
}
