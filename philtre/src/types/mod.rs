//! Converter dispatch: type expressions, the converter registry, and
//! `.call=` proxies.
//!
//! A `.type=` value is a call-like expression: a bare family name or
//! `name(arg, kw=val, ...)`. The expression is re-lexed into a canonical
//! spacing (the *normalized* form), looked up in a per-session cache, and
//! otherwise constructed through the [`ConverterRegistry`] or, for unknown
//! names, through the host-supplied
//! [`SymbolResolver`](crate::symbols::SymbolResolver).

pub mod builtin;

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::extract::{ScopeExtract, Value};
use crate::token::{is_plain_auto, is_plain_none, Word};
use crate::tree::DefinitionView;

/// A pluggable bidirectional codec between token sequences and a typed
/// value.
///
/// Implementations are constructed by a [`ConverterFactory`] from the
/// arguments of a type expression and shared across all definitions with
/// the same normalized expression.
pub trait Converter {
    /// The family name this converter belongs to (e.g. `"int"`).
    fn phil_type(&self) -> &'static str;

    /// Interprets a word sequence as a typed value.
    ///
    /// # Errors
    ///
    /// Returns a conversion error when the words do not form a valid value
    /// of this type.
    fn from_words(&self, words: &[Word], master: &DefinitionView<'_>) -> Result<Value>;

    /// Renders a typed value back into a word sequence.
    ///
    /// # Errors
    ///
    /// Returns a conversion error when the value does not belong to this
    /// type.
    fn as_words(&self, value: &Value, master: &DefinitionView<'_>) -> Result<Vec<Word>>;

    /// Optional fetch-time hook.
    ///
    /// Most families have none (`None`): fetching substitutes the source
    /// words verbatim and validation happens at extraction. Families that
    /// need to reconcile the source against the master declaration (the
    /// choice family) return `Some` with the reconciled words.
    fn fetch(
        &self,
        source_words: &[Word],
        master: &DefinitionView<'_>,
        ignore_errors: bool,
    ) -> Option<Result<Vec<Word>>> {
        let _ = (source_words, master, ignore_errors);
        None
    }
}

/// Constructs [`Converter`] instances for one type family.
pub trait ConverterFactory {
    /// The family name handled by this factory.
    fn phil_type(&self) -> &'static str;

    /// Builds a converter from the call arguments of a type expression.
    ///
    /// # Errors
    ///
    /// Returns a message describing why the arguments are invalid; the
    /// caller wraps it into a type declaration error with location.
    fn build(&self, args: &CallArgs) -> std::result::Result<Rc<dyn Converter>, String>;
}

/// Maps type family names to their factories.
pub struct ConverterRegistry {
    map: HashMap<String, Rc<dyn ConverterFactory>>,
}

impl ConverterRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Creates a registry holding the built-in converter families.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for factory in builtin::builtin_factories() {
            registry.register(factory);
        }
        registry
    }

    /// Registers (or replaces) a factory under its family name.
    pub fn register(&mut self, factory: Rc<dyn ConverterFactory>) {
        self.map.insert(factory.phil_type().to_string(), factory);
    }

    /// Looks up the factory for a family name.
    #[must_use]
    pub fn get(&self, phil_type: &str) -> Option<&Rc<dyn ConverterFactory>> {
        self.map.get(phil_type)
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// The resolved value of a `.type=` attribute.
///
/// A plain `None` leaves the attribute unset (no conversion); `Auto` is a
/// sentinel passed through unchanged; anything else is a constructed
/// converter keyed by its normalized expression.
#[derive(Clone)]
pub enum TypeSpec {
    /// The `Auto` sentinel.
    Auto,
    /// A constructed converter.
    Converter {
        /// The normalized call expression, used for display and caching.
        expression: String,
        /// The shared converter instance.
        converter: Rc<dyn Converter>,
    },
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "Auto"),
            Self::Converter { expression, .. } => write!(f, "{expression}"),
        }
    }
}

impl fmt::Debug for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeSpec({self})")
    }
}

/// A callable bound to a scope through its `.call=` attribute.
pub trait ScopeCall {
    /// Invokes the callable on an extracted scope with the cached keyword
    /// arguments of the call expression.
    ///
    /// # Errors
    ///
    /// Any error of the callable itself.
    fn invoke(&self, scope: &ScopeExtract, args: &CallArgs) -> Result<Value>;
}

/// The resolved value of a scope's `.call=` attribute.
#[derive(Clone)]
pub enum CallSpec {
    /// The `Auto` sentinel.
    Auto,
    /// A bound callable with its cached arguments.
    Proxy(Rc<CallProxy>),
}

impl fmt::Display for CallSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "Auto"),
            Self::Proxy(proxy) => write!(f, "{}", proxy.expression),
        }
    }
}

/// A bound callable reference plus its cached keyword arguments.
pub struct CallProxy {
    /// The normalized call expression.
    pub expression: String,
    /// Where the `.call=` attribute was declared.
    pub where_str: String,
    /// The resolved callable.
    pub callable: Rc<dyn ScopeCall>,
    /// Arguments extracted from the call expression.
    pub args: CallArgs,
}

/// A literal argument inside a type or call expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// The `None` literal.
    None,
    /// The `Auto` literal.
    Auto,
    /// `True` or `False`.
    Bool(bool),
    /// An integer literal.
    Int(i64),
    /// A floating-point literal.
    Float(f64),
    /// A quoted string or bare identifier.
    Str(String),
}

impl Literal {
    fn type_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Auto => "Auto",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
        }
    }
}

/// The argument list of a call expression: positional values plus
/// `name=value` keywords, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    /// Positional arguments.
    pub positional: Vec<Literal>,
    /// Keyword arguments, in declaration order.
    pub keyword: Vec<(String, Literal)>,
}

impl CallArgs {
    /// True when no arguments were given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Looks up a keyword argument by name.
    #[must_use]
    pub fn keyword(&self, name: &str) -> Option<&Literal> {
        self.keyword
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Rejects any keyword argument not in `allowed` and any positional
    /// argument; converter families take keywords only.
    pub(crate) fn check_names(&self, allowed: &[&str]) -> std::result::Result<(), String> {
        if !self.positional.is_empty() {
            return Err("positional arguments are not supported".to_string());
        }
        for (name, _) in &self.keyword {
            if !allowed.contains(&name.as_str()) {
                return Err(format!("unexpected keyword argument \"{name}\""));
            }
        }
        Ok(())
    }

    pub(crate) fn kw_bool(&self, name: &str) -> std::result::Result<Option<bool>, String> {
        match self.keyword(name) {
            None | Some(Literal::None) => Ok(None),
            Some(Literal::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(format!(
                "keyword argument \"{name}\" must be True or False, not {}",
                other.type_name()
            )),
        }
    }

    pub(crate) fn kw_i64(&self, name: &str) -> std::result::Result<Option<i64>, String> {
        match self.keyword(name) {
            None | Some(Literal::None) => Ok(None),
            Some(Literal::Int(i)) => Ok(Some(*i)),
            Some(other) => Err(format!(
                "keyword argument \"{name}\" must be an integer, not {}",
                other.type_name()
            )),
        }
    }

    pub(crate) fn kw_f64(&self, name: &str) -> std::result::Result<Option<f64>, String> {
        match self.keyword(name) {
            None | Some(Literal::None) => Ok(None),
            Some(Literal::Int(i)) => Ok(Some(*i as f64)),
            Some(Literal::Float(f)) => Ok(Some(*f)),
            Some(other) => Err(format!(
                "keyword argument \"{name}\" must be a number, not {}",
                other.type_name()
            )),
        }
    }

    pub(crate) fn kw_usize(&self, name: &str) -> std::result::Result<Option<usize>, String> {
        match self.kw_i64(name)? {
            None => Ok(None),
            Some(i) if i >= 0 => Ok(Some(i as usize)),
            Some(i) => Err(format!(
                "keyword argument \"{name}\" must be non-negative, got {i}"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExprTokenKind {
    Identifier,
    Number,
    Str,
    Punct,
}

#[derive(Debug, Clone)]
struct ExprToken {
    text: String,
    kind: ExprTokenKind,
    /// For `Str` tokens: the unescaped contents without quotes.
    unquoted: String,
}

/// Re-lexes a call expression into canonical tokens.
///
/// Fails on unterminated strings (the "malformed call syntax" condition).
fn lex_expression(expression: &str) -> std::result::Result<Vec<ExprToken>, String> {
    let chars: Vec<char> = expression.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(ExprToken {
                text: chars[start..i].iter().collect(),
                kind: ExprTokenKind::Identifier,
                unquoted: String::new(),
            });
        } else if c.is_ascii_digit() || (c == '.' && i + 1 < chars.len() && chars[i + 1].is_ascii_digit()) {
            let start = i;
            let mut seen_dot = false;
            while i < chars.len() {
                let c = chars[i];
                if c.is_ascii_digit() {
                    i += 1;
                } else if c == '.' && !seen_dot {
                    seen_dot = true;
                    i += 1;
                } else if (c == 'e' || c == 'E')
                    && i + 1 < chars.len()
                    && (chars[i + 1].is_ascii_digit()
                        || ((chars[i + 1] == '+' || chars[i + 1] == '-')
                            && i + 2 < chars.len()
                            && chars[i + 2].is_ascii_digit()))
                {
                    i += 2;
                } else {
                    break;
                }
            }
            tokens.push(ExprToken {
                text: chars[start..i].iter().collect(),
                kind: ExprTokenKind::Number,
                unquoted: String::new(),
            });
        } else if c == '"' || c == '\'' {
            let quote = c;
            i += 1;
            let mut unquoted = String::new();
            loop {
                if i >= chars.len() {
                    return Err("unterminated string in call expression".to_string());
                }
                let c = chars[i];
                if c == '\\' && i + 1 < chars.len() {
                    unquoted.push(chars[i + 1]);
                    i += 2;
                } else if c == quote {
                    i += 1;
                    break;
                } else {
                    unquoted.push(c);
                    i += 1;
                }
            }
            tokens.push(ExprToken {
                text: format!("{quote}{unquoted}{quote}"),
                kind: ExprTokenKind::Str,
                unquoted,
            });
        } else {
            tokens.push(ExprToken {
                text: c.to_string(),
                kind: ExprTokenKind::Punct,
                unquoted: String::new(),
            });
            i += 1;
        }
    }
    Ok(tokens)
}

fn is_identifier_continuation(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Normalizes token spacing so textually different but equivalent
/// expressions share one canonical form (and one cache entry).
pub(crate) fn normalize_call_expression(
    expression: &str,
) -> std::result::Result<String, String> {
    let tokens = lex_expression(expression)?;
    let mut result = String::new();
    let mut previous = String::new();
    for token in &tokens {
        let t = &token.text;
        if t != "."
            && t.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
            && !previous.is_empty()
            && previous != "."
            && previous.ends_with(is_identifier_continuation)
        {
            result.push(' ');
        }
        result.push_str(t);
        if t.starts_with(',') {
            result.push(' ');
        }
        previous.clone_from(t);
    }
    Ok(result)
}

/// A parsed call expression: a (possibly dotted) callee plus arguments.
#[derive(Debug, Clone)]
pub(crate) struct ParsedCall {
    pub callee: String,
    pub args: CallArgs,
}

/// Parses a normalized call expression.
pub(crate) fn parse_call_expression(
    expression: &str,
) -> std::result::Result<ParsedCall, String> {
    let tokens = lex_expression(expression)?;
    let mut pos = 0;

    let mut callee = String::new();
    loop {
        match tokens.get(pos) {
            Some(t) if t.kind == ExprTokenKind::Identifier => {
                callee.push_str(&t.text);
                pos += 1;
            }
            _ => return Err("expected a name".to_string()),
        }
        match tokens.get(pos) {
            Some(t) if t.text == "." => {
                callee.push('.');
                pos += 1;
            }
            _ => break,
        }
    }

    let mut args = CallArgs::default();
    match tokens.get(pos) {
        None => return Ok(ParsedCall { callee, args }),
        Some(t) if t.text == "(" => pos += 1,
        Some(t) => return Err(format!("unexpected token \"{}\"", t.text)),
    }

    if tokens.get(pos).map(|t| t.text.as_str()) == Some(")") {
        pos += 1;
    } else {
        loop {
            // keyword argument?
            if let (Some(name), Some(eq)) = (tokens.get(pos), tokens.get(pos + 1)) {
                if name.kind == ExprTokenKind::Identifier && eq.text == "=" {
                    let (value, next) = parse_literal(&tokens, pos + 2)?;
                    args.keyword.push((name.text.clone(), value));
                    pos = next;
                } else {
                    let (value, next) = parse_literal(&tokens, pos)?;
                    args.positional.push(value);
                    pos = next;
                }
            } else {
                let (value, next) = parse_literal(&tokens, pos)?;
                args.positional.push(value);
                pos = next;
            }
            match tokens.get(pos).map(|t| t.text.as_str()) {
                Some(",") => pos += 1,
                Some(")") => {
                    pos += 1;
                    break;
                }
                _ => return Err("expected \",\" or \")\" in argument list".to_string()),
            }
        }
    }

    if pos != tokens.len() {
        return Err("trailing tokens after call expression".to_string());
    }
    Ok(ParsedCall { callee, args })
}

fn parse_literal(
    tokens: &[ExprToken],
    pos: usize,
) -> std::result::Result<(Literal, usize), String> {
    let Some(token) = tokens.get(pos) else {
        return Err("expected an argument value".to_string());
    };
    match token.kind {
        ExprTokenKind::Str => Ok((Literal::Str(token.unquoted.clone()), pos + 1)),
        ExprTokenKind::Number => parse_number(&token.text, false).map(|v| (v, pos + 1)),
        ExprTokenKind::Identifier => {
            let value = match token.text.as_str() {
                "None" => Literal::None,
                "Auto" => Literal::Auto,
                "True" => Literal::Bool(true),
                "False" => Literal::Bool(false),
                other => Literal::Str(other.to_string()),
            };
            Ok((value, pos + 1))
        }
        ExprTokenKind::Punct if token.text == "-" => match tokens.get(pos + 1) {
            Some(t) if t.kind == ExprTokenKind::Number => {
                parse_number(&t.text, true).map(|v| (v, pos + 2))
            }
            _ => Err("expected a number after \"-\"".to_string()),
        },
        ExprTokenKind::Punct => Err(format!("unexpected token \"{}\"", token.text)),
    }
}

fn parse_number(text: &str, negative: bool) -> std::result::Result<Literal, String> {
    let sign = if negative { -1.0 } else { 1.0 };
    if !text.contains('.') && !text.contains('e') && !text.contains('E') {
        text.parse::<i64>()
            .map(|i| Literal::Int(if negative { -i } else { i }))
            .map_err(|_| format!("invalid integer literal \"{text}\""))
    } else {
        text.parse::<f64>()
            .map(|f| Literal::Float(sign * f))
            .map_err(|_| format!("invalid float literal \"{text}\""))
    }
}

/// The resolution outcome shared by `.type=` and `.call=` processing.
pub(crate) struct TypeResolution;

impl TypeResolution {
    /// Resolves a `.type=` value into a [`TypeSpec`], consulting the
    /// expression-keyed cache and, for unknown families, the host resolver.
    pub(crate) fn resolve_type(
        words: &[Word],
        registry: &ConverterRegistry,
        cache: &mut HashMap<String, Rc<dyn Converter>>,
        resolver: &dyn crate::symbols::SymbolResolver,
    ) -> Result<Option<TypeSpec>> {
        if is_plain_none(words) {
            return Ok(None);
        }
        if is_plain_auto(words) {
            return Ok(Some(TypeSpec::Auto));
        }
        let raw = join_word_values(words);
        let location = words[0].where_str();
        let expression = normalize_call_expression(raw.trim()).map_err(|message| {
            Error::TypeDeclaration {
                expression: raw.trim().to_string(),
                message,
                location: location.clone(),
            }
        })?;
        if let Some(converter) = cache.get(&expression) {
            return Ok(Some(TypeSpec::Converter {
                expression,
                converter: Rc::clone(converter),
            }));
        }
        let parsed = parse_call_expression(&expression).map_err(|message| {
            Error::TypeDeclaration {
                expression: expression.clone(),
                message,
                location: location.clone(),
            }
        })?;
        let converter = if let Some(factory) = registry.get(&parsed.callee) {
            factory.build(&parsed.args).map_err(|message| Error::TypeDeclaration {
                expression: expression.clone(),
                message,
                location: location.clone(),
            })?
        } else {
            match resolver.converter(&parsed.callee, &parsed.args) {
                Some(Ok(converter)) => converter,
                Some(Err(message)) => {
                    return Err(Error::TypeDeclaration {
                        expression,
                        message,
                        location,
                    })
                }
                None => {
                    return Err(Error::TypeDeclaration {
                        expression,
                        message: "unexpected definition type".to_string(),
                        location,
                    })
                }
            }
        };
        cache.insert(expression.clone(), Rc::clone(&converter));
        Ok(Some(TypeSpec::Converter {
            expression,
            converter,
        }))
    }

    /// Resolves a `.call=` value into a [`CallSpec`] through the host
    /// resolver, caching proxies by normalized expression.
    pub(crate) fn resolve_call(
        full_path: &str,
        words: &[Word],
        cache: &mut HashMap<String, Rc<CallProxy>>,
        resolver: &dyn crate::symbols::SymbolResolver,
    ) -> Result<Option<CallSpec>> {
        if is_plain_none(words) {
            return Ok(None);
        }
        if is_plain_auto(words) {
            return Ok(Some(CallSpec::Auto));
        }
        let raw = join_word_values(words);
        let location = words[0].where_str();
        let type_error = |message: String| Error::TypeDeclaration {
            expression: format!("scope \"{full_path}\" .call={}", raw.trim()),
            message,
            location: location.clone(),
        };
        let expression =
            normalize_call_expression(raw.trim()).map_err(type_error)?;
        if let Some(proxy) = cache.get(&expression) {
            return Ok(Some(CallSpec::Proxy(Rc::clone(proxy))));
        }
        let parsed = parse_call_expression(&expression).map_err(type_error)?;
        let Some(callable) = resolver.call_target(&parsed.callee) else {
            return Err(type_error(format!(
                "\"{}\" is not a known callable",
                parsed.callee
            )));
        };
        let proxy = Rc::new(CallProxy {
            expression: expression.clone(),
            where_str: location,
            callable,
            args: parsed.args,
        });
        cache.insert(expression, Rc::clone(&proxy));
        Ok(Some(CallSpec::Proxy(proxy)))
    }
}

/// Joins word values with single spaces (quoting discarded), the raw form
/// a type expression is recovered from.
pub(crate) fn join_word_values(words: &[Word]) -> String {
    words
        .iter()
        .map(Word::value)
        .collect::<Vec<_>>()
        .join(" ")
}
