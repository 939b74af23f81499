//! The built-in converter families.
//!
//! Every family accepts a plain unquoted `None` or `Auto` word and maps it
//! to the corresponding sentinel value; the reverse direction renders the
//! sentinels back as single words. Validation failures are reported as
//! conversion errors anchored at the offending words.

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::extract::Value;
use crate::token::{is_plain_auto, is_plain_none, Quote, Word};
use crate::tree::DefinitionView;
use crate::types::{join_word_values, CallArgs, Converter, ConverterFactory};

/// All factories registered by [`ConverterRegistry::with_builtins`].
///
/// [`ConverterRegistry::with_builtins`]: crate::types::ConverterRegistry::with_builtins
pub(crate) fn builtin_factories() -> Vec<Rc<dyn ConverterFactory>> {
    vec![
        Rc::new(WordsFactory),
        Rc::new(StringsFactory),
        Rc::new(TextFactory { kind: TextKind::Str }),
        Rc::new(TextFactory { kind: TextKind::Qstr }),
        Rc::new(TextFactory { kind: TextKind::Path }),
        Rc::new(TextFactory { kind: TextKind::Key }),
        Rc::new(BoolFactory),
        Rc::new(IntFactory),
        Rc::new(FloatFactory),
        Rc::new(IntsFactory),
        Rc::new(FloatsFactory),
        Rc::new(ChoiceFactory),
    ]
}

fn conversion_error(message: String, anchor: Option<&Word>) -> Error {
    Error::Conversion {
        message,
        location: anchor.map(Word::where_str).unwrap_or_default(),
    }
}

fn sentinel_words(value: &Value) -> Option<Vec<Word>> {
    match value {
        Value::None => Some(vec![Word::new("None")]),
        Value::Auto => Some(vec![Word::new("Auto")]),
        _ => None,
    }
}

fn wrong_value_type(
    phil_type: &str,
    value: &Value,
    master: &DefinitionView<'_>,
) -> Error {
    conversion_error(
        format!(
            "{}=... value of type {} cannot be rendered by the {phil_type} type",
            master.full_path(),
            value.kind_name()
        ),
        None,
    )
}

// ---------------------------------------------------------------------------
// words

struct WordsFactory;

impl ConverterFactory for WordsFactory {
    fn phil_type(&self) -> &'static str {
        "words"
    }

    fn build(&self, args: &CallArgs) -> std::result::Result<Rc<dyn Converter>, String> {
        args.check_names(&[])?;
        Ok(Rc::new(WordsConverter))
    }
}

struct WordsConverter;

impl Converter for WordsConverter {
    fn phil_type(&self) -> &'static str {
        "words"
    }

    fn from_words(&self, words: &[Word], _master: &DefinitionView<'_>) -> Result<Value> {
        if is_plain_none(words) {
            return Ok(Value::None);
        }
        if is_plain_auto(words) {
            return Ok(Value::Auto);
        }
        Ok(Value::Words(words.to_vec()))
    }

    fn as_words(&self, value: &Value, master: &DefinitionView<'_>) -> Result<Vec<Word>> {
        if let Some(words) = sentinel_words(value) {
            return Ok(words);
        }
        match value {
            Value::Words(words) => Ok(words.clone()),
            other => Err(wrong_value_type("words", other, master)),
        }
    }
}

// ---------------------------------------------------------------------------
// strings

struct StringsFactory;

impl ConverterFactory for StringsFactory {
    fn phil_type(&self) -> &'static str {
        "strings"
    }

    fn build(&self, args: &CallArgs) -> std::result::Result<Rc<dyn Converter>, String> {
        args.check_names(&[])?;
        Ok(Rc::new(StringsConverter))
    }
}

struct StringsConverter;

impl Converter for StringsConverter {
    fn phil_type(&self) -> &'static str {
        "strings"
    }

    fn from_words(&self, words: &[Word], _master: &DefinitionView<'_>) -> Result<Value> {
        if is_plain_none(words) {
            return Ok(Value::None);
        }
        if is_plain_auto(words) {
            return Ok(Value::Auto);
        }
        Ok(Value::Strings(
            words.iter().map(|w| w.value().to_string()).collect(),
        ))
    }

    fn as_words(&self, value: &Value, master: &DefinitionView<'_>) -> Result<Vec<Word>> {
        if let Some(words) = sentinel_words(value) {
            return Ok(words);
        }
        match value {
            Value::Strings(strings) => Ok(strings
                .iter()
                .map(|s| Word::quoted(s.clone(), Quote::Double))
                .collect()),
            other => Err(wrong_value_type("strings", other, master)),
        }
    }
}

// ---------------------------------------------------------------------------
// str, qstr, path, key

#[derive(Clone, Copy)]
enum TextKind {
    Str,
    Qstr,
    Path,
    Key,
}

impl TextKind {
    fn phil_type(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Qstr => "qstr",
            Self::Path => "path",
            Self::Key => "key",
        }
    }
}

struct TextFactory {
    kind: TextKind,
}

impl ConverterFactory for TextFactory {
    fn phil_type(&self) -> &'static str {
        self.kind.phil_type()
    }

    fn build(&self, args: &CallArgs) -> std::result::Result<Rc<dyn Converter>, String> {
        args.check_names(&[])?;
        Ok(Rc::new(TextConverter { kind: self.kind }))
    }
}

struct TextConverter {
    kind: TextKind,
}

impl Converter for TextConverter {
    fn phil_type(&self) -> &'static str {
        self.kind.phil_type()
    }

    fn from_words(&self, words: &[Word], _master: &DefinitionView<'_>) -> Result<Value> {
        if is_plain_none(words) {
            return Ok(Value::None);
        }
        if is_plain_auto(words) {
            return Ok(Value::Auto);
        }
        let text = join_word_values(words);
        Ok(match self.kind {
            TextKind::Path => Value::Path(text),
            _ => Value::Str(text),
        })
    }

    fn as_words(&self, value: &Value, master: &DefinitionView<'_>) -> Result<Vec<Word>> {
        if let Some(words) = sentinel_words(value) {
            return Ok(words);
        }
        let text = match (self.kind, value) {
            (TextKind::Path, Value::Path(text) | Value::Str(text)) => text,
            (_, Value::Str(text)) => text,
            (_, other) => return Err(wrong_value_type(self.kind.phil_type(), other, master)),
        };
        // qstr always re-quotes; the others quote only when the text would
        // not survive re-lexing as a single word
        let quote = match self.kind {
            TextKind::Qstr => Quote::Double,
            _ if needs_quoting(text) => Quote::Double,
            _ => Quote::None,
        };
        Ok(vec![Word::quoted(text.clone(), quote)])
    }
}

fn needs_quoting(text: &str) -> bool {
    text.is_empty()
        || text
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '=' | '#' | '"' | '\''))
}

// ---------------------------------------------------------------------------
// bool

struct BoolFactory;

impl ConverterFactory for BoolFactory {
    fn phil_type(&self) -> &'static str {
        "bool"
    }

    fn build(&self, args: &CallArgs) -> std::result::Result<Rc<dyn Converter>, String> {
        args.check_names(&[])?;
        Ok(Rc::new(BoolConverter))
    }
}

struct BoolConverter;

impl Converter for BoolConverter {
    fn phil_type(&self) -> &'static str {
        "bool"
    }

    fn from_words(&self, words: &[Word], master: &DefinitionView<'_>) -> Result<Value> {
        if is_plain_none(words) {
            return Ok(Value::None);
        }
        if is_plain_auto(words) {
            return Ok(Value::Auto);
        }
        let text = join_word_values(words);
        match text.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "off" | "0" => Ok(Value::Bool(false)),
            _ => Err(conversion_error(
                format!(
                    "{}: one True or False value expected, \"{text}\" found",
                    master.full_path()
                ),
                words.first(),
            )),
        }
    }

    fn as_words(&self, value: &Value, master: &DefinitionView<'_>) -> Result<Vec<Word>> {
        if let Some(words) = sentinel_words(value) {
            return Ok(words);
        }
        match value {
            Value::Bool(true) => Ok(vec![Word::new("True")]),
            Value::Bool(false) => Ok(vec![Word::new("False")]),
            other => Err(wrong_value_type("bool", other, master)),
        }
    }
}

// ---------------------------------------------------------------------------
// int, float

struct IntFactory;

impl ConverterFactory for IntFactory {
    fn phil_type(&self) -> &'static str {
        "int"
    }

    fn build(&self, args: &CallArgs) -> std::result::Result<Rc<dyn Converter>, String> {
        args.check_names(&["value_min", "value_max"])?;
        Ok(Rc::new(IntConverter {
            value_min: args.kw_i64("value_min")?,
            value_max: args.kw_i64("value_max")?,
        }))
    }
}

struct IntConverter {
    value_min: Option<i64>,
    value_max: Option<i64>,
}

fn parse_int(text: &str, path: &str, anchor: Option<&Word>) -> Result<i64> {
    text.parse::<i64>().map_err(|_| {
        conversion_error(
            format!("{path}: integer expected, \"{text}\" found"),
            anchor,
        )
    })
}

fn parse_float(text: &str, path: &str, anchor: Option<&Word>) -> Result<f64> {
    text.parse::<f64>().map_err(|_| {
        conversion_error(
            format!("{path}: floating-point value expected, \"{text}\" found"),
            anchor,
        )
    })
}

fn check_int_range(
    value: i64,
    value_min: Option<i64>,
    value_max: Option<i64>,
    path: &str,
    anchor: Option<&Word>,
) -> Result<()> {
    if let Some(min) = value_min {
        if value < min {
            return Err(conversion_error(
                format!("{path} element is less than the minimum allowed value: {value} < {min}"),
                anchor,
            ));
        }
    }
    if let Some(max) = value_max {
        if value > max {
            return Err(conversion_error(
                format!(
                    "{path} element is greater than the maximum allowed value: {value} > {max}"
                ),
                anchor,
            ));
        }
    }
    Ok(())
}

fn check_float_range(
    value: f64,
    value_min: Option<f64>,
    value_max: Option<f64>,
    path: &str,
    anchor: Option<&Word>,
) -> Result<()> {
    if let Some(min) = value_min {
        if value < min {
            return Err(conversion_error(
                format!("{path} element is less than the minimum allowed value: {value} < {min}"),
                anchor,
            ));
        }
    }
    if let Some(max) = value_max {
        if value > max {
            return Err(conversion_error(
                format!(
                    "{path} element is greater than the maximum allowed value: {value} > {max}"
                ),
                anchor,
            ));
        }
    }
    Ok(())
}

impl Converter for IntConverter {
    fn phil_type(&self) -> &'static str {
        "int"
    }

    fn from_words(&self, words: &[Word], master: &DefinitionView<'_>) -> Result<Value> {
        if is_plain_none(words) {
            return Ok(Value::None);
        }
        if is_plain_auto(words) {
            return Ok(Value::Auto);
        }
        let path = master.full_path();
        let text = join_word_values(words);
        let value = parse_int(text.trim(), &path, words.first())?;
        check_int_range(value, self.value_min, self.value_max, &path, words.first())?;
        Ok(Value::Int(value))
    }

    fn as_words(&self, value: &Value, master: &DefinitionView<'_>) -> Result<Vec<Word>> {
        if let Some(words) = sentinel_words(value) {
            return Ok(words);
        }
        match value {
            Value::Int(i) => {
                check_int_range(*i, self.value_min, self.value_max, &master.full_path(), None)?;
                Ok(vec![Word::new(i.to_string())])
            }
            other => Err(wrong_value_type("int", other, master)),
        }
    }
}

struct FloatFactory;

impl ConverterFactory for FloatFactory {
    fn phil_type(&self) -> &'static str {
        "float"
    }

    fn build(&self, args: &CallArgs) -> std::result::Result<Rc<dyn Converter>, String> {
        args.check_names(&["value_min", "value_max"])?;
        Ok(Rc::new(FloatConverter {
            value_min: args.kw_f64("value_min")?,
            value_max: args.kw_f64("value_max")?,
        }))
    }
}

struct FloatConverter {
    value_min: Option<f64>,
    value_max: Option<f64>,
}

impl Converter for FloatConverter {
    fn phil_type(&self) -> &'static str {
        "float"
    }

    fn from_words(&self, words: &[Word], master: &DefinitionView<'_>) -> Result<Value> {
        if is_plain_none(words) {
            return Ok(Value::None);
        }
        if is_plain_auto(words) {
            return Ok(Value::Auto);
        }
        let path = master.full_path();
        let text = join_word_values(words);
        let value = parse_float(text.trim(), &path, words.first())?;
        check_float_range(value, self.value_min, self.value_max, &path, words.first())?;
        Ok(Value::Float(value))
    }

    fn as_words(&self, value: &Value, master: &DefinitionView<'_>) -> Result<Vec<Word>> {
        if let Some(words) = sentinel_words(value) {
            return Ok(words);
        }
        match value {
            Value::Float(f) => {
                check_float_range(
                    *f,
                    self.value_min,
                    self.value_max,
                    &master.full_path(),
                    None,
                )?;
                Ok(vec![Word::new(format_float(*f))])
            }
            Value::Int(i) => Ok(vec![Word::new(format_float(*i as f64))]),
            other => Err(wrong_value_type("float", other, master)),
        }
    }
}

/// Renders a float so it survives a round trip as a float (a bare integer
/// rendering would re-read as one too, which is fine).
fn format_float(f: f64) -> String {
    let text = f.to_string();
    if text.contains('.') || text.contains('e') || text.contains("inf") || text.contains("NaN") {
        text
    } else {
        format!("{text}.0")
    }
}

// ---------------------------------------------------------------------------
// ints, floats

/// Shared size constraints of the numeric sequence families.
struct SizeSpec {
    size: Option<usize>,
    size_min: Option<usize>,
    size_max: Option<usize>,
}

impl SizeSpec {
    fn from_args(args: &CallArgs) -> std::result::Result<Self, String> {
        Ok(Self {
            size: args.kw_usize("size")?,
            size_min: args.kw_usize("size_min")?,
            size_max: args.kw_usize("size_max")?,
        })
    }

    fn check(&self, count: usize, path: &str, anchor: Option<&Word>) -> Result<()> {
        if let Some(size) = self.size {
            if count != size {
                return Err(conversion_error(
                    format!("{path} must contain exactly {size} numeric values ({count} given)"),
                    anchor,
                ));
            }
        }
        if let Some(min) = self.size_min {
            if count < min {
                return Err(conversion_error(
                    format!("{path} must contain at least {min} numeric values ({count} given)"),
                    anchor,
                ));
            }
        }
        if let Some(max) = self.size_max {
            if count > max {
                return Err(conversion_error(
                    format!("{path} must contain at most {max} numeric values ({count} given)"),
                    anchor,
                ));
            }
        }
        Ok(())
    }
}

/// Splits sequence words into numeric fragments, tolerating comma
/// separators mixed in with whitespace.
fn numeric_fragments(words: &[Word]) -> Vec<String> {
    let mut fragments = Vec::new();
    for word in words {
        for piece in word.value().split(',') {
            let piece = piece.trim();
            if !piece.is_empty() {
                fragments.push(piece.to_string());
            }
        }
    }
    fragments
}

struct IntsFactory;

impl ConverterFactory for IntsFactory {
    fn phil_type(&self) -> &'static str {
        "ints"
    }

    fn build(&self, args: &CallArgs) -> std::result::Result<Rc<dyn Converter>, String> {
        args.check_names(&["size", "size_min", "size_max", "value_min", "value_max"])?;
        Ok(Rc::new(IntsConverter {
            size: SizeSpec::from_args(args)?,
            value_min: args.kw_i64("value_min")?,
            value_max: args.kw_i64("value_max")?,
        }))
    }
}

struct IntsConverter {
    size: SizeSpec,
    value_min: Option<i64>,
    value_max: Option<i64>,
}

impl Converter for IntsConverter {
    fn phil_type(&self) -> &'static str {
        "ints"
    }

    fn from_words(&self, words: &[Word], master: &DefinitionView<'_>) -> Result<Value> {
        if is_plain_none(words) {
            return Ok(Value::None);
        }
        if is_plain_auto(words) {
            return Ok(Value::Auto);
        }
        let path = master.full_path();
        let anchor = words.first();
        let mut values = Vec::new();
        for fragment in numeric_fragments(words) {
            let value = parse_int(&fragment, &path, anchor)?;
            check_int_range(value, self.value_min, self.value_max, &path, anchor)?;
            values.push(value);
        }
        self.size.check(values.len(), &path, anchor)?;
        Ok(Value::Ints(values))
    }

    fn as_words(&self, value: &Value, master: &DefinitionView<'_>) -> Result<Vec<Word>> {
        if let Some(words) = sentinel_words(value) {
            return Ok(words);
        }
        match value {
            Value::Ints(values) => {
                let path = master.full_path();
                self.size.check(values.len(), &path, None)?;
                for v in values {
                    check_int_range(*v, self.value_min, self.value_max, &path, None)?;
                }
                Ok(values.iter().map(|v| Word::new(v.to_string())).collect())
            }
            other => Err(wrong_value_type("ints", other, master)),
        }
    }
}

struct FloatsFactory;

impl ConverterFactory for FloatsFactory {
    fn phil_type(&self) -> &'static str {
        "floats"
    }

    fn build(&self, args: &CallArgs) -> std::result::Result<Rc<dyn Converter>, String> {
        args.check_names(&["size", "size_min", "size_max", "value_min", "value_max"])?;
        Ok(Rc::new(FloatsConverter {
            size: SizeSpec::from_args(args)?,
            value_min: args.kw_f64("value_min")?,
            value_max: args.kw_f64("value_max")?,
        }))
    }
}

struct FloatsConverter {
    size: SizeSpec,
    value_min: Option<f64>,
    value_max: Option<f64>,
}

impl Converter for FloatsConverter {
    fn phil_type(&self) -> &'static str {
        "floats"
    }

    fn from_words(&self, words: &[Word], master: &DefinitionView<'_>) -> Result<Value> {
        if is_plain_none(words) {
            return Ok(Value::None);
        }
        if is_plain_auto(words) {
            return Ok(Value::Auto);
        }
        let path = master.full_path();
        let anchor = words.first();
        let mut values = Vec::new();
        for fragment in numeric_fragments(words) {
            let value = parse_float(&fragment, &path, anchor)?;
            check_float_range(value, self.value_min, self.value_max, &path, anchor)?;
            values.push(value);
        }
        self.size.check(values.len(), &path, anchor)?;
        Ok(Value::Floats(values))
    }

    fn as_words(&self, value: &Value, master: &DefinitionView<'_>) -> Result<Vec<Word>> {
        if let Some(words) = sentinel_words(value) {
            return Ok(words);
        }
        match value {
            Value::Floats(values) => {
                let path = master.full_path();
                self.size.check(values.len(), &path, None)?;
                for v in values {
                    check_float_range(*v, self.value_min, self.value_max, &path, None)?;
                }
                Ok(values
                    .iter()
                    .map(|v| Word::new(format_float(*v)))
                    .collect())
            }
            other => Err(wrong_value_type("floats", other, master)),
        }
    }
}

// ---------------------------------------------------------------------------
// choice

struct ChoiceFactory;

impl ConverterFactory for ChoiceFactory {
    fn phil_type(&self) -> &'static str {
        "choice"
    }

    fn build(&self, args: &CallArgs) -> std::result::Result<Rc<dyn Converter>, String> {
        args.check_names(&["multi"])?;
        Ok(Rc::new(ChoiceConverter {
            multi: args.kw_bool("multi")?.unwrap_or(false),
        }))
    }
}

struct ChoiceConverter {
    multi: bool,
}

fn strip_star(value: &str) -> (&str, bool) {
    value
        .strip_prefix('*')
        .map_or((value, false), |bare| (bare, true))
}

impl Converter for ChoiceConverter {
    fn phil_type(&self) -> &'static str {
        if self.multi {
            "choice(multi=True)"
        } else {
            "choice"
        }
    }

    fn from_words(&self, words: &[Word], master: &DefinitionView<'_>) -> Result<Value> {
        if is_plain_auto(words) {
            return Ok(Value::Auto);
        }
        let mut selected = Vec::new();
        for word in words {
            let (bare, starred) = strip_star(word.value());
            if starred {
                selected.push(bare.to_string());
            }
        }
        if self.multi {
            Ok(Value::Strings(selected))
        } else {
            match selected.len() {
                0 => Ok(Value::None),
                1 => Ok(Value::Str(selected.remove(0))),
                _ => Err(conversion_error(
                    format!(
                        "{}: multiple choices selected where only one is possible",
                        master.full_path()
                    ),
                    words.first(),
                )),
            }
        }
    }

    fn as_words(&self, value: &Value, master: &DefinitionView<'_>) -> Result<Vec<Word>> {
        if matches!(value, Value::Auto) {
            return Ok(vec![Word::new("Auto")]);
        }
        let selected: Vec<&str> = match value {
            Value::None => Vec::new(),
            Value::Str(s) => vec![s.as_str()],
            Value::Strings(strings) if self.multi => {
                strings.iter().map(String::as_str).collect()
            }
            other => return Err(wrong_value_type(self.phil_type(), other, master)),
        };
        let master_words = master.words();
        let mut result = Vec::with_capacity(master_words.len());
        let mut found = vec![false; selected.len()];
        for word in master_words {
            let (bare, _) = strip_star(word.value());
            let mut starred = false;
            for (i, wanted) in selected.iter().enumerate() {
                if bare.eq_ignore_ascii_case(wanted) {
                    starred = true;
                    found[i] = true;
                }
            }
            let text = if starred {
                format!("*{bare}")
            } else {
                bare.to_string()
            };
            result.push(Word::new(text));
        }
        for (i, wanted) in selected.iter().enumerate() {
            if !found[i] {
                return Err(conversion_error(
                    format!("{}: \"{wanted}\" is not a possible choice", master.full_path()),
                    None,
                ));
            }
        }
        Ok(result)
    }

    /// Reconciles source words against the master's choice list. Bare
    /// source words (no `*` anywhere) are treated as selections, so
    /// `level=high` selects `high` out of `low *medium high`.
    fn fetch(
        &self,
        source_words: &[Word],
        master: &DefinitionView<'_>,
        ignore_errors: bool,
    ) -> Option<Result<Vec<Word>>> {
        if is_plain_auto(source_words) || is_plain_none(source_words) {
            return Some(Ok(source_words.to_vec()));
        }
        let any_star = source_words
            .iter()
            .any(|w| w.value().starts_with('*'));
        // each selection keeps its originating word for error anchoring
        let mut selected: Vec<(&str, &Word)> = Vec::new();
        for word in source_words {
            let (bare, starred) = strip_star(word.value());
            if starred || !any_star {
                selected.push((bare, word));
            }
        }
        let master_words = master.words();
        let mut result = Vec::with_capacity(master_words.len());
        let mut found = vec![false; selected.len()];
        for word in master_words {
            let (bare, _) = strip_star(word.value());
            let mut starred = false;
            for (i, (wanted, _)) in selected.iter().enumerate() {
                if bare.eq_ignore_ascii_case(wanted) {
                    starred = true;
                    found[i] = true;
                }
            }
            let text = if starred {
                format!("*{bare}")
            } else {
                bare.to_string()
            };
            result.push(Word::new(text));
        }
        for (i, &(wanted, word)) in selected.iter().enumerate() {
            if !found[i] && !ignore_errors {
                return Some(Err(conversion_error(
                    format!(
                        "{}: \"{wanted}\" is not a possible choice",
                        master.full_path()
                    ),
                    Some(word),
                )));
            }
        }
        Some(Ok(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Session;
    use crate::types::{normalize_call_expression, parse_call_expression, ConverterRegistry};

    fn build(expression: &str) -> Rc<dyn Converter> {
        let registry = ConverterRegistry::with_builtins();
        let normalized = normalize_call_expression(expression).unwrap();
        let parsed = parse_call_expression(&normalized).unwrap();
        registry
            .get(&parsed.callee)
            .unwrap()
            .build(&parsed.args)
            .unwrap()
    }

    fn with_definition<R>(source: &str, f: impl FnOnce(DefinitionView<'_>) -> R) -> R {
        let mut session = Session::new();
        let root = session.parse(source, None).unwrap();
        let id = session.children(root)[0];
        f(session.definition_view(id))
    }

    fn words(values: &[&str]) -> Vec<Word> {
        values.iter().copied().map(Word::new).collect()
    }

    #[test]
    fn test_int_with_bounds() {
        let conv = build("int(value_min=0, value_max=10)");
        with_definition("x = 5", |view| {
            assert_eq!(conv.from_words(&words(&["5"]), &view).unwrap(), Value::Int(5));
            assert!(conv.from_words(&words(&["11"]), &view).is_err());
            assert!(conv.from_words(&words(&["-1"]), &view).is_err());
            assert!(conv.from_words(&words(&["five"]), &view).is_err());
            assert_eq!(
                conv.from_words(&words(&["None"]), &view).unwrap(),
                Value::None
            );
        });
    }

    #[test]
    fn test_float_round_trip_words() {
        let conv = build("float");
        with_definition("x = 1.5", |view| {
            let value = conv.from_words(&words(&["1.5"]), &view).unwrap();
            assert_eq!(value, Value::Float(1.5));
            let rendered = conv.as_words(&value, &view).unwrap();
            assert_eq!(rendered[0].value(), "1.5");
            // whole floats keep a decimal point
            let rendered = conv.as_words(&Value::Float(2.0), &view).unwrap();
            assert_eq!(rendered[0].value(), "2.0");
        });
    }

    #[test]
    fn test_ints_accepts_commas_and_checks_size() {
        let conv = build("ints(size=3)");
        with_definition("x = 1 2 3", |view| {
            assert_eq!(
                conv.from_words(&words(&["1,", "2,", "3"]), &view).unwrap(),
                Value::Ints(vec![1, 2, 3])
            );
            assert!(conv.from_words(&words(&["1", "2"]), &view).is_err());
        });
    }

    #[test]
    fn test_bool_spellings() {
        let conv = build("bool");
        with_definition("x = yes", |view| {
            for t in ["True", "true", "yes", "on", "1"] {
                assert_eq!(
                    conv.from_words(&words(&[t]), &view).unwrap(),
                    Value::Bool(true)
                );
            }
            for t in ["False", "no", "off", "0"] {
                assert_eq!(
                    conv.from_words(&words(&[t]), &view).unwrap(),
                    Value::Bool(false)
                );
            }
            assert!(conv.from_words(&words(&["maybe"]), &view).is_err());
        });
    }

    #[test]
    fn test_strings_quote_on_output() {
        let conv = build("strings");
        with_definition("x = a b", |view| {
            let value = Value::Strings(vec!["two words".to_string()]);
            let rendered = conv.as_words(&value, &view).unwrap();
            assert_eq!(rendered[0].to_string(), "\"two words\"");
        });
    }

    #[test]
    fn test_str_joins_and_quotes_when_needed() {
        let conv = build("str");
        with_definition("x = a b", |view| {
            let value = conv.from_words(&words(&["a", "b"]), &view).unwrap();
            assert_eq!(value, Value::Str("a b".to_string()));
            let rendered = conv.as_words(&value, &view).unwrap();
            assert_eq!(rendered[0].to_string(), "\"a b\"");
            let plain = conv.as_words(&Value::Str("plain".to_string()), &view).unwrap();
            assert_eq!(plain[0].to_string(), "plain");
        });
    }

    #[test]
    fn test_choice_single_selection() {
        let conv = build("choice");
        with_definition("level = low *medium high", |view| {
            let value = conv
                .from_words(&words(&["low", "*medium", "high"]), &view)
                .unwrap();
            assert_eq!(value, Value::Str("medium".to_string()));
            assert!(conv
                .from_words(&words(&["*low", "*high"]), &view)
                .is_err());
            assert_eq!(
                conv.from_words(&words(&["low", "medium"]), &view).unwrap(),
                Value::None
            );
        });
    }

    #[test]
    fn test_choice_as_words_restars() {
        let conv = build("choice");
        with_definition("level = low *medium high", |view| {
            let rendered = conv
                .as_words(&Value::Str("high".to_string()), &view)
                .unwrap();
            let values: Vec<&str> = rendered.iter().map(Word::value).collect();
            assert_eq!(values, ["low", "medium", "*high"]);
            assert!(conv
                .as_words(&Value::Str("extreme".to_string()), &view)
                .is_err());
        });
    }

    #[test]
    fn test_choice_fetch_bare_selection() {
        let conv = build("choice");
        with_definition("level = low *medium high", |view| {
            let fetched = conv
                .fetch(&words(&["high"]), &view, false)
                .unwrap()
                .unwrap();
            let values: Vec<&str> = fetched.iter().map(Word::value).collect();
            assert_eq!(values, ["low", "medium", "*high"]);

            // case-insensitive match against the declaration
            let fetched = conv
                .fetch(&words(&["HIGH"]), &view, false)
                .unwrap()
                .unwrap();
            assert_eq!(fetched[2].value(), "*high");

            assert!(conv
                .fetch(&words(&["extreme"]), &view, false)
                .unwrap()
                .is_err());
            // tolerated when errors are ignored
            assert!(conv
                .fetch(&words(&["extreme"]), &view, true)
                .unwrap()
                .is_ok());
        });
    }

    #[test]
    fn test_choice_fetch_error_anchors_offending_word() {
        let conv = build("choice");
        with_definition("level = low *medium high", |view| {
            let input = vec![
                Word::new("*low"),
                Word::with_source("*extreme", Quote::None, "file \"x.phil\""),
            ];
            let err = conv.fetch(&input, &view, false).unwrap().unwrap_err();
            match err {
                Error::Conversion { location, .. } => {
                    assert!(location.contains("x.phil"));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        });
    }

    #[test]
    fn test_choice_multi() {
        let conv = build("choice(multi=True)");
        with_definition("opts = *a b *c", |view| {
            let value = conv.from_words(&words(&["*a", "b", "*c"]), &view).unwrap();
            assert_eq!(
                value,
                Value::Strings(vec!["a".to_string(), "c".to_string()])
            );
            let rendered = conv.as_words(&value, &view).unwrap();
            let values: Vec<&str> = rendered.iter().map(Word::value).collect();
            assert_eq!(values, ["*a", "b", "*c"]);
        });
    }

    #[test]
    fn test_words_passthrough() {
        let conv = build("words");
        with_definition("x = a \"b c\"", |view| {
            let input = vec![Word::new("a"), Word::quoted("b c", Quote::Double)];
            let value = conv.from_words(&input, &view).unwrap();
            let rendered = conv.as_words(&value, &view).unwrap();
            assert_eq!(rendered, input);
        });
    }
}
