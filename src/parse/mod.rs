use logos::Span;

mod lex;
mod number;

use self::{
    lex::{Token, Tokenizer, Unterminated},
    number::NumberError,
};
use crate::{
    ast::{self, MessageKind, Rule},
    error::{ParseError, ParseErrorKind},
    grammar::{
        self, ASSIGN, BLOCK_CLOSE, BLOCK_OPEN, CUSTOM_CLOSE, CUSTOM_OPEN, OPTIONS_CLOSE,
        OPTIONS_OPEN, OPTIONS_SEPARATOR, STATEMENT_END,
    },
};

type Result<T, E = ParseErrorKind> = std::result::Result<T, E>;

const FILE_CONTEXT: &str = "file";

/// How deeply messages, groups, enums and extend blocks may be nested.
pub(crate) const MAX_NESTING_DEPTH: usize = 64;

pub(crate) fn parse(file: &str, source: &str) -> Result<ast::Schema, ParseError> {
    let mut parser = Parser::new(source);
    match parser.parse_schema() {
        Ok(schema) => {
            log::debug!(
                "parsed {} message(s), {} enum(s) and {} service(s) from '{}'",
                schema.messages.len(),
                schema.enums.len(),
                schema.services.len(),
                file,
            );
            Ok(schema)
        }
        Err(kind) => {
            let line = parser.tokenizer.line();
            log::debug!("failed to parse '{}' at line {}: {}", file, line, kind);
            Err(ParseError::new(kind, line, file, source))
        }
    }
}

struct Parser<'a> {
    tokenizer: Tokenizer<'a>,
    header: bool,
    package: Option<Span>,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Parser {
            tokenizer: Tokenizer::new(source),
            header: true,
            package: None,
            depth: 0,
        }
    }

    fn parse_schema(&mut self) -> Result<ast::Schema> {
        let mut schema = ast::Schema::default();

        while let Some(token) = self.tokenizer.next() {
            log::trace!("parsing '{}' statement at line {}", token.text, token.line);
            match token.text {
                "package" => {
                    self.check_header(&token)?;
                    if let Some(first) = self.package.clone() {
                        return Err(ParseErrorKind::DuplicatePackage {
                            first,
                            second: token.span,
                        });
                    }
                    schema.package = Some(self.parse_package()?);
                    self.package = Some(token.span);
                }
                "import" => {
                    self.check_header(&token)?;
                    schema.imports.push(self.parse_import()?);
                }
                "option" => {
                    self.check_header(&token)?;
                    self.parse_option(&mut schema.options, FILE_CONTEXT)?;
                }
                "message" => {
                    self.header = false;
                    schema.messages.push(self.parse_message(FILE_CONTEXT)?);
                }
                "enum" => {
                    self.header = false;
                    schema.enums.push(self.parse_enum(FILE_CONTEXT)?);
                }
                "service" => {
                    self.header = false;
                    schema.services.push(self.parse_service()?);
                }
                "extend" => {
                    self.header = false;
                    schema.messages.push(self.parse_extend(FILE_CONTEXT)?);
                }
                "syntax" => {
                    self.header = false;
                    self.skip_statement("syntax statement")?;
                }
                _ => {
                    return Err(self.unexpected_token(
                        &token,
                        fmt_expected(&[
                            "package", "import", "option", "message", "enum", "service", "extend",
                            "syntax",
                        ]),
                        FILE_CONTEXT,
                    ))
                }
            }
        }

        // A comment left open after the last statement still fails the parse.
        match self.tokenizer.unterminated() {
            Some(_) => Err(self.eof("a statement", FILE_CONTEXT)),
            None => Ok(schema),
        }
    }

    fn check_header(&self, token: &Token) -> Result<()> {
        if self.header {
            Ok(())
        } else {
            Err(ParseErrorKind::IllegalOrder {
                statement: token.text.to_owned(),
                span: token.span.clone(),
            })
        }
    }

    fn parse_package(&mut self) -> Result<String> {
        const CONTEXT: &str = "package statement";

        let name = self.expect(grammar::is_type_ref, "a package name", CONTEXT)?;
        self.expect_eq(STATEMENT_END, CONTEXT)?;
        Ok(name.text.to_owned())
    }

    fn parse_import(&mut self) -> Result<ast::Import> {
        const CONTEXT: &str = "import statement";

        let public = self.bump_if_eq("public");
        let path = self.parse_string(CONTEXT)?;
        self.expect_eq(STATEMENT_END, CONTEXT)?;
        Ok(ast::Import { path, public })
    }

    /// Skips a statement whose contents are not recorded, up to and including its `;`.
    fn skip_statement(&mut self, context: &str) -> Result<()> {
        loop {
            let token = self.next_token(format!("'{}'", STATEMENT_END), context)?;
            if token.text == STATEMENT_END {
                return Ok(());
            }
        }
    }

    fn parse_message(&mut self, context: &str) -> Result<ast::Message> {
        let name = self.expect(grammar::is_name, "a message name", context)?;
        self.enter(&name)?;
        let mut message = ast::Message::new(name.text, MessageKind::Message);
        self.expect_eq(BLOCK_OPEN, &describe(&message))?;
        self.parse_message_body(&mut message)?;
        self.exit();
        Ok(message)
    }

    /// Parses declarations up to and including the closing brace of a message or group body.
    fn parse_message_body(&mut self, message: &mut ast::Message) -> Result<()> {
        let context = describe(message);

        loop {
            let token = self.next_token("a message member or '}'", &context)?;
            match token.text {
                BLOCK_CLOSE => {
                    self.bump_if_eq(STATEMENT_END);
                    return Ok(());
                }
                "enum" => message.enums.push(self.parse_enum(&context)?),
                "message" => message.messages.push(self.parse_message(&context)?),
                "option" => self.parse_option(&mut message.options, &context)?,
                "extensions" => message.extensions = Some(self.parse_extensions(&context)?),
                "extend" => message.messages.push(self.parse_extend(&context)?),
                text => match Rule::from_keyword(text) {
                    Some(rule) => self.parse_field(message, rule)?,
                    None => {
                        return Err(self.unexpected_token(
                            &token,
                            fmt_expected(&[
                                "required",
                                "optional",
                                "repeated",
                                "enum",
                                "message",
                                "option",
                                "extensions",
                                "extend",
                                BLOCK_CLOSE,
                            ]),
                            &context,
                        ))
                    }
                },
            }
        }
    }

    /// Parses a field after its rule, adding it to `parent`.
    fn parse_field(&mut self, parent: &mut ast::Message, rule: Rule) -> Result<()> {
        let context = describe(parent);
        let extendee = parent.target_reference().map(ToOwned::to_owned);

        let ty = self.next_token("a field type", &context)?;
        if ty.text == "group" {
            return self.parse_group(parent, rule, extendee, &context);
        }
        if !grammar::is_field_type(ty.text) {
            return Err(self.unexpected_token(&ty, "a field type", &context));
        }

        let name = self.expect(grammar::is_name, "a field name", &context)?;
        let context = format!("field {} in {}", name.text, context);
        self.expect_eq(ASSIGN, &context)?;
        let id = self.parse_id(false, &context)?;

        let mut options = ast::Options::default();
        if self.bump_if_eq(OPTIONS_OPEN) {
            self.parse_field_options(&mut options, &context)?;
        }
        self.expect_eq(STATEMENT_END, &context)?;

        parent.fields.push(ast::Field {
            rule,
            ty: ty.text.to_owned(),
            name: name.text.to_owned(),
            id,
            options,
            group: false,
            extendee,
        });
        Ok(())
    }

    fn parse_group(
        &mut self,
        parent: &mut ast::Message,
        rule: Rule,
        extendee: Option<String>,
        context: &str,
    ) -> Result<()> {
        let name = self.expect(grammar::is_name, "a group name", context)?;
        if !grammar::is_group_name(name.text) {
            return Err(ParseErrorKind::InvalidGroupName {
                name: name.text.to_owned(),
                span: name.span,
            });
        }
        self.enter(&name)?;

        let mut body = ast::Message::new(name.text, MessageKind::Group);
        let context = describe(&body);
        self.expect_eq(ASSIGN, &context)?;
        let id = self.parse_id(false, &context)?;

        let mut options = ast::Options::default();
        if self.bump_if_eq(OPTIONS_OPEN) {
            self.parse_field_options(&mut options, &context)?;
        }

        self.expect_eq(BLOCK_OPEN, &context)?;
        self.parse_message_body(&mut body)?;
        self.exit();

        parent.messages.push(body);
        parent.fields.push(ast::Field {
            rule,
            ty: name.text.to_owned(),
            name: name.text.to_ascii_lowercase(),
            id,
            options,
            group: true,
            extendee,
        });
        Ok(())
    }

    /// Parses the rest of a bracketed option list, after the `[`.
    fn parse_field_options(&mut self, options: &mut ast::Options, context: &str) -> Result<()> {
        loop {
            let (name, value) = self.parse_option_assignment(context)?;
            options.insert(name, value);

            let token = self.next_token("',' or ']'", context)?;
            match token.text {
                OPTIONS_SEPARATOR => continue,
                OPTIONS_CLOSE => return Ok(()),
                _ => {
                    return Err(self.unexpected_token(
                        &token,
                        fmt_expected(&[OPTIONS_SEPARATOR, OPTIONS_CLOSE]),
                        context,
                    ))
                }
            }
        }
    }

    fn parse_enum(&mut self, context: &str) -> Result<ast::Enum> {
        let name = self.expect(grammar::is_name, "an enum name", context)?;
        self.enter(&name)?;
        let context = format!("enum {}", name.text);
        let mut result = ast::Enum {
            name: name.text.to_owned(),
            ..Default::default()
        };

        self.expect_eq(BLOCK_OPEN, &context)?;
        loop {
            let token = self.next_token("an enum value, 'option' or '}'", &context)?;
            match token.text {
                BLOCK_CLOSE => {
                    self.bump_if_eq(STATEMENT_END);
                    self.exit();
                    return Ok(result);
                }
                "option" => self.parse_option(&mut result.options, &context)?,
                text if grammar::is_name(text) => {
                    let value = self.parse_enum_value(text, &context)?;
                    result.values.push(value);
                }
                _ => {
                    return Err(self.unexpected_token(
                        &token,
                        "an enum value, 'option' or '}'",
                        &context,
                    ))
                }
            }
        }
    }

    fn parse_enum_value(&mut self, name: &str, context: &str) -> Result<ast::EnumValue> {
        let context = format!("value {} in {}", name, context);
        self.expect_eq(ASSIGN, &context)?;
        let id = self.parse_id(true, &context)?;

        if self.bump_if_eq(OPTIONS_OPEN) {
            let mut ignored = ast::Options::default();
            self.parse_field_options(&mut ignored, &context)?;
        }
        self.expect_eq(STATEMENT_END, &context)?;

        Ok(ast::EnumValue {
            name: name.to_owned(),
            id,
        })
    }

    fn parse_extensions(&mut self, context: &str) -> Result<(i32, i32)> {
        let context = format!("extension range in {}", context);
        let start = self.parse_extension_bound(&context)?;
        self.expect_eq("to", &context)?;
        let end = self.parse_extension_bound(&context)?;
        self.expect_eq(STATEMENT_END, &context)?;
        Ok((start, end))
    }

    fn parse_extension_bound(&mut self, context: &str) -> Result<i32> {
        let token = self.next_token("an integer, 'min' or 'max'", context)?;
        match token.text {
            "min" => Ok(ast::FIELD_NUMBER_MIN),
            "max" => Ok(ast::FIELD_NUMBER_MAX),
            text => number::parse_id(text, false).map_err(|err| {
                ParseErrorKind::IllegalNumber {
                    value: text.to_owned(),
                    context: context.to_owned(),
                    reason: id_error_reason(err),
                    span: token.span.clone(),
                }
            }),
        }
    }

    fn parse_extend(&mut self, context: &str) -> Result<ast::Message> {
        let target = self.expect(grammar::is_type_ref, "a message type", context)?;
        self.enter(&target)?;
        let mut message = ast::Message::new(target.text, MessageKind::Extend);
        let context = describe(&message);

        self.expect_eq(BLOCK_OPEN, &context)?;
        loop {
            let token = self.next_token("a field or '}'", &context)?;
            match token.text {
                BLOCK_CLOSE => {
                    self.bump_if_eq(STATEMENT_END);
                    self.exit();
                    return Ok(message);
                }
                text => match Rule::from_keyword(text) {
                    Some(rule) => self.parse_field(&mut message, rule)?,
                    None => {
                        return Err(self.unexpected_token(
                            &token,
                            fmt_expected(&["required", "optional", "repeated", BLOCK_CLOSE]),
                            &context,
                        ))
                    }
                },
            }
        }
    }

    fn parse_service(&mut self) -> Result<ast::Service> {
        let name = self.expect(grammar::is_name, "a service name", FILE_CONTEXT)?;
        let context = format!("service {}", name.text);
        let mut service = ast::Service {
            name: name.text.to_owned(),
            ..Default::default()
        };

        self.expect_eq(BLOCK_OPEN, &context)?;
        loop {
            let token = self.next_token("'rpc', 'option' or '}'", &context)?;
            match token.text {
                BLOCK_CLOSE => return Ok(service),
                "option" => self.parse_option(&mut service.options, &context)?,
                "rpc" => {
                    let method = self.parse_method(token.text, &context)?;
                    service.add_method(method);
                }
                _ => {
                    return Err(self.unexpected_token(
                        &token,
                        fmt_expected(&["rpc", "option", BLOCK_CLOSE]),
                        &context,
                    ))
                }
            }
        }
    }

    fn parse_method(&mut self, kind: &str, context: &str) -> Result<ast::Method> {
        let name = self.expect(grammar::is_name, "a method name", context)?;
        let context = format!("{} {} in {}", kind, name.text, context);

        self.expect_eq(CUSTOM_OPEN, &context)?;
        let request = self.expect(grammar::is_type_ref, "a request type", &context)?;
        self.expect_eq(CUSTOM_CLOSE, &context)?;

        let returns = self.next_token("'returns'", &context)?;
        if !returns.text.eq_ignore_ascii_case("returns") {
            return Err(self.unexpected_token(&returns, "'returns'", &context));
        }

        self.expect_eq(CUSTOM_OPEN, &context)?;
        let response = self.expect(grammar::is_type_ref, "a response type", &context)?;
        self.expect_eq(CUSTOM_CLOSE, &context)?;

        let mut method = ast::Method {
            kind: kind.to_owned(),
            name: name.text.to_owned(),
            request: request.text.to_owned(),
            response: response.text.to_owned(),
            options: ast::Options::default(),
        };

        let token = self.next_token("';' or '{'", &context)?;
        match token.text {
            STATEMENT_END => Ok(method),
            BLOCK_OPEN => loop {
                let token = self.next_token("'option' or '}'", &context)?;
                match token.text {
                    "option" => self.parse_option(&mut method.options, &context)?,
                    BLOCK_CLOSE => {
                        self.bump_if_eq(STATEMENT_END);
                        return Ok(method);
                    }
                    _ => {
                        return Err(self.unexpected_token(
                            &token,
                            fmt_expected(&["option", BLOCK_CLOSE]),
                            &context,
                        ))
                    }
                }
            },
            _ => Err(self.unexpected_token(
                &token,
                fmt_expected(&[STATEMENT_END, BLOCK_OPEN]),
                &context,
            )),
        }
    }

    /// Parses an `option` statement after the keyword, adding it to `options`.
    fn parse_option(&mut self, options: &mut ast::Options, context: &str) -> Result<()> {
        let (name, value) = self.parse_option_assignment(context)?;
        self.expect_eq(STATEMENT_END, context)?;
        log::trace!("setting option '{}' in {}", name, context);
        options.insert(name, value);
        Ok(())
    }

    fn parse_option_assignment(&mut self, context: &str) -> Result<(String, ast::OptionValue)> {
        let name = self.parse_option_name(context)?;
        self.expect_eq(ASSIGN, context)?;
        let value = self.parse_option_value(context)?;
        Ok((name, value))
    }

    fn parse_option_name(&mut self, context: &str) -> Result<String> {
        if !self.bump_if_eq(CUSTOM_OPEN) {
            let name = self.expect(grammar::is_type_ref, "an option name or '('", context)?;
            return Ok(name.text.to_owned());
        }

        let extension = self.expect(grammar::is_type_ref, "an option name", context)?;
        self.expect_eq(CUSTOM_CLOSE, context)?;

        let mut name = format!("({})", extension.text);
        if let Some(field) = self.next_if(grammar::is_fq_continuation) {
            name.push_str(field.text);
        }
        Ok(name)
    }

    fn parse_option_value(&mut self, context: &str) -> Result<ast::OptionValue> {
        let token = match self.tokenizer.peek() {
            Some(token) => token,
            None => return Err(self.eof("an option value", context)),
        };

        if grammar::is_string_open(token.text) {
            return Ok(ast::OptionValue::String(self.parse_string(context)?));
        }

        self.tokenizer.next();
        if grammar::is_number(token.text) {
            number::parse_number(token.text).map_err(|err| ParseErrorKind::IllegalNumber {
                value: token.text.to_owned(),
                context: context.to_owned(),
                reason: number_error_reason(err),
                span: token.span.clone(),
            })
        } else if grammar::is_bool(token.text) {
            Ok(ast::OptionValue::Bool(
                token.text.eq_ignore_ascii_case("true"),
            ))
        } else if grammar::is_type_ref(token.text) {
            Ok(ast::OptionValue::Ident(token.text.to_owned()))
        } else {
            Err(self.unexpected_token(&token, "an option value", context))
        }
    }

    fn parse_id(&mut self, allow_negative: bool, context: &str) -> Result<i32> {
        let token = self.next_token("an integer", context)?;
        number::parse_id(token.text, allow_negative).map_err(|err| ParseErrorKind::IllegalId {
            value: token.text.to_owned(),
            context: context.to_owned(),
            reason: id_error_reason(err),
            span: token.span.clone(),
        })
    }

    /// Parses a quoted string starting at its opening quote, returning its raw contents.
    fn parse_string(&mut self, context: &str) -> Result<String> {
        self.expect(grammar::is_string_open, "a string", context)?;
        let body = self.next_token("the contents of a string", context)?;
        let close = self.next_token("the end of a string", context)?;
        if close.text != self.tokenizer.string_ends_with() {
            return Err(self.unexpected_token(
                &close,
                format!("'{}'", self.tokenizer.string_ends_with()),
                context,
            ));
        }
        Ok(body.text.to_owned())
    }

    /// Starts a nested definition named by `token`, failing once nesting exceeds the limit.
    fn enter(&mut self, token: &Token) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(ParseErrorKind::NestingTooDeep {
                span: token.span.clone(),
            });
        }
        Ok(())
    }

    fn exit(&mut self) {
        self.depth -= 1;
    }

    fn expect_eq(&mut self, text: &str, context: &str) -> Result<Token<'a>> {
        self.expect(|t| t == text, format!("'{}'", text), context)
    }

    fn expect(
        &mut self,
        f: impl FnOnce(&str) -> bool,
        expected: impl ToString,
        context: &str,
    ) -> Result<Token<'a>> {
        let token = self.next_token(expected.to_string(), context)?;
        if f(token.text) {
            Ok(token)
        } else {
            Err(self.unexpected_token(&token, expected, context))
        }
    }

    fn next_token(&mut self, expected: impl ToString, context: &str) -> Result<Token<'a>> {
        match self.tokenizer.next() {
            Some(token) => Ok(token),
            None => Err(self.eof(expected, context)),
        }
    }

    fn bump_if_eq(&mut self, text: &str) -> bool {
        self.next_if(|t| t == text).is_some()
    }

    fn next_if(&mut self, f: impl FnOnce(&str) -> bool) -> Option<Token<'a>> {
        match self.tokenizer.peek() {
            Some(token) if f(token.text) => self.tokenizer.next(),
            _ => None,
        }
    }

    fn unexpected_token(
        &self,
        token: &Token,
        expected: impl ToString,
        context: &str,
    ) -> ParseErrorKind {
        ParseErrorKind::UnexpectedToken {
            found: token.text.to_owned(),
            context: context.to_owned(),
            expected: expected.to_string(),
            span: token.span.clone(),
        }
    }

    fn eof(&self, expected: impl ToString, context: &str) -> ParseErrorKind {
        match self.tokenizer.unterminated() {
            Some(Unterminated::String { span }) => {
                ParseErrorKind::UnterminatedString { span: span.clone() }
            }
            Some(Unterminated::Comment { span }) => {
                ParseErrorKind::UnterminatedComment { span: span.clone() }
            }
            None => ParseErrorKind::UnexpectedEof {
                expected: expected.to_string(),
                context: context.to_owned(),
            },
        }
    }
}

/// Names a message for use in error messages, e.g. `message Foo` or `extend foo.Bar`.
fn describe(message: &ast::Message) -> String {
    let keyword = match message.kind {
        MessageKind::Message => "message",
        MessageKind::Group => "group",
        MessageKind::Extend => "extend",
    };
    format!("{} {}", keyword, message.name)
}

fn id_error_reason(err: NumberError) -> &'static str {
    match err {
        NumberError::Malformed => "expected a decimal, hexadecimal or octal integer",
        NumberError::Negative => "negative values are not allowed here",
        NumberError::OutOfRange => "integer is too large",
    }
}

fn number_error_reason(err: NumberError) -> &'static str {
    match err {
        NumberError::Malformed => "expected an integer or floating point number",
        NumberError::Negative => "negative values are not allowed here",
        NumberError::OutOfRange => "integer is too large for a 64 bit value",
    }
}

fn fmt_expected(ts: &[&str]) -> String {
    let quoted: Vec<_> = ts.iter().map(|t| format!("'{}'", t)).collect();
    match quoted.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} or {}", rest.join(", "), last),
        Some((last, _)) => last.clone(),
        None => String::new(),
    }
}
