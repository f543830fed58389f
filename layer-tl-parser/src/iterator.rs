//! Declaration reader that drives [`crate::parse_tl_file`].

use std::io::Read;

use crate::errors::{LexError, LexErrorKind, ParseError};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::tl::{Category, Declaration, Parameter, QualifiedName, TypeExpr, parse_type_with};

/// Assembles [`Declaration`]s from the token stream of a [`Lexer`].
///
/// Stops after the first error.
pub struct DeclarationReader<R> {
    lexer: Lexer<R>,
    done: bool,
}

impl<R: Read> DeclarationReader<R> {
    pub(crate) fn new(lexer: Lexer<R>) -> Self {
        Self { lexer, done: false }
    }

    /// The layer announced by a `// LAYER N` comment read so far.
    pub fn layer(&self) -> Option<u32> {
        self.lexer.layer()
    }

    fn read_declaration(&mut self) -> Result<Option<Declaration>, ParseError> {
        let (name_raw, position) = loop {
            match self.lexer.next_token()? {
                None => return Ok(None),
                Some(Token { kind: TokenKind::Section(_), .. }) => continue,
                Some(Token { kind: TokenKind::Name(name), position }) => break (name, position),
                Some(other) => return Err(out_of_place("declaration name", other).into()),
            }
        };
        let category = self.lexer.category();

        let id = match self.expect_token()? {
            Token { kind: TokenKind::Id(id), .. } => id,
            other => return Err(out_of_place("identifier", other).into()),
        };

        let name = QualifiedName::parse(&name_raw).map_err(|source| ParseError::Type {
            declaration: name_raw.clone(),
            parameter: None,
            source,
        })?;

        let mut type_params = Vec::new();
        let mut params = Vec::new();
        let result_raw = loop {
            match self.expect_token()? {
                Token { kind: TokenKind::TypeParam(var), .. } => type_params.push(var),
                Token { kind: TokenKind::ParamsBegin | TokenKind::ParamsEnd, .. } => {}
                Token { kind: TokenKind::ParamName(pname), .. } => {
                    let ty_raw = match self.expect_token()? {
                        Token { kind: TokenKind::ParamType(ty), .. } => ty,
                        other => return Err(out_of_place("parameter type", other).into()),
                    };
                    let ty = parse_type_with(&ty_raw, category, &type_params).map_err(|source| ParseError::Type {
                        declaration: name_raw.clone(),
                        parameter: Some(pname.clone()),
                        source,
                    })?;
                    params.push(Parameter { name: pname, ty });
                }
                Token { kind: TokenKind::ResultType(ty), .. } => break ty,
                other => return Err(out_of_place("parameter or result type", other).into()),
            }
        };

        let result = parse_result_type(&result_raw, category, &type_params).map_err(|source| ParseError::Type {
            declaration: name_raw.clone(),
            parameter: None,
            source,
        })?;

        log::trace!("[tl-parse] {name_raw} at {position}");
        Ok(Some(Declaration { category, id, name, params, result }))
    }

    fn expect_token(&mut self) -> Result<Token, LexError> {
        self.lexer
            .next_token()?
            .ok_or_else(|| LexError::new(LexErrorKind::UnexpectedEof, self.lexer.position()))
    }
}

impl<R: Read> Iterator for DeclarationReader<R> {
    type Item = Result<Declaration, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.read_declaration().transpose();
        if !matches!(item, Some(Ok(_))) {
            self.done = true;
        }
        item
    }
}

impl<R: Read> std::iter::FusedIterator for DeclarationReader<R> {}

/// Result types are ordinary type expressions, except for the built-in
/// `Vector t` of the degenerate vector declaration.
pub(crate) fn parse_result_type(
    raw: &str,
    category: Category,
    type_params: &[String],
) -> Result<TypeExpr, crate::errors::TypeGrammarError> {
    match raw.split_once(' ') {
        Some(("Vector", var)) => Ok(TypeExpr::Vector {
            inner: Box::new(TypeExpr::Var(var.to_owned())),
            boxed: true,
        }),
        _ => parse_type_with(raw, category, type_params),
    }
}

fn out_of_place(expected: &'static str, token: Token) -> LexError {
    LexError::new(
        LexErrorKind::UnexpectedToken { expected, found: format!("{:?}", token.kind) },
        token.position,
    )
}
