use crate::error::{Arity, SyntaxError, SyntaxErrorKind};

/// One parsed directive line, with its nested block if it opened one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub args: Vec<String>,
    pub block: Option<Vec<Directive>>,
    pub line: usize,
}

/// One entry of a directive that accepts either inline arguments or a block
/// of one entry per line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<'a> {
    pub tokens: Vec<&'a str>,
    pub line: usize,
    directive: &'a str,
}

impl Entry<'_> {
    /// Wrong number of tokens for this entry
    pub fn arg_count(&self, expected: Arity) -> SyntaxError {
        SyntaxError::new(
            SyntaxErrorKind::ArgCount {
                directive: self.directive.to_string(),
                expected,
                got: self.tokens.len(),
            },
            self.line,
        )
    }

    pub fn error(&self, kind: SyntaxErrorKind) -> SyntaxError {
        SyntaxError::new(kind, self.line)
    }
}

impl Directive {
    pub const fn error(&self, kind: SyntaxErrorKind) -> SyntaxError {
        SyntaxError::new(kind, self.line)
    }

    pub fn unrecognized(&self) -> SyntaxError {
        self.error(SyntaxErrorKind::UnrecognizedDirective(self.name.clone()))
    }

    pub fn arg_count(&self, expected: Arity) -> SyntaxError {
        self.error(SyntaxErrorKind::ArgCount {
            directive: self.name.clone(),
            expected,
            got: self.args.len(),
        })
    }

    pub fn invalid_value(&self, value: &str, reason: impl Into<String>) -> SyntaxError {
        self.error(SyntaxErrorKind::InvalidValue {
            directive: self.name.clone(),
            value: value.to_string(),
            reason: reason.into(),
        })
    }

    /// Directives of the nested block, empty when there is none
    pub fn block_entries(&self) -> &[Directive] {
        self.block.as_deref().unwrap_or_default()
    }

    fn deny_block(&self) -> Result<(), SyntaxError> {
        match self.block {
            Some(_) => Err(self.error(SyntaxErrorKind::UnexpectedBlock(self.name.clone()))),
            None => Ok(()),
        }
    }

    /// A block-opening directive with no arguments
    pub fn no_args(&self) -> Result<(), SyntaxError> {
        if self.args.is_empty() {
            Ok(())
        } else {
            Err(self.arg_count(Arity::None))
        }
    }

    /// Exactly one argument and no block
    pub fn one_arg(&self) -> Result<&str, SyntaxError> {
        self.deny_block()?;
        match self.args.as_slice() {
            [value] => Ok(value.as_str()),
            _ => Err(self.arg_count(Arity::One)),
        }
    }

    /// Zero or one argument and no block
    pub fn optional_arg(&self) -> Result<Option<&str>, SyntaxError> {
        self.deny_block()?;
        match self.args.as_slice() {
            [] => Ok(None),
            [value] => Ok(Some(value.as_str())),
            _ => Err(self.arg_count(Arity::AtMostOne)),
        }
    }

    /// One or more arguments and no block
    pub fn variadic(&self) -> Result<&[String], SyntaxError> {
        self.deny_block()?;
        if self.args.is_empty() {
            return Err(self.arg_count(Arity::AtLeastOne));
        }
        Ok(&self.args)
    }

    /// A switch: no argument means on, otherwise a single boolean literal
    pub fn flag(&self) -> Result<bool, SyntaxError> {
        self.deny_block()?;
        match self.args.as_slice() {
            [] => Ok(true),
            [value] => match value.to_ascii_lowercase().as_str() {
                "true" | "on" => Ok(true),
                "false" | "off" => Ok(false),
                _ => Err(self.invalid_value(value, "expected on, off, true or false")),
            },
            _ => Err(self.arg_count(Arity::Flag)),
        }
    }

    /// Entries given inline (`name a b`) or as a block with one entry per
    /// line, but never both in the same occurrence
    pub fn entries(&self) -> Result<Vec<Entry<'_>>, SyntaxError> {
        let inline = !self.args.is_empty();
        let block = self.block_entries();

        if inline && !block.is_empty() {
            return Err(self.error(SyntaxErrorKind::CombinedForm(self.name.clone())));
        }

        if inline {
            return Ok(vec![Entry {
                tokens: self.args.iter().map(String::as_str).collect(),
                line: self.line,
                directive: &self.name,
            }]);
        }

        block
            .iter()
            .map(|child| {
                if child.block.is_some() {
                    return Err(child.error(SyntaxErrorKind::UnexpectedBlock(child.name.clone())));
                }
                let tokens = std::iter::once(child.name.as_str())
                    .chain(child.args.iter().map(String::as_str))
                    .collect();
                Ok(Entry {
                    tokens,
                    line: child.line,
                    directive: &self.name,
                })
            })
            .collect()
    }
}
