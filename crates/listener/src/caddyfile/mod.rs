//! Block-structured configuration syntax
//!
//! Input is a sequence of directive lines. A directive is a name followed by
//! arguments; a trailing `{` opens a nested block of directives that is
//! closed by a `}` on its own line. `{}` stands for an empty block.
//!
//! ```text
//! ngrok {
//!     authtoken {env.NGROK_AUTHTOKEN}
//!     tunnel http {
//!         domain example.ngrok.app
//!         header {
//!             -server
//!         }
//!     }
//! }
//! ```

mod directive;
mod lexer;

pub use directive::{Directive, Entry};
pub use lexer::{Line, Token, tokenize};

use crate::error::{SyntaxError, SyntaxErrorKind};

/// Parse configuration text into its top-level directives
pub fn parse(input: &str) -> Result<Vec<Directive>, SyntaxError> {
    let mut lines = tokenize(input)?.into_iter();
    parse_block(&mut lines, None)
}

fn parse_block(
    lines: &mut impl Iterator<Item = Line>,
    opened_at: Option<usize>,
) -> Result<Vec<Directive>, SyntaxError> {
    let mut directives = Vec::new();

    while let Some(Line { number, mut tokens }) = lines.next() {
        if tokens[0].closes_block() {
            if opened_at.is_none() {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::UnbalancedBrace("`}` without an open block".to_string()),
                    number,
                ));
            }
            if let Some(extra) = tokens.get(1) {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::UnexpectedToken(extra.text.clone()),
                    number,
                ));
            }
            return Ok(directives);
        }

        let opens = tokens.last().is_some_and(lexer::Token::opens_block);
        let empty = tokens.last().is_some_and(lexer::Token::is_empty_block);
        if opens || empty {
            tokens.pop();
        }

        if let Some(stray) = tokens.iter().find(|t| t.is_brace()) {
            return Err(SyntaxError::new(
                SyntaxErrorKind::UnexpectedToken(stray.text.clone()),
                number,
            ));
        }

        let mut words = tokens.into_iter().map(|t| t.text);
        let Some(name) = words.next() else {
            return Err(SyntaxError::new(
                SyntaxErrorKind::UnexpectedToken("{".to_string()),
                number,
            ));
        };
        let args = words.collect();

        let block = if opens {
            Some(parse_block(lines, Some(number))?)
        } else if empty {
            Some(Vec::new())
        } else {
            None
        };

        directives.push(Directive {
            name,
            args,
            block,
            line: number,
        });
    }

    match opened_at {
        Some(line) => Err(SyntaxError::new(
            SyntaxErrorKind::UnbalancedBrace("block is never closed".to_string()),
            line,
        )),
        None => Ok(directives),
    }
}
