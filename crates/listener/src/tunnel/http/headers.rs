use crate::caddyfile::{Directive, Entry};
use crate::error::{Arity, SyntaxError, SyntaxErrorKind};
use crate::options::HeaderOption;
use crate::replace::{Replace, Replacer};
use crate::tunnel::ordered_map;
use serde::{Deserialize, Serialize};

/// Header edits applied to requests or responses
///
/// `added` holds one value per header name; setting a name again replaces
/// the value but keeps the original position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeaderEdit {
    #[serde(
        with = "crate::tunnel::ordered_map",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub added: Vec<(String, String)>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<String>,
}

impl HeaderEdit {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Set a header, replacing any value set earlier under the same name
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        ordered_map::insert(&mut self.added, name.into(), value.into());
    }

    pub fn remove(&mut self, name: impl Into<String>) {
        self.removed.push(name.into());
    }

    /// Apply a `header` style directive, inline or as a block
    pub(crate) fn parse(&mut self, directive: &Directive) -> Result<(), SyntaxError> {
        let entries = directive.entries()?;
        if entries.is_empty() {
            return Err(directive.arg_count(Arity::NameAndValue));
        }
        for entry in &entries {
            self.apply(entry)?;
        }
        Ok(())
    }

    fn apply(&mut self, entry: &Entry<'_>) -> Result<(), SyntaxError> {
        let (field, value) = match entry.tokens.as_slice() {
            [field] => (*field, None),
            [field, value] => (*field, Some(*value)),
            _ => return Err(entry.arg_count(Arity::NameAndValue)),
        };
        let field = field.strip_suffix(':').unwrap_or(field);

        if let Some(name) = field.strip_prefix('-') {
            if value.is_some() {
                return Err(entry.arg_count(Arity::One));
            }
            self.remove(name);
        } else if field.starts_with('?') {
            return Err(entry.error(SyntaxErrorKind::UnsupportedOperation {
                directive: field.to_string(),
                operation: "default header values (`?`)".to_string(),
            }));
        } else {
            let name = field.strip_prefix('+').unwrap_or(field);
            self.set(name, value.unwrap_or_default());
        }
        Ok(())
    }

    pub(crate) fn assemble(&self) -> Vec<HeaderOption> {
        self.added
            .iter()
            .map(|(name, value)| HeaderOption::Add {
                name: name.clone(),
                value: value.clone(),
            })
            .chain(self.removed.iter().cloned().map(HeaderOption::Remove))
            .collect()
    }
}

impl Replace for HeaderEdit {
    fn replace_with(&mut self, replacer: &dyn Replacer) {
        ordered_map::replace_with(&mut self.added, replacer);
        self.removed.replace_with(replacer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caddyfile::parse;
    use crate::replace::EnvReplacer;

    fn edit(input: &str) -> Result<HeaderEdit, SyntaxError> {
        let mut edit = HeaderEdit::default();
        for directive in parse(input).unwrap() {
            edit.parse(&directive)?;
        }
        Ok(edit)
    }

    #[test]
    fn test_block_operations() {
        let edit = edit(
            "header {\n  +X-Added yes\n  -Server\n  X-Plain: value\n  Content-Type: text/plain\n}",
        )
        .unwrap();

        assert_eq!(
            edit.added,
            vec![
                ("X-Added".to_string(), "yes".to_string()),
                ("X-Plain".to_string(), "value".to_string()),
                ("Content-Type".to_string(), "text/plain".to_string()),
            ]
        );
        assert_eq!(edit.removed, vec!["Server"]);
    }

    #[test]
    fn test_inline_forms() {
        let edit = edit("header -Server\nheader +Foo: bar\nheader Baz").unwrap();
        assert_eq!(edit.removed, vec!["Server"]);
        assert_eq!(
            edit.added,
            vec![
                ("Foo".to_string(), "bar".to_string()),
                ("Baz".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_last_write_wins_keeps_position() {
        let edit = edit("header {\n  A 1\n  B 2\n  +A 3\n}").unwrap();
        assert_eq!(
            edit.added,
            vec![
                ("A".to_string(), "3".to_string()),
                ("B".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_default_operator_is_unsupported() {
        for input in ["header ?X-Foo bar", "header {\n  ?X-Foo bar\n}"] {
            let err = edit(input).unwrap_err();
            assert!(
                matches!(err.kind, SyntaxErrorKind::UnsupportedOperation { .. }),
                "{input}"
            );
        }
    }

    #[test]
    fn test_shape_errors() {
        assert!(matches!(
            edit("header").unwrap_err().kind,
            SyntaxErrorKind::ArgCount { .. }
        ));
        assert!(matches!(
            edit("header Foo bar baz").unwrap_err().kind,
            SyntaxErrorKind::ArgCount { .. }
        ));
        assert!(matches!(
            edit("header -Server value").unwrap_err().kind,
            SyntaxErrorKind::ArgCount { .. }
        ));
        assert!(matches!(
            edit("header Foo bar {\n  Baz qux\n}").unwrap_err().kind,
            SyntaxErrorKind::CombinedForm(_)
        ));
    }

    #[test]
    fn test_assemble_adds_before_removes() {
        let mut edit = HeaderEdit::default();
        edit.remove("Server");
        edit.set("X-Foo", "bar");
        assert_eq!(
            edit.assemble(),
            vec![
                HeaderOption::Add {
                    name: "X-Foo".to_string(),
                    value: "bar".to_string(),
                },
                HeaderOption::Remove("Server".to_string()),
            ]
        );
    }

    #[test]
    fn test_substitution_merges_equal_names() {
        let mut edit =
            edit("header {\n  {env.A} one\n  {env.B} two\n  X-Other three\n}").unwrap();
        edit.replace_with(&EnvReplacer::from_map([("A", "X-Foo"), ("B", "X-Foo")]));

        assert_eq!(
            edit.assemble(),
            vec![
                HeaderOption::Add {
                    name: "X-Foo".to_string(),
                    value: "two".to_string(),
                },
                HeaderOption::Add {
                    name: "X-Other".to_string(),
                    value: "three".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_json_added_keeps_document_order() {
        let edit: HeaderEdit =
            serde_json::from_str(r#"{"added": {"b": "2", "a": "1"}, "removed": ["c"]}"#).unwrap();
        assert_eq!(
            edit.added,
            vec![
                ("b".to_string(), "2".to_string()),
                ("a".to_string(), "1".to_string()),
            ]
        );
        assert_eq!(
            serde_json::to_string(&edit).unwrap(),
            r#"{"added":{"b":"2","a":"1"},"removed":["c"]}"#
        );
    }
}
