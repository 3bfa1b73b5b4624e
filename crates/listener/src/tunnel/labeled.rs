//! Labeled tunnel, routed to by edges configured on the ngrok side

use super::{TunnelKind, TunnelOptions, ordered_map, push_text};
use crate::caddyfile::Directive;
use crate::error::{Arity, ResourceError, SyntaxError};
use crate::options::EndpointOption;
use crate::replace::{Replace, Replacer};
use ngrok_listener_core::{ValidateConfig, ValidationError, validators};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LabeledTunnel {
    /// Label name/value pairs in configuration order; a repeated name
    /// replaces the earlier value in place
    #[serde(with = "super::ordered_map", skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<(String, String)>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub metadata: String,
}

impl LabeledTunnel {
    fn parse_labels(&mut self, directive: &Directive) -> Result<(), SyntaxError> {
        let entries = directive.entries()?;
        if entries.is_empty() {
            return Err(directive.arg_count(Arity::Two));
        }
        for entry in &entries {
            match entry.tokens.as_slice() {
                [name, value] => ordered_map::insert(
                    &mut self.labels,
                    (*name).to_string(),
                    (*value).to_string(),
                ),
                _ => return Err(entry.arg_count(Arity::Two)),
            }
        }
        Ok(())
    }

    /// `labels { label <name> <value> ... }`
    fn parse_labels_block(&mut self, directive: &Directive) -> Result<(), SyntaxError> {
        directive.no_args()?;
        for child in directive.block_entries() {
            if child.name != "label" {
                return Err(child.unrecognized().within("labels"));
            }
            self.parse_labels(child).map_err(|e| e.within("labels"))?;
        }
        Ok(())
    }
}

impl TunnelOptions for LabeledTunnel {
    const KIND: TunnelKind = TunnelKind::Labeled;

    fn parse_directive(&mut self, directive: &Directive) -> Result<(), SyntaxError> {
        match directive.name.as_str() {
            "label" => self.parse_labels(directive)?,
            "labels" => self.parse_labels_block(directive)?,
            "metadata" => self.metadata = directive.one_arg()?.to_string(),
            _ => return Err(directive.unrecognized()),
        }
        Ok(())
    }

    fn assemble(&self) -> Result<Vec<EndpointOption>, ResourceError> {
        let mut options = Vec::new();
        for (name, value) in &self.labels {
            info!(label = %name, value = %value, "applying label");
            options.push(EndpointOption::Label {
                name: name.clone(),
                value: value.clone(),
            });
        }
        push_text(&mut options, &self.metadata, EndpointOption::Metadata);
        Ok(options)
    }
}

impl Replace for LabeledTunnel {
    fn replace_with(&mut self, replacer: &dyn Replacer) {
        ordered_map::replace_with(&mut self.labels, replacer);
        self.metadata.replace_with(replacer);
    }
}

impl ValidateConfig for LabeledTunnel {
    fn validate(&self) -> Result<(), ValidationError> {
        validators::validate_present(&self.labels, "a label")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyntaxErrorKind;
    use crate::replace::EnvReplacer;

    fn label(name: &str, value: &str) -> (String, String) {
        (name.to_string(), value.to_string())
    }

    #[test]
    fn test_empty_labeled_fails_validation() {
        let tunnel = LabeledTunnel::from_caddyfile("labeled {}").unwrap();
        assert_eq!(
            tunnel.validate().unwrap_err().to_string(),
            "a label is required"
        );
    }

    #[test]
    fn test_inline_and_block_labels() {
        let tunnel = LabeledTunnel::from_caddyfile(
            "labeled {\n  label edge edghts_123\n  label {\n    team infra\n    edge edghts_456\n  }\n  metadata hi\n}",
        )
        .unwrap();

        assert_eq!(
            tunnel.labels,
            vec![label("edge", "edghts_456"), label("team", "infra")]
        );
        assert!(tunnel.validate().is_ok());

        let options = tunnel.assemble().unwrap();
        assert_eq!(options.len(), 3);
        assert_eq!(
            options[0],
            EndpointOption::Label {
                name: "edge".to_string(),
                value: "edghts_456".to_string(),
            }
        );
        assert_eq!(options[2], EndpointOption::Metadata("hi".to_string()));
    }

    #[test]
    fn test_substituted_label_names_merge() {
        let mut tunnel = LabeledTunnel::from_caddyfile(
            "labeled {\n  label {$FIRST} a\n  label {$SECOND} b\n}",
        )
        .unwrap();
        assert_eq!(tunnel.labels.len(), 2);

        let replacer = EnvReplacer::from_map([("FIRST", "edge"), ("SECOND", "edge")]);
        tunnel.replace_with(&replacer);
        assert_eq!(tunnel.labels, vec![label("edge", "b")]);
    }

    #[test]
    fn test_labels_block() {
        let tunnel = LabeledTunnel::from_caddyfile(
            "labeled {\n  labels {\n    label edge edghts_123\n  }\n}",
        )
        .unwrap();
        assert_eq!(tunnel.labels, vec![label("edge", "edghts_123")]);

        let err = LabeledTunnel::from_caddyfile("labeled {\n  labels {\n    tag a b\n  }\n}")
            .unwrap_err();
        assert_eq!(
            err.kind,
            SyntaxErrorKind::UnrecognizedDirective("tag".to_string())
        );
        assert_eq!(err.scope, vec!["labeled", "labels"]);
    }

    #[test]
    fn test_label_shape_errors() {
        for input in [
            "labeled {\n  label edge\n}",
            "labeled {\n  label a b c\n}",
            "labeled {\n  label\n}",
        ] {
            assert!(matches!(
                LabeledTunnel::from_caddyfile(input).unwrap_err().kind,
                SyntaxErrorKind::ArgCount { .. }
            ));
        }
        assert!(matches!(
            LabeledTunnel::from_caddyfile("labeled {\n  label a b {\n    c d\n  }\n}")
                .unwrap_err()
                .kind,
            SyntaxErrorKind::CombinedForm(_)
        ));
    }

    #[test]
    fn test_json_labels_keep_document_order() {
        let tunnel: LabeledTunnel =
            serde_json::from_str(r#"{"labels": {"zeta": "1", "alpha": "2"}}"#).unwrap();
        assert_eq!(tunnel.labels, vec![label("zeta", "1"), label("alpha", "2")]);
    }
}
