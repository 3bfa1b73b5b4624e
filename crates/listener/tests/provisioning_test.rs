//! End-to-end provisioning of listener configurations

use ngrok_listener::{
    EndpointOption, EnvReplacer, HeaderOption, IdentityReplacer, ListenPlan, ListenerError,
    SessionConfig, SessionOption, SyntaxErrorKind, TunnelKind, TunnelRegistry, provision,
};
use ngrok_listener_core::ValidationError;
use rcgen::{CertifiedKey, generate_simple_self_signed};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Wrap a tunnel block in a session block and provision it
fn provision_tunnel(tunnel: &str) -> ngrok_listener::Result<ListenPlan> {
    let input = format!("ngrok {{\n    authtoken tok\n    tunnel {tunnel}\n}}\n");
    let config = SessionConfig::from_caddyfile(&input, &TunnelRegistry::new())?;
    provision(config, &IdentityReplacer)
}

/// The validation constraint behind a failed provisioning call
fn validation_root(result: ngrok_listener::Result<ListenPlan>) -> ValidationError {
    match result {
        Err(ListenerError::Validation(err)) => err.root().clone(),
        other => panic!("expected a validation failure, got {other:?}"),
    }
}

/// Self-signed certificate and key written to a temp dir
struct CertFixture {
    _dir: TempDir,
    cert: PathBuf,
    key: PathBuf,
}

impl CertFixture {
    fn new() -> Self {
        let CertifiedKey { cert, signing_key } =
            generate_simple_self_signed(vec!["foo.ngrok.app".to_string()]).unwrap();
        let dir = TempDir::new().unwrap();
        let cert_path = dir.path().join("cert.pem");
        let key_path = dir.path().join("key.pem");
        std::fs::write(&cert_path, cert.pem()).unwrap();
        std::fs::write(&key_path, signing_key.serialize_pem()).unwrap();
        Self {
            _dir: dir,
            cert: cert_path,
            key: key_path,
        }
    }
}

fn quoted(path: &Path) -> String {
    format!("\"{}\"", path.display())
}

#[test]
fn test_basic_auth_single_credential() {
    let plan = provision_tunnel("http {\n        basic_auth foo barbarbar\n    }").unwrap();

    assert_eq!(plan.tunnel.kind, TunnelKind::Http);
    assert_eq!(
        plan.tunnel.options,
        vec![EndpointOption::BasicAuth {
            username: "foo".to_string(),
            password: "barbarbar".to_string(),
        }]
    );
}

#[test]
fn test_basic_auth_short_password_fails() {
    let root = validation_root(provision_tunnel(
        "http {\n        basic_auth foo bar\n    }",
    ));
    assert!(matches!(root, ValidationError::TooShort { min: 8, .. }));
}

#[test]
fn test_tcp_allow_accumulates() {
    let plan = provision_tunnel(
        "tcp {\n        allow 127.0.0.0/8\n        allow 10.0.0.0/8\n    }",
    )
    .unwrap();

    assert_eq!(
        plan.tunnel.options,
        vec![EndpointOption::AllowCidr(vec![
            "127.0.0.0/8".to_string(),
            "10.0.0.0/8".to_string(),
        ])]
    );
}

#[test]
fn test_labeled_without_labels_fails() {
    let err = provision_tunnel("labeled {\n    }").unwrap_err();
    assert!(err.to_string().contains("a label is required"));
    assert_eq!(validation_root(Err(err)), ValidationError::required("a label"));
}

#[test]
fn test_oidc_without_restrictions() {
    let plan = provision_tunnel(
        "http {\n        oidc {\n            issuer_url https://x\n            client_id a\n            client_secret b\n        }\n    }",
    )
    .unwrap();

    assert_eq!(
        plan.tunnel.options,
        vec![EndpointOption::Oidc {
            issuer_url: "https://x".to_string(),
            client_id: "a".to_string(),
            client_secret: "b".to_string(),
            options: Vec::new(),
        }]
    );
}

#[test]
fn test_tls_cert_without_key_fails_before_reading_files() {
    let root = validation_root(provision_tunnel(
        "tls {\n        cert does-not-exist.pem\n    }",
    ));
    assert_eq!(
        root,
        ValidationError::Unpaired {
            present: "cert".to_string(),
            missing: "key".to_string(),
        }
    );
}

#[test]
fn test_tls_without_cert_or_key_is_passthrough() {
    let plan = provision_tunnel("tls {\n        domain foo.ngrok.app\n    }").unwrap();
    assert_eq!(
        plan.tunnel.options,
        vec![EndpointOption::Domain("foo.ngrok.app".to_string())]
    );
}

#[test]
fn test_tls_termination_with_generated_certificate() {
    let fixture = CertFixture::new();
    let plan = provision_tunnel(&format!(
        "tls {{\n        domain foo.ngrok.app\n        cert {}\n        key {}\n        mutual_tls_cas {}\n    }}",
        quoted(&fixture.cert),
        quoted(&fixture.key),
        quoted(&fixture.cert),
    ))
    .unwrap();

    let terminations: Vec<_> = plan
        .tunnel
        .options
        .iter()
        .filter(|option| matches!(option, EndpointOption::TlsTermination { .. }))
        .collect();
    assert_eq!(terminations.len(), 1);

    let cert_pem = std::fs::read(&fixture.cert).unwrap();
    let key_pem = std::fs::read(&fixture.key).unwrap();
    assert_eq!(
        terminations[0],
        &EndpointOption::TlsTermination { cert_pem, key_pem }
    );

    let Some(EndpointOption::MutualTlsCas(cas)) = plan.tunnel.options.last() else {
        panic!("expected mutual TLS CAs last, got {:?}", plan.tunnel.options);
    };
    assert_eq!(cas.len(), 1);
}

#[test]
fn test_tls_missing_files_fail_at_assembly() {
    let err = provision_tunnel(
        "tls {\n        cert /nonexistent/cert.pem\n        key /nonexistent/key.pem\n    }",
    )
    .unwrap_err();

    match err {
        ListenerError::Resource(resource) => assert_eq!(resource.field(), "cert"),
        other => panic!("expected a resource error, got {other:?}"),
    }
}

#[test]
fn test_header_query_operation_rejected() {
    let err = provision_tunnel("http {\n        header ?X-Foo\n    }").unwrap_err();

    let ListenerError::Syntax(syntax) = err else {
        panic!("expected a syntax error, got {err:?}");
    };
    assert!(matches!(
        syntax.kind(),
        SyntaxErrorKind::UnsupportedOperation { .. }
    ));
}

#[test]
fn test_header_edits_assembled_in_order() {
    let plan = provision_tunnel(
        "http {\n        request_header {\n            +X-One 1\n            X-Two 2\n            -X-Three\n        }\n    }",
    )
    .unwrap();

    assert_eq!(
        plan.tunnel.options,
        vec![EndpointOption::RequestHeaders(vec![
            HeaderOption::Add {
                name: "X-One".to_string(),
                value: "1".to_string(),
            },
            HeaderOption::Add {
                name: "X-Two".to_string(),
                value: "2".to_string(),
            },
            HeaderOption::Remove("X-Three".to_string()),
        ])]
    );
}

#[test]
fn test_env_placeholders_substituted_before_validation() {
    let input = "ngrok {\n    authtoken {env.NGROK_TOKEN}\n    tunnel http {\n        domain {$DOMAIN}\n        basic_auth user {env.PASSWORD}\n    }\n}";
    let config = SessionConfig::from_caddyfile(input, &TunnelRegistry::new()).unwrap();

    let replacer = EnvReplacer::from_map([
        ("NGROK_TOKEN", "tok_secret"),
        ("DOMAIN", "foo.ngrok.app"),
        ("PASSWORD", "longenough"),
    ]);
    let plan = config.clone().provision(&replacer).unwrap();

    assert_eq!(plan.session[0], SessionOption::Authtoken("tok_secret".to_string()));
    assert_eq!(
        plan.tunnel.options,
        vec![
            EndpointOption::Domain("foo.ngrok.app".to_string()),
            EndpointOption::BasicAuth {
                username: "user".to_string(),
                password: "longenough".to_string(),
            },
        ]
    );

    let short = EnvReplacer::from_map([("DOMAIN", "foo.ngrok.app"), ("PASSWORD", "short")]);
    assert!(matches!(
        validation_root(config.clone().provision(&short)),
        ValidationError::TooShort { min: 8, .. }
    ));

    let unresolved = config
        .provision(&EnvReplacer::from_map(Vec::<(String, String)>::new()))
        .unwrap();
    assert_eq!(
        unresolved.session[0],
        SessionOption::Authtoken("{env.NGROK_TOKEN}".to_string())
    );
    assert_eq!(
        unresolved.tunnel.options,
        vec![
            EndpointOption::Domain("{$DOMAIN}".to_string()),
            EndpointOption::BasicAuth {
                username: "user".to_string(),
                password: "{env.PASSWORD}".to_string(),
            },
        ]
    );
}

#[test]
fn test_missing_tunnel_defaults_to_tcp() {
    let config = SessionConfig::from_caddyfile("ngrok {\n    region eu\n}", &TunnelRegistry::new())
        .unwrap();
    let plan = config.provision(&IdentityReplacer).unwrap();

    assert_eq!(plan.tunnel.kind, TunnelKind::Tcp);
    assert!(plan.tunnel.options.is_empty());
    assert_eq!(
        plan.session,
        vec![
            SessionOption::AuthtokenFromEnv,
            SessionOption::Region("eu".to_string()),
        ]
    );
}

#[test]
fn test_unknown_tunnel_type_lists_known_types() {
    let err = SessionConfig::from_caddyfile(
        "ngrok {\n    tunnel quic {\n    }\n}",
        &TunnelRegistry::new(),
    )
    .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("quic"));
    for known in ["http", "labeled", "tcp", "tls"] {
        assert!(message.contains(known), "{message}");
    }
}

#[test]
fn test_load_detects_json_by_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("listener.json");
    std::fs::write(
        &path,
        r#"{"tunnel": {"type": "labeled", "labels": {"edge": "edghts_1"}}}"#,
    )
    .unwrap();

    let config = SessionConfig::load(
        &path,
        ngrok_listener::InputFormat::Auto,
        &TunnelRegistry::new(),
    )
    .unwrap();
    let plan = config.provision(&IdentityReplacer).unwrap();

    assert_eq!(
        plan.tunnel.options,
        vec![EndpointOption::Label {
            name: "edge".to_string(),
            value: "edghts_1".to_string(),
        }]
    );
}
