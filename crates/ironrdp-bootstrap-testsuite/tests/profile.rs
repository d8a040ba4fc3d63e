use expect_test::expect;
use ironrdp_bootstrap::{ConnectionProfile, ConnectionRequest, Credentials, ProfileError, ProfileErrorKind, ProfileValue};
use rstest::rstest;

const SAMPLE: &str = "full address:s:10.0.0.5:3390
server port:i:3389
username:s:Administrator
ClearTextPassword:s:hunter2
domain:s:CONTOSO

screen mode id:i:2
desktopwidth:x:1920
bogus line
audiomode:i:two
";

#[test]
fn parse_sample() {
    let (profile, errors) = ConnectionProfile::parse(SAMPLE);

    expect![[r#"
        ConnectionProfile {
            full_address: Some(
                "10.0.0.5:3390",
            ),
            server_port: Some(
                3389,
            ),
            username: Some(
                "Administrator",
            ),
            password: Some(
                "***",
            ),
            other: {
                "domain": Str(
                    "CONTOSO",
                ),
                "screen mode id": Int(
                    2,
                ),
            },
        }
    "#]]
    .assert_debug_eq(&profile);

    assert_eq!(profile.password.as_deref(), Some("hunter2"));

    assert_eq!(
        errors,
        [
            ProfileError {
                kind: ProfileErrorKind::UnknownType { ty: "x".to_owned() },
                line: 7,
            },
            ProfileError {
                kind: ProfileErrorKind::MalformedLine {
                    line: "bogus line".to_owned()
                },
                line: 8,
            },
            ProfileError {
                kind: ProfileErrorKind::InvalidValue {
                    ty: "i".to_owned(),
                    value: "two".to_owned()
                },
                line: 9,
            },
        ]
    );
}

#[test]
fn error_display() {
    let (_, errors) = ConnectionProfile::parse("desktopwidth:x:1920\nbogus line\naudiomode:i:two");
    let rendered: Vec<String> = errors.iter().map(ToString::to_string).collect();

    assert_eq!(
        rendered,
        [
            "unknown type at line 0 (x)",
            "malformed line at line 1 (bogus line)",
            "invalid value at line 2 for type i (two)",
        ]
    );
}

#[test]
fn keys_are_case_insensitive() {
    let (profile, errors) = ConnectionProfile::parse("Full Address:s:rdp.example.com\nSERVER PORT:i:3390");

    assert!(errors.is_empty());
    assert_eq!(profile.host(), Some("rdp.example.com"));
    assert_eq!(profile.port(), "3390");
}

#[test]
fn known_key_with_unexpected_type_is_kept_aside() {
    let (profile, errors) = ConnectionProfile::parse("server port:s:3390");

    assert!(errors.is_empty());
    assert_eq!(profile.server_port, None);
    assert_eq!(profile.other.get("server port"), Some(&ProfileValue::Str("3390".to_owned())));
}

#[rstest]
#[case::server_port("full address:s:rdp.example.com\nserver port:i:3390", Some("rdp.example.com"), "3390")]
#[case::embedded_port("full address:s:rdp.example.com:3391", Some("rdp.example.com"), "3391")]
#[case::server_port_wins("full address:s:rdp.example.com:3391\nserver port:i:3390", Some("rdp.example.com"), "3390")]
#[case::default_port("full address:s:rdp.example.com", Some("rdp.example.com"), "3389")]
#[case::bracketed_ipv6("full address:s:[fe80::1]:3392", Some("[fe80::1]"), "3392")]
#[case::bare_ipv6("full address:s:fe80::1", Some("fe80::1"), "3389")]
#[case::no_address("", None, "3389")]
fn host_and_port(#[case] input: &str, #[case] host: Option<&str>, #[case] port: &str) {
    let (profile, errors) = ConnectionProfile::parse(input);

    assert!(errors.is_empty());
    assert_eq!(profile.host(), host);
    assert_eq!(profile.port(), port);
}

#[test]
fn to_request_carries_credentials() {
    let (profile, _) = ConnectionProfile::parse(SAMPLE);

    assert_eq!(
        profile.to_request(),
        ConnectionRequest::new("10.0.0.5", "3389").with_credentials(Credentials::new("Administrator", "hunter2"))
    );
}

#[test]
fn to_request_without_username_has_no_credentials() {
    let (profile, _) = ConnectionProfile::parse("full address:s:10.0.0.5\nClearTextPassword:s:hunter2");

    assert_eq!(profile.to_request(), ConnectionRequest::new("10.0.0.5", "3389"));
}
