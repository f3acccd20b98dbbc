use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_are_applied() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.blog.posts_per_page.get(), 3);
    assert_eq!(settings.blog.title, "Blog");
    assert!(settings.database.url.is_none());
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert!(!settings.server.secure_cookies);
}

#[test]
fn posts_per_page_can_be_overridden_via_cli() {
    let mut raw = RawSettings::default();
    raw.blog.posts_per_page = Some(5);
    let overrides = ServeOverrides {
        posts_per_page: Some(10),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.blog.posts_per_page.get(), 10);
}

#[test]
fn zero_posts_per_page_is_rejected() {
    let mut raw = RawSettings::default();
    raw.blog.posts_per_page = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero page size must fail");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "blog.posts_per_page",
            ..
        }
    ));
}

#[test]
fn blank_database_url_is_treated_as_missing() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());

    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "logging.level",
            ..
        })
    ));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn bare_log_json_flag_means_true() {
    let args = CliArgs::parse_from(["blogengine", "serve", "--log-json"]);
    let Some(Command::Serve(serve)) = args.command else {
        panic!("expected serve command");
    };
    assert_eq!(serve.overrides.log_json, Some(true));
}

#[test]
fn secure_cookies_flag_reaches_server_settings() {
    let args = CliArgs::parse_from(["blogengine", "serve", "--secure-cookies"]);
    let Some(Command::Serve(serve)) = args.command else {
        panic!("expected serve command");
    };
    assert_eq!(serve.overrides.secure_cookies, Some(true));

    let mut raw = RawSettings::default();
    raw.apply_serve_overrides(&serve.overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.server.secure_cookies);
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["blogengine"]);
    assert!(args.command.is_none());
}

#[test]
fn keys_issue_parses_name_and_database() {
    let args = CliArgs::parse_from([
        "blogengine",
        "keys",
        "issue",
        "--name",
        "Ada",
        "--database-url",
        "postgres://localhost/blog",
    ]);
    let Some(Command::Keys(keys)) = args.command else {
        panic!("expected keys command");
    };
    let KeysCommand::Issue(issue) = &keys.command else {
        panic!("expected issue subcommand");
    };
    assert_eq!(issue.name, "Ada");
    assert_eq!(
        keys.command.database().database_url.as_deref(),
        Some("postgres://localhost/blog")
    );
}

#[test]
fn keys_database_override_reaches_settings() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("postgres://file/blog".to_string());
    raw.apply_database_override(&DatabaseOverride {
        database_url: Some("postgres://cli/blog".to_string()),
    });

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.database.url.as_deref(), Some("postgres://cli/blog"));
}
