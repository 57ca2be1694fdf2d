use ledger_bot::AppError;

#[test]
fn display_prefixes_each_variant() {
    let cases = [
        (AppError::Config("bad".into()), "config: bad"),
        (AppError::Db("down".into()), "db: down"),
        (AppError::Telegram("403".into()), "telegram: 403"),
        (AppError::NotFound("r1".into()), "not found: r1"),
        (AppError::Unauthorized("chat 9".into()), "unauthorized: chat 9"),
        (AppError::NotActionable("r1".into()), "not actionable: r1"),
        (AppError::InvalidPayload("x".into()), "invalid payload: x"),
        (AppError::Io("disk".into()), "io: disk"),
    ];

    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn toml_error_becomes_config() {
    let toml_err = toml::from_str::<toml::Value>("= nope").unwrap_err();
    let err: AppError = toml_err.into();
    assert!(matches!(err, AppError::Config(msg) if msg.starts_with("invalid config")));
}

#[test]
fn json_error_becomes_invalid_payload() {
    let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let err: AppError = json_err.into();
    assert!(matches!(err, AppError::InvalidPayload(_)));
}

#[test]
fn io_error_becomes_io() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: AppError = io_err.into();
    assert!(matches!(err, AppError::Io(msg) if msg.contains("gone")));
}

#[test]
fn sqlx_error_becomes_db() {
    let err: AppError = sqlx::Error::RowNotFound.into();
    assert!(matches!(err, AppError::Db(_)));
}
