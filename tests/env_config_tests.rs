use figment::Jail;
use solar_tracker::SolarError;
use solar_tracker::config::{EntrypointConfig, LauncherConfig, split_command};
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn entrypoint_defaults_without_environment() {
    Jail::expect_with(|_jail| {
        let cfg: EntrypointConfig = EntrypointConfig::figment().extract()?;
        assert_eq!(cfg, EntrypointConfig::default());
        assert!(!cfg.should_wait());
        assert_eq!(cfg.wait_timeout(), Some(Duration::from_secs(60)));
        Ok(())
    });
}

#[test]
fn entrypoint_reads_shared_and_prefixed_variables() {
    Jail::expect_with(|jail| {
        jail.set_env("DATABASE", "mysql");
        jail.set_env("SQL_HOST", "db");
        jail.set_env("SQL_PORT", "3307");
        jail.set_env("ENTRYPOINT_WAIT_TIMEOUT_SECS", "0");
        jail.set_env("ENTRYPOINT_MANAGE_COMMAND", "python3 backend/manage.py");
        jail.set_env("ENTRYPOINT_STRICT_MIGRATIONS", "true");

        let cfg: EntrypointConfig = EntrypointConfig::figment().extract()?;
        assert_eq!(cfg.database.as_deref(), Some("mysql"));
        assert_eq!(cfg.sql_host, "db");
        assert_eq!(cfg.sql_port, 3307);
        assert!(cfg.should_wait());
        assert_eq!(cfg.wait_timeout(), None);
        assert_eq!(cfg.manage_command, "python3 backend/manage.py");
        assert!(cfg.strict_migrations);
        Ok(())
    });
}

#[test]
fn only_the_exact_sentinel_triggers_the_wait() {
    Jail::expect_with(|jail| {
        for kind in ["postgres", "MYSQL", "sqlite", "mysql8"] {
            jail.set_env("DATABASE", kind);
            let cfg: EntrypointConfig = EntrypointConfig::figment().extract()?;
            assert!(!cfg.should_wait(), "{kind:?} must not wait");
        }

        jail.set_env("DATABASE", "postgres");
        jail.set_env("ENTRYPOINT_WAIT_FOR", "postgres");
        let cfg: EntrypointConfig = EntrypointConfig::figment().extract()?;
        assert!(cfg.should_wait());
        Ok(())
    });
}

#[test]
fn non_numeric_port_is_a_configuration_error() {
    Jail::expect_with(|jail| {
        jail.set_env("SQL_PORT", "three-three-oh-six");
        let err = EntrypointConfig::from_env().expect_err("bad port");
        assert!(matches!(err, SolarError::Config(_)));
        Ok(())
    });
}

#[test]
fn poll_intervals_never_collapse_to_zero() {
    let cfg = EntrypointConfig {
        poll_interval_ms: 0,
        max_poll_interval_ms: 0,
        ..EntrypointConfig::default()
    };
    assert_eq!(cfg.poll_interval(), Duration::from_millis(1));
    assert_eq!(cfg.max_poll_interval(), Duration::from_millis(1));
}

#[test]
fn launcher_reads_solar_prefixed_variables() {
    Jail::expect_with(|jail| {
        jail.set_env("SOLAR_CONTROLLER", "python3 main_controller.py");
        jail.set_env("SOLAR_CONFIG_DIR", "/etc/solar");

        let cfg: LauncherConfig = LauncherConfig::figment().extract()?;
        assert_eq!(cfg.config_dir, PathBuf::from("/etc/solar"));
        assert_eq!(cfg.config_file, PathBuf::from("system_config.json"));

        let (program, args) = cfg.controller_command().expect("command");
        assert_eq!(program, "python3");
        assert_eq!(args, vec!["main_controller.py".to_string()]);
        Ok(())
    });
}

#[test]
fn launcher_defaults_to_sibling_controller_binary() {
    let cfg = LauncherConfig::default();
    let (program, args) = cfg.controller_command().expect("command");
    assert!(program.contains("solar-controller"), "{program}");
    assert!(args.is_empty());
}

#[test]
fn split_command_rejects_blank_lines() {
    assert!(matches!(split_command("   "), Err(SolarError::EmptyCommand)));
    let (program, args) = split_command("  python  manage.py ").expect("split");
    assert_eq!(program, "python");
    assert_eq!(args, vec!["manage.py".to_string()]);
}

#[test]
fn split_command_honours_quotes() {
    let (program, args) =
        split_command(r#""/opt/solar tools/ctl" --verbose"#).expect("split");
    assert_eq!(program, "/opt/solar tools/ctl");
    assert_eq!(args, vec!["--verbose".to_string()]);

    let (program, args) = split_command(r#"python '/srv/my app/manage.py'"#).expect("split");
    assert_eq!(program, "python");
    assert_eq!(args, vec!["/srv/my app/manage.py".to_string()]);
}

#[test]
fn split_command_rejects_unbalanced_quotes() {
    assert!(matches!(
        split_command(r#"python "/srv/my app/manage.py"#),
        Err(SolarError::CommandLine(_))
    ));
}

#[test]
fn quoted_controller_path_from_environment() {
    Jail::expect_with(|jail| {
        jail.set_env("SOLAR_CONTROLLER", r#""/opt/solar tools/ctl" --fast"#);
        let cfg: LauncherConfig = LauncherConfig::figment().extract()?;
        let (program, args) = cfg.controller_command().expect("command");
        assert_eq!(program, "/opt/solar tools/ctl");
        assert_eq!(args, vec!["--fast".to_string()]);
        Ok(())
    });
}

#[test]
fn fully_quoted_command_lines_keep_their_quotes() {
    Jail::expect_with(|jail| {
        jail.set_env("SOLAR_CONTROLLER", r#""/opt/solar tools/ctl""#);
        jail.set_env(
            "ENTRYPOINT_MANAGE_COMMAND",
            r#""/srv/my app/venv/bin/python" manage.py"#,
        );

        let launcher: LauncherConfig = LauncherConfig::figment().extract()?;
        let (program, args) = launcher.controller_command().expect("command");
        assert_eq!(program, "/opt/solar tools/ctl");
        assert!(args.is_empty());

        let entrypoint: EntrypointConfig = EntrypointConfig::figment().extract()?;
        let (program, args) = split_command(&entrypoint.manage_command).expect("split");
        assert_eq!(program, "/srv/my app/venv/bin/python");
        assert_eq!(args, vec!["manage.py".to_string()]);
        Ok(())
    });
}
