use jobcast::launcher::{callback_url, remote_command};

#[test]
fn test_remote_command_shape() {
    let (program, args) = remote_command("builder01", "/opt/bin/jobcast", "tcp://head:55000");

    assert_eq!(program, "/usr/bin/ssh");
    assert_eq!(
        args,
        vec![
            "-o".to_string(),
            "PasswordAuthentication=no".to_string(),
            "-f".to_string(),
            "builder01".to_string(),
            "nohup /opt/bin/jobcast -c tcp://head:55000 &".to_string(),
        ]
    );
}

#[test]
fn test_remote_side_runs_detached() {
    let (_, args) = remote_command("h", "exe", "tcp://head:1");
    let remote = args.last().unwrap();

    assert!(remote.starts_with("nohup "));
    assert!(remote.ends_with(" &"));
    assert!(remote.contains(" -c "));
}

#[test]
fn test_callback_url_points_at_our_port() {
    let url = callback_url(55000);

    assert!(url.starts_with("tcp://"));
    assert!(url.ends_with(":55000"));

    // Must be something the agent can dial.
    assert!(jobcast::transport::parse_url(&url).is_ok());
}
