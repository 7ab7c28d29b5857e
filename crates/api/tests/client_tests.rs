use std::net::TcpListener;

use httpmock::Method::{DELETE, GET, POST, PUT};
use httpmock::MockServer;
use indexmap::IndexMap;
use serde_json::json;
use xcs_api::{ApiError, ClientSettings, XnatClient};
use xcs_types::{ConfigSubmission, EventType, FlagText, ImageHub, InputSubmission, NewEventMapping, Scope};

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn client_for(server: &MockServer) -> XnatClient {
    let settings = ClientSettings::new(server.base_url()).with_credentials("admin", Some("admin".into()));
    XnatClient::new(settings).unwrap()
}

// "admin:admin"
const BASIC_ADMIN: &str = "Basic YWRtaW46YWRtaW4=";

#[tokio::test]
async fn lists_commands_with_basic_auth() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/xapi/commands")
            .query_param("image", "xnat/debug:1.0")
            .header("authorization", BASIC_ADMIN);
        then.status(200).json_body(json!([{
            "id": 2,
            "name": "debug",
            "image": "xnat/debug:1.0",
            "xnat": [{"id": 5, "name": "debug-session", "contexts": ["xnat:imageSessionData"]}]
        }]));
    });

    let commands = client_for(&server).list_commands(Some("xnat/debug:1.0")).await.unwrap();
    mock.assert();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].wrappers[0].name, "debug-session");
}

#[tokio::test]
async fn non_success_responses_keep_status_text_and_body() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/xapi/commands/9");
        then.status(404).body("Command 9 not found");
    });

    let error = client_for(&server).get_command(9).await.unwrap_err();
    match error {
        ApiError::Http { status, status_text, body } => {
            assert_eq!(status, 404);
            assert_eq!(status_text, "Not Found");
            assert_eq!(body, "Command 9 not found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn saves_config_with_enabled_flag_and_string_booleans() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/xapi/projects/CT1/commands/4/wrappers/dcm2niix-scan/config")
            .query_param("enabled", "true")
            .json_body(json!({
                "inputs": {"bids": {"default-value": "false", "matcher": "", "user-settable": "true", "advanced": "false"}},
                "outputs": {"nifti": {"label": "NIFTI"}}
            }));
        then.status(200);
    });

    let mut submission = ConfigSubmission::default();
    submission.inputs.insert(
        "bids".into(),
        InputSubmission {
            default_value: "false".into(),
            matcher: String::new(),
            user_settable: FlagText(true),
            advanced: FlagText(false),
        },
    );
    submission.outputs.insert(
        "nifti".into(),
        xcs_types::OutputConfig {
            label: Some("NIFTI".into()),
        },
    );
    client_for(&server)
        .save_config(&Scope::project("CT1"), 4, "dcm2niix-scan", &submission)
        .await
        .unwrap();
    mock.assert();
}

#[tokio::test]
async fn toggles_enabled_flags_per_scope() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }
    let server = MockServer::start();
    let site = server.mock(|when, then| {
        when.method(PUT).path("/xapi/commands/4/wrappers/debug/disabled");
        then.status(200);
    });
    let project = server.mock(|when, then| {
        when.method(PUT).path("/xapi/projects/CT1/commands/4/wrappers/debug/enabled");
        then.status(200);
    });
    let status = server.mock(|when, then| {
        when.method(GET).path("/xapi/commands/4/wrappers/debug/enabled");
        then.status(200).body("true");
    });

    let client = client_for(&server);
    client.set_enabled(&Scope::Site, 4, "debug", false).await.unwrap();
    client.set_enabled(&Scope::project("CT1"), 4, "debug", true).await.unwrap();
    assert!(client.get_enabled(&Scope::Site, 4, "debug").await.unwrap());
    site.assert();
    project.assert();
    status.assert();
}

#[tokio::test]
async fn hub_default_and_image_force_delete_use_query_flags() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }
    let server = MockServer::start();
    let default = server.mock(|when, then| {
        when.method(POST).path("/xapi/docker/hubs/3").query_param("default", "true");
        then.status(200);
    });
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/xapi/docker/hubs")
            .json_body(json!({"name": "Private", "url": "https://registry.example.org", "default": false}));
        then.status(201);
    });
    let force = server.mock(|when, then| {
        when.method(DELETE).path("/xapi/docker/images/sha256:abc").query_param("force", "true");
        then.status(200);
    });
    let pull = server.mock(|when, then| {
        when.method(POST)
            .path("/xapi/docker/pull")
            .query_param("save-commands", "true")
            .query_param("image", "xnat/dcm2niix:latest");
        then.status(200);
    });

    let client = client_for(&server);
    client.set_default_hub(3).await.unwrap();
    let hub = ImageHub {
        name: "Private".into(),
        url: "https://registry.example.org".into(),
        ..Default::default()
    };
    client.save_hub(None, &hub, false).await.unwrap();
    client.delete_image("sha256:abc", true).await.unwrap();
    client.pull_image("xnat/dcm2niix:latest", None).await.unwrap();
    default.assert();
    create.assert();
    force.assert();
    pull.assert();
}

#[tokio::test]
async fn bulk_launch_posts_parameter_array() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/xapi/projects/CT1/wrappers/7/bulklaunch")
            .json_body(json!([{"scan": "A", "flags": "-v"}, {"scan": "B", "flags": "-v"}]));
        then.status(200).json_body(json!({
            "successes": [{"params": {"scan": "A"}, "container-id": "c1"}],
            "failures": [{"params": {"scan": "B"}, "message": "no DICOM"}]
        }));
    });

    let params: Vec<IndexMap<String, String>> = ["A", "B"]
        .iter()
        .map(|target| {
            let mut map = IndexMap::new();
            map.insert("scan".to_string(), target.to_string());
            map.insert("flags".to_string(), "-v".to_string());
            map
        })
        .collect();
    let report = client_for(&server)
        .bulk_launch(&Scope::project("CT1"), 7, &params)
        .await
        .unwrap();
    mock.assert();
    assert_eq!(report.successes[0].params["scan"], "A");
    assert_eq!(report.failures[0].message.as_deref(), Some("no DICOM"));
}

#[tokio::test]
async fn reads_history_and_logs() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/xapi/projects/CT1/containers");
        then.status(200).json_body(json!([{"id": 1, "container-id": "abc", "history": []}]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/xapi/containers/abc/logs/stdout");
        then.status(200).body("line 1\nline 2\n");
    });

    let client = client_for(&server);
    let entries = client.list_containers(&Scope::project("CT1")).await.unwrap();
    assert_eq!(entries[0].container_id.as_deref(), Some("abc"));
    let log = client.container_log("abc", "stdout").await.unwrap();
    assert_eq!(log, "line 1\nline 2\n");
}

#[tokio::test]
async fn project_settings_unwrap_nested_json_contents() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/data/projects/CT1/config/container-service/general");
        then.status(200).json_body(json!({
            "ResultSet": {"Result": [{"contents": "{\"optIntoSitewideCommands\":true}"}]}
        }));
    });
    let put = server.mock(|when, then| {
        when.method(PUT)
            .path("/data/projects/CT1/config/container-service/general")
            .query_param("inbody", "true")
            .json_body(json!({"optIntoSitewideCommands": false}));
        then.status(200);
    });

    let client = client_for(&server);
    let settings = client.get_project_settings("CT1").await.unwrap();
    assert!(settings.opt_into_sitewide_commands);
    client
        .set_project_settings("CT1", &xcs_types::ProjectSettings::default())
        .await
        .unwrap();
    put.assert();
}

#[tokio::test]
async fn event_mappings_round_trip_through_endpoints() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method(POST).path("/xapi/commandeventmapping").json_body(json!({
            "project": "CT1",
            "command-id": 4,
            "xnat-command-wrapper": "dcm2niix-session",
            "event-type": "SessionArchived"
        }));
        then.status(201);
    });
    let disable = server.mock(|when, then| {
        when.method(PUT).path("/xapi/commandeventmapping/8/disable");
        then.status(200);
    });
    let delete = server.mock(|when, then| {
        when.method(DELETE).path("/xapi/commandeventmapping/8");
        then.status(204);
    });

    let client = client_for(&server);
    client
        .create_event_mapping(&NewEventMapping {
            project: "CT1".into(),
            command_id: 4,
            xnat_command_wrapper: "dcm2niix-session".into(),
            event_type: EventType::SessionArchived,
        })
        .await
        .unwrap();
    client.set_event_mapping_enabled(8, false).await.unwrap();
    client.delete_event_mapping(8).await.unwrap();
    create.assert();
    disable.assert();
    delete.assert();
}

#[tokio::test]
async fn dry_run_previews_writes_but_still_reads() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }
    let server = MockServer::start();
    let read = server.mock(|when, then| {
        when.method(GET).path("/xapi/commands/4/wrappers/dcm2niix-scan/enabled");
        then.status(200).body("false");
    });
    let write = server.mock(|when, then| {
        when.method(POST).path("/xapi/docker/hubs");
        then.status(200);
    });
    let settings = ClientSettings::new(server.base_url())
        .with_credentials("admin", Some("admin".into()))
        .with_dry_run(true);
    let client = XnatClient::new(settings).unwrap();

    assert!(!client.get_enabled(&Scope::Site, 4, "dcm2niix-scan").await.unwrap());
    read.assert();

    let hub = ImageHub {
        name: "Private".into(),
        url: "https://registry.example.org".into(),
        ..Default::default()
    };
    match client.save_hub(None, &hub, false).await.unwrap_err() {
        ApiError::DryRun(preview) => {
            assert_eq!(preview.method, "POST");
            assert!(preview.url.ends_with("/xapi/docker/hubs"));
            assert_eq!(preview.headers["authorization"], "[REDACTED]");
            assert_eq!(preview.body.as_ref().unwrap()["url"], "https://registry.example.org");
        }
        other => panic!("expected a dry-run preview, got {other}"),
    }
    write.assert_hits(0);
}
