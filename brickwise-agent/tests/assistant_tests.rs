//! End-to-end runs through the full routing graph with a scripted
//! model and in-memory fixtures.

use brickwise_agent::{AgentConfig, BuildingAssistant};
use brickwise_core::{BrickError, Content, LlmResponse, Part};
use brickwise_model::MockLlm;
use brickwise_tools::{StaticSqlSource, LIST_TABLES_TOOL, RDF_TOOLKIT, RUN_QUERY_TOOL};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

const BUILDING_TTL: &str = r#"
@prefix brick: <https://brickschema.org/schema/Brick#> .
@prefix bldg: <urn:Building#> .

bldg:BCGW_Building a brick:Building ;
    brick:hasArea [ brick:value "12345.0" ; brick:hasUnit brick:M2 ] .

bldg:Temp_S1 a brick:Zone_Air_Temperature_Sensor ;
    brick:hasUUID "550e8400-e29b-41d4-a716-446655440000" ;
    brick:isPointOf bldg:Z01 .
bldg:Temp_S2 a brick:Outside_Air_Temperature_Sensor ;
    brick:hasUUID "650e8400-e29b-41d4-a716-446655440001" ;
    brick:isPointOf bldg:Z02 .
"#;

struct Fixture {
    // Held for their Drop: the assistant reads from these paths.
    _data_dir: TempDir,
    config: AgentConfig,
}

fn fixture() -> Fixture {
    let data_dir = TempDir::new().unwrap();
    let metadata_file = data_dir.path().join("metadata.json");
    std::fs::write(
        &metadata_file,
        r#"{"BCGW": {"location": "Monopoli"}, "PALA": {"location": "Palermo"}}"#,
    )
    .unwrap();

    let ttl_dir = data_dir.path().join("ttl_files");
    std::fs::create_dir(&ttl_dir).unwrap();
    std::fs::write(ttl_dir.join("bui_BCGW.ttl"), BUILDING_TTL).unwrap();

    let config = AgentConfig::new(&metadata_file, &ttl_dir);
    Fixture { _data_dir: data_dir, config }
}

fn text(s: &str) -> LlmResponse {
    LlmResponse::new(Content::new("assistant").with_text(s))
}

fn call(name: &str, args: serde_json::Value, id: &str) -> LlmResponse {
    LlmResponse::new(
        Content::new("assistant").with_part(Part::function_call(name, args, Some(id.into()))),
    )
}

fn valid_evaluation() -> LlmResponse {
    text(r#"{"is_valid": true, "clarified_query": "q", "explanation": "building question"}"#)
}

#[tokio::test]
async fn test_invalid_question_terminates_without_tools() {
    let fx = fixture();
    let llm = Arc::new(MockLlm::new("mock").with_response(text(
        r#"{"is_valid": false, "clarified_query": "", "explanation": "Not about the monitored buildings."}"#,
    )));
    let source = Arc::new(StaticSqlSource::new());
    let assistant = BuildingAssistant::new(fx.config, llm.clone(), source.clone()).unwrap();

    let answer = assistant.run("recite a poem").await.unwrap();

    assert!(answer.contains("Not about the monitored buildings"));
    assert_eq!(llm.remaining(), 0);
    assert!(source.executed().is_empty());
}

#[tokio::test]
async fn test_location_question_answered_from_metadata() {
    let fx = fixture();
    let llm = Arc::new(
        MockLlm::new("mock")
            .with_response(valid_evaluation())
            .with_response(text("Building BCGW is located in Monopoli.")),
    );
    let source = Arc::new(StaticSqlSource::new());
    let assistant = BuildingAssistant::new(fx.config, llm, source.clone()).unwrap();

    let answer = assistant.run("In which city is building BCGW?").await.unwrap();

    assert_eq!(answer, "Building BCGW is located in Monopoli.");
    assert!(source.executed().is_empty());
}

#[tokio::test]
async fn test_structural_question_goes_through_rdf() {
    let fx = fixture();
    let llm = Arc::new(
        MockLlm::new("mock")
            .with_response(valid_evaluation())
            .with_response(call(
                RDF_TOOLKIT,
                json!({"building_name": "BCGW", "operation": "temperature_sensors_uuid"}),
                "c1",
            ))
            .with_response(text("Building BCGW has 2 temperature sensors.")),
    );
    let source = Arc::new(StaticSqlSource::new());
    let assistant = BuildingAssistant::new(fx.config, llm.clone(), source.clone()).unwrap();

    let answer = assistant
        .run("How many temperature sensors does BCGW have?")
        .await
        .unwrap();

    assert_eq!(answer, "Building BCGW has 2 temperature sensors.");
    assert_eq!(llm.remaining(), 0);
    assert!(source.executed().is_empty());
}

#[tokio::test]
async fn test_unknown_building_fails_gracefully() {
    let fx = fixture();
    let llm = Arc::new(
        MockLlm::new("mock")
            .with_response(valid_evaluation())
            .with_response(call(
                RDF_TOOLKIT,
                json!({"building_name": "ZZZZ", "operation": "zones"}),
                "c1",
            ))
            // The completion check observes the error payload and explains.
            .with_response(text("I have no structural model for building ZZZZ.")),
    );
    let assistant =
        BuildingAssistant::new(fx.config, llm, Arc::new(StaticSqlSource::new())).unwrap();

    let answer = assistant.run("Which zones does ZZZZ have?").await.unwrap();

    assert_eq!(answer, "I have no structural model for building ZZZZ.");
}

#[tokio::test]
async fn test_numeric_question_runs_the_full_sql_path() {
    let fx = fixture();
    let statement =
        "SELECT AVG(value) AS avg_temp FROM readings WHERE uuid = '550e8400-e29b-41d4-a716-446655440000'";
    let llm = Arc::new(
        MockLlm::new("mock")
            .with_response(valid_evaluation())
            .with_response(call(LIST_TABLES_TOOL, json!({}), "c1"))
            .with_response(call(
                brickwise_tools::GET_SCHEMA_TOOL,
                json!({"table_names": "readings"}),
                "c2",
            ))
            .with_response(call(RUN_QUERY_TOOL, json!({"query": statement}), "c3"))
            // The checked statement, re-emitted under a fresh model id;
            // the run must not execute anything else.
            .with_response(call(RUN_QUERY_TOOL, json!({"query": statement}), "model-id"))
            .with_response(text("The average temperature was 21.4 degrees.")),
    );
    let source = Arc::new(
        StaticSqlSource::new()
            .with_tables(&["readings"])
            .with_schema("TABLE readings:\n  uuid text NOT NULL\n  value real NOT NULL")
            .with_rows(vec![json!({"avg_temp": 21.4})]),
    );
    let assistant = BuildingAssistant::new(fx.config, llm.clone(), source.clone()).unwrap();

    let answer = assistant
        .run("What was the average temperature in BCGW last week?")
        .await
        .unwrap();

    assert_eq!(answer, "The average temperature was 21.4 degrees.");
    assert_eq!(source.executed(), vec![statement.to_string()]);
    assert_eq!(llm.remaining(), 0);
}

#[tokio::test]
async fn test_building_name_filter_is_blocked_before_execution() {
    let fx = fixture();
    let bad = "SELECT value FROM readings WHERE building = 'BCGW'";
    let llm = Arc::new(
        MockLlm::new("mock")
            .with_response(valid_evaluation())
            .with_response(call(LIST_TABLES_TOOL, json!({}), "c1"))
            .with_response(call(
                brickwise_tools::GET_SCHEMA_TOOL,
                json!({"table_names": "readings"}),
                "c2",
            ))
            .with_response(call(RUN_QUERY_TOOL, json!({"query": bad}), "c3")),
    );
    let source = Arc::new(StaticSqlSource::new().with_tables(&["readings"]));
    let assistant = BuildingAssistant::new(fx.config, llm, source.clone()).unwrap();

    let answer = assistant.run("temperature of BCGW?").await.unwrap();

    assert!(answer.contains("was not executed"));
    assert!(source.executed().is_empty());
}

#[tokio::test]
async fn test_runaway_loop_hits_the_step_ceiling() {
    let fx = fixture();
    let llm = Arc::new(
        MockLlm::new("mock")
            .with_response(valid_evaluation())
            .with_response(call(LIST_TABLES_TOOL, json!({}), "c1")),
    );
    let assistant = BuildingAssistant::new(
        fx.config.with_max_steps(4),
        llm,
        Arc::new(StaticSqlSource::new().with_tables(&["readings"])),
    )
    .unwrap();

    let err = assistant.run("loop forever").await.unwrap_err();

    match err {
        BrickError::Runaway(steps) => assert_eq!(steps, 4),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_stream_reports_node_progress() {
    use brickwise_graph::StreamEvent;
    use futures::StreamExt;

    let fx = fixture();
    let llm = Arc::new(
        MockLlm::new("mock")
            .with_response(valid_evaluation())
            .with_response(text("Building BCGW is located in Monopoli.")),
    );
    let assistant =
        BuildingAssistant::new(fx.config, llm, Arc::new(StaticSqlSource::new())).unwrap();

    let stream = assistant.run_stream("In which city is building BCGW?").unwrap();
    let events: Vec<_> = Box::pin(stream).collect().await;

    let names: Vec<String> = events
        .iter()
        .filter_map(|e| match e {
            Ok(StreamEvent::NodeStart { node, .. }) => Some(node.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(names, vec!["resolve_metadata", "evaluate_query", "route_sources"]);
    assert!(matches!(events.last(), Some(Ok(StreamEvent::Done { .. }))));
}
