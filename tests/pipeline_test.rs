mod common;

use common::*;
use knowledge_connector::client::{spawn_pipeline, WebSocketClient, WebSocketClientConfig};
use knowledge_connector::core::SchemaType;
use knowledge_connector::rdf::TripleAssembler;
use std::collections::BTreeMap;

fn assembler() -> TripleAssembler<MockReasoner, MockFiles> {
    let reasoner = MockReasoner::new();
    reasoner.answer_data("Vehicle", "Speed", "speed", "float");
    let mut assembler =
        TripleAssembler::new(model_config("turtle"), reasoner, MockFiles::with_queries()).unwrap();
    assembler.initialize().unwrap();
    assembler
}

fn client() -> WebSocketClient {
    let mut supported = BTreeMap::new();
    supported.insert(SchemaType::Vehicle, vec!["Vehicle.Speed".to_string()]);
    WebSocketClient::new(
        WebSocketClientConfig::new(
            "ws://127.0.0.1:8080/".to_string(),
            vec![(SchemaType::Vehicle, VIN.to_string())],
        ),
        supported,
    )
}

#[test]
fn test_pipeline_processes_messages_in_order() {
    let (sender, worker) = spawn_pipeline(assembler(), None);

    sender.send(message(vec![node("Vehicle.Speed", "10", 1_704_103_200_000)])).unwrap();
    sender.send(message(vec![])).unwrap();
    sender.send(message(vec![node("Vehicle.Speed", "20", 1_704_103_201_000)])).unwrap();
    drop(sender);

    let stats = worker.join().expect("worker should not panic");
    assert_eq!(stats.processed, 2);
    assert_eq!(stats.empty, 1);
    assert_eq!(stats.failed, 0);
}

#[test]
fn test_subscribe_messages() {
    let messages = client().subscribe_messages().unwrap();
    assert_eq!(
        messages,
        vec![format!(r#"{{"type":"subscribe","schema":"Vehicle","instance":"{}"}}"#, VIN)]
    );
}

#[test]
fn test_frames_become_messages() {
    let client = client();
    let frame = format!(
        r#"{{"type":"data","schema":"Vehicle","instance":"{}","data":{{"Speed":88}}}}"#,
        VIN
    );

    let message = client.handle_frame(&frame).expect("data frame should decode");
    assert_eq!(message.header.id, VIN);
    assert_eq!(message.nodes[0].value, "88");

    let status = r#"{"type":"status","code":200,"message":"ok"}"#;
    assert!(client.handle_frame(status).is_none());
    assert!(client.handle_frame("not json").is_none());
    // Only unsupported points left.
    let unsupported = r#"{"type":"data","schema":"Vehicle","instance":"X","data":{"Gear":3}}"#;
    assert!(client.handle_frame(unsupported).is_none());

    assert_eq!(client.get_metrics(), (4, 1));
}
