mod common;

use common::{model_config, MockFiles, DATA_QUERY, OBJECT_QUERY};
use knowledge_connector::config::{DataPointSource, ModelConfig};
use knowledge_connector::core::SchemaType;
use knowledge_connector::rdf::query::{PropertyType, QueryLanguage};
use knowledge_connector::rdf::RdfSyntax;
use knowledge_connector::ConnectorError;

#[test]
fn test_parse_model_config() {
    let config = model_config("turtle");
    assert_eq!(config.output, "out/");
    assert_eq!(config.shacl_shapes, vec!["shapes/vehicle.ttl".to_string()]);
    assert_eq!(config.output_syntax().unwrap(), RdfSyntax::Turtle);
    assert_eq!(config.supported_schemas(), vec![SchemaType::Vehicle]);
    assert!(config.zone_origin().is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_unsupported_output_format() {
    let config = model_config("rdfxml");
    assert!(matches!(config.validate(), Err(ConnectorError::UnsupportedFormat(_))));

    let config = model_config("n3");
    assert!(matches!(config.output_syntax(), Err(ConnectorError::UnsupportedFormat(_))));
}

#[test]
fn test_query_file_falls_back_to_default() {
    let mut config = model_config("turtle");
    config.queries.triple_assembler_helper.insert(
        "vehicle".to_string(),
        vec!["queries/vehicle_object_property.rq".to_string()],
    );

    assert_eq!(
        config.query_file(&SchemaType::Vehicle, PropertyType::Object),
        Some("queries/vehicle_object_property.rq")
    );
    assert_eq!(
        config.query_file(&SchemaType::Vehicle, PropertyType::Data),
        Some("queries/default_data_property.rq")
    );
}

#[test]
fn test_validate_requires_queries_for_supported_schemas() {
    let mut config = model_config("turtle");
    config.queries.triple_assembler_helper.clear();
    config
        .queries
        .triple_assembler_helper
        .insert("truck".to_string(), vec!["queries/truck_data_property.rq".to_string()]);

    match config.validate() {
        Err(ConnectorError::Configuration(message)) => assert!(message.contains("vehicle")),
        other => panic!("expected a configuration error, got {:?}", other),
    }
}

#[test]
fn test_query_pairs() {
    let config = model_config("turtle");
    let pairs = config.query_pairs(&MockFiles::with_queries()).unwrap();

    let pair = pairs.get(&SchemaType::Default).expect("default queries");
    assert_eq!(pair.data_property, (QueryLanguage::Sparql, DATA_QUERY.to_string()));
    assert_eq!(pair.object_property.1, OBJECT_QUERY);
    assert_eq!(pair.query(PropertyType::Object), OBJECT_QUERY);
}

#[test]
fn test_query_pairs_reject_empty_query() {
    let config = model_config("turtle");
    let mut files = MockFiles::with_queries();
    files.insert("queries/default_data_property.rq", "\n");
    assert!(matches!(config.query_pairs(&files), Err(ConnectorError::Configuration(_))));
}

#[test]
fn test_query_pairs_reject_missing_query_file() {
    let config = model_config("turtle");
    let mut files = MockFiles::with_queries();
    files.files.remove("queries/default_object_property.rq");

    let err = config.query_pairs(&files).unwrap_err();
    assert!(matches!(err, ConnectorError::Configuration(_)));
    assert!(err.to_string().contains("queries/default_object_property.rq"));
}

#[test]
fn test_supported_data_points_from_file() {
    let mut config = model_config("turtle");
    config
        .inputs
        .insert("Truck_data".to_string(), DataPointSource::File("inputs/truck.txt".to_string()));
    let mut files = MockFiles::default();
    files.insert("inputs/truck.txt", "Truck.Speed\n\nTruck.Load\n");

    let points = config.supported_data_points(&files).unwrap();
    assert_eq!(points.get(&SchemaType::Vehicle).unwrap(), &vec!["Vehicle.Speed".to_string()]);
    assert_eq!(
        points.get(&SchemaType::Other("Truck".to_string())).unwrap(),
        &vec!["Truck.Speed".to_string(), "Truck.Load".to_string()]
    );
}

#[test]
fn test_load_validates() {
    let mut files = MockFiles::default();
    files.insert("config.json", "{ \"output\": \"out/\" }");
    assert!(matches!(ModelConfig::load(&files, "config.json"), Err(ConnectorError::Json(_))));
    assert!(matches!(
        ModelConfig::load(&files, "missing.json"),
        Err(ConnectorError::Configuration(_))
    ));
}

#[test]
fn test_zone_origin() {
    let config = ModelConfig::from_json(
        r#"{
            "output": "out/",
            "reasoner_settings": {
                "output_format": "trig",
                "supported_schema_collections": ["Vehicle"]
            },
            "zone_origin": { "latitude": 59.91, "longitude": 10.75 }
        }"#,
    )
    .unwrap();

    let origin = config.zone_origin().unwrap();
    assert_eq!(origin.latitude, 59.91);
    assert_eq!(origin.longitude, 10.75);
    assert_eq!(config.reasoner_settings.inference_engine, "RDFox");
    assert_eq!(config.output_syntax().unwrap(), RdfSyntax::TriG);
}
