//! End-to-end generation against a mocked FHIR server.

use std::path::PathBuf;

use fhir2apim_core::{
    capability::InteractionCode, config::Config, generate, generate_with_cancellation, Error,
    OutputFormat,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fixture(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests/fixtures")
        .join(relative)
}

fn read_fixture(relative: &str) -> String {
    std::fs::read_to_string(fixture(relative)).unwrap()
}

/// Serve a capability fixture at `/baseDstu3/metadata?_format=json`
async fn fhir_server(capability: &str) -> (MockServer, Config) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/baseDstu3/metadata"))
        .and(query_param("_format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(read_fixture(capability)))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/baseDstu3/", server.uri())).unwrap();
    (server, Config::new(url))
}

async fn generate_json(config: &Config) -> Value {
    let output = generate(config).await.unwrap();
    serde_json::from_str(&output).unwrap()
}

/// Every `$ref` value anywhere below `value`
fn schema_refs(value: &Value) -> Vec<String> {
    match value {
        Value::Object(map) => map
            .iter()
            .flat_map(|(key, v)| match (key.as_str(), v) {
                ("$ref", Value::String(target)) => vec![target.clone()],
                _ => schema_refs(v),
            })
            .collect(),
        Value::Array(items) => items.iter().flat_map(schema_refs).collect(),
        _ => Vec::new(),
    }
}

/// Assert every `$ref` under `paths` resolves to a merged definition
fn assert_refs_resolve(doc: &Value) {
    for target in schema_refs(&doc["paths"]) {
        let name = target.trim_start_matches("#/definitions/");
        assert!(
            doc["definitions"].get(name).is_some(),
            "dangling reference {}",
            target
        );
    }
}

#[tokio::test]
async fn test_swagger_for_all_resources() {
    let (_server, config) = fhir_server("capability/hapi_dstu3.json").await;
    let doc = generate_json(&config).await;

    assert_eq!(doc["swagger"], "2.0");
    assert_eq!(doc["basePath"], "/baseDstu3");
    assert_eq!(doc["info"]["description"], "HAPI FHIR Server");
    assert_eq!(doc["info"]["version"], "3.0.1");
    assert_eq!(
        doc["paths"]["/metadata"]["get"]["summary"],
        "Get conformance statement."
    );
    assert!(doc.get("definitions").is_none());

    let search = &doc["paths"]["/Patient"]["get"]["parameters"];
    let names: Vec<_> = search
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["birthdate", "family", "active", "_format"]);
    assert_eq!(search[0]["format"], "date");
    assert_eq!(search[3]["x-consoleDefault"], "application/json");

    // quantity search parameters are typed as integers
    assert_eq!(
        doc["paths"]["/Observation"]["get"]["parameters"][0]["type"],
        "integer"
    );
    // Observation only declares read and search-type
    assert!(doc["paths"].get("/Observation/_history").is_none());
    assert!(doc["paths"]["/Observation/{id}"].get("delete").is_none());
}

#[tokio::test]
async fn test_swagger_with_exclusions() {
    let (_server, mut config) = fhir_server("capability/vonk.json").await;
    config.resources = "Account".parse().unwrap();
    config.interactions = "delete".parse().unwrap();
    let doc = generate_json(&config).await;

    assert_eq!(doc["info"]["description"], "Vonk");
    assert!(doc["paths"].get("/Patient").is_none());
    assert!(doc["paths"].get("/Account").is_none());

    let delete = &doc["paths"]["/Account/{id}"]["delete"];
    let params = delete["parameters"].as_array().unwrap();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0]["name"], "id");
    assert_eq!(params[0]["in"], "path");
    assert_eq!(params[0]["required"], true);
    assert!(doc["paths"]["/Account/{id}"].get("get").is_none());
}

#[tokio::test]
async fn test_search_parameters_scenario() {
    let (_server, config) = fhir_server("capability/vonk.json").await;
    let doc = generate_json(&config).await;

    let params = doc["paths"]["/Patient"]["get"]["parameters"]
        .as_array()
        .unwrap();
    let name = params.iter().find(|p| p["name"] == "name").unwrap();
    assert_eq!(name["in"], "query");
    assert_eq!(name["type"], "string");
    assert!(params.iter().any(|p| p["name"] == "_format"));
}

#[tokio::test]
async fn test_arm_template_chain() {
    let (_server, mut config) = fhir_server("capability/hapi_dstu3.json").await;
    config.format = OutputFormat::Arm;
    let template = generate_json(&config).await;

    assert_eq!(template["contentVersion"], "1.0.0.0");
    assert_eq!(
        template["parameters"]["apimInstanceName"]["defaultValue"],
        "myapim"
    );

    let resources = template["resources"].as_array().unwrap();
    let api = &resources[0];
    assert_eq!(api["properties"]["description"], "HAPI FHIR Server");
    assert_eq!(api["properties"]["protocols"][0], "http");
    assert_eq!(api["apiVersion"], "2017-03-01");

    // Account and Patient declare all eight verbs, Observation two
    let operations = &resources[1..];
    assert_eq!(operations.len(), 8 + 8 + 2);

    let api_id =
        "[resourceId('Microsoft.ApiManagement/service/apis', parameters('apimInstanceName'), 'fhirapi')]";
    for (k, op) in operations.iter().enumerate() {
        let depends_on: Vec<_> = op["dependsOn"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d.as_str().unwrap())
            .collect();
        assert!(depends_on.contains(&api_id));
        if k == 0 {
            assert_eq!(depends_on.len(), 1);
        } else {
            let previous = operations[k - 1]["name"].as_str().unwrap();
            let previous_uuid = previous
                .trim_end_matches("')]")
                .rsplit('/')
                .next()
                .unwrap();
            assert_eq!(depends_on.len(), 2);
            assert!(depends_on[1].contains(previous_uuid));
        }
    }

    let first = &operations[0]["properties"];
    assert_eq!(first["displayName"], "/Account - GET");
    assert_eq!(first["request"]["queryParameters"][3]["name"], "_format");
    assert_eq!(
        first["request"]["queryParameters"][3]["defaultValue"],
        "application/json"
    );
}

#[tokio::test]
async fn test_filter_property_across_interactions() {
    let (_server, mut config) = fhir_server("capability/vonk.json").await;
    config.format = OutputFormat::Arm;

    for code in InteractionCode::all() {
        config.interactions = code.as_str().parse().unwrap();
        let template = generate_json(&config).await;
        let count = template["resources"].as_array().unwrap().len() - 1;
        let expected = match code {
            InteractionCode::SearchType | InteractionCode::Read | InteractionCode::Delete => 2,
            InteractionCode::Create | InteractionCode::Update => 1,
            _ => 0,
        };
        assert_eq!(count, expected, "{}", code);
    }
}

#[tokio::test]
async fn test_swagger_generation_is_idempotent() {
    let (_server, config) = fhir_server("capability/hapi_dstu3.json").await;
    let first = generate(&config).await.unwrap();
    let second = generate(&config).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_schema_definitions_are_merged() {
    let (server, mut config) = fhir_server("capability/vonk.json").await;
    Mock::given(method("GET"))
        .and(path("/schemas/R4/fhir.schema.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(read_fixture("schema/fhir.schema.json")),
        )
        .mount(&server)
        .await;
    config.schema_version = Some("R4".to_string());
    config.schema_base_url = format!("{}/schemas/", server.uri());

    let doc = generate_json(&config).await;
    let definitions = doc["definitions"].as_object().unwrap();
    assert!(!definitions.contains_key("ResourceList"));
    assert!(definitions.contains_key("Patient"));
    assert!(doc["definitions"]["Patient"]["properties"]["gender"]["description"]
        .as_str()
        .unwrap()
        .contains("\"administration\""));
    assert_eq!(
        doc["paths"]["/Patient/{id}"]["get"]["responses"]["200"]["schema"]["$ref"],
        "#/definitions/Patient"
    );
    assert_eq!(
        doc["paths"]["/Patient"]["post"]["parameters"][0]["schema"]["$ref"],
        "#/definitions/Patient"
    );
    assert_refs_resolve(&doc);
}

#[tokio::test]
async fn test_schema_failure_yields_empty_definitions() {
    let (server, mut config) = fhir_server("capability/vonk.json").await;
    config.schema_version = Some("R4".to_string());
    config.schema_base_url = format!("{}/missing/", server.uri());

    let doc = generate_json(&config).await;
    assert_eq!(doc["definitions"], serde_json::json!({}));
    assert!(doc["paths"].get("/Patient").is_some());
}

#[tokio::test]
async fn test_schema_failure_leaves_no_dangling_references() {
    let (server, mut config) = fhir_server("capability/vonk.json").await;
    config.schema_version = Some("R4".to_string());
    config.schema_base_url = format!("{}/missing/", server.uri());

    let doc = generate_json(&config).await;
    assert!(schema_refs(&doc["paths"]).is_empty());
    assert_eq!(
        doc["paths"]["/Patient"]["post"]["parameters"][0]["schema"],
        serde_json::json!({ "type": "object" })
    );
    assert!(doc["paths"]["/Patient/{id}"]["get"]["responses"]["200"]
        .get("schema")
        .is_none());
}

#[tokio::test]
async fn test_unreachable_server_yields_skeleton() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let config = Config::new(Url::parse(&format!("{}/fhir", server.uri())).unwrap());

    let doc = generate_json(&config).await;
    let paths = doc["paths"].as_object().unwrap();
    assert_eq!(paths.len(), 1);
    assert!(paths.contains_key("/metadata"));
}

#[tokio::test]
async fn test_malformed_capability_is_validation_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"rest": []}"#))
        .mount(&server)
        .await;
    let config = Config::new(Url::parse(&server.uri()).unwrap());

    let err = generate(&config).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn test_capability_file_is_used_without_fetch() {
    let mut config = Config::new(Url::parse("http://localhost:1/fhir").unwrap());
    config.capability_path = Some(fixture("capability/vonk.json"));
    config.format = OutputFormat::Arm;

    let template = generate_json(&config).await;
    assert_eq!(template["resources"][0]["properties"]["description"], "Vonk");
    assert_eq!(
        template["resources"][0]["properties"]["serviceUrl"],
        "http://localhost:1/fhir"
    );
}

#[tokio::test]
async fn test_cancelled_generation() {
    let (_server, config) = fhir_server("capability/vonk.json").await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = generate_with_cancellation(&config, &cancel).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[tokio::test]
async fn test_cancelled_generation_without_fetches() {
    let mut config = Config::new(Url::parse("http://localhost:1/fhir").unwrap());
    config.capability_path = Some(fixture("capability/vonk.json"));
    let cancel = CancellationToken::new();
    cancel.cancel();

    for format in OutputFormat::all() {
        config.format = format;
        let result = generate_with_cancellation(&config, &cancel).await;
        assert!(matches!(result, Err(Error::Cancelled)), "{}", format);
    }
}

#[tokio::test]
async fn test_missing_server_is_config_error() {
    let err = generate(&Config::default()).await.unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
