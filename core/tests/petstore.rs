use pretty_assertions::assert_eq;
use routedoc_core::swagger::models::{Location, SecurityScheme};
use routedoc_core::{
    load_yaml, BuildConfig, DocumentBuilder, ErrorKind, FormatHint, HttpMethod, InfoOptions,
    PayloadKind, RequestFacts, ResponseSpec, RootOptions, RouteSpec, SchemaSet, ValidationNode,
};
use serde_json::json;

fn pet_schemas() -> (SchemaSet, routedoc_core::SchemaId) {
    let mut schemas = SchemaSet::new();
    let category = schemas.declare(
        ValidationNode::object([
            ("id", ValidationNode::integer().with_format(FormatHint::Int64)),
            ("name", ValidationNode::string()),
        ])
        .with_label("Category"),
    );
    let pet = schemas.declare(
        ValidationNode::object([
            ("id", ValidationNode::integer().with_format(FormatHint::Int64)),
            ("category", ValidationNode::reference(category)),
            ("name", ValidationNode::string().required().with_example("doggie")),
            (
                "photoUrls",
                ValidationNode::array(ValidationNode::string()).required(),
            ),
            (
                "status",
                ValidationNode::string()
                    .with_description("pet status in the store")
                    .with_allowed(["available", "pending", "sold"]),
            ),
        ])
        .with_label("Pet"),
    );
    (schemas, pet)
}

fn petstore_options() -> RootOptions {
    RootOptions {
        info: Some(InfoOptions {
            title: Some("Swagger Petstore".into()),
            version: Some("1.0.0".into()),
            ..InfoOptions::default()
        }),
        base_path: Some("/v2".into()),
        ..RootOptions::default()
    }
}

#[test]
fn test_get_pet_by_id() {
    let (schemas, pet) = pet_schemas();
    let routes = vec![RouteSpec::new(HttpMethod::Get, "/v2/pet/{petId}")
        .with_tags(["pet"])
        .with_summary("Find pet by ID")
        .with_path_rules(ValidationNode::object([(
            "petId",
            ValidationNode::integer().with_format(FormatHint::Int64),
        )]))
        .with_response(
            "200",
            ResponseSpec::new("successful operation").with_schema(ValidationNode::reference(pet)),
        )];

    let facts = RequestFacts::default()
        .with_host("petstore.swagger.io")
        .with_protocol("https");
    let output = DocumentBuilder::default()
        .build(&petstore_options(), &facts, &schemas, &routes)
        .unwrap();

    assert!(output.warnings.is_empty());
    assert_eq!(
        output.document.to_value().unwrap(),
        json!({
            "swagger": "2.0",
            "info": { "title": "Swagger Petstore", "version": "1.0.0" },
            "host": "petstore.swagger.io",
            "basePath": "/v2",
            "schemes": ["https"],
            "consumes": ["application/json"],
            "produces": ["application/json"],
            "paths": {
                "/pet/{petId}": {
                    "get": {
                        "tags": ["pet"],
                        "summary": "Find pet by ID",
                        "operationId": "getPetPetId",
                        "parameters": [{
                            "name": "petId",
                            "in": "path",
                            "required": true,
                            "type": "integer",
                            "format": "int64"
                        }],
                        "responses": {
                            "200": {
                                "description": "successful operation",
                                "schema": { "$ref": "#/definitions/Pet" }
                            }
                        }
                    }
                }
            },
            "definitions": {
                "Pet": {
                    "type": "object",
                    "required": ["name", "photoUrls"],
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "category": { "$ref": "#/definitions/Category" },
                        "name": { "type": "string", "example": "doggie" },
                        "photoUrls": { "type": "array", "items": { "type": "string" } },
                        "status": {
                            "type": "string",
                            "description": "pet status in the store",
                            "enum": ["available", "pending", "sold"]
                        }
                    }
                },
                "Category": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "name": { "type": "string" }
                    }
                }
            }
        })
    );
}

#[test]
fn test_body_round_trip_counts_required() {
    let payload = ValidationNode::object([
        ("username", ValidationNode::string().required()),
        ("email", ValidationNode::string().required()),
        ("password", ValidationNode::string().required().with_format(FormatHint::Password)),
        ("phone", ValidationNode::string()),
        ("userStatus", ValidationNode::integer().with_format(FormatHint::Int32)),
    ])
    .with_label("User");
    let routes = vec![RouteSpec::new(HttpMethod::Post, "/user")
        .with_payload(payload, PayloadKind::Json)
        .with_response("default", ResponseSpec::new("successful operation"))];

    let output = DocumentBuilder::default()
        .build(
            &RootOptions::default(),
            &RequestFacts::default(),
            &SchemaSet::new(),
            &routes,
        )
        .unwrap();

    let op = output.document.operation("/user", HttpMethod::Post).unwrap();
    assert_eq!(op.parameters.len(), 1);
    assert_eq!(op.parameters[0].location, Location::Body);
    let reference = op.parameters[0].schema.as_ref().unwrap().as_reference().unwrap();
    assert_eq!(reference, "#/definitions/User");
    assert_eq!(output.document.definitions["User"].required.len(), 3);
}

#[test]
fn test_find_by_status_query_array() {
    let routes = vec![RouteSpec::new(HttpMethod::Get, "/pet/findByStatus").with_query(
        ValidationNode::object([(
            "status",
            ValidationNode::array(
                ValidationNode::string()
                    .with_allowed(["available", "pending", "sold"])
                    .with_default("available"),
            )
            .required(),
        )]),
    )];

    let output = DocumentBuilder::default()
        .build(
            &RootOptions::default(),
            &RequestFacts::default(),
            &SchemaSet::new(),
            &routes,
        )
        .unwrap();
    let op = output
        .document
        .operation("/pet/findByStatus", HttpMethod::Get)
        .unwrap();
    assert_eq!(
        serde_json::to_value(&op.parameters).unwrap(),
        json!([{
            "name": "status",
            "in": "query",
            "required": true,
            "type": "array",
            "items": {
                "type": "string",
                "default": "available",
                "enum": ["available", "pending", "sold"]
            },
            "collectionFormat": "csv"
        }])
    );
}

#[test]
fn test_empty_info_fails_without_document() {
    let options = RootOptions {
        info: Some(InfoOptions::default()),
        ..RootOptions::default()
    };
    let err = DocumentBuilder::default()
        .build(&options, &RequestFacts::default(), &SchemaSet::new(), &[])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Info);
    assert_eq!(err.path(), Some("title"));
}

#[test]
fn test_security_definitions_pass_through() {
    let options: RootOptions = serde_json::from_value(json!({
        "securityDefinitions": {
            "petstore_auth": {
                "type": "oauth2",
                "flow": "implicit",
                "authorizationUrl": "http://petstore.swagger.io/oauth/dialog",
                "scopes": { "write:pets": "modify pets in your account" }
            },
            "api_key": { "type": "apiKey", "name": "api_key", "in": "header" }
        },
        "security": [{ "api_key": [] }]
    }))
    .unwrap();
    assert!(matches!(
        options.security_definitions["api_key"],
        SecurityScheme::ApiKey { .. }
    ));

    let output = DocumentBuilder::default()
        .build(&options, &RequestFacts::default(), &SchemaSet::new(), &[])
        .unwrap();
    let value = output.document.to_value().unwrap();
    assert_eq!(value["securityDefinitions"]["api_key"]["in"], json!("header"));
    assert_eq!(value["security"], json!([{ "api_key": [] }]));
}

#[test]
fn test_undefined_security_scheme_is_assembly_error() {
    let routes = vec![RouteSpec {
        security: Some(vec![[("missing".to_string(), Vec::new())].into_iter().collect()]),
        ..RouteSpec::new(HttpMethod::Get, "/pet")
    }];
    let err = DocumentBuilder::default()
        .build(
            &RootOptions::default(),
            &RequestFacts::default(),
            &SchemaSet::new(),
            &routes,
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Assembly);
    assert_eq!(err.path(), Some("/paths/~1pet/get/security/0/missing"));
}

#[test]
fn test_manifest_to_document() {
    let manifest = load_yaml(
        r#"
options:
  info: { title: Swagger Petstore, version: 1.0.0 }
schemas:
  Tree:
    type: object
    properties:
      value: { type: integer, required: true }
      children: { type: array, items: { ref: Tree } }
routes:
  - method: get
    path: /tree
    tags: [tree]
    responses:
      "200": { description: the whole tree, schema: { ref: Tree } }
"#,
    )
    .unwrap();

    let output = DocumentBuilder::new(manifest.config.clone())
        .build(
            &manifest.options,
            &RequestFacts::default(),
            &manifest.schemas,
            &manifest.routes,
        )
        .unwrap();
    let value = output.document.to_value().unwrap();
    assert_eq!(
        value["definitions"]["Tree"]["properties"]["children"],
        json!({ "type": "array", "items": { "$ref": "#/definitions/Tree" } })
    );
    assert_eq!(
        value["paths"]["/tree"]["get"]["responses"]["200"]["schema"],
        json!({ "$ref": "#/definitions/Tree" })
    );
}

#[test]
fn test_union_warning_surfaces() {
    let routes = vec![RouteSpec::new(HttpMethod::Get, "/id").with_response(
        "200",
        ResponseSpec::new("ok").with_schema(ValidationNode::alternatives([
            ValidationNode::integer(),
            ValidationNode::string(),
        ])),
    )];
    let output = DocumentBuilder::new(BuildConfig::default())
        .build(
            &RootOptions::default(),
            &RequestFacts::default(),
            &SchemaSet::new(),
            &routes,
        )
        .unwrap();
    assert_eq!(output.warnings.len(), 1);
    assert_eq!(output.warnings[0].path, "GET /id response 200");
}
