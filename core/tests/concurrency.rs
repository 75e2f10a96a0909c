use pretty_assertions::assert_eq;
use routedoc_core::swagger::models::Scheme;
use routedoc_core::{
    DocumentBuilder, HttpMethod, RequestFacts, ResponseSpec, RootOptions, RouteSpec, SchemaSet,
    ValidationNode,
};
use std::thread;

fn routes(schemas: &mut SchemaSet) -> Vec<RouteSpec> {
    let order = schemas.declare(
        ValidationNode::object([("id", ValidationNode::integer())]).with_label("Order"),
    );
    vec![RouteSpec::new(HttpMethod::Get, "/store/order/{orderId}").with_response(
        "200",
        ResponseSpec::new("successful operation").with_schema(ValidationNode::reference(order)),
    )]
}

#[test]
fn test_concurrent_builds_do_not_share_host_or_scheme() {
    let mut schemas = SchemaSet::new();
    let routes = routes(&mut schemas);
    let builder = DocumentBuilder::default();
    let options = RootOptions::default();

    let forwarded = RequestFacts::default()
        .with_forwarded_host("api.example.com")
        .with_forwarded_proto("https")
        .with_host("10.0.0.7:8080")
        .with_protocol("http");
    let direct = RequestFacts::default()
        .with_host("localhost:3000")
        .with_protocol("http");

    let (a, b) = thread::scope(|s| {
        let a = s.spawn(|| {
            (0..50)
                .map(|_| builder.build(&options, &forwarded, &schemas, &routes).unwrap())
                .collect::<Vec<_>>()
        });
        let b = s.spawn(|| {
            (0..50)
                .map(|_| builder.build(&options, &direct, &schemas, &routes).unwrap())
                .collect::<Vec<_>>()
        });
        (a.join().unwrap(), b.join().unwrap())
    });

    for output in &a {
        assert_eq!(output.document.host.as_deref(), Some("api.example.com"));
        assert_eq!(output.document.schemes, vec![Scheme::Https]);
        assert_eq!(output.document.definitions.len(), 1);
    }
    for output in &b {
        assert_eq!(output.document.host.as_deref(), Some("localhost:3000"));
        assert_eq!(output.document.schemes, vec![Scheme::Http]);
        assert_eq!(output.document.definitions.len(), 1);
    }
}

#[test]
fn test_repeated_builds_are_identical() {
    let mut schemas = SchemaSet::new();
    let routes = routes(&mut schemas);
    let builder = DocumentBuilder::default();
    let facts = RequestFacts::default();

    let first = builder
        .build(&RootOptions::default(), &facts, &schemas, &routes)
        .unwrap();
    let second = builder
        .build(&RootOptions::default(), &facts, &schemas, &routes)
        .unwrap();
    assert_eq!(first, second);
    assert!(first.document.host.is_none());
}
