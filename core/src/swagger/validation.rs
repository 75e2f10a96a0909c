#![deny(missing_docs)]

//! # Document Validation
//!
//! Two checks:
//!
//! - [`validate_info`] turns the caller's info block into a complete one, or
//!   names the first missing or malformed field.
//! - [`validate_document`] is the capability-set meta validator run on every
//!   assembled document. It checks the fields the document grammar requires
//!   or types, and passes anything else (vendor extensions included) through
//!   unexamined.
//!
//! Violations found by the meta validator are reported as assembly errors
//! with a JSON Pointer to the offending node.

use crate::error::{AppError, AppResult};
use crate::swagger::document::InfoOptions;
use crate::swagger::models::Info;
use crate::swagger::ref_utils::{child_pointer, definition_key};
use serde_json::{Map, Value};
use std::collections::HashSet;
use url::Url;

const DEFAULT_TITLE: &str = "API documentation";
const DEFAULT_VERSION: &str = "0.0.1";

const METHODS: [&str; 7] = ["get", "put", "post", "delete", "options", "head", "patch"];
const LOCATIONS: [&str; 5] = ["path", "query", "header", "formData", "body"];
const SCHEMES: [&str; 4] = ["http", "https", "ws", "wss"];
const NAMED_MAPS: [&str; 5] = ["properties", "definitions", "paths", "responses", "headers"];

/// Validates the caller's info block.
///
/// An absent block yields the default title and version. A present block must
/// name both; a license must carry a name; URLs must parse.
pub fn validate_info(info: Option<&InfoOptions>) -> AppResult<Info> {
    let Some(info) = info else {
        return Ok(Info {
            title: DEFAULT_TITLE.to_string(),
            version: DEFAULT_VERSION.to_string(),
            description: None,
            terms_of_service: None,
            contact: None,
            license: None,
        });
    };

    let title = required_text(info.title.as_deref(), "title")?;
    let version = required_text(info.version.as_deref(), "version")?;

    if let Some(terms) = &info.terms_of_service {
        check_info_url(terms, "termsOfService")?;
    }
    if let Some(contact) = &info.contact {
        if let Some(url) = &contact.url {
            check_info_url(url, "contact.url")?;
        }
        if let Some(email) = &contact.email {
            if !is_valid_email(email) {
                return Err(AppError::info(
                    "contact.email",
                    format!("'{}' is not a valid email address", email),
                ));
            }
        }
    }
    if let Some(license) = &info.license {
        required_text(license.name.as_deref(), "license.name")?;
        if let Some(url) = &license.url {
            check_info_url(url, "license.url")?;
        }
    }

    Ok(Info {
        title,
        version,
        description: info.description.clone(),
        terms_of_service: info.terms_of_service.clone(),
        contact: info.contact.clone(),
        license: info.license.clone(),
    })
}

fn required_text(value: Option<&str>, field: &str) -> AppResult<String> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(AppError::info(field, "is required")),
    }
}

fn check_info_url(value: &str, field: &str) -> AppResult<()> {
    if is_valid_uri_reference(value) {
        return Ok(());
    }
    Err(AppError::info(
        field,
        format!("'{}' is not a valid URL", value),
    ))
}

fn is_valid_uri_reference(value: &str) -> bool {
    if value.trim().is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }
    if Url::parse(value).is_ok() {
        return true;
    }
    Url::parse("https://example.com")
        .and_then(|base| base.join(value))
        .is_ok()
}

fn is_valid_email(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.contains(' ') {
        return false;
    }
    match trimmed.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.contains('@'),
        None => false,
    }
}

/// Runs the capability-set checks on a serialised document.
pub fn validate_document(document: &Value) -> AppResult<()> {
    let root = as_object(document, "")?;

    match root.get("swagger").and_then(Value::as_str) {
        Some("2.0") => {}
        _ => return Err(AppError::assembly("/swagger", "must be \"2.0\"")),
    }

    let info = as_object(member(root, "info", "")?, "/info")?;
    for field in ["title", "version"] {
        member(info, field, "/info")?
            .as_str()
            .ok_or_else(|| AppError::assembly(format!("/info/{}", field), "must be a string"))?;
    }

    if let Some(host) = root.get("host") {
        validate_host(host)?;
    }
    if let Some(base_path) = root.get("basePath") {
        match base_path.as_str() {
            Some(p) if p.starts_with('/') => {}
            _ => return Err(AppError::assembly("/basePath", "must start with '/'")),
        }
    }
    if let Some(schemes) = root.get("schemes") {
        for (i, scheme) in as_array(schemes, "/schemes")?.iter().enumerate() {
            if !scheme.as_str().is_some_and(|s| SCHEMES.contains(&s)) {
                return Err(AppError::assembly(
                    format!("/schemes/{}", i),
                    format!("must be one of {}", SCHEMES.join(", ")),
                ));
            }
        }
    }
    for key in ["consumes", "produces"] {
        if let Some(list) = root.get(key) {
            string_list(list, &format!("/{}", key))?;
        }
    }

    validate_tags(root)?;
    if let Some(docs) = root.get("externalDocs") {
        validate_external_docs(docs, "/externalDocs")?;
    }

    let schemes = validate_security_definitions(root)?;
    if let Some(security) = root.get("security") {
        validate_security_requirements(security, "/security", &schemes)?;
    }

    let definitions: HashSet<&str> = match root.get("definitions") {
        Some(defs) => as_object(defs, "/definitions")?
            .keys()
            .map(String::as_str)
            .collect(),
        None => HashSet::new(),
    };

    let paths = as_object(member(root, "paths", "")?, "/paths")?;
    let mut operation_ids = HashSet::new();
    for (template, item) in paths {
        let item_path = child_pointer("/paths", template);
        if !template.starts_with('/') {
            return Err(AppError::assembly(item_path, "path must start with '/'"));
        }
        for (method, operation) in as_object(item, &item_path)? {
            if is_extension(method) || method == "parameters" {
                continue;
            }
            let op_path = child_pointer(&item_path, method);
            if !METHODS.contains(&method.as_str()) {
                return Err(AppError::assembly(op_path, "unknown HTTP method"));
            }
            validate_operation(operation, &op_path, &schemes, &mut operation_ids)?;
        }
    }

    validate_refs(document, "", &definitions)
}

fn validate_host(host: &Value) -> AppResult<()> {
    let host = host
        .as_str()
        .ok_or_else(|| AppError::assembly("/host", "must be a string"))?;
    if host.is_empty() || host.contains("://") || host.contains('/') {
        return Err(AppError::assembly(
            "/host",
            format!("'{}' must be a host name without scheme or path", host),
        ));
    }
    Ok(())
}

fn validate_tags(root: &Map<String, Value>) -> AppResult<()> {
    let Some(tags) = root.get("tags") else {
        return Ok(());
    };

    let mut seen = HashSet::new();
    for (i, tag) in as_array(tags, "/tags")?.iter().enumerate() {
        let tag_path = format!("/tags/{}", i);
        let tag = as_object(tag, &tag_path)?;
        let name = member(tag, "name", &tag_path)?
            .as_str()
            .ok_or_else(|| AppError::assembly(format!("{}/name", tag_path), "must be a string"))?;
        if !seen.insert(name) {
            return Err(AppError::assembly(
                tag_path,
                format!("duplicate tag name '{}'", name),
            ));
        }
        if let Some(docs) = tag.get("externalDocs") {
            validate_external_docs(docs, &format!("{}/externalDocs", tag_path))?;
        }
    }
    Ok(())
}

fn validate_external_docs(docs: &Value, path: &str) -> AppResult<()> {
    let docs = as_object(docs, path)?;
    match member(docs, "url", path)?.as_str() {
        Some(url) if is_valid_uri_reference(url) => Ok(()),
        _ => Err(AppError::assembly(
            format!("{}/url", path),
            "must be a valid URL",
        )),
    }
}

/// Checks every security scheme and returns their names.
fn validate_security_definitions(root: &Map<String, Value>) -> AppResult<HashSet<String>> {
    let Some(definitions) = root.get("securityDefinitions") else {
        return Ok(HashSet::new());
    };

    let mut names = HashSet::new();
    for (name, scheme) in as_object(definitions, "/securityDefinitions")? {
        let path = child_pointer("/securityDefinitions", name);
        let scheme = as_object(scheme, &path)?;
        match member(scheme, "type", &path)?.as_str() {
            Some("basic") => {}
            Some("apiKey") => {
                member(scheme, "name", &path)?;
                match scheme.get("in").and_then(Value::as_str) {
                    Some("query") | Some("header") => {}
                    _ => {
                        return Err(AppError::assembly(
                            format!("{}/in", path),
                            "must be 'query' or 'header'",
                        ))
                    }
                }
            }
            Some("oauth2") => validate_oauth2(scheme, &path)?,
            _ => {
                return Err(AppError::assembly(
                    format!("{}/type", path),
                    "must be 'basic', 'apiKey' or 'oauth2'",
                ))
            }
        }
        names.insert(name.clone());
    }
    Ok(names)
}

fn validate_oauth2(scheme: &Map<String, Value>, path: &str) -> AppResult<()> {
    let (needs_authorization, needs_token) = match member(scheme, "flow", path)?.as_str() {
        Some("implicit") => (true, false),
        Some("password") | Some("application") => (false, true),
        Some("accessCode") => (true, true),
        _ => {
            return Err(AppError::assembly(
                format!("{}/flow", path),
                "must be one of implicit, password, application, accessCode",
            ))
        }
    };
    as_object(member(scheme, "scopes", path)?, &format!("{}/scopes", path))?;

    for (needed, key) in [
        (needs_authorization, "authorizationUrl"),
        (needs_token, "tokenUrl"),
    ] {
        if !needed {
            continue;
        }
        match member(scheme, key, path)?.as_str() {
            Some(url) if Url::parse(url).is_ok() => {}
            _ => {
                return Err(AppError::assembly(
                    format!("{}/{}", path, key),
                    "must be an absolute URL",
                ))
            }
        }
    }
    Ok(())
}

fn validate_security_requirements(
    security: &Value,
    path: &str,
    schemes: &HashSet<String>,
) -> AppResult<()> {
    for (i, requirement) in as_array(security, path)?.iter().enumerate() {
        let req_path = format!("{}/{}", path, i);
        for (name, scopes) in as_object(requirement, &req_path)? {
            let scope_path = child_pointer(&req_path, name);
            if !schemes.contains(name) {
                return Err(AppError::assembly(
                    scope_path,
                    format!("security scheme '{}' is not defined", name),
                ));
            }
            string_list(scopes, &scope_path)?;
        }
    }
    Ok(())
}

fn validate_operation<'d>(
    operation: &'d Value,
    path: &str,
    schemes: &HashSet<String>,
    operation_ids: &mut HashSet<&'d str>,
) -> AppResult<()> {
    let operation = as_object(operation, path)?;

    if let Some(id) = operation.get("operationId") {
        let id = id.as_str().ok_or_else(|| {
            AppError::assembly(format!("{}/operationId", path), "must be a string")
        })?;
        if !operation_ids.insert(id) {
            return Err(AppError::assembly(
                format!("{}/operationId", path),
                format!("duplicate operationId '{}'", id),
            ));
        }
    }

    for key in ["consumes", "produces"] {
        if let Some(list) = operation.get(key) {
            string_list(list, &format!("{}/{}", path, key))?;
        }
    }

    let responses_path = format!("{}/responses", path);
    let responses = as_object(member(operation, "responses", path)?, &responses_path)?;
    if responses.keys().all(|k| is_extension(k)) {
        return Err(AppError::assembly(
            responses_path,
            "must declare at least one response",
        ));
    }
    for (status, response) in responses {
        if is_extension(status) {
            continue;
        }
        let response_path = child_pointer(&responses_path, status);
        let response = as_object(response, &response_path)?;
        if !member(response, "description", &response_path)?.is_string() {
            return Err(AppError::assembly(
                format!("{}/description", response_path),
                "must be a string",
            ));
        }
    }

    if let Some(parameters) = operation.get("parameters") {
        validate_parameters(parameters, &format!("{}/parameters", path))?;
    }
    if let Some(security) = operation.get("security") {
        validate_security_requirements(security, &format!("{}/security", path), schemes)?;
    }
    Ok(())
}

fn validate_parameters(parameters: &Value, path: &str) -> AppResult<()> {
    let mut seen = HashSet::new();
    let mut body_count = 0;
    let mut has_form = false;

    for (i, parameter) in as_array(parameters, path)?.iter().enumerate() {
        let param_path = format!("{}/{}", path, i);
        let parameter = as_object(parameter, &param_path)?;
        let name = member(parameter, "name", &param_path)?
            .as_str()
            .ok_or_else(|| AppError::assembly(format!("{}/name", param_path), "must be a string"))?;
        let location = match parameter.get("in").and_then(Value::as_str) {
            Some(l) if LOCATIONS.contains(&l) => l,
            _ => {
                return Err(AppError::assembly(
                    format!("{}/in", param_path),
                    format!("must be one of {}", LOCATIONS.join(", ")),
                ))
            }
        };

        if !seen.insert((name, location)) {
            return Err(AppError::assembly(
                param_path,
                format!("duplicate parameter '{}' in {}", name, location),
            ));
        }

        match location {
            "body" => {
                body_count += 1;
                member(parameter, "schema", &param_path)?;
            }
            _ => {
                let data_type = member(parameter, "type", &param_path)?.as_str();
                if data_type == Some("file") && location != "formData" {
                    return Err(AppError::assembly(
                        format!("{}/type", param_path),
                        "'file' is only allowed in formData",
                    ));
                }
                if data_type == Some("array") {
                    member(parameter, "items", &param_path)?;
                }
                has_form |= location == "formData";
            }
        }

        if location == "path" && parameter.get("required") != Some(&Value::Bool(true)) {
            return Err(AppError::assembly(
                format!("{}/required", param_path),
                "path parameters must be required",
            ));
        }
    }

    if body_count > 1 {
        return Err(AppError::assembly(path, "at most one body parameter is allowed"));
    }
    if body_count == 1 && has_form {
        return Err(AppError::assembly(
            path,
            "body and formData parameters cannot be mixed",
        ));
    }
    Ok(())
}

/// Every `$ref` must point at an existing definition.
fn validate_refs(value: &Value, path: &str, definitions: &HashSet<&str>) -> AppResult<()> {
    walk_refs(value, path, definitions, false)
}

/// `named` marks a map keyed by user names (properties, definitions, paths,
/// responses, headers), whose keys are never keywords.
fn walk_refs(
    value: &Value,
    path: &str,
    definitions: &HashSet<&str>,
    named: bool,
) -> AppResult<()> {
    match value {
        Value::Object(map) => {
            if !named {
                if let Some(Value::String(reference)) = map.get("$ref") {
                    let resolves = definition_key(reference)
                        .is_some_and(|key| definitions.contains(key.as_str()));
                    if !resolves {
                        return Err(AppError::assembly(
                            format!("{}/$ref", path),
                            format!("'{}' does not resolve to a definition", reference),
                        ));
                    }
                }
            }
            for (key, child) in map {
                if !named && is_opaque(key) {
                    continue;
                }
                let child_named = !named && NAMED_MAPS.contains(&key.as_str());
                walk_refs(child, &child_pointer(path, key), definitions, child_named)?;
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                walk_refs(child, &format!("{}/{}", path, i), definitions, false)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// User data carried verbatim: examples, defaults, enums and extensions.
fn is_opaque(key: &str) -> bool {
    matches!(key, "example" | "default" | "enum") || is_extension(key)
}

fn is_extension(key: &str) -> bool {
    key.starts_with("x-")
}

fn member<'v>(object: &'v Map<String, Value>, key: &str, path: &str) -> AppResult<&'v Value> {
    object
        .get(key)
        .ok_or_else(|| AppError::assembly(format!("{}/{}", path, key), "is required"))
}

fn as_object<'v>(value: &'v Value, path: &str) -> AppResult<&'v Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| AppError::assembly(path, "must be an object"))
}

fn as_array<'v>(value: &'v Value, path: &str) -> AppResult<&'v Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| AppError::assembly(path, "must be an array"))
}

fn string_list(value: &Value, path: &str) -> AppResult<()> {
    for (i, entry) in as_array(value, path)?.iter().enumerate() {
        if !entry.is_string() {
            return Err(AppError::assembly(
                format!("{}/{}", path, i),
                "must be a string",
            ));
        }
    }
    Ok(())
}
