mod common;

use common::{OPERATIONS_JSON, StubServer, TABLE_DATA_JSON, TABLES_JSON, dead_base_url};
use ine_rs::error::{ApiError, TransportError};
use ine_rs::models::{DataQuery, Endpoint, Tip};
use ine_rs::Client;

#[test]
fn operations_are_typed() {
    let server = StubServer::start(vec![("OPERACIONES_DISPONIBLES", 200, OPERATIONS_JSON)]);
    let client = Client::with_base_url(&server.base_url);
    let ops = client.operations().unwrap();
    assert_eq!(ops.len(), 2);
    assert_eq!(ops[0].id, 25);
    assert_eq!(ops[0].code, "IPC");
    assert_eq!(server.requests(), ["/ES/OPERACIONES_DISPONIBLES"]);
}

#[test]
fn tables_of_operation() {
    let server = StubServer::start(vec![("TABLAS_OPERACION/25", 200, TABLES_JSON)]);
    let client = Client::with_base_url(&server.base_url);
    let tables = client.tables(25).unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].id, 50902);
    assert_eq!(tables[0].period_start_year.as_deref(), Some("2002"));
    assert_eq!(tables[0].period_end_year, None);
}

#[test]
fn empty_body_is_null() {
    let server = StubServer::start(vec![("TABLAS_OPERACION/1", 200, "")]);
    let client = Client::with_base_url(&server.base_url);
    assert!(client.tables(1).unwrap().is_empty());
}

#[test]
fn table_data_is_returned_raw_with_query() {
    let server = StubServer::start(vec![("DATOS_TABLA/50902", 200, TABLE_DATA_JSON)]);
    let client = Client::with_base_url(&server.base_url);
    let q = DataQuery {
        nult: Some(2),
        tip: Some(Tip::M),
        filters: vec![],
    };
    let raw = client.fetch_table_data(50902, &q).unwrap();
    assert_eq!(raw.as_array().unwrap().len(), 1);
    assert_eq!(server.requests(), ["/ES/DATOS_TABLA/50902?nult=2&tip=M"]);
}

#[test]
fn non_success_status_is_transport_error() {
    let server = StubServer::start(vec![("DATOS_TABLA/9", 503, "{}")]);
    let client = Client::with_base_url(&server.base_url);
    let err = client
        .fetch_json(Endpoint::TableData(9), &DataQuery::default())
        .unwrap_err();
    assert!(err.is_transport());
    match err {
        ApiError::Transport(TransportError::Status { status, url }) => {
            assert_eq!(status, 503);
            assert!(url.ends_with("/DATOS_TABLA/9"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn unknown_path_is_transport_error() {
    let server = StubServer::start(vec![]);
    let client = Client::with_base_url(&server.base_url);
    let err = client.operations().unwrap_err();
    assert!(matches!(
        err,
        ApiError::Transport(TransportError::Status { status: 404, .. })
    ));
}

#[test]
fn invalid_json_is_parse_error() {
    let server = StubServer::start(vec![("OPERACIONES_DISPONIBLES", 200, "[{\"Id\": 1,")]);
    let client = Client::with_base_url(&server.base_url);
    let err = client.operations().unwrap_err();
    assert!(matches!(err, ApiError::Parse { .. }));
    assert!(!err.is_transport());
}

#[test]
fn wrong_record_shape_is_parse_error() {
    let server = StubServer::start(vec![("OPERACIONES_DISPONIBLES", 200, r#"{"status":"x"}"#)]);
    let client = Client::with_base_url(&server.base_url);
    assert!(matches!(
        client.operations().unwrap_err(),
        ApiError::Parse { .. }
    ));
}

#[test]
fn refused_connection_is_network_error() {
    let client = Client::with_base_url(&dead_base_url());
    let err = client.operations().unwrap_err();
    assert!(matches!(
        err,
        ApiError::Transport(TransportError::Network { .. })
    ));
}
