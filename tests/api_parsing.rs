use ine_rs::models::{Operation, TableInfo};

#[test]
fn parse_operations_sample() {
    let sample = r#"
    [
      {"Id":4,"Cod_IOE":"30147","Nombre":"Estadística de Efectos de Comercio Impagados","Codigo":"EI"},
      {"Id":6,"Cod_IOE":"30211","Nombre":"Índice de Coste Laboral Armonizado","Codigo":"ICLA"},
      {"Id":7,"Nombre":"Sin código"}
    ]
    "#;
    let ops: Vec<Operation> = serde_json::from_str(sample).unwrap();
    assert_eq!(ops.len(), 3);
    assert_eq!(ops[1].id, 6);
    assert_eq!(ops[1].code, "ICLA");
    assert_eq!(ops[1].name, "Índice de Coste Laboral Armonizado");
    assert_eq!(ops[2].code, "");
}

#[test]
fn table_period_accepts_string_number_or_null() {
    let t: TableInfo = serde_json::from_str(
        r#"{"Id":1,"Nombre":"A","Anyo_Periodo_Ini":"2002","Anyo_Periodo_Fin":2024}"#,
    )
    .unwrap();
    assert_eq!(t.period_start_year.as_deref(), Some("2002"));
    assert_eq!(t.period_end_year.as_deref(), Some("2024"));
    assert_eq!(t.period(), "2002-2024");

    let t: TableInfo = serde_json::from_str(
        r#"{"Id":2,"Nombre":"B","Anyo_Periodo_Ini":null}"#,
    )
    .unwrap();
    assert_eq!(t.period_start_year, None);
    assert_eq!(t.period_end_year, None);
    assert_eq!(t.period(), "-");
}

#[test]
fn table_missing_id_fails() {
    let res = serde_json::from_str::<TableInfo>(r#"{"Nombre":"sin id"}"#);
    assert!(res.is_err());
}
