use x12_convert::{Error, EventCollector, JsonTreeSink, StructureEvent, X12Converter};
use x12_schema::{SchemaRegistry, loader};

const ISA: &str = "ISA*00*          *00*          *ZZ*SENDER         \
     *ZZ*RECEIVER       *240101*1200*^*00501*000000001*0*P*:~";

const CLAIM_SCHEMA: &str = r#"
transaction_sets:
  - id: "837"
    convention: 005010X222A1
    segments:
      - id: BHT
    loops:
      - id: 2000A
        repetition: -1
        start_segment: HL
        loops:
          - id: 2010AA
            start_segment: NM1
            start_qualifier: "41"
"#;

fn registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    for ts in loader::from_yaml(CLAIM_SCHEMA).unwrap() {
        registry.register(ts);
    }
    registry
}

fn claim_interchange() -> String {
    format!(
        "{}GS*HC*SENDER*RECEIVER*20240101*1200*1*X*005010X222A1~\
         ST*837*0001*005010X222A1~\
         BHT*0019*00*X*20240101*1200*CH~\
         HL*1**20*1~\
         NM1*41*2*FIRST~\
         HL*2**20*1~\
         NM1*41*2*SECOND~\
         SE*8*0001~\
         GE*1*1~\
         IEA*1*000000001~",
        ISA
    )
}

/// Re-encode a logical stream as fixed 133-column CR/LF records
fn wrap133(logical: &str) -> String {
    let mut out = String::new();
    for chunk in logical.as_bytes().chunks(80) {
        out.push_str(std::str::from_utf8(chunk).unwrap());
        for _ in chunk.len()..133 {
            out.push(' ');
        }
        out.push_str("\r\n");
    }
    out
}

fn scope_trace(events: &[StructureEvent]) -> Vec<String> {
    events
        .iter()
        .map(|e| match e {
            StructureEvent::OpenScope { name } => format!("+{}", name),
            StructureEvent::CloseScope => "-".to_string(),
            StructureEvent::Segment { id, .. } => id.clone(),
        })
        .collect()
}

#[test]
fn converts_two_hl_groups_into_sibling_loops() {
    let registry = registry();
    let converter = X12Converter::with_registry(&registry);
    let mut sink = EventCollector::new();

    converter
        .convert(claim_interchange().as_bytes(), &mut sink)
        .unwrap();

    assert_eq!(
        scope_trace(sink.events()),
        [
            "+InterchangeControl",
            "ISA",
            "+FunctionalGroup",
            "GS",
            "+TransactionSet",
            "ST",
            "BHT",
            "+2000A",
            "HL",
            "+2010AA",
            "NM1",
            "-",
            "-",
            "+2000A",
            "HL",
            "+2010AA",
            "NM1",
            "-",
            "-",
            "SE",
            "-",
            "GE",
            "-",
            "IEA",
            "-",
        ]
    );
    assert_eq!(sink.depth(), 0);
    assert_eq!(sink.open_count(), sink.close_count());
}

#[test]
fn wrapped_input_converts_identically() {
    let registry = registry();
    let converter = X12Converter::with_registry(&registry);

    let mut plain = EventCollector::new();
    converter
        .convert(claim_interchange().as_bytes(), &mut plain)
        .unwrap();

    let wrapped = wrap133(&claim_interchange());
    let mut padded = EventCollector::new();
    converter
        .convert(wrapped.as_bytes(), &mut padded)
        .unwrap();

    assert_eq!(plain.events(), padded.events());
}

#[test]
fn transactions_without_a_schema_pass_through_flat() {
    let converter = X12Converter::new();
    let mut sink = EventCollector::new();

    converter
        .convert(claim_interchange().as_bytes(), &mut sink)
        .unwrap();

    assert_eq!(
        scope_trace(sink.events()),
        [
            "+InterchangeControl",
            "ISA",
            "+FunctionalGroup",
            "GS",
            "+TransactionSet",
            "ST",
            "BHT",
            "HL",
            "NM1",
            "HL",
            "NM1",
            "SE",
            "-",
            "GE",
            "-",
            "IEA",
            "-",
        ]
    );
    assert_eq!(sink.depth(), 0);
}

#[test]
fn trailing_data_after_the_trailer_is_not_consumed() {
    let registry = registry();
    let converter = X12Converter::with_registry(&registry);
    let mut sink = EventCollector::new();

    // A second interchange follows the first trailer
    let input = format!("{}{}", claim_interchange(), claim_interchange());
    converter.convert(input.as_bytes(), &mut sink).unwrap();

    let isa_count = sink
        .events()
        .iter()
        .filter(|e| matches!(e, StructureEvent::Segment { id, .. } if id == "ISA"))
        .count();
    assert_eq!(isa_count, 1);
    assert_eq!(sink.depth(), 0);
}

#[test]
fn early_end_of_input_still_balances_the_event_stream() {
    let registry = registry();
    let converter = X12Converter::with_registry(&registry);
    let mut sink = EventCollector::new();

    let input = format!(
        "{}GS*HC*SENDER*RECEIVER*20240101*1200*1*X*005010X222A1~\
         ST*837*0001*005010X222A1~\
         HL*1**20*1~\
         NM1*41*2*ONLY~",
        ISA
    );
    converter.convert(input.as_bytes(), &mut sink).unwrap();

    assert_eq!(sink.depth(), 0);
    assert_eq!(sink.open_count(), sink.close_count());
    assert_eq!(sink.open_count(), 5);
}

#[test]
fn envelope_sequencing_violations_are_rejected() {
    let converter = X12Converter::new();

    // ST directly inside the interchange, no GS
    let input = format!("{}ST*837*0001~SE*2*0001~IEA*1*000000001~", ISA);
    let mut sink = EventCollector::new();
    match converter.convert(input.as_bytes(), &mut sink) {
        Err(Error::UnexpectedSegment { id, .. }) => assert_eq!(id, "ST"),
        other => panic!("expected UnexpectedSegment, got {:?}", other),
    }

    // Detail segment outside any transaction
    let input = format!(
        "{}GS*HC*S*R*20240101*1200*1*X*005010~CLM*1*100~",
        ISA
    );
    let mut sink = EventCollector::new();
    match converter.convert(input.as_bytes(), &mut sink) {
        Err(Error::UnexpectedSegment { id, .. }) => assert_eq!(id, "CLM"),
        other => panic!("expected UnexpectedSegment, got {:?}", other),
    }
}

#[test]
fn transaction_start_without_an_id_is_rejected() {
    let converter = X12Converter::new();
    let input = format!(
        "{}GS*HC*S*R*20240101*1200*1*X*005010~ST~",
        ISA
    );
    let mut sink = EventCollector::new();
    assert!(matches!(
        converter.convert(input.as_bytes(), &mut sink),
        Err(Error::MalformedTransactionStart)
    ));
}

#[test]
fn truncated_segment_surfaces_a_stream_error() {
    let converter = X12Converter::new();
    let input = format!("{}GS*HC*S*R", ISA);
    let mut sink = EventCollector::new();
    assert!(matches!(
        converter.convert(input.as_bytes(), &mut sink),
        Err(Error::Stream(x12_stream::Error::IncompleteSegment))
    ));
}

#[test]
fn acknowledgment_segments_stay_at_interchange_level() {
    let converter = X12Converter::new();
    let input = format!("{}TA1*000000001*240101*1200*A*000~IEA*0*000000001~", ISA);
    let mut sink = EventCollector::new();
    converter.convert(input.as_bytes(), &mut sink).unwrap();

    assert_eq!(
        scope_trace(sink.events()),
        ["+InterchangeControl", "ISA", "TA1", "IEA", "-"]
    );
}

#[test]
fn json_sink_builds_the_full_document() {
    let registry = registry();
    let converter = X12Converter::with_registry(&registry);
    let mut sink = JsonTreeSink::new();

    converter
        .convert(claim_interchange().as_bytes(), &mut sink)
        .unwrap();
    let doc = sink.finish();

    assert_eq!(doc["loop"], "InterchangeControl");
    assert_eq!(doc["children"][0]["segment"], "ISA");
    let group = &doc["children"][1];
    assert_eq!(group["loop"], "FunctionalGroup");
    let transaction = &group["children"][1];
    assert_eq!(transaction["loop"], "TransactionSet");
    // ST, BHT, two sibling 2000A loops, SE
    assert_eq!(transaction["children"][2]["loop"], "2000A");
    assert_eq!(transaction["children"][3]["loop"], "2000A");
    assert_eq!(
        transaction["children"][2]["children"][1]["loop"],
        "2010AA"
    );
    assert_eq!(transaction["children"][4]["segment"], "SE");
}
