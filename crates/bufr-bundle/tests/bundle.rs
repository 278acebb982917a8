use bufr_bundle::{
    BundleConfig, BundleError, BundleState, EmitOutcome, HeaderFilter, RecordOutcome, SearchKey,
    SkipReason, StreamingBundler,
};
use bufr_codec::{
    Message, MessageReader, MessageWriter, RawMessage, decode_message, encode_dataset,
};
use bufr_model::{DataSubset, Dataset, Descriptor, Section1, Template, Value};
use bufr_tables::{SchemaTable, SchemaTableCollection, TableOrigin, builtin_table};
use proptest::prelude::*;

fn desc(code: u32) -> Descriptor {
    Descriptor::from_code(code).unwrap()
}

fn collection() -> SchemaTableCollection {
    SchemaTableCollection::builder(builtin_table().unwrap()).build()
}

fn header(category: u8, version: u8) -> Section1 {
    Section1 {
        orig_centre: 54,
        data_category: category,
        master_table_version: version,
        year: 2024,
        month: 11,
        day: 5,
        hour: 6,
        ..Section1::default()
    }
}

/// Template T1: station number and temperature.
fn t1() -> Template {
    Template::new(4, vec![desc(1002), desc(12101)])
}

/// Template T2: block and station number.
fn t2() -> Template {
    Template::new(4, vec![desc(1001), desc(1002)])
}

fn t1_subset(station: i64) -> DataSubset {
    let mut subset = DataSubset::default();
    subset.push(desc(1002), Value::Integer(station));
    subset.push(desc(12101), Value::Float(280.5));
    subset
}

fn t2_subset(station: i64) -> DataSubset {
    let mut subset = DataSubset::default();
    subset.push(desc(1001), Value::Integer(6));
    subset.push(desc(1002), Value::Integer(station));
    subset
}

/// External version 13 table for T1, with its own station number width.
fn v13_table(station_width: u16) -> SchemaTable {
    let builtin = builtin_table().unwrap();
    let mut table = SchemaTable::new(13, TableOrigin::External("table_b_v13.csv".into()));
    for code in [1002, 12101] {
        let mut entry = builtin.fetch_element(desc(code)).unwrap().clone();
        if code == 1002 {
            entry.encoding.width = station_width;
        }
        table.insert_element(entry);
    }
    table
}

fn record(section1: Section1, template: Template, subsets: Vec<DataSubset>) -> RawMessage {
    record_with(&builtin_table().unwrap(), section1, template, subsets)
}

fn record_with(
    table: &SchemaTable,
    section1: Section1,
    template: Template,
    subsets: Vec<DataSubset>,
) -> RawMessage {
    let dataset = Dataset::new(section1, template).with_subsets(subsets);
    encode_dataset(&dataset, table, false).unwrap()
}

fn stream(records: &[RawMessage]) -> Vec<u8> {
    records
        .iter()
        .flat_map(|raw| raw.as_bytes().iter().copied())
        .collect()
}

/// Run the bundler over `input`, returning the outcome and the written bytes.
fn bundle(
    input: &[u8],
    config: &BundleConfig,
) -> (Result<bufr_bundle::BundleSummary, BundleError>, Vec<u8>) {
    bundle_with(&collection(), input, config)
}

fn bundle_with(
    tables: &SchemaTableCollection,
    input: &[u8],
    config: &BundleConfig,
) -> (Result<bufr_bundle::BundleSummary, BundleError>, Vec<u8>) {
    let mut reader = MessageReader::new(input);
    let mut writer = MessageWriter::new(Vec::new());
    let result = StreamingBundler::new(tables, config).run(&mut reader, &mut writer);
    (result, writer.into_inner().unwrap())
}

fn decode_output(output: &[u8]) -> Dataset {
    let table = builtin_table().unwrap();
    let mut messages: Vec<_> = MessageReader::new(output)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(messages.len(), 1, "exactly one bundle expected");
    let message = messages.remove(0).parse().unwrap();
    decode_message(&message, &table).unwrap()
}

fn stations(dataset: &Dataset) -> Vec<i64> {
    dataset
        .subsets
        .iter()
        .filter_map(|subset| subset.value_of(desc(1002)).and_then(Value::as_i64))
        .collect()
}

#[test]
fn keeps_only_the_matching_subset() {
    let input = stream(&[record(header(2, 14), t1(), vec![t1_subset(5), t1_subset(10)])]);
    let config = BundleConfig::new().with_search_key(SearchKey::new(desc(1002), "10"));

    let (result, output) = bundle(&input, &config);
    let summary = result.unwrap();
    assert_eq!(summary.stats.subsets_merged, 1);
    assert_eq!(summary.stats.subsets_rejected, 1);

    let bundle = decode_output(&output);
    assert_eq!(stations(&bundle), vec![10]);
    assert_eq!(bundle.section1, header(2, 14));
    assert_eq!(bundle.template, t1());
}

#[test]
fn records_without_a_table_are_skipped() {
    let input = stream(&[
        record(header(2, 14), t1(), vec![t1_subset(5), t1_subset(7)]),
        record(header(2, 13), t1(), vec![t1_subset(9)]),
    ]);
    let config =
        BundleConfig::new().with_header_filter(HeaderFilter::default().with_data_category(2));

    let (result, output) = bundle(&input, &config);
    let summary = result.unwrap();
    assert_eq!(summary.stats.unknown_table_versions, 1);
    assert_eq!(summary.stats.records_accepted, 1);
    assert_eq!(stations(&decode_output(&output)), vec![5, 7]);
}

#[test]
fn records_with_another_template_are_discarded() {
    let input = stream(&[
        record(header(0, 14), t1(), vec![t1_subset(1)]),
        record(header(0, 14), t2(), vec![t2_subset(2), t2_subset(3)]),
        record(header(0, 14), t1(), vec![t1_subset(4)]),
    ]);
    let (result, output) = bundle(&input, &BundleConfig::new());
    let summary = result.unwrap();
    assert_eq!(summary.stats.template_mismatches, 1);

    let bundle = decode_output(&output);
    assert_eq!(bundle.template, t1());
    assert_eq!(stations(&bundle), vec![1, 4]);
}

#[test]
fn empty_input_writes_nothing() {
    let (result, output) = bundle(&[], &BundleConfig::new());
    let summary = result.unwrap();
    assert_eq!(summary.emitted, EmitOutcome::Empty);
    assert_eq!(summary.stats.records_read, 0);
    assert!(output.is_empty());
}

#[test]
fn empty_filter_list_keeps_everything() {
    let input = stream(&[
        record(header(0, 14), t1(), vec![t1_subset(1), t1_subset(2)]),
        record(header(0, 14), t1(), vec![t1_subset(3)]),
    ]);
    let (result, output) = bundle(&input, &BundleConfig::new());
    assert_eq!(
        result.unwrap().emitted,
        EmitOutcome::Written {
            subsets: 3,
            bytes: output.len()
        }
    );
    assert_eq!(stations(&decode_output(&output)), vec![1, 2, 3]);
}

#[test]
fn no_matching_subset_writes_nothing() {
    let input = stream(&[record(header(0, 14), t1(), vec![t1_subset(1)])]);
    let config = BundleConfig::new().with_search_key(SearchKey::new(desc(1002), "99"));
    let (result, output) = bundle(&input, &config);
    assert_eq!(result.unwrap().emitted, EmitOutcome::Empty);
    assert!(output.is_empty());
}

#[test]
fn header_filter_excludes_other_centres() {
    let mut other = header(0, 14);
    other.orig_centre = 98;
    let input = stream(&[
        record(other, t1(), vec![t1_subset(1)]),
        record(header(0, 14), t1(), vec![t1_subset(2)]),
    ]);
    let config =
        BundleConfig::new().with_header_filter(HeaderFilter::default().with_orig_centre(54));
    let (result, output) = bundle(&input, &config);
    assert_eq!(result.unwrap().stats.header_mismatches, 1);
    assert_eq!(stations(&decode_output(&output)), vec![2]);
}

#[test]
fn integer_set_search_key_accepts_any_member() {
    let input = stream(&[record(
        header(0, 14),
        t1(),
        vec![t1_subset(10), t1_subset(15), t1_subset(20)],
    )]);
    let config = BundleConfig::new().with_search_key(SearchKey::new(desc(1002), "10,20"));
    let (result, output) = bundle(&input, &config);
    result.unwrap();
    assert_eq!(stations(&decode_output(&output)), vec![10, 20]);
}

#[test]
fn unresolved_search_key_matches_nothing() {
    let input = stream(&[record(header(0, 14), t1(), vec![t1_subset(1)])]);
    let config = BundleConfig::new().with_search_key(SearchKey::new(desc(55001), "1"));
    let (result, output) = bundle(&input, &config);
    assert_eq!(result.unwrap().emitted, EmitOutcome::Empty);
    assert!(output.is_empty());
}

#[test]
fn undecodable_record_is_skipped() {
    let mut broken = record(header(0, 14), t1(), vec![t1_subset(1)]).into_bytes();
    // claim more subsets than the data section holds
    let subset_count_offset = 8 + 22 + 4;
    broken[subset_count_offset + 1] = 50;
    let input = stream(&[
        RawMessage::new(broken),
        record(header(0, 14), t1(), vec![t1_subset(2)]),
    ]);

    let (result, output) = bundle(&input, &BundleConfig::new());
    assert_eq!(result.unwrap().stats.decode_failures, 1);
    assert_eq!(stations(&decode_output(&output)), vec![2]);
}

#[test]
fn compression_applies_to_multi_subset_bundles() {
    let input = stream(&[record(header(0, 14), t1(), vec![t1_subset(1), t1_subset(2)])]);
    let config = BundleConfig::new().with_compress(true);
    let (result, output) = bundle(&input, &config);
    result.unwrap();
    let bundle = decode_output(&output);
    assert!(bundle.is_compressed());
    assert_eq!(stations(&bundle), vec![1, 2]);
}

#[test]
fn truncated_stream_is_fatal() {
    let mut input = stream(&[
        record(header(0, 14), t1(), vec![t1_subset(1)]),
        record(header(0, 14), t1(), vec![t1_subset(2)]),
    ]);
    input.truncate(input.len() - 10);
    let (result, output) = bundle(&input, &BundleConfig::new());
    assert!(matches!(result, Err(BundleError::Read { record: 2, .. })));
    assert!(output.is_empty());
}

#[test]
fn process_record_reports_each_outcome() {
    let tables = collection();
    let config = BundleConfig::new().with_search_key(SearchKey::new(desc(1002), "2"));
    let mut bundler = StreamingBundler::new(&tables, &config);
    assert_eq!(bundler.state(), BundleState::Init);

    let first = record(header(0, 14), t1(), vec![t1_subset(1), t1_subset(2)]);
    assert_eq!(
        bundler.process_record(&first),
        RecordOutcome::Merged {
            matched: 1,
            total: 2
        }
    );
    assert_eq!(bundler.state(), BundleState::Streaming);

    let other = record(header(0, 14), t2(), vec![t2_subset(2)]);
    assert_eq!(
        bundler.process_record(&other),
        RecordOutcome::Skipped(SkipReason::TemplateMismatch)
    );
    assert_eq!(
        bundler.process_record(&RawMessage::new(b"BUFR".to_vec())),
        RecordOutcome::Skipped(SkipReason::Decode("truncated message: section 0".to_string()))
    );

    let mut writer = MessageWriter::new(Vec::new());
    let summary = bundler.finish(&mut writer).unwrap();
    assert_eq!(summary.stats.records_read, 3);
    assert_eq!(summary.stats.records_skipped(), 2);
    assert!(matches!(
        summary.emitted,
        EmitOutcome::Written { subsets: 1, .. }
    ));
}

#[test]
fn records_decoded_with_an_external_table_are_merged() {
    let tables = SchemaTableCollection::builder(builtin_table().unwrap())
        .with_external(vec![v13_table(10)])
        .build();
    let input = stream(&[
        record(header(0, 14), t1(), vec![t1_subset(5)]),
        record_with(&v13_table(10), header(0, 13), t1(), vec![t1_subset(7)]),
    ]);

    let (result, output) = bundle_with(&tables, &input, &BundleConfig::new());
    let summary = result.unwrap();
    assert_eq!(summary.stats.records_accepted, 2);
    assert_eq!(stations(&decode_output(&output)), vec![5, 7]);
}

#[test]
fn records_whose_table_encodes_differently_are_discarded() {
    let tables = SchemaTableCollection::builder(builtin_table().unwrap())
        .with_external(vec![v13_table(16)])
        .build();
    let input = stream(&[
        record(header(0, 14), t1(), vec![t1_subset(5)]),
        record_with(&v13_table(16), header(0, 13), t1(), vec![t1_subset(5000)]),
    ]);

    let (result, output) = bundle_with(&tables, &input, &BundleConfig::new());
    let summary = result.unwrap();
    assert_eq!(summary.stats.template_mismatches, 1);
    assert_eq!(stations(&decode_output(&output)), vec![5]);
}

#[test]
fn malformed_compressed_record_leaves_earlier_subsets_in_the_bundle() {
    let template = Template::new(4, vec![desc(1002)]);
    let mut good = DataSubset::default();
    good.push(desc(1002), Value::Integer(7));
    let malformed = Message {
        edition: 4,
        section1: header(0, 14),
        subset_count: 2,
        data_flag: Dataset::FLAG_OBSERVED | Dataset::FLAG_COMPRESSED,
        descriptors: vec![desc(1002)],
        // R0 = 1020, NBINC = 4, increments 0 and 10 on a 10-bit field
        data: vec![0xff, 0x04, 0x0a],
    }
    .to_raw()
    .unwrap();
    let input = stream(&[record(header(0, 14), template, vec![good]), malformed]);

    let (result, output) = bundle(&input, &BundleConfig::new());
    assert_eq!(result.unwrap().stats.decode_failures, 1);
    assert_eq!(stations(&decode_output(&output)), vec![7]);
}

#[test]
fn station_names_with_latin1_bytes_are_bundled_and_searchable() {
    let template = Template::new(4, vec![desc(1015)]);
    let mut subset = DataSubset::default();
    subset.push(desc(1015), Value::string("ABCDEFGHIJKLMNOPQRST"));
    let mut bytes = record(header(0, 14), template, vec![subset]).into_bytes();
    let name_at = bytes
        .windows(20)
        .position(|window| window == b"ABCDEFGHIJKLMNOPQRST")
        .unwrap();
    bytes[name_at] = 0xe9;

    let name = "\u{e9}BCDEFGHIJKLMNOPQRST";
    let config = BundleConfig::new().with_search_key(SearchKey::new(desc(1015), name));
    let (result, output) = bundle(&stream(&[RawMessage::new(bytes)]), &config);
    assert_eq!(result.unwrap().stats.subsets_merged, 1);
    assert_eq!(
        decode_output(&output).subsets[0].value_of(desc(1015)),
        Some(&Value::string(name))
    );
}

proptest! {
    #[test]
    fn output_preserves_arrival_order(
        records in prop::collection::vec(prop::collection::vec(0i64..1000, 1..5), 1..6),
        wanted in prop::collection::btree_set(0i64..1000, 0..50),
    ) {
        let raws: Vec<_> = records
            .iter()
            .map(|stations| {
                record(header(0, 14), t1(), stations.iter().copied().map(t1_subset).collect())
            })
            .collect();
        let value = wanted.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
        let config = if wanted.is_empty() {
            BundleConfig::new()
        } else {
            BundleConfig::new().with_search_key(SearchKey::new(desc(1002), value))
        };

        let expected: Vec<i64> = records
            .iter()
            .flatten()
            .copied()
            .filter(|station| wanted.is_empty() || wanted.contains(station))
            .collect();

        let (result, output) = bundle(&stream(&raws), &config);
        let summary = result.unwrap();
        if expected.is_empty() {
            prop_assert_eq!(summary.emitted, EmitOutcome::Empty);
            prop_assert!(output.is_empty());
        } else {
            prop_assert_eq!(stations(&decode_output(&output)), expected);
        }
    }
}
