//! Integration tests for the leaf types.

use kryo::io::json::{JsonReader, JsonWriter};
use kryo::io::qs::QsReader;
use kryo::types::{
    BytesType, DateType, Float64Type, IntegerType, IoType, Type, Ucs2StringType, UsvStringType,
    Types,
};
use kryo::value::{MAX_SAFE_INTEGER, MIN_SAFE_INTEGER};
use kryo::{read_or_fail, Check, Date, NormalizationForm, ReportContext, Value};

#[test]
fn test_integer_boundaries() {
    let ty = IntegerType::new();
    assert!(ty.is_valid(&Value::Float64(MAX_SAFE_INTEGER)));
    assert!(!ty.is_valid(&Value::Float64(MAX_SAFE_INTEGER + 1.0)));
    assert!(ty.is_valid(&Value::Float64(MIN_SAFE_INTEGER - 1.0)));
    assert!(!ty.is_valid(&Value::Float64(0.5)));
    assert!(!ty.is_valid(&Value::Float64(f64::NAN)));

    let mut cx = ReportContext::new();
    let id = Types::uint8().test(&mut cx, &Value::from(256)).unwrap_err();
    assert_eq!(
        cx.get(id),
        Some(&Check::Range { min: 0.0, max: 255.0, actual: 256.0 })
    );

    let byte = IntegerType::new().min(0).max(255);
    assert!(byte.is_valid(&Value::from(0)));
    assert!(byte.is_valid(&Value::from(255)));
    assert!(!byte.is_valid(&Value::from(-1)));
    assert!(!byte.is_valid(&Value::from(256)));
}

#[test]
fn test_sint54_spans_54_bits() {
    let ty = Types::sint54();
    assert!(ty.is_valid(&Value::Float64(-9_007_199_254_740_992.0)));
    assert!(ty.is_valid(&Value::Float64(MAX_SAFE_INTEGER)));
    assert!(!ty.is_valid(&Value::Float64(-9_007_199_254_740_994.0)));
    assert!(!ty.is_valid(&Value::Float64(MAX_SAFE_INTEGER + 1.0)));
    assert!(!Types::safe_integer().is_valid(&Value::Float64(MIN_SAFE_INTEGER - 1.0)));
}

#[test]
fn test_integer_reads_from_query_text() {
    let ty = Types::sint16();
    assert_eq!(
        read_or_fail(&*ty, &QsReader::parse("_=-32768")).unwrap(),
        Value::from(-32768)
    );
    assert!(read_or_fail(&*ty, &QsReader::parse("_=1e9")).is_err());
    assert!(read_or_fail(&*ty, &QsReader::parse("_=abc")).is_err());
}

#[test]
fn test_float_specials_are_opt_in() {
    let strict = Float64Type::new();
    let error = read_or_fail(&strict, &JsonReader::parse("\"NaN\"").unwrap()).unwrap_err();
    assert!(error.report().contains("#0"), "{}", error.report());
    assert!(!strict.is_valid(&Value::Float64(-0.0)));

    let lenient = Float64Type::new().allow_nan(true);
    let value = read_or_fail(&lenient, &JsonReader::parse("\"NaN\"").unwrap()).unwrap();
    assert!(lenient.equals(&value, &Value::Float64(f64::NAN)));
}

#[test]
fn test_float_order_is_total() {
    let ty = Float64Type::new().allow_nan(true).allow_infinity(true);
    let mut values = vec![
        Value::Float64(f64::NAN),
        Value::Float64(1.0),
        Value::Float64(f64::NEG_INFINITY),
        Value::Float64(f64::INFINITY),
    ];
    values.sort_by(|a, b| kryo::types::Ordered::compare(&ty, a, b));
    let sorted: Vec<f64> = values.iter().filter_map(Value::as_f64).collect();
    assert_eq!(sorted[0], f64::NEG_INFINITY);
    assert_eq!(sorted[1], 1.0);
    assert_eq!(sorted[2], f64::INFINITY);
    assert!(sorted[3].is_nan());
}

#[test]
fn test_usv_string_constraints() {
    let ty = UsvStringType::new()
        .trimmed(true)
        .lowercase(true)
        .min_len(2)
        .max_len(4);
    assert!(ty.is_valid(&Value::from("abc")));

    let mut cx = ReportContext::new();
    let id = ty.test(&mut cx, &Value::from(" ABCDE ")).unwrap_err();
    let codes: Vec<_> = cx
        .causes(id)
        .into_iter()
        .skip(1)
        .map(|cause| cx.get(cause).unwrap().code())
        .collect();
    assert_eq!(codes, vec!["Trimmed", "LowerCase", "Size"]);
}

#[test]
fn test_usv_string_normalization() {
    let decomposed = "e\u{301}";
    let ty = UsvStringType::new();
    let mut cx = ReportContext::new();
    let id = ty.test(&mut cx, &Value::from(decomposed)).unwrap_err();
    assert_eq!(
        cx.get(id),
        Some(&Check::UnicodeNormalization { form: NormalizationForm::Nfc })
    );
    let nfd = UsvStringType::new().normalization(Some(NormalizationForm::Nfd));
    assert!(nfd.is_valid(&Value::from(decomposed)));
}

#[test]
fn test_string_length_units() {
    let emoji = "\u{1F600}";
    let usv = UsvStringType::new().max_len(1);
    let ucs2 = Ucs2StringType::new().max_len(1);
    assert!(usv.is_valid(&Value::from(emoji)));
    assert!(!ucs2.is_valid(&Value::from(emoji)));
}

#[test]
fn test_string_pattern() {
    let ty = UsvStringType::new().pattern("^[a-z]+-[0-9]+$").unwrap();
    assert!(ty.is_valid(&Value::from("build-42")));
    assert!(!ty.is_valid(&Value::from("build")));
    assert!(UsvStringType::new().pattern("(").is_err());
}

#[test]
fn test_bytes_hex() {
    let ty = BytesType::new().max_length(2);
    assert_eq!(
        read_or_fail(&ty, &JsonReader::parse("\"0aff\"").unwrap()).unwrap(),
        Value::Bytes(vec![0x0a, 0xff])
    );
    assert!(read_or_fail(&ty, &JsonReader::parse("\"0AFF\"").unwrap()).is_err());
    assert!(read_or_fail(&ty, &JsonReader::parse("\"000102\"").unwrap()).is_err());
}

#[test]
fn test_date_validity_and_text() {
    let ty = DateType::new();
    assert!(!ty.is_valid(&Value::Date(Date::from_millis(f64::NAN))));
    let value = Value::Date(Date::from_millis(0.0));
    let mut writer = JsonWriter::new();
    ty.write(&mut writer, &value);
    assert_eq!(writer.into_string(), "\"1970-01-01T00:00:00.000Z\"");
    assert_eq!(
        read_or_fail(&ty, &JsonReader::parse("\"1970-01-01T00:00:00.000Z\"").unwrap()).unwrap(),
        value
    );
}
