//! Tests for the session URL codec

use super::*;
use crate::encoding::{Base64SessionEncoding, PercentEncoding};

const SAMPLE_ENCODED: &str = "oyT4SvXfQXWQEbOH54crEQ%3D%3D";
const SAMPLE_DECODED: &str = "oyT4SvXfQXWQEbOH54crEQ==";

fn sample_url() -> String {
    format!(
        "https://www.linkedin.com/sales/search/people?query=(keywords:rust)&sessionId={}",
        SAMPLE_ENCODED
    )
}

fn hyundai_request(codec: &SessionUrlCodec) -> SearchRequest {
    SearchRequest::new(
        SearchType::People,
        codec.session_token(SAMPLE_ENCODED).unwrap(),
    )
    .with_keywords("développeur")
    .with_filter(SearchFilter::new(
        FilterType::CurrentCompany,
        vec![FilterValue::included(
            "urn:li:organization:825160",
            "Hyundai Motor Company",
        )],
    ))
}

#[test]
fn test_extract_sample_token() {
    let codec = SessionUrlCodec::default();
    let token = codec.extract_session_token(&sample_url()).unwrap();

    assert_eq!(token.encoded(), SAMPLE_ENCODED);
    assert_eq!(token.decoded(), SAMPLE_DECODED);
}

#[test]
fn test_extract_token_from_any_parameter_position() {
    let codec = SessionUrlCodec::default();
    let url = format!(
        "https://www.linkedin.com/sales/search/people?sessionId={}&query=(keywords:rust)&viewAllFilters=true",
        SAMPLE_ENCODED
    );

    let token = codec.extract_session_token(&url).unwrap();
    assert_eq!(token.encoded(), SAMPLE_ENCODED);
}

#[test]
fn test_extract_decoded_token_can_be_decoded_again() {
    let codec = SessionUrlCodec::default();
    let token = codec.extract_session_token(&sample_url()).unwrap();

    assert!(!token.encoded().is_empty());
    assert_eq!(codec.decode(token.encoded()).unwrap(), token.decoded());
}

#[test]
fn test_extract_missing_session() {
    let codec = SessionUrlCodec::default();
    let err = codec
        .extract_session_token("https://www.linkedin.com/sales/search/people?query=(keywords:rust)")
        .unwrap_err();

    assert!(matches!(err, Error::MissingSession(_)));
}

#[test]
fn test_extract_empty_session_is_missing() {
    let codec = SessionUrlCodec::default();
    let err = codec
        .extract_session_token("https://www.linkedin.com/sales/search/people?query=()&sessionId=")
        .unwrap_err();

    assert!(matches!(err, Error::MissingSession(_)));
}

#[test]
fn test_extract_parameter_name_must_match_exactly() {
    let codec = SessionUrlCodec::default();
    let err = codec
        .extract_session_token("https://www.linkedin.com/sales/search/people?xsessionId=abc")
        .unwrap_err();

    assert!(matches!(err, Error::MissingSession(_)));
}

#[test]
fn test_extract_malformed_url() {
    let codec = SessionUrlCodec::default();

    let err = codec.extract_session_token("not a url").unwrap_err();
    assert!(matches!(err, Error::MalformedUrl(_)));

    let err = codec
        .extract_session_token("https://www.linkedin.com/sales/search/people")
        .unwrap_err();
    assert!(matches!(err, Error::MalformedUrl(_)));

    let err = codec
        .extract_session_token("https://www.linkedin.com/sales/search/people?")
        .unwrap_err();
    assert!(matches!(err, Error::MalformedUrl(_)));
}

#[test]
fn test_extract_bad_escape_is_decode_error() {
    let codec = SessionUrlCodec::default();
    let err = codec
        .extract_session_token("https://www.linkedin.com/sales/search/people?sessionId=abc%2")
        .unwrap_err();

    assert!(matches!(err, Error::Decode(_)));
}

#[test]
fn test_build_sample_request() {
    let codec = SessionUrlCodec::default();
    let url = codec.build_search_url(&hyundai_request(&codec)).unwrap();

    assert_eq!(
        url,
        "https://www.linkedin.com/sales/search/people?query=(filters:List((type:CURRENT_COMPANY,\
         values:List((id:urn%253Ali%253Aorganization%253A825160,text:Hyundai%2520Motor%2520Company,\
         selectionType:INCLUDED)))),keywords:d%25C3%25A9veloppeur)&sessionId=oyT4SvXfQXWQEbOH54crEQ%3D%3D"
    );
    assert!(url.contains("&sessionId=oyT4SvXfQXWQEbOH54crEQ%3D%3D"));
}

#[test]
fn test_build_then_extract_returns_same_token() {
    let codec = SessionUrlCodec::default();
    let request = hyundai_request(&codec);

    let url = codec.build_search_url(&request).unwrap();
    let token = codec.extract_session_token(&url).unwrap();

    assert_eq!(token, request.session_token);
}

#[test]
fn test_build_then_parse_preserves_request() {
    let codec = SessionUrlCodec::default();
    let request = hyundai_request(&codec).with_filter(SearchFilter::new(
        FilterType::SeniorityLevel,
        vec![
            FilterValue::included("120", "Senior"),
            FilterValue::excluded("100", "In Training"),
        ],
    ));

    let url = codec.build_search_url(&request).unwrap();
    let parsed = codec.parse_search_url(&url).unwrap();

    assert_eq!(parsed, request);
}

#[test]
fn test_round_trip_with_reserved_characters() {
    let codec = SessionUrlCodec::default();
    let token = codec.session_token("a+b/c=").unwrap();
    let request = SearchRequest::new(SearchType::Company, token)
        .with_keywords("R&D (Europe), 100% remote: yes #1")
        .with_filter(SearchFilter::new(
            FilterType::Industry,
            vec![FilterValue {
                id: None,
                text: Some("Software, IT & Services".to_string()),
                selection_type: SelectionType::Included,
            }],
        ));

    let url = codec.build_search_url(&request).unwrap();
    assert!(url.starts_with("https://www.linkedin.com/sales/search/company?"));
    assert_eq!(codec.parse_search_url(&url).unwrap(), request);
    assert_eq!(codec.extract_session_token(&url).unwrap().decoded(), "a+b/c=");
}

#[test]
fn test_build_without_filters_or_keywords() {
    let codec = SessionUrlCodec::default();
    let request = SearchRequest::new(SearchType::People, codec.session_token("abc").unwrap());

    let url = codec.build_search_url(&request).unwrap();
    assert_eq!(
        url,
        "https://www.linkedin.com/sales/search/people?query=()&sessionId=abc"
    );
    assert_eq!(codec.parse_search_url(&url).unwrap(), request);
}

#[test]
fn test_build_rejects_invalid_filter() {
    let codec = SessionUrlCodec::default();
    let request = SearchRequest::new(SearchType::People, codec.session_token("abc").unwrap())
        .with_filter(SearchFilter::new(FilterType::CurrentCompany, vec![]));

    let err = codec.build_search_url(&request).unwrap_err();
    assert!(matches!(err, Error::InvalidFilter(_)));
}

#[test]
fn test_build_with_trailing_slash_base_url() {
    let codec = SessionUrlCodec::new(&CodecConfig {
        base_url: "https://example.com/sales/search/".to_string(),
        ..CodecConfig::default()
    })
    .unwrap();
    let request = SearchRequest::new(SearchType::People, codec.session_token("abc").unwrap());

    let url = codec.build_search_url(&request).unwrap();
    assert!(url.starts_with("https://example.com/sales/search/people?"));
}

#[test]
fn test_custom_parameter_names() {
    let codec = SessionUrlCodec::new(&CodecConfig {
        session_param: "sid".to_string(),
        query_param: "q".to_string(),
        ..CodecConfig::default()
    })
    .unwrap();
    let request = hyundai_request(&codec);

    let url = codec.build_search_url(&request).unwrap();
    assert!(url.contains("?q=("));
    assert!(url.ends_with(&format!("&sid={}", SAMPLE_ENCODED)));
    assert_eq!(codec.parse_search_url(&url).unwrap(), request);
}

#[test]
fn test_parse_real_world_url() {
    let codec = SessionUrlCodec::default();
    let url = "https://www.linkedin.com/sales/search/people?query=(recentSearchParam%3A(id%3A4185640788%2CdoLogHistory%3Atrue)%2Cfilters%3AList((type%3ACURRENT_COMPANY%2Cvalues%3AList((id%3Aurn%253Ali%253Aorganization%253A825160%2Ctext%3AHyundai%2520Motor%2520Company%2CselectionType%3AINCLUDED%2Cparent%3A(id%3A0))))%2C(type%3AFIRST_NAME%2Cvalues%3AList((text%3AJean%2CselectionType%3AEXCLUDED))))%2Ckeywords%3Ad%25C3%25A9veloppeur)&sessionId=oyT4SvXfQXWQEbOH54crEQ%3D%3D&viewAllFilters=true";

    let parsed = codec.parse_search_url(url).unwrap();

    assert_eq!(parsed.search_type, SearchType::People);
    assert_eq!(parsed.keywords, "développeur");
    assert_eq!(parsed.session_token.decoded(), SAMPLE_DECODED);
    assert_eq!(parsed.filters.len(), 2);
    assert_eq!(parsed.filters[0].filter_type, FilterType::CurrentCompany);
    assert_eq!(
        parsed.filters[0].values[0],
        FilterValue::included("urn:li:organization:825160", "Hyundai Motor Company")
    );
    assert_eq!(parsed.filters[1].filter_type, FilterType::FirstName);
    assert_eq!(parsed.filters[1].values[0].id, None);
    assert_eq!(
        parsed.filters[1].values[0].selection_type,
        SelectionType::Excluded
    );
}

#[test]
fn test_parse_unknown_filter_type() {
    let codec = SessionUrlCodec::default();
    let url = "https://www.linkedin.com/sales/search/people?query=(filters:List((type:SHOE_SIZE,values:List((id:42,selectionType:INCLUDED)))))&sessionId=abc";

    let err = codec.parse_search_url(url).unwrap_err();
    assert!(matches!(err, Error::InvalidFilter(_)));
}

#[test]
fn test_parse_unknown_selection_type() {
    let codec = SessionUrlCodec::default();
    let url = "https://www.linkedin.com/sales/search/people?query=(filters:List((type:REGION,values:List((id:42,selectionType:MAYBE)))))&sessionId=abc";

    let err = codec.parse_search_url(url).unwrap_err();
    assert!(matches!(err, Error::InvalidFilter(_)));
}

#[test]
fn test_parse_unknown_search_type() {
    let codec = SessionUrlCodec::default();
    let url = "https://www.linkedin.com/sales/search/jobs?query=()&sessionId=abc";

    let err = codec.parse_search_url(url).unwrap_err();
    assert!(matches!(err, Error::InvalidSearchType(_)));
}

#[test]
fn test_parse_missing_body() {
    let codec = SessionUrlCodec::default();
    let err = codec
        .parse_search_url("https://www.linkedin.com/sales/search/people?sessionId=abc")
        .unwrap_err();

    assert!(matches!(err, Error::MalformedUrl(_)));
}

#[test]
fn test_parse_missing_session_is_reported_before_body() {
    let codec = SessionUrlCodec::default();
    let err = codec
        .parse_search_url("https://www.linkedin.com/sales/search/people?query=(keywords")
        .unwrap_err();

    assert!(matches!(err, Error::MissingSession(_)));
}

#[test]
fn test_base64_codec() {
    let codec = SessionUrlCodec::new(&CodecConfig {
        encoding: EncodingKind::Base64,
        ..CodecConfig::default()
    })
    .unwrap();

    assert_eq!(codec.encoding().name(), "base64");
    let token = codec.extract_session_token(&sample_url()).unwrap();
    assert_eq!(token.decoded(), SAMPLE_DECODED);

    let err = codec
        .extract_session_token("https://www.linkedin.com/sales/search/people?sessionId=not%2Dbase64%21")
        .unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
}

#[test]
fn test_with_encoding_overrides_strategy() {
    let codec = SessionUrlCodec::default().with_encoding(Arc::new(Base64SessionEncoding));
    assert_eq!(codec.encoding().name(), "base64");

    let codec = codec.with_encoding(Arc::new(PercentEncoding));
    assert_eq!(codec.encoding().name(), "percent");
}

#[test]
fn test_config_validation() {
    let bad_base = CodecConfig {
        base_url: "not a url".to_string(),
        ..CodecConfig::default()
    };
    assert!(matches!(SessionUrlCodec::new(&bad_base), Err(Error::Config(_))));

    let opaque_base = CodecConfig {
        base_url: "mailto:someone@example.com".to_string(),
        ..CodecConfig::default()
    };
    assert!(matches!(SessionUrlCodec::new(&opaque_base), Err(Error::Config(_))));

    let bad_param = CodecConfig {
        session_param: "session id".to_string(),
        ..CodecConfig::default()
    };
    assert!(matches!(SessionUrlCodec::new(&bad_param), Err(Error::Config(_))));

    let clashing = CodecConfig {
        session_param: "query".to_string(),
        ..CodecConfig::default()
    };
    assert!(matches!(SessionUrlCodec::new(&clashing), Err(Error::Config(_))));
}

#[test]
fn test_config_defaults_from_empty_yaml_like_json() {
    let config: CodecConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, CodecConfig::default());
    assert_eq!(config.session_param, "sessionId");
}

#[test]
fn test_codec_shared_across_threads() {
    let codec = Arc::new(SessionUrlCodec::default());
    let url = sample_url();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let codec = codec.clone();
            let url = url.clone();
            std::thread::spawn(move || codec.extract_session_token(&url).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().decoded(), SAMPLE_DECODED);
    }
}

#[test]
fn test_build_then_extract_keeps_quote_free_encoded_form() {
    let codec = SessionUrlCodec::default();

    // A literal quote would be rewritten as %27 inside the URL
    assert!(matches!(codec.session_token("ab'cd%3D"), Err(Error::Decode(_))));

    let token = codec.session_token("ab%27cd%3D").unwrap();
    assert_eq!(token.decoded(), "ab'cd=");
    let request = SearchRequest::new(SearchType::People, token.clone());
    let url = codec.build_search_url(&request).unwrap();
    assert_eq!(codec.extract_session_token(&url).unwrap(), token);
}

#[test]
fn test_extract_normalizes_literal_quote() {
    let codec = SessionUrlCodec::default();
    let token = codec
        .extract_session_token("https://www.linkedin.com/sales/search/people?sessionId=ab'cd")
        .unwrap();

    assert_eq!(token.encoded(), "ab%27cd");
    assert_eq!(token.decoded(), "ab'cd");
}

#[test]
fn test_build_rejects_empty_filter_id() {
    let codec = SessionUrlCodec::default();
    let request = SearchRequest::new(SearchType::People, codec.session_token("abc").unwrap())
        .with_filter(SearchFilter::new(
            FilterType::FirstName,
            vec![FilterValue {
                id: Some(String::new()),
                text: Some("Jean".to_string()),
                selection_type: SelectionType::Included,
            }],
        ));

    let err = codec.build_search_url(&request).unwrap_err();
    assert!(matches!(err, Error::InvalidFilter(_)));
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_token() -> impl Strategy<Value = SessionToken> {
        "\\PC{1,24}".prop_map(|decoded| {
            SessionToken::from_decoded(decoded, &PercentEncoding).unwrap()
        })
    }

    fn arb_search_type() -> impl Strategy<Value = SearchType> {
        prop_oneof![Just(SearchType::People), Just(SearchType::Company)]
    }

    fn arb_selection_type() -> impl Strategy<Value = SelectionType> {
        prop_oneof![Just(SelectionType::Included), Just(SelectionType::Excluded)]
    }

    fn arb_filter_value() -> impl Strategy<Value = FilterValue> {
        (
            proptest::option::of("\\PC{1,12}"),
            proptest::option::of("\\PC{1,12}"),
            arb_selection_type(),
        )
            .prop_filter("value needs an id or text", |(id, text, _)| {
                id.is_some() || text.is_some()
            })
            .prop_map(|(id, text, selection_type)| FilterValue {
                id,
                text,
                selection_type,
            })
    }

    fn arb_filter() -> impl Strategy<Value = SearchFilter> {
        (
            proptest::sample::select(FilterType::ALL.to_vec()),
            proptest::collection::vec(arb_filter_value(), 1..4),
        )
            .prop_map(|(filter_type, values)| SearchFilter::new(filter_type, values))
    }

    fn arb_request() -> impl Strategy<Value = SearchRequest> {
        (
            arb_search_type(),
            "\\PC{0,20}",
            proptest::collection::vec(arb_filter(), 0..3),
            arb_token(),
        )
            .prop_map(|(search_type, keywords, filters, session_token)| SearchRequest {
                search_type,
                keywords,
                filters,
                session_token,
            })
    }

    proptest! {
        #[test]
        fn decode_is_deterministic(token in arb_token()) {
            let codec = SessionUrlCodec::default();
            let first = codec.decode(token.encoded()).unwrap();
            let second = codec.decode(token.encoded()).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.as_str(), token.decoded());
        }

        #[test]
        fn build_then_extract_returns_token(request in arb_request()) {
            let codec = SessionUrlCodec::default();
            let url = codec.build_search_url(&request).unwrap();
            prop_assert_eq!(codec.extract_session_token(&url).unwrap(), request.session_token);
        }

        #[test]
        fn build_then_parse_returns_request(request in arb_request()) {
            let codec = SessionUrlCodec::default();
            let url = codec.build_search_url(&request).unwrap();
            prop_assert_eq!(codec.parse_search_url(&url).unwrap(), request);
        }

        #[test]
        fn accepted_encoded_text_survives_build(encoded in "[!-~]{1,16}") {
            let codec = SessionUrlCodec::default();
            if let Ok(token) = SessionToken::from_encoded(encoded, codec.encoding()) {
                let request = SearchRequest::new(SearchType::Company, token.clone());
                let url = codec.build_search_url(&request).unwrap();
                prop_assert_eq!(codec.extract_session_token(&url).unwrap(), token);
            }
        }
    }
}
