use crate::error::{ParseError, RecordError};
use crate::models::NormalizedRecord;
use crate::scrapers::nested::{self, Hop};
use serde_json::Value;
use tracing::{debug, error, warn};

/// Key chain from the hydration root down to the listing array
pub const LISTINGS_PATH: [&str; 4] = ["props", "pageProps", "searchResult", "properties"];

pub const DESCRIPTION_LIMIT: usize = 150;

const MAP_LINK_PREFIX: &str = "https://www.google.com/maps?q=";

/// Flattens hydration payloads into `NormalizedRecord`s
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordNormalizer;

impl RecordNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Records for every listing that could be flattened.
    /// Parse failures and per-listing failures are logged, never raised.
    pub fn normalize(&self, raw: &str) -> Vec<NormalizedRecord> {
        let listings = match parse_listings(raw) {
            Ok(listings) => listings,
            Err(e) => {
                error!("Error parsing listing payload: {}", e);
                return Vec::new();
            }
        };

        let mut records = Vec::with_capacity(listings.len());
        for (index, listing) in listings.iter().enumerate() {
            match normalize_listing(listing) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping listing {}: {}", index, e),
            }
        }

        debug!("Normalized {}/{} listings", records.len(), listings.len());
        records
    }
}

/// The raw listing array inside a hydration payload
pub fn parse_listings(raw: &str) -> Result<Vec<Value>, ParseError> {
    let mut root: Value = serde_json::from_str(raw)?;
    let path = LISTINGS_PATH.join(".");

    let mut current = &mut root;
    for key in LISTINGS_PATH {
        current = current
            .as_object_mut()
            .and_then(|map| map.get_mut(key))
            .ok_or_else(|| ParseError::MissingPath { path: path.clone() })?;
    }

    match current.take() {
        Value::Array(items) => Ok(items),
        _ => Err(ParseError::NotAnArray { path }),
    }
}

/// Flatten one raw listing
pub fn normalize_listing(listing: &Value) -> Result<NormalizedRecord, RecordError> {
    if !listing.is_object() {
        return Err(RecordError::NotAnObject);
    }

    Ok(NormalizedRecord {
        id: nested::text_at(listing, &["id"]),
        title: nested::text_at(listing, &["title"]),
        property_type: nested::text_at(listing, &["property_type"]),
        price: price(listing)?,
        bedrooms: nested::text_at(listing, &["bedrooms"]),
        bathrooms: nested::text_at(listing, &["bathrooms"]),
        size: size(listing)?,
        furnished: nested::text_at(listing, &["furnished"]),
        listed_date: nested::text_at(listing, &["listed_date"]),
        rera_id: nested::text_at(listing, &["rera"]),
        location: nested::text_at(listing, &["location", "full_name"]),
        map_link: map_link(listing),
        listing_url: nested::text_at(listing, &["share_url"]),
        image_url: nested::get_path(
            listing,
            &[Hop::Key("images"), Hop::Index(0), Hop::Key("medium")],
        )
        .and_then(nested::text),
        agent_name: nested::text_at(listing, &["agent", "name"]),
        agent_email: nested::text_at(listing, &["agent", "email"]),
        super_agent: nested::get(listing, &["agent", "is_super_agent"]).and_then(Value::as_bool),
        broker_name: nested::text_at(listing, &["broker", "name"]),
        broker_email: nested::text_at(listing, &["broker", "email"]),
        broker_phone: nested::text_at(listing, &["broker", "phone"]),
        description: nested::get(listing, &["description"])
            .and_then(nested::text)
            .map(|d| join_description(&d)),
    })
}

/// `"{value} {currency} / {period}"`; every key must exist
fn price(listing: &Value) -> Result<String, RecordError> {
    let price = nested::get(listing, &["price"])
        .ok_or_else(|| RecordError::MissingField("price".to_string()))?;

    let value = required(price, "price", "value")?;
    let currency = required(price, "price", "currency")?;
    let period = required(price, "price", "period")?;
    Ok(format!("{} {} / {}", value, currency, period))
}

/// `"{value} {unit}"` when size is present at all
fn size(listing: &Value) -> Result<Option<String>, RecordError> {
    let Some(size) = listing.get("size").filter(|v| nested::is_truthy(v)) else {
        return Ok(None);
    };

    let value = required(size, "size", "value")?;
    let unit = required(size, "size", "unit")?;
    Ok(Some(format!("{} {}", value, unit)))
}

/// Present-but-null keys render as `None`, absent keys fail the listing
fn required(parent: &Value, parent_name: &str, key: &str) -> Result<String, RecordError> {
    parent
        .as_object()
        .and_then(|map| map.get(key))
        .map(|v| nested::display_or_none(Some(v)))
        .ok_or_else(|| RecordError::MissingField(format!("{}.{}", parent_name, key)))
}

/// Coordinates are not checked; missing parts show up as `None`
fn map_link(listing: &Value) -> String {
    let coordinates = nested::get(listing, &["location", "coordinates"]);
    let lat = coordinates.and_then(|c| nested::get(c, &["lat"]));
    let lon = coordinates.and_then(|c| nested::get(c, &["lon"]));
    format!(
        "{}{},{}",
        MAP_LINK_PREFIX,
        nested::display_or_none(lat),
        nested::display_or_none(lon)
    )
}

/// Single-line description: bullets stripped, lines joined with ", ",
/// cut to `DESCRIPTION_LIMIT` chars. The ellipsis depends on the length of
/// the original text, not the joined one.
pub fn join_description(description: &str) -> String {
    let joined = split_lines(description)
        .into_iter()
        .map(|line| line.trim_matches(|c| c == '-' || c == ' ').trim())
        .collect::<Vec<_>>()
        .join(", ");

    let mut out: String = joined.trim().chars().take(DESCRIPTION_LIMIT).collect();
    if description.chars().count() > DESCRIPTION_LIMIT {
        out.push_str("...");
    }
    out
}

fn is_line_boundary(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0b}' | '\u{0c}' | '\u{1c}' | '\u{1d}' | '\u{1e}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Lines without terminators; CRLF counts as one boundary and a trailing
/// terminator does not start an empty line
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_line_boundary(c) {
            continue;
        }
        lines.push(&text[start..i]);
        let mut end = i + c.len_utf8();
        if c == '\r' {
            if let Some(&(_, '\n')) = chars.peek() {
                chars.next();
                end += 1;
            }
        }
        start = end;
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(listings: Value) -> String {
        json!({"props": {"pageProps": {"searchResult": {"properties": listings}}}}).to_string()
    }

    fn full_listing() -> Value {
        json!({
            "id": "7781234",
            "title": "Spacious 2BR | Marina View",
            "property_type": "Apartment",
            "price": {"value": 125000, "currency": "AED", "period": "yearly"},
            "bedrooms": "2",
            "bathrooms": 3,
            "size": {"value": 1400, "unit": "sqft"},
            "furnished": "YES",
            "listed_date": "2024-05-01T10:00:00Z",
            "rera": "714523",
            "location": {
                "full_name": "Dubai Marina, Dubai",
                "coordinates": {"lat": 25.0805, "lon": 55.1403}
            },
            "share_url": "https://www.propertyfinder.ae/en/plp/rent/7781234",
            "images": [{"medium": "https://img/1.jpg"}, {"medium": "https://img/2.jpg"}],
            "agent": {"name": "Sara", "email": "sara@agency.ae", "is_super_agent": true},
            "broker": {"name": "Agency LLC", "email": "info@agency.ae", "phone": "+97140000000"},
            "description": "- Sea view\n- Balcony\n- Close to metro"
        })
    }

    #[test]
    fn test_full_listing_is_flattened() {
        let record = normalize_listing(&full_listing()).unwrap();

        assert_eq!(record.id.as_deref(), Some("7781234"));
        assert_eq!(record.price, "125000 AED / yearly");
        assert_eq!(record.bathrooms.as_deref(), Some("3"));
        assert_eq!(record.size.as_deref(), Some("1400 sqft"));
        assert_eq!(record.location.as_deref(), Some("Dubai Marina, Dubai"));
        assert_eq!(record.map_link, "https://www.google.com/maps?q=25.0805,55.1403");
        assert_eq!(record.image_url.as_deref(), Some("https://img/1.jpg"));
        assert_eq!(record.super_agent, Some(true));
        assert_eq!(record.broker_phone.as_deref(), Some("+97140000000"));
        assert_eq!(
            record.description.as_deref(),
            Some("Sea view, Balcony, Close to metro")
        );
    }

    #[test]
    fn test_minimal_listing_keeps_optional_fields_absent() {
        let listing = json!({
            "price": {"value": 900, "currency": "QAR", "period": "monthly"},
            "location": null,
            "images": [],
            "agent": null
        });
        let record = normalize_listing(&listing).unwrap();

        assert_eq!(record.price, "900 QAR / monthly");
        assert_eq!(record.id, None);
        assert_eq!(record.size, None);
        assert_eq!(record.location, None);
        assert_eq!(record.image_url, None);
        assert_eq!(record.agent_name, None);
        assert_eq!(record.super_agent, None);
        assert_eq!(record.description, None);
        assert_eq!(record.map_link, "https://www.google.com/maps?q=None,None");
    }

    #[test]
    fn test_missing_price_part_fails_listing() {
        let mut listing = full_listing();
        listing["price"].as_object_mut().unwrap().remove("period");
        assert_eq!(
            normalize_listing(&listing),
            Err(RecordError::MissingField("price.period".to_string()))
        );

        let no_price = json!({"id": 1});
        assert_eq!(
            normalize_listing(&no_price),
            Err(RecordError::MissingField("price".to_string()))
        );
    }

    #[test]
    fn test_null_price_part_renders_placeholder() {
        let mut listing = full_listing();
        listing["price"]["period"] = Value::Null;
        assert_eq!(normalize_listing(&listing).unwrap().price, "125000 AED / None");
    }

    #[test]
    fn test_empty_size_is_absent_but_partial_size_fails() {
        let mut listing = full_listing();
        listing["size"] = json!({});
        assert_eq!(normalize_listing(&listing).unwrap().size, None);

        listing["size"] = json!({"value": 80});
        assert_eq!(
            normalize_listing(&listing),
            Err(RecordError::MissingField("size.unit".to_string()))
        );
    }

    #[test]
    fn test_map_link_with_partial_coordinates() {
        let mut listing = full_listing();
        listing["location"]["coordinates"] = json!({"lat": 25.1});
        assert_eq!(
            normalize_listing(&listing).unwrap().map_link,
            "https://www.google.com/maps?q=25.1,None"
        );
    }

    #[test]
    fn test_bad_listings_are_skipped_not_fatal() {
        let raw = payload(json!([
            full_listing(),
            {"id": "no-price"},
            "not an object",
            full_listing()
        ]));

        let records = RecordNormalizer::new().normalize(&raw);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_output_length_matches_listings_with_price() {
        let mut listings = Vec::new();
        for i in 0..20 {
            let mut listing = full_listing();
            if i % 4 == 0 {
                listing["price"].as_object_mut().unwrap().remove("currency");
            }
            listings.push(listing);
        }
        let records = RecordNormalizer::new().normalize(&payload(Value::Array(listings)));
        assert_eq!(records.len(), 15);
    }

    #[test]
    fn test_parse_errors_yield_no_records() {
        let normalizer = RecordNormalizer::new();
        assert!(normalizer.normalize("{not json").is_empty());
        assert!(normalizer.normalize(r#"{"props": {"pageProps": {}}}"#).is_empty());
        assert!(normalizer.normalize(&payload(json!({"a": 1}))).is_empty());

        assert!(matches!(parse_listings("[]"), Err(ParseError::MissingPath { .. })));
        assert!(matches!(
            parse_listings(&payload(Value::Null)),
            Err(ParseError::NotAnArray { .. })
        ));
    }

    #[test]
    fn test_normalize_is_repeatable() {
        let raw = payload(json!([full_listing(), full_listing()]));
        let normalizer = RecordNormalizer::new();
        assert_eq!(normalizer.normalize(&raw), normalizer.normalize(&raw));
    }

    #[test]
    fn test_short_description_is_joined_without_ellipsis() {
        let d = "  - First line  \r\n-- Second line\n\n third";
        assert_eq!(join_description(d), "First line, Second line, , third");
    }

    #[test]
    fn test_long_description_is_truncated_with_ellipsis() {
        let d = "word ".repeat(40);
        let joined = join_description(&d);
        assert!(joined.ends_with("..."));
        assert!(joined.chars().count() <= DESCRIPTION_LIMIT + 3);
        assert_eq!(joined.trim_end_matches("...").chars().count(), DESCRIPTION_LIMIT);
    }

    #[test]
    fn test_ellipsis_uses_original_length() {
        // 160 chars before joining, well under the limit after bullets are stripped
        let d = format!("{}\nshort", "-".repeat(154));
        assert_eq!(d.chars().count(), 160);
        assert_eq!(join_description(&d), ", short...");
    }

    #[test]
    fn test_joined_text_over_limit_without_ellipsis() {
        // 150 chars before joining, 198 once "\n" becomes ", "
        let d = "ab\n".repeat(50);
        assert_eq!(d.chars().count(), DESCRIPTION_LIMIT);

        let joined = join_description(&d);
        assert_eq!(joined.chars().count(), DESCRIPTION_LIMIT);
        assert!(joined.starts_with("ab, ab, "));
        assert!(!joined.ends_with("..."));
    }

    #[test]
    fn test_description_at_limit_has_no_ellipsis() {
        let d = "a".repeat(DESCRIPTION_LIMIT);
        assert_eq!(join_description(&d), d);
    }

    #[test]
    fn test_truncation_counts_chars_not_bytes() {
        let d = "é".repeat(200);
        let joined = join_description(&d);
        assert_eq!(joined.chars().count(), DESCRIPTION_LIMIT + 3);
    }

    #[test]
    fn test_split_lines_boundaries() {
        assert_eq!(split_lines("a\r\nb\rc\u{2028}d\n"), vec!["a", "b", "c", "d"]);
        assert!(split_lines("").is_empty());
        assert_eq!(split_lines("\n"), vec![""]);
    }
}
