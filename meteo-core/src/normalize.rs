//! Tolerant decoding of the two upstream payloads into canonical records.
//!
//! Individual fields that are missing or mistyped fall back to a default and
//! never fail the decode. Only a document that cannot be parsed at all is
//! reported as [`WeatherError::MalformedPayload`].

use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use serde_json::{Number, Value};
use tracing::debug;

use crate::{
    error::{Feed, Result, WeatherError},
    model::{CityKey, ForecastDay, WeatherSnapshot},
};

/// Upper bound on forecast days taken for a city; extra days are dropped.
pub const MAX_FORECAST_DAYS: usize = 5;

pub const UNKNOWN_CITY: &str = "Unknown";
pub const UNAVAILABLE_DESCRIPTION: &str = "indisponibil";

/// A JSON field the "today" feed encodes either as a number or as a string.
#[derive(Debug, Clone, Copy)]
enum Lenient<'a> {
    Number(&'a Number),
    Text(&'a str),
    Absent,
}

impl<'a> Lenient<'a> {
    fn of(value: Option<&'a Value>) -> Self {
        match value {
            Some(Value::Number(n)) => Lenient::Number(n),
            Some(Value::String(s)) => Lenient::Text(s),
            _ => Lenient::Absent,
        }
    }

    fn to_f64(self) -> f64 {
        match self {
            Lenient::Number(n) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
            Lenient::Text(s) => parse_f64(s).unwrap_or(0.0),
            Lenient::Absent => 0.0,
        }
    }

    fn to_i32(self) -> i32 {
        match self {
            Lenient::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()).unwrap_or(0),
            Lenient::Text(s) => s.trim().parse().unwrap_or(0),
            Lenient::Absent => 0,
        }
    }
}

fn parse_f64(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Decode the "today" JSON feed, one snapshot per feature in feed order.
pub fn decode_snapshots(raw: &str) -> Result<Vec<WeatherSnapshot>> {
    let doc: Value =
        serde_json::from_str(raw).map_err(|e| WeatherError::malformed(Feed::Today, e))?;

    let features = doc
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| WeatherError::malformed(Feed::Today, "missing 'features' array"))?;

    let snapshots: Vec<WeatherSnapshot> = features.iter().map(decode_feature).collect();
    debug!(count = snapshots.len(), "decoded today snapshots");

    Ok(snapshots)
}

fn decode_feature(feature: &Value) -> WeatherSnapshot {
    let props = feature.get("properties");
    let field = |key: &str| props.and_then(|p| p.get(key));

    WeatherSnapshot {
        city: field("nume").and_then(Value::as_str).unwrap_or(UNKNOWN_CITY).to_string(),
        temperature: Lenient::of(field("tempe")).to_f64(),
        humidity: Lenient::of(field("umezeala")).to_i32(),
        weather_description: field("nebulozitate")
            .and_then(Value::as_str)
            .unwrap_or(UNAVAILABLE_DESCRIPTION)
            .to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DayField {
    Min,
    Max,
    Description,
}

impl DayField {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"temp_min" => Some(DayField::Min),
            b"temp_max" => Some(DayField::Max),
            b"fenomen_descriere" => Some(DayField::Description),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct DayDraft {
    date: String,
    min: Option<String>,
    max: Option<String>,
    description: Option<String>,
}

impl DayDraft {
    fn slot(&mut self, field: DayField) -> &mut Option<String> {
        match field {
            DayField::Min => &mut self.min,
            DayField::Max => &mut self.max,
            DayField::Description => &mut self.description,
        }
    }

    fn finish(self) -> ForecastDay {
        let temp = |raw: Option<String>| raw.as_deref().and_then(parse_f64).unwrap_or(0.0);

        ForecastDay {
            date: self.date,
            temperature_min: temp(self.min),
            temperature_max: temp(self.max),
            weather_description: self.description.unwrap_or_default(),
        }
    }
}

/// Walks the forecast document, tracking element depth so that only the
/// direct `prognoza` children of the first matching `localitate` are read.
#[derive(Debug)]
struct ForecastScan {
    wanted: CityKey,
    depth: usize,
    seen_root: bool,
    city_found: bool,
    city_depth: Option<usize>,
    day: Option<(usize, DayDraft)>,
    capture: Option<(usize, DayField, String)>,
    days: Vec<ForecastDay>,
}

impl ForecastScan {
    fn new(city: &str) -> Self {
        Self {
            wanted: CityKey::new(city),
            depth: 0,
            seen_root: false,
            city_found: false,
            city_depth: None,
            day: None,
            capture: None,
            days: Vec::new(),
        }
    }

    fn open(&mut self, e: &BytesStart<'_>) -> Result<()> {
        if self.depth == 0 && self.seen_root {
            return Err(WeatherError::malformed(Feed::Forecast, "more than one root element"));
        }
        self.depth += 1;
        self.seen_root = true;
        let name = e.name();
        let tag = name.as_ref();

        match (self.city_depth, self.day.as_mut()) {
            (None, _) => {
                if !self.city_found
                    && tag == b"localitate"
                    && attribute(e, "nume")?.is_some_and(|n| CityKey::new(&n) == self.wanted)
                {
                    self.city_found = true;
                    self.city_depth = Some(self.depth);
                }
            }
            (Some(city_depth), None) => {
                if self.depth == city_depth + 1
                    && tag == b"prognoza"
                    && self.days.len() < MAX_FORECAST_DAYS
                {
                    let date = attribute(e, "data")?.unwrap_or_default();
                    self.day = Some((self.depth, DayDraft { date, ..DayDraft::default() }));
                }
            }
            (Some(_), Some((day_depth, draft))) => {
                let field = DayField::from_tag(tag).filter(|_| self.depth == *day_depth + 1);
                // Only the first occurrence of each child counts.
                if let Some(field) = field {
                    if draft.slot(field).is_none() && self.capture.is_none() {
                        self.capture = Some((self.depth, field, String::new()));
                    }
                }
            }
        }

        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<()> {
        if self.depth == 0 {
            return Err(WeatherError::malformed(Feed::Forecast, "text outside the root element"));
        }
        if let Some((_, _, buf)) = &mut self.capture {
            buf.push_str(text);
        }
        Ok(())
    }

    fn close(&mut self) {
        if let Some((depth, field, value)) = self.capture.take() {
            if depth == self.depth {
                if let Some((_, draft)) = &mut self.day {
                    *draft.slot(field) = Some(value);
                }
            } else {
                self.capture = Some((depth, field, value));
            }
        }

        if self.day.as_ref().is_some_and(|(depth, _)| *depth == self.depth) {
            if let Some((_, draft)) = self.day.take() {
                self.days.push(draft.finish());
            }
        }

        if self.city_depth == Some(self.depth) {
            self.city_depth = None;
        }

        self.depth = self.depth.saturating_sub(1);
    }
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Result<Option<String>> {
    let attr = e
        .try_get_attribute(key)
        .map_err(|err| WeatherError::malformed(Feed::Forecast, err))?;

    attr.map(|a| {
        a.unescape_value()
            .map(|v| v.into_owned())
            .map_err(|err| WeatherError::malformed(Feed::Forecast, err))
    })
    .transpose()
}

/// Decode the forecast XML feed for `city` (case-insensitive exact match).
///
/// Returns at most [`MAX_FORECAST_DAYS`] days in document order, or an empty
/// list if the city is not present in the document.
pub fn decode_forecast(raw: &[u8], city: &str) -> Result<Vec<ForecastDay>> {
    let text = String::from_utf8_lossy(raw);
    let mut reader = Reader::from_str(text.strip_prefix('\u{feff}').unwrap_or(&text));
    reader.config_mut().trim_text(true);

    let mut scan = ForecastScan::new(city);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => scan.open(&e)?,
            Ok(Event::Empty(e)) => {
                scan.open(&e)?;
                scan.close();
            }
            Ok(Event::Text(e)) => {
                let value =
                    e.unescape().map_err(|err| WeatherError::malformed(Feed::Forecast, err))?;
                scan.text(&value)?;
            }
            Ok(Event::CData(e)) => scan.text(&String::from_utf8_lossy(e.as_ref()))?,
            Ok(Event::End(_)) => scan.close(),
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(WeatherError::malformed(
                    Feed::Forecast,
                    format!("{e} at byte {}", reader.error_position()),
                ));
            }
            _ => {}
        }
        buf.clear();
    }

    if !scan.seen_root {
        return Err(WeatherError::malformed(Feed::Forecast, "document has no root element"));
    }
    if scan.depth != 0 {
        return Err(WeatherError::malformed(Feed::Forecast, "unexpected end of document"));
    }

    debug!(city, found = scan.city_found, days = scan.days.len(), "decoded forecast");
    Ok(scan.days)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TODAY: &str = r#"{
        "success": true,
        "features": [
            { "properties": { "nume": "BUCURESTI", "tempe": 5.5, "umezeala": 80, "nebulozitate": "cer senin" } },
            { "properties": { "nume": "IASI", "tempe": "5.0", "umezeala": "65", "nebulozitate": "cer noros" } },
            { "properties": { "nume": "CLUJ-NAPOCA", "tempe": "n/a", "umezeala": "ridicata" } },
            { "properties": { "tempe": null, "umezeala": true, "nebulozitate": "ceata" } },
            { "properties": { "nume": "IASI", "tempe": -1, "umezeala": 70, "nebulozitate": "ninsoare" } }
        ]
    }"#;

    fn forecast_xml() -> String {
        r#"<?xml version="1.0" encoding="UTF-8"?>
<prognoza_orase>
  <localitate nume="Bucuresti">
    <prognoza data="2026-01-01"><temp_min>0</temp_min><temp_max>5</temp_max><fenomen_descriere>Cer senin</fenomen_descriere></prognoza>
    <prognoza data="2026-01-02"><temp_min>-1</temp_min><temp_max>6</temp_max><fenomen_descriere>Cer variabil</fenomen_descriere></prognoza>
  </localitate>
  <localitate nume="IASI">
    <prognoza data="2026-01-01"><temp_min>-2</temp_min><temp_max>3</temp_max><fenomen_descriere>Cer mai noros</fenomen_descriere></prognoza>
    <prognoza data="2026-01-02"><temp_min>-4</temp_min><temp_max>1</temp_max><fenomen_descriere>Ninsoare</fenomen_descriere></prognoza>
    <prognoza data="2026-01-03"><temp_min>-5</temp_min><temp_max>0</temp_max><fenomen_descriere>Cer senin</fenomen_descriere></prognoza>
    <prognoza data="2026-01-04"><temp_min>-3</temp_min><temp_max>2</temp_max><fenomen_descriere>Cer partial noros</fenomen_descriere></prognoza>
    <prognoza data="2026-01-05"><temp_min>-1</temp_min><temp_max>4</temp_max><fenomen_descriere>Ploaie</fenomen_descriere></prognoza>
    <prognoza data="2026-01-06"><temp_min>1</temp_min><temp_max>7</temp_max><fenomen_descriere>Cer senin</fenomen_descriere></prognoza>
  </localitate>
  <localitate nume="Iasi Sud">
    <prognoza data="2026-01-01"><temp_min>9</temp_min><temp_max>9</temp_max></prognoza>
  </localitate>
</prognoza_orase>"#
            .to_string()
    }

    #[test]
    fn snapshots_keep_feed_order_and_duplicates() {
        let snapshots = decode_snapshots(TODAY).unwrap();
        let cities: Vec<_> = snapshots.iter().map(|s| s.city.as_str()).collect();
        assert_eq!(cities, ["BUCURESTI", "IASI", "CLUJ-NAPOCA", "Unknown", "IASI"]);
    }

    #[test]
    fn snapshot_numeric_fields_accept_numbers_and_strings() {
        let snapshots = decode_snapshots(TODAY).unwrap();

        assert_eq!(snapshots[0].temperature, 5.5);
        assert_eq!(snapshots[0].humidity, 80);
        assert_eq!(snapshots[1].temperature, 5.0);
        assert_eq!(snapshots[1].humidity, 65);
        assert_eq!(snapshots[4].temperature, -1.0);
    }

    #[test]
    fn snapshot_undecodable_fields_default() {
        let snapshots = decode_snapshots(TODAY).unwrap();

        let cluj = &snapshots[2];
        assert_eq!(cluj.temperature, 0.0);
        assert_eq!(cluj.humidity, 0);
        assert_eq!(cluj.weather_description, UNAVAILABLE_DESCRIPTION);

        let anonymous = &snapshots[3];
        assert_eq!(anonymous.city, UNKNOWN_CITY);
        assert_eq!(anonymous.temperature, 0.0);
        assert_eq!(anonymous.humidity, 0);
        assert_eq!(anonymous.weather_description, "ceata");
    }

    #[test]
    fn snapshot_feature_without_properties_is_all_defaults() {
        let snapshots = decode_snapshots(r#"{"features":[{}]}"#).unwrap();
        assert_eq!(
            snapshots,
            vec![WeatherSnapshot {
                city: UNKNOWN_CITY.into(),
                temperature: 0.0,
                humidity: 0,
                weather_description: UNAVAILABLE_DESCRIPTION.into(),
            }]
        );
    }

    #[test]
    fn snapshot_fractional_humidity_defaults_to_zero() {
        let raw = r#"{"features":[{"properties":{"nume":"Arad","umezeala":64.5}}]}"#;
        assert_eq!(decode_snapshots(raw).unwrap()[0].humidity, 0);
    }

    #[test]
    fn snapshots_reject_unparseable_json() {
        let err = decode_snapshots("{ not json").unwrap_err();
        assert!(matches!(err, WeatherError::MalformedPayload { feed: Feed::Today, .. }));
    }

    #[test]
    fn snapshots_reject_document_without_features() {
        let err = decode_snapshots(r#"{"success":false}"#).unwrap_err();
        assert!(err.to_string().contains("features"));
    }

    #[test]
    fn forecast_city_match_is_case_insensitive() {
        let xml = forecast_xml();
        let upper = decode_forecast(xml.as_bytes(), "IASI").unwrap();
        let mixed = decode_forecast(xml.as_bytes(), "Iasi").unwrap();
        assert_eq!(upper, mixed);
        assert_eq!(upper[0].weather_description, "Cer mai noros");
    }

    #[test]
    fn forecast_match_is_exact_not_substring() {
        let days = decode_forecast(forecast_xml().as_bytes(), "Sud").unwrap();
        assert!(days.is_empty());

        let days = decode_forecast(forecast_xml().as_bytes(), "iasi sud").unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].temperature_min, 9.0);
    }

    #[test]
    fn forecast_takes_first_five_days_in_document_order() {
        let days = decode_forecast(forecast_xml().as_bytes(), "Iasi").unwrap();
        let dates: Vec<_> = days.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(
            dates,
            ["2026-01-01", "2026-01-02", "2026-01-03", "2026-01-04", "2026-01-05"]
        );
        assert_eq!(days[2].temperature_min, -5.0);
        assert_eq!(days[2].temperature_max, 0.0);
    }

    #[test]
    fn forecast_unknown_city_is_empty() {
        let days = decode_forecast(forecast_xml().as_bytes(), "Atlantis").unwrap();
        assert!(days.is_empty());
    }

    #[test]
    fn forecast_missing_day_fields_default() {
        let xml = r#"<orase><localitate nume="Arad">
            <prognoza><temp_min>abc</temp_min></prognoza>
            <prognoza data="2026-02-02"/>
        </localitate></orase>"#;
        let days = decode_forecast(xml.as_bytes(), "arad").unwrap();

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, "");
        assert_eq!(days[0].temperature_min, 0.0);
        assert_eq!(days[0].temperature_max, 0.0);
        assert_eq!(days[0].weather_description, "");
        assert_eq!(days[1].date, "2026-02-02");
    }

    #[test]
    fn forecast_uses_first_matching_city_only() {
        let xml = r#"<orase>
            <localitate nume="Deva"><prognoza data="a"><temp_max>1</temp_max></prognoza></localitate>
            <localitate nume="DEVA"><prognoza data="b"><temp_max>2</temp_max></prognoza></localitate>
        </orase>"#;
        let days = decode_forecast(xml.as_bytes(), "deva").unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].date, "a");
    }

    #[test]
    fn forecast_ignores_nested_elements_with_day_names() {
        let xml = r#"<orase><localitate nume="Sibiu">
            <extra><prognoza data="nested"/></extra>
            <prognoza data="2026-03-01"><temp_min> 2.5 </temp_min><temp_max>7</temp_max></prognoza>
        </localitate></orase>"#;
        let days = decode_forecast(xml.as_bytes(), "Sibiu").unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].date, "2026-03-01");
        assert_eq!(days[0].temperature_min, 2.5);
    }

    #[test]
    fn forecast_unescapes_entities() {
        let xml = r#"<orase><localitate nume="Ia&#537;i">
            <prognoza data="d"><fenomen_descriere>Cer senin &amp; vant</fenomen_descriere></prognoza>
        </localitate></orase>"#;
        let days = decode_forecast(xml.as_bytes(), "IAȘI").unwrap();
        assert_eq!(days[0].weather_description, "Cer senin & vant");
    }

    #[test]
    fn forecast_allows_prolog_comments_and_whitespace_around_root() {
        let xml = "<?xml version=\"1.0\"?>\n<!-- generated -->\n<orase><localitate nume=\"Arad\">\
                   <prognoza data=\"d\"/></localitate></orase>\n<!-- end -->\n";
        assert_eq!(decode_forecast(xml.as_bytes(), "Arad").unwrap().len(), 1);

        let with_bom = [b"\xef\xbb\xbf".as_slice(), xml.as_bytes()].concat();
        assert_eq!(decode_forecast(&with_bom, "Arad").unwrap().len(), 1);
    }

    #[test]
    fn forecast_rejects_broken_documents() {
        let cases = [
            "",
            "<orase><localitate nume=\"Arad\"></orase>",
            "<orase><localitate>",
            "<orase><localitate nume=\"Arad\"><prognoza data=\"d\"/></localitate></orase><orase/>",
            "<orase><localitate nume=\"Arad\"><prognoza data=\"d\"/></localitate></orase>trailing",
            "junk<orase><localitate nume=\"Arad\"><prognoza data=\"d\"/></localitate></orase>",
            "Service Unavailable<br/>",
        ];
        for xml in cases {
            let err = decode_forecast(xml.as_bytes(), "Arad").unwrap_err();
            assert!(
                matches!(err, WeatherError::MalformedPayload { feed: Feed::Forecast, .. }),
                "expected malformed payload for {xml:?}, got {err:?}"
            );
        }
    }
}
