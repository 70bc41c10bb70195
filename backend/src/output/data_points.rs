//! Legacy data-point output: `{"result":"success","data":[entry...]}`.

use serde_json::{json, Value};

use super::{to_json_bytes, RESULT_SUCCESS};
use crate::error::RenderResult;
use crate::models::DataPointEntry;

pub fn envelope(entries: &[DataPointEntry]) -> RenderResult<Value> {
    Ok(json!({
        "result": RESULT_SUCCESS,
        "data": serde_json::to_value(entries)?,
    }))
}

pub fn render(entries: &[DataPointEntry], pretty: bool) -> RenderResult<Vec<u8>> {
    to_json_bytes(&envelope(entries)?, pretty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResponseRow;
    use crate::transform::attacher::attach;

    fn row(prompt: &str, display_type: &str, value: &str) -> ResponseRow {
        ResponseRow {
            user: "u1".into(),
            timestamp: "2012-01-01 00:00:00".into(),
            timezone: "UTC".into(),
            survey_id: "s1".into(),
            prompt_id: prompt.into(),
            prompt_type: "number".into(),
            display_type: display_type.into(),
            display_value: value.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty() {
        let body = render(&[], false).unwrap();
        assert_eq!(String::from_utf8(body).unwrap(), r#"{"result":"success","data":[]}"#);
    }

    #[test]
    fn test_entry_layout() {
        let entries = attach(&[row("p1", "count", "3"), row("m1", "metadata", "x")]).unwrap();
        let body = String::from_utf8(render(&entries, false).unwrap()).unwrap();
        assert_eq!(
            body,
            concat!(
                r#"{"result":"success","data":[{"metadata":[{"id":"m1","type":"number","value":"x"}],"#,
                r#""label":"p1","value":3,"timestamp":"2012-01-01 00:00:00","tz":"UTC","#,
                r#""utc_timestamp":"2012-01-01 00:00:00","location_status":"unavailable","type":"count"}]}"#
            )
        );
    }
}
