//! Column-oriented JSON.
//!
//! ```text
//! {"result":"success",
//!  "metadata":{"number_of_prompts":3,"number_of_surveys":2,"items":[...]},
//!  "data":[{"urn:ohmage:user:id":{"values":["u1","u2"]}},
//!          {"urn:ohmage:prompt:id:p1":{"context":{...},"values":["3","5"]}}]}
//! ```

use serde_json::{json, Map, Value};

use super::{to_json_bytes, RESULT_SUCCESS};
use crate::error::RenderResult;
use crate::transform::pivot::{PivotColumn, PivotedColumns};

/// Build the envelope. `data` is empty when there are no instances.
pub fn envelope(pivoted: &PivotedColumns) -> RenderResult<Value> {
    let data = if pivoted.instance_count == 0 {
        Vec::new()
    } else {
        pivoted
            .columns
            .iter()
            .map(column_entry)
            .collect::<RenderResult<Vec<_>>>()?
    };

    Ok(json!({
        "result": RESULT_SUCCESS,
        "metadata": {
            "number_of_prompts": pivoted.total_prompt_count,
            "number_of_surveys": pivoted.instance_count,
            "items": pivoted.names(),
        },
        "data": data,
    }))
}

fn column_entry(column: &PivotColumn) -> RenderResult<Value> {
    let mut body = Map::new();
    if let Some(context) = &column.context {
        body.insert("context".to_string(), serde_json::to_value(context)?);
    }
    body.insert("values".to_string(), Value::Array(column.values.clone()));

    let mut entry = Map::new();
    entry.insert(column.name.clone(), Value::Object(body));
    Ok(Value::Object(entry))
}

pub fn render(pivoted: &PivotedColumns, pretty: bool) -> RenderResult<Vec<u8>> {
    to_json_bytes(&envelope(pivoted)?, pretty)
}
