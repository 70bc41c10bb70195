//! Column-oriented CSV.
//!
//! ```text
//! # begin metadata
//! #{"result":"success";"campaign_urn":...;"number_of_prompts":3;"number_of_surveys":2}
//! # end metadata
//! # begin prompt contexts
//! #{"urn:ohmage:prompt:id:p1":{"unit":null;"prompt_type":"number";...}}
//! # end prompt contexts
//! # begin data
//! urn:ohmage:user:id,urn:ohmage:prompt:id:p1
//! u1,3
//! u2,5
//! # end data
//! ```
//!
//! Cells are joined with plain commas. Commas inside JSON-shaped values become
//! semicolons so every data line keeps one field per column. A semicolon in
//! the original value cannot be told apart from a substituted comma.

use serde_json::{json, Map, Value};

use super::RESULT_SUCCESS;
use crate::catalog::{ColumnKey, OutputColumnSpec};
use crate::error::RenderResult;
use crate::models::{CampaignIdentity, PROMPT_TYPE_TEXT};
use crate::transform::embedded::is_json_shaped;
use crate::transform::pivot::{PivotColumn, PivotedColumns};

/// Cell token for a missing value.
pub const NA: &str = "NA";

pub const BEGIN_METADATA: &str = "# begin metadata";
pub const END_METADATA: &str = "# end metadata";
pub const BEGIN_PROMPT_CONTEXTS: &str = "# begin prompt contexts";
pub const END_PROMPT_CONTEXTS: &str = "# end prompt contexts";
pub const BEGIN_DATA: &str = "# begin data";
pub const END_DATA: &str = "# end data";

/// CSV rendering switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CsvOptions {
    /// Drop every `#` line.
    pub suppress_metadata: bool,
    /// Abbreviated header names.
    pub short_headers: bool,
}

pub fn render(
    pivoted: &PivotedColumns,
    campaign: &CampaignIdentity,
    options: CsvOptions,
) -> RenderResult<Vec<u8>> {
    let mut lines: Vec<String> = Vec::new();

    if !options.suppress_metadata {
        lines.push(BEGIN_METADATA.to_string());
        let metadata = json!({
            "result": RESULT_SUCCESS,
            "campaign_urn": campaign.urn,
            "number_of_prompts": pivoted.total_prompt_count,
            "number_of_surveys": pivoted.instance_count,
        });
        lines.push(comment_json(&metadata)?);
        lines.push(END_METADATA.to_string());

        lines.push(BEGIN_PROMPT_CONTEXTS.to_string());
        for column in &pivoted.columns {
            if let Some(context) = &column.context {
                let mut record = Map::new();
                record.insert(column.name.clone(), serde_json::to_value(context)?);
                lines.push(comment_json(&Value::Object(record))?);
            }
        }
        lines.push(END_PROMPT_CONTEXTS.to_string());

        lines.push(BEGIN_DATA.to_string());
    }

    lines.push(header_line(pivoted, options.short_headers));

    for i in 0..pivoted.instance_count {
        let cells: Vec<String> = pivoted
            .columns
            .iter()
            .map(|column| render_cell(column, column.values.get(i).unwrap_or(&Value::Null)))
            .collect();
        lines.push(cells.join(","));
    }

    if !options.suppress_metadata {
        lines.push(END_DATA.to_string());
    }

    let mut out = String::new();
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out.into_bytes())
}

fn comment_json(value: &Value) -> RenderResult<String> {
    Ok(format!("#{}", serde_json::to_string(value)?.replace(',', ";")))
}

fn header_line(pivoted: &PivotedColumns, short: bool) -> String {
    let names: Vec<String> = pivoted
        .columns
        .iter()
        .map(|c| if short { c.spec.short_name() } else { c.name.clone() })
        .collect();
    names.join(",")
}

/// Text cleaning applies to text prompts and to survey title/description.
fn is_free_text(column: &PivotColumn) -> bool {
    match &column.spec {
        OutputColumnSpec::Metadata(key) => {
            matches!(key, ColumnKey::SurveyTitle | ColumnKey::SurveyDescription)
        }
        OutputColumnSpec::Prompt(_) => column.has_prompt_type(PROMPT_TYPE_TEXT),
    }
}

/// Render one cell.
pub fn render_cell(column: &PivotColumn, value: &Value) -> String {
    match value {
        Value::Null => NA.to_string(),
        Value::String(s) if is_free_text(column) => clean_text(s),
        Value::String(s) if is_json_shaped(s) => s.replace(',', ";"),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string().replace(',', ";"),
        Value::Number(_) | Value::Bool(_) => value.to_string(),
    }
}

/// Quote free text: ASCII whitespace (vertical tab included) becomes a space
/// and `"` becomes `'`.
pub fn clean_text(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| match c {
            ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r' => ' ',
            '"' => '\'',
            other => other,
        })
        .collect();
    format!("\"{}\"", cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResponseRow;
    use crate::transform::grouper::group_instances;
    use crate::transform::pivot::pivot;

    fn row(user: &str, prompt: &str, prompt_type: &str, value: &str) -> ResponseRow {
        ResponseRow {
            user: user.into(),
            timestamp: "2012-01-01 00:00:00".into(),
            timezone: "UTC".into(),
            survey_id: "s1".into(),
            survey_title: "Daily, check-in".into(),
            prompt_id: prompt.into(),
            prompt_type: prompt_type.into(),
            display_value: value.into(),
            ..Default::default()
        }
    }

    fn pivoted(rows: &[ResponseRow], cols: &[OutputColumnSpec]) -> PivotedColumns {
        let instances = group_instances(rows).unwrap();
        pivot(&instances, cols, rows.len(), &CampaignIdentity::default()).unwrap()
    }

    fn campaign() -> CampaignIdentity {
        CampaignIdentity {
            urn: Some("urn:campaign:ca:ucla:study".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_zero_results() {
        let cols = vec![
            OutputColumnSpec::Metadata(ColumnKey::UserId),
            OutputColumnSpec::Prompt("p1".into()),
        ];
        let p = pivot(&[], &cols, 0, &CampaignIdentity::default()).unwrap();
        let body = String::from_utf8(render(&p, &campaign(), CsvOptions::default()).unwrap()).unwrap();
        let expected = concat!(
            "# begin metadata\n",
            "#{\"result\":\"success\";\"campaign_urn\":\"urn:campaign:ca:ucla:study\";\"number_of_prompts\":0;\"number_of_surveys\":0}\n",
            "# end metadata\n",
            "# begin prompt contexts\n",
            "#{\"urn:ohmage:prompt:id:p1\":{\"unit\":null;\"prompt_type\":null;\"display_type\":null;\"display_label\":null;\"choice_glossary\":null}}\n",
            "# end prompt contexts\n",
            "# begin data\n",
            "urn:ohmage:user:id,urn:ohmage:prompt:id:p1\n",
            "# end data\n",
        );
        assert_eq!(body, expected);
    }

    #[test]
    fn test_scenario_with_na() {
        let rows = vec![
            row("u1", "p1", "number", "3"),
            row("u1", "p2", "single_choice", "ok"),
            row("u2", "p1", "number", "5"),
        ];
        let cols = vec![
            OutputColumnSpec::Metadata(ColumnKey::UserId),
            OutputColumnSpec::Prompt("p1".into()),
            OutputColumnSpec::Prompt("p2".into()),
        ];
        let options = CsvOptions {
            suppress_metadata: true,
            ..Default::default()
        };
        let body = String::from_utf8(render(&pivoted(&rows, &cols), &campaign(), options).unwrap()).unwrap();
        assert_eq!(
            body,
            "urn:ohmage:user:id,urn:ohmage:prompt:id:p1,urn:ohmage:prompt:id:p2\nu1,3,ok\nu2,5,NA\n"
        );
    }

    #[test]
    fn test_json_shaped_cells_keep_column_count() {
        let mut first = row("u1", "choices", "multi_choice", "[0,1,2]");
        first.launch_context = Some(r#"{"launch_time":"2012-01-01 00:00:00","active_triggers":[]}"#.into());
        let rows = vec![first, row("u1", "note", "text", "line one\nsaid \"hi\", then left")];

        let cols = vec![
            OutputColumnSpec::Metadata(ColumnKey::UserId),
            OutputColumnSpec::Prompt("choices".into()),
            OutputColumnSpec::Prompt("note".into()),
            OutputColumnSpec::Metadata(ColumnKey::SurveyTitle),
            OutputColumnSpec::Metadata(ColumnKey::ContextLaunchContextLong),
        ];
        let body = render(&pivoted(&rows, &cols), &campaign(), CsvOptions::default()).unwrap();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .comment(Some(b'#'))
            .from_reader(body.as_slice());
        assert_eq!(reader.headers().unwrap().len(), cols.len());
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].len(), cols.len());
        assert_eq!(&records[0][1], "[0;1;2]");
        assert_eq!(&records[0][2], "line one said 'hi', then left");
        assert_eq!(&records[0][3], "Daily, check-in");
        assert!(records[0][4].contains("\"launch_time\":\"2012-01-01 00:00:00\";"));
    }

    #[test]
    fn test_short_headers() {
        let rows = vec![row("u1", "p1", "number", "3")];
        let cols = vec![
            OutputColumnSpec::Metadata(ColumnKey::ContextTimestamp),
            OutputColumnSpec::Metadata(ColumnKey::UserId),
            OutputColumnSpec::Prompt("p1".into()),
        ];
        let options = CsvOptions {
            suppress_metadata: true,
            short_headers: true,
        };
        let body = String::from_utf8(render(&pivoted(&rows, &cols), &campaign(), options).unwrap()).unwrap();
        assert!(body.starts_with("sys:timestamp,user:id,p1\n"));
    }

    #[test]
    fn test_prompt_context_line_substitution() {
        let mut r = row("u1", "p1", "single_choice", "0");
        r.choice_glossary = Some(json!({"0": {"label": "no"}, "1": {"label": "yes"}}));
        let cols = vec![OutputColumnSpec::Prompt("p1".into())];
        let body = String::from_utf8(render(&pivoted(&[r], &cols), &campaign(), CsvOptions::default()).unwrap()).unwrap();
        let context_line = body
            .lines()
            .skip_while(|l| *l != BEGIN_PROMPT_CONTEXTS)
            .nth(1)
            .unwrap();
        assert!(context_line.starts_with("#{\"urn:ohmage:prompt:id:p1\":{"));
        assert!(!context_line.contains(','));
        assert!(context_line.contains("\"choice_glossary\":{\"0\":{\"label\":\"no\"};\"1\""));
    }

    #[test]
    fn test_bracketed_text_answer_stays_on_one_line() {
        let rows = vec![
            row("u1", "note", "text", "[edit] felt fine,\nthen bad"),
            row("u1", "p1", "number", "4"),
        ];
        let cols = vec![
            OutputColumnSpec::Metadata(ColumnKey::UserId),
            OutputColumnSpec::Prompt("note".into()),
            OutputColumnSpec::Prompt("p1".into()),
        ];
        let p = pivoted(&rows, &cols);
        let options = CsvOptions {
            suppress_metadata: true,
            ..Default::default()
        };
        let body = String::from_utf8(render(&p, &campaign(), options).unwrap()).unwrap();
        assert_eq!(
            body,
            "urn:ohmage:user:id,urn:ohmage:prompt:id:note,urn:ohmage:prompt:id:p1\nu1,\"[edit] felt fine, then bad\",4\n"
        );

        let mut reader = csv::ReaderBuilder::new().from_reader(body.as_bytes());
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), p.instance_count);
        assert!(records.iter().all(|r| r.len() == cols.len()));
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("a\tb \"c\""), "\"a b 'c'\"");
        assert_eq!(clean_text("x\r\n\x0By\u{00A0}z"), "\"x   y\u{00A0}z\"");
    }
}
