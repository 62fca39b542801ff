//! query command - run a select and print its rows

use anyhow::Result;
use colonnade_cluster::RowSet;
use colored::Colorize;
use serde_json::Value;

use super::{query_params, CommandContext};
use crate::utils::{format_value, render_table};

pub async fn execute(ctx: &CommandContext, sql: &str, params: Vec<(String, Value)>) -> Result<()> {
    let client = ctx.client()?;
    let rows = client.select(sql, &query_params(params)).await?;

    if ctx.is_json() {
        println!("{}", render_json(rows)?);
    } else {
        println!("{}", render(&rows));
    }

    Ok(())
}

/// Rows as a pretty-printed JSON array
fn render_json(rows: RowSet) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&rows.into_rows())
}

fn render(rows: &RowSet) -> String {
    let Some(first) = rows.first() else {
        return "Empty set".dimmed().to_string();
    };

    let columns: Vec<&str> = first.keys().map(String::as_str).collect();
    let cells: Vec<Vec<String>> = rows
        .rows()
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| row.get(*column).map(format_value).unwrap_or_default())
                .collect()
        })
        .collect();

    format!(
        "{}\n{} row(s)",
        render_table(&columns, &cells),
        rows.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_rows() {
        let rows: Vec<_> = [json!({"id": 1, "name": "a"}), json!({"id": 2, "name": null})]
            .into_iter()
            .filter_map(|v| v.as_object().cloned())
            .collect();

        let out = render(&RowSet::new(rows));
        assert!(out.contains("| id | name |"));
        assert!(out.contains("| 2  | NULL |"));
        assert!(out.ends_with("2 row(s)"));
    }

    #[test]
    fn test_render_json_array() {
        let rows: Vec<_> = [json!({"id": 1}), json!({"id": 2})]
            .into_iter()
            .filter_map(|v| v.as_object().cloned())
            .collect();

        let out = render_json(RowSet::new(rows)).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, json!([{"id": 1}, {"id": 2}]));
        assert_eq!(render_json(RowSet::default()).unwrap(), "[]");
    }

    #[test]
    fn test_render_empty() {
        colored::control::set_override(false);
        assert_eq!(render(&RowSet::default()), "Empty set");
    }
}
