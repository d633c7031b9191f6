//! HTML fragments for lookup entries and WDS replies.
//!
//! Every piece of text that came from a user, the lookup file or WDS goes
//! through [`escape_html`] before it is interpolated, attribute values included.
//! When a reply does not have the expected shape the raw JSON is shown
//! pretty-printed instead.

use serde_json::Value;

use crate::models::ProductLookupEntry;
use crate::records::{
    data_points, display_value, first_success, str_field, success_objects, vector_label,
};

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `<pre>` block with the pretty-printed payload.
pub fn render_raw(payload: &Value) -> String {
    let pretty = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
    format!("<pre>{}</pre>", escape_html(&pretty))
}

pub fn render_error(message: &str) -> String {
    format!("<p>Error: {}</p>", escape_html(message))
}

/// Lookup result: description plus one item per vector with Copy / Use buttons.
pub fn render_vectors(entry: Option<&ProductLookupEntry>) -> String {
    let Some(entry) = entry else {
        return "<p>No match found for that Product ID.</p>".to_string();
    };

    let items: String = entry
        .vectors
        .iter()
        .map(|v| {
            let id = escape_html(&v.vector_id);
            format!(
                r#"<div class="item"><div class="flex"><strong>{id}</strong><button class="copy" data-copy="{id}">Copy</button><button class="copy" data-fill="{id}">Use</button></div><div class="small">{text}</div></div>"#,
                text = escape_html(&v.text),
            )
        })
        .collect();

    format!(
        r#"<div class="small">{}</div><div class="list">{}</div>"#,
        escape_html(&entry.description),
        items
    )
}

/// Data point table for the first successful vector in a reply.
pub fn render_vector_data(payload: &Value) -> String {
    if payload.is_null() {
        return "<p>No data.</p>".to_string();
    }

    let Some(record) = first_success(payload) else {
        return render_raw(payload);
    };
    let object = record.get("object").unwrap_or(record);

    let points = match data_points(object) {
        Some(points) if !points.is_empty() => points,
        _ => return "<p>No datapoints returned.</p>".to_string(),
    };

    let label = escape_html(&vector_label(object));
    let rows: String = points
        .iter()
        .map(|p| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                label,
                escape_html(str_field(p, "refPer")),
                escape_html(&display_value(p.get("value").unwrap_or(&Value::Null))),
            )
        })
        .collect();

    format!(
        r#"<div class="small">Vector {label} — {count} rows</div><div class="scroll"><table class="data"><thead><tr><th>Vector</th><th>RefPer</th><th>Value</th></tr></thead><tbody>{rows}</tbody></table></div>"#,
        count = points.len(),
    )
}

/// Series titles for every successful record of a `getSeriesInfoFromVector` reply.
pub fn render_series_info(payload: &Value) -> String {
    let Some(objects) = success_objects(payload) else {
        return render_raw(payload);
    };

    let html: String = objects
        .iter()
        .map(|o| {
            format!(
                r#"<div class="item"><strong>v{}</strong><div class="small">{}</div></div>"#,
                escape_html(&display_value(o.get("vectorId").unwrap_or(&Value::Null))),
                escape_html(str_field(o, "SeriesTitleEn")),
            )
        })
        .collect();

    if html.is_empty() {
        "<p>No series info.</p>".to_string()
    } else {
        html
    }
}

/// Cube titles for every successful record of a `getCubeMetadata` reply.
pub fn render_cube_metadata(payload: &Value) -> String {
    let Some(objects) = success_objects(payload) else {
        return render_raw(payload);
    };

    let html: String = objects
        .iter()
        .map(|o| {
            format!(
                r#"<div class="item"><strong>{}</strong><div class="small">{}</div></div>"#,
                escape_html(&display_value(o.get("productId").unwrap_or(&Value::Null))),
                escape_html(str_field(o, "cubeTitleEn")),
            )
        })
        .collect();

    if html.is_empty() {
        "<p>No metadata.</p>".to_string()
    } else {
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VectorRef;
    use serde_json::json;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_script_in_description_is_literal_text() {
        let entry = ProductLookupEntry {
            product_id: 1,
            description: "<script>alert(1)</script>".to_string(),
            vectors: vec![VectorRef {
                vector_id: r#"v1" onclick="x"#.to_string(),
                text: "<b>bold</b>".to_string(),
            }],
        };
        let html = render_vectors(Some(&entry));

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;"));
        assert!(html.contains(r#"data-copy="v1&quot; onclick=&quot;x""#));
    }

    #[test]
    fn test_render_vectors_without_match() {
        assert!(render_vectors(None).contains("No match found"));
    }

    #[test]
    fn test_render_vectors_has_copy_and_fill_buttons() {
        let entry = ProductLookupEntry {
            product_id: 18100004,
            description: "CPI".to_string(),
            vectors: vec![VectorRef {
                vector_id: "v41690973".to_string(),
                text: "Canada; All-items".to_string(),
            }],
        };
        let html = render_vectors(Some(&entry));
        assert!(html.contains(r#"data-copy="v41690973""#));
        assert!(html.contains(r#"data-fill="v41690973""#));
        assert!(html.contains("Canada; All-items"));
    }

    #[test]
    fn test_vector_data_table() {
        let payload = json!([{
            "status": "SUCCESS",
            "object": {
                "vectorId": 41690973,
                "vectorDataPoint": [
                    {"refPer": "2024-01-01", "value": 158.3},
                    {"refPer": "2024-02-01", "value": 158.8}
                ]
            }
        }]);
        let html = render_vector_data(&payload);
        assert!(html.contains("Vector v41690973 — 2 rows"));
        assert!(html.contains("<tr><td>v41690973</td><td>2024-01-01</td><td>158.3</td></tr>"));
    }

    #[test]
    fn test_vector_data_without_success_falls_back_to_pretty_json() {
        let payload = json!([{"status": "FAILED", "object": "<b>Vector 1 not found</b>"}]);
        let html = render_vector_data(&payload);
        assert!(html.starts_with("<pre>"));
        assert!(html.contains("&quot;status&quot;: &quot;FAILED&quot;"));
        assert!(html.contains("&lt;b&gt;Vector 1 not found&lt;/b&gt;"));
    }

    #[test]
    fn test_vector_data_odd_shapes_do_not_panic() {
        assert_eq!(render_vector_data(&Value::Null), "<p>No data.</p>");
        assert!(render_vector_data(&json!({"error": "x"})).starts_with("<pre>"));
        assert!(render_vector_data(&json!(42)).starts_with("<pre>"));
        assert_eq!(
            render_vector_data(&json!([{"status": "SUCCESS", "object": {"vectorId": 1}}])),
            "<p>No datapoints returned.</p>"
        );
        assert_eq!(
            render_vector_data(&json!([{"status": "SUCCESS", "object": {"vectorDataPoint": 3}}])),
            "<p>No datapoints returned.</p>"
        );
    }

    #[test]
    fn test_vector_data_accepts_bare_object_and_vector_data_key() {
        let bare = json!({"object": {"vectorId": 7, "vectorDataPoint": [{"refPer": "2020", "value": null}]}});
        assert!(render_vector_data(&bare).contains("<td>v7</td><td>2020</td><td>null</td>"));

        let alt = json!([{"status": "SUCCESS", "object": {"vectorData": [{"refPer": "2021", "value": "1.5"}]}}]);
        let html = render_vector_data(&alt);
        assert!(html.contains("<td></td><td>2021</td><td>1.5</td>"));
    }

    #[test]
    fn test_series_info() {
        let payload = json!([
            {"status": "SUCCESS", "object": {"vectorId": 41690973, "SeriesTitleEn": "Canada;All-items"}},
            {"status": "FAILED", "object": "nope"}
        ]);
        let html = render_series_info(&payload);
        assert!(html.contains("<strong>v41690973</strong>"));
        assert!(html.contains("Canada;All-items"));
        assert_eq!(render_series_info(&json!([])), "<p>No series info.</p>");
        assert!(render_series_info(&json!({"error": "x"})).starts_with("<pre>"));
    }

    #[test]
    fn test_cube_metadata() {
        let payload = json!([{"status": "SUCCESS", "object": {"productId": "18100004", "cubeTitleEn": "Consumer Price Index"}}]);
        let html = render_cube_metadata(&payload);
        assert!(html.contains("<strong>18100004</strong>"));
        assert!(html.contains("Consumer Price Index"));
        assert_eq!(
            render_cube_metadata(&json!([{"status": "FAILED"}])),
            "<p>No metadata.</p>"
        );
    }

    #[test]
    fn test_render_error_escapes() {
        assert_eq!(render_error("<boom>"), "<p>Error: &lt;boom&gt;</p>");
    }
}
