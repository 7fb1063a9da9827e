//! Print export: a self-contained HTML document pairing each question of an
//! assignment with the student's answer (or an empty-answer placeholder).
//!
//! Structure and question texts are escaped; the answer itself is the stored
//! rich-text markup and is embedded as-is inside its answer box.

use serde_json::Value;

use crate::domain::{AssignmentDefinition, Element};
use crate::util::html_escape;

pub const NO_ANSWER_PLACEHOLDER: &str = "<p><i>Keine Antwort abgegeben.</i></p>";

const PRINT_CSS: &str = r#"
  body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif; line-height: 1.5; margin: 2em; }
  h1 { font-size: 2em; border-bottom: 2px solid #ccc; padding-bottom: 0.5em; margin-bottom: 1em; }
  h2 { font-size: 1.5em; background-color: #f0f0f0; padding: 0.5em; margin-top: 2em; border-left: 5px solid #007bff; }
  .student-label { color: #555; margin-bottom: 2em; }
  .page-section { page-break-inside: avoid; margin-bottom: 2em; }
  .question-answer-pair { margin-bottom: 1.5em; padding-left: 1em; border-left: 3px solid #e9ecef; }
  .question-text { font-weight: bold; color: #333; }
  .answer-box { padding: 10px; border: 1px solid #ddd; border-radius: 4px; margin-top: 0.5em; background-color: #f9f9f9; }
  @media print { h2 { background-color: #f0f0f0 !important; -webkit-print-color-adjust: exact; } }
"#;

/// Build the print document for one assignment. `doc` is the student's
/// submission document in the nested `{assignment: {page: {element: html}}}`
/// shape; missing paths render the placeholder.
pub fn build_print_html(
  definition: &AssignmentDefinition,
  assignment_id: &str,
  doc: &Value,
  student_label: &str,
) -> String {
  let mut body = format!(
    "<h1>{}</h1><div class=\"student-label\">{}</div><hr>",
    html_escape(&definition.assignment_title),
    html_escape(student_label)
  );

  for page in &definition.pages {
    body.push_str(&format!("<div class=\"page-section\"><h2>{}</h2>", html_escape(&page.title)));
    for element in &page.elements {
      if let Element::Quill { id, question } = element {
        let answer = doc
          .get(assignment_id)
          .and_then(|a| a.get(&page.id))
          .and_then(|p| p.get(id))
          .and_then(|v| v.as_str())
          .filter(|s| !s.is_empty())
          .unwrap_or(NO_ANSWER_PLACEHOLDER);
        body.push_str(&format!(
          "<div class=\"question-answer-pair\"><p class=\"question-text\">{}</p><div class=\"answer-box\">{}</div></div>",
          html_escape(question),
          answer
        ));
      }
    }
    body.push_str("</div>");
  }

  format!(
    "<!DOCTYPE html><html lang=\"de\"><head><meta charset=\"UTF-8\"><title>Druckansicht: {}</title><style>{}</style></head><body>{}</body></html>",
    html_escape(&definition.assignment_title),
    PRINT_CSS,
    body
  )
}
