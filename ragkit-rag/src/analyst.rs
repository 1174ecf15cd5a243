//! A two-step data-analyst loop over a comma-separated table.
//!
//! The model is shown a goal and a preview of the table and picks one
//! [`AnalystTool`] by replying with JSON such as `{"action": "summary"}`. The
//! tool runs locally on the [`DataTable`], its observation is appended to the
//! state, and the model then writes a short report from that state.
//!
//! Cells are split on commas without quote handling.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{RagError, Result};
use crate::generation::GenerationProvider;
use crate::prompt::csv_preview;
use crate::retriever::validate_query;

/// A header row plus string cells, parsed from comma-separated text.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Descriptive statistics of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` with fewer than two values.
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}

impl DataTable {
    /// Parse `text`. Blank lines are skipped; the first remaining line is
    /// the header.
    ///
    /// # Errors
    ///
    /// [`RagError::EmptyCorpus`] if there is no header or no data row.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines().filter(|line| !line.trim().is_empty());
        let headers = lines.next().map(split_cells).ok_or(RagError::EmptyCorpus)?;
        let rows: Vec<Vec<String>> = lines.map(split_cells).collect();
        if rows.is_empty() {
            return Err(RagError::EmptyCorpus);
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Columns whose non-empty cells all parse as numbers, with their values
    /// by row (`None` for empty or missing cells).
    fn numeric_columns(&self) -> Vec<(&str, Vec<Option<f64>>)> {
        self.headers
            .iter()
            .enumerate()
            .filter_map(|(col, name)| {
                let mut values = Vec::with_capacity(self.rows.len());
                for row in &self.rows {
                    match row.get(col).map(|cell| cell.as_str()).filter(|c| !c.is_empty()) {
                        None => values.push(None),
                        Some(cell) => values.push(Some(cell.parse::<f64>().ok()?)),
                    }
                }
                values.iter().any(Option::is_some).then_some((name.as_str(), values))
            })
            .collect()
    }

    /// Count, mean, standard deviation and range of every numeric column.
    pub fn summary(&self) -> Vec<ColumnSummary> {
        self.numeric_columns()
            .into_iter()
            .map(|(column, values)| {
                let values: Vec<f64> = values.into_iter().flatten().collect();
                let count = values.len();
                let mean = values.iter().sum::<f64>() / count as f64;
                let std = (count > 1).then(|| {
                    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                        / (count - 1) as f64;
                    var.sqrt()
                });
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                ColumnSummary { column: column.to_string(), count, mean, std, min, max }
            })
            .collect()
    }

    /// Pearson correlation of every pair of numeric columns, over the rows
    /// where both cells are present. `None` when it is undefined.
    pub fn correlation(&self) -> Vec<(String, String, Option<f64>)> {
        let columns = self.numeric_columns();
        let mut pairs = Vec::new();
        for (i, (a, xs)) in columns.iter().enumerate() {
            for (b, ys) in &columns[i + 1..] {
                let paired: Vec<(f64, f64)> =
                    xs.iter().zip(ys).filter_map(|(x, y)| Some(((*x)?, (*y)?))).collect();
                pairs.push((a.to_string(), b.to_string(), pearson(&paired)));
            }
        }
        pairs
    }

    /// Run `tool` and render its result as text for the model.
    pub fn observe(&self, tool: AnalystTool) -> String {
        match tool {
            AnalystTool::Summary => {
                let summary = self.summary();
                if summary.is_empty() {
                    return "No numeric columns.".to_string();
                }
                summary
                    .iter()
                    .map(|s| {
                        format!(
                            "{}: count={} mean={:.4} std={} min={} max={}",
                            s.column,
                            s.count,
                            s.mean,
                            s.std.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}")),
                            s.min,
                            s.max
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            AnalystTool::Correlation => {
                let pairs = self.correlation();
                if pairs.is_empty() {
                    return "Fewer than two numeric columns.".to_string();
                }
                pairs
                    .iter()
                    .map(|(a, b, r)| {
                        let r = r.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"));
                        format!("{a} ~ {b}: {r}")
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
    }
}

fn split_cells(line: &str) -> Vec<String> {
    line.split(',').map(|cell| cell.trim().to_string()).collect()
}

fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }
    let denominator = (var_x * var_y).sqrt();
    (denominator > 0.0).then(|| cov / denominator)
}

/// A local analysis the model can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalystTool {
    Summary,
    Correlation,
}

#[derive(Deserialize)]
struct ActionReply {
    action: AnalystTool,
}

/// Decode the model's `{"action": "..."}` reply, tolerating a Markdown code
/// fence or prose around the JSON object. `None` for unknown actions.
pub fn parse_action(reply: &str) -> Option<AnalystTool> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str::<ActionReply>(&reply[start..=end]).ok().map(|r| r.action)
}

/// The outcome of one [`DataAnalyst::run`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalystReport {
    /// The model's raw action reply.
    pub decision: String,
    /// The tool that ran, if the reply named a known one.
    pub tool: Option<AnalystTool>,
    pub observation: String,
    /// The final report written by the model.
    pub report: String,
}

/// Lets a [`GenerationProvider`] pick an analysis of a table and explain it.
///
/// # Example
///
/// ```rust,ignore
/// let analyst = DataAnalyst::new(Arc::new(GeminiClient::from_env()?));
/// let table = DataTable::parse(&std::fs::read_to_string("sales.csv")?)?;
/// let outcome = analyst.run(&table, "Provide insights about the sales dataset.").await?;
/// println!("{}", outcome.report);
/// ```
pub struct DataAnalyst {
    generator: Arc<dyn GenerationProvider>,
    preview_rows: usize,
}

impl DataAnalyst {
    pub fn new(generator: Arc<dyn GenerationProvider>) -> Self {
        Self { generator, preview_rows: 5 }
    }

    /// Data rows shown to the model when it picks an action.
    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    /// Ask for an action, run it, and ask for a report on the result.
    ///
    /// # Errors
    ///
    /// [`RagError::EmptyQuery`] for a blank goal, before any provider call.
    /// Generation failures propagate unchanged. An unknown action is not an
    /// error; it is reported to the model as the observation.
    pub async fn run(&self, table: &DataTable, goal: &str) -> Result<AnalystReport> {
        validate_query(goal)?;

        let preview = csv_preview(&table.to_string(), self.preview_rows);
        let mut state = format!("Goal: {}\nData preview:\n{preview}", goal.trim());

        let decision = self.generator.generate(&decision_prompt(&state)).await?;
        let tool = parse_action(&decision);
        let observation = match tool {
            Some(tool) => table.observe(tool),
            None => format!("Unknown action: {}", decision.trim()),
        };
        debug!(provider = self.generator.name(), ?tool, "analyst action chosen");

        state.push_str(&format!("\nExecuted: {}\nObservation:\n{observation}", decision.trim()));
        let report = self.generator.generate(&report_prompt(&state)).await?;

        info!(
            provider = self.generator.name(),
            ?tool,
            rows = table.row_count(),
            "analysis reported"
        );
        Ok(AnalystReport { decision, tool, observation, report })
    }
}

impl std::fmt::Display for DataTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.headers.join(","))?;
        for row in &self.rows {
            write!(f, "\n{}", row.join(","))?;
        }
        Ok(())
    }
}

fn decision_prompt(state: &str) -> String {
    format!(
        "You are a data analyst agent. Based on the task and dataset preview below, choose the \
         best next analytical action. Available actions: \"summary\" (descriptive statistics of \
         the numeric columns) and \"correlation\" (pairwise correlation of the numeric \
         columns).\n\nReturn JSON only:\n{{\"action\": \"...\"}}\n\nState:\n{state}\n"
    )
}

fn report_prompt(state: &str) -> String {
    format!(
        "You are a senior data analyst. Based on the state below, produce a short, clear \
         explanation of the insights.\n\nState:\n{state}\n"
    )
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::generation::Message;

    const SALES: &str = "region,ads,sales\nnorth,1,10\nsouth,2,20\n\neast,3,30\nwest,,25\n";

    /// Replies with queued answers and records each prompt.
    struct Scripted {
        replies: Mutex<VecDeque<&'static str>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: &[&'static str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().copied().collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GenerationProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate_chat(&self, messages: &[Message]) -> Result<String> {
            let prompt = messages.last().map(|m| m.text.clone()).unwrap_or_default();
            self.prompts.lock().unwrap().push(prompt);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .map(str::to_string)
                .ok_or_else(|| RagError::generation("scripted", "no reply queued"))
        }
    }

    #[test]
    fn parse_skips_blank_lines_and_needs_rows() {
        let table = DataTable::parse(SALES).unwrap();
        assert_eq!(table.headers(), ["region", "ads", "sales"]);
        assert_eq!(table.row_count(), 4);
        assert!(matches!(DataTable::parse("a,b\n\n"), Err(RagError::EmptyCorpus)));
        assert!(matches!(DataTable::parse(""), Err(RagError::EmptyCorpus)));
    }

    #[test]
    fn summary_covers_numeric_columns_only() {
        let summary = DataTable::parse(SALES).unwrap().summary();
        let columns: Vec<&str> = summary.iter().map(|s| s.column.as_str()).collect();
        assert_eq!(columns, ["ads", "sales"]);

        let ads = &summary[0];
        assert_eq!(ads.count, 3);
        assert!((ads.mean - 2.0).abs() < 1e-9);
        assert!((ads.std.unwrap() - 1.0).abs() < 1e-9);
        assert_eq!((ads.min, ads.max), (1.0, 3.0));
        assert_eq!(summary[1].count, 4);
    }

    #[test]
    fn correlation_pairs_rows_where_both_are_present() {
        let pairs = DataTable::parse(SALES).unwrap().correlation();
        assert_eq!(pairs.len(), 1);
        let (a, b, r) = &pairs[0];
        assert_eq!((a.as_str(), b.as_str()), ("ads", "sales"));
        assert!((r.unwrap() - 1.0).abs() < 1e-9);

        let flat = DataTable::parse("x,y\n1,5\n2,5\n").unwrap();
        assert_eq!(flat.correlation()[0].2, None);
    }

    #[test]
    fn actions_decode_from_fenced_json() {
        assert_eq!(parse_action(r#"{"action": "summary"}"#), Some(AnalystTool::Summary));
        assert_eq!(
            parse_action("```json\n{\"action\": \"correlation\"}\n```"),
            Some(AnalystTool::Correlation)
        );
        assert_eq!(parse_action(r#"{"action": "forecast"}"#), None);
        assert_eq!(parse_action("summary please"), None);
    }

    #[tokio::test]
    async fn run_feeds_the_observation_into_the_report() {
        let model = Arc::new(Scripted::new(&[
            "```json\n{\"action\": \"correlation\"}\n```",
            "Sales rise with ad spend.",
        ]));
        let analyst = DataAnalyst::new(model.clone()).with_preview_rows(2);
        let table = DataTable::parse(SALES).unwrap();

        let goal = "Provide insights about the sales dataset.";
        let outcome = analyst.run(&table, goal).await.unwrap();

        assert_eq!(outcome.tool, Some(AnalystTool::Correlation));
        assert_eq!(outcome.observation, "ads ~ sales: 1.0000");
        assert_eq!(outcome.report, "Sales rise with ad spend.");

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("region,ads,sales\nnorth,1,10\nsouth,2,20\n"));
        assert!(!prompts[0].contains("east,3,30"));
        assert!(prompts[1].contains("Observation:\nads ~ sales: 1.0000"));
    }

    #[tokio::test]
    async fn unknown_action_is_reported_not_raised() {
        let model = Arc::new(Scripted::new(&["{\"action\": \"forecast\"}", "Nothing to add."]));
        let table = DataTable::parse(SALES).unwrap();

        let outcome = DataAnalyst::new(model).run(&table, "insights").await.unwrap();

        assert_eq!(outcome.tool, None);
        assert!(outcome.observation.starts_with("Unknown action"));
    }

    #[tokio::test]
    async fn blank_goal_is_rejected_before_generation() {
        let model = Arc::new(Scripted::new(&[]));
        let table = DataTable::parse(SALES).unwrap();

        let err = DataAnalyst::new(model.clone()).run(&table, "  ").await.unwrap_err();

        assert!(matches!(err, RagError::EmptyQuery));
        assert!(model.prompts.lock().unwrap().is_empty());
    }
}
