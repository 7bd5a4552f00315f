//! Console output formatter for bridge diagnostics

use colored::Colorize;
use hearth_domain::RouteInfo;
use hearth_domain::jsonl::JsonObject;
use hearth_infrastructure::{ConfigSource, FileConfig};
use serde::Serialize;
use serde_json::{Value, json};
use std::path::Path;

/// Outcome of writing a chat file through a scratch file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkReport {
    pub records: usize,
    pub max_chunk_bytes: usize,
    pub chunk_sizes: Vec<usize>,
    /// Size of the scratch file as the file system saw it.
    pub file_bytes: u64,
    pub scratch_path: String,
}

impl ChunkReport {
    pub fn total_bytes(&self) -> usize {
        self.chunk_sizes.iter().sum()
    }
}

/// Formats diagnostics for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Routes in the order lookups try them.
    pub fn format_routes(routes: &[RouteInfo]) -> String {
        let mut output = Self::header("Built-in Routes");
        output.push('\n');
        for (i, route) in routes.iter().enumerate() {
            let kind = if route.pattern.is_prefix() {
                "prefix".yellow()
            } else {
                "exact".green()
            };
            output.push_str(&format!(
                "{:>3}. {:<6} {:<45} {}\n",
                i + 1,
                route.method.to_string().cyan().bold(),
                route.pattern.to_string(),
                kind
            ));
        }
        output.push_str(&format!(
            "\n{}\n",
            "Exact routes win over prefixes; the longest matching prefix wins among prefixes."
                .dimmed()
        ));
        output.push_str(&Self::footer());
        output
    }

    pub fn routes_json(routes: &[RouteInfo]) -> String {
        let routes: Vec<Value> = routes
            .iter()
            .map(|route| {
                json!({
                    "method": route.method.to_string(),
                    "pattern": route.pattern.to_string(),
                    "prefix": route.pattern.is_prefix(),
                })
            })
            .collect();
        Self::pretty(&Value::Array(routes))
    }

    /// Summary of a decoded chat file.
    pub fn format_jsonl_check(path: &Path, records: &[JsonObject]) -> String {
        let mut output = format!(
            "{} {}: {} records\n",
            "✓".green().bold(),
            path.display(),
            records.len()
        );
        if let Some(header) = records.first() {
            for (label, key) in [("User", "user_name"), ("Character", "character_name")] {
                if let Some(name) = header.get(key).and_then(Value::as_str) {
                    output.push_str(&format!("  {} {}\n", format!("{label}:").cyan(), name));
                }
            }
            output.push_str(&format!(
                "  {} {}\n",
                "Messages:".cyan(),
                records.len().saturating_sub(1)
            ));
        }
        output
    }

    pub fn jsonl_check_json(path: &Path, records: &[JsonObject]) -> String {
        Self::pretty(&json!({
            "path": path.display().to_string(),
            "valid": true,
            "records": records.len(),
            "header": records.first(),
        }))
    }

    pub fn format_chunks(report: &ChunkReport) -> String {
        let mut output = format!(
            "{} {} records in {} chunks (max {} bytes each)\n",
            "✓".green().bold(),
            report.records,
            report.chunk_sizes.len(),
            report.max_chunk_bytes
        );
        for (i, size) in report.chunk_sizes.iter().enumerate() {
            output.push_str(&format!("  {:>4}: {} bytes\n", i + 1, size));
        }
        let matches = report.total_bytes() as u64 == report.file_bytes;
        let verdict = if matches {
            "matches".green()
        } else {
            "MISMATCH".red().bold()
        };
        output.push_str(&format!(
            "{} {} ({} bytes on disk, {})\n",
            "Scratch file:".cyan(),
            report.scratch_path,
            report.file_bytes,
            verdict
        ));
        output
    }

    pub fn chunks_json(report: &ChunkReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }

    /// Where configuration came from, then the merged result.
    pub fn format_config(sources: &[ConfigSource], config: &FileConfig) -> String {
        let mut output = Self::section_header("Configuration sources (lowest priority first)");
        for source in sources {
            let mark = if source.found {
                "✓".green()
            } else {
                "-".dimmed()
            };
            let location = if source.found {
                source.location.normal()
            } else {
                format!("{} (not found)", source.location).dimmed()
            };
            output.push_str(&format!("  {} {:<10} {}\n", mark, source.label, location));
        }

        output.push_str(&Self::section_header("Effective configuration"));
        let rendered = toml::to_string_pretty(config)
            .unwrap_or_else(|e| format!("# could not render configuration: {e}\n"));
        output.push_str(&Self::indent(&rendered, "  "));
        output.push('\n');
        output
    }

    pub fn config_json(sources: &[ConfigSource], config: &FileConfig) -> String {
        let sources: Vec<Value> = sources
            .iter()
            .map(|s| json!({ "label": s.label, "location": s.location, "found": s.found }))
            .collect();
        Self::pretty(&json!({
            "sources": sources,
            "config": serde_json::to_value(config).unwrap_or(Value::Null),
        }))
    }

    /// First line of an HTTP-style response dump.
    pub fn format_status(status: u16, reason: &str, content_type: Option<&str>) -> String {
        let status_line = format!("{status} {reason}");
        let status_line = if (200..300).contains(&status) {
            status_line.green().bold()
        } else {
            status_line.red().bold()
        };
        match content_type {
            Some(ct) => format!("{} {}", status_line, ct.dimmed()),
            None => status_line.to_string(),
        }
    }

    pub fn format_error(message: &str) -> String {
        format!("{} {}", "Error:".red().bold(), message)
    }

    fn pretty(value: &Value) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_domain::{MethodMatcher, RoutePattern};
    use serde_json::Map;
    use std::path::PathBuf;

    fn object(value: Value) -> JsonObject {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn routes_list_every_route_with_its_kind() {
        let routes = vec![
            RouteInfo {
                method: MethodMatcher::Exact("GET".into()),
                pattern: RoutePattern::parse("/csrf-token"),
            },
            RouteInfo {
                method: MethodMatcher::Exact("GET".into()),
                pattern: RoutePattern::parse("/user/files/*"),
            },
        ];
        let text = ConsoleFormatter::format_routes(&routes);
        assert!(text.contains("/csrf-token"));
        assert!(text.contains("/user/files/*"));
        assert!(text.contains("prefix"));

        let parsed: Value = serde_json::from_str(&ConsoleFormatter::routes_json(&routes)).unwrap();
        assert_eq!(parsed[1]["prefix"], true);
        assert_eq!(parsed[0]["method"], "GET");
    }

    #[test]
    fn jsonl_check_names_the_chat_participants() {
        let records = vec![
            object(json!({"user_name": "User", "character_name": "Seraphina"})),
            object(json!({"mes": "hello"})),
        ];
        let text = ConsoleFormatter::format_jsonl_check(&PathBuf::from("chat.jsonl"), &records);
        assert!(text.contains("2 records"));
        assert!(text.contains("Seraphina"));

        let parsed: Value =
            serde_json::from_str(&ConsoleFormatter::jsonl_check_json(&PathBuf::from("c.jsonl"), &records))
                .unwrap();
        assert_eq!(parsed["records"], 2);
        assert_eq!(parsed["header"]["user_name"], "User");
    }

    #[test]
    fn chunk_report_flags_size_mismatches() {
        let mut report = ChunkReport {
            records: 3,
            max_chunk_bytes: 10,
            chunk_sizes: vec![10, 4],
            file_bytes: 14,
            scratch_path: "/tmp/hearth-1.jsonl".into(),
        };
        assert!(ConsoleFormatter::format_chunks(&report).contains("matches"));
        report.file_bytes = 13;
        assert!(ConsoleFormatter::format_chunks(&report).contains("MISMATCH"));
        assert_eq!(report.total_bytes(), 14);
    }

    #[test]
    fn config_shows_sources_and_sections() {
        let sources = vec![
            ConfigSource {
                label: "Default",
                location: "built-in defaults".into(),
                found: true,
            },
            ConfigSource {
                label: "Project",
                location: "./hearth.toml".into(),
                found: false,
            },
        ];
        let text = ConsoleFormatter::format_config(&sources, &FileConfig::default());
        assert!(text.contains("not found"));
        assert!(text.contains("[streaming]"));
        assert!(text.contains("flush_interval_ms = 10"));

        let parsed: Value =
            serde_json::from_str(&ConsoleFormatter::config_json(&sources, &FileConfig::default())).unwrap();
        assert_eq!(parsed["sources"][1]["found"], false);
        assert_eq!(parsed["config"]["interceptor"]["popup_poll_attempts"], 20);
    }

    #[test]
    fn indent_prefixes_each_line() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "  "), "  a\n  b");
    }
}
