use chrono::{DateTime, FixedOffset, Utc};

use crate::config::DEFAULT_TIMEZONE_LABEL;
use crate::datasources::{AcquisitionResult, Payload};

/// The report timestamp is shown at a fixed UTC+8, no DST.
const REPORT_UTC_OFFSET_SECS: i32 = 8 * 3600;

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// One block per source in configuration order, then the timestamp footer.
    pub sections: Vec<String>,
    pub generated_at: DateTime<FixedOffset>,
}

impl Report {
    pub fn render(&self) -> String {
        self.sections.join("\n\n")
    }
}

pub struct ReportComposer {
    timezone_label: String,
}

impl Default for ReportComposer {
    fn default() -> Self {
        ReportComposer::new(DEFAULT_TIMEZONE_LABEL.to_owned())
    }
}

impl ReportComposer {
    pub fn new(timezone_label: String) -> ReportComposer {
        ReportComposer { timezone_label }
    }

    pub fn compose(&self, results: &[(String, AcquisitionResult)], now: DateTime<Utc>) -> Report {
        let zone = FixedOffset::east_opt(REPORT_UTC_OFFSET_SECS).unwrap();
        let generated_at = now.with_timezone(&zone);

        let mut sections = results
            .iter()
            .map(|(title, result)| render_section(title, result))
            .collect::<Vec<_>>();
        sections.push(format!(
            "*数据更新时间: {} {}*",
            generated_at.format("%Y-%m-%d %H:%M"),
            self.timezone_label
        ));
        Report {
            sections,
            generated_at,
        }
    }
}

fn render_section(title: &str, result: &AcquisitionResult) -> String {
    let body = match result {
        Ok(Payload::Quotes(quotes)) => quotes
            .iter()
            .map(|q| format!("- {}: ${}", q.symbol.to_uppercase(), q.rendered_price()))
            .collect::<Vec<_>>()
            .join("\n"),
        Ok(Payload::VenuePrices(rows)) => {
            let mut lines = vec!["| 交易所 | 价格 (USDT) |".to_owned(), "| --- | ---: |".to_owned()];
            lines.extend(
                rows.iter()
                    .map(|r| format!("| {} | ${} |", r.symbol.to_uppercase(), r.rendered_price())),
            );
            lines.join("\n")
        }
        Ok(Payload::Rate { pair, amount }) => {
            format!("- {}: {}", pair.to_uppercase(), crate::datasources::render_fixed(*amount, 2))
        }
        Ok(Payload::Sentiment { label, value: Some(value) }) => format!("- {} ({})", label, value),
        Ok(Payload::Sentiment { label, value: None }) => format!("- {}", label),
        Err(e) => format!("> {}: {}", e.kind(), e),
    };
    format!("## {}\n{}", title, body)
}
