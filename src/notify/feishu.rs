// src/notify/feishu.rs
//! Feishu (Lark) custom bot webhook: text, post and interactive-card messages.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use metrics::counter;
use reqwest::Client;
use serde_json::{json, Value};

use super::Notifier;
use crate::metrics as m;
use crate::report::daily::{format_markdown, format_text, DailyReport};

pub const ENV_WEBHOOK_URL: &str = "FEISHU_WEBHOOK_URL";
const POST_TITLE: &str = "📰 科技日报";
const CARD_ARTICLES_PER_SECTION: usize = 3;

#[derive(Clone)]
pub struct FeishuNotifier {
    webhook: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl FeishuNotifier {
    pub fn new(webhook: impl Into<String>) -> Self {
        Self {
            webhook: webhook.into(),
            client: Client::new(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }

    pub fn from_env() -> Option<Self> {
        std::env::var(ENV_WEBHOOK_URL)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(Self::new)
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    pub async fn send_post(&self, markdown: &str) -> Result<()> {
        self.deliver(&post_payload(POST_TITLE, markdown), "post").await
    }

    pub async fn send_card(&self, report: &DailyReport) -> Result<()> {
        self.deliver(&card_payload(report), "interactive").await
    }

    // Transport and HTTP errors are retried with backoff; a rejected body (code != 0) is not.
    async fn deliver(&self, payload: &Value, kind: &str) -> Result<()> {
        let mut attempt: u8 = 0;
        let rsp = loop {
            attempt += 1;
            let res = self
                .client
                .post(&self.webhook)
                .timeout(self.timeout)
                .json(payload)
                .send()
                .await;

            let err = match res {
                Ok(rsp) => {
                    let status = rsp.status();
                    if status.is_success() {
                        break rsp;
                    }
                    anyhow!("feishu webhook HTTP error: {status}")
                }
                Err(e) => anyhow!("feishu webhook request failed: {e}"),
            };
            if attempt < self.max_retries {
                tracing::debug!(target: "notify", attempt, kind, error = %err, "retrying");
                tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
                continue;
            }
            counter!(m::SEND_FAILURES).increment(1);
            return Err(err);
        };

        let body: Value = rsp.json().await.context("feishu response body")?;
        check_response(&body).map_err(|e| {
            counter!(m::SEND_FAILURES).increment(1);
            e
        })?;
        tracing::info!(target: "notify", kind, "feishu message sent");
        Ok(())
    }
}

#[async_trait::async_trait]
impl Notifier for FeishuNotifier {
    async fn send_text(&self, text: &str) -> Result<()> {
        self.deliver(&text_payload(text), "text").await
    }

    /// Card first, then a Markdown post, then plain text.
    async fn send_report(&self, report: &DailyReport) -> Result<()> {
        match self.send_card(report).await {
            Ok(()) => return Ok(()),
            Err(e) => tracing::warn!(target: "notify", error = %e, "card failed, falling back to post"),
        }
        match self.send_post(&format_markdown(report)).await {
            Ok(()) => return Ok(()),
            Err(e) => tracing::warn!(target: "notify", error = %e, "post failed, falling back to text"),
        }
        self.send_text(&format_text(report)).await
    }

    fn name(&self) -> &str {
        "feishu"
    }
}

/// Success means a JSON body with `code == 0`.
pub fn check_response(body: &Value) -> Result<()> {
    match body.get("code").and_then(Value::as_i64) {
        Some(0) => Ok(()),
        Some(code) => {
            let msg = body.get("msg").and_then(Value::as_str).unwrap_or_default();
            bail!("feishu rejected message: code {code} {msg}")
        }
        None => bail!("feishu response without code: {body}"),
    }
}

pub fn text_payload(text: &str) -> Value {
    json!({ "msg_type": "text", "content": { "text": text } })
}

pub fn post_payload(title: &str, markdown: &str) -> Value {
    json!({
        "msg_type": "post",
        "content": { "post": { "zh_cn": {
            "title": title,
            "content": markdown_to_post(markdown),
        }}}
    })
}

/// One post paragraph per non-blank Markdown line.
pub fn markdown_to_post(markdown: &str) -> Vec<Value> {
    markdown
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|line| {
            let el = if let Some(t) = line.strip_prefix("# ") {
                json!({"tag": "text", "text": t, "style": ["bold", "large"]})
            } else if let Some(t) = line
                .strip_prefix("## ")
                .or_else(|| line.strip_prefix("### "))
            {
                json!({"tag": "text", "text": t, "style": ["bold"]})
            } else if let Some(t) = line.strip_prefix("- **") {
                let t = t.replacen("**", "", 1);
                json!({"tag": "text", "text": format!("• {t}"), "style": ["bold"]})
            } else if let Some(t) = line.strip_prefix("- ") {
                json!({"tag": "text", "text": format!("• {t}")})
            } else if let Some(t) = line.strip_prefix("> ") {
                json!({"tag": "text", "text": t, "style": ["italic"]})
            } else if line.starts_with("---") {
                json!({"tag": "hr"})
            } else {
                json!({"tag": "text", "text": line})
            };
            Value::Array(vec![el])
        })
        .collect()
}

pub fn card_payload(report: &DailyReport) -> Value {
    let mut articles = String::new();
    for section in &report.sections {
        articles.push_str(&format!("\n**{}**\n", section.title));
        for a in section.articles.iter().take(CARD_ARTICLES_PER_SECTION) {
            articles.push_str(&format!("• {}\n", a.title));
        }
    }

    let mut elements = vec![
        json!({"tag": "div", "text": {"tag": "lark_md",
            "content": format!("**📋 今日摘要**\n{}", report.summary)}}),
        json!({"tag": "div", "text": {"tag": "lark_md",
            "content": format!("**📊 数据统计**\n• 总文章数：{} 篇", report.statistics.total_articles)}}),
    ];
    if !articles.is_empty() {
        elements.push(json!({"tag": "div", "text": {"tag": "lark_md",
            "content": format!("**📰 精选文章**{articles}")}}));
    }
    elements.push(json!({"tag": "note", "elements": [{"tag": "plain_text",
        "content": format!("生成时间：{}", report.generated_at.format("%Y-%m-%d %H:%M:%S"))}]}));

    json!({
        "msg_type": "interactive",
        "card": {
            "config": {"wide_screen_mode": true},
            "header": {
                "title": {"tag": "plain_text", "content": report.title},
                "template": "blue"
            },
            "elements": elements,
        }
    })
}
