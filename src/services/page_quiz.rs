//! 测验页面能力 - 业务能力层
//!
//! 基于 JsExecutor 操作 WP-Pro-Quiz 页面（`.wpProQuiz_listItem`）：
//! - `PageExtractor` 提取题目和选项
//! - `PageQuizUi` 选中答案、高亮、点击"下一题"

use crate::error::{AppError, AppResult};
use crate::infrastructure::JsExecutor;
use crate::models::highlight::HighlightStyle;
use crate::models::question::{letter_index, QuestionRecord};
use crate::services::quiz_ui::QuizUi;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

/// 当前可见题目的查找脚本片段
const VISIBLE_ITEM_JS: &str = r#"document.querySelector(".wpProQuiz_listItem[style='']") || document.querySelector(".wpProQuiz_listItem:not([style*='display: none'])")"#;

/// 页面上提取到的原始题目
#[derive(Debug, Clone, Deserialize)]
struct RawQuestion {
    index: usize,
    question: String,
    options: Vec<String>,
}

/// 清理双语题干：去掉天城文片段，合并空白
pub fn extract_english_text(text: &str) -> AppResult<String> {
    let english_then_hindi = Regex::new(r"\s*/\s*[\x{0900}-\x{097F}\s]+")?;
    let hindi_then_english = Regex::new(r"[\x{0900}-\x{097F}\s]+\s*/\s*")?;
    let devanagari = Regex::new(r"[\x{0900}-\x{097F}]")?;
    let whitespace = Regex::new(r"\s+")?;

    let text = english_then_hindi.replace_all(text, "");
    let text = hindi_then_english.replace_all(&text, "");
    let text = devanagari.replace_all(&text, "");
    let text = whitespace.replace_all(&text, " ");
    Ok(text.trim().to_string())
}

/// 去掉选项前的 "A. " 前缀后再清理
pub fn clean_option(text: &str) -> AppResult<String> {
    let prefix = Regex::new(r"^[A-D]\.\s*")?;
    extract_english_text(&prefix.replace(text.trim(), ""))
}

/// 题目提取
pub struct PageExtractor {
    executor: JsExecutor,
}

impl PageExtractor {
    pub fn new(executor: JsExecutor) -> Self {
        Self { executor }
    }

    /// 提取页面上所有题目，生成 pending 状态的记录
    ///
    /// 没有题干或没有选项的条目会被跳过，index 保持页面上的位置
    pub async fn extract_questions(&self) -> AppResult<Vec<QuestionRecord>> {
        let js_code = r#"
            (() => {
                const items = Array.from(document.querySelectorAll(".wpProQuiz_listItem"));
                const result = [];
                items.forEach((item, index) => {
                    const questionEl = item.querySelector(".wpProQuiz_question_text");
                    const optionEls = item.querySelectorAll(".wpProQuiz_questionListItem label");
                    if (questionEl && optionEls.length > 0) {
                        result.push({
                            index: index,
                            question: questionEl.innerText.trim(),
                            options: Array.from(optionEls).map(o => o.innerText.trim())
                        });
                    }
                });
                return result;
            })()
        "#;

        let raw: Vec<RawQuestion> = self.executor.eval_as(js_code).await?;
        debug!("页面返回 {} 个题目条目", raw.len());

        let mut records = Vec::with_capacity(raw.len());
        for item in raw {
            let question = extract_english_text(&item.question)?;
            let options = item
                .options
                .iter()
                .map(|o| clean_option(o))
                .collect::<AppResult<Vec<_>>>()?;
            records.push(QuestionRecord::new(item.index, question, options));
        }

        info!("✓ 共提取到 {} 道题目", records.len());
        Ok(records)
    }
}

/// 基于页面的测验适配器
pub struct PageQuizUi {
    executor: JsExecutor,
}

impl PageQuizUi {
    pub fn new(executor: JsExecutor) -> Self {
        Self { executor }
    }

    fn option_position(letter: &str) -> AppResult<usize> {
        letter_index(letter).ok_or_else(|| AppError::Browser(format!("无效的答案字母: {}", letter)))
    }
}

#[async_trait]
impl QuizUi for PageQuizUi {
    async fn current_visible_index(&self) -> AppResult<Option<usize>> {
        let js_code = format!(
            r#"
            (() => {{
                const items = Array.from(document.querySelectorAll(".wpProQuiz_listItem"));
                const visible = {VISIBLE_ITEM_JS};
                return visible ? items.indexOf(visible) : -1;
            }})()
            "#
        );
        let index: i64 = self.executor.eval_as(js_code).await?;
        Ok(usize::try_from(index).ok())
    }

    async fn select_option(&self, index: usize, letter: &str) -> AppResult<()> {
        let position = Self::option_position(letter)?;
        let js_code = format!(
            r#"
            (() => {{
                const item = document.querySelectorAll(".wpProQuiz_listItem")[{index}] || {VISIBLE_ITEM_JS};
                if (!item) return false;
                const inputs = item.querySelectorAll(".wpProQuiz_questionInput");
                if (!inputs[{position}]) return false;
                inputs[{position}].click();
                return true;
            }})()
            "#
        );

        let clicked: bool = self.executor.eval_as(js_code).await?;
        if clicked {
            Ok(())
        } else {
            Err(AppError::Browser(format!(
                "题目 {} 未找到选项 {}",
                index + 1,
                letter
            )))
        }
    }

    async fn apply_highlight(
        &self,
        index: usize,
        letter: &str,
        style: &HighlightStyle,
    ) -> AppResult<()> {
        let position = Self::option_position(letter)?;
        let js_code = format!(
            r#"
            (() => {{
                const item = document.querySelectorAll(".wpProQuiz_listItem")[{index}] || {VISIBLE_ITEM_JS};
                if (!item) return false;
                const label = item.querySelectorAll(".wpProQuiz_questionListItem label")[{position}];
                if (!label) return false;
                label.style.backgroundColor = "{background}";
                label.style.border = "3px solid {border}";
                label.style.borderRadius = "4px";
                return true;
            }})()
            "#,
            background = style.background,
            border = style.border,
        );

        // 高亮失败不影响已选中的答案
        let applied: bool = self.executor.eval_as(js_code).await?;
        if !applied {
            debug!("题目 {} 的选项 {} 未能高亮", index + 1, letter);
        }
        Ok(())
    }

    async fn advance_to_next(&self) -> AppResult<bool> {
        let js_code = format!(
            r#"
            (() => {{
                const visible = {VISIBLE_ITEM_JS};
                const nextBtn = (visible && visible.querySelector("input[name='next']")) ||
                    document.querySelector("input[name='next'].wpProQuiz_button") ||
                    document.querySelector(".wpProQuiz_button[value*='Next']");
                if (!nextBtn) return false;
                nextBtn.click();
                return true;
            }})()
            "#
        );
        self.executor.eval_as(js_code).await
    }
}
