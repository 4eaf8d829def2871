//! 测验页面适配器接口
//!
//! 自动填写流程只通过这个接口操作页面

use crate::error::AppResult;
use crate::models::highlight::HighlightStyle;
use async_trait::async_trait;

#[async_trait]
pub trait QuizUi: Send + Sync {
    /// 当前可见题目的 index，无法判断时返回 None
    async fn current_visible_index(&self) -> AppResult<Option<usize>>;

    /// 在题目上选中答案字母对应的选项
    async fn select_option(&self, index: usize, letter: &str) -> AppResult<()>;

    /// 高亮已选中的选项
    async fn apply_highlight(
        &self,
        index: usize,
        letter: &str,
        style: &HighlightStyle,
    ) -> AppResult<()>;

    /// 点击"下一题"，返回是否找到了该按钮
    async fn advance_to_next(&self) -> AppResult<bool>;
}
