//! 题目记录存储
//!
//! 按 index 排序保存全部题目记录；分发开始后只允许分发器、分类器和重试协调器修改

use crate::error::{AppError, AppResult};
use crate::models::question::{QuestionRecord, Status};
use std::sync::Arc;
use tokio::sync::Mutex;

/// 可在任务间共享的存储句柄
pub type SharedStore = Arc<Mutex<QuestionStore>>;

#[derive(Debug, Clone, Default)]
pub struct QuestionStore {
    records: Vec<QuestionRecord>,
}

impl QuestionStore {
    /// 从提取结果创建存储，index 重复时返回错误
    pub fn new(mut records: Vec<QuestionRecord>) -> AppResult<Self> {
        records.sort_by_key(|r| r.index());
        if let Some(dup) = records.windows(2).find(|w| w[0].index() == w[1].index()) {
            return Err(AppError::Config(format!(
                "题目 index 重复: {}",
                dup[0].index()
            )));
        }
        Ok(Self { records })
    }

    /// 按顺序编号创建（测试和简单场景用）
    pub fn from_questions<I, Q>(questions: I) -> Self
    where
        I: IntoIterator<Item = (Q, Vec<String>)>,
        Q: Into<String>,
    {
        let records = questions
            .into_iter()
            .enumerate()
            .map(|(i, (q, options))| QuestionRecord::new(i, q, options))
            .collect();
        Self { records }
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuestionRecord> {
        self.records.iter()
    }

    /// 按题目 index 查找
    pub fn get(&self, index: usize) -> Option<&QuestionRecord> {
        self.position_of(index).map(|pos| &self.records[pos])
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut QuestionRecord> {
        self.position_of(index).map(move |pos| &mut self.records[pos])
    }

    /// 按存储中的位置查找
    pub fn at(&self, position: usize) -> Option<&QuestionRecord> {
        self.records.get(position)
    }

    /// 题目 index 对应的位置
    pub fn position_of(&self, index: usize) -> Option<usize> {
        self.records.binary_search_by_key(&index, |r| r.index()).ok()
    }

    /// 指定状态的题目 index 列表
    pub fn indices_with_status(&self, status: Status) -> Vec<usize> {
        self.records
            .iter()
            .filter(|r| r.status() == status)
            .map(|r| r.index())
            .collect()
    }

    /// 未完成的题目 index 列表
    pub fn incomplete_indices(&self) -> Vec<usize> {
        self.records
            .iter()
            .filter(|r| !r.is_completed())
            .map(|r| r.index())
            .collect()
    }

    pub fn failed_indices(&self) -> Vec<usize> {
        self.indices_with_status(Status::Error)
    }
}
