//! 答案服务客户端 - 业务能力层
//!
//! 只负责"向答案服务提问"能力，不关心题目状态和流程
//!
//! ## 接口
//! - `POST /ask?multi_model={bool}`，请求体 `{question, options}`
//! - `POST /ask-batch?multi_model={bool}`，请求体 `{questions: [...]}`，响应按输入顺序对齐

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::answer::{AnswerPayload, BatchRequest, QuestionPayload};
use crate::models::mode::Mode;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// 答案服务
///
/// 传输失败（网络错误、非 2xx）统一返回 `AppError::Transport`
#[async_trait]
pub trait AnswerService: Send + Sync {
    /// 单题请求
    async fn ask(&self, question: &QuestionPayload, mode: Mode) -> AppResult<AnswerPayload>;

    /// 批量请求，结果与输入按位置对齐
    async fn ask_batch(
        &self,
        questions: &[QuestionPayload],
        mode: Mode,
    ) -> AppResult<Vec<AnswerPayload>>;
}

/// 基于 reqwest 的 HTTP 实现
pub struct HttpAnswerClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpAnswerClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.service_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    /// 构建带 multi_model 参数的接口地址
    pub fn endpoint(&self, path: &str, mode: Mode) -> String {
        format!("{}/{}?multi_model={}", self.base_url, path, mode.is_multi())
    }

    async fn post_json<B, T>(&self, url: String, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        debug!("POST {}", url);

        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.header("X-API-Key", key);
        }

        let response = request.send().await.map_err(|e| {
            warn!("请求答案服务失败: {}", e);
            AppError::transport(&url, e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::transport(
                &url,
                format!("HTTP {}: {}", status.as_u16(), body),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::transport(&url, format!("响应解析失败: {}", e)))
    }
}

#[async_trait]
impl AnswerService for HttpAnswerClient {
    async fn ask(&self, question: &QuestionPayload, mode: Mode) -> AppResult<AnswerPayload> {
        let url = self.endpoint("ask", mode);
        self.post_json(url, question).await
    }

    async fn ask_batch(
        &self,
        questions: &[QuestionPayload],
        mode: Mode,
    ) -> AppResult<Vec<AnswerPayload>> {
        let url = self.endpoint("ask-batch", mode);
        self.post_json(url, &BatchRequest { questions }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> HttpAnswerClient {
        let config = Config {
            service_base_url: base.to_string(),
            ..Config::default()
        };
        HttpAnswerClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_carries_multi_model_flag() {
        let c = client("http://localhost:3000/");
        assert_eq!(
            c.endpoint("ask", Mode::Single),
            "http://localhost:3000/ask?multi_model=false"
        );
        assert_eq!(
            c.endpoint("ask-batch", Mode::Multi),
            "http://localhost:3000/ask-batch?multi_model=true"
        );
    }

    #[test]
    fn test_empty_api_key_is_not_sent() {
        let config = Config {
            api_key: Some(String::new()),
            ..Config::default()
        };
        let c = HttpAnswerClient::new(&config).unwrap();
        assert!(c.api_key.is_none());
    }

    /// 只应答一次请求的本地 HTTP 服务，返回 base url
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            // 读完请求头和请求体再应答
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "{}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}", addr)
    }

    fn sample_question() -> QuestionPayload {
        QuestionPayload {
            question: "2 + 2 = ?".to_string(),
            options: vec!["3".to_string(), "4".to_string()],
        }
    }

    #[tokio::test]
    async fn test_non_success_status_keeps_status_and_body() {
        let base = serve_once("HTTP/1.1 500 Internal Server Error", "model overloaded").await;

        let err = client(&base)
            .ask(&sample_question(), Mode::Multi)
            .await
            .unwrap_err();

        match &err {
            AppError::Transport { endpoint, message } => {
                assert_eq!(message, "HTTP 500: model overloaded");
                assert!(endpoint.ends_with("/ask?multi_model=true"));
            }
            other => panic!("期望传输错误，实际为 {:?}", other),
        }
        assert_eq!(err.record_message(), "HTTP 500: model overloaded");
    }

    #[tokio::test]
    async fn test_unparsable_body_is_transport_error() {
        let base = serve_once("HTTP/1.1 200 OK", "not json").await;

        let err = client(&base)
            .ask_batch(&[sample_question()], Mode::Single)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Transport { .. }));
        assert!(err.record_message().starts_with("响应解析失败"));
    }

    /// 需要本地运行答案服务：cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_live_single_question() {
        let _ = tracing_subscriber::fmt::try_init();

        let c = client("http://localhost:3000");
        let question = QuestionPayload {
            question: "What is the capital of France?".to_string(),
            options: vec![
                "London".to_string(),
                "Berlin".to_string(),
                "Paris".to_string(),
                "Madrid".to_string(),
            ],
        };

        let answer = c.ask(&question, Mode::Single).await.expect("请求失败");
        println!("答案: {:?} 置信度: {:?}", answer.answer, answer.confidence);
        assert!(answer.answer.is_some());
    }
}
