use anyhow::{Context, Result};
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// 连接到浏览器并获取测验页面
///
/// 优先复用 URL 包含 `target_url` 的已打开页面，否则新建页面并导航过去
pub async fn connect_to_browser_and_page(
    port: u16,
    target_url: Option<&str>,
) -> Result<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);
    debug!("目标 URL: {:?}", target_url);

    let (browser, mut handler) = Browser::connect(&browser_url)
        .await
        .with_context(|| format!("连接浏览器失败: {}", browser_url))?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let pages = browser.pages().await?;
    debug!("获取到 {} 个页面", pages.len());

    if let Some(url) = target_url {
        for p in pages.iter() {
            if let Ok(Some(page_url)) = p.url().await {
                debug!("检查页面: {}", page_url);
                if page_url.contains(url) {
                    info!("✓ 找到测验页面: {}", page_url);
                    return Ok((browser, p.clone()));
                }
            }
        }
        debug!("未找到匹配的页面，将创建新页面");
    } else if let Some(p) = pages.first() {
        info!("✓ 使用当前页面");
        return Ok((browser, p.clone()));
    }

    let new_page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建新页面失败: {}", e);
        e
    })?;
    if let Some(url) = target_url {
        new_page
            .goto(url)
            .await
            .with_context(|| format!("导航到 {} 失败", url))?;
        info!("已导航到: {}", url);
    }

    Ok((browser, new_page))
}
