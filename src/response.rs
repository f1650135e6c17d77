// src/response.rs
use axum::body::Body;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use lol_html::html_content::ContentType;
use lol_html::{HtmlRewriter, Settings, element};
use maud::Markup;
use tokio::fs;

use crate::errors::AppError;

const SHELL_PATH: &str = "static/index.html";

/// Puts `content` into the `#content` placeholder of `shell` and strips the
/// htmx attributes that would otherwise reload it after the page is shown.
pub fn render_into_shell(shell: &[u8], content: &str) -> Result<Vec<u8>, AppError> {
    let mut output = Vec::with_capacity(shell.len() + content.len());
    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![element!("#content", |el| {
                el.set_inner_content(content, ContentType::Html);
                el.remove_attribute("hx-trigger");
                el.remove_attribute("hx-get");
                Ok(())
            })],
            ..Settings::default()
        },
        |chunk: &[u8]| output.extend_from_slice(chunk),
    );

    rewriter.write(shell).map_err(|e| {
        AppError::InternalServerError(format!("Cannot rewrite page shell: {}", e))
    })?;
    rewriter.end().map_err(|e| {
        AppError::InternalServerError(format!("Cannot finish page shell: {}", e))
    })?;

    Ok(output)
}

async fn serve_full_page(content_markup: Markup) -> Result<Response, AppError> {
    let shell = fs::read(SHELL_PATH).await.map_err(|e| {
        tracing::error!("Cannot read page shell {}: {}", SHELL_PATH, e);
        AppError::InternalServerError("Page shell is unavailable".to_string())
    })?;

    let body = render_into_shell(&shell, &content_markup.into_string())?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .body(Body::from(body))
        .map_err(|e| AppError::InternalServerError(format!("Cannot build response: {}", e)))
}

/// htmx requests get the fragment alone, full page loads get it inside the shell.
pub async fn build_response(headers: &HeaderMap, page_content: Markup) -> Result<Response, AppError> {
    if headers.contains_key("hx-request") {
        Ok(page_content.into_response())
    } else {
        serve_full_page(page_content).await
    }
}
